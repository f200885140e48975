use crate::{
    AppState,
    auth::{AuthUser, Caller},
    engine,
    error::ApiError,
    models::{
        CreateTimelineItemRequest, TimelineItemResponse, UpdateTimelineItemRequest, UserProfile,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

// --- Handlers ---

/// list_items
///
/// [Public Route] Lists timeline items through the caller's visibility scope:
/// anonymous callers and unrecognized roles see published items only,
/// admins/managers see everything, instructors additionally see their own
/// drafts. Ordered newest-published first, drafts trailing by recency.
#[utoipa::path(
    get,
    path = "/items",
    responses((status = 200, description = "Visible timeline items", body = [TimelineItemResponse]))
)]
pub async fn list_items(
    caller: Caller,
    State(state): State<AppState>,
) -> Json<Vec<TimelineItemResponse>> {
    let scope = engine::visibility_scope(&caller);
    let items = state.repo.list_items(scope).await;
    Json(items.into_iter().map(TimelineItemResponse::from).collect())
}

/// get_item
///
/// [Public Route] Retrieves a single item by id, filtered through the exact
/// same visibility scope as the listing. An item outside the caller's scope is
/// a plain 404 — never a 403 — so drafts do not leak their existence.
#[utoipa::path(
    get,
    path = "/items/{id}",
    params(("id" = Uuid, Path, description = "Timeline item ID")),
    responses(
        (status = 200, description = "Found", body = TimelineItemResponse),
        (status = 404, description = "Absent or outside the caller's visibility scope")
    )
)]
pub async fn get_item(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TimelineItemResponse>, ApiError> {
    let scope = engine::visibility_scope(&caller);
    match state.repo.get_item(id, scope).await {
        Some(item) => Ok(Json(item.into())),
        None => Err(ApiError::NotFound),
    }
}

/// create_item
///
/// [Authenticated Route] Submits a new timeline item. The engine gates
/// authentication (401) and role (403: instructor/manager/admin only), then
/// decides the initial publish: the item is persisted as DRAFT and only
/// transitions to PUBLISHED when the payload requested it *and* the caller is
/// admin or manager. An instructor's publish wish is silently downgraded —
/// creation never fails because of an over-privileged status field.
#[utoipa::path(
    post,
    path = "/items",
    request_body = CreateTimelineItemRequest,
    responses(
        (status = 201, description = "Created", body = TimelineItemResponse),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Insufficient role to create")
    )
)]
pub async fn create_item(
    caller: Caller,
    State(state): State<AppState>,
    Json(payload): Json<CreateTimelineItemRequest>,
) -> Result<(StatusCode, Json<TimelineItemResponse>), ApiError> {
    let author = engine::authorize_create(&caller)?;
    let publish = engine::publish_on_create(author, payload.status);

    let item = state
        .repo
        .create_item(author.id, payload, publish)
        .await
        .ok_or(ApiError::Internal)?;

    Ok((StatusCode::CREATED, Json(item.into())))
}

/// update_item
///
/// [Authenticated Route] Partially updates an item located through the
/// caller's visibility scope (outside the scope → 404). A requested status of
/// PUBLISHED requires admin/manager/superuser — checked against the requested
/// value, so re-sending PUBLISHED on an already-published item is still 403
/// for anyone else. The DRAFT→PUBLISHED transition stamps `published_at`
/// exactly once; a DRAFT overwrite of a published item goes through the
/// generic field update and leaves `published_at` stale.
#[utoipa::path(
    put,
    path = "/items/{id}",
    params(("id" = Uuid, Path, description = "Timeline item ID")),
    request_body = UpdateTimelineItemRequest,
    responses(
        (status = 200, description = "Updated", body = TimelineItemResponse),
        (status = 403, description = "Only admin or manager can publish"),
        (status = 404, description = "Absent or outside the caller's visibility scope")
    )
)]
pub async fn update_item(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTimelineItemRequest>,
) -> Result<Json<TimelineItemResponse>, ApiError> {
    let user = match &caller {
        Caller::Anonymous => {
            return Err(ApiError::Unauthorized(
                "Authentication credentials were not provided.",
            ));
        }
        Caller::User(user) => user,
    };

    let scope = engine::visibility_scope(&caller);
    let current = state
        .repo
        .get_item(id, scope)
        .await
        .ok_or(ApiError::NotFound)?;

    // Absent status means "no-op on status": the gate runs against the item's
    // current value, exactly as if the caller had re-sent it.
    let requested = payload.status.unwrap_or(current.status);
    engine::authorize_status_request(user, requested)?;
    let publish = engine::publish_transition(current.status, requested);

    let item = state
        .repo
        .update_item(id, scope, payload, publish)
        .await
        .ok_or(ApiError::NotFound)?;

    Ok(Json(item.into()))
}

/// get_me
///
/// [Authenticated Route] Provides the authenticated user's profile as resolved
/// by the identity layer.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(user: AuthUser) -> Json<UserProfile> {
    Json(UserProfile {
        id: user.id,
        username: user.username,
        role: user.role,
        is_superuser: user.is_superuser,
    })
}
