use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible only to callers who pass the authentication
/// layer. Every handler here relies on the `AuthUser` extractor middleware on
/// the router layer above, which rejects anonymous requests with 401 before
/// the handler runs; the engine then applies the role gates (create rights,
/// publish rights) on the resolved identity.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The authenticated user's own profile and role facts.
        .route("/me", get(handlers::get_me))
        // POST /items
        // Submits a new timeline item. Role-gated in the engine: instructors,
        // managers and admins only. A requested PUBLISHED status is honored
        // for admins/managers and silently downgraded for instructors.
        .route("/items", post(handlers::create_item))
        // PUT/PATCH /items/{id}
        // Partial update of an item within the caller's visibility scope.
        // Publishing via update is gated to admins/managers; both verbs map to
        // the same COALESCE-based handler since every field is optional.
        .route(
            "/items/{id}",
            put(handlers::update_item).patch(handlers::update_item),
        )
}
