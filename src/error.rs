use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

/// ApiError
///
/// The complete error taxonomy of the authorization core:
/// - `Unauthorized`: no authenticated identity where one is required.
/// - `Forbidden`: authenticated, but the role is insufficient for the action
///   (the create role-gate and the publish-gate on update).
/// - `NotFound`: record absent *or* outside the caller's visibility scope.
///   The two are deliberately indistinguishable so that draft items do not
///   leak their existence.
/// - `Internal`: an unplanned fault in the data layer. Details are logged at
///   the repository, never echoed to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    NotFound,
    Internal,
}

/// ErrorBody
///
/// JSON error envelope: `{"detail": "..."}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Unauthorized(detail) => (StatusCode::UNAUTHORIZED, detail),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, detail),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found."),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error."),
        };
        (
            status,
            Json(ErrorBody {
                detail: detail.to_string(),
            }),
        )
            .into_response()
    }
}
