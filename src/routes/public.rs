use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable without credentials. Both item reads use the lenient
/// `Caller` extractor: an anonymous request resolves to published-only
/// visibility, while presented credentials widen the scope per role. The
/// visibility filter itself lives in the repository query, so these routes
/// can never leak drafts no matter who asks.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // GET /items
        // Lists timeline items through the caller's visibility scope, ordered
        // newest-published first with drafts trailing.
        .route("/items", get(handlers::list_items))
        // GET /items/{id}
        // Single-item fetch through the same scope; out-of-scope ids are 404.
        .route("/items/{id}", get(handlers::get_item))
}
