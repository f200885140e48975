/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// Access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.

/// Routes accessible to all clients (anonymous or authenticated). Read
/// handlers resolve the caller leniently and enforce visibility at the
/// repository level.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware. Requires a
/// validated user session; role checks happen inside the engine.
pub mod authenticated;
