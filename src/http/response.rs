//! Responses the router produces on its own.

use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::routing::Response;

/// A bare status response whose body is the canonical reason phrase.
pub fn status_text(status: StatusCode) -> Response {
    (status, status.canonical_reason().unwrap_or_default()).into_response()
}

/// Default reply when no route matches.
pub fn not_found() -> Response {
    status_text(StatusCode::NOT_FOUND)
}
