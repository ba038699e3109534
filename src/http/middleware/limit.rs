//! Concurrency limiting.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use tokio::sync::Semaphore;

use crate::routing::{Handler, Middleware, Request};

/// Allow at most `limit` requests inside the wrapped chain at once.
/// Excess requests wait for a slot. The semaphore is shared by every
/// handler this middleware wraps.
pub fn max_in_flight(limit: usize) -> Middleware {
    let permits = Arc::new(Semaphore::new(limit));
    Middleware::from_fn(move |req: Request, next: Handler| {
        let permits = Arc::clone(&permits);
        async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return StatusCode::SERVICE_UNAVAILABLE.into_response();
            };
            next.invoke(req).await
        }
    })
}
