//! Panic recovery.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use futures_util::FutureExt;

use crate::routing::{Handler, Middleware, Request, Response};

/// What the recovery callback learns about a panicked request.
#[derive(Debug, Clone)]
pub struct PanicReport {
    pub method: Method,
    pub path: String,
    pub message: String,
}

/// Catch panics from inner handlers, log them and answer `500`.
pub fn recovery() -> Middleware {
    recovery_with(|report| {
        tracing::error!(
            method = %report.method,
            path = %report.path,
            panic = %report.message,
            "Handler panicked"
        );
        (StatusCode::INTERNAL_SERVER_ERROR, report.message).into_response()
    })
}

/// Catch panics from inner handlers and let `on_panic` build the response.
pub fn recovery_with<F>(on_panic: F) -> Middleware
where
    F: Fn(PanicReport) -> Response + Send + Sync + 'static,
{
    let on_panic = Arc::new(on_panic);
    Middleware::from_fn(move |req: Request, next: Handler| {
        let on_panic = Arc::clone(&on_panic);
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let fut = next.invoke(req);
        async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(res) => res,
                Err(payload) => on_panic(PanicReport {
                    method,
                    path,
                    message: panic_message(payload.as_ref()),
                }),
            }
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
