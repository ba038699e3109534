//! Request tracing and latency measurement.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{Method, StatusCode};

use crate::observability::metrics;
use crate::routing::{Handler, Middleware, Request};

/// Log `METHOD path` before the request reaches the handler.
pub fn trace() -> Middleware {
    trace_with(|req| {
        tracing::info!(method = %req.method(), path = %req.uri().path(), "Request");
    })
}

/// Run `observe` on every request before the handler.
pub fn trace_with<F>(observe: F) -> Middleware
where
    F: Fn(&Request) + Send + Sync + 'static,
{
    let observe = Arc::new(observe);
    Middleware::from_fn(move |req: Request, next: Handler| {
        observe(&req);
        next.invoke(req)
    })
}

/// Latency of one request through the wrapped chain.
#[derive(Debug, Clone)]
pub struct TimingReport {
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    pub elapsed: Duration,
}

/// Log latency and record request metrics.
pub fn timing() -> Middleware {
    timing_with(|report| {
        tracing::info!(
            method = %report.method,
            path = %report.path,
            status = report.status.as_u16(),
            elapsed = ?report.elapsed,
            "Request completed"
        );
        metrics::record_request(report.method.as_str(), report.status.as_u16(), report.elapsed);
    })
}

/// Measure the wrapped chain and hand the result to `report`.
pub fn timing_with<F>(report: F) -> Middleware
where
    F: Fn(TimingReport) + Send + Sync + 'static,
{
    let report = Arc::new(report);
    Middleware::from_fn(move |req: Request, next: Handler| {
        let report = Arc::clone(&report);
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let start = Instant::now();
        let fut = next.invoke(req);
        async move {
            let res = fut.await;
            report(TimingReport {
                method,
                path,
                status: res.status(),
                elapsed: start.elapsed(),
            });
            res
        }
    })
}
