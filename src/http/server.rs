//! HTTP server setup.
//!
//! # Responsibilities
//! - Mount the dispatcher as the sole service of an Axum router
//! - Wire up tower-http layers (request ID, tracing, timeout, body limit)
//! - Serve on a listener until the shutdown signal fires
//!
//! # Design Decisions
//! - Axum only provides the connection loop; all routing is ours
//! - Layer order, outermost first: set request ID → trace → propagate
//!   request ID → timeout → body limit → dispatcher

use std::time::Duration;

use axum::Router as AxumRouter;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RouterConfig;
use crate::http::request::{request_id_header, UuidRequestId};
use crate::routing::Dispatcher;

/// HTTP front end for a frozen routing table.
pub struct HttpServer {
    app: AxumRouter,
    dispatcher: Dispatcher,
}

impl HttpServer {
    /// Build the server. Only the `timeouts` and `limits` sections of
    /// `config` are read here.
    pub fn new(dispatcher: Dispatcher, config: &RouterConfig) -> Self {
        let app = Self::build_app(dispatcher.clone(), config);
        Self { app, dispatcher }
    }

    #[allow(deprecated)]
    fn build_app(dispatcher: Dispatcher, config: &RouterConfig) -> AxumRouter {
        AxumRouter::new()
            .fallback_service(dispatcher)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(request_id_header()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id_header(), UuidRequestId))
    }

    /// Serve connections from `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.dispatcher.routes().len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
