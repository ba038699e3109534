//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::Method;
use route_dispatch::{Dispatcher, Handler, HttpServer, Request, Response, RouterConfig, Shutdown};
use tokio::net::TcpListener;

/// Handler answering a fixed body.
pub fn text(body: &'static str) -> Handler {
    Handler::new(move |_req: Request| async move { body })
}

/// Build a request with an empty body.
pub fn request(method: Method, path: &str) -> Request {
    axum::http::Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

/// Collect a response body as UTF-8.
pub async fn body_string(res: Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// HTTP client that never routes loopback traffic through a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Serve `dispatcher` on an ephemeral loopback port.
///
/// Returns the bound address and the shutdown handle; the server stops when
/// the handle is triggered.
pub async fn start_server(dispatcher: Dispatcher, config: &RouterConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(dispatcher, config);
    let stop = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, stop).await.unwrap();
    });

    (addr, shutdown)
}
