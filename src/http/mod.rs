//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum connection loop, tower-http layers)
//!     → request.rs (request ID)
//!     → routing::Dispatcher (route lookup + handler chain)
//!     → middleware/ (optional cross-cutting behaviour per chain)
//!     → response.rs (router-generated replies, e.g. 404)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
