//! Method-and-path HTTP request router.
//!
//! Routes are registered on a [`Router`] as `(method, pattern)` pairs where a
//! pattern is made of literal segments, `:name` captures and a trailing
//! `*name` wildcard. [`Router::into_dispatcher`] freezes the table into a
//! cheaply cloneable [`Dispatcher`], which is a `tower::Service` and is
//! served by [`HttpServer`].

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::RouterConfig;
pub use http::{middleware, HttpServer, RequestIdExt, X_REQUEST_ID};
pub use lifecycle::Shutdown;
pub use routing::{
    chain, Dispatcher, Group, Handler, Middleware, ParamError, PathParams, PathParamsExt, Request,
    Response, RouteError, RouteInfo, Router,
};
