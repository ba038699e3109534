//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (startup, single-threaded):
//!     Router::handle(method, pattern, handler, middlewares)
//!     → pattern.rs (compile to anchored regex + capture names)
//!     → table.rs (duplicate check, literal index, specificity order)
//!
//! Freeze:
//!     Router::into_dispatcher()
//!     → handler.rs (compose route + router middleware once per route)
//!     → Dispatcher (immutable, shared via Arc)
//!
//! Request time:
//!     Dispatcher::dispatch(request)
//!     → strip prefix → table lookup
//!     → params.rs (attach captures to request extensions)
//!     → composed handler chain, or not-found handler
//! ```
//!
//! # Design Decisions
//! - Matchers compiled at registration, never lazily at request time
//! - Literal routes resolve by hash lookup; captures by ordered scan
//! - Deterministic: same table and request always pick the same route
//! - Duplicate registration fails at startup, never at request time

pub mod group;
pub mod handler;
pub mod params;
pub mod pattern;
pub mod router;
pub mod table;

pub use group::Group;
pub use handler::{chain, Handler, Middleware, Request, Response, ResponseFuture};
pub use params::{ParamError, PathParams, PathParamsExt};
pub use pattern::Pattern;
pub use router::{Dispatcher, RouteInfo, Router};
pub use table::{Route, RouteError, RouteMatch, RouteTable};
