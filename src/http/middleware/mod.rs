//! Bundled router middleware.
//!
//! # Data Flow
//! ```text
//! Request
//!     → recovery.rs (catch handler panics → 500)
//!     → observe.rs (trace line, latency + metrics)
//!     → cors.rs (CORS headers, preflight short-circuit)
//!     → auth.rs (allowed methods, HTTP Basic)
//!     → limit.rs (bound in-flight requests)
//!     → route handler
//! ```
//!
//! # Design Decisions
//! - Everything here is opt-in; the dispatcher itself installs nothing
//! - Each constructor returns a plain `Middleware`, so these compose with
//!   user middleware and tower layers alike
//! - `*_with` variants take a callback in place of the default behaviour

pub mod auth;
pub mod cors;
pub mod limit;
pub mod observe;
pub mod recovery;

pub use auth::{allowed_methods, basic_auth, basic_auth_with};
pub use cors::{cors, CorsOptions};
pub use limit::max_in_flight;
pub use observe::{timing, timing_with, trace, trace_with, TimingReport};
pub use recovery::{recovery, recovery_with, PanicReport};
