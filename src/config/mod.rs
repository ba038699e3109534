//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → Router::from_config / HttpServer::new / observability init
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; the routing table is frozen after that,
//!   so there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    LimitsConfig, ListenerConfig, LogFormat, MiddlewareConfig, ObservabilityConfig, RouterConfig,
    RoutingConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
