//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (--config / RELAY_CONFIG)
//!     → loader.rs (parse & deserialize, then environment overlay)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc with every handler
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow an environment-only deployment
//! - Form location is optional at startup and checked per request

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DebugConfig, DebugLevel, FormConfig, ListenerConfig, ObservabilityConfig, RelayConfig,
    SecurityConfig, ShellConfig, TimeoutConfig, UpstreamConfig,
};
