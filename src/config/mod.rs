//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), explicit path or found in well-known dirs
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc with the relay and the HTTP front end
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at startup and never changes afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{find_config, load_config, ConfigError};
pub use schema::{
    BackendConfig, CacheConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, RelayConfig,
    RewriteStrategy, TimeoutConfig,
};
