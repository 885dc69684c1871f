//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or defaults
//!     → loader.rs (parse & deserialize)
//!     → GATEWAY_LOG_LEVEL override
//!     → validation.rs (semantic checks)
//!     → RuntimeConfig (validated, immutable)
//!     → translated into the embedded server's settings at setup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the runtime starts
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{LogLevel, ParseLogLevelError, RuntimeConfig, LOG_LEVEL_ENV};
pub use validation::{validate_config, ValidationError};
