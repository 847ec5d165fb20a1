//! Configuration module for the Courier runtime.
//!
//! Layered loading (defaults, files, environment, overrides) through
//! figment, followed by validation of the merged result.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    CourierConfig, ExecutorConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    ProvidersConfig, ServerConfig, SpanEventConfig,
};
pub use validation::validate_config;
