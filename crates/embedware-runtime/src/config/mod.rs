//! Runtime configuration: the registry's alias settings and logging.
//!
//! Loaded with figment from defaults, `embedware.toml`, and `EMBEDWARE_*`
//! environment variables, then checked by [`validate_config`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, Profile, load_config, load_config_from_file};
pub use schema::{
    EmbedwareConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, RegistryConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
