//! Embedware Runtime - configuration, logging and the process-wide registry.
//!
//! This crate provides:
//! - figment-based configuration (`embedware.toml`, `EMBEDWARE_*` variables)
//! - tracing subscriber setup driven by that configuration
//! - [`EmbeddedRuntime`], which builds the active registry with aliases from
//!   the environment layered over configured ones
//! - [`global`] install-once access for hosts that look plugins up by name
//!
//! ```rust,ignore
//! use embedware_runtime::{EmbeddedRuntime, global};
//!
//! global::install(EmbeddedRuntime::from_env()?)?;
//!
//! if global::is_embedded_plugin("crowdsec") {
//!     let ctx = global::global()?.context("edge-bouncer");
//!     let constructor = global::build_embedded_plugin(&ctx, "crowdsec", &bag, "edge-bouncer")?;
//! }
//! ```

pub mod config;
pub mod error;
pub mod global;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, EmbedwareConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{EmbeddedRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;
