//! # Embedware
//!
//! Natively compiled HTTP middleware, looked up by name and configured from
//! untyped key/value bags.
//!
//! ## Overview
//!
//! A gateway that builds its handler chain from configuration knows each
//! middleware only by name and by a loosely typed map of options. Embedware
//! lets such a gateway treat statically linked middleware uniformly:
//!
//! ```text
//! #[embedded_plugin] impls ──▶ DescriptorTable ──(aliases)──▶ ActiveRegistry
//!                                                                  │
//!               name + ConfigBag + instance ──▶ build_embedded_plugin
//!                                                                  │
//!                                    Constructor ──(ctx, next)──▶ BoxedHandler
//! ```
//!
//! - **Descriptor table**: every plugin linked into the binary
//! - **Aliases**: `EMBEDWARE_EMBEDDED_<NAME>_KEY=<alias>` renames a plugin
//!   once, at start-up
//! - **Weak decoding**: `"8"` becomes `8`, `"a,b"` becomes `["a", "b"]`,
//!   keys match case-insensitively and `trusted_ips` finds `trustedIPs`
//! - **Constructors**: deferred, reusable; the chain builder decides when
//!   to wrap the next handler
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use embedware::prelude::*;
//!
//! let runtime = embedware::init()?;
//!
//! if embedware::is_embedded_plugin("realip") {
//!     let ctx = runtime.context("edge-realip");
//!     let bag = serde_json::json!({"trustedIPs": "10.0.0.0/8"});
//!     let constructor = embedware::build_embedded_plugin(
//!         &ctx, "realip", bag.as_object().unwrap(), "edge-realip",
//!     )?;
//!     let handler = constructor.construct(&ctx, next)?;
//! }
//! ```
//!
//! ## Features
//!
//! - `builtin-plugins` *(default)*: links `realip`, `geoblock`, `crowdsec`
//!   and `modsecurity`; each is also available as `plugin-<name>`
//! - `toml-config` *(default)* / `yaml-config`: configuration file formats
//! - `json-log`: JSON log output

pub use embedware_core as core;
pub use embedware_framework as framework;
pub use embedware_runtime as runtime;

#[cfg(feature = "plugin-crowdsec")]
pub use embedware_plugin_crowdsec as crowdsec;
#[cfg(feature = "plugin-geoblock")]
pub use embedware_plugin_geoblock as geoblock;
#[cfg(feature = "plugin-modsecurity")]
pub use embedware_plugin_modsecurity as modsecurity;
#[cfg(feature = "plugin-realip")]
pub use embedware_plugin_realip as realip;

pub use embedware_macros::embedded_plugin;
pub use embedware_runtime::global::{build_embedded_plugin, global, install, is_embedded_plugin};

use embedware_runtime::{EmbeddedRuntime, RuntimeResult};

/// Loads configuration from the default locations, builds the registry
/// with aliases from the environment, and installs it process-wide.
pub fn init() -> RuntimeResult<&'static EmbeddedRuntime> {
    install(EmbeddedRuntime::from_env()?)
}

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use embedware::prelude::*;
/// ```
pub mod prelude {
    // Runtime - process-wide entry point
    pub use embedware_runtime::{EmbeddedRuntime, RuntimeError};

    // Registry and builds
    pub use embedware_framework::{
        ActiveRegistry, BuildError, DescriptorTable, RegistryBuilder, RegistryError,
    };

    // Writing plugins
    pub use embedware_core::{
        BoxError, BoxedHandler, ConfigBag, Constructor, EmbeddedPlugin, HttpRequest,
        HttpResponse, PluginContext, boxed, handler_fn, status_response,
    };
    pub use embedware_macros::embedded_plugin;
}
