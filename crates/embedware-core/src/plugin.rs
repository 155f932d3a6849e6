//! Embedded plugin contract, descriptors, and constructors.
//!
//! # Overview
//!
//! Every native middleware implements [`EmbeddedPlugin`]: it names itself,
//! declares its own configuration type, produces that type's defaults, and
//! knows how to wrap a next-handler given a configuration value.
//!
//! A [`PluginDescriptor`] is the static, `Copy` handle the registry stores.
//! It is generated from exactly one `EmbeddedPlugin` type by
//! [`PluginDescriptor::of`], so the configuration a descriptor decodes is
//! always the configuration its construct step receives.
//!
//! Descriptors are collected at link time in [`EMBEDDED_PLUGINS`]; plugin
//! crates contribute an entry with the `#[embedded_plugin]` attribute.
//!
//! # Example
//!
//! ```rust,ignore
//! #[derive(Clone, Serialize, Deserialize)]
//! #[serde(default)]
//! pub struct Config { pub header: String }
//!
//! pub struct Stamp;
//!
//! #[embedded_plugin]
//! impl EmbeddedPlugin for Stamp {
//!     const NAME: &'static str = "stamp";
//!     type Config = Config;
//!
//!     fn default_config() -> Config { Config { header: "X-Stamp".into() } }
//!
//!     fn construct(_ctx: &PluginContext, next: BoxedHandler, config: Config, name: &str)
//!         -> Result<BoxedHandler, BoxError>
//!     {
//!         Ok(boxed(StampLayer::new(config, name).layer(next)))
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use linkme::distributed_slice;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower::BoxError;

use crate::context::PluginContext;
use crate::decode::{self, DecodeError};
use crate::handler::BoxedHandler;

/// Untyped configuration bag supplied by the chain builder.
pub type ConfigBag = serde_json::Map<String, serde_json::Value>;

// ─── EmbeddedPlugin ───────────────────────────────────────────────────────────

/// A natively compiled middleware that can be built from an untyped bag.
pub trait EmbeddedPlugin: 'static {
    /// Canonical identifier, before any operator alias is applied.
    const NAME: &'static str;

    /// One-line description shown in logs and listings.
    const DESCRIPTION: &'static str = "";

    /// The plugin's own configuration type.
    ///
    /// It must round-trip through serde: the defaults are serialized, the bag
    /// is overlaid, and the result is deserialized with weak typing.
    type Config: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Returns a fresh configuration populated with this plugin's defaults.
    fn default_config() -> Self::Config;

    /// Binds a configuration to a running handler wrapping `next`.
    fn construct(
        ctx: &PluginContext,
        next: BoxedHandler,
        config: Self::Config,
        name: &str,
    ) -> Result<BoxedHandler, BoxError>;
}

// ─── PluginDescriptor ─────────────────────────────────────────────────────────

/// Decodes a bag and captures the result in a [`Constructor`].
pub type PrepareFn = fn(&ConfigBag, &str) -> Result<Constructor, DecodeError>;

/// A static, `Copy` descriptor for one embeddable plugin kind.
#[derive(Debug, Clone, Copy)]
pub struct PluginDescriptor {
    /// Canonical plugin identifier.
    pub name: &'static str,

    /// One-line description.
    pub desc: &'static str,

    prepare: PrepareFn,
}

impl PluginDescriptor {
    /// Creates the descriptor for plugin type `P`.
    pub const fn of<P: EmbeddedPlugin>() -> Self {
        Self {
            name: P::NAME,
            desc: P::DESCRIPTION,
            prepare: prepare::<P>,
        }
    }

    /// Materializes `bag` onto fresh defaults and returns the deferred constructor.
    ///
    /// An empty bag leaves the defaults untouched. Nothing is returned unless
    /// the whole bag decodes.
    pub fn prepare(&self, bag: &ConfigBag, instance: &str) -> Result<Constructor, DecodeError> {
        (self.prepare)(bag, instance)
    }
}

fn prepare<P: EmbeddedPlugin>(bag: &ConfigBag, instance: &str) -> Result<Constructor, DecodeError> {
    let defaults = P::default_config();
    let config = if bag.is_empty() {
        defaults
    } else {
        decode::materialize(&defaults, bag)?
    };

    let instance: Arc<str> = Arc::from(instance);
    Ok(Constructor::new(P::NAME, Arc::clone(&instance), move |ctx, next| {
        P::construct(ctx, next, config.clone(), &instance)
    }))
}

/// Link-time table of every embedded plugin compiled into the binary.
#[distributed_slice]
pub static EMBEDDED_PLUGINS: [PluginDescriptor];

// ─── Constructor ──────────────────────────────────────────────────────────────

type ConstructFn =
    dyn Fn(&PluginContext, BoxedHandler) -> Result<BoxedHandler, BoxError> + Send + Sync;

/// Deferred factory producing a handler once given the next handler.
///
/// Holds an already-materialized configuration; every [`construct`](Self::construct)
/// call receives its own clone of it. A constructor can be invoked any number
/// of times and shared freely between threads.
#[derive(Clone)]
pub struct Constructor {
    plugin: &'static str,
    instance: Arc<str>,
    construct: Arc<ConstructFn>,
}

impl Constructor {
    /// Wraps a construct closure.
    pub fn new<F>(plugin: &'static str, instance: Arc<str>, construct: F) -> Self
    where
        F: Fn(&PluginContext, BoxedHandler) -> Result<BoxedHandler, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            plugin,
            instance,
            construct: Arc::new(construct),
        }
    }

    /// Builds a handler around `next`, forwarding the plugin's result verbatim.
    pub fn construct(
        &self,
        ctx: &PluginContext,
        next: BoxedHandler,
    ) -> Result<BoxedHandler, BoxError> {
        (self.construct)(ctx, next)
    }

    /// Canonical name of the plugin this constructor belongs to.
    pub fn plugin(&self) -> &'static str {
        self.plugin
    }

    /// Instance name the handler will be built with.
    pub fn instance(&self) -> &str {
        &self.instance
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("plugin", &self.plugin)
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}
