//! # Embedware Core
//!
//! Shared building blocks for the embedded middleware registry:
//!
//! - [`handler`]: the type-erased HTTP handler every plugin wraps and returns
//! - [`context`]: the opaque [`PluginContext`] forwarded to construction
//! - [`plugin`]: the [`EmbeddedPlugin`] contract, [`PluginDescriptor`]s, the
//!   link-time [`EMBEDDED_PLUGINS`] table, and deferred [`Constructor`]s
//! - [`decode`]: weakly typed materialization of untyped configuration bags
//! - [`net`]: peer addresses and IP ranges for network-aware plugins

pub mod context;
pub mod decode;
pub mod handler;
pub mod net;
pub mod plugin;

pub use context::PluginContext;
pub use decode::DecodeError;
pub use handler::{BoxedHandler, HttpRequest, HttpResponse, boxed, handler_fn, status_response};
pub use net::{IpRange, IpRangeSet, PeerAddr};
pub use plugin::{
    ConfigBag, Constructor, EMBEDDED_PLUGINS, EmbeddedPlugin, PluginDescriptor, PrepareFn,
};

// Used by `#[embedded_plugin]` expansions.
#[doc(hidden)]
pub use linkme;

pub use tower::BoxError;
