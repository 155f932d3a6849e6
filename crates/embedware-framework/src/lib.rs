//! # Embedware Framework
//!
//! Turns the link-time plugin table into something a host can query:
//!
//! - [`DescriptorTable`]: canonical descriptors, sorted and deduplicated
//! - [`RegistryBuilder`] / [`ActiveRegistry`]: effective names after
//!   operator aliases are applied
//! - [`ActiveRegistry::build_embedded_plugin`]: decode a configuration bag and
//!   return a deferred [`Constructor`](embedware_core::Constructor)
//!
//! ```rust,ignore
//! let registry = ActiveRegistry::builder().build()?;
//! if registry.is_embedded_plugin("realip") {
//!     let constructor = registry.build_embedded_plugin(&ctx, "realip", &bag, "edge-realip")?;
//!     let handler = constructor.construct(&ctx, next)?;
//! }
//! ```

pub mod alias;
pub mod builder;
pub mod error;
pub mod registry;
pub mod table;

#[cfg(test)]
mod testing;

pub use alias::{AliasScheme, AliasSource, DEFAULT_ALIAS_PREFIX, EnvAliasSource, LayeredAliasSource};
pub use error::{BuildError, BuildResult, RegistryError};
pub use registry::{ActiveRegistry, AppliedAlias, RegistryBuilder};
pub use table::DescriptorTable;
