//! Error types for registry construction and plugin builds.

use embedware_core::{BoxError, DecodeError};
use thiserror::Error;

/// Errors raised while assembling the active registry.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Two descriptors share a canonical name.
    #[error("embedded plugin '{0}' is registered more than once")]
    DuplicatePlugin(String),

    /// Two plugins resolve to the same effective name after aliasing.
    #[error("effective plugin name '{name}' is claimed by both '{first}' and '{second}'")]
    NameCollision {
        /// The contested effective name.
        name: String,
        /// Canonical name of the plugin registered first.
        first: &'static str,
        /// Canonical name of the plugin that collided with it.
        second: &'static str,
    },
}

/// Errors surfaced by a plugin build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The requested effective name is not in the active registry.
    #[error("unknown embedded plugin: {0}")]
    UnknownPlugin(String),

    /// The configuration decoder could not be set up for the plugin.
    #[error("failed to create configuration decoder for '{plugin}': {source}")]
    DecoderSetup {
        /// Effective plugin name.
        plugin: String,
        /// Underlying decoder error.
        source: DecodeError,
    },

    /// The configuration bag does not fit the plugin's configuration type.
    #[error("failed to decode configuration for '{plugin}': {source}")]
    Decode {
        /// Effective plugin name.
        plugin: String,
        /// Underlying decoder error.
        source: DecodeError,
    },

    /// The plugin's own construct operation failed.
    #[error("failed to construct '{plugin}': {source}")]
    Construction {
        /// Effective plugin name.
        plugin: String,
        /// Error returned by the plugin, untouched.
        source: BoxError,
    },
}

/// Result type for plugin builds.
pub type BuildResult<T> = Result<T, BuildError>;
