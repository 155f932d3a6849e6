//! Runtime error types.

use embedware_framework::{BuildError, RegistryError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while setting up or using the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The active registry could not be assembled.
    #[error("Failed to build plugin registry: {0}")]
    Registry(#[from] RegistryError),

    /// A plugin build failed.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// A process-wide runtime was already installed.
    #[error("Embedded runtime is already installed")]
    AlreadyInstalled,

    /// No process-wide runtime has been installed.
    #[error("Embedded runtime is not installed")]
    NotInstalled,

    /// Waiting for the shutdown signal failed.
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
