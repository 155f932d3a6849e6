//! Building configured plugin instances from the active registry.

use embedware_core::{BoxedHandler, ConfigBag, Constructor, PluginContext};
use tracing::debug;

use crate::error::{BuildError, BuildResult};
use crate::registry::ActiveRegistry;

impl ActiveRegistry {
    /// Decodes `config` for the plugin registered under `name` and returns
    /// a deferred [`Constructor`] bound to `instance`.
    ///
    /// Nothing is constructed here; the plugin's own construct runs when
    /// the constructor is invoked. The registry is never mutated, so
    /// concurrent builds are independent.
    pub fn build_embedded_plugin(
        &self,
        ctx: &PluginContext,
        name: &str,
        config: &ConfigBag,
        instance: &str,
    ) -> BuildResult<Constructor> {
        let descriptor = self
            .get(name)
            .ok_or_else(|| BuildError::UnknownPlugin(name.to_string()))?;

        ctx.span().in_scope(|| {
            debug!(
                plugin = name,
                canonical = descriptor.name,
                middleware = instance,
                "Building embedded plugin"
            );
        });

        descriptor.prepare(config, instance).map_err(|source| {
            let plugin = name.to_string();
            if source.is_setup_failure() {
                BuildError::DecoderSetup { plugin, source }
            } else {
                BuildError::Decode { plugin, source }
            }
        })
    }

    /// Builds and immediately constructs a handler wrapping `next`.
    pub fn build_handler(
        &self,
        ctx: &PluginContext,
        name: &str,
        config: &ConfigBag,
        instance: &str,
        next: BoxedHandler,
    ) -> BuildResult<BoxedHandler> {
        let constructor = self.build_embedded_plugin(ctx, name, config, instance)?;
        constructor
            .construct(ctx, next)
            .map_err(|source| BuildError::Construction {
                plugin: name.to_string(),
                source,
            })
    }
}
