//! The embedded runtime: configuration, logging and the active registry
//! bundled behind one handle.
//!
//! ```rust,ignore
//! use embedware_runtime::EmbeddedRuntime;
//!
//! let runtime = EmbeddedRuntime::builder()
//!     .config_file("/etc/embedware/embedware.toml")
//!     .build()?;
//!
//! let ctx = runtime.context("edge-realip");
//! let handler = runtime.build_handler(&ctx, "realip", &bag, "edge-realip", next)?;
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use embedware_core::{BoxedHandler, ConfigBag, Constructor, PluginContext};
use embedware_framework::{
    ActiveRegistry, AliasScheme, DescriptorTable, EnvAliasSource, LayeredAliasSource,
    RegistryBuilder,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span};

use crate::config::{ConfigLoader, EmbedwareConfig, RegistryConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Owns the active registry and the shutdown signal shared by every
/// plugin context it hands out.
pub struct EmbeddedRuntime {
    config: EmbedwareConfig,
    registry: Arc<ActiveRegistry>,
    shutdown: CancellationToken,
}

impl EmbeddedRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Loads configuration from the default locations and builds the runtime.
    pub fn from_env() -> RuntimeResult<Self> {
        Self::builder().build()
    }

    pub fn config(&self) -> &EmbedwareConfig {
        &self.config
    }

    pub fn registry(&self) -> &ActiveRegistry {
        &self.registry
    }

    /// A shareable handle on the registry.
    pub fn shared_registry(&self) -> Arc<ActiveRegistry> {
        Arc::clone(&self.registry)
    }

    /// Creates the context for building middleware `instance`.
    ///
    /// The context carries a span named after the instance and a child of
    /// the runtime's shutdown token.
    pub fn context(&self, instance: &str) -> PluginContext {
        PluginContext::new()
            .with_span(info_span!("middleware", name = instance))
            .with_shutdown(self.shutdown.child_token())
    }

    pub fn is_embedded_plugin(&self, name: &str) -> bool {
        self.registry.is_embedded_plugin(name)
    }

    pub fn build_embedded_plugin(
        &self,
        ctx: &PluginContext,
        name: &str,
        config: &ConfigBag,
        instance: &str,
    ) -> RuntimeResult<Constructor> {
        Ok(self
            .registry
            .build_embedded_plugin(ctx, name, config, instance)?)
    }

    pub fn build_handler(
        &self,
        ctx: &PluginContext,
        name: &str,
        config: &ConfigBag,
        instance: &str,
        next: BoxedHandler,
    ) -> RuntimeResult<BoxedHandler> {
        Ok(self
            .registry
            .build_handler(ctx, name, config, instance, next)?)
    }

    /// Signals shutdown to every context handed out so far.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Embedded runtime shutting down");
            self.shutdown.cancel();
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Waits for Ctrl+C (or an explicit [`shutdown`](Self::shutdown)), then
    /// shuts down.
    pub async fn run_until_signal(&self) -> RuntimeResult<()> {
        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C");
            }
            () = self.shutdown.cancelled() => {}
        }
        self.shutdown();
        Ok(())
    }
}

/// Builder for [`EmbeddedRuntime`].
pub struct RuntimeBuilder {
    loader: ConfigLoader,
    config: Option<EmbedwareConfig>,
    table: Option<DescriptorTable>,
    init_logging: bool,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            loader: ConfigLoader::new(),
            config: None,
            table: None,
            init_logging: true,
        }
    }

    /// Loads configuration from this file instead of searching for one.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.loader = self.loader.file(path.into());
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.loader = self.loader.profile(profile);
        self
    }

    /// Uses an already loaded configuration; no files or environment
    /// variables are read for it.
    pub fn config(mut self, config: EmbedwareConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses an explicit descriptor table instead of the linked one.
    pub fn table(mut self, table: DescriptorTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Leaves the global tracing subscriber alone.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    pub fn build(self) -> RuntimeResult<EmbeddedRuntime> {
        let config = match self.config {
            Some(config) => config,
            None => self.loader.load()?,
        };
        validate_config(&config)?;

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let table = match self.table {
            Some(table) => table,
            None => DescriptorTable::linked()?,
        };
        debug!(plugins = ?table.names().collect::<Vec<_>>(), "Descriptor table loaded");

        let registry = RegistryBuilder::new()
            .table(table)
            .prefix(config.registry.alias_prefix.clone())
            .alias_source(alias_source(&config.registry))
            .build()
            .map_err(RuntimeError::Registry)?;

        info!(
            plugins = registry.len(),
            aliases = registry.aliases().len(),
            prefix = %config.registry.alias_prefix,
            "Embedded plugin registry ready"
        );

        Ok(EmbeddedRuntime {
            config,
            registry: Arc::new(registry),
            shutdown: CancellationToken::new(),
        })
    }
}

/// Environment first (when enabled), then the configured aliases.
fn alias_source(config: &RegistryConfig) -> LayeredAliasSource {
    let scheme = AliasScheme::new(config.alias_prefix.clone());
    let configured: HashMap<String, String> = config
        .aliases
        .iter()
        .map(|(plugin, alias)| (scheme.lookup_key(plugin), alias.clone()))
        .collect();

    let mut source = LayeredAliasSource::new();
    if config.env_aliases {
        source = source.layer(EnvAliasSource);
    }
    source.layer(configured)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use embedware_core::{BoxError, EmbeddedPlugin, PluginDescriptor, handler_fn, status_response};
    use embedware_framework::{BuildError, RegistryError};
    use figment::Jail;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct RelayConfig {
        hops: u32,
    }

    struct Relay;

    impl EmbeddedPlugin for Relay {
        const NAME: &'static str = "relay";
        type Config = RelayConfig;

        fn default_config() -> RelayConfig {
            RelayConfig { hops: 1 }
        }

        fn construct(
            ctx: &PluginContext,
            next: BoxedHandler,
            config: RelayConfig,
            _name: &str,
        ) -> Result<BoxedHandler, BoxError> {
            if ctx.is_shutting_down() {
                return Err("shutting down".into());
            }
            if config.hops == 0 {
                return Err("hops must be positive".into());
            }
            Ok(next)
        }
    }

    struct Mirror;

    impl EmbeddedPlugin for Mirror {
        const NAME: &'static str = "mirror";
        type Config = RelayConfig;

        fn default_config() -> RelayConfig {
            RelayConfig::default()
        }

        fn construct(
            _ctx: &PluginContext,
            next: BoxedHandler,
            _config: RelayConfig,
            _name: &str,
        ) -> Result<BoxedHandler, BoxError> {
            Ok(next)
        }
    }

    fn table() -> DescriptorTable {
        DescriptorTable::new([PluginDescriptor::of::<Relay>(), PluginDescriptor::of::<Mirror>()])
            .unwrap()
    }

    fn config_with(aliases: &[(&str, &str)], env_aliases: bool) -> EmbedwareConfig {
        let mut config = EmbedwareConfig::default();
        config.registry.alias_prefix = "EMBEDWARE_RUNTIME_TEST".to_string();
        config.registry.env_aliases = env_aliases;
        for (plugin, alias) in aliases {
            config
                .registry
                .aliases
                .insert(plugin.to_string(), alias.to_string());
        }
        config
    }

    fn runtime(config: EmbedwareConfig) -> RuntimeResult<EmbeddedRuntime> {
        EmbeddedRuntime::builder()
            .config(config)
            .table(table())
            .without_logging()
            .build()
    }

    fn terminal() -> BoxedHandler {
        handler_fn(|_req| async { Ok(status_response(StatusCode::OK)) })
    }

    #[test]
    fn test_configured_alias_is_applied() {
        let runtime = runtime(config_with(&[("relay", "forward")], false)).unwrap();

        assert!(runtime.is_embedded_plugin("forward"));
        assert!(!runtime.is_embedded_plugin("relay"));
        assert!(runtime.is_embedded_plugin("mirror"));
        assert_eq!(runtime.registry().aliases()[0].key, "EMBEDWARE_RUNTIME_TEST_RELAY_KEY");
    }

    #[test]
    fn test_environment_overrides_configured_alias() {
        Jail::expect_with(|jail| {
            jail.set_env("EMBEDWARE_RUNTIME_TEST_RELAY_KEY", "from-env");

            let rt = runtime(config_with(&[("relay", "from-config")], true)).unwrap();
            assert!(rt.is_embedded_plugin("from-env"));
            assert!(!rt.is_embedded_plugin("from-config"));

            let rt = runtime(config_with(&[("relay", "from-config")], false)).unwrap();
            assert!(rt.is_embedded_plugin("from-config"));
            Ok(())
        });
    }

    #[test]
    fn test_alias_collision_fails_startup() {
        let result = runtime(config_with(&[("relay", "mirror")], false));

        assert!(matches!(
            result,
            Err(RuntimeError::Registry(RegistryError::NameCollision { .. }))
        ));
    }

    #[test]
    fn test_invalid_config_fails_startup() {
        let mut config = config_with(&[], false);
        config.registry.alias_prefix = String::new();

        assert!(matches!(runtime(config), Err(RuntimeError::Config(_))));
    }

    #[test]
    fn test_build_errors_pass_through() {
        let runtime = runtime(config_with(&[], false)).unwrap();
        let ctx = runtime.context("m");

        let err = runtime
            .build_embedded_plugin(&ctx, "missing", &ConfigBag::new(), "m")
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Build(BuildError::UnknownPlugin(_))));

        let bag = serde_json::json!({"hops": "0"}).as_object().cloned().unwrap();
        let err = runtime
            .build_handler(&ctx, "relay", &bag, "m", terminal())
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Build(BuildError::Construction { .. })
        ));
    }

    #[test]
    fn test_shutdown_reaches_contexts() {
        let runtime = runtime(config_with(&[], false)).unwrap();
        let ctx = runtime.context("m");
        assert!(!ctx.is_shutting_down());

        runtime
            .build_handler(&ctx, "relay", &ConfigBag::new(), "m", terminal())
            .unwrap();

        runtime.shutdown();
        assert!(ctx.is_shutting_down());
        assert!(runtime.is_shutting_down());

        let err = runtime
            .build_handler(&ctx, "relay", &ConfigBag::new(), "m", terminal())
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Build(BuildError::Construction { .. })
        ));
    }

    #[tokio::test]
    async fn test_run_until_signal_returns_on_shutdown() {
        let runtime = Arc::new(runtime(config_with(&[], false)).unwrap());
        let token = runtime.shutdown_token();

        let waiter = {
            let runtime = Arc::clone(&runtime);
            tokio::spawn(async move { runtime.run_until_signal().await })
        };
        token.cancel();

        waiter.await.unwrap().unwrap();
        assert!(runtime.is_shutting_down());
    }
}
