//! Process-wide runtime.
//!
//! Hosts that resolve middleware by name from many places install one
//! [`EmbeddedRuntime`] at startup and query it through the free functions
//! here. The registry it holds is never mutated afterwards.

use std::sync::OnceLock;

use embedware_core::{ConfigBag, Constructor, PluginContext};

use crate::error::{RuntimeError, RuntimeResult};
use crate::runtime::EmbeddedRuntime;

static GLOBAL: OnceLock<EmbeddedRuntime> = OnceLock::new();

/// Installs `runtime` as the process-wide runtime.
///
/// Fails with [`RuntimeError::AlreadyInstalled`] on the second call; the
/// first installed runtime stays in place.
pub fn install(runtime: EmbeddedRuntime) -> RuntimeResult<&'static EmbeddedRuntime> {
    GLOBAL
        .set(runtime)
        .map_err(|_| RuntimeError::AlreadyInstalled)?;
    global()
}

/// The process-wide runtime, if installed.
pub fn global() -> RuntimeResult<&'static EmbeddedRuntime> {
    GLOBAL.get().ok_or(RuntimeError::NotInstalled)
}

/// Whether `name` is an effective plugin name in the installed runtime.
///
/// Always `false` before [`install`].
pub fn is_embedded_plugin(name: &str) -> bool {
    global().is_ok_and(|runtime| runtime.is_embedded_plugin(name))
}

/// Builds a deferred constructor through the installed runtime.
pub fn build_embedded_plugin(
    ctx: &PluginContext,
    name: &str,
    config: &ConfigBag,
    instance: &str,
) -> RuntimeResult<Constructor> {
    global()?.build_embedded_plugin(ctx, name, config, instance)
}

#[cfg(test)]
mod tests {
    use embedware_framework::DescriptorTable;

    use super::*;
    use crate::config::EmbedwareConfig;

    fn runtime() -> EmbeddedRuntime {
        let mut config = EmbedwareConfig::default();
        config.registry.env_aliases = false;
        EmbeddedRuntime::builder()
            .config(config)
            .table(DescriptorTable::default())
            .without_logging()
            .build()
            .unwrap()
    }

    // Only test in this crate touching the process-wide slot.
    #[test]
    fn test_install_once() {
        assert!(matches!(global(), Err(RuntimeError::NotInstalled)));
        assert!(!is_embedded_plugin("realip"));
        assert!(matches!(
            build_embedded_plugin(&PluginContext::new(), "realip", &ConfigBag::new(), "m"),
            Err(RuntimeError::NotInstalled)
        ));

        let installed = install(runtime()).unwrap();
        assert!(installed.registry().is_empty());
        assert!(global().is_ok());

        assert!(matches!(install(runtime()), Err(RuntimeError::AlreadyInstalled)));
        assert!(matches!(
            build_embedded_plugin(&PluginContext::new(), "realip", &ConfigBag::new(), "m"),
            Err(RuntimeError::Build(_))
        ));
    }
}
