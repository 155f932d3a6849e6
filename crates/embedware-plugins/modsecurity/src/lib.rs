//! `modsecurity`: asks a ModSecurity endpoint about each request before
//! forwarding it.
//!
//! A copy of the request (method, path and query, headers, body up to
//! `maxBodySize`) is replayed against `modSecurityUrl`. A 4xx/5xx answer
//! from the WAF is returned to the client as-is; otherwise the original
//! request continues down the chain.
//!
//! | Situation | Response |
//! |-----------|----------|
//! | WAF answers ≥ 400 | the WAF's status |
//! | WAF unreachable or times out | 502, or pass-through with `failOpen` |
//! | body larger than `maxBodySize` | 413 |
//! | runtime shutting down | 503 |

mod config;
mod service;

use embedware_core::{BoxError, BoxedHandler, EmbeddedPlugin, PluginContext, boxed};
use embedware_macros::embedded_plugin;
use tower_layer::Layer;
use tracing::debug;

pub use config::ModSecurityConfig;
pub use service::{ModSecurityLayer, ModSecurityService};

pub struct ModSecurity;

#[embedded_plugin]
impl EmbeddedPlugin for ModSecurity {
    const NAME: &'static str = "modsecurity";
    const DESCRIPTION: &'static str = "Screens requests through a ModSecurity endpoint";
    type Config = ModSecurityConfig;

    fn default_config() -> ModSecurityConfig {
        ModSecurityConfig::default()
    }

    fn construct(
        ctx: &PluginContext,
        next: BoxedHandler,
        config: ModSecurityConfig,
        name: &str,
    ) -> Result<BoxedHandler, BoxError> {
        let layer = ModSecurityLayer::new(&config, ctx.shutdown_token().clone())?;
        ctx.span().in_scope(|| {
            debug!(
                middleware = name,
                url = layer.url(),
                timeout_millis = config.timeout_millis,
                "modsecurity middleware ready"
            );
        });
        Ok(boxed(layer.layer(next)))
    }
}
