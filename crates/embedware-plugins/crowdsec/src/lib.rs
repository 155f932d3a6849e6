//! `crowdsec`: a bouncer applying ban and captcha decisions to client
//! addresses.
//!
//! Decisions come from the configuration (`bannedIPs`, `captchaIPs`) and
//! are shared by every clone of the built handler. Banned clients
//! get `httpStatusBanned`, captcha clients `httpStatusCaptcha`; anyone
//! else reaches the next handler. The client is the peer address, or the
//! `clientIpHeader` value when one is configured behind `realip`.

mod config;
mod decision;
mod service;

use embedware_core::{BoxError, BoxedHandler, EmbeddedPlugin, PluginContext, boxed};
use embedware_macros::embedded_plugin;
use tower_layer::Layer;
use tracing::debug;

pub use config::CrowdsecConfig;
pub use decision::{Decisions, Remediation};
pub use service::{CrowdsecLayer, CrowdsecService};

pub struct Crowdsec;

#[embedded_plugin]
impl EmbeddedPlugin for Crowdsec {
    const NAME: &'static str = "crowdsec";
    const DESCRIPTION: &'static str = "Bans or challenges clients from a decision list";
    type Config = CrowdsecConfig;

    fn default_config() -> CrowdsecConfig {
        CrowdsecConfig::default()
    }

    fn construct(
        ctx: &PluginContext,
        next: BoxedHandler,
        config: CrowdsecConfig,
        name: &str,
    ) -> Result<BoxedHandler, BoxError> {
        let layer = CrowdsecLayer::new(&config)?;
        ctx.span().in_scope(|| {
            debug!(
                middleware = name,
                decisions = layer.decisions(),
                "crowdsec middleware ready"
            );
        });
        Ok(boxed(layer.layer(next)))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use embedware_core::{PluginDescriptor, handler_fn, status_response};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn test_constructor_builds_equivalent_handlers() {
        let bag = json!({
            "bannedIPs": "203.0.113.0/24,198.51.100.1",
            "httpStatusBanned": 429,
            "clientIpHeader": "X-Real-Ip",
        });
        let constructor = PluginDescriptor::of::<Crowdsec>()
            .prepare(bag.as_object().unwrap(), "bouncer")
            .unwrap();

        let ctx = PluginContext::new();
        for _ in 0..2 {
            let next = handler_fn(|_req| async { Ok(status_response(StatusCode::OK)) });
            let handler = constructor.construct(&ctx, next).unwrap();
            let request = Request::builder()
                .header("X-Real-Ip", "198.51.100.1")
                .body(Body::empty())
                .unwrap();
            let response = handler.oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        }
    }

    #[test]
    fn test_registered_in_linked_table() {
        assert!(
            embedware_core::EMBEDDED_PLUGINS
                .iter()
                .any(|d| d.name == Crowdsec::NAME)
        );
    }
}
