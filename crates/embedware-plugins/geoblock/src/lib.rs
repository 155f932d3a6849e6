//! `geoblock`: allows or refuses requests by the origin country reported by
//! the edge (`CF-IPCountry` by default).
//!
//! Blocked countries always lose. A non-empty `allowed` list turns the
//! plugin into an allow list. Requests without a country code follow
//! `allowUnknown`; private clients skip the check when `allowPrivate` is set.
//! The client address is the peer's unless `clientIpHeader` names a header
//! written by a trusted hop (usually `realip`'s `X-Real-Ip`).

mod config;
mod service;

use embedware_core::{BoxError, BoxedHandler, EmbeddedPlugin, PluginContext, boxed};
use embedware_macros::embedded_plugin;
use tower_layer::Layer;
use tracing::debug;

pub use config::GeoBlockConfig;
pub use service::{GeoBlockLayer, GeoBlockService};

pub struct GeoBlock;

#[embedded_plugin]
impl EmbeddedPlugin for GeoBlock {
    const NAME: &'static str = "geoblock";
    const DESCRIPTION: &'static str = "Allows or refuses requests by origin country";
    type Config = GeoBlockConfig;

    fn default_config() -> GeoBlockConfig {
        GeoBlockConfig::default()
    }

    fn construct(
        ctx: &PluginContext,
        next: BoxedHandler,
        config: GeoBlockConfig,
        name: &str,
    ) -> Result<BoxedHandler, BoxError> {
        let layer = GeoBlockLayer::new(&config)?;
        ctx.span().in_scope(|| {
            debug!(
                middleware = name,
                allowed = config.allowed.len(),
                blocked = config.blocked.len(),
                "geoblock middleware ready"
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
    async fn test_comma_separated_countries_from_bag() {
        let bag = json!({"Blocked": "CN,RU", "HTTP_Status_Blocked": "451"});
        let constructor = PluginDescriptor::of::<GeoBlock>()
            .prepare(bag.as_object().unwrap(), "geo")
            .unwrap();

        let next = handler_fn(|_req| async { Ok(status_response(StatusCode::OK)) });
        let handler = constructor.construct(&PluginContext::new(), next).unwrap();

        let request = Request::builder()
            .header("CF-IPCountry", "RU")
            .body(Body::empty())
            .unwrap();
        let response = handler.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS);
    }

    #[test]
    fn test_registered_in_linked_table() {
        assert!(
            embedware_core::EMBEDDED_PLUGINS
                .iter()
                .any(|d| d.name == GeoBlock::NAME)
        );
    }
}
