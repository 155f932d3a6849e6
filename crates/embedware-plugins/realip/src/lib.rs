//! `realip`: resolves the client address behind trusted reverse proxies.
//!
//! When the immediate peer is a trusted proxy, the forwarding headers are
//! walked right to left, skipping trusted hops, and the first untrusted
//! address is written to the target header. Requests from untrusted peers
//! get the target header overwritten with the peer's own address.
//!
//! ```toml
//! trustedIPs = ["10.0.0.0/8", "2001:db8::/32"]
//! headers = "X-Forwarded-For,X-Real-Ip"
//! targetHeader = "X-Real-Ip"
//! ```

mod config;
mod service;

use embedware_core::{BoxError, BoxedHandler, EmbeddedPlugin, PluginContext, boxed};
use embedware_macros::embedded_plugin;
use tower_layer::Layer;
use tracing::debug;

pub use config::RealIpConfig;
pub use service::{RealIpLayer, RealIpService};

pub struct RealIp;

#[embedded_plugin]
impl EmbeddedPlugin for RealIp {
    const NAME: &'static str = "realip";
    const DESCRIPTION: &'static str = "Resolves the client address behind trusted proxies";
    type Config = RealIpConfig;

    fn default_config() -> RealIpConfig {
        RealIpConfig::default()
    }

    fn construct(
        ctx: &PluginContext,
        next: BoxedHandler,
        config: RealIpConfig,
        name: &str,
    ) -> Result<BoxedHandler, BoxError> {
        let layer = RealIpLayer::new(&config)?;
        ctx.span().in_scope(|| {
            debug!(
                middleware = name,
                trusted_ranges = layer.trusted_ranges(),
                target = %config.target_header,
                "realip middleware ready"
            );
        });
        Ok(boxed(layer.layer(next)))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use embedware_core::{
        EMBEDDED_PLUGINS, HttpRequest, PeerAddr, PluginDescriptor, handler_fn, status_response,
    };
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn test_registered_in_linked_table() {
        let descriptor = EMBEDDED_PLUGINS
            .iter()
            .find(|d| d.name == "realip")
            .copied()
            .unwrap();
        assert_eq!(descriptor.desc, RealIp::DESCRIPTION);
    }

    #[test]
    fn test_bag_with_comma_headers_constructs() {
        let bag = json!({
            "Trusted_IPs": ["10.0.0.0/8"],
            "Headers": "X-Forwarded-For,X-Client-Ip",
            "Force_Overwrite": "true",
        });
        let constructor = PluginDescriptor::of::<RealIp>()
            .prepare(bag.as_object().unwrap(), "edge")
            .unwrap();

        let next = handler_fn(|_req| async { Ok(status_response(axum::http::StatusCode::OK)) });
        constructor
            .construct(&PluginContext::new(), next)
            .unwrap();
    }

    #[tokio::test]
    async fn test_canonical_keys_reach_the_handler() {
        let bag = json!({"trustedIPs": "10.0.0.0/8"});
        let constructor = PluginDescriptor::of::<RealIp>()
            .prepare(bag.as_object().unwrap(), "edge")
            .unwrap();

        let next = handler_fn(|req: HttpRequest| async move {
            let mut response = status_response(StatusCode::OK);
            if let Some(value) = req.headers().get("x-real-ip") {
                response.headers_mut().insert("x-seen", value.clone());
            }
            Ok(response)
        });
        let handler = constructor.construct(&PluginContext::new(), next).unwrap();

        let mut request = Request::builder()
            .header("x-forwarded-for", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(PeerAddr("10.0.0.5".parse().unwrap()));

        let response = handler.oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-seen"], "198.51.100.2");
    }

    #[test]
    fn test_malformed_range_fails_construction() {
        let bag = json!({"trustedIPs": "10.0.0.0/99"});
        let constructor = PluginDescriptor::of::<RealIp>()
            .prepare(bag.as_object().unwrap(), "edge")
            .unwrap();

        let next = handler_fn(|_req| async { Ok(status_response(axum::http::StatusCode::OK)) });
        let err = constructor.construct(&PluginContext::new(), next).unwrap_err();
        assert!(err.to_string().contains("10.0.0.0/99"));
    }
}
