use std::net::IpAddr;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::header::{HeaderName, HeaderValue};
use embedware_core::net::{self, IpRangeSet};
use embedware_core::{BoxError, HttpRequest};
use tower::Service;
use tower_layer::Layer;
use tracing::trace;

use crate::config::RealIpConfig;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

#[derive(Debug)]
struct Settings {
    enabled: bool,
    trusted: IpRangeSet,
    headers: Vec<HeaderName>,
    target: HeaderName,
    force_overwrite: bool,
}

impl Settings {
    fn apply(&self, request: &mut HttpRequest) {
        if !self.enabled {
            return;
        }

        let Some(peer) = net::peer_addr(request).or_else(|| rightmost_forwarded(request)) else {
            trace!("No peer address available, leaving request untouched");
            return;
        };

        if !self.trusted.contains(peer) {
            // Nothing an untrusted peer claims about the client is kept.
            trace!(peer = %peer, "Untrusted peer, using its own address");
            self.set_target(request, peer);
            return;
        }

        if !self.force_overwrite && request.headers().contains_key(&self.target) {
            return;
        }

        let client = self.walk_forwarded(request).unwrap_or(peer);
        trace!(peer = %peer, client = %client, "Resolved client address");
        self.set_target(request, client);
    }

    /// Walks each forwarding header right to left and returns the first
    /// hop that is not a trusted proxy.
    fn walk_forwarded(&self, request: &HttpRequest) -> Option<IpAddr> {
        for header in &self.headers {
            let hops = forwarded_hops(request, header);
            if let Some(client) = hops.iter().rev().find(|ip| !self.trusted.contains(**ip)) {
                return Some(*client);
            }
            if let Some(first) = hops.first() {
                return Some(*first);
            }
        }
        None
    }

    fn set_target(&self, request: &mut HttpRequest, ip: IpAddr) {
        if let Ok(value) = HeaderValue::from_str(&ip.to_string()) {
            request.headers_mut().insert(self.target.clone(), value);
        }
    }
}

fn forwarded_hops(request: &HttpRequest, header: &HeaderName) -> Vec<IpAddr> {
    request
        .headers()
        .get_all(header)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(net::parse_ip)
        .collect()
}

fn rightmost_forwarded(request: &HttpRequest) -> Option<IpAddr> {
    forwarded_hops(request, &HeaderName::from_static(X_FORWARDED_FOR))
        .last()
        .copied()
}

/// Rewrites the target header with the resolved client address.
#[derive(Debug, Clone)]
pub struct RealIpLayer {
    settings: Arc<Settings>,
}

impl RealIpLayer {
    pub fn new(config: &RealIpConfig) -> Result<Self, BoxError> {
        let headers = config
            .headers
            .iter()
            .map(|header| HeaderName::try_from(header.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            settings: Arc::new(Settings {
                enabled: config.enabled,
                trusted: IpRangeSet::parse(&config.trusted_ips)?,
                headers,
                target: HeaderName::try_from(config.target_header.as_str())?,
                force_overwrite: config.force_overwrite,
            }),
        })
    }

    pub fn trusted_ranges(&self) -> usize {
        self.settings.trusted.len()
    }
}

impl<S> Layer<S> for RealIpLayer {
    type Service = RealIpService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RealIpService {
            inner,
            settings: Arc::clone(&self.settings),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RealIpService<S> {
    inner: S,
    settings: Arc<Settings>,
}

impl<S> Service<HttpRequest> for RealIpService<S>
where
    S: Service<HttpRequest>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: HttpRequest) -> Self::Future {
        self.settings.apply(&mut request);
        self.inner.call(request)
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use embedware_core::{BoxedHandler, HttpResponse, PeerAddr, handler_fn, status_response};
    use tower::ServiceExt;

    use super::*;

    /// Echoes the request's `x-real-ip` back as `x-seen`.
    fn echo() -> BoxedHandler {
        handler_fn(|req: HttpRequest| async move {
            let mut response = status_response(StatusCode::OK);
            if let Some(value) = req.headers().get("x-real-ip") {
                response.headers_mut().insert("x-seen", value.clone());
            }
            Ok(response)
        })
    }

    fn config(trusted: &[&str]) -> RealIpConfig {
        RealIpConfig {
            trusted_ips: trusted.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    async fn seen(config: RealIpConfig, request: Request<Body>) -> Option<String> {
        let service = RealIpLayer::new(&config).unwrap().layer(echo());
        let response: HttpResponse = service.oneshot(request).await.unwrap();
        response
            .headers()
            .get("x-seen")
            .map(|v| v.to_str().unwrap().to_string())
    }

    fn request(peer: &str, headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(PeerAddr(peer.parse().unwrap()));
        request
    }

    #[tokio::test]
    async fn test_trusted_proxy_chain_is_walked() {
        let req = request(
            "10.0.0.2",
            &[("x-forwarded-for", "198.51.100.7, 203.0.113.1, 10.0.0.1")],
        );
        assert_eq!(
            seen(config(&["10.0.0.0/8"]), req).await.as_deref(),
            Some("203.0.113.1")
        );
    }

    #[tokio::test]
    async fn test_all_trusted_hops_fall_back_to_leftmost() {
        let req = request("10.0.0.2", &[("x-forwarded-for", "10.1.1.1, 10.0.0.1")]);
        assert_eq!(
            seen(config(&["10.0.0.0/8"]), req).await.as_deref(),
            Some("10.1.1.1")
        );
    }

    #[tokio::test]
    async fn test_untrusted_peer_cannot_spoof() {
        let req = request(
            "198.51.100.9",
            &[("x-forwarded-for", "1.1.1.1"), ("x-real-ip", "1.1.1.1")],
        );
        assert_eq!(
            seen(config(&["10.0.0.0/8"]), req).await.as_deref(),
            Some("198.51.100.9")
        );
    }

    #[tokio::test]
    async fn test_existing_target_kept_unless_forced() {
        let headers = [("x-real-ip", "192.0.2.10"), ("x-forwarded-for", "192.0.2.20")];

        let kept = seen(config(&["10.0.0.0/8"]), request("10.0.0.2", &headers)).await;
        assert_eq!(kept.as_deref(), Some("192.0.2.10"));

        let mut forced = config(&["10.0.0.0/8"]);
        forced.force_overwrite = true;
        let replaced = seen(forced, request("10.0.0.2", &headers)).await;
        assert_eq!(replaced.as_deref(), Some("192.0.2.20"));
    }

    #[tokio::test]
    async fn test_rightmost_forwarded_used_without_peer() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.5, 192.0.2.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(seen(config(&[]), req).await.as_deref(), Some("192.0.2.1"));
    }

    #[tokio::test]
    async fn test_disabled_is_passthrough() {
        let mut disabled = config(&[]);
        disabled.enabled = false;
        let req = request("198.51.100.9", &[("x-real-ip", "1.1.1.1")]);
        assert_eq!(seen(disabled, req).await.as_deref(), Some("1.1.1.1"));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        assert!(RealIpLayer::new(&config(&["10.0.0.0/40"])).is_err());

        let mut bad_header = config(&[]);
        bad_header.target_header = "not a header".to_string();
        assert!(RealIpLayer::new(&bad_header).is_err());
    }
}
