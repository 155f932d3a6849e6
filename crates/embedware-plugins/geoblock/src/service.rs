use std::collections::HashSet;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::StatusCode;
use axum::http::header::HeaderName;
use embedware_core::net;
use embedware_core::{BoxError, HttpRequest, HttpResponse, status_response};
use futures::future::{Either, Ready, ready};
use tower::Service;
use tower_layer::Layer;
use tracing::info;

use crate::config::GeoBlockConfig;

/// Cloudflare's code for an unknown origin.
const UNKNOWN_COUNTRY: &str = "XX";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    Allow,
    Block(Option<String>),
}

#[derive(Debug)]
struct Settings {
    enabled: bool,
    country_header: HeaderName,
    client_ip_header: Option<HeaderName>,
    allowed: HashSet<String>,
    blocked: HashSet<String>,
    allow_unknown: bool,
    allow_private: bool,
    status: StatusCode,
    log_blocked: bool,
}

impl Settings {
    fn verdict(&self, request: &HttpRequest) -> Verdict {
        if !self.enabled {
            return Verdict::Allow;
        }

        if self.allow_private {
            let client = self
                .client_ip_header
                .as_ref()
                .and_then(|header| net::header_ip(request, header.as_str()))
                .or_else(|| net::peer_addr(request));
            if client.is_some_and(net::is_private) {
                return Verdict::Allow;
            }
        }

        let country = request
            .headers()
            .get(&self.country_header)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_ascii_uppercase())
            .filter(|code| !code.is_empty() && code != UNKNOWN_COUNTRY);

        match country {
            None if self.allow_unknown => Verdict::Allow,
            None => Verdict::Block(None),
            Some(code) if self.blocked.contains(&code) => Verdict::Block(Some(code)),
            Some(code) if !self.allowed.is_empty() && !self.allowed.contains(&code) => {
                Verdict::Block(Some(code))
            }
            Some(_) => Verdict::Allow,
        }
    }
}

fn country_codes(codes: &[String]) -> Result<HashSet<String>, BoxError> {
    codes
        .iter()
        .map(|code| {
            let code = code.trim();
            if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
                Ok(code.to_ascii_uppercase())
            } else {
                Err(format!("invalid country code: {code:?}").into())
            }
        })
        .collect()
}

/// Refuses requests by origin country.
#[derive(Debug, Clone)]
pub struct GeoBlockLayer {
    settings: Arc<Settings>,
}

impl GeoBlockLayer {
    pub fn new(config: &GeoBlockConfig) -> Result<Self, BoxError> {
        let client_ip_header = match config.client_ip_header.trim() {
            "" => None,
            header => Some(HeaderName::try_from(header)?),
        };

        Ok(Self {
            settings: Arc::new(Settings {
                enabled: config.enabled,
                country_header: HeaderName::try_from(config.country_header.as_str())?,
                client_ip_header,
                allowed: country_codes(&config.allowed)?,
                blocked: country_codes(&config.blocked)?,
                allow_unknown: config.allow_unknown,
                allow_private: config.allow_private,
                status: StatusCode::from_u16(config.http_status_blocked)?,
                log_blocked: config.log_blocked,
            }),
        })
    }
}

impl<S> Layer<S> for GeoBlockLayer {
    type Service = GeoBlockService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GeoBlockService {
            inner,
            settings: Arc::clone(&self.settings),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeoBlockService<S> {
    inner: S,
    settings: Arc<Settings>,
}

impl<S> Service<HttpRequest> for GeoBlockService<S>
where
    S: Service<HttpRequest, Response = HttpResponse>,
{
    type Response = HttpResponse;
    type Error = S::Error;
    type Future = Either<Ready<Result<HttpResponse, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: HttpRequest) -> Self::Future {
        match self.settings.verdict(&request) {
            Verdict::Allow => Either::Right(self.inner.call(request)),
            Verdict::Block(country) => {
                if self.settings.log_blocked {
                    info!(
                        country = country.as_deref().unwrap_or("unknown"),
                        path = request.uri().path(),
                        "Request blocked by country"
                    );
                }
                Either::Left(ready(Ok(status_response(self.settings.status))))
            }
        }
    }
}
