use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::StatusCode;
use axum::http::header::{HeaderName, HeaderValue};
use embedware_core::net;
use embedware_core::{BoxError, HttpRequest, HttpResponse, status_response};
use futures::future::{Either, Ready, ready};
use tower::Service;
use tower_layer::Layer;
use tracing::debug;

use crate::config::CrowdsecConfig;
use crate::decision::{Decisions, Remediation};

#[derive(Debug)]
struct Settings {
    enabled: bool,
    client_ip_header: Option<HeaderName>,
    decisions: Decisions,
    status_banned: StatusCode,
    status_captcha: StatusCode,
    remediation_header: Option<HeaderName>,
}

impl Settings {
    fn remediation(&self, request: &HttpRequest) -> Option<Remediation> {
        if !self.enabled {
            return None;
        }
        let client = self
            .client_ip_header
            .as_ref()
            .and_then(|header| net::header_ip(request, header.as_str()))
            .or_else(|| net::peer_addr(request))?;
        let remediation = self.decisions.lookup(client)?;
        debug!(client = %client, remediation = %remediation, "Decision matched");
        Some(remediation)
    }

    fn respond(&self, remediation: Remediation) -> HttpResponse {
        let status = match remediation {
            Remediation::Ban => self.status_banned,
            Remediation::Captcha => self.status_captcha,
        };
        let mut response = status_response(status);
        if let Some(header) = &self.remediation_header {
            response
                .headers_mut()
                .insert(header.clone(), HeaderValue::from_static(remediation.as_str()));
        }
        response
    }
}

/// Applies static ban/captcha decisions to client addresses.
#[derive(Debug, Clone)]
pub struct CrowdsecLayer {
    settings: Arc<Settings>,
}

impl CrowdsecLayer {
    pub fn new(config: &CrowdsecConfig) -> Result<Self, BoxError> {
        let remediation_header = match config.remediation_header.trim() {
            "" => None,
            header => Some(HeaderName::try_from(header)?),
        };
        let client_ip_header = match config.client_ip_header.trim() {
            "" => None,
            header => Some(HeaderName::try_from(header)?),
        };

        Ok(Self {
            settings: Arc::new(Settings {
                enabled: config.enabled,
                client_ip_header,
                decisions: Decisions::new(&config.banned_ips, &config.captcha_ips)?,
                status_banned: StatusCode::from_u16(config.http_status_banned)?,
                status_captcha: StatusCode::from_u16(config.http_status_captcha)?,
                remediation_header,
            }),
        })
    }

    pub fn decisions(&self) -> usize {
        self.settings.decisions.len()
    }
}

impl<S> Layer<S> for CrowdsecLayer {
    type Service = CrowdsecService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CrowdsecService {
            inner,
            settings: Arc::clone(&self.settings),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrowdsecService<S> {
    inner: S,
    settings: Arc<Settings>,
}

impl<S> Service<HttpRequest> for CrowdsecService<S>
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
        match self.settings.remediation(&request) {
            Some(remediation) => Either::Left(ready(Ok(self.settings.respond(remediation)))),
            None => Either::Right(self.inner.call(request)),
        }
    }
}
