use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_LENGTH, HOST};
use axum::http::request::Parts;
use axum::http::{Request, StatusCode};
use embedware_core::{BoxError, HttpRequest, HttpResponse, status_response};
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tower::Service;
use tower_layer::Layer;
use tracing::{debug, warn};

use crate::config::ModSecurityConfig;

#[derive(Debug)]
struct Settings {
    client: reqwest::Client,
    url: String,
    max_body_size: usize,
    fail_open: bool,
    shutdown: CancellationToken,
}

impl Settings {
    /// Replays the request against the WAF and returns its verdict status.
    async fn inspect(&self, parts: &Parts, body: Bytes) -> Result<StatusCode, reqwest::Error> {
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let mut headers = parts.headers.clone();
        headers.remove(HOST);
        headers.remove(CONTENT_LENGTH);

        let response = self
            .client
            .request(parts.method.clone(), format!("{}{}", self.url, path))
            .headers(headers)
            .body(body)
            .send()
            .await?;
        Ok(response.status())
    }
}

/// Forwards a copy of every request to a ModSecurity endpoint before
/// letting it through.
#[derive(Debug, Clone)]
pub struct ModSecurityLayer {
    settings: Arc<Settings>,
}

impl ModSecurityLayer {
    pub fn new(config: &ModSecurityConfig, shutdown: CancellationToken) -> Result<Self, BoxError> {
        let url = config.modsecurity_url.trim().trim_end_matches('/');
        if url.is_empty() {
            return Err("modSecurityUrl is required".into());
        }
        reqwest::Url::parse(url)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_millis))
            .no_proxy()
            .build()?;

        Ok(Self {
            settings: Arc::new(Settings {
                client,
                url: url.to_string(),
                max_body_size: config.max_body_size,
                fail_open: config.fail_open,
                shutdown,
            }),
        })
    }

    pub fn url(&self) -> &str {
        &self.settings.url
    }
}

impl<S> Layer<S> for ModSecurityLayer {
    type Service = ModSecurityService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ModSecurityService {
            inner,
            settings: Arc::clone(&self.settings),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModSecurityService<S> {
    inner: S,
    settings: Arc<Settings>,
}

impl<S> Service<HttpRequest> for ModSecurityService<S>
where
    S: Service<HttpRequest, Response = HttpResponse, Error = BoxError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = HttpResponse;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<HttpResponse, BoxError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: HttpRequest) -> Self::Future {
        // Take the service that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let settings = Arc::clone(&self.settings);

        Box::pin(async move {
            if settings.shutdown.is_cancelled() {
                return Ok(status_response(StatusCode::SERVICE_UNAVAILABLE));
            }

            let (parts, body) = request.into_parts();
            let body = match axum::body::to_bytes(body, settings.max_body_size).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    debug!(error = %err, limit = settings.max_body_size, "Request body rejected");
                    return Ok(status_response(StatusCode::PAYLOAD_TOO_LARGE));
                }
            };

            match settings.inspect(&parts, body.clone()).await {
                Ok(status) if status.is_client_error() || status.is_server_error() => {
                    debug!(status = status.as_u16(), path = parts.uri.path(), "Request refused by WAF");
                    return Ok(status_response(status));
                }
                Ok(_) => {}
                Err(err) if settings.fail_open => {
                    warn!(error = %err, "WAF unreachable, letting request through");
                }
                Err(err) => {
                    warn!(error = %err, "WAF unreachable");
                    return Ok(status_response(StatusCode::BAD_GATEWAY));
                }
            }

            inner.call(Request::from_parts(parts, Body::from(body))).await
        })
    }
}
