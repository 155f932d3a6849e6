//! HTTP handler types shared by the registry and every embedded plugin.
//!
//! A handler is a type-erased tower [`Service`] from [`HttpRequest`] to
//! [`HttpResponse`]. Embedded plugins receive the *next* handler in the chain
//! as a [`BoxedHandler`] and return a new [`BoxedHandler`] wrapping it, so any
//! number of them can be stacked by the caller's chain builder.
//!
//! # Example
//!
//! ```rust,ignore
//! use embedware_core::handler::{handler_fn, status_response};
//! use axum::http::StatusCode;
//!
//! let terminal = handler_fn(|_req| async { Ok(status_response(StatusCode::OK)) });
//! ```

use std::future::Future;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use tower::util::BoxCloneSyncService;
use tower::{BoxError, Service, ServiceExt};

/// Request type flowing through a handler chain.
pub type HttpRequest = Request<Body>;

/// Response type produced by a handler chain.
pub type HttpResponse = Response<Body>;

/// A type-erased, `Clone + Send + Sync` handler.
///
/// This is both the *next* handler given to a plugin and the handler the
/// plugin hands back.
pub type BoxedHandler = BoxCloneSyncService<HttpRequest, HttpResponse, BoxError>;

/// Boxes any compatible tower service into a [`BoxedHandler`].
pub fn boxed<S>(service: S) -> BoxedHandler
where
    S: Service<HttpRequest, Response = HttpResponse> + Clone + Send + Sync + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send + 'static,
{
    BoxCloneSyncService::new(service.map_err(Into::into))
}

/// Turns an async closure into a [`BoxedHandler`].
///
/// Mostly useful for terminal handlers and tests.
pub fn handler_fn<F, Fut>(f: F) -> BoxedHandler
where
    F: Fn(HttpRequest) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, BoxError>> + Send + 'static,
{
    BoxCloneSyncService::new(tower::service_fn(f))
}

/// Builds an empty-bodied response carrying `status` and its canonical reason.
pub fn status_response(status: StatusCode) -> HttpResponse {
    let mut response = Response::new(Body::from(status.canonical_reason().unwrap_or_default()));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handler_fn_serves_requests() {
        let handler = handler_fn(|_req| async { Ok(status_response(StatusCode::ACCEPTED)) });

        let response = handler.oneshot(Request::new(Body::empty())).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_boxed_handler_is_cloneable() {
        let handler = handler_fn(|_req| async { Ok(status_response(StatusCode::OK)) });
        let copy = handler.clone();

        let first = handler.oneshot(Request::new(Body::empty())).await.unwrap();
        let second = copy.oneshot(Request::new(Body::empty())).await.unwrap();
        assert_eq!(first.status(), second.status());
    }
}
