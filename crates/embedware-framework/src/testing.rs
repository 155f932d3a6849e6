use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode};
use embedware_core::{
    BoxError, BoxedHandler, ConfigBag, EmbeddedPlugin, PluginContext, handler_fn, status_response,
};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub name: String,
    pub tags: Vec<String>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            tags: Vec::new(),
        }
    }
}

/// Answers every request with an `x-label` header describing its configuration.
pub struct Label;

impl EmbeddedPlugin for Label {
    const NAME: &'static str = "label";
    const DESCRIPTION: &'static str = "Stamps responses with its configuration";
    type Config = LabelConfig;

    fn default_config() -> LabelConfig {
        LabelConfig::default()
    }

    fn construct(
        _ctx: &PluginContext,
        _next: BoxedHandler,
        config: LabelConfig,
        name: &str,
    ) -> Result<BoxedHandler, BoxError> {
        let value = format!("{}:{}:{}", name, config.name, config.tags.join("|"));
        Ok(handler_fn(move |_req| {
            let value = value.clone();
            async move {
                let mut response = status_response(StatusCode::OK);
                response
                    .headers_mut()
                    .insert("x-label", HeaderValue::from_str(&value)?);
                Ok::<_, BoxError>(response)
            }
        }))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokenConfig {
    pub reason: String,
}

/// Decodes fine but always refuses to construct.
pub struct Broken;

impl EmbeddedPlugin for Broken {
    const NAME: &'static str = "broken";
    type Config = BrokenConfig;

    fn default_config() -> BrokenConfig {
        BrokenConfig {
            reason: "refused".to_string(),
        }
    }

    fn construct(
        _ctx: &PluginContext,
        _next: BoxedHandler,
        config: BrokenConfig,
        _name: &str,
    ) -> Result<BoxedHandler, BoxError> {
        Err(config.reason.into())
    }
}

/// Configured by a bare number, which has no map form to overlay a bag on.
pub struct Scalar;

impl EmbeddedPlugin for Scalar {
    const NAME: &'static str = "scalar";
    type Config = u32;

    fn default_config() -> u32 {
        5
    }

    fn construct(
        _ctx: &PluginContext,
        _next: BoxedHandler,
        _config: u32,
        _name: &str,
    ) -> Result<BoxedHandler, BoxError> {
        Ok(terminal())
    }
}

pub fn bag(value: serde_json::Value) -> ConfigBag {
    value.as_object().cloned().unwrap()
}

pub fn terminal() -> BoxedHandler {
    handler_fn(|_req| async { Ok(status_response(StatusCode::OK)) })
}

pub async fn label_of(handler: BoxedHandler) -> String {
    let response = handler.oneshot(Request::new(Body::empty())).await.unwrap();
    response.headers()["x-label"].to_str().unwrap().to_string()
}
