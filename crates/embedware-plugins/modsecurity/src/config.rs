use serde::{Deserialize, Serialize};

/// Configuration of the `modsecurity` plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModSecurityConfig {
    /// Base URL of the WAF; the request path and query are appended.
    #[serde(rename = "modSecurityUrl")]
    pub modsecurity_url: String,

    pub timeout_millis: u64,

    /// Largest request body buffered for inspection, in bytes.
    pub max_body_size: usize,

    /// Pass requests on when the WAF cannot be reached.
    pub fail_open: bool,
}

impl Default for ModSecurityConfig {
    fn default() -> Self {
        Self {
            modsecurity_url: String::new(),
            timeout_millis: 2000,
            max_body_size: 10 * 1024 * 1024,
            fail_open: false,
        }
    }
}
