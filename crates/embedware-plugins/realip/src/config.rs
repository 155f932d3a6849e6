use serde::{Deserialize, Serialize};

/// Configuration of the `realip` plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RealIpConfig {
    pub enabled: bool,

    /// Proxies whose forwarding headers are believed (addresses or CIDRs).
    #[serde(rename = "trustedIPs")]
    pub trusted_ips: Vec<String>,

    /// Forwarding headers consulted in order.
    pub headers: Vec<String>,

    /// Header receiving the resolved client address.
    pub target_header: String,

    /// Replace a target header already present on a trusted request.
    pub force_overwrite: bool,
}

impl Default for RealIpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trusted_ips: Vec::new(),
            headers: vec!["X-Forwarded-For".to_string(), "X-Real-Ip".to_string()],
            target_header: "X-Real-Ip".to_string(),
            force_overwrite: false,
        }
    }
}
