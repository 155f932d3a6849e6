use serde::{Deserialize, Serialize};

/// Configuration of the `crowdsec` plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrowdsecConfig {
    pub enabled: bool,

    /// Header carrying the client address, set by a trusted hop such as
    /// `realip`. Empty means the peer address.
    pub client_ip_header: String,

    /// Addresses or CIDRs with a ban decision.
    #[serde(rename = "bannedIPs")]
    pub banned_ips: Vec<String>,

    /// Addresses or CIDRs with a captcha decision.
    #[serde(rename = "captchaIPs")]
    pub captcha_ips: Vec<String>,

    pub http_status_banned: u16,

    pub http_status_captcha: u16,

    /// Response header naming the applied remediation. Empty disables it.
    pub remediation_header: String,
}

impl Default for CrowdsecConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            client_ip_header: String::new(),
            banned_ips: Vec::new(),
            captcha_ips: Vec::new(),
            http_status_banned: 403,
            http_status_captcha: 401,
            remediation_header: String::new(),
        }
    }
}
