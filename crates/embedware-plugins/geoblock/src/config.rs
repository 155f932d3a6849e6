use serde::{Deserialize, Serialize};

/// Configuration of the `geoblock` plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeoBlockConfig {
    pub enabled: bool,

    /// Header carrying the ISO 3166 country code, set by the edge.
    pub country_header: String,

    /// Header carrying the client address, used for `allow_private`. Empty
    /// means the peer address; only name a header a trusted hop sets.
    pub client_ip_header: String,

    /// Country codes let through. Empty means every country not blocked.
    pub allowed: Vec<String>,

    /// Country codes always refused.
    pub blocked: Vec<String>,

    /// Let requests without a usable country code through.
    pub allow_unknown: bool,

    /// Let private, loopback and link-local clients through.
    pub allow_private: bool,

    pub http_status_blocked: u16,

    /// Log every refused request at info level.
    pub log_blocked: bool,
}

impl Default for GeoBlockConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            country_header: "CF-IPCountry".to_string(),
            client_ip_header: String::new(),
            allowed: Vec::new(),
            blocked: Vec::new(),
            allow_unknown: true,
            allow_private: true,
            http_status_blocked: 403,
            log_blocked: false,
        }
    }
}
