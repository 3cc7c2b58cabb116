use serde::{Deserialize, Serialize};

/// Policy decision point settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PdpConfig {
    /// Full URL of the decision endpoint. Unset means "not configured".
    pub endpoint: Option<String>,

    /// Must be explicitly enabled; a disabled client denies everything.
    pub enabled: bool,

    pub timeout_ms: u64,

    /// Permit plain `http://` endpoints.
    pub insecure: bool,

    /// Forwarded to the PDP as `schemaVersion`.
    pub schema_version: Option<String>,

    /// Upper bound on the decision response body.
    pub max_response_bytes: usize,
}

impl Default for PdpConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            enabled: false,
            timeout_ms: default_timeout_ms(),
            insecure: false,
            schema_version: None,
            max_response_bytes: 64 * 1024,
        }
    }
}

fn default_timeout_ms() -> u64 {
    3000
}
