use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Development fallback; `talimy-gateway check` warns when it is still in use.
pub const DEV_ACCESS_SECRET: &str = "dev-access-secret-change-me";

/// Access-token verification settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// HS256 shared secret for access tokens.
    pub access_secret: SecretString,

    /// Leeway in seconds applied to `exp`.
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: SecretString::from(DEV_ACCESS_SECRET),
            leeway_seconds: default_leeway_seconds(),
        }
    }
}

fn default_leeway_seconds() -> u64 {
    60
}

/// Printable view of [`AuthConfig`] with the secret redacted.
#[derive(Debug, Serialize)]
pub struct RedactedAuthConfig {
    pub access_secret: &'static str,
    pub leeway_seconds: u64,
}

impl AuthConfig {
    #[must_use]
    pub fn redacted(&self) -> RedactedAuthConfig {
        RedactedAuthConfig {
            access_secret: "[REDACTED]",
            leeway_seconds: self.leeway_seconds,
        }
    }

    #[must_use]
    pub fn uses_dev_secret(&self) -> bool {
        use secrecy::ExposeSecret;
        self.access_secret.expose_secret() == DEV_ACCESS_SECRET
    }
}
