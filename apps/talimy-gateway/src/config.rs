//! Layered application configuration.
//!
//! Layers, lowest to highest precedence: built-in defaults, YAML file,
//! `TALIMY__*` environment variables (`__` separates nesting levels), CLI flags.

use std::net::SocketAddr;
use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use gender_policy::{PdpConfig, PdpConfigError};
use serde::{Deserialize, Serialize};
use talimy_auth::AuthConfig;
use tenant_context::{TenancyConfig, TenantEntryError};
use thiserror::Error;

use crate::logging::LoggingConfig;

pub const ENV_PREFIX: &str = "TALIMY__";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration load failed: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid bind address {0}")]
    InvalidBind(String),

    #[error("invalid CORS origin {0}")]
    InvalidCorsOrigin(String),

    #[error("request_timeout_ms must be positive")]
    ZeroRequestTimeout,

    #[error(transparent)]
    Tenants(#[from] TenantEntryError),

    #[error(transparent)]
    Policy(#[from] PdpConfigError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Whole-request deadline.
    pub request_timeout_ms: u64,

    /// Browser origins allowed by CORS. Empty disables the CORS layer.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            request_timeout_ms: 15_000,
            cors_allowed_origins: vec![
                "https://talimy.space".to_owned(),
                "https://www.talimy.space".to_owned(),
                "https://platform.talimy.space".to_owned(),
            ],
        }
    }
}

impl ServerConfig {
    /// # Errors
    /// `ConfigError::InvalidBind` if host and port do not form a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidBind(format!("{}:{}", self.host, self.port)))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub tenancy: TenancyConfig,
    pub auth: AuthConfig,
    pub policy: PdpConfig,
}

impl AppConfig {
    /// Defaults, then the optional YAML file, then `TALIMY__*` environment variables.
    ///
    /// # Errors
    /// `ConfigError::Load` when a layer cannot be read or does not fit the schema.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// # Errors
    /// `ConfigError::Load` when the figment does not fit the schema.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::Load(Box::new(e)))
    }

    pub fn apply_cli_overrides(&mut self, port: Option<u16>, verbose: u8) {
        if let Some(port) = port {
            self.server.port = port;
        }
        match verbose {
            0 => {}
            1 => "info".clone_into(&mut self.logging.level),
            2 => "debug".clone_into(&mut self.logging.level),
            _ => "trace".clone_into(&mut self.logging.level),
        }
    }

    /// Checks that need more than deserialization.
    ///
    /// # Errors
    /// The first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.bind_addr()?;
        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroRequestTimeout);
        }
        for origin in &self.server.cors_allowed_origins {
            if axum::http::HeaderValue::from_str(origin).is_err() {
                return Err(ConfigError::InvalidCorsOrigin(origin.clone()));
            }
        }
        Ok(())
    }

    /// Effective configuration with secrets redacted.
    #[must_use]
    pub fn redacted(&self) -> serde_json::Value {
        serde_json::json!({
            "server": self.server,
            "logging": self.logging,
            "tenancy": self.tenancy,
            "auth": self.auth.redacted(),
            "policy": self.policy,
        })
    }
}
