use std::sync::Arc;
use std::time::Duration;

use gender_policy::{GenderPolicyEnforcer, HttpPolicyDecisionClient};
use talimy_auth::{HmacTokenVerifier, TokenVerifier};
use tenant_context::{StaticTenantDirectory, TenantContextResolver, TenantDirectory};

use crate::config::{AppConfig, ConfigError};

/// Shared components built once from [`AppConfig`].
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<TenantContextResolver>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub enforcer: GenderPolicyEnforcer,
    pub request_timeout: Duration,
    pub cors_allowed_origins: Vec<String>,
}

impl AppState {
    /// # Errors
    /// Returns `ConfigError` when the tenant directory or the PDP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let tenants = StaticTenantDirectory::new(&config.tenancy.tenants)?;
        if tenants.is_empty() {
            tracing::warn!("tenant directory is empty; every school host will be rejected");
        } else {
            tracing::info!(tenants = tenants.len(), "tenant directory loaded");
        }
        let directory: Arc<dyn TenantDirectory> = Arc::new(tenants);
        let pdp = HttpPolicyDecisionClient::new(&config.policy)?;
        if !pdp.is_configured() {
            tracing::warn!("policy decision point not configured; gender-scoped actions will be refused");
        }
        if config.auth.uses_dev_secret() {
            tracing::warn!("auth.access_secret is the development default");
        }

        Ok(Self {
            resolver: Arc::new(TenantContextResolver::new(&config.tenancy, directory)),
            verifier: Arc::new(HmacTokenVerifier::new(&config.auth)),
            enforcer: GenderPolicyEnforcer::new(pdp.into_shared()),
            request_timeout: Duration::from_millis(config.server.request_timeout_ms),
            cors_allowed_origins: config.server.cors_allowed_origins.clone(),
        })
    }
}
