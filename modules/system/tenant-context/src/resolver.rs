//! Origin-side tenant resolution.

use std::sync::Arc;

use http::{HeaderMap, StatusCode};
use talimy_errors::Fault;
use talimy_security::{TenantContext, TenantId, TenantSlug, TenantSource};
use thiserror::Error;

use crate::config::{IdHeaderPolicy, TenancyConfig};
use crate::directory::{TenantDirectory, TenantDirectoryError, TenantStatus};
use crate::host::{HostClassifier, HostScope};

pub const TENANT_ID_HEADER: &str = "x-tenant-id";
pub const TENANT_SLUG_HEADER: &str = "x-tenant-slug";

#[derive(Debug, Error)]
pub enum TenantContextError {
    #[error("tenant slug header {header} does not match host slug {host}")]
    SlugMismatch { header: TenantSlug, host: TenantSlug },

    #[error("tenant id header {header} does not match tenant {resolved} of slug {slug}")]
    IdMismatch {
        header: TenantId,
        resolved: TenantId,
        slug: TenantSlug,
    },

    #[error("tenant {slug} is not active")]
    Inactive { slug: TenantSlug },

    #[error(transparent)]
    Directory(#[from] TenantDirectoryError),
}

impl From<TenantContextError> for Fault {
    fn from(err: TenantContextError) -> Self {
        match err {
            TenantContextError::SlugMismatch { .. } => {
                Fault::http(StatusCode::BAD_REQUEST, "Tenant slug mismatch")
            }
            TenantContextError::IdMismatch { .. } => {
                Fault::http(StatusCode::FORBIDDEN, "Tenant mismatch")
            }
            TenantContextError::Inactive { .. } => {
                Fault::http(StatusCode::FORBIDDEN, "Tenant is not active")
            }
            TenantContextError::Directory(err) => err.into(),
        }
    }
}

impl axum::response::IntoResponse for TenantContextError {
    fn into_response(self) -> axum::response::Response {
        Fault::from(self).into_response()
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub scope: HostScope,
    pub context: TenantContext,
}

/// Produces the authoritative tenant of a request from its headers.
#[derive(Clone)]
pub struct TenantContextResolver {
    classifier: HostClassifier,
    directory: Arc<dyn TenantDirectory>,
    id_header_policy: IdHeaderPolicy,
}

impl TenantContextResolver {
    #[must_use]
    pub fn new(config: &TenancyConfig, directory: Arc<dyn TenantDirectory>) -> Self {
        Self {
            classifier: HostClassifier::new(config),
            directory,
            id_header_policy: config.id_header_policy,
        }
    }

    /// Resolve the request tenant.
    ///
    /// Precedence: explicit tenant-id header, tenant-slug header, host-derived
    /// slug, then no tenant. Under [`IdHeaderPolicy::CrossCheck`] an id header
    /// that coexists with a slug signal must name the tenant the slug resolves to.
    ///
    /// # Errors
    /// - `SlugMismatch` when the slug header and the host name different schools
    /// - `Directory(NotFound)` when the slug has no tenant
    /// - `Inactive` when the tenant exists but is not active
    /// - `IdMismatch` when the id header disagrees with the resolved slug
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<Resolution, TenantContextError> {
        let host = self.classifier.effective_host(headers);
        let scope = self.classifier.classify(&host);

        let id_header = read_header(headers, TENANT_ID_HEADER).map(TenantId::new);
        let slug_header = read_header(headers, TENANT_SLUG_HEADER).and_then(TenantSlug::parse);
        let host_slug = scope.school_slug().cloned();

        if self.id_header_policy == IdHeaderPolicy::Trusted
            && let Some(id) = id_header.clone()
        {
            if slug_header.is_some() || host_slug.is_some() {
                tracing::warn!(
                    tenant_id = %id,
                    host = %host,
                    "trusted tenant id header overrides slug signal"
                );
            }
            return Ok(Resolution {
                scope,
                context: TenantContext::from_id(id),
            });
        }

        if let (Some(header), Some(from_host)) = (&slug_header, &host_slug)
            && header != from_host
        {
            return Err(TenantContextError::SlugMismatch {
                header: header.clone(),
                host: from_host.clone(),
            });
        }

        let slug_signal = match (slug_header, host_slug) {
            (Some(slug), _) => Some((slug, TenantSource::SlugHeader)),
            (None, Some(slug)) => Some((slug, TenantSource::Host)),
            (None, None) => None,
        };

        let context = match (slug_signal, id_header) {
            (Some((slug, source)), id_header) => {
                let record = self.directory.resolve_by_slug(&slug).await?;
                if record.status != TenantStatus::Active {
                    return Err(TenantContextError::Inactive { slug: record.slug });
                }
                if let Some(header) = id_header
                    && header != record.id
                {
                    tracing::warn!(
                        header_tenant = %header,
                        resolved_tenant = %record.id,
                        slug = %record.slug,
                        "tenant id header disagrees with slug"
                    );
                    return Err(TenantContextError::IdMismatch {
                        header,
                        resolved: record.id,
                        slug: record.slug,
                    });
                }
                TenantContext::resolved(record.id, record.slug, source)
            }
            (None, Some(id)) => TenantContext::from_id(id),
            (None, None) => TenantContext::none(),
        };

        tracing::debug!(
            host = %host,
            tenant_id = context.tenant_id().map(TenantId::as_str),
            "tenant context resolved"
        );
        Ok(Resolution { scope, context })
    }
}

/// First value of a header, trimmed; blank counts as absent.
fn read_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
