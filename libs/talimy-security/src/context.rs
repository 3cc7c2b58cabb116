use serde::Serialize;

use crate::tenant::{TenantId, TenantSlug};

/// Which request signal produced the tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantSource {
    /// Explicit tenant-id header, taken verbatim.
    IdHeader,
    /// Explicit tenant-slug header resolved through the directory.
    SlugHeader,
    /// Slug derived from the request host resolved through the directory.
    Host,
}

/// Tenant attached to a single request.
///
/// An empty context (no tenant) is a valid outcome for platform, API and
/// public hosts; tenant-scoped routes reject it on their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant_id: Option<TenantId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant_slug: Option<TenantSlug>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<TenantSource>,
}

impl TenantContext {
    /// Context with no tenant attached.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Tenant taken from an explicit id signal; no canonical slug is known.
    #[must_use]
    pub fn from_id(tenant_id: TenantId) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            tenant_slug: None,
            source: Some(TenantSource::IdHeader),
        }
    }

    /// Tenant resolved from a slug through the tenant directory.
    #[must_use]
    pub fn resolved(tenant_id: TenantId, tenant_slug: TenantSlug, source: TenantSource) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            tenant_slug: Some(tenant_slug),
            source: Some(source),
        }
    }

    #[must_use]
    pub fn tenant_id(&self) -> Option<&TenantId> {
        self.tenant_id.as_ref()
    }

    #[must_use]
    pub fn tenant_slug(&self) -> Option<&TenantSlug> {
        self.tenant_slug.as_ref()
    }

    #[must_use]
    pub fn source(&self) -> Option<TenantSource> {
        self.source
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tenant_id.is_none()
    }
}
