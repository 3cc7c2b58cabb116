use serde::{Deserialize, Serialize};

use crate::directory::TenantStatus;

/// How an explicit tenant-id header is treated when a slug signal is also present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdHeaderPolicy {
    /// Resolve the slug and require the id header to name the same tenant.
    #[default]
    CrossCheck,
    /// Take the id header verbatim and ignore slug signals.
    ///
    /// Only for deployments where the header is set by a trusted proxy.
    Trusted,
}

/// Tenancy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TenancyConfig {
    /// Production base domain; `<slug>.<base_domain>` is a school host.
    pub base_domain: String,

    /// Local development base domain; `<slug>.<dev_base_domain>` is a school host.
    pub dev_base_domain: String,

    /// Leading labels that never name a school.
    pub reserved_subdomains: Vec<String>,

    pub id_header_policy: IdHeaderPolicy,

    /// Entries served by the in-process tenant directory.
    pub tenants: Vec<TenantEntry>,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            base_domain: "talimy.space".to_owned(),
            dev_base_domain: "localhost".to_owned(),
            reserved_subdomains: ["www", "api", "platform", "localhost"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            id_header_policy: IdHeaderPolicy::default(),
            tenants: Vec::new(),
        }
    }
}

/// A single tenant of the static directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantEntry {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub status: TenantStatus,
}
