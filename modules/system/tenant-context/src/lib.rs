//! Per-request tenant attribution.
//!
//! [`HostClassifier`] maps the effective request host to a [`HostScope`];
//! [`TenantContextResolver`] combines it with the explicit tenant headers and
//! the [`TenantDirectory`] into one [`talimy_security::TenantContext`], or
//! rejects inconsistent signals.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod directory;
pub mod host;
pub mod middleware;
pub mod resolver;

pub use config::{IdHeaderPolicy, TenancyConfig, TenantEntry};
pub use directory::{
    StaticTenantDirectory, TenantEntryError, TenantDirectory, TenantDirectoryError,
    TenantRecord, TenantStatus,
};
pub use host::{HostClassifier, HostScope};
pub use middleware::resolve_tenant;
pub use resolver::{Resolution, TENANT_ID_HEADER, TENANT_SLUG_HEADER, TenantContextError, TenantContextResolver};
