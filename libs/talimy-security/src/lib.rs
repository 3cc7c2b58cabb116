//! Request-scoped security types shared by the gateway crates.
//!
//! - [`TenantId`], [`TenantSlug`] - tenant keys
//! - [`RequestIdentity`], [`GenderScope`], [`Gender`] - the authenticated caller
//! - [`TenantContext`] - the tenant attached to one request by the resolver

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod context;
pub mod identity;
pub mod tenant;

pub use context::{TenantContext, TenantSource};
pub use identity::{Gender, GenderScope, ParseGenderError, RequestIdentity};
pub use tenant::{TenantId, TenantSlug};
