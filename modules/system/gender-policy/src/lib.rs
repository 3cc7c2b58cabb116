//! Policy decision point client for gender-scoped actions on student and
//! teacher records.
//!
//! Fails closed: the only way to obtain [`PolicyDecision::Allow`] is a
//! well-formed response whose `allow` field is exactly `true`.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod client;
pub mod config;
pub mod enforcer;
pub mod models;

pub use client::{HttpPolicyDecisionClient, PdpConfigError, PolicyDecisionPoint};
pub use config::PdpConfig;
pub use enforcer::{GenderPolicyEnforcer, PolicyError};
pub use models::{
    DenyReason, GenderAction, GenderEntity, GenderPolicyCheckInput, PdpRequest, PolicyDecision,
};
