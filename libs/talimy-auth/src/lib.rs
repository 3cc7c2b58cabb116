//! Authentication and route authorization for the Talimy gateway.
//!
//! The guard chain runs in a fixed order and stops at the first failure:
//! identity (bearer token), roles, tenant scope, gender scope.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod axum_ext;
pub mod claims;
pub mod config;
pub mod errors;
pub mod guard;
pub mod verifier;

pub use axum_ext::{AuthState, Identity, require_auth};
pub use claims::{AccessClaims, TokenType};
pub use config::AuthConfig;
pub use errors::AuthError;
pub use guard::{RouteGuard, check_route};
pub use verifier::{HmacTokenVerifier, TokenVerifier};
