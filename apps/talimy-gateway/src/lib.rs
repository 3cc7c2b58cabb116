//! Talimy gateway: tenant resolution, authentication, gender-policy
//! enforcement and the uniform error contract composed into one axum router.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod logging;
pub mod router;
pub mod routes;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use router::build_router;
pub use state::AppState;
