//! Error contract for the Talimy gateway.
//!
//! Every failure raised by the request pipeline is carried as a [`Fault`] and
//! rendered by [`normalize`] into the single failure envelope
//! `{success: false, error: {code, message, details?}}`. Successful handlers
//! reply with [`ApiResponse`].
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod axum_ext;
pub mod envelope;
pub mod fault;
pub mod normalize;

pub use axum_ext::{ErrorReport, error_contract, not_found_fallback, panic_response};
pub use envelope::{ApiResponse, ErrorBody, ErrorDetail, ErrorDetails, ErrorEnvelope};
pub use fault::{DatabaseFault, Fault, FieldViolation, HttpPayload};
pub use normalize::{Normalized, default_code_for_status, normalize};
