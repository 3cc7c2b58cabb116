//! Gateway handlers. Every reply is an [`ApiResponse`] or a [`Fault`].

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use gender_policy::{GenderAction, GenderEntity, GenderPolicyCheckInput};
use serde::{Deserialize, Serialize};
use talimy_auth::Identity;
use talimy_errors::{ApiResponse, Fault};
use talimy_security::{Gender, RequestIdentity, TenantContext};
use tenant_context::HostScope;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RequestContextView {
    pub scope: HostScope,
    pub tenant: TenantContext,
}

#[derive(Debug, Serialize)]
pub struct MeView {
    pub user: RequestIdentity,
    pub tenant: TenantContext,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenderCheckRequest {
    pub entity: GenderEntity,
    pub action: GenderAction,
    #[serde(default)]
    pub target_gender: Option<Gender>,
}

#[derive(Debug, Serialize)]
pub struct GenderCheckResult {
    pub allowed: bool,
}

#[allow(clippy::unused_async)]
pub async fn health() -> ApiResponse<HealthStatus> {
    ApiResponse::ok(HealthStatus { status: "ok" })
        .with_meta(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") }))
}

#[allow(clippy::unused_async)]
pub async fn request_context(
    Extension(scope): Extension<HostScope>,
    Extension(tenant): Extension<TenantContext>,
) -> ApiResponse<RequestContextView> {
    ApiResponse::ok(RequestContextView { scope, tenant })
}

#[allow(clippy::unused_async)]
pub async fn me(
    Identity(user): Identity,
    Extension(tenant): Extension<TenantContext>,
) -> ApiResponse<MeView> {
    ApiResponse::ok(MeView { user, tenant })
}

/// Asks the policy decision point whether the caller may perform the action.
///
/// # Errors
/// A malformed body is `400`; a policy deny is `403`; an unusable PDP is `503`.
pub async fn gender_policy_check(
    State(state): State<AppState>,
    Identity(user): Identity,
    body: Result<Json<GenderCheckRequest>, JsonRejection>,
) -> Result<ApiResponse<GenderCheckResult>, Fault> {
    let Json(request) = body?;
    let input = GenderPolicyCheckInput::for_identity(
        &user,
        request.entity,
        request.action,
        request.target_gender,
    );
    state.enforcer.assert_access(&input).await?;
    Ok(ApiResponse::ok(GenderCheckResult { allowed: true }))
}
