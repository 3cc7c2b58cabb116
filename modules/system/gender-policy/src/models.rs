use std::time::Duration;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use talimy_security::{Gender, GenderScope, RequestIdentity, TenantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderEntity {
    Student,
    Teacher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderAction {
    List,
    Create,
    Update,
}

/// Everything the PDP needs to decide one gender-scoped action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenderPolicyCheckInput {
    pub tenant_id: TenantId,
    pub user_id: String,
    pub roles: Vec<String>,
    pub user_gender_scope: GenderScope,
    pub entity: GenderEntity,
    pub action: GenderAction,
    pub target_gender: Option<Gender>,
}

impl GenderPolicyCheckInput {
    /// Input for the verified caller of the current request.
    #[must_use]
    pub fn for_identity(
        identity: &RequestIdentity,
        entity: GenderEntity,
        action: GenderAction,
        target_gender: Option<Gender>,
    ) -> Self {
        Self {
            tenant_id: identity.tenant_id().clone(),
            user_id: identity.user_id().to_owned(),
            roles: identity.roles().iter().cloned().collect(),
            user_gender_scope: identity.gender_scope(),
            entity,
            action,
            target_gender,
        }
    }
}

/// JSON body sent to the PDP.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdpRequest<'a> {
    pub tenant_id: &'a str,
    pub user_id: &'a str,
    pub roles: &'a [String],
    pub user_gender_scope: GenderScope,
    pub entity: GenderEntity,
    pub action: GenderAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_gender: Option<Gender>,
    pub schema_version: &'a str,
}

impl<'a> PdpRequest<'a> {
    #[must_use]
    pub fn new(input: &'a GenderPolicyCheckInput, schema_version: &'a str) -> Self {
        Self {
            tenant_id: input.tenant_id.as_str(),
            user_id: &input.user_id,
            roles: &input.roles,
            user_gender_scope: input.user_gender_scope,
            entity: input.entity,
            action: input.action,
            target_gender: input.target_gender,
            schema_version,
        }
    }
}

/// Why a decision came out as deny. Logged, never sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DenyReason {
    #[error("PDP is not configured")]
    NotConfigured,

    #[error("PDP answered with HTTP {0}")]
    HttpStatus(StatusCode),

    #[error("PDP response is malformed: {0}")]
    Malformed(String),

    #[error("PDP request failed: {0}")]
    Transport(String),

    #[error("PDP did not answer within {} ms", .0.as_millis())]
    TimedOut(Duration),

    #[error("PDP denied the action")]
    Denied,
}

/// Outcome of a policy check. Anything but an explicit allow is `Deny`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    Deny(DenyReason),
}
