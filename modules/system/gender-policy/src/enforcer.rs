use std::sync::Arc;

use http::StatusCode;
use talimy_errors::Fault;
use thiserror::Error;

use crate::client::PolicyDecisionPoint;
use crate::models::{DenyReason, GenderPolicyCheckInput, PolicyDecision};

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Authorization policy denied")]
    Denied,

    #[error("Authorization policy check unavailable")]
    Unavailable,
}

impl From<PolicyError> for Fault {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Denied => Fault::http(StatusCode::FORBIDDEN, err.to_string()),
            PolicyError::Unavailable => {
                Fault::http(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
        }
    }
}

/// Gate for gender-scoped handlers. The action proceeds only after an allow.
#[derive(Clone)]
pub struct GenderPolicyEnforcer {
    pdp: Arc<dyn PolicyDecisionPoint>,
}

impl GenderPolicyEnforcer {
    #[must_use]
    pub fn new(pdp: Arc<dyn PolicyDecisionPoint>) -> Self {
        Self { pdp }
    }

    /// # Errors
    /// `PolicyError::Denied` for an explicit deny, `PolicyError::Unavailable`
    /// for every other deny cause.
    pub async fn assert_access(&self, input: &GenderPolicyCheckInput) -> Result<(), PolicyError> {
        match self.pdp.decide(input).await {
            PolicyDecision::Allow => Ok(()),
            PolicyDecision::Deny(DenyReason::Denied) => Err(PolicyError::Denied),
            PolicyDecision::Deny(_) => Err(PolicyError::Unavailable),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::models::{GenderAction, GenderEntity};
    use async_trait::async_trait;
    use talimy_errors::normalize;
    use talimy_security::{GenderScope, TenantId};

    struct Fixed(PolicyDecision);

    #[async_trait]
    impl PolicyDecisionPoint for Fixed {
        async fn decide(&self, _input: &GenderPolicyCheckInput) -> PolicyDecision {
            self.0.clone()
        }
    }

    fn input() -> GenderPolicyCheckInput {
        GenderPolicyCheckInput {
            tenant_id: TenantId::from("t-1"),
            user_id: "u-1".to_owned(),
            roles: vec!["teacher".to_owned()],
            user_gender_scope: GenderScope::Male,
            entity: GenderEntity::Teacher,
            action: GenderAction::Update,
            target_gender: None,
        }
    }

    async fn enforce(decision: PolicyDecision) -> Result<(), PolicyError> {
        GenderPolicyEnforcer::new(Arc::new(Fixed(decision)))
            .assert_access(&input())
            .await
    }

    #[tokio::test]
    async fn allow_proceeds() {
        assert!(enforce(PolicyDecision::Allow).await.is_ok());
    }

    #[tokio::test]
    async fn explicit_deny_is_forbidden() {
        let err = enforce(PolicyDecision::Deny(DenyReason::Denied)).await.unwrap_err();
        let normalized = normalize(&err.into());
        assert_eq!(normalized.status, StatusCode::FORBIDDEN);
        assert_eq!(normalized.body.message, "Authorization policy denied");
    }

    #[tokio::test]
    async fn other_deny_causes_are_unavailable_without_reason() {
        let err = enforce(PolicyDecision::Deny(DenyReason::Transport(
            "connection refused to 10.0.0.7".to_owned(),
        )))
        .await
        .unwrap_err();
        let normalized = normalize(&err.into());
        assert_eq!(normalized.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(normalized.body.code, "SERVICE_UNAVAILABLE");
        assert_eq!(normalized.body.message, "Authorization policy check unavailable");
    }
}
