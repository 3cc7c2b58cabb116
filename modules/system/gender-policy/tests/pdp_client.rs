#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use gender_policy::{
    DenyReason, GenderAction, GenderEntity, GenderPolicyCheckInput, HttpPolicyDecisionClient,
    PdpConfig, PolicyDecision, PolicyDecisionPoint,
};
use httpmock::prelude::*;
use serde_json::json;
use talimy_security::{Gender, GenderScope, TenantId};

fn input() -> GenderPolicyCheckInput {
    GenderPolicyCheckInput {
        tenant_id: TenantId::from("11111111-1111-1111-1111-111111111111"),
        user_id: "user-42".to_owned(),
        roles: vec!["school_admin".to_owned()],
        user_gender_scope: GenderScope::Female,
        entity: GenderEntity::Student,
        action: GenderAction::Create,
        target_gender: Some(Gender::Female),
    }
}

fn client_for(server: &MockServer, timeout_ms: u64) -> HttpPolicyDecisionClient {
    HttpPolicyDecisionClient::new(&PdpConfig {
        endpoint: Some(server.url("/v1/gender-policy/check")),
        enabled: true,
        timeout_ms,
        insecure: true,
        schema_version: Some("schema-v2".to_owned()),
        ..PdpConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn explicit_allow_is_the_only_allow() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/gender-policy/check")
                .header("content-type", "application/json")
                .json_body(json!({
                    "tenantId": "11111111-1111-1111-1111-111111111111",
                    "userId": "user-42",
                    "roles": ["school_admin"],
                    "userGenderScope": "female",
                    "entity": "student",
                    "action": "create",
                    "targetGender": "female",
                    "schemaVersion": "schema-v2"
                }));
            then.status(200).json_body(json!({"allow": true}));
        })
        .await;

    let decision = client_for(&server, 3000).decide(&input()).await;
    assert_eq!(decision, PolicyDecision::Allow);
    mock.assert_async().await;
}

#[tokio::test]
async fn unconfigured_endpoint_denies() {
    for config in [
        PdpConfig::default(),
        PdpConfig {
            enabled: true,
            endpoint: None,
            ..PdpConfig::default()
        },
        PdpConfig {
            enabled: false,
            endpoint: Some("https://pdp.internal/check".to_owned()),
            ..PdpConfig::default()
        },
    ] {
        let client = HttpPolicyDecisionClient::new(&config).unwrap();
        assert_eq!(
            client.decide(&input()).await,
            PolicyDecision::Deny(DenyReason::NotConfigured)
        );
    }
}

#[tokio::test]
async fn non_success_status_denies() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/gender-policy/check");
            then.status(500).json_body(json!({"allow": true}));
        })
        .await;

    let decision = client_for(&server, 3000).decide(&input()).await;
    assert!(matches!(decision, PolicyDecision::Deny(DenyReason::HttpStatus(_))));
}

#[tokio::test]
async fn malformed_json_denies() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/gender-policy/check");
            then.status(200)
                .header("content-type", "application/json")
                .body("{allow: true");
        })
        .await;

    let decision = client_for(&server, 3000).decide(&input()).await;
    assert!(matches!(decision, PolicyDecision::Deny(DenyReason::Malformed(_))));
}

#[tokio::test]
async fn allow_not_exactly_true_denies() {
    for body in [json!({}), json!({"allow": "true"}), json!({"allow": 1}), json!({"allow": null})] {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/gender-policy/check");
                then.status(200).json_body(body.clone());
            })
            .await;

        let decision = client_for(&server, 3000).decide(&input()).await;
        assert!(
            matches!(decision, PolicyDecision::Deny(DenyReason::Malformed(_))),
            "body {body}"
        );
    }
}

#[tokio::test]
async fn explicit_false_is_a_policy_deny() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/gender-policy/check");
            then.status(200).json_body(json!({"allow": false}));
        })
        .await;

    let decision = client_for(&server, 3000).decide(&input()).await;
    assert_eq!(decision, PolicyDecision::Deny(DenyReason::Denied));
}

#[tokio::test]
async fn slow_pdp_times_out_and_denies() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/gender-policy/check");
            then.status(200)
                .delay(Duration::from_millis(1500))
                .json_body(json!({"allow": true}));
        })
        .await;

    let decision = client_for(&server, 100).decide(&input()).await;
    assert_eq!(
        decision,
        PolicyDecision::Deny(DenyReason::TimedOut(Duration::from_millis(100)))
    );
}

#[tokio::test]
async fn unreachable_pdp_denies() {
    let client = HttpPolicyDecisionClient::new(&PdpConfig {
        endpoint: Some("http://127.0.0.1:9/check".to_owned()),
        enabled: true,
        timeout_ms: 2000,
        insecure: true,
        ..PdpConfig::default()
    })
    .unwrap();
    assert!(matches!(
        client.decide(&input()).await,
        PolicyDecision::Deny(DenyReason::Transport(_))
    ));
}
