//! HTTP/JSON client for the external policy decision point.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Request, Uri, header};
use http_body_util::{BodyExt, Full, Limited};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use thiserror::Error;

use crate::config::PdpConfig;
use crate::models::{DenyReason, GenderPolicyCheckInput, PdpRequest, PolicyDecision};

/// Anything that can render a policy decision.
#[async_trait]
pub trait PolicyDecisionPoint: Send + Sync {
    async fn decide(&self, input: &GenderPolicyCheckInput) -> PolicyDecision;
}

#[derive(Debug, Error)]
pub enum PdpConfigError {
    #[error("invalid PDP endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("PDP endpoint {0} is plain http but insecure transport is not allowed")]
    InsecureEndpoint(String),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] rustls::Error),
}

type HyperClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

struct Target {
    endpoint: Uri,
    http: HyperClient,
}

/// Fail-closed PDP client over HTTPS (or HTTP when `insecure` is set).
pub struct HttpPolicyDecisionClient {
    target: Option<Target>,
    timeout: Duration,
    schema_version: String,
    max_response_bytes: usize,
}

impl HttpPolicyDecisionClient {
    /// Build the client. A disabled or endpoint-less config yields a client
    /// that denies every check.
    ///
    /// # Errors
    /// `PdpConfigError` when an enabled endpoint is unusable.
    pub fn new(config: &PdpConfig) -> Result<Self, PdpConfigError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty());

        let target = match endpoint {
            Some(endpoint) if config.enabled => Some(Target {
                endpoint: parse_endpoint(endpoint, config.insecure)?,
                http: build_client(config.insecure)?,
            }),
            _ => None,
        };

        Ok(Self {
            target,
            timeout: Duration::from_millis(config.timeout_ms),
            schema_version: config
                .schema_version
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_owned(),
            max_response_bytes: config.max_response_bytes,
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.target.is_some()
    }

    #[must_use]
    pub fn into_shared(self) -> Arc<dyn PolicyDecisionPoint> {
        Arc::new(self)
    }

    async fn call(&self, target: &Target, input: &GenderPolicyCheckInput) -> PolicyDecision {
        let body = match serde_json::to_vec(&PdpRequest::new(input, &self.schema_version)) {
            Ok(body) => body,
            Err(e) => return PolicyDecision::Deny(DenyReason::Transport(e.to_string())),
        };

        let request = match Request::builder()
            .method(Method::POST)
            .uri(target.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .body(Full::new(Bytes::from(body)))
        {
            Ok(request) => request,
            Err(e) => return PolicyDecision::Deny(DenyReason::Transport(e.to_string())),
        };

        // Dropping the exchange future on expiry aborts the in-flight request.
        match tokio::time::timeout(self.timeout, self.exchange(&target.http, request)).await {
            Err(_) => PolicyDecision::Deny(DenyReason::TimedOut(self.timeout)),
            Ok(Err(reason)) => PolicyDecision::Deny(reason),
            Ok(Ok(bytes)) => decode_decision(&bytes),
        }
    }

    async fn exchange(
        &self,
        http: &HyperClient,
        request: Request<Full<Bytes>>,
    ) -> Result<Bytes, DenyReason> {
        let response: hyper::Response<hyper::body::Incoming> = http
            .request(request)
            .await
            .map_err(|e| DenyReason::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DenyReason::HttpStatus(status));
        }

        Limited::new(response.into_body(), self.max_response_bytes)
            .collect()
            .await
            .map(http_body_util::Collected::to_bytes)
            .map_err(|e| DenyReason::Transport(e.to_string()))
    }
}

#[async_trait]
impl PolicyDecisionPoint for HttpPolicyDecisionClient {
    async fn decide(&self, input: &GenderPolicyCheckInput) -> PolicyDecision {
        let decision = match &self.target {
            None => PolicyDecision::Deny(DenyReason::NotConfigured),
            Some(target) => self.call(target, input).await,
        };

        if let PolicyDecision::Deny(reason) = &decision {
            tracing::warn!(
                tenant_id = %input.tenant_id,
                user_id = %input.user_id,
                reason = %reason,
                "Fail-closed PDP enforcement"
            );
        }
        decision
    }
}

/// Only `{"allow": true}` allows. `{"allow": false}` is an explicit deny;
/// every other body is malformed.
fn decode_decision(body: &[u8]) -> PolicyDecision {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(object)) => match object.get("allow") {
            Some(Value::Bool(true)) => PolicyDecision::Allow,
            Some(Value::Bool(false)) => PolicyDecision::Deny(DenyReason::Denied),
            Some(_) => PolicyDecision::Deny(DenyReason::Malformed("allow is not a boolean".to_owned())),
            None => PolicyDecision::Deny(DenyReason::Malformed("allow is missing".to_owned())),
        },
        Ok(_) => PolicyDecision::Deny(DenyReason::Malformed("body is not an object".to_owned())),
        Err(e) => PolicyDecision::Deny(DenyReason::Malformed(e.to_string())),
    }
}

fn parse_endpoint(endpoint: &str, insecure: bool) -> Result<Uri, PdpConfigError> {
    let uri: Uri = endpoint
        .parse()
        .map_err(|e: http::uri::InvalidUri| PdpConfigError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })?;

    match uri.scheme_str() {
        Some("https") => Ok(uri),
        Some("http") if insecure => Ok(uri),
        Some("http") => Err(PdpConfigError::InsecureEndpoint(endpoint.to_owned())),
        _ => Err(PdpConfigError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: "scheme must be http or https".to_owned(),
        }),
    }
}

fn build_client(insecure: bool) -> Result<HyperClient, PdpConfigError> {
    let builder = hyper_rustls::HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(crypto_provider())?;
    let connector = if insecure {
        builder.https_or_http().enable_all_versions().build()
    } else {
        builder.https_only().enable_all_versions().build()
    };
    Ok(Client::builder(TokioExecutor::new()).build(connector))
}

/// Installed process default, else aws-lc-rs without installing it globally.
fn crypto_provider() -> Arc<rustls::crypto::CryptoProvider> {
    rustls::crypto::CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}
