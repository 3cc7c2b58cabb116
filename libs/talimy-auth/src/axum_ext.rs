//! Axum middleware and extractors for the guard chain

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, RawPathParams, Request, State, rejection::RawPathParamsRejection},
    http::{HeaderMap, Method, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use talimy_security::{RequestIdentity, TenantContext};

use crate::{
    errors::AuthError,
    guard::{RouteGuard, check_route},
    verifier::TokenVerifier,
};

/// Path parameter checked against the identity tenant on tenant-scoped routes.
pub const TENANT_PATH_PARAM: &str = "tenant_id";

/// Extractor for the verified caller. Requires [`require_auth`] on the route.
#[derive(Debug, Clone)]
pub struct Identity(pub RequestIdentity);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestIdentity>()
            .cloned()
            .map(Identity)
            .ok_or_else(|| {
                AuthError::Internal("RequestIdentity not found - auth middleware not configured".to_owned())
            })
    }
}

#[derive(Clone)]
pub struct AuthState {
    verifier: Arc<dyn TokenVerifier>,
    guard: Arc<RouteGuard>,
}

impl AuthState {
    #[must_use]
    pub fn new(verifier: Arc<dyn TokenVerifier>, guard: RouteGuard) -> Self {
        Self {
            verifier,
            guard: Arc::new(guard),
        }
    }
}

/// Route-layer middleware running the full guard chain.
///
/// Must sit inside the tenant-context middleware so the resolved
/// [`TenantContext`] is already in the request extensions.
pub async fn require_auth(
    State(AuthState { verifier, guard }): State<AuthState>,
    path_params: Result<RawPathParams, RawPathParamsRejection>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_preflight_request(request.method(), request.headers()) {
        return next.run(request).await;
    }

    let Some(token) = extract_bearer_token(request.headers()) else {
        return AuthError::Unauthenticated.into_response();
    };

    let identity = match verifier.verify(token).await {
        Ok(identity) => identity,
        Err(err) => return err.into_response(),
    };

    let path_tenant = path_params.ok().and_then(|params| {
        params
            .iter()
            .find(|(key, _)| *key == TENANT_PATH_PARAM)
            .map(|(_, value)| value.to_owned())
    });

    let tenant = request.extensions().get::<TenantContext>();
    if let Err(err) = check_route(&guard, &identity, tenant, path_tenant.as_deref()) {
        return err.into_response();
    }

    request.extensions_mut().insert(identity);
    next.run(request).await
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(axum::http::header::ORIGIN)
        && headers.contains_key(axum::http::header::ACCESS_CONTROL_REQUEST_METHOD)
}
