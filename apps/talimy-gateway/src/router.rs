use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use talimy_auth::{AuthState, RouteGuard, TokenVerifier, require_auth};
use talimy_errors::{error_contract, not_found_fallback, panic_response};
use tenant_context::{TENANT_ID_HEADER, TENANT_SLUG_HEADER, resolve_tenant};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::routes;
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Roles allowed to ask for gender-scoped decisions.
pub const GENDER_POLICY_ROLES: [&str; 3] = ["platform_admin", "school_admin", "teacher"];

/// Full gateway router.
///
/// Requests flow, outermost first: error contract, request id, trace, CORS,
/// timeout, panic catcher, tenant resolution, route guards, handler.
#[must_use]
pub fn build_router(state: &AppState) -> Router {
    let api = api_routes(state);
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let mut router = Router::new()
        .nest("/api", api)
        .fallback(not_found_fallback)
        .layer(from_fn_with_state(Arc::clone(&state.resolver), resolve_tenant))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.request_timeout,
        ));

    if let Some(cors) = build_cors_layer(&state.cors_allowed_origins) {
        router = router.layer(cors);
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(from_fn(error_contract))
}

fn api_routes(state: &AppState) -> Router {
    let verifier: Arc<dyn TokenVerifier> = Arc::clone(&state.verifier);

    let tenant_member = Router::new()
        .route("/me", get(routes::me))
        .route_layer(from_fn_with_state(
            AuthState::new(Arc::clone(&verifier), RouteGuard::tenant_scoped()),
            require_auth,
        ));

    let gender_policy = Router::new()
        .route("/gender-policy/check", post(routes::gender_policy_check))
        .route_layer(from_fn_with_state(
            AuthState::new(
                verifier,
                RouteGuard::tenant_scoped().with_roles(GENDER_POLICY_ROLES),
            ),
            require_auth,
        ));

    Router::new()
        .route("/health", get(routes::health))
        .route("/context", get(routes::request_context))
        .merge(tenant_member)
        .merge(gender_policy)
        .with_state(state.clone())
}

fn build_cors_layer(allowed_origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                HeaderName::from_static(TENANT_ID_HEADER),
                HeaderName::from_static(TENANT_SLUG_HEADER),
            ])
            .allow_credentials(true),
    )
}
