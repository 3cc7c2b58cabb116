use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::resolver::TenantContextResolver;

/// Resolves the tenant before any handler or guard runs.
///
/// On success inserts [`talimy_security::TenantContext`] and
/// [`crate::HostScope`] into the request extensions.
pub async fn resolve_tenant(
    State(resolver): State<Arc<TenantContextResolver>>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolver.resolve(request.headers()).await {
        Ok(resolution) => {
            request.extensions_mut().insert(resolution.context);
            request.extensions_mut().insert(resolution.scope);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}
