//! Route declarations and the pure checks of the guard chain.

use talimy_security::{GenderScope, RequestIdentity, TenantContext};

use crate::errors::AuthError;

/// What a protected route requires beyond a valid identity.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct RouteGuard {
    allowed_roles: Vec<String>,
    tenant_scoped: bool,
    gender_scope: Option<GenderScope>,
}

impl RouteGuard {
    /// Any authenticated caller.
    #[must_use]
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Authenticated caller whose token tenant must equal the request tenant.
    #[must_use]
    pub fn tenant_scoped() -> Self {
        Self {
            tenant_scoped: true,
            ..Self::default()
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_gender_scope(mut self, scope: GenderScope) -> Self {
        self.gender_scope = Some(scope);
        self
    }
}

/// Runs roles, tenant scope and gender scope in order against an already
/// verified identity.
///
/// `path_tenant` is the `tenant_id` path parameter of the matched route, if any.
///
/// # Errors
/// The first failing guard's `AuthError`.
pub fn check_route(
    guard: &RouteGuard,
    identity: &RequestIdentity,
    tenant: Option<&TenantContext>,
    path_tenant: Option<&str>,
) -> Result<(), AuthError> {
    if !guard.allowed_roles.is_empty() && !identity.has_any_role(guard.allowed_roles.as_slice()) {
        return Err(AuthError::InsufficientRole);
    }

    if guard.tenant_scoped {
        let Some(request_tenant) = tenant.and_then(TenantContext::tenant_id) else {
            return Err(AuthError::TenantContextRequired);
        };
        if request_tenant != identity.tenant_id() {
            tracing::warn!(
                user_id = identity.user_id(),
                identity_tenant = %identity.tenant_id(),
                request_tenant = %request_tenant,
                "tenant boundary violation"
            );
            return Err(AuthError::TenantMismatch);
        }
        if let Some(path_tenant) = path_tenant
            && path_tenant != identity.tenant_id().as_str()
        {
            tracing::warn!(
                user_id = identity.user_id(),
                identity_tenant = %identity.tenant_id(),
                path_tenant,
                "tenant boundary violation in path"
            );
            return Err(AuthError::TenantMismatch);
        }
    }

    if let Some(required) = guard.gender_scope
        && !identity.gender_scope().satisfies(required)
    {
        return Err(AuthError::GenderScopeMismatch);
    }

    Ok(())
}
