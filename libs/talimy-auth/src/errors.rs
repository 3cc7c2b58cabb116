use http::StatusCode;
use talimy_errors::Fault;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    InvalidToken(&'static str),

    #[error("Token expired")]
    TokenExpired,

    #[error("Insufficient role")]
    InsufficientRole,

    #[error("Tenant context required")]
    TenantContextRequired,

    #[error("Tenant mismatch")]
    TenantMismatch,

    #[error("Gender scope mismatch")]
    GenderScopeMismatch,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for Fault {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated | AuthError::InvalidToken(_) | AuthError::TokenExpired => {
                Fault::http(StatusCode::UNAUTHORIZED, err.to_string())
            }
            AuthError::InsufficientRole
            | AuthError::TenantContextRequired
            | AuthError::TenantMismatch
            | AuthError::GenderScopeMismatch => Fault::http(StatusCode::FORBIDDEN, err.to_string()),
            AuthError::Internal(detail) => Fault::Unhandled {
                message: None,
                trace: Some(detail),
            },
        }
    }
}

impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        Fault::from(self).into_response()
    }
}
