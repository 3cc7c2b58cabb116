use serde::{Deserialize, Serialize};
use talimy_security::{GenderScope, RequestIdentity, TenantId};

use crate::errors::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub sub: String,
    pub email: String,
    pub tenant_id: String,
    pub roles: Vec<String>,
    pub gender_scope: GenderScope,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub jti: String,
    pub iat: u64,
    pub exp: u64,
}

impl AccessClaims {
    /// Check the token kind and the required fields, then build the request identity.
    ///
    /// # Errors
    /// `AuthError::InvalidToken` for a non-access token or blank required fields.
    pub fn into_identity(self) -> Result<RequestIdentity, AuthError> {
        if self.token_type != TokenType::Access {
            return Err(AuthError::InvalidToken("Invalid token type"));
        }
        let blank = [&self.sub, &self.email, &self.tenant_id, &self.jti]
            .iter()
            .any(|v| v.trim().is_empty());
        if blank || self.iat == 0 {
            return Err(AuthError::InvalidToken("Invalid token payload"));
        }

        Ok(RequestIdentity::new(
            self.sub,
            TenantId::new(self.tenant_id),
            self.roles,
            self.gender_scope,
        )
        .with_email(self.email))
    }
}
