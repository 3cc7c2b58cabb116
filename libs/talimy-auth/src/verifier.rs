use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use secrecy::ExposeSecret;
use talimy_security::RequestIdentity;

use crate::{claims::AccessClaims, config::AuthConfig, errors::AuthError};

/// Turns a raw bearer token into a request identity.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// # Errors
    /// `AuthError::InvalidToken` or `AuthError::TokenExpired` when the token is rejected.
    async fn verify(&self, token: &str) -> Result<RequestIdentity, AuthError>;
}

/// HS256 access-token verifier backed by a shared secret.
pub struct HmacTokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl HmacTokenVerifier {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_seconds;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(config.access_secret.expose_secret().as_bytes()),
            validation,
        }
    }

    fn decode(&self, token: &str) -> Result<AccessClaims, AuthError> {
        jsonwebtoken::decode::<AccessClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidToken("Invalid token signature"),
                ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => {
                    AuthError::InvalidToken("Invalid token payload")
                }
                _ => AuthError::InvalidToken("Malformed token"),
            })
    }
}

#[async_trait]
impl TokenVerifier for HmacTokenVerifier {
    async fn verify(&self, token: &str) -> Result<RequestIdentity, AuthError> {
        let claims = self.decode(token)?;
        tracing::debug!(sub = %claims.sub, tenant_id = %claims.tenant_id, "access token verified");
        claims.into_identity()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::claims::TokenType;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use secrecy::SecretString;
    use std::time::{SystemTime, UNIX_EPOCH};
    use talimy_security::GenderScope;

    const SECRET: &str = "unit-test-secret";

    fn now() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
    }

    fn claims(token_type: TokenType, exp: u64) -> AccessClaims {
        AccessClaims {
            sub: "user-1".to_owned(),
            email: "teacher@school.test".to_owned(),
            tenant_id: "tenant-a".to_owned(),
            roles: vec!["teacher".to_owned()],
            gender_scope: GenderScope::Female,
            token_type,
            jti: "jti-1".to_owned(),
            iat: now(),
            exp,
        }
    }

    fn sign(claims: &AccessClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn verifier() -> HmacTokenVerifier {
        HmacTokenVerifier::new(&AuthConfig {
            access_secret: SecretString::from(SECRET),
            leeway_seconds: 0,
        })
    }

    #[tokio::test]
    async fn valid_access_token_yields_identity() {
        let token = sign(&claims(TokenType::Access, now() + 900), SECRET);
        let identity = verifier().verify(&token).await.unwrap();
        assert_eq!(identity.user_id(), "user-1");
        assert_eq!(identity.tenant_id().as_str(), "tenant-a");
        assert_eq!(identity.gender_scope(), GenderScope::Female);
        assert!(identity.has_role("teacher"));
        assert_eq!(identity.email(), Some("teacher@school.test"));
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let token = sign(&claims(TokenType::Access, now() + 900), "other-secret");
        let err = verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken("Invalid token signature")));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let token = sign(&claims(TokenType::Access, now() - 120), SECRET);
        let err = verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_token() {
        let token = sign(&claims(TokenType::Refresh, now() + 900), SECRET);
        let err = verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken("Invalid token type")));
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        let err = verifier().verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken("Malformed token")));
    }
}
