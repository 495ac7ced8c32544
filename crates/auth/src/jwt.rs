//! HS256 token issuing and local validation.
//!
//! Only the authentication authority holds the secret. The listings service
//! never links this against a key; it goes through a remote verifier.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use staybook_core::UserId;

use crate::{CallerIdentity, TokenClaims, TokenVerifier, VerifyError, validate_claims};

/// Mints signed identity tokens.
pub struct Hs256TokenIssuer {
    key: EncodingKey,
}

impl Hs256TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
        }
    }

    pub fn issue(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = TokenClaims::new(user_id, now, now + ttl);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key)
    }
}

/// Checks signature and validity window of HS256 tokens.
pub struct Hs256TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256TokenValidator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks are done by `validate_claims` against an explicit clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Decode and validate `token` at `now`, returning its claims.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, VerifyError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.key, &self.validation)
            .map_err(|e| VerifyError::Rejected(e.to_string()))?;
        validate_claims(&data.claims, now).map_err(|e| VerifyError::Rejected(e.to_string()))?;
        Ok(data.claims)
    }
}

#[async_trait]
impl TokenVerifier for Hs256TokenValidator {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, VerifyError> {
        let claims = self.validate(token, Utc::now())?;
        Ok(CallerIdentity::new(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    fn user(id: &str) -> UserId {
        UserId::parse(id).unwrap()
    }

    #[test]
    fn issued_token_round_trips_to_claims() {
        let now = Utc::now();
        let token = Hs256TokenIssuer::new(SECRET)
            .issue(user("u1"), now, Duration::minutes(10))
            .unwrap();

        let claims = Hs256TokenValidator::new(SECRET).validate(&token, now).unwrap();
        assert_eq!(claims.sub, user("u1"));
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = Utc::now();
        let token = Hs256TokenIssuer::new(b"other")
            .issue(user("u1"), now, Duration::minutes(10))
            .unwrap();

        let err = Hs256TokenValidator::new(SECRET).validate(&token, now).unwrap_err();
        assert!(matches!(err, VerifyError::Rejected(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued = Utc::now() - Duration::hours(2);
        let token = Hs256TokenIssuer::new(SECRET)
            .issue(user("u1"), issued, Duration::minutes(10))
            .unwrap();

        let err = Hs256TokenValidator::new(SECRET)
            .validate(&token, Utc::now())
            .unwrap_err();
        assert_eq!(err, VerifyError::Rejected("token has expired".to_string()));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = Hs256TokenValidator::new(SECRET)
            .validate("not-a-jwt", Utc::now())
            .unwrap_err();
        assert!(matches!(err, VerifyError::Rejected(_)));
    }

    #[tokio::test]
    async fn verifier_resolves_subject_as_caller() {
        let token = Hs256TokenIssuer::new(SECRET)
            .issue(user("42"), Utc::now(), Duration::minutes(1))
            .unwrap();

        let identity = Hs256TokenValidator::new(SECRET).verify(&token).await.unwrap();
        assert!(identity.is(&user("42")));
    }
}
