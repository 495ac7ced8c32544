use async_trait::async_trait;
use thiserror::Error;

use crate::CallerIdentity;

/// Why a token could not be turned into a caller identity.
///
/// The variants exist for logs. Callers at the HTTP edge must collapse all of
/// them into the same authentication failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The authority looked at the token and said no.
    #[error("token rejected: {0}")]
    Rejected(String),

    /// The authority could not be reached in time.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),

    /// The authority answered OK but the body was not a well-formed identity.
    #[error("malformed verifier response: {0}")]
    MalformedResponse(String),
}

/// Turns a bearer token into a caller identity, or refuses.
///
/// Implementations perform exactly one verification per call and do not
/// retry or cache.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, VerifyError>;
}

#[async_trait]
impl<V> TokenVerifier for std::sync::Arc<V>
where
    V: TokenVerifier + ?Sized,
{
    async fn verify(&self, token: &str) -> Result<CallerIdentity, VerifyError> {
        (**self).verify(token).await
    }
}
