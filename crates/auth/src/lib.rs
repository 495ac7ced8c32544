//! `staybook-auth`: authentication boundary.
//!
//! This crate is decoupled from HTTP and storage: it knows what a caller
//! identity is, what a token carries, and the shape of a verifier. The remote
//! verifier client lives in `staybook-infra`.

pub mod claims;
pub mod identity;
pub mod jwt;
pub mod verifier;

pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use identity::CallerIdentity;
pub use jwt::{Hs256TokenIssuer, Hs256TokenValidator};
pub use verifier::{TokenVerifier, VerifyError};
