//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers are opaque strings: listings come from an external import whose
//! keys are not UUIDs, and user ids are minted by the authentication authority.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Longest identifier accepted at the boundary.
pub const MAX_ID_LEN: usize = 128;

/// Identifier of a listing document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ListingId(String);

/// Identifier of a review, unique only within its parent listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReviewId(String);

/// Identifier of a user (actor identity) as issued by the authentication authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

/// Identifier of a host, as carried in a listing's `host` sub-document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostId(String);

macro_rules! impl_string_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Parse and validate an identifier coming from outside the process.
            pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
                let raw = raw.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                if trimmed.len() > MAX_ID_LEN {
                    return Err(DomainError::invalid_id(format!(
                        "{}: longer than {} bytes",
                        $name, MAX_ID_LEN
                    )));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_string_id!(ListingId, "ListingId");
impl_string_id!(ReviewId, "ReviewId");
impl_string_id!(UserId, "UserId");
impl_string_id!(HostId, "HostId");

impl ReviewId {
    /// Server-assigned review id (UUIDv7, time-ordered).
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

/// A user id as other services put it on the wire: a JSON string or a bare
/// non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireUserId {
    Text(String),
    Number(u64),
}

impl WireUserId {
    /// The id as text, not yet validated.
    pub fn into_raw(self) -> String {
        match self {
            WireUserId::Text(s) => s,
            WireUserId::Number(n) => n.to_string(),
        }
    }

    pub fn into_user_id(self) -> Result<UserId, DomainError> {
        UserId::parse(self.into_raw())
    }
}

/// Composite address of one embedded review: `(listing, review)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReviewKey {
    pub listing_id: ListingId,
    pub review_id: ReviewId,
}

impl ReviewKey {
    pub fn new(listing_id: ListingId, review_id: ReviewId) -> Self {
        Self {
            listing_id,
            review_id,
        }
    }
}

impl core::fmt::Display for ReviewKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.listing_id, self.review_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_rejects_blank() {
        assert_eq!(ListingId::parse("  10006546 ").unwrap().as_str(), "10006546");
        assert!(matches!(UserId::parse("   "), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn parse_rejects_oversized() {
        let raw = "x".repeat(MAX_ID_LEN + 1);
        assert!(ReviewId::parse(raw).is_err());
    }

    #[test]
    fn generated_review_ids_are_distinct() {
        assert_ne!(ReviewId::generate(), ReviewId::generate());
    }

    #[test]
    fn serde_is_a_plain_string() {
        let id = UserId::parse("u1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"u1\"");
        assert_eq!(serde_json::from_str::<UserId>("\" u1 \"").unwrap(), id);
    }

    #[test]
    fn deserialization_validates() {
        assert!(serde_json::from_str::<ReviewId>("\"  \"").is_err());
        let long = format!("\"{}\"", "x".repeat(MAX_ID_LEN + 1));
        assert!(serde_json::from_str::<ListingId>(&long).is_err());
    }

    #[test]
    fn wire_user_ids_accept_text_and_numbers() {
        let text: WireUserId = serde_json::from_str("\"u7\"").unwrap();
        let number: WireUserId = serde_json::from_str("42").unwrap();
        assert_eq!(text.into_user_id().unwrap().as_str(), "u7");
        assert_eq!(number.into_user_id().unwrap().as_str(), "42");
        assert!(serde_json::from_str::<WireUserId>("-3").is_err());
        assert!(WireUserId::Text(String::new()).into_user_id().is_err());
    }
}
