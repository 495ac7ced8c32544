use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use staybook_core::{DomainError, DomainResult, ListingId, ReviewId, UserId};

pub const MAX_COMMENT_LEN: usize = 5_000;
pub const MAX_REVIEWER_NAME_LEN: usize = 200;

/// Star rating, 1 through 5 inclusive.
///
/// Deserialization goes through [`Rating::new`], so stored and seeded
/// documents obey the same range as client input.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> DomainResult<Self> {
        if value < i64::from(Self::MIN) || value > i64::from(Self::MAX) {
            return Err(DomainError::validation(format!(
                "rating must be between {} and {}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

/// A review embedded in its parent listing document.
///
/// Field names on the wire follow the stored document shape (`_id`,
/// `reviewer_id`, `comments`, `date`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ReviewId,
    pub listing_id: ListingId,
    pub reviewer_id: UserId,
    pub reviewer_name: String,
    pub comments: String,
    pub rating: Rating,
    /// Server-assigned creation time.
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Unvalidated create input, as decoded from the request body.
///
/// Nothing is validated yet: the claimed author is compared with the caller
/// before any field is looked at, so a malformed request from the wrong
/// author is refused rather than corrected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewReview {
    pub id: Option<String>,
    /// Author as claimed by the client.
    pub reviewer_id: Option<String>,
    pub reviewer_name: Option<String>,
    pub comments: Option<String>,
    pub rating: Option<i64>,
    /// Fields that were present with the wrong JSON type.
    pub malformed: Vec<&'static str>,
}

impl NewReview {
    /// Whether the claimed author is `user`.
    pub fn claims_author(&self, user: &UserId) -> bool {
        self.reviewer_id.as_deref().map(str::trim) == Some(user.as_str())
    }

    /// Validate the input and stamp it into a review of `listing_id`.
    ///
    /// A missing id is replaced by a server-generated one.
    pub fn into_review(self, listing_id: ListingId, now: DateTime<Utc>) -> DomainResult<Review> {
        if let Some(field) = self.malformed.first() {
            return Err(DomainError::validation(format!("'{field}' has the wrong type")));
        }
        let reviewer_id = match self.reviewer_id {
            Some(raw) => UserId::parse(raw)?,
            None => return Err(DomainError::validation("'reviewer_id' is required")),
        };
        let reviewer_name = required_text(
            "reviewer_name",
            self.reviewer_name.as_deref().unwrap_or_default(),
            MAX_REVIEWER_NAME_LEN,
        )?;
        let comments = required_text(
            "comments",
            self.comments.as_deref().unwrap_or_default(),
            MAX_COMMENT_LEN,
        )?;
        let rating = match self.rating {
            Some(v) => Rating::new(v)?,
            None => return Err(DomainError::validation("'rating' is required")),
        };
        let id = match self.id {
            Some(raw) => ReviewId::parse(raw)?,
            None => ReviewId::generate(),
        };

        Ok(Review {
            id,
            listing_id,
            reviewer_id,
            reviewer_name,
            comments,
            rating,
            date: now,
            updated_at: None,
        })
    }
}

/// Partial update of the mutable review fields.
///
/// Absent fields are left untouched. Rating and author are not mutable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_name: Option<String>,
}

impl ReviewPatch {
    /// Normalise present fields; an explicitly empty field is a validation error.
    pub fn validated(self) -> DomainResult<Self> {
        let comments = self
            .comments
            .map(|c| required_text("comments", &c, MAX_COMMENT_LEN))
            .transpose()?;
        let reviewer_name = self
            .reviewer_name
            .map(|n| required_text("reviewer_name", &n, MAX_REVIEWER_NAME_LEN))
            .transpose()?;
        Ok(Self {
            comments,
            reviewer_name,
        })
    }

    /// Apply present fields to `review` and stamp `updated_at`.
    pub fn apply_to(&self, review: &mut Review, now: DateTime<Utc>) {
        if let Some(comments) = &self.comments {
            review.comments = comments.clone();
        }
        if let Some(name) = &self.reviewer_name {
            review.reviewer_name = name.clone();
        }
        review.updated_at = Some(now);
    }
}

fn required_text(field: &str, value: &str, max_len: usize) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("'{field}' cannot be empty")));
    }
    if trimmed.chars().count() > max_len {
        return Err(DomainError::validation(format!(
            "'{field}' exceeds {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}
