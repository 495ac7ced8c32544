//! Review mutation engine.
//!
//! Orchestrates create/update/delete of a single review embedded in a
//! listing, for an already-authenticated caller:
//!
//! ```text
//! create:  author == caller? → validate → atomic append (listing must exist)
//! update:  locate (listing, review) → author == caller? → validate → conditional write
//! delete:  locate (listing, review) → author == caller? → conditional remove
//! ```
//!
//! The order of checks is deliberate and observable: update/delete report
//! `NotFound` before `Forbidden`, create reports `Forbidden` before a
//! validation error.
//!
//! The engine never writes back a review it read. The write is a compare-and-
//! write on `(listing, review, author)` performed by the store, so a delete
//! that wins a race makes the losing update observe `NotFound`.

use chrono::Utc;
use thiserror::Error;

use staybook_auth::CallerIdentity;
use staybook_core::{DomainError, DomainResult, ListingId, ReviewKey};
use staybook_listings::{NewReview, Review, ReviewPatch};

use crate::listing_store::{AppendOutcome, ListingStore, StoreError};

#[derive(Debug, Error)]
pub enum ReviewError {
    /// Authenticated, but not the review's author.
    #[error("forbidden")]
    Forbidden,

    /// Listing or review absent (or removed concurrently).
    #[error("not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    /// A review with the requested id already exists in the listing.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Store fault. The message is for logs only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for ReviewError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ReviewError::Validation(msg),
            DomainError::NotFound => ReviewError::NotFound,
            DomainError::Forbidden => ReviewError::Forbidden,
        }
    }
}

impl From<StoreError> for ReviewError {
    fn from(value: StoreError) -> Self {
        tracing::error!(error = %value, "listing store failure");
        ReviewError::Internal(value.to_string())
    }
}

/// Review mutation engine over any [`ListingStore`].
pub struct ReviewService<S> {
    store: S,
}

impl<S> ReviewService<S>
where
    S: ListingStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Append a new review to `listing_id` on behalf of `caller`.
    pub async fn create(
        &self,
        caller: &CallerIdentity,
        listing_id: &ListingId,
        draft: NewReview,
    ) -> Result<Review, ReviewError> {
        self.authorize_author(caller, &draft)?;

        let review = draft.into_review(listing_id.clone(), Utc::now())?;

        match self.store.push_review(listing_id, review.clone()).await? {
            AppendOutcome::Appended => {
                tracing::info!(listing_id = %listing_id, review_id = %review.id, "review added");
                Ok(review)
            }
            AppendOutcome::ListingNotFound => Err(ReviewError::NotFound),
            AppendOutcome::DuplicateReview => Err(ReviewError::Conflict(format!(
                "review '{}' already exists",
                review.id
            ))),
        }
    }

    /// Apply `patch` to the caller's own review at `key`.
    ///
    /// `patch` is whatever the boundary could decode; a decoding error is only
    /// reported once the review is known to exist and belong to the caller.
    pub async fn update(
        &self,
        caller: &CallerIdentity,
        key: &ReviewKey,
        patch: DomainResult<ReviewPatch>,
    ) -> Result<Review, ReviewError> {
        self.authorize_owner(caller, key).await?;
        let patch = patch?.validated()?;

        let updated = self
            .store
            .update_review_where(key, caller.user_id(), &patch, Utc::now())
            .await?
            .ok_or(ReviewError::NotFound)?;

        tracing::info!(review = %key, "review updated");
        Ok(updated)
    }

    /// Remove the caller's own review at `key`.
    pub async fn delete(&self, caller: &CallerIdentity, key: &ReviewKey) -> Result<(), ReviewError> {
        self.authorize_owner(caller, key).await?;

        if !self.store.pull_review_where(key, caller.user_id()).await? {
            return Err(ReviewError::NotFound);
        }

        tracing::info!(review = %key, "review deleted");
        Ok(())
    }

    /// The claimed author of a new review must be the caller. Runs before any
    /// field validation and before the listing is looked up.
    pub fn authorize_author(&self, caller: &CallerIdentity, draft: &NewReview) -> Result<(), ReviewError> {
        if draft.claims_author(caller.user_id()) {
            return Ok(());
        }
        tracing::info!(caller = %caller.user_id(), "review create refused: author is not the caller");
        Err(ReviewError::Forbidden)
    }

    /// Existence first, then authorship.
    async fn authorize_owner(&self, caller: &CallerIdentity, key: &ReviewKey) -> Result<(), ReviewError> {
        let current = self.store.find_review(key).await?.ok_or(ReviewError::NotFound)?;
        if !caller.is(&current.reviewer_id) {
            tracing::info!(review = %key, caller = %caller.user_id(), "review mutation refused: not the author");
            return Err(ReviewError::Forbidden);
        }
        Ok(())
    }
}
