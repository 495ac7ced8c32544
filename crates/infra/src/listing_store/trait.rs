use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use staybook_core::{HostId, ListingId, ReviewKey, UserId};
use staybook_listings::{Host, Listing, ListingSummary, Page, PageRequest, Review, ReviewPatch};

use std::sync::Arc;

/// Listing store operation error.
///
/// These are **infrastructure errors**. Absence of a listing or review is not
/// an error at this level; it is reported through `Option`/`AppendOutcome`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt document: {0}")]
    Corrupt(String),

    #[error("listing already exists: {0}")]
    DuplicateListing(ListingId),
}

/// Result of an atomic append to a listing's review array.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    ListingNotFound,
    /// A review with the same id already lives in the listing.
    DuplicateReview,
}

/// Persistence for listing documents and their embedded reviews.
///
/// The store is the single source of truth and the only shared mutable state.
/// The `*_where` operations are compare-and-write: they only touch the element
/// whose id **and** author still match at write time, and report `None`/`false`
/// when nothing matched (e.g. a concurrent delete won).
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// One-shot liveness check used at startup.
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Seed/import path; review mutations never create listings.
    async fn insert_listing(&self, listing: Listing) -> Result<(), StoreError>;

    async fn get_listing(&self, id: &ListingId) -> Result<Option<Listing>, StoreError>;

    async fn find_review(&self, key: &ReviewKey) -> Result<Option<Review>, StoreError>;

    /// `None` when the listing does not exist.
    async fn review_page(
        &self,
        id: &ListingId,
        req: PageRequest,
    ) -> Result<Option<Page<Review>>, StoreError>;

    /// Host sub-document of the lowest-id listing the host owns.
    async fn find_host(&self, host_id: &HostId) -> Result<Option<Host>, StoreError>;

    /// The host's listings ordered by listing id, reviews left out.
    async fn host_listings(
        &self,
        host_id: &HostId,
        req: PageRequest,
    ) -> Result<Page<ListingSummary>, StoreError>;

    async fn push_review(
        &self,
        listing_id: &ListingId,
        review: Review,
    ) -> Result<AppendOutcome, StoreError>;

    async fn update_review_where(
        &self,
        key: &ReviewKey,
        author: &UserId,
        patch: &ReviewPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Review>, StoreError>;

    async fn pull_review_where(&self, key: &ReviewKey, author: &UserId) -> Result<bool, StoreError>;

    /// Release underlying resources (connection pools). Idempotent.
    async fn close(&self);
}

#[async_trait]
impl<S> ListingStore for Arc<S>
where
    S: ListingStore + ?Sized,
{
    async fn health_check(&self) -> Result<(), StoreError> {
        (**self).health_check().await
    }

    async fn insert_listing(&self, listing: Listing) -> Result<(), StoreError> {
        (**self).insert_listing(listing).await
    }

    async fn get_listing(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        (**self).get_listing(id).await
    }

    async fn find_review(&self, key: &ReviewKey) -> Result<Option<Review>, StoreError> {
        (**self).find_review(key).await
    }

    async fn review_page(
        &self,
        id: &ListingId,
        req: PageRequest,
    ) -> Result<Option<Page<Review>>, StoreError> {
        (**self).review_page(id, req).await
    }

    async fn find_host(&self, host_id: &HostId) -> Result<Option<Host>, StoreError> {
        (**self).find_host(host_id).await
    }

    async fn host_listings(
        &self,
        host_id: &HostId,
        req: PageRequest,
    ) -> Result<Page<ListingSummary>, StoreError> {
        (**self).host_listings(host_id, req).await
    }

    async fn push_review(
        &self,
        listing_id: &ListingId,
        review: Review,
    ) -> Result<AppendOutcome, StoreError> {
        (**self).push_review(listing_id, review).await
    }

    async fn update_review_where(
        &self,
        key: &ReviewKey,
        author: &UserId,
        patch: &ReviewPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Review>, StoreError> {
        (**self).update_review_where(key, author, patch, now).await
    }

    async fn pull_review_where(&self, key: &ReviewKey, author: &UserId) -> Result<bool, StoreError> {
        (**self).pull_review_where(key, author).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}
