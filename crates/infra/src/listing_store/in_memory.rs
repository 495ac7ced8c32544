use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use staybook_core::{HostId, ListingId, ReviewKey, UserId};
use staybook_listings::{Host, Listing, ListingSummary, Page, PageRequest, Review, ReviewPatch};

use super::r#trait::{AppendOutcome, ListingStore, StoreError};

/// In-memory listing store.
///
/// Intended for tests/dev. Each mutation runs under the map's write lock, which
/// makes it the compare-and-write unit; no lock is held across an `.await`.
#[derive(Debug, Default)]
pub struct InMemoryListingStore {
    listings: RwLock<HashMap<ListingId, Listing>>,
}

impl InMemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(listings: impl IntoIterator<Item = Listing>) -> Self {
        let map = listings.into_iter().map(|l| (l.id.clone(), l)).collect();
        Self {
            listings: RwLock::new(map),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<ListingId, Listing>>, StoreError> {
        self.listings
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<ListingId, Listing>>, StoreError> {
        self.listings
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }

    async fn insert_listing(&self, listing: Listing) -> Result<(), StoreError> {
        let mut map = self.write()?;
        if map.contains_key(&listing.id) {
            return Err(StoreError::DuplicateListing(listing.id));
        }
        map.insert(listing.id.clone(), listing);
        Ok(())
    }

    async fn get_listing(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        Ok(self.read()?.get(id).cloned())
    }

    async fn find_review(&self, key: &ReviewKey) -> Result<Option<Review>, StoreError> {
        let map = self.read()?;
        Ok(map
            .get(&key.listing_id)
            .and_then(|l| l.find_review(&key.review_id))
            .cloned())
    }

    async fn review_page(
        &self,
        id: &ListingId,
        req: PageRequest,
    ) -> Result<Option<Page<Review>>, StoreError> {
        Ok(self.read()?.get(id).map(|l| l.review_page(req)))
    }

    async fn find_host(&self, host_id: &HostId) -> Result<Option<Host>, StoreError> {
        let map = self.read()?;
        Ok(map
            .values()
            .filter(|l| l.is_hosted_by(host_id))
            .min_by(|a, b| a.id.cmp(&b.id))
            .and_then(|l| l.host.clone()))
    }

    async fn host_listings(
        &self,
        host_id: &HostId,
        req: PageRequest,
    ) -> Result<Page<ListingSummary>, StoreError> {
        let map = self.read()?;
        let mut owned: Vec<&Listing> = map.values().filter(|l| l.is_hosted_by(host_id)).collect();
        owned.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Page {
            total: owned.len(),
            items: owned
                .into_iter()
                .skip(req.offset())
                .take(req.limit() as usize)
                .map(|l| l.clone().into_summary())
                .collect(),
        })
    }

    async fn push_review(
        &self,
        listing_id: &ListingId,
        review: Review,
    ) -> Result<AppendOutcome, StoreError> {
        let mut map = self.write()?;
        let Some(listing) = map.get_mut(listing_id) else {
            return Ok(AppendOutcome::ListingNotFound);
        };
        if listing.append_review(review) {
            Ok(AppendOutcome::Appended)
        } else {
            Ok(AppendOutcome::DuplicateReview)
        }
    }

    async fn update_review_where(
        &self,
        key: &ReviewKey,
        author: &UserId,
        patch: &ReviewPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Review>, StoreError> {
        let mut map = self.write()?;
        Ok(map
            .get_mut(&key.listing_id)
            .and_then(|l| l.patch_review_by(&key.review_id, author, patch, now)))
    }

    async fn pull_review_where(&self, key: &ReviewKey, author: &UserId) -> Result<bool, StoreError> {
        let mut map = self.write()?;
        Ok(map
            .get_mut(&key.listing_id)
            .and_then(|l| l.remove_review_by(&key.review_id, author))
            .is_some())
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use staybook_core::ReviewId;
    use staybook_listings::Rating;

    fn listing_id() -> ListingId {
        ListingId::parse("L1").unwrap()
    }

    fn review(id: &str, author: &str) -> Review {
        Review {
            id: ReviewId::parse(id).unwrap(),
            listing_id: listing_id(),
            reviewer_id: UserId::parse(author).unwrap(),
            reviewer_name: author.to_string(),
            comments: "ok".to_string(),
            rating: Rating::new(3).unwrap(),
            date: Utc::now(),
            updated_at: None,
        }
    }

    fn store() -> InMemoryListingStore {
        InMemoryListingStore::with_listings([Listing::new(listing_id(), "Loft")])
    }

    #[tokio::test]
    async fn push_reports_missing_listing_and_duplicates() {
        let store = store();
        let missing = ListingId::parse("nope").unwrap();

        assert_eq!(
            store.push_review(&missing, review("r1", "u1")).await.unwrap(),
            AppendOutcome::ListingNotFound
        );
        assert_eq!(
            store.push_review(&listing_id(), review("r1", "u1")).await.unwrap(),
            AppendOutcome::Appended
        );
        assert_eq!(
            store.push_review(&listing_id(), review("r1", "u2")).await.unwrap(),
            AppendOutcome::DuplicateReview
        );
        assert!(store.get_listing(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn conditional_writes_require_author_match() {
        let store = store();
        store.push_review(&listing_id(), review("r1", "u1")).await.unwrap();
        let key = ReviewKey::new(listing_id(), ReviewId::parse("r1").unwrap());
        let patch = ReviewPatch {
            comments: Some("edited".to_string()),
            reviewer_name: None,
        };

        let other = UserId::parse("u2").unwrap();
        assert!(store.update_review_where(&key, &other, &patch, Utc::now()).await.unwrap().is_none());
        assert!(!store.pull_review_where(&key, &other).await.unwrap());

        let owner = UserId::parse("u1").unwrap();
        let updated = store
            .update_review_where(&key, &owner, &patch, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.comments, "edited");
        assert!(store.pull_review_where(&key, &owner).await.unwrap());
        assert!(store.find_review(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_listing() {
        let store = store();
        let err = store
            .insert_listing(Listing::new(listing_id(), "Again"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateListing(_)));
    }

    #[tokio::test]
    async fn host_reads_follow_listing_id_order() {
        let h1 = HostId::parse("h1").unwrap();
        let hosted = |id: &str, host: &str, name: &str| {
            let mut listing = Listing::new(ListingId::parse(id).unwrap(), id);
            listing.host = Some(Host::new(HostId::parse(host).unwrap(), name));
            listing
        };
        let mut with_review = hosted("L2", "h1", "Maya (L2)");
        with_review.reviews.push(review("r1", "u1"));
        let store = InMemoryListingStore::with_listings([
            hosted("L3", "h1", "Maya (L3)"),
            with_review,
            hosted("L9", "h2", "Ravi"),
            Listing::new(ListingId::parse("L0").unwrap(), "Unhosted"),
        ]);

        let host = store.find_host(&h1).await.unwrap().unwrap();
        assert_eq!(host.host_name, "Maya (L2)");

        let first = store.host_listings(&h1, PageRequest::new(Some(1), Some(1))).await.unwrap();
        assert_eq!(first.total, 2);
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.items[0].id.as_str(), "L2");
        assert_eq!(first.items[0].review_count, 1);

        let second = store.host_listings(&h1, PageRequest::new(Some(2), Some(1))).await.unwrap();
        assert_eq!(second.items[0].id.as_str(), "L3");

        let unknown = HostId::parse("h404").unwrap();
        assert!(store.find_host(&unknown).await.unwrap().is_none());
        let empty = store.host_listings(&unknown, PageRequest::default()).await.unwrap();
        assert_eq!(empty.total, 0);
        assert!(empty.items.is_empty());
    }
}
