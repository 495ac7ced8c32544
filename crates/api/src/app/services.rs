//! Service wiring: the listing store handle and the review engine on top of it.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use staybook_infra::config::StoreBackend;
use staybook_infra::listing_store::{InMemoryListingStore, ListingStore, PostgresListingStore, StoreError};
use staybook_infra::reviews::ReviewService;
use staybook_listings::Listing;

pub type SharedStore = Arc<dyn ListingStore>;

pub struct AppServices {
    pub reviews: ReviewService<SharedStore>,
}

impl AppServices {
    pub fn new(store: SharedStore) -> Self {
        Self {
            reviews: ReviewService::new(store),
        }
    }

    pub fn store(&self) -> &SharedStore {
        self.reviews.store()
    }
}

/// Construct the configured store. Postgres stores connect and ensure their
/// schema here; nothing is shared through globals.
pub async fn build_store(backend: &StoreBackend) -> Result<SharedStore, StoreError> {
    match backend {
        StoreBackend::InMemory => {
            tracing::warn!("DATABASE_URL not set; using in-memory listing store");
            Ok(Arc::new(InMemoryListingStore::new()))
        }
        StoreBackend::Postgres { database_url } => {
            let store = PostgresListingStore::connect(database_url).await?;
            Ok(Arc::new(store))
        }
    }
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Load a JSON array of listings into `store`.
///
/// Listings that already exist are skipped, so re-running the seed against a
/// persistent store is harmless. Returns the number of listings inserted.
pub async fn seed_from_file(store: &dyn ListingStore, path: &Path) -> Result<usize, SeedError> {
    let bytes = tokio::fs::read(path).await?;
    let listings: Vec<Listing> = serde_json::from_slice(&bytes)?;
    seed(store, listings).await
}

pub async fn seed(store: &dyn ListingStore, listings: Vec<Listing>) -> Result<usize, SeedError> {
    let mut inserted = 0;
    for listing in listings {
        let id = listing.id.clone();
        match store.insert_listing(listing).await {
            Ok(()) => inserted += 1,
            Err(StoreError::DuplicateListing(_)) => {
                tracing::debug!(listing_id = %id, "seed listing already present; skipped");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use staybook_core::ListingId;

    #[tokio::test]
    async fn seeding_twice_skips_existing_listings() {
        let store: SharedStore = Arc::new(InMemoryListingStore::new());
        let listings = vec![
            Listing::new(ListingId::parse("L1").unwrap(), "Loft"),
            Listing::new(ListingId::parse("L2").unwrap(), "Cabin"),
        ];

        assert_eq!(seed(store.as_ref(), listings.clone()).await.unwrap(), 2);
        assert_eq!(seed(store.as_ref(), listings).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn seed_file_must_be_a_json_array_of_listings() {
        let dir = std::env::temp_dir().join(format!("staybook-seed-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("listings.json");
        tokio::fs::write(&path, r#"[{"_id":"L9","name":"Villa","reviews":[]}]"#)
            .await
            .unwrap();

        let store = InMemoryListingStore::new();
        assert_eq!(seed_from_file(&store, &path).await.unwrap(), 1);

        tokio::fs::write(&path, "{not json").await.unwrap();
        assert!(matches!(
            seed_from_file(&store, &path).await,
            Err(SeedError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn seed_file_with_out_of_range_rating_inserts_nothing() {
        let dir = std::env::temp_dir().join(format!("staybook-seed-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("bad-rating.json");
        let doc = serde_json::json!([
            { "_id": "L1", "name": "Loft" },
            {
                "_id": "L2",
                "name": "Cabin",
                "reviews": [{
                    "_id": "r1", "listing_id": "L2", "reviewer_id": "u1", "reviewer_name": "Ana",
                    "comments": "ok", "rating": 200, "date": "2024-05-01T10:00:00Z"
                }]
            }
        ]);
        tokio::fs::write(&path, doc.to_string()).await.unwrap();

        let store = InMemoryListingStore::new();
        assert!(matches!(
            seed_from_file(&store, &path).await,
            Err(SeedError::Parse(_))
        ));
        let l1 = ListingId::parse("L1").unwrap();
        assert!(store.get_listing(&l1).await.unwrap().is_none());
    }
}
