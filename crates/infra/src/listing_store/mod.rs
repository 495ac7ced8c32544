//! Listing document store boundary.
//!
//! Listings carry their reviews embedded. Every review mutation is a single
//! conditional write addressed by `(listing id, review id)`; callers never
//! read-modify-write the review array themselves.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryListingStore;
pub use postgres::PostgresListingStore;
pub use r#trait::{AppendOutcome, ListingStore, StoreError};
