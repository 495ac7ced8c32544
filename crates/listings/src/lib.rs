//! `staybook-listings`: listing documents and their embedded reviews.
//!
//! Pure domain: the document shape, boundary validation for review input, and
//! the single-element mutations a store applies inside one listing.

pub mod host;
pub mod listing;
pub mod page;
pub mod review;

pub use host::Host;
pub use listing::{Listing, ListingSummary};
pub use page::{Page, PageRequest, Pagination};
pub use review::{NewReview, Rating, Review, ReviewPatch};
