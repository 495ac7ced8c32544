//! Infrastructure layer: listing storage, the review engine, configuration and
//! external service clients.

pub mod config;
pub mod external;
pub mod listing_store;
pub mod reviews;
