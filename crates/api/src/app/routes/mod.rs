use axum::{
    routing::{get, post, put},
    Router,
};

pub mod listings;
pub mod reviews;
pub mod system;

/// Read-only endpoints; no token required.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/api/listing/:listing_id/", get(listings::get_listing))
        .route("/api/listing/:listing_id/reviews/", get(listings::list_reviews))
        .route("/api/host/:host_id/", get(listings::get_host))
        .route("/api/host/:host_id/listings/", get(listings::list_host_listings))
}

/// Endpoints that run behind the authorization gate.
pub fn gated_router() -> Router {
    Router::new()
        .route("/api/whoami/", get(system::whoami))
        .route("/api/listing/:listing_id/review/", post(reviews::create_review))
        .route(
            "/api/listing/:listing_id/review/:review_id/",
            put(reviews::update_review).delete(reviews::delete_review),
        )
}
