//! Review mutations. Bodies are decoded leniently and handed to the engine,
//! which owns the order of the existence, authorship and validation checks.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use staybook_core::{ListingId, ReviewId, ReviewKey};

use crate::app::dto;
use crate::app::errors::{self, Missing};
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub async fn create_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(listing_id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let draft = dto::CreateReviewRequest::from_body(&body).into_new_review();

    let Ok(listing_id) = ListingId::parse(listing_id) else {
        // Authorship is still decided first.
        return match services.reviews.authorize_author(caller.identity(), &draft) {
            Ok(()) => errors::not_found(Missing::Listing),
            Err(e) => errors::review_error_to_response(e, Missing::Listing),
        };
    };

    match services.reviews.create(caller.identity(), &listing_id, draft).await {
        Ok(review) => (
            StatusCode::CREATED,
            Json(dto::ReviewMutationResponse {
                message: "Review added",
                review: Some(review),
            }),
        )
            .into_response(),
        Err(e) => errors::review_error_to_response(e, Missing::Listing),
    }
}

pub async fn update_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path((listing_id, review_id)): Path<(String, String)>,
    body: Bytes,
) -> axum::response::Response {
    let Some(key) = review_key(listing_id, review_id) else {
        return errors::not_found(Missing::Review);
    };
    let patch = dto::UpdateReviewRequest::decode(&body);

    match services.reviews.update(caller.identity(), &key, patch).await {
        Ok(review) => (
            StatusCode::OK,
            Json(dto::ReviewMutationResponse {
                message: "Review updated",
                review: Some(review),
            }),
        )
            .into_response(),
        Err(e) => errors::review_error_to_response(e, Missing::Review),
    }
}

pub async fn delete_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path((listing_id, review_id)): Path<(String, String)>,
) -> axum::response::Response {
    let Some(key) = review_key(listing_id, review_id) else {
        return errors::not_found(Missing::Review);
    };

    match services.reviews.delete(caller.identity(), &key).await {
        Ok(()) => (
            StatusCode::OK,
            Json(dto::ReviewMutationResponse {
                message: "Review deleted",
                review: None,
            }),
        )
            .into_response(),
        Err(e) => errors::review_error_to_response(e, Missing::Review),
    }
}

/// Path ids that cannot be parsed cannot name a stored review.
fn review_key(listing_id: String, review_id: String) -> Option<ReviewKey> {
    Some(ReviewKey::new(
        ListingId::parse(listing_id).ok()?,
        ReviewId::parse(review_id).ok()?,
    ))
}
