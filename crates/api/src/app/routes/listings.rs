use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use staybook_core::{HostId, ListingId};
use staybook_infra::listing_store::ListingStore;
use staybook_listings::{Page, PageRequest};

use crate::app::dto;
use crate::app::errors::{self, Missing};
use crate::app::services::AppServices;

pub async fn get_listing(
    Extension(services): Extension<Arc<AppServices>>,
    Path(listing_id): Path<String>,
) -> axum::response::Response {
    let Ok(listing_id) = ListingId::parse(listing_id) else {
        return errors::not_found(Missing::Listing);
    };

    match services.store().get_listing(&listing_id).await {
        Ok(Some(listing)) => (
            StatusCode::OK,
            Json(dto::ListingResponse {
                success: true,
                data: listing.into_summary(),
            }),
        )
            .into_response(),
        Ok(None) => errors::not_found(Missing::Listing),
        Err(e) => {
            tracing::error!(listing_id = %listing_id, error = %e, "get_listing failed");
            errors::internal_error()
        }
    }
}

/// Paginated reviews. An unknown listing yields an empty page rather than 404.
pub async fn list_reviews(
    Extension(services): Extension<Arc<AppServices>>,
    Path(listing_id): Path<String>,
    Query(query): Query<dto::PageQuery>,
) -> axum::response::Response {
    let req = PageRequest::new(query.page, query.limit);

    let page = match ListingId::parse(listing_id) {
        Ok(listing_id) => match services.store().review_page(&listing_id, req).await {
            Ok(page) => page.unwrap_or_else(Page::empty),
            Err(e) => {
                tracing::error!(listing_id = %listing_id, error = %e, "list_reviews failed");
                return errors::internal_error();
            }
        },
        Err(_) => Page::empty(),
    };

    let body = dto::ReviewsPageResponse {
        success: true,
        pagination: req.pagination(page.total),
        reviews: page.items,
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn get_host(
    Extension(services): Extension<Arc<AppServices>>,
    Path(host_id): Path<String>,
) -> axum::response::Response {
    let Ok(host_id) = HostId::parse(host_id) else {
        return errors::not_found(Missing::Host);
    };

    match services.store().find_host(&host_id).await {
        Ok(Some(host)) => (
            StatusCode::OK,
            Json(dto::HostResponse {
                success: true,
                data: host,
            }),
        )
            .into_response(),
        Ok(None) => errors::not_found(Missing::Host),
        Err(e) => {
            tracing::error!(host_id = %host_id, error = %e, "get_host failed");
            errors::internal_error()
        }
    }
}

/// Paginated listings of one host, reviews left out. An unknown host yields
/// an empty page.
pub async fn list_host_listings(
    Extension(services): Extension<Arc<AppServices>>,
    Path(host_id): Path<String>,
    Query(query): Query<dto::PageQuery>,
) -> axum::response::Response {
    let req = PageRequest::new(query.page, query.limit);

    let page = match HostId::parse(host_id) {
        Ok(host_id) => match services.store().host_listings(&host_id, req).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(host_id = %host_id, error = %e, "list_host_listings failed");
                return errors::internal_error();
            }
        },
        Err(_) => Page::empty(),
    };

    let body = dto::HostListingsResponse {
        success: true,
        pagination: req.pagination(page.total),
        data: page.items,
    };
    (StatusCode::OK, Json(body)).into_response()
}
