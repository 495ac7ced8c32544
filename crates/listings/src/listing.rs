use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use staybook_core::{HostId, ListingId, ReviewId, UserId};

use crate::host::Host;
use crate::page::{Page, PageRequest};
use crate::review::{Review, ReviewPatch};

/// A listing document.
///
/// Listings are created by the import/seed path. This crate only reads them
/// and mutates `reviews`, one element at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: ListingId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<Host>,
    /// Embedded, unordered append-list.
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl Listing {
    pub fn new(id: ListingId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            summary: None,
            property_type: None,
            country: None,
            bedrooms: None,
            price: None,
            host: None,
            reviews: Vec::new(),
        }
    }

    pub fn is_hosted_by(&self, host_id: &HostId) -> bool {
        self.host.as_ref().is_some_and(|h| &h.host_id == host_id)
    }

    pub fn find_review(&self, review_id: &ReviewId) -> Option<&Review> {
        self.reviews.iter().find(|r| &r.id == review_id)
    }

    /// Append `review` at the end. Returns `false` (and changes nothing) when
    /// a review with the same id already exists.
    pub fn append_review(&mut self, review: Review) -> bool {
        if self.find_review(&review.id).is_some() {
            return false;
        }
        self.reviews.push(review);
        true
    }

    /// Patch the review matching both `review_id` and `author`.
    ///
    /// Returns the updated review, or `None` when no element matches; in that
    /// case the document is untouched.
    pub fn patch_review_by(
        &mut self,
        review_id: &ReviewId,
        author: &UserId,
        patch: &ReviewPatch,
        now: DateTime<Utc>,
    ) -> Option<Review> {
        let review = self
            .reviews
            .iter_mut()
            .find(|r| &r.id == review_id && &r.reviewer_id == author)?;
        patch.apply_to(review, now);
        Some(review.clone())
    }

    /// Remove the review matching both `review_id` and `author`.
    pub fn remove_review_by(&mut self, review_id: &ReviewId, author: &UserId) -> Option<Review> {
        let idx = self
            .reviews
            .iter()
            .position(|r| &r.id == review_id && &r.reviewer_id == author)?;
        Some(self.reviews.remove(idx))
    }

    pub fn review_page(&self, req: PageRequest) -> Page<Review> {
        Page {
            items: self
                .reviews
                .iter()
                .skip(req.offset())
                .take(req.limit() as usize)
                .cloned()
                .collect(),
            total: self.reviews.len(),
        }
    }

    /// The document with the embedded reviews left out.
    pub fn into_summary(self) -> ListingSummary {
        ListingSummary {
            id: self.id,
            name: self.name,
            summary: self.summary,
            property_type: self.property_type,
            country: self.country,
            bedrooms: self.bedrooms,
            price: self.price,
            host: self.host,
            review_count: self.reviews.len(),
        }
    }
}

/// Read view of a listing without its reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingSummary {
    #[serde(rename = "_id")]
    pub id: ListingId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<Host>,
    pub review_count: usize,
}
