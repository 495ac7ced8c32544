use serde::{Deserialize, Serialize};
use serde_json::Value;

use staybook_core::{DomainError, DomainResult, WireUserId};
use staybook_listings::{Host, ListingSummary, NewReview, Pagination, Review, ReviewPatch};

// -------------------------
// Request DTOs
// -------------------------

/// Create body, decoded without judging field types.
///
/// The engine must see the claimed author before anything else is checked, so
/// a body that is not a JSON object decodes to an empty request (no author)
/// instead of failing here.
#[derive(Debug, Default, Deserialize)]
pub struct CreateReviewRequest {
    #[serde(rename = "_id", default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub reviewer_id: Option<Value>,
    #[serde(default)]
    pub reviewer_name: Option<Value>,
    #[serde(default)]
    pub comments: Option<Value>,
    #[serde(default)]
    pub rating: Option<Value>,
}

impl CreateReviewRequest {
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    pub fn into_new_review(self) -> NewReview {
        let mut malformed = Vec::new();

        let id = self.id.and_then(|v| wire_id(v, "_id", &mut malformed));
        // Any other shape is simply not a claim to be anyone.
        let reviewer_id = self
            .reviewer_id
            .and_then(|v| serde_json::from_value::<WireUserId>(v).ok())
            .map(WireUserId::into_raw);
        let reviewer_name = self.reviewer_name.and_then(|v| text(v, "reviewer_name", &mut malformed));
        let comments = self.comments.and_then(|v| text(v, "comments", &mut malformed));
        let rating = self.rating.and_then(|v| match v.as_i64() {
            Some(n) => Some(n),
            None => {
                malformed.push("rating");
                None
            }
        });

        NewReview {
            id,
            reviewer_id,
            reviewer_name,
            comments,
            rating,
            malformed,
        }
    }
}

/// Partial update body; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateReviewRequest {
    #[serde(default)]
    pub comments: Option<Value>,
    #[serde(default)]
    pub reviewer_name: Option<Value>,
}

impl UpdateReviewRequest {
    /// Decode a patch. Errors are handed to the engine, which reports them
    /// only after existence and authorship checks.
    pub fn decode(body: &[u8]) -> DomainResult<ReviewPatch> {
        let req: Self = serde_json::from_slice(body)
            .map_err(|_| DomainError::validation("request body must be a JSON object"))?;
        let mut malformed = Vec::new();
        let patch = ReviewPatch {
            comments: req.comments.and_then(|v| text(v, "comments", &mut malformed)),
            reviewer_name: req.reviewer_name.and_then(|v| text(v, "reviewer_name", &mut malformed)),
        };
        match malformed.first() {
            Some(field) => Err(DomainError::validation(format!("'{field}' has the wrong type"))),
            None => Ok(patch),
        }
    }
}

fn text(value: Value, field: &'static str, malformed: &mut Vec<&'static str>) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        _ => {
            malformed.push(field);
            None
        }
    }
}

fn wire_id(value: Value, field: &'static str, malformed: &mut Vec<&'static str>) -> Option<String> {
    match serde_json::from_value::<WireUserId>(value) {
        Ok(id) => Some(id.into_raw()),
        Err(_) => {
            malformed.push(field);
            None
        }
    }
}

/// `?page=&limit=` on paginated read paths.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ReviewMutationResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<Review>,
}

#[derive(Debug, Serialize)]
pub struct ReviewsPageResponse {
    pub success: bool,
    pub reviews: Vec<Review>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub success: bool,
    pub data: ListingSummary,
}

#[derive(Debug, Serialize)]
pub struct HostResponse {
    pub success: bool,
    pub data: Host,
}

#[derive(Debug, Serialize)]
pub struct HostListingsResponse {
    pub success: bool,
    pub data: Vec<ListingSummary>,
    pub pagination: Pagination,
}
