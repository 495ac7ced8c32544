use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use staybook_infra::reviews::ReviewError;

/// What a 404 refers to, so the body names the missing thing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Missing {
    Listing,
    Review,
    Host,
}

impl Missing {
    fn message(self) -> &'static str {
        match self {
            Missing::Listing => "Listing not found",
            Missing::Review => "Review not found",
            Missing::Host => "Host not found",
        }
    }
}

pub fn review_error_to_response(err: ReviewError, missing: Missing) -> axum::response::Response {
    match err {
        ReviewError::Forbidden => json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "Only the author of a review may change it",
        ),
        ReviewError::NotFound => not_found(missing),
        ReviewError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        ReviewError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        // Details were logged where the fault was observed.
        ReviewError::Internal(_) => internal_error(),
    }
}

pub fn not_found(missing: Missing) -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", missing.message())
}

pub fn unauthenticated(message: &'static str) -> axum::response::Response {
    json_error(StatusCode::UNAUTHORIZED, "unauthenticated", message)
}

pub fn internal_error() -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "Internal server error",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
