//! Postgres-backed listing store.
//!
//! Listings live in one table; the embedded reviews are a `JSONB` array column
//! holding the same document shape the API serves. Every review mutation is a
//! single `UPDATE` whose `WHERE` clause carries the composite key (and the
//! author for update/delete), so the row lock taken by that statement is the
//! compare-and-write unit. Under READ COMMITTED a second writer re-evaluates
//! both the predicate and the new array against the committed row, so
//! concurrent edits of sibling reviews are never lost.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value as JsonValue};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;

use staybook_core::{HostId, ListingId, ReviewKey, UserId};
use staybook_listings::{Host, Listing, ListingSummary, Page, PageRequest, Review, ReviewPatch};

use super::r#trait::{AppendOutcome, ListingStore, StoreError};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS listings (
        id            TEXT PRIMARY KEY,
        name          TEXT NOT NULL,
        summary       TEXT,
        property_type TEXT,
        country       TEXT,
        bedrooms      INTEGER,
        price         DOUBLE PRECISION,
        host          JSONB,
        reviews       JSONB NOT NULL DEFAULT '[]'::jsonb,
        CONSTRAINT listings_reviews_is_array CHECK (jsonb_typeof(reviews) = 'array')
    )
    "#,
    "ALTER TABLE listings ADD COLUMN IF NOT EXISTS host JSONB",
    r#"
    CREATE INDEX IF NOT EXISTS listings_host_id
        ON listings ((host->>'host_id'))
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS listings_reviews_gin
        ON listings USING GIN (reviews jsonb_path_ops)
    "#,
];

/// Postgres listing store.
///
/// ## Thread Safety
///
/// Uses the SQLx connection pool (cheaply cloneable, `Send + Sync`).
pub struct PostgresListingStore {
    pool: PgPool,
}

impl PostgresListingStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url` and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for stmt in SCHEMA {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    async fn listing_exists(&self, id: &ListingId) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM listings WHERE id = $1)")
            .bind(id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("listing_exists", e))
    }
}

#[async_trait]
impl ListingStore for PostgresListingStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| map_sqlx_error("health_check", e))
    }

    async fn insert_listing(&self, listing: Listing) -> Result<(), StoreError> {
        let bedrooms = listing
            .bedrooms
            .map(i32::try_from)
            .transpose()
            .map_err(|_| StoreError::Corrupt(format!("bedrooms out of range for {}", listing.id)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO listings (id, name, summary, property_type, country, bedrooms, price, host, reviews)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(listing.id.as_str())
        .bind(&listing.name)
        .bind(&listing.summary)
        .bind(&listing.property_type)
        .bind(&listing.country)
        .bind(bedrooms)
        .bind(listing.price)
        .bind(listing.host.as_ref().map(Json))
        .bind(Json(&listing.reviews))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505") => {
                Err(StoreError::DuplicateListing(listing.id))
            }
            Err(e) => Err(map_sqlx_error("insert_listing", e)),
        }
    }

    async fn get_listing(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, summary, property_type, country, bedrooms, price, host, reviews
            FROM listings
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_listing", e))?;

        row.map(|r| listing_from_row(&r)).transpose()
    }

    async fn find_review(&self, key: &ReviewKey) -> Result<Option<Review>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT r.elem AS review
            FROM listings AS l, jsonb_array_elements(l.reviews) AS r(elem)
            WHERE l.id = $1 AND r.elem->>'_id' = $2
            LIMIT 1
            "#,
        )
        .bind(key.listing_id.as_str())
        .bind(key.review_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_review", e))?;

        row.map(|r| review_from_row(&r, "review")).transpose()
    }

    async fn review_page(
        &self,
        id: &ListingId,
        req: PageRequest,
    ) -> Result<Option<Page<Review>>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                jsonb_array_length(l.reviews)::BIGINT AS total,
                COALESCE((
                    SELECT jsonb_agg(r.elem ORDER BY r.ord)
                    FROM jsonb_array_elements(l.reviews) WITH ORDINALITY AS r(elem, ord)
                    WHERE r.ord > $2 AND r.ord <= $2 + $3
                ), '[]'::jsonb) AS items
            FROM listings AS l
            WHERE l.id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(req.offset() as i64)
        .bind(i64::from(req.limit()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("review_page", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let total: i64 = row.try_get("total").map_err(|e| map_sqlx_error("review_page", e))?;
        let Json(items): Json<Vec<Review>> = row
            .try_get("items")
            .map_err(|e| StoreError::Corrupt(format!("reviews of {id}: {e}")))?;

        Ok(Some(Page {
            items,
            total: total.max(0) as usize,
        }))
    }

    async fn find_host(&self, host_id: &HostId) -> Result<Option<Host>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT host
            FROM listings
            WHERE host->>'host_id' = $1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(host_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_host", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Json(host): Json<Host> = row
            .try_get("host")
            .map_err(|e| StoreError::Corrupt(format!("host {host_id}: {e}")))?;
        Ok(Some(host))
    }

    async fn host_listings(
        &self,
        host_id: &HostId,
        req: PageRequest,
    ) -> Result<Page<ListingSummary>, StoreError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM listings WHERE host->>'host_id' = $1")
                .bind(host_id.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("host_listings", e))?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, summary, property_type, country, bedrooms, price, host,
                   jsonb_array_length(reviews)::BIGINT AS review_count
            FROM listings
            WHERE host->>'host_id' = $1
            ORDER BY id
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(host_id.as_str())
        .bind(req.offset() as i64)
        .bind(i64::from(req.limit()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("host_listings", e))?;

        let items = rows
            .iter()
            .map(summary_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            total: total.max(0) as usize,
        })
    }

    async fn push_review(
        &self,
        listing_id: &ListingId,
        review: Review,
    ) -> Result<AppendOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE listings
            SET reviews = reviews || jsonb_build_array($2::jsonb)
            WHERE id = $1
              AND NOT reviews @> jsonb_build_array(jsonb_build_object('_id', $3::text))
            "#,
        )
        .bind(listing_id.as_str())
        .bind(Json(&review))
        .bind(review.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("push_review", e))?;

        if result.rows_affected() == 1 {
            return Ok(AppendOutcome::Appended);
        }
        if self.listing_exists(listing_id).await? {
            Ok(AppendOutcome::DuplicateReview)
        } else {
            Ok(AppendOutcome::ListingNotFound)
        }
    }

    async fn update_review_where(
        &self,
        key: &ReviewKey,
        author: &UserId,
        patch: &ReviewPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Review>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE listings AS l
            SET reviews = (
                SELECT jsonb_agg(
                    CASE WHEN r.elem->>'_id' = $2 THEN r.elem || $4::jsonb ELSE r.elem END
                    ORDER BY r.ord
                )
                FROM jsonb_array_elements(l.reviews) WITH ORDINALITY AS r(elem, ord)
            )
            WHERE l.id = $1
              AND l.reviews @> jsonb_build_array(
                    jsonb_build_object('_id', $2::text, 'reviewer_id', $3::text))
            RETURNING (
                SELECT e FROM jsonb_array_elements(l.reviews) AS e
                WHERE e->>'_id' = $2
                LIMIT 1
            ) AS review
            "#,
        )
        .bind(key.listing_id.as_str())
        .bind(key.review_id.as_str())
        .bind(author.as_str())
        .bind(Json(patch_document(patch, now)))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_review_where", e))?;

        row.map(|r| review_from_row(&r, "review")).transpose()
    }

    async fn pull_review_where(&self, key: &ReviewKey, author: &UserId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE listings AS l
            SET reviews = COALESCE((
                SELECT jsonb_agg(r.elem ORDER BY r.ord)
                FROM jsonb_array_elements(l.reviews) WITH ORDINALITY AS r(elem, ord)
                WHERE r.elem->>'_id' <> $2
            ), '[]'::jsonb)
            WHERE l.id = $1
              AND l.reviews @> jsonb_build_array(
                    jsonb_build_object('_id', $2::text, 'reviewer_id', $3::text))
            "#,
        )
        .bind(key.listing_id.as_str())
        .bind(key.review_id.as_str())
        .bind(author.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("pull_review_where", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// JSON object merged over the stored review: present fields plus `updated_at`.
fn patch_document(patch: &ReviewPatch, now: DateTime<Utc>) -> JsonValue {
    let mut doc = Map::new();
    if let Some(comments) = &patch.comments {
        doc.insert("comments".to_string(), JsonValue::String(comments.clone()));
    }
    if let Some(name) = &patch.reviewer_name {
        doc.insert("reviewer_name".to_string(), JsonValue::String(name.clone()));
    }
    doc.insert("updated_at".to_string(), JsonValue::String(now.to_rfc3339_opts(SecondsFormat::AutoSi, true)));
    JsonValue::Object(doc)
}

fn review_from_row(row: &PgRow, column: &str) -> Result<Review, StoreError> {
    let Json(review): Json<Review> = row
        .try_get(column)
        .map_err(|e| StoreError::Corrupt(format!("review document: {e}")))?;
    Ok(review)
}

fn listing_from_row(row: &PgRow) -> Result<Listing, StoreError> {
    let mut listing = attributes_from_row(row)?;
    let Json(reviews): Json<Vec<Review>> = row
        .try_get("reviews")
        .map_err(|e| StoreError::Corrupt(format!("reviews of {}: {e}", listing.id)))?;
    listing.reviews = reviews;
    Ok(listing)
}

fn summary_from_row(row: &PgRow) -> Result<ListingSummary, StoreError> {
    let review_count: i64 = row
        .try_get("review_count")
        .map_err(|e| map_sqlx_error("summary_from_row", e))?;
    let mut summary = attributes_from_row(row)?.into_summary();
    summary.review_count = review_count.max(0) as usize;
    Ok(summary)
}

/// Every listing column except `reviews`.
fn attributes_from_row(row: &PgRow) -> Result<Listing, StoreError> {
    let id: String = row.try_get("id").map_err(|e| map_sqlx_error("listing_from_row", e))?;
    let id = ListingId::parse(id).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let bedrooms: Option<i32> = row
        .try_get("bedrooms")
        .map_err(|e| map_sqlx_error("listing_from_row", e))?;
    let host: Option<Json<Host>> = row
        .try_get("host")
        .map_err(|e| StoreError::Corrupt(format!("host of {id}: {e}")))?;

    Ok(Listing {
        name: row.try_get("name").map_err(|e| map_sqlx_error("listing_from_row", e))?,
        summary: row.try_get("summary").map_err(|e| map_sqlx_error("listing_from_row", e))?,
        property_type: row
            .try_get("property_type")
            .map_err(|e| map_sqlx_error("listing_from_row", e))?,
        country: row.try_get("country").map_err(|e| map_sqlx_error("listing_from_row", e))?,
        bedrooms: bedrooms.and_then(|b| u32::try_from(b).ok()),
        price: row.try_get("price").map_err(|e| map_sqlx_error("listing_from_row", e))?,
        host: host.map(|Json(h)| h),
        reviews: Vec::new(),
        id,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Unavailable(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::Corrupt(format!("{operation}: column {index}: {source}"))
        }
        other => StoreError::Unavailable(format!("{operation}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_document_carries_only_present_fields() {
        let now = Utc::now();
        let doc = patch_document(
            &ReviewPatch {
                comments: Some("great".to_string()),
                reviewer_name: None,
            },
            now,
        );
        let obj = doc.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["comments"], "great");
        assert!(obj.get("reviewer_name").is_none());

        let stamped: DateTime<Utc> = serde_json::from_value(obj["updated_at"].clone()).unwrap();
        assert_eq!(stamped, now);
    }
}
