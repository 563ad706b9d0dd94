use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FetchAttemptRow {
    pub id: Uuid,
    pub url_id: Uuid,
    pub status: i32,
    pub dns_ms: Option<i32>,
    pub tcp_ms: Option<i32>,
    pub ttfb_ms: Option<i32>,
    pub download_ms: Option<i32>,
    pub byte_count: i64,
    pub content_type: Option<String>,
    pub headers: Option<Value>,
    pub classification: String,
    pub truncated: bool,
    pub error_reason: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewFetchAttempt {
    pub status: i32,
    pub dns_ms: Option<i32>,
    pub tcp_ms: Option<i32>,
    pub ttfb_ms: Option<i32>,
    pub download_ms: Option<i32>,
    pub byte_count: i64,
    pub content_type: Option<String>,
    pub headers: Option<Value>,
    pub classification: String,
    pub truncated: bool,
    pub error_reason: Option<String>,
}

#[derive(Clone)]
pub struct FetchesStore {
    pool: PgPool,
}

impl FetchesStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends a fetch attempt. Write failures are logged and swallowed: a
    /// missed telemetry row must never abort an in-flight crawl.
    pub async fn append(&self, url_id: Uuid, attempt: NewFetchAttempt) -> Option<Uuid> {
        let result = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO fetch_attempts
                (url_id, status, dns_ms, tcp_ms, ttfb_ms, download_ms, byte_count,
                 content_type, headers, classification, truncated, error_reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(url_id)
        .bind(attempt.status)
        .bind(attempt.dns_ms)
        .bind(attempt.tcp_ms)
        .bind(attempt.ttfb_ms)
        .bind(attempt.download_ms)
        .bind(attempt.byte_count)
        .bind(attempt.content_type)
        .bind(attempt.headers)
        .bind(attempt.classification)
        .bind(attempt.truncated)
        .bind(attempt.error_reason)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Some(row.0),
            Err(err) => {
                warn!(error = %err, %url_id, "failed to record fetch attempt");
                None
            }
        }
    }

    pub async fn latest_by_url(&self, url_id: Uuid) -> Result<Option<FetchAttemptRow>> {
        let row = sqlx::query_as::<_, FetchAttemptRow>(
            "SELECT * FROM fetch_attempts WHERE url_id = $1 ORDER BY fetched_at DESC LIMIT 1",
        )
        .bind(url_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn history(&self, url_id: Uuid, limit: i64) -> Result<Vec<FetchAttemptRow>> {
        let rows = sqlx::query_as::<_, FetchAttemptRow>(
            "SELECT * FROM fetch_attempts WHERE url_id = $1 ORDER BY fetched_at DESC LIMIT $2",
        )
        .bind(url_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
