use chrono::{DateTime, Utc};
use crawlsignal_events::QueueEvent;
use sqlx::PgPool;
use tracing::warn;

use crate::error::Result;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueueEventRow {
    pub id: i64,
    pub job: String,
    pub ts: DateTime<Utc>,
    pub action: String,
    pub url: String,
    pub host: String,
    pub depth: i32,
    pub priority_score: f64,
    pub reason: Option<String>,
}

#[derive(Clone)]
pub struct QueueEventsStore {
    pool: PgPool,
}

impl QueueEventsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append-only log of every frontier transition. Like `FetchesStore::append`,
    /// a write failure here is logged and swallowed rather than stalling the crawl.
    pub async fn append(&self, event: &QueueEvent) {
        let result = sqlx::query(
            r#"
            INSERT INTO queue_events (job, ts, action, url, host, depth, priority_score, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&event.job)
        .bind(event.ts)
        .bind(event.action.as_str())
        .bind(&event.url)
        .bind(&event.host)
        .bind(event.depth as i32)
        .bind(event.priority_score)
        .bind(&event.reason)
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            warn!(error = %err, job = %event.job, url = %event.url, "failed to persist queue event");
        }
    }

    pub async fn by_job(&self, job: &str, limit: i64) -> Result<Vec<QueueEventRow>> {
        let rows = sqlx::query_as::<_, QueueEventRow>(
            "SELECT * FROM queue_events WHERE job = $1 ORDER BY ts LIMIT $2",
        )
        .bind(job)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Totals per action for a job, used to check the enqueue/dequeue/dropped/dedup
    /// conservation invariant from storage rather than in-memory counters alone.
    pub async fn action_counts(&self, job: &str) -> Result<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT action, COUNT(*) FROM queue_events WHERE job = $1 GROUP BY action",
        )
        .bind(job)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
