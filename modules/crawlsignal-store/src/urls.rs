use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UrlRow {
    pub id: Uuid,
    pub url: String,
    pub host: String,
    pub depth: i32,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct UrlsStore {
    pool: PgPool,
}

impl UrlsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the url if unseen, otherwise returns the existing row's id.
    pub async fn ensure(&self, url: &str, host: &str, depth: i32) -> Result<Uuid> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO urls (url, host, depth)
            VALUES ($1, $2, $3)
            ON CONFLICT (url) DO UPDATE SET url = EXCLUDED.url
            RETURNING id
            "#,
        )
        .bind(url)
        .bind(host)
        .bind(depth)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn by_url(&self, url: &str) -> Result<Option<UrlRow>> {
        let row = sqlx::query_as::<_, UrlRow>("SELECT * FROM urls WHERE url = $1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get(&self, url_id: Uuid) -> Result<Option<UrlRow>> {
        let row = sqlx::query_as::<_, UrlRow>("SELECT * FROM urls WHERE id = $1")
            .bind(url_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Bumps `last_seen_at`; used when a url is re-enqueued after already being known.
    pub async fn touch(&self, url_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE urls SET last_seen_at = now() WHERE id = $1")
            .bind(url_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records a `HubCandidate` (§3) emitted by the classifier for this url.
    pub async fn record_hub_candidate(&self, url_id: Uuid, candidate: &NewHubCandidate) -> Result<Uuid> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO hub_candidates (url_id, place_slug, place_kind, topic_slug, topic_kind, topic_source)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(url_id)
        .bind(&candidate.place_slug)
        .bind(&candidate.place_kind)
        .bind(&candidate.topic_slug)
        .bind(&candidate.topic_kind)
        .bind(&candidate.topic_source)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }
}

#[derive(Debug, Clone)]
pub struct NewHubCandidate {
    pub place_slug: String,
    pub place_kind: String,
    pub topic_slug: Option<String>,
    pub topic_kind: Option<String>,
    pub topic_source: Option<String>,
}
