use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContentBlobRow {
    pub id: Uuid,
    pub fetch_attempt_id: Uuid,
    pub body: Vec<u8>,
    pub byte_length: i64,
    pub media_type: Option<String>,
    pub charset: Option<String>,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ContentStore {
    pool: PgPool,
}

impl ContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn put(
        &self,
        fetch_attempt_id: Uuid,
        body: &[u8],
        media_type: Option<&str>,
        charset: Option<&str>,
        content_hash: &str,
    ) -> Result<Uuid> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO content_blobs (fetch_attempt_id, body, byte_length, media_type, charset, content_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(fetch_attempt_id)
        .bind(body)
        .bind(body.len() as i64)
        .bind(media_type)
        .bind(charset)
        .bind(content_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn get(&self, content_id: Uuid) -> Result<Option<ContentBlobRow>> {
        let row = sqlx::query_as::<_, ContentBlobRow>("SELECT * FROM content_blobs WHERE id = $1")
            .bind(content_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn by_content_hash(&self, content_hash: &str) -> Result<Vec<ContentBlobRow>> {
        let rows = sqlx::query_as::<_, ContentBlobRow>(
            "SELECT * FROM content_blobs WHERE content_hash = $1",
        )
        .bind(content_hash)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
