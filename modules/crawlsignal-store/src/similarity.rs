use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FingerprintRow {
    pub content_id: Uuid,
    pub simhash: Vec<u8>,
    pub minhash: Option<Vec<u8>>,
    pub word_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SimilarityStore {
    pool: PgPool,
}

impl SimilarityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn save_fingerprint(
        &self,
        content_id: Uuid,
        simhash: &[u8],
        minhash: Option<&[u8]>,
        word_count: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO similarity_fingerprints (content_id, simhash, minhash, word_count)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (content_id) DO UPDATE SET simhash = EXCLUDED.simhash,
                minhash = EXCLUDED.minhash, word_count = EXCLUDED.word_count
            "#,
        )
        .bind(content_id)
        .bind(simhash)
        .bind(minhash)
        .bind(word_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_fingerprint(&self, content_id: Uuid) -> Result<Option<FingerprintRow>> {
        let row = sqlx::query_as::<_, FingerprintRow>(
            "SELECT * FROM similarity_fingerprints WHERE content_id = $1",
        )
        .bind(content_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_all(&self, limit: i64) -> Result<Vec<FingerprintRow>> {
        let rows = sqlx::query_as::<_, FingerprintRow>(
            "SELECT * FROM similarity_fingerprints ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Content blobs whose most recent analysis is at least `min_words` long
    /// but have not yet been indexed, paginated for a background sweep.
    pub async fn articles_without_fingerprints(
        &self,
        min_words: i32,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Uuid>> {
        let rows = sqlx::query_as::<_, (Uuid,)>(
            r#"
            SELECT a.content_id
            FROM analyses a
            LEFT JOIN similarity_fingerprints f ON f.content_id = a.content_id
            WHERE f.content_id IS NULL AND a.word_count >= $1
            ORDER BY a.created_at
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(min_words)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
