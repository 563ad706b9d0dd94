use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub content_id: Uuid,
    pub analysis_version: i32,
    pub kind: String,
    pub title: Option<String>,
    pub section: Option<String>,
    pub word_count: i32,
    pub article_xpath: Option<String>,
    pub findings: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AnalysisStore {
    pool: PgPool,
}

impl AnalysisStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn put(
        &self,
        content_id: Uuid,
        analysis_version: i32,
        kind: &str,
        title: Option<&str>,
        section: Option<&str>,
        word_count: i32,
        article_xpath: Option<&str>,
        findings: Value,
    ) -> Result<Uuid> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO analyses
                (content_id, analysis_version, kind, title, section, word_count, article_xpath, findings)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (content_id, analysis_version)
            DO UPDATE SET kind = EXCLUDED.kind, title = EXCLUDED.title, section = EXCLUDED.section,
                          word_count = EXCLUDED.word_count, article_xpath = EXCLUDED.article_xpath,
                          findings = EXCLUDED.findings
            RETURNING id
            "#,
        )
        .bind(content_id)
        .bind(analysis_version)
        .bind(kind)
        .bind(title)
        .bind(section)
        .bind(word_count)
        .bind(article_xpath)
        .bind(findings)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn latest_by_content(&self, content_id: Uuid) -> Result<Option<AnalysisRow>> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            "SELECT * FROM analyses WHERE content_id = $1 ORDER BY analysis_version DESC LIMIT 1",
        )
        .bind(content_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Persists the place detections found for one analysis. Honors the §3
    /// `(source, place_id, offsets)` dedupe invariant via the table's unique
    /// constraint; a re-run of the same analysis is a no-op per row.
    pub async fn put_detections(&self, analysis_id: Uuid, detections: &[NewPlaceDetection]) -> Result<()> {
        for detection in detections {
            sqlx::query(
                r#"
                INSERT INTO place_detections
                    (analysis_id, place_id, place_kind, method, source, offset_start, offset_end, country_code)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (analysis_id, source, place_id, offset_start, offset_end) DO NOTHING
                "#,
            )
            .bind(analysis_id)
            .bind(&detection.place_id)
            .bind(&detection.place_kind)
            .bind(&detection.method)
            .bind(&detection.source)
            .bind(detection.offset_start)
            .bind(detection.offset_end)
            .bind(&detection.country_code)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewPlaceDetection {
    pub place_id: String,
    pub place_kind: String,
    pub method: String,
    pub source: String,
    pub offset_start: Option<i32>,
    pub offset_end: Option<i32>,
    pub country_code: Option<String>,
}
