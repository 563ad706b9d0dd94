use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlannerPatternRow {
    pub id: Uuid,
    pub domain: String,
    pub pattern_kind: String,
    pub confidence: f64,
    pub successes: i32,
    pub failures: i32,
    pub xpath: String,
    pub last_validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PlannerStore {
    pool: PgPool,
}

impl PlannerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record_pattern(
        &self,
        domain: &str,
        pattern_kind: &str,
        xpath: &str,
        confidence: f64,
    ) -> Result<Uuid> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO planner_patterns (domain, pattern_kind, xpath, confidence)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(domain)
        .bind(pattern_kind)
        .bind(xpath)
        .bind(confidence)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn patterns_by_domain(
        &self,
        domain: &str,
        min_confidence: f64,
    ) -> Result<Vec<PlannerPatternRow>> {
        let rows = sqlx::query_as::<_, PlannerPatternRow>(
            r#"
            SELECT * FROM planner_patterns
            WHERE domain = $1 AND confidence >= $2
            ORDER BY confidence DESC
            "#,
        )
        .bind(domain)
        .bind(min_confidence)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn update_pattern_success(&self, pattern_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE planner_patterns
            SET successes = successes + 1,
                confidence = LEAST(1.0, confidence + (1.0 - confidence) * 0.2),
                last_validated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(pattern_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_pattern_failure(&self, pattern_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE planner_patterns
            SET failures = failures + 1,
                confidence = GREATEST(0.0, confidence * 0.5),
                last_validated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(pattern_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn hub_validations(&self, domain: &str) -> Result<Vec<PlannerPatternRow>> {
        let rows = sqlx::query_as::<_, PlannerPatternRow>(
            "SELECT * FROM planner_patterns WHERE domain = $1 AND pattern_kind = 'hub' ORDER BY confidence DESC",
        )
        .bind(domain)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
