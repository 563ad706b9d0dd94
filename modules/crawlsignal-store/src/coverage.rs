use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CoverageSnapshotRow {
    pub id: Uuid,
    pub job: String,
    pub expected_hubs: i32,
    pub discovered_hubs: i32,
    pub active_problems: i32,
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CoverageGapRow {
    pub id: Uuid,
    pub job: String,
    pub target: String,
    pub detail: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CoverageStore {
    pool: PgPool,
}

impl CoverageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn snapshot(
        &self,
        job: &str,
        expected_hubs: i32,
        discovered_hubs: i32,
        active_problems: i32,
    ) -> Result<Uuid> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO coverage_snapshots (job, expected_hubs, discovered_hubs, active_problems)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(job)
        .bind(expected_hubs)
        .bind(discovered_hubs)
        .bind(active_problems)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn record_gap(&self, job: &str, target: &str, detail: Option<&str>) -> Result<Uuid> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO coverage_gaps (job, target, detail)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(job)
        .bind(target)
        .bind(detail)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn resolve_gap(&self, gap_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE coverage_gaps SET resolved_at = now() WHERE id = $1")
            .bind(gap_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn open_gaps(&self, job: &str) -> Result<Vec<CoverageGapRow>> {
        let rows = sqlx::query_as::<_, CoverageGapRow>(
            "SELECT * FROM coverage_gaps WHERE job = $1 AND resolved_at IS NULL ORDER BY created_at",
        )
        .bind(job)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn record_milestone(&self, job: &str, label: &str, detail: Option<Value>) -> Result<Uuid> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO coverage_milestones (job, label, detail)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(job)
        .bind(label)
        .bind(detail)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn latest_snapshot(&self, job: &str) -> Result<Option<CoverageSnapshotRow>> {
        let row = sqlx::query_as::<_, CoverageSnapshotRow>(
            "SELECT * FROM coverage_snapshots WHERE job = $1 ORDER BY taken_at DESC LIMIT 1",
        )
        .bind(job)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
