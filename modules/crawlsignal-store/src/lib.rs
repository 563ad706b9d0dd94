//! Postgres-backed persistence for the crawl pipeline: one thin adapter per
//! logical entity, each wrapping a shared `PgPool`. Mirrors the adapter shape
//! used elsewhere in this workspace for archived interaction storage.

pub mod analysis;
pub mod content;
pub mod coverage;
pub mod error;
pub mod fetches;
pub mod planner;
pub mod queue_events;
pub mod similarity;
pub mod urls;

pub use analysis::{AnalysisRow, AnalysisStore, NewPlaceDetection};
pub use content::{ContentBlobRow, ContentStore};
pub use coverage::{CoverageGapRow, CoverageSnapshotRow, CoverageStore};
pub use error::{Result, StoreError};
pub use fetches::{FetchAttemptRow, FetchesStore, NewFetchAttempt};
pub use planner::{PlannerPatternRow, PlannerStore};
pub use queue_events::{QueueEventRow, QueueEventsStore};
pub use similarity::{FingerprintRow, SimilarityStore};
pub use urls::{NewHubCandidate, UrlRow, UrlsStore};

use sqlx::PgPool;

/// All eight adapters over one pool, handed to the pipeline and daemon as a unit.
#[derive(Clone)]
pub struct Store {
    pub urls: UrlsStore,
    pub fetches: FetchesStore,
    pub content: ContentStore,
    pub analysis: AnalysisStore,
    pub similarity: SimilarityStore,
    pub queue_events: QueueEventsStore,
    pub coverage: CoverageStore,
    pub planner: PlannerStore,
    pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self {
            urls: UrlsStore::new(pool.clone()),
            fetches: FetchesStore::new(pool.clone()),
            content: ContentStore::new(pool.clone()),
            analysis: AnalysisStore::new(pool.clone()),
            similarity: SimilarityStore::new(pool.clone()),
            queue_events: QueueEventsStore::new(pool.clone()),
            coverage: CoverageStore::new(pool.clone()),
            planner: PlannerStore::new(pool.clone()),
            pool,
        }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
