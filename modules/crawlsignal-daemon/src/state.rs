use std::sync::Arc;

use crawlsignal_common::CrawlConfig;
use crawlsignal_pipeline::JobServices;

use crate::registry::JobRegistry;

/// Shared axum application state: the job registry plus the base
/// configuration every job starts from before per-request overrides apply.
#[derive(Clone)]
pub struct AppState {
    pub registry: JobRegistry,
    pub base_config: CrawlConfig,
}

impl AppState {
    pub fn new(services: Arc<JobServices>, base_config: CrawlConfig) -> Self {
        AppState { registry: JobRegistry::new(services), base_config }
    }
}
