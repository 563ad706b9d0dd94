//! In-process job registry for the daemon HTTP API. Single-job: starting a
//! job while one is running is rejected, not queued. Completed runs are kept
//! in a bounded history of the last 100.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use crawlsignal_common::CrawlConfig;
use crawlsignal_pipeline::{spawn_job, JobHandle, JobServices, JobSummary};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

const MAX_HISTORY: usize = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed {
        stop_reason: String,
        downloads: u64,
        attempts: u64,
        dequeued: u64,
        dropped: u64,
        deduped: u64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub id: String,
    pub seed_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub status: JobStatus,
}

struct ActiveJob {
    handle: Arc<JobHandle>,
    seed_url: String,
    started_at: DateTime<Utc>,
}

struct Inner {
    active: Option<ActiveJob>,
    history: VecDeque<JobView>,
}

#[derive(Debug, Clone, Copy)]
pub enum StartError {
    AlreadyRunning,
}

/// Single-job in-process registry, shared via `Arc` between the HTTP
/// handlers and the background task that watches each job to completion.
#[derive(Clone)]
pub struct JobRegistry {
    inner: Arc<Mutex<Inner>>,
    services: Arc<JobServices>,
}

impl JobRegistry {
    pub fn new(services: Arc<JobServices>) -> Self {
        JobRegistry { inner: Arc::new(Mutex::new(Inner { active: None, history: VecDeque::new() })), services }
    }

    /// Starts a job and returns its id immediately; the job itself runs in
    /// the background. Rejects the request if one is already running.
    pub async fn start(&self, seed_url: String, config: CrawlConfig) -> Result<String, StartError> {
        let mut inner = self.inner.lock().await;
        if inner.active.is_some() {
            return Err(StartError::AlreadyRunning);
        }

        let job_id = Uuid::new_v4().to_string();
        let (handle, join) = spawn_job(job_id.clone(), seed_url.clone(), config, self.services.clone());
        let started_at = Utc::now();
        inner.active = Some(ActiveJob { handle, seed_url: seed_url.clone(), started_at });
        drop(inner);

        let registry = self.clone();
        let watched_id = job_id.clone();
        tokio::spawn(async move {
            let summary = join.await.unwrap_or_else(|join_err| JobSummary {
                job: watched_id.clone(),
                stop_reason: format!("worker panicked: {join_err}"),
                downloads: 0,
                attempts: 0,
                dequeued: 0,
                dropped: 0,
                deduped: 0,
            });
            registry.finish(summary).await;
        });

        info!(job = %job_id, seed_url = %seed_url, "job started");
        Ok(job_id)
    }

    async fn finish(&self, summary: JobSummary) {
        let mut inner = self.inner.lock().await;
        let Some(active) = inner.active.take() else { return };
        let view = JobView {
            id: summary.job.clone(),
            seed_url: active.seed_url,
            started_at: active.started_at,
            finished_at: Some(Utc::now()),
            status: JobStatus::Completed {
                stop_reason: summary.stop_reason,
                downloads: summary.downloads,
                attempts: summary.attempts,
                dequeued: summary.dequeued,
                dropped: summary.dropped,
                deduped: summary.deduped,
            },
        };
        if inner.history.len() >= MAX_HISTORY {
            inner.history.pop_front();
        }
        inner.history.push_back(view);
    }

    pub async fn list(&self) -> Vec<JobView> {
        let inner = self.inner.lock().await;
        let mut out: Vec<JobView> = inner.history.iter().cloned().collect();
        if let Some(active) = &inner.active {
            out.push(Self::running_view(active));
        }
        out
    }

    pub async fn get(&self, id: &str) -> Option<JobView> {
        let inner = self.inner.lock().await;
        if let Some(active) = &inner.active {
            if active.handle.id == id {
                return Some(Self::running_view(active));
            }
        }
        inner.history.iter().find(|j| j.id == id).cloned()
    }

    /// Requests a graceful stop of the named job. No-op (returns `false`) if
    /// it isn't the currently running job.
    pub async fn stop(&self, id: &str) -> bool {
        let handle = {
            let inner = self.inner.lock().await;
            inner.active.as_ref().filter(|a| a.handle.id == id).map(|a| a.handle.clone())
        };
        match handle {
            Some(handle) => {
                handle.drain_stop().await;
                true
            }
            None => false,
        }
    }

    fn running_view(active: &ActiveJob) -> JobView {
        JobView {
            id: active.handle.id.clone(),
            seed_url: active.seed_url.clone(),
            started_at: active.started_at,
            finished_at: None,
            status: JobStatus::Running,
        }
    }
}
