//! `QueueEvent`: one row per frontier transition, persisted append-only by
//! `crawlsignal-store::queue_events` and mirrored onto the in-process bus so
//! coverage snapshots and operators can observe a run live.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueAction {
    Enqueue,
    Dequeue,
    Drop,
    Dedup,
    Defer,
}

impl QueueAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueAction::Enqueue => "enqueue",
            QueueAction::Dequeue => "dequeue",
            QueueAction::Drop => "drop",
            QueueAction::Dedup => "dedup",
            QueueAction::Defer => "defer",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEvent {
    pub job: String,
    pub ts: DateTime<Utc>,
    pub action: QueueAction,
    pub url: String,
    pub host: String,
    pub depth: u32,
    pub priority_score: f64,
    pub reason: Option<String>,
}

impl QueueEvent {
    pub fn new(job: impl Into<String>, action: QueueAction, url: impl Into<String>, host: impl Into<String>, depth: u32, priority_score: f64) -> Self {
        QueueEvent {
            job: job.into(),
            ts: Utc::now(),
            action,
            url: url.into(),
            host: host.into(),
            depth,
            priority_score,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_as_str_matches_spec_vocabulary() {
        assert_eq!(QueueAction::Enqueue.as_str(), "enqueue");
        assert_eq!(QueueAction::Dedup.as_str(), "dedup");
    }

    #[test]
    fn with_reason_attaches_reason() {
        let event = QueueEvent::new("job-1", QueueAction::Drop, "https://example.com", "example.com", 0, 0.0)
            .with_reason("robots");
        assert_eq!(event.reason.as_deref(), Some("robots"));
    }
}
