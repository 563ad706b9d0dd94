use std::time::Instant;

use uuid::Uuid;

/// A URL handed to a worker by `Frontier::dequeue`. Carries everything the
/// fetch pipeline needs without a second round-trip through the frontier.
#[derive(Debug, Clone)]
pub struct UrlTicket {
    pub id: Uuid,
    pub url: String,
    pub host: String,
    pub depth: u32,
    pub priority_score: f64,
    pub attempt: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Accepted,
    Dedup,
    Dropped,
}

/// Reported by a worker after running the fetch pipeline on a dequeued ticket.
#[derive(Debug, Clone)]
pub enum CompletionOutcome {
    Success,
    RetryableTransient,
    RateLimited { retry_after_ms: u64 },
    Permanent,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxDownloadsReached,
    EmptyFrontier,
    DeadlineExceeded,
    OperatorStop,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::MaxDownloadsReached => "max_downloads",
            StopReason::EmptyFrontier => "empty_frontier",
            StopReason::DeadlineExceeded => "deadline_exceeded",
            StopReason::OperatorStop => "operator_stop",
        }
    }
}

/// Per-host politeness and problem-cluster bookkeeping. `next_eligible` gates
/// dequeue; `recent_failures` feeds the problem-cluster priority penalty.
#[derive(Debug)]
pub(crate) struct HostState {
    pub next_eligible: Instant,
    pub min_delay_ms: u64,
    pub recent_failures: u32,
}

impl HostState {
    pub fn new(min_delay_ms: u64) -> Self {
        HostState { next_eligible: Instant::now(), min_delay_ms, recent_failures: 0 }
    }

    /// A sibling problem cluster is considered active once three or more
    /// recent fetches on this host have failed.
    pub fn problem_cluster_active(&self) -> bool {
        self.recent_failures >= 3
    }
}
