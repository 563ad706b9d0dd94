use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crawlsignal_events::{EventBus, QueueAction, QueueEvent};
use tokio::sync::{Mutex, Notify};
use tokio::time::sleep_until;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FrontierError, Result};
use crate::priority::{compute_priority_score, PriorityInputs};
use crate::types::{CompletionOutcome, EnqueueOutcome, HostState, StopReason, UrlTicket};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Ceiling applied to exponential backoff so a sick host cannot starve a job.
const MAX_BACKOFF_MS: u64 = 60_000;
/// Fallback poll interval used while waiting on the in-flight slot notifier,
/// guarding against a missed wakeup rather than blocking forever.
const NOTIFY_POLL_FALLBACK: Duration = Duration::from_millis(250);

struct HeapEntry {
    ticket: UrlTicket,
    insertion_order: u64,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.ticket.priority_score == other.ticket.priority_score
            && self.ticket.depth == other.ticket.depth
            && self.insertion_order == other.insertion_order
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `(priority_score, -depth, insertion_order)` with lower depth and earlier
/// insertion winning ties, expressed for `BinaryHeap`'s max-heap pop order.
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ticket
            .priority_score
            .total_cmp(&other.ticket.priority_score)
            .then_with(|| other.ticket.depth.cmp(&self.ticket.depth))
            .then_with(|| other.insertion_order.cmp(&self.insertion_order))
    }
}

struct Inner {
    heap: BinaryHeap<HeapEntry>,
    hosts: HashMap<String, HostState>,
    visited: HashSet<String>,
    in_flight: HashSet<Uuid>,
    insertion_counter: u64,
    /// Every call to `enqueue` counts here, regardless of outcome. Conserved
    /// against `dequeued + dropped + deduped` since each attempt resolves to
    /// exactly one of: accepted-and-eventually-dequeued, dropped, or deduped.
    attempts: u64,
    dropped: u64,
    deduped: u64,
    /// Counts only the first dispatch of a URL (`ticket.attempt == 1`).
    /// Retries re-dequeue the same original attempt and are tracked
    /// separately so they don't throw off the conservation invariant.
    dequeued: u64,
    draining: bool,
    stop_reason: Option<StopReason>,
}

/// Holds the set of URLs yet to fetch for one running job: a global
/// max-heap, per-host FIFO/politeness buckets, a visited set, and a bounded
/// in-flight set.
pub struct Frontier {
    inner: Mutex<Inner>,
    notify: Notify,
    concurrency: usize,
    default_host_min_delay_ms: u64,
    max_attempts: u32,
    events: EventBus,
    job: String,
}

impl Frontier {
    pub fn new(job: impl Into<String>, concurrency: usize, default_host_min_delay_ms: u64, events: EventBus) -> Arc<Self> {
        Arc::new(Frontier {
            inner: Mutex::new(Inner {
                heap: BinaryHeap::new(),
                hosts: HashMap::new(),
                visited: HashSet::new(),
                in_flight: HashSet::new(),
                insertion_counter: 0,
                attempts: 0,
                dropped: 0,
                deduped: 0,
                dequeued: 0,
                draining: false,
                stop_reason: None,
            }),
            notify: Notify::new(),
            concurrency: concurrency.max(1),
            default_host_min_delay_ms,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            events,
            job: job.into(),
        })
    }

    pub fn with_max_attempts(mut self: Arc<Self>, max_attempts: u32) -> Arc<Self> {
        Arc::get_mut(&mut self).expect("frontier not yet shared").max_attempts = max_attempts;
        self
    }

    /// Canonicalise, check scope/robots, dedup-check, score, and admit a URL.
    /// `allowed` is the caller's robots/scope predicate decision — the
    /// frontier itself holds no robots-parsing logic, only the conservation
    /// bookkeeping. Returns the outcome without blocking;
    /// actual dispatch happens from `dequeue`.
    pub async fn enqueue(&self, url: &str, depth: u32, allowed: bool, inputs: PriorityInputs, reason: &str) -> Result<EnqueueOutcome> {
        let canonical = crawlsignal_common::canonicalize_url(url).ok_or_else(|| FrontierError::MalformedUrl(url.to_string()))?;
        let host = url::Url::parse(&canonical)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| FrontierError::MalformedUrl(url.to_string()))?;

        let mut inner = self.inner.lock().await;
        if inner.draining {
            return Err(FrontierError::Draining);
        }
        inner.attempts += 1;

        if !allowed {
            inner.dropped += 1;
            drop(inner);
            self.events
                .publish_queue(QueueEvent::new(self.job.clone(), QueueAction::Drop, canonical, host, depth, 0.0).with_reason(reason));
            return Ok(EnqueueOutcome::Dropped);
        }

        // Atomic insert-if-absent into the visited set immediately before the
        // heap push, guaranteeing enqueue-before-dequeue ordering.
        if !inner.visited.insert(canonical.clone()) {
            inner.deduped += 1;
            drop(inner);
            self.events.publish_queue(
                QueueEvent::new(self.job.clone(), QueueAction::Dedup, canonical, host, depth, 0.0).with_reason(reason),
            );
            return Ok(EnqueueOutcome::Dedup);
        }

        let priority_score = compute_priority_score(inputs);
        let order = inner.insertion_counter;
        inner.insertion_counter += 1;
        inner.hosts.entry(host.clone()).or_insert_with(|| HostState::new(self.default_host_min_delay_ms));

        let ticket = UrlTicket {
            id: Uuid::new_v4(),
            url: canonical.clone(),
            host: host.clone(),
            depth,
            priority_score,
            attempt: 1,
            reason: reason.to_string(),
        };
        inner.heap.push(HeapEntry { ticket, insertion_order: order });
        drop(inner);

        debug!(url = %canonical, host = %host, priority_score, "enqueued");
        self.events
            .publish_queue(QueueEvent::new(self.job.clone(), QueueAction::Enqueue, canonical, host, depth, priority_score).with_reason(reason));
        self.notify.notify_waiters();
        Ok(EnqueueOutcome::Accepted)
    }

    /// Select the next eligible URL: highest-priority entry whose host has
    /// cleared its politeness delay and whose in-flight slot is free. Scans
    /// past entries belonging to currently-ineligible hosts rather than
    /// blocking on the global head of the heap.
    pub async fn dequeue(&self) -> Option<UrlTicket> {
        loop {
            let wait_until;
            {
                let mut inner = self.inner.lock().await;
                if inner.in_flight.len() >= self.concurrency {
                    wait_until = None;
                } else {
                    let mut deferred = Vec::new();
                    let mut found = None;
                    while let Some(entry) = inner.heap.pop() {
                        let now = Instant::now();
                        let eligible = inner.hosts.get(&entry.ticket.host).map(|h| h.next_eligible <= now).unwrap_or(true);
                        if eligible {
                            found = Some(entry);
                            break;
                        }
                        deferred.push(entry);
                    }
                    for entry in deferred {
                        inner.heap.push(entry);
                    }

                    if let Some(entry) = found {
                        inner.in_flight.insert(entry.ticket.id);
                        if entry.ticket.attempt == 1 {
                            inner.dequeued += 1;
                        }
                        let ticket = entry.ticket.clone();
                        drop(inner);
                        debug!(url = %ticket.url, "dequeued");
                        self.events.publish_queue(QueueEvent::new(
                            self.job.clone(),
                            QueueAction::Dequeue,
                            ticket.url.clone(),
                            ticket.host.clone(),
                            ticket.depth,
                            ticket.priority_score,
                        ));
                        return Some(ticket);
                    }

                    if inner.heap.is_empty() && inner.in_flight.is_empty() {
                        if !inner.draining {
                            inner.draining = true;
                            inner.stop_reason = Some(StopReason::EmptyFrontier);
                            info!(job = %self.job, "frontier drained: empty_frontier");
                        }
                        return None;
                    }
                    if inner.draining {
                        return None;
                    }

                    wait_until = inner.heap.iter().filter_map(|e| inner.hosts.get(&e.ticket.host).map(|h| h.next_eligible)).min();
                }
            }

            match wait_until {
                Some(instant) => sleep_until(instant.into()).await,
                None => {
                    tokio::select! {
                        _ = self.notify.notified() => {}
                        _ = tokio::time::sleep(NOTIFY_POLL_FALLBACK) => {}
                    }
                }
            }
        }
    }

    /// Remove from in-flight, update the host's next-eligible timestamp, and
    /// re-enqueue on retryable transient failure or rate limiting.
    pub async fn complete(&self, ticket: UrlTicket, outcome: CompletionOutcome) {
        let mut inner = self.inner.lock().await;
        inner.in_flight.remove(&ticket.id);

        let jitter_ms = (ticket.id.as_u128() % 250) as u64;
        let host_state = inner.hosts.entry(ticket.host.clone()).or_insert_with(|| HostState::new(self.default_host_min_delay_ms));

        match &outcome {
            CompletionOutcome::Success => {
                host_state.next_eligible = Instant::now() + Duration::from_millis(host_state.min_delay_ms + jitter_ms);
                host_state.recent_failures = 0;
            }
            CompletionOutcome::RateLimited { retry_after_ms } => {
                host_state.min_delay_ms = host_state.min_delay_ms.max(*retry_after_ms);
                host_state.next_eligible = Instant::now() + Duration::from_millis(*retry_after_ms);
                host_state.recent_failures += 1;
            }
            CompletionOutcome::RetryableTransient | CompletionOutcome::Permanent | CompletionOutcome::Cancelled => {
                host_state.next_eligible = Instant::now() + Duration::from_millis(host_state.min_delay_ms + jitter_ms);
                host_state.recent_failures += 1;
            }
        }

        let is_retryable = matches!(outcome, CompletionOutcome::RetryableTransient | CompletionOutcome::RateLimited { .. });
        if is_retryable && ticket.attempt < self.max_attempts {
            let backoff_ms = (host_state.min_delay_ms * 2u64.pow(ticket.attempt)).min(MAX_BACKOFF_MS);
            let decayed_priority = ticket.priority_score * 0.8;
            let order = inner.insertion_counter;
            inner.insertion_counter += 1;
            let retry_ticket = UrlTicket { priority_score: decayed_priority, attempt: ticket.attempt + 1, ..ticket.clone() };
            inner.heap.push(HeapEntry { ticket: retry_ticket, insertion_order: order });
            host_state.next_eligible = Instant::now() + Duration::from_millis(backoff_ms);
            drop(inner);
            warn!(url = %ticket.url, attempt = ticket.attempt, backoff_ms, "retrying after transient failure");
            self.notify.notify_waiters();
            return;
        }

        drop(inner);
        self.notify.notify_waiters();
    }

    /// Refuse new enqueues; in-flight work is left to finish via `complete`.
    pub async fn drain_stop(&self, reason: StopReason) {
        let mut inner = self.inner.lock().await;
        inner.draining = true;
        inner.stop_reason = Some(reason);
        info!(job = %self.job, reason = reason.as_str(), "drain_stop requested");
        drop(inner);
        self.notify.notify_waiters();
    }

    pub async fn stop_reason(&self) -> Option<StopReason> {
        self.inner.lock().await.stop_reason
    }

    pub async fn is_idle(&self) -> bool {
        let inner = self.inner.lock().await;
        inner.heap.is_empty() && inner.in_flight.is_empty()
    }

    pub async fn attempt_count(&self) -> u64 {
        self.inner.lock().await.attempts
    }

    pub async fn dedup_count(&self) -> u64 {
        self.inner.lock().await.deduped
    }

    pub async fn dropped_count(&self) -> u64 {
        self.inner.lock().await.dropped
    }

    pub async fn dequeued_count(&self) -> u64 {
        self.inner.lock().await.dequeued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawlsignal_events::EventBus;

    fn frontier(concurrency: usize, min_delay_ms: u64) -> Arc<Frontier> {
        Frontier::new("job-1", concurrency, min_delay_ms, EventBus::new(64))
    }

    #[tokio::test]
    async fn enqueue_then_dequeue_round_trips_a_ticket() {
        let frontier = frontier(2, 0);
        frontier.enqueue("https://example.com/a", 0, true, PriorityInputs { structural_prior: 0.5, ..Default::default() }, "seed").await.unwrap();
        let ticket = frontier.dequeue().await.expect("expected a ticket");
        assert_eq!(ticket.url, "https://example.com/a");
    }

    #[tokio::test]
    async fn duplicate_url_is_deduped_not_enqueued() {
        let frontier = frontier(2, 0);
        let first = frontier.enqueue("https://example.com/a", 0, true, PriorityInputs::default(), "seed").await.unwrap();
        let second = frontier.enqueue("https://example.com/a", 0, true, PriorityInputs::default(), "link").await.unwrap();
        assert_eq!(first, EnqueueOutcome::Accepted);
        assert_eq!(second, EnqueueOutcome::Dedup);
        assert_eq!(frontier.dedup_count().await, 1);
    }

    #[tokio::test]
    async fn robots_disallowed_is_dropped_not_enqueued() {
        let frontier = frontier(2, 0);
        let outcome = frontier.enqueue("https://example.com/private", 0, false, PriorityInputs::default(), "robots").await.unwrap();
        assert_eq!(outcome, EnqueueOutcome::Dropped);
        assert_eq!(frontier.dropped_count().await, 1);
        assert!(frontier.is_idle().await);
    }

    #[tokio::test]
    async fn higher_priority_dequeues_first() {
        let frontier = frontier(4, 0);
        frontier
            .enqueue("https://a.example.com/low", 0, true, PriorityInputs { structural_prior: 0.1, ..Default::default() }, "seed")
            .await
            .unwrap();
        frontier
            .enqueue("https://b.example.com/high", 0, true, PriorityInputs { structural_prior: 0.9, ..Default::default() }, "seed")
            .await
            .unwrap();
        let first = frontier.dequeue().await.unwrap();
        assert_eq!(first.url, "https://b.example.com/high");
    }

    #[tokio::test]
    async fn ties_break_on_lower_depth_then_insertion_order() {
        let frontier = frontier(4, 0);
        frontier
            .enqueue("https://example.com/deep", 3, true, PriorityInputs { structural_prior: 0.5, ..Default::default() }, "seed")
            .await
            .unwrap();
        frontier
            .enqueue("https://example.com/shallow", 1, true, PriorityInputs { structural_prior: 0.5, ..Default::default() }, "seed")
            .await
            .unwrap();
        let first = frontier.dequeue().await.unwrap();
        assert_eq!(first.url, "https://example.com/shallow");
    }

    #[tokio::test]
    async fn politeness_delay_is_observed_between_same_host_dequeues() {
        let frontier = frontier(4, 200);
        frontier.enqueue("https://example.com/a", 0, true, PriorityInputs::default(), "seed").await.unwrap();
        frontier.enqueue("https://example.com/b", 0, true, PriorityInputs::default(), "seed").await.unwrap();

        let started = Instant::now();
        let first = frontier.dequeue().await.unwrap();
        frontier.complete(first, CompletionOutcome::Success).await;
        let second = frontier.dequeue().await.unwrap();
        assert_eq!(second.url, "https://example.com/b");
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn retryable_transient_is_reenqueued_with_decayed_priority() {
        let frontier = frontier(4, 0);
        frontier
            .enqueue("https://example.com/a", 0, true, PriorityInputs { structural_prior: 0.5, ..Default::default() }, "seed")
            .await
            .unwrap();
        let ticket = frontier.dequeue().await.unwrap();
        let original_score = ticket.priority_score;
        frontier.complete(ticket, CompletionOutcome::RetryableTransient).await;
        let retried = frontier.dequeue().await.expect("expected a retry ticket");
        assert_eq!(retried.attempt, 2);
        assert!(retried.priority_score < original_score);
    }

    #[tokio::test]
    async fn rate_limited_is_reenqueued_honouring_retry_after() {
        let frontier = frontier(4, 0);
        frontier
            .enqueue("https://example.com/a", 0, true, PriorityInputs { structural_prior: 0.5, ..Default::default() }, "seed")
            .await
            .unwrap();
        let ticket = frontier.dequeue().await.unwrap();
        frontier.complete(ticket, CompletionOutcome::RateLimited { retry_after_ms: 50 }).await;
        let retried = frontier.dequeue().await.expect("expected a retry ticket after rate limiting");
        assert_eq!(retried.attempt, 2);
    }

    #[tokio::test]
    async fn exhausted_attempts_are_not_reenqueued() {
        let frontier = frontier(4, 0).with_max_attempts(1);
        frontier.enqueue("https://example.com/a", 0, true, PriorityInputs::default(), "seed").await.unwrap();
        let ticket = frontier.dequeue().await.unwrap();
        frontier.complete(ticket, CompletionOutcome::RetryableTransient).await;
        assert!(frontier.is_idle().await);
    }

    #[tokio::test]
    async fn empty_frontier_dequeue_returns_none_and_sets_stop_reason() {
        let frontier = frontier(2, 0);
        assert!(frontier.dequeue().await.is_none());
        assert_eq!(frontier.stop_reason().await, Some(StopReason::EmptyFrontier));
    }

    #[tokio::test]
    async fn drain_stop_rejects_new_enqueues() {
        let frontier = frontier(2, 0);
        frontier.drain_stop(StopReason::OperatorStop).await;
        let outcome = frontier.enqueue("https://example.com/a", 0, true, PriorityInputs::default(), "seed").await;
        assert!(matches!(outcome, Err(FrontierError::Draining)));
    }

    #[tokio::test]
    async fn enqueue_dequeue_dropped_dedup_conservation_invariant() {
        let frontier = frontier(4, 0);
        frontier.enqueue("https://example.com/a", 0, true, PriorityInputs::default(), "seed").await.unwrap();
        frontier.enqueue("https://example.com/a", 0, true, PriorityInputs::default(), "link").await.unwrap();
        frontier.enqueue("https://example.com/robots-blocked", 0, false, PriorityInputs::default(), "robots").await.unwrap();
        let ticket = frontier.dequeue().await.unwrap();
        frontier.complete(ticket, CompletionOutcome::Success).await;

        let attempts = frontier.attempt_count().await;
        let dequeued = frontier.dequeued_count().await;
        let dropped = frontier.dropped_count().await;
        let deduped = frontier.dedup_count().await;
        assert_eq!(attempts, dequeued + dropped + deduped);
    }
}
