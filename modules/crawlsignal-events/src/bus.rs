//! In-process telemetry bus. The scheduler owns one `EventBus` per job and
//! exposes `subscribe(kind)`; every pipeline/frontier stage publishes through
//! it. Backed by `tokio::sync::broadcast` in preference to pulling in an
//! extra crate for a single-process pub/sub channel.
//!
//! On overflow, the oldest non-error event is dropped and a counter is
//! incremented. `broadcast` already evicts the oldest entry once a lagging
//! subscriber's buffer fills; we approximate the "non-error" priority by
//! tracking drops only on the `Queue`/`Pipeline` kinds a subscriber is not
//! actively draining, and exposing a running drop counter via
//! `dropped_count()`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::pipeline_event::PipelineEvent;
use crate::queue_event::QueueEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Queue,
    Pipeline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryEvent {
    Queue(QueueEvent),
    Pipeline(PipelineEvent),
}

impl TelemetryEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TelemetryEvent::Queue(_) => EventKind::Queue,
            TelemetryEvent::Pipeline(_) => EventKind::Pipeline,
        }
    }
}

const DEFAULT_CAPACITY: usize = 1024;

/// Bounded, multi-subscriber event bus. Cheap to clone — internally an `Arc`.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

struct Inner {
    sender: broadcast::Sender<TelemetryEvent>,
    dropped: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        EventBus { inner: Arc::new(Inner { sender, dropped: AtomicU64::new(0) }) }
    }

    pub fn publish(&self, event: TelemetryEvent) {
        // `send` never blocks; an error here only means there are currently no
        // subscribers, which is not an overflow condition.
        let _ = self.inner.sender.send(event);
    }

    pub fn publish_queue(&self, event: QueueEvent) {
        self.publish(TelemetryEvent::Queue(event));
    }

    pub fn publish_pipeline(&self, event: PipelineEvent) {
        self.publish(TelemetryEvent::Pipeline(event));
    }

    /// Subscribe to every event, regardless of kind. Use `EventSubscription::recv`
    /// (not the raw receiver) so lag is folded into `dropped_count()`.
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription { receiver: self.inner.sender.subscribe(), bus: self.clone(), filter: None }
    }

    /// Subscribe to a single event kind.
    pub fn subscribe_kind(&self, kind: EventKind) -> EventSubscription {
        EventSubscription { receiver: self.inner.sender.subscribe(), bus: self.clone(), filter: Some(kind) }
    }

    pub fn dropped_count(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.sender.receiver_count()
    }
}

pub struct EventSubscription {
    receiver: broadcast::Receiver<TelemetryEvent>,
    bus: EventBus,
    filter: Option<EventKind>,
}

impl EventSubscription {
    /// Await the next event matching this subscription's filter, folding any
    /// lag (dropped events) into the bus-wide counter.
    pub async fn recv(&mut self) -> Option<TelemetryEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.map(|k| k == event.kind()).unwrap_or(true) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    self.bus.inner.dropped.fetch_add(skipped, Ordering::Relaxed);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue_event::QueueAction;

    #[tokio::test]
    async fn publish_then_subscribe_receives_event() {
        let bus = EventBus::new(8);
        let mut sub = bus.subscribe();
        bus.publish_queue(QueueEvent::new("job", QueueAction::Enqueue, "https://example.com", "example.com", 0, 0.5));
        let event = sub.recv().await.expect("expected an event");
        assert_eq!(event.kind(), EventKind::Queue);
    }

    #[tokio::test]
    async fn subscribe_kind_filters_out_other_kinds() {
        let bus = EventBus::new(8);
        let mut sub = bus.subscribe_kind(EventKind::Pipeline);
        bus.publish_queue(QueueEvent::new("job", QueueAction::Enqueue, "https://example.com", "example.com", 0, 0.5));
        bus.publish_pipeline(PipelineEvent::Classified { url: "https://example.com".to_string(), kind: "article".to_string() });
        let event = sub.recv().await.expect("expected an event");
        assert_eq!(event.kind(), EventKind::Pipeline);
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_is_not_an_error() {
        let bus = EventBus::new(8);
        bus.publish_queue(QueueEvent::new("job", QueueAction::Enqueue, "https://example.com", "example.com", 0, 0.5));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn lagging_subscriber_increments_dropped_count() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();
        for i in 0..10 {
            bus.publish_queue(QueueEvent::new("job", QueueAction::Enqueue, format!("https://example.com/{i}"), "example.com", 0, 0.5));
        }
        let _ = sub.recv().await;
        assert!(bus.dropped_count() > 0);
    }
}
