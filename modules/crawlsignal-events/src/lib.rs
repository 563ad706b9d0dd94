pub mod bus;
pub mod pipeline_event;
pub mod queue_event;

pub use bus::{EventBus, EventKind, EventSubscription, TelemetryEvent};
pub use pipeline_event::{PipelineEvent, PipelineStage};
pub use queue_event::{QueueAction, QueueEvent};
