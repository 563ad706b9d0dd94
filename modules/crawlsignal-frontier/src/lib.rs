pub mod error;
mod frontier;
pub mod priority;
pub mod types;

pub use error::{FrontierError, Result};
pub use frontier::Frontier;
pub use priority::{compute_priority_score, PriorityInputs};
pub use types::{CompletionOutcome, EnqueueOutcome, StopReason, UrlTicket};
