//! Per-URL lifecycle from dequeue to persisted analysis: fetch, classify,
//! extract body, detect places/hubs, index similarity, discover links. Also
//! wires a full running job on top of `crawlsignal-frontier`.

pub mod body;
pub mod classify;
pub mod error;
pub mod fetch;
pub mod job;
pub mod links;
pub mod run;
pub mod scope;
pub mod types;

pub use error::{PipelineError, Result};
pub use job::{spawn_job, JobHandle, JobServices, JobSummary};
pub use run::{run_ticket, Limits, RunOutcome, Services};
pub use types::{
    ClassifySignals, ExtractedBody, FetchOutcome, FetchTimings, Findings, PageKind, PlaceFinding, TopicFindings, Validators,
};
