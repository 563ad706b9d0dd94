//! HTTP daemon exposing the crawl job lifecycle: start a job from a seed URL,
//! list and inspect runs, request an early stop. Single job at a time, with
//! a bounded history of completed runs.

pub mod registry;
pub mod routes;
pub mod state;

pub use registry::{JobRegistry, JobStatus, JobView, StartError};
pub use routes::router;
pub use state::AppState;
