use tracing_subscriber::{EnvFilter, fmt};

/// Install a process-wide `tracing` subscriber. Called once at process start
/// by the CLI and daemon entry points; library crates never install their own
/// subscriber and never patch a global console — they only emit spans/events
/// against whatever subscriber the binary installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();
}
