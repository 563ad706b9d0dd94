use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "crawlsignal", about = "Domain-aware news crawler and analysis pipeline")]
pub struct Cli {
    /// Path to the sqlite/postgres database url override
    #[arg(long)]
    pub db_path: Option<String>,

    /// Directory holding gazetteer NDJSON import files
    #[arg(long)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single crawl job to completion and print a summary
    Crawl {
        /// Seed URL to start from
        seed_url: String,

        /// Worker pool size
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Stop once this many pages have been downloaded
        #[arg(long)]
        max_downloads: Option<u64>,

        /// Maximum link depth from the seed
        #[arg(long)]
        max_depth: Option<u32>,

        /// Stop after this many seconds regardless of frontier state
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// How much detail to print: quiet, normal, verbose
        #[arg(long, default_value = "normal")]
        output_verbosity: String,

        /// How much detail to log from the frontier's own decisions
        #[arg(long, default_value = "normal")]
        planner_verbosity: String,
    },
    /// Run the HTTP daemon serving the job API
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
}
