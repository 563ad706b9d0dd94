mod cli;

use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crawlsignal_common::CrawlConfig;
use crawlsignal_daemon::{router, AppState};
use crawlsignal_events::EventBus;
use crawlsignal_gazetteer::Gazetteer;
use crawlsignal_pipeline::{spawn_job, JobServices};
use crawlsignal_similarity::LshIndex;
use crawlsignal_store::Store;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

use cli::{Cli, Commands};

const EVENT_BUS_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> ExitCode {
    crawlsignal_common::init_tracing();
    let cli = Cli::parse();

    let mut config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "configuration error");
            return ExitCode::from(2);
        }
    };

    let outcome = match cli.command {
        Commands::Crawl { seed_url, concurrency, max_downloads, max_depth, deadline_secs, output_verbosity, planner_verbosity } => {
            if let Some(c) = concurrency {
                config.concurrency = c;
            }
            if max_downloads.is_some() {
                config.max_downloads = max_downloads;
            }
            if max_depth.is_some() {
                config.max_depth = max_depth;
            }
            if let Some(secs) = deadline_secs {
                config.deadline = Some(std::time::Duration::from_secs(secs));
            }
            info!(output_verbosity, planner_verbosity, "starting crawl");
            run_crawl(seed_url, config, cli.data_dir.as_deref()).await
        }
        Commands::Serve { bind } => run_serve(config, bind, cli.data_dir.as_deref()).await,
    };

    match outcome {
        Ok(()) => ExitCode::from(0),
        Err(err) => {
            error!(error = %err, "run failed");
            ExitCode::from(1)
        }
    }
}

fn load_config(cli: &Cli) -> Result<CrawlConfig> {
    let mut config = CrawlConfig::from_env();
    if let Some(db_path) = &cli.db_path {
        config.database_url = db_path.clone();
    }
    config.log_redacted();
    Ok(config)
}

async fn build_services(config: &CrawlConfig, data_dir: Option<&str>) -> Result<Arc<JobServices>> {
    let pool = PgPoolOptions::new()
        .max_connections(config.concurrency.max(4) as u32)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    let store = Store::new(pool);
    store.migrate().await.context("failed to run migrations")?;

    let gazetteer = Arc::new(load_gazetteer(data_dir)?);
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent("crawlsignal")
        .build()
        .context("failed to build http client")?;

    Ok(Arc::new(JobServices {
        client,
        store,
        gazetteer,
        domain_locales: Arc::new(HashMap::new()),
        lsh: Arc::new(LshIndex::new()),
        events: EventBus::new(EVENT_BUS_CAPACITY),
    }))
}

fn load_gazetteer(data_dir: Option<&str>) -> Result<Gazetteer> {
    let Some(dir) = data_dir else { return Ok(Gazetteer::default()) };

    let read = |name: &str| -> Result<String> {
        let path = format!("{dir}/{name}.ndjson");
        std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))
    };

    crawlsignal_gazetteer::import(crawlsignal_gazetteer::GazetteerImport {
        places: &read("places")?,
        place_names: &read("place_names")?,
        place_hierarchy: &read("place_hierarchy")?,
        place_attributes: &read("place_attributes")?,
        place_external_ids: &read("place_external_ids")?,
        place_hubs: &read("place_hubs")?,
        place_provenance: &read("place_provenance")?,
    })
    .context("failed to import gazetteer ndjson")
}

async fn run_crawl(seed_url: String, config: CrawlConfig, data_dir: Option<&str>) -> Result<()> {
    let services = build_services(&config, data_dir).await?;
    let job_id = uuid::Uuid::new_v4().to_string();
    let (_handle, join) = spawn_job(job_id.clone(), seed_url, config, services);
    let summary = join.await.context("crawl job panicked")?;

    println!("job {} finished: {}", summary.job, summary.stop_reason);
    println!(
        "downloads={} attempts={} dequeued={} dropped={} deduped={}",
        summary.downloads, summary.attempts, summary.dequeued, summary.dropped, summary.deduped
    );

    if summary.stop_reason == "operator_stop" {
        anyhow::bail!("crawl stopped by operator");
    }
    Ok(())
}

async fn run_serve(config: CrawlConfig, bind: Option<String>, data_dir: Option<&str>) -> Result<()> {
    let services = build_services(&config, data_dir).await?;
    let state = Arc::new(AppState::new(services, config.clone()));
    let app = router(state);

    let addr = bind.unwrap_or_else(|| config.daemon_bind_addr());
    info!(addr = %addr, "crawlsignal daemon starting");
    let listener = tokio::net::TcpListener::bind(&addr).await.context("failed to bind daemon address")?;
    axum::serve(listener, app).await.context("daemon server exited")
}
