use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue};
use crawlsignal_common::CrawlConfig;
use crawlsignal_daemon::{router, AppState};
use crawlsignal_events::EventBus;
use crawlsignal_gazetteer::{Gazetteer, GazetteerImport};
use crawlsignal_pipeline::JobServices;
use crawlsignal_similarity::LshIndex;
use crawlsignal_store::Store;
use sqlx::postgres::PgPoolOptions;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const EVENT_BUS_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> Result<()> {
    crawlsignal_common::init_tracing();

    let config = CrawlConfig::from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new()
        .max_connections(config.concurrency.max(4) as u32)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    let store = Store::new(pool);
    store.migrate().await.context("failed to run migrations")?;

    let gazetteer = Arc::new(load_gazetteer()?);
    info!(places = gazetteer.place_count(), "gazetteer loaded");

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent("crawlsignal")
        .build()
        .context("failed to build http client")?;

    let services = Arc::new(JobServices {
        client,
        store,
        gazetteer,
        domain_locales: Arc::new(HashMap::new()),
        lsh: Arc::new(LshIndex::new()),
        events: EventBus::new(EVENT_BUS_CAPACITY),
    });

    let state = Arc::new(AppState::new(services, config.clone()));
    let app = router(state).layer(
        SetResponseHeaderLayer::overriding(
            header::HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        )
    ).layer(
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!("http_request", method = %request.method(), path = %request.uri().path())
        }),
    );

    let addr = config.daemon_bind_addr();
    info!(addr = %addr, "crawlsignal daemon starting");
    let listener = tokio::net::TcpListener::bind(&addr).await.context("failed to bind daemon address")?;
    axum::serve(listener, app).await.context("daemon server exited")?;

    Ok(())
}

/// Loads the gazetteer from NDJSON files under `CRAWL_GAZETTEER_DIR` if set,
/// otherwise starts with an empty one (place/topic extraction becomes a
/// no-op, but fetch/classify/similarity still run).
fn load_gazetteer() -> Result<Gazetteer> {
    let Ok(dir) = std::env::var("CRAWL_GAZETTEER_DIR") else {
        warn!("CRAWL_GAZETTEER_DIR not set, starting with an empty gazetteer");
        return Ok(Gazetteer::default());
    };

    let read = |name: &str| -> Result<String> {
        let path = format!("{dir}/{name}.ndjson");
        std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))
    };

    let places = read("places")?;
    let place_names = read("place_names")?;
    let place_hierarchy = read("place_hierarchy")?;
    let place_attributes = read("place_attributes")?;
    let place_external_ids = read("place_external_ids")?;
    let place_hubs = read("place_hubs")?;
    let place_provenance = read("place_provenance")?;

    crawlsignal_gazetteer::import(GazetteerImport {
        places: &places,
        place_names: &place_names,
        place_hierarchy: &place_hierarchy,
        place_attributes: &place_attributes,
        place_external_ids: &place_external_ids,
        place_hubs: &place_hubs,
        place_provenance: &place_provenance,
    })
    .context("failed to import gazetteer ndjson")
}
