//! Orchestrates the eight fetch/classify/analyse stages for one `UrlTicket`,
//! composing the gazetteer, similarity index, and HTTP client with the
//! persistence adapters. Each stage publishes a `PipelineEvent`; independent
//! stages keep running even when an earlier, unrelated one is skipped (a
//! write failure in `crawlsignal-store` is already absorbed at the adapter
//! layer, so this orchestrator only needs to guard stages whose *inputs*
//! genuinely depend on a prior stage's success).

use std::time::Instant;

use crawlsignal_events::{EventBus, PipelineEvent, PipelineStage};
use crawlsignal_frontier::UrlTicket;
use crawlsignal_gazetteer::{
    extract_places_from_text, infer_context, resolve_url_places, DomainLocales, Gazetteer, MatchSource, PlaceDetection, PlaceMatch,
};
use crawlsignal_gazetteer::{detect_hub, HubCandidate};
use crawlsignal_similarity::{Fingerprint, LshIndex, MinHash, SimHash};
use crawlsignal_store::{NewFetchAttempt, NewHubCandidate, NewPlaceDetection, Store};
use reqwest::Client;
use tracing::warn;
use uuid::Uuid;

use crate::body::extract_body;
use crate::classify::{classify, dom_signals};
use crate::error::Result;
use crate::fetch::fetch;
use crate::links::discover_links;
use crate::types::{Findings, PageKind, PlaceFinding, TopicFindings, Validators};

/// Confidence threshold both for reading a persisted xpath pattern back
/// (`patterns_by_domain`) and for seeding one just learned, so a pattern
/// learned this run is immediately eligible for reuse on the next fetch.
const XPATH_PATTERN_CONFIDENCE: f64 = 0.6;

pub struct Limits {
    pub max_body_bytes: usize,
    pub min_article_words: usize,
    pub min_nav_article_links: usize,
    pub min_xpath_text: usize,
    pub min_word_count_for_fingerprint: usize,
    pub cross_domain: bool,
}

pub struct Services<'a> {
    pub client: &'a Client,
    pub store: &'a Store,
    pub gazetteer: &'a Gazetteer,
    pub domain_locales: &'a DomainLocales,
    pub lsh: &'a LshIndex<Uuid>,
    pub events: &'a EventBus,
    pub limits: Limits,
}

#[derive(Debug, Default)]
pub struct RunOutcome {
    pub kind: Option<PageKind>,
    pub discovered_links: Vec<String>,
    pub hub: Option<HubCandidate>,
    pub near_duplicates: Vec<(Uuid, u32)>,
    pub not_modified: bool,
    /// Final HTTP status, so the job driver can apply the retry taxonomy in
    /// spec §7 (5xx/429 transient, 4xx non-429 permanent) without re-parsing
    /// the response itself.
    pub status: u16,
    /// `Retry-After`, seconds converted to milliseconds, present only on 429.
    pub retry_after_ms: Option<u64>,
}

pub async fn run_ticket(ticket: &UrlTicket, services: &Services<'_>) -> Result<RunOutcome> {
    let mut outcome = RunOutcome::default();

    // 1. HTTP fetch. Conditional-GET validators are whatever the prior fetch
    // attempt for this url returned, if any.
    emit_started(services.events, &ticket.url, PipelineStage::Fetch);
    let started = Instant::now();
    let validators = load_validators(services.store, &ticket.url).await;
    let fetched = fetch(services.client, &ticket.url, validators.as_ref(), services.limits.max_body_bytes).await?;
    emit_completed(services.events, &ticket.url, PipelineStage::Fetch, started);
    outcome.status = fetched.status;
    if fetched.status == 429 {
        outcome.retry_after_ms = fetched
            .headers
            .get("retry-after")
            .and_then(|v| v.parse::<u64>().ok())
            .map(|secs| secs * 1000);
    }

    if fetched.not_modified {
        outcome.not_modified = true;
        return Ok(outcome);
    }

    // 2. Persist FetchAttempt (+ ContentBlob on 2xx with a body).
    let host = ticket.host.clone();
    let url_id = services.store.urls.ensure(&ticket.url, &host, ticket.depth as i32).await?;

    let classification_label = if fetched.status >= 200 && fetched.status < 300 { "pending" } else { "error" };
    let attempt = NewFetchAttempt {
        status: fetched.status as i32,
        dns_ms: fetched.timings.dns_ms,
        tcp_ms: fetched.timings.tcp_ms,
        ttfb_ms: fetched.timings.ttfb_ms,
        download_ms: fetched.timings.download_ms,
        byte_count: fetched.body.len() as i64,
        content_type: fetched.content_type.clone(),
        headers: serde_json::to_value(&fetched.headers).ok(),
        classification: classification_label.to_string(),
        truncated: fetched.truncated,
        error_reason: None,
    };
    let fetch_attempt_id = services.store.fetches.append(url_id, attempt).await;

    if !(200..300).contains(&fetched.status) {
        return Ok(outcome);
    }

    let Some(fetch_attempt_id) = fetch_attempt_id else {
        return Ok(outcome);
    };

    let html = String::from_utf8_lossy(&fetched.body).into_owned();
    let content_hash = format!("{:016x}", crawlsignal_common::fnv1a_64(&fetched.body));
    let content_id = services
        .store
        .content
        .put(fetch_attempt_id, &fetched.body, fetched.content_type.as_deref(), fetched.charset.as_deref(), &content_hash)
        .await?;

    // 3. Classify.
    emit_started(services.events, &ticket.url, PipelineStage::Classify);
    let signals = dom_signals(&html);
    let kind = classify(&signals, services.limits.min_article_words, services.limits.min_nav_article_links);
    outcome.kind = Some(kind);
    services.events.publish_pipeline(PipelineEvent::Classified { url: ticket.url.clone(), kind: kind.as_str().to_string() });

    // 4. Body extraction (article only).
    let body_text = if kind == PageKind::Article {
        emit_started(services.events, &ticket.url, PipelineStage::BodyExtraction);
        let persisted_xpath = services
            .store
            .planner
            .patterns_by_domain(&host, XPATH_PATTERN_CONFIDENCE)
            .await
            .ok()
            .and_then(|rows| rows.into_iter().find(|r| r.pattern_kind == "article_body"))
            .map(|r| r.xpath);

        let extracted = extract_body(&html, &ticket.url, persisted_xpath.as_deref(), services.limits.min_xpath_text);
        services.events.publish_pipeline(PipelineEvent::BodyExtracted {
            url: ticket.url.clone(),
            method: extracted.method.to_string(),
            word_count: extracted.text.split_whitespace().count(),
        });

        if extracted.method == "xpath-learned+heuristics@v1" {
            if let Some(xpath) = &extracted.xpath {
                if let Err(err) = services
                    .store
                    .planner
                    .record_pattern(&host, "article_body", xpath, XPATH_PATTERN_CONFIDENCE)
                    .await
                {
                    warn!(%host, error = %err, "failed to persist learned article-body xpath");
                }
            }
        }

        Some(extracted)
    } else {
        None
    };

    let word_count = body_text.as_ref().map(|b| b.text.split_whitespace().count()).unwrap_or(signals.word_count);

    // 5. Analysis: place/topic extraction.
    emit_started(services.events, &ticket.url, PipelineStage::Analysis);
    let parsed = url::Url::parse(&ticket.url).ok();
    let segments: Vec<String> = parsed
        .as_ref()
        .map(|u| u.path_segments().map(|s| s.map(String::from).collect()).unwrap_or_default())
        .unwrap_or_default();
    let context = infer_context(&host, &segments, services.domain_locales);

    let section = body_text.as_ref().and_then(|b| b.section.clone());
    let url_places = parsed.as_ref().map(|u| resolve_url_places(u.path(), services.gazetteer, &context));
    let mut text_detections = body_text
        .as_ref()
        .map(|b| extract_places_from_text(&b.text, MatchSource::Text, services.gazetteer, &context, section.as_deref()))
        .unwrap_or_default();
    if let Some(title) = body_text.as_ref().and_then(|b| b.title.as_deref()) {
        text_detections.extend(extract_places_from_text(title, MatchSource::Title, services.gazetteer, &context, section.as_deref()));
    }

    let mut findings = Findings::default();
    if let Some(places) = &url_places {
        findings.places.extend(places.matches.iter().map(place_finding_from_match));
        if let Some(chain) = &places.best_chain {
            findings.best_chain = chain.places.iter().map(|p| p.name.clone()).collect();
        }
        findings.topics = TopicFindings {
            leading: places.topics.leading.clone(),
            trailing: places.topics.trailing.clone(),
            all: places.topics.all.clone(),
            recognized: places.topics.recognized.clone(),
        };
    }
    findings.places.extend(text_detections.iter().map(place_finding_from_detection));

    let analysis_id = services
        .store
        .analysis
        .put(
            content_id,
            1,
            kind.as_str(),
            body_text.as_ref().and_then(|b| b.title.clone()).as_deref(),
            section.as_deref(),
            word_count as i32,
            body_text.as_ref().and_then(|b| b.xpath.clone()).as_deref(),
            serde_json::to_value(&findings).unwrap_or_default(),
        )
        .await?;

    let new_detections: Vec<NewPlaceDetection> = findings
        .places
        .iter()
        .map(|f| NewPlaceDetection {
            place_id: f.place_id.clone(),
            place_kind: f.kind.to_string(),
            method: "gazetteer+heuristics@v1".to_string(),
            source: f.source.to_string(),
            offset_start: f.offset_start.map(|o| o as i32),
            offset_end: f.offset_end.map(|o| o as i32),
            country_code: Some(f.country_code.clone()),
        })
        .collect();
    if let Err(err) = services.store.analysis.put_detections(analysis_id, &new_detections).await {
        warn!(url = %ticket.url, error = %err, "failed to persist place detections");
    }

    // 6. Hub detection.
    if let Some(ref places) = url_places {
        let link_dense = kind == PageKind::Nav || signals.article_link_count >= services.limits.min_nav_article_links;
        if let Some(hub) = detect_hub(places, link_dense, services.gazetteer, section.as_deref()) {
            services.events.publish_pipeline(PipelineEvent::HubDetected { url: ticket.url.clone(), place_slug: hub.place_slug.clone() });
            let new_hub = NewHubCandidate {
                place_slug: hub.place_slug.clone(),
                place_kind: hub.place_kind.to_string(),
                topic_slug: hub.topic.as_ref().map(|t| t.slug.clone()),
                topic_kind: hub.topic.as_ref().map(|t| t.kind.to_string()),
                topic_source: hub.topic.as_ref().map(|t| t.source.to_string()),
            };
            if let Err(err) = services.store.urls.record_hub_candidate(url_id, &new_hub).await {
                warn!(url = %ticket.url, error = %err, "failed to persist hub candidate");
            }
            outcome.hub = Some(hub);
        }
    }

    // 7. Similarity indexing.
    if let Some(ref body) = body_text {
        if word_count >= services.limits.min_word_count_for_fingerprint {
            emit_started(services.events, &ticket.url, PipelineStage::SimilarityIndexing);
            let simhash = SimHash::compute(&body.text);
            let minhash = MinHash::compute(&body.text);

            services
                .store
                .similarity
                .save_fingerprint(
                    content_id,
                    &simhash.to_le_bytes(),
                    minhash.as_ref().map(|m| m.to_le_bytes()).as_deref(),
                    word_count as i32,
                )
                .await?;

            let fingerprint = Fingerprint { simhash, minhash, word_count };
            let near = services.lsh.query(&fingerprint);
            for m in &near {
                if m.distance <= 3 {
                    services.events.publish_pipeline(PipelineEvent::NearDuplicateFound {
                        content_id: content_id.to_string(),
                        duplicate_of: m.content_id.to_string(),
                        distance: m.distance,
                    });
                    outcome.near_duplicates.push((m.content_id, m.distance));
                }
            }
            services.lsh.insert(content_id, fingerprint);
        }
    }

    // 8. Link discovery.
    if matches!(kind, PageKind::Nav | PageKind::Article) {
        emit_started(services.events, &ticket.url, PipelineStage::LinkDiscovery);
        let links = discover_links(&html, &ticket.url, services.limits.cross_domain);
        services.events.publish_pipeline(PipelineEvent::LinksDiscovered { url: ticket.url.clone(), count: links.len() });
        outcome.discovered_links = links;
    }

    Ok(outcome)
}

fn place_finding_from_match(m: &PlaceMatch) -> PlaceFinding {
    PlaceFinding {
        place_id: m.place.place_id.clone(),
        name: m.place.name.clone(),
        kind: m.place.kind.as_str(),
        country_code: m.place.country_code.clone(),
        source: m.source.as_str(),
        offset_start: m.offset_start,
        offset_end: m.offset_end,
        score: m.score,
    }
}

fn place_finding_from_detection(d: &PlaceDetection) -> PlaceFinding {
    PlaceFinding {
        place_id: d.place.place_id.clone(),
        name: d.place.name.clone(),
        kind: d.place.kind.as_str(),
        country_code: d.place.country_code.clone(),
        source: d.source.as_str(),
        offset_start: Some(d.offset_start),
        offset_end: Some(d.offset_end),
        score: d.score,
    }
}

/// Reads the etag/last-modified validators off the most recent fetch attempt
/// for this url, if one was ever recorded. A lookup failure or a url never
/// seen before is indistinguishable from "no validators" here: either way the
/// fetch just proceeds unconditionally.
async fn load_validators(store: &Store, url: &str) -> Option<Validators> {
    let url_row = store.urls.by_url(url).await.ok().flatten()?;
    let attempt = store.fetches.latest_by_url(url_row.id).await.ok().flatten()?;
    let headers = attempt.headers?;
    let etag = headers.get("etag").and_then(|v| v.as_str()).map(str::to_string);
    let last_modified = headers.get("last-modified").and_then(|v| v.as_str()).map(str::to_string);
    if etag.is_none() && last_modified.is_none() {
        return None;
    }
    Some(Validators { etag, last_modified })
}

fn emit_started(events: &EventBus, url: &str, stage: PipelineStage) {
    events.publish_pipeline(PipelineEvent::StageStarted { url: url.to_string(), stage });
}

fn emit_completed(events: &EventBus, url: &str, stage: PipelineStage, started: Instant) {
    events.publish_pipeline(PipelineEvent::StageCompleted {
        url: url.to_string(),
        stage,
        duration_ms: started.elapsed().as_millis() as u64,
    });
}

pub fn emit_stage_failed(events: &EventBus, url: &str, stage: PipelineStage, reason: impl Into<String>) {
    let reason = reason.into();
    warn!(%url, stage = ?stage, %reason, "pipeline stage failed");
    events.publish_pipeline(PipelineEvent::StageFailed { url: url.to_string(), stage, reason });
}
