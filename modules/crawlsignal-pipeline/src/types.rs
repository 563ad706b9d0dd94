use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Article,
    Nav,
    Minimal,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::Article => "article",
            PageKind::Nav => "nav",
            PageKind::Minimal => "minimal",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchTimings {
    pub dns_ms: Option<i32>,
    pub tcp_ms: Option<i32>,
    pub ttfb_ms: Option<i32>,
    pub download_ms: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub charset: Option<String>,
    pub truncated: bool,
    pub timings: FetchTimings,
    pub not_modified: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ClassifySignals {
    pub nav_link_count: usize,
    pub article_link_count: usize,
    pub word_count: usize,
    pub has_article_signal: bool,
}

#[derive(Debug, Clone)]
pub struct ExtractedBody {
    pub text: String,
    pub title: Option<String>,
    pub section: Option<String>,
    pub method: &'static str,
    pub xpath: Option<String>,
}

/// Conditional-GET validators remembered per url, read back on the next fetch.
#[derive(Debug, Clone, Default)]
pub struct Validators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// One resolved place, carried into the `Analysis.findings` JSON blob. Built
/// from either a `PlaceMatch` (URL segments) or a `PlaceDetection` (title/body
/// text) — the tagged-variant shape spec §9 calls for instead of an opaque
/// dynamic object.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceFinding {
    pub place_id: String,
    pub name: String,
    pub kind: &'static str,
    pub country_code: String,
    pub source: &'static str,
    pub offset_start: Option<usize>,
    pub offset_end: Option<usize>,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TopicFindings {
    pub leading: Vec<String>,
    pub trailing: Vec<String>,
    pub all: Vec<String>,
    pub recognized: Vec<String>,
}

/// The full `places`/`topics` findings payload persisted alongside an
/// `Analysis` row.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Findings {
    pub places: Vec<PlaceFinding>,
    pub best_chain: Vec<String>,
    pub topics: TopicFindings,
}
