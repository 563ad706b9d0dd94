use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceKind {
    Country,
    Region,
    City,
    Neighborhood,
    Other,
}

impl PlaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceKind::Country => "country",
            PlaceKind::Region => "region",
            PlaceKind::City => "city",
            PlaceKind::Neighborhood => "neighborhood",
            PlaceKind::Other => "other",
        }
    }
}

/// One gazetteer entity, loaded once at startup and shared read-only for the
/// lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub place_id: String,
    pub name: String,
    pub kind: PlaceKind,
    pub population: u64,
    pub country_code: String,
    #[serde(default)]
    pub slugs: Vec<String>,
}

pub type SharedPlace = Arc<PlaceRecord>;

/// A single place match, either from a URL segment or from windowed text.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceMatch {
    pub place: SharedPlace,
    pub segment_index: Option<usize>,
    pub offset_start: Option<usize>,
    pub offset_end: Option<usize>,
    pub source: MatchSource,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Url,
    Title,
    Text,
    Section,
}

impl MatchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchSource::Url => "url",
            MatchSource::Title => "title",
            MatchSource::Text => "text",
            MatchSource::Section => "section",
        }
    }
}

/// An ordered sequence of place matches where each subsequent match is a
/// hierarchical descendant of the previous.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub places: Vec<SharedPlace>,
    pub cumulative_population: u64,
}

impl Chain {
    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

/// Topic segments: URL path segments that did not resolve to a place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topics {
    pub leading: Vec<String>,
    pub trailing: Vec<String>,
    pub all: Vec<String>,
    pub recognized: Vec<String>,
}

/// Result of `resolve_url_places`. The richer shape is the only API surface —
/// no parallel Vec-returning variant exists.
#[derive(Debug, Clone, Default)]
pub struct UrlPlaceResult {
    pub matches: Vec<PlaceMatch>,
    pub chains: Vec<Chain>,
    pub best_chain: Option<Chain>,
    pub topics: Topics,
}

/// A single detection emitted by text extraction, with byte offsets into the
/// source text.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDetection {
    pub place: SharedPlace,
    pub source: MatchSource,
    pub offset_start: usize,
    pub offset_end: usize,
    pub score: f64,
}

/// Inferred geographic/linguistic context for a fetch, used to bias
/// disambiguation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub host_country: Option<String>,
    pub tld_country: Option<String>,
    pub url_ccs: Vec<String>,
    pub declared_language: Option<String>,
}

/// A topic landing-page hint: emitted alongside a hub candidate when the
/// trailing URL segment is a recognized topic token.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicHint {
    pub slug: String,
    pub label: String,
    pub kind: &'static str,
    pub source: &'static str,
}
