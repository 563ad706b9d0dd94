//! `PipelineEvent`: per-stage telemetry emitted by the fetch/classify
//! pipeline, following a tagged-enum + `variant_name()` idiom for pipeline
//! bookkeeping events.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Fetch,
    Persist,
    Classify,
    BodyExtraction,
    Analysis,
    HubDetection,
    SimilarityIndexing,
    LinkDiscovery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    StageStarted {
        url: String,
        stage: PipelineStage,
    },
    StageCompleted {
        url: String,
        stage: PipelineStage,
        duration_ms: u64,
    },
    StageFailed {
        url: String,
        stage: PipelineStage,
        reason: String,
    },
    Classified {
        url: String,
        kind: String,
    },
    BodyExtracted {
        url: String,
        method: String,
        word_count: usize,
    },
    HubDetected {
        url: String,
        place_slug: String,
    },
    NearDuplicateFound {
        content_id: String,
        duplicate_of: String,
        distance: u32,
    },
    LinksDiscovered {
        url: String,
        count: usize,
    },
}

impl PipelineEvent {
    pub fn variant_name(&self) -> &'static str {
        match self {
            PipelineEvent::StageStarted { .. } => "stage_started",
            PipelineEvent::StageCompleted { .. } => "stage_completed",
            PipelineEvent::StageFailed { .. } => "stage_failed",
            PipelineEvent::Classified { .. } => "classified",
            PipelineEvent::BodyExtracted { .. } => "body_extracted",
            PipelineEvent::HubDetected { .. } => "hub_detected",
            PipelineEvent::NearDuplicateFound { .. } => "near_duplicate_found",
            PipelineEvent::LinksDiscovered { .. } => "links_discovered",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_name_matches_stage_failed() {
        let event = PipelineEvent::StageFailed {
            url: "https://example.com".to_string(),
            stage: PipelineStage::Fetch,
            reason: "timeout".to_string(),
        };
        assert_eq!(event.variant_name(), "stage_failed");
    }
}
