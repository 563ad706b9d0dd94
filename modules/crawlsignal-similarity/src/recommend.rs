//! Hybrid content/tag/trending recommendation scoring.
//!
//! `score = weights.content * content + weights.tag * tag + weights.trending * trending`.
//! Diversification caps any single host at 2 results; cold start (no
//! similarity history for the target) falls back to category trending.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub content: f64,
    pub tag: f64,
    pub trending: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights { content: 0.5, tag: 0.3, trending: 0.2 }
    }
}

/// Candidate metadata needed for scoring, gathered by the caller from the
/// persistence layer. `trending_score` is a pre-normalized recency-weighted
/// view count within the candidate's category.
#[derive(Debug, Clone)]
pub struct Candidate<Id> {
    pub content_id: Id,
    pub host: String,
    pub category: String,
    pub keywords: HashSet<String>,
    pub trending_score: f64,
    /// Present only when a similarity fingerprint exists for this candidate
    /// against the target; `None` drives the cold-start path.
    pub similarity: Option<SimilarityInputs>,
}

#[derive(Debug, Clone, Copy)]
pub struct SimilarityInputs {
    pub hamming_distance: u32,
    pub jaccard: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation<Id> {
    pub content_id: Id,
    pub score: f64,
    pub strategy: &'static str,
}

/// `content` component: combined Jaccard/SimHash score, only when the
/// SimHash Hamming distance is within 5 bits; otherwise zero contribution.
pub fn content_score(inputs: &SimilarityInputs) -> f64 {
    if inputs.hamming_distance > 5 {
        return 0.0;
    }
    0.7 * inputs.jaccard + 0.3 * (1.0 - inputs.hamming_distance as f64 / 64.0)
}

/// `tag` component: Jaccard of keyword sets, +0.3 if same category, capped at 1.0.
pub fn tag_score(target_keywords: &HashSet<String>, candidate_keywords: &HashSet<String>, same_category: bool) -> f64 {
    let intersection = target_keywords.intersection(candidate_keywords).count();
    let union = target_keywords.union(candidate_keywords).count();
    let jaccard = if union == 0 { 0.0 } else { intersection as f64 / union as f64 };
    let bonus = if same_category { 0.3 } else { 0.0 };
    (jaccard + bonus).min(1.0)
}

pub fn hybrid_score(content: f64, tag: f64, trending: f64, weights: Weights) -> f64 {
    weights.content * content + weights.tag * tag + weights.trending * trending
}

/// Recommend up to `top_n` items related to `target_category`/`target_keywords`,
/// diversified to at most 2 results per host. Falls back to trending-only
/// ranking within the category when no candidate carries similarity data.
pub fn recommend<Id: Clone + Eq>(
    target_keywords: &HashSet<String>,
    target_category: &str,
    candidates: &[Candidate<Id>],
    weights: Weights,
    top_n: usize,
) -> Vec<Recommendation<Id>> {
    let has_similarity_history = candidates.iter().any(|c| c.similarity.is_some());

    let mut scored: Vec<Recommendation<Id>> = if has_similarity_history {
        candidates
            .iter()
            .filter_map(|c| {
                let sim = c.similarity.as_ref()?;
                let content = content_score(sim);
                let tag = tag_score(target_keywords, &c.keywords, c.category == target_category);
                let score = hybrid_score(content, tag, c.trending_score, weights);
                Some(Recommendation { content_id: c.content_id.clone(), score, strategy: "hybrid" })
            })
            .collect()
    } else {
        candidates
            .iter()
            .filter(|c| c.category == target_category)
            .map(|c| Recommendation {
                content_id: c.content_id.clone(),
                score: c.trending_score,
                strategy: "coldstart-trending",
            })
            .collect()
    };

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    // Diversify: cap at 2 per host, by walking scored order and checking each
    // candidate's host against a running count.
    let mut host_of: std::collections::HashMap<&Id, &str> = std::collections::HashMap::new();
    for c in candidates {
        host_of.insert(&c.content_id, c.host.as_str());
    }

    let mut per_host_count: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut diversified = Vec::with_capacity(top_n);
    for rec in scored {
        let host = host_of.get(&rec.content_id).copied().unwrap_or("").to_string();
        let count = per_host_count.entry(host).or_insert(0);
        if *count >= 2 {
            continue;
        }
        *count += 1;
        diversified.push(rec);
        if diversified.len() >= top_n {
            break;
        }
    }
    diversified
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn content_score_zero_beyond_distance_five() {
        let inputs = SimilarityInputs { hamming_distance: 6, jaccard: 0.9 };
        assert_eq!(content_score(&inputs), 0.0);
    }

    #[test]
    fn tag_score_capped_at_one() {
        let a = kw(&["sport", "iceland", "win"]);
        let b = kw(&["sport", "iceland", "win"]);
        assert_eq!(tag_score(&a, &b, true), 1.0);
    }

    #[test]
    fn cold_start_falls_back_to_category_trending() {
        let candidates = vec![
            Candidate {
                content_id: 1,
                host: "a.example.com".to_string(),
                category: "sport".to_string(),
                keywords: kw(&["sport"]),
                trending_score: 0.9,
                similarity: None,
            },
            Candidate {
                content_id: 2,
                host: "b.example.com".to_string(),
                category: "business".to_string(),
                keywords: kw(&["business"]),
                trending_score: 0.95,
                similarity: None,
            },
        ];
        let recs = recommend(&kw(&["sport"]), "sport", &candidates, Weights::default(), 5);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].content_id, 1);
        assert_eq!(recs[0].strategy, "coldstart-trending");
    }

    #[test]
    fn diversification_caps_two_per_host() {
        let mut candidates = Vec::new();
        for i in 0..5 {
            candidates.push(Candidate {
                content_id: i,
                host: "same-host.example.com".to_string(),
                category: "sport".to_string(),
                keywords: kw(&["sport"]),
                trending_score: 0.0,
                similarity: Some(SimilarityInputs { hamming_distance: 1, jaccard: 0.8 }),
            });
        }
        let recs = recommend(&kw(&["sport"]), "sport", &candidates, Weights::default(), 10);
        assert_eq!(recs.len(), 2);
    }
}
