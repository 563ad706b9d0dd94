//! `extract_places_from_text`: sliding-window gazetteer matching over
//! tokenized text, with context-biased disambiguation.

use crate::gazetteer::Gazetteer;
use crate::normalize::normalize;
use crate::types::{Context, MatchSource, PlaceDetection, SharedPlace};

const MAX_WINDOW: usize = 4;

struct Token {
    text: String,
    start: usize,
    end: usize,
}

/// Unicode word runs (alphanumeric spans), preserving byte offsets into the
/// source text.
fn tokenize_with_offsets(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current_start: Option<usize> = None;

    let mut char_iter = text.char_indices().peekable();
    while let Some((idx, c)) = char_iter.next() {
        if c.is_alphanumeric() {
            if current_start.is_none() {
                current_start = Some(idx);
            }
        } else if let Some(start) = current_start.take() {
            tokens.push(Token { text: text[start..idx].to_string(), start, end: idx });
        }
        if char_iter.peek().is_none() {
            if let Some(start) = current_start.take() {
                let end = idx + c.len_utf8();
                tokens.push(Token { text: text[start..end].to_string(), start, end });
            }
        }
    }
    tokens
}

fn score_candidate(place: &SharedPlace, source: MatchSource, context: &Context, section: Option<&str>) -> f64 {
    let mut score = 0.0;
    if context.host_country.as_deref() == Some(place.country_code.as_str()) {
        score += 5.0;
    }
    if context.tld_country.as_deref() == Some(place.country_code.as_str()) {
        score += 3.0;
    }
    if context.url_ccs.iter().any(|cc| cc == &place.country_code) {
        score += 4.0;
    }
    if let Some(section) = section {
        if section.to_lowercase().contains(&place.name.to_lowercase()) {
            score += 2.0;
        }
    }
    if source == MatchSource::Title {
        score += 1.0;
    }
    score += ((place.population + 1) as f64).log10() * 0.5;
    score
}

/// Slide windows of 1..=4 tokens; for each window, look up the normalized
/// text in `name_map`, score every candidate, and emit the best-scoring match.
pub fn extract_places_from_text(
    text: &str,
    source: MatchSource,
    gazetteer: &Gazetteer,
    context: &Context,
    section: Option<&str>,
) -> Vec<PlaceDetection> {
    let tokens = tokenize_with_offsets(text);
    let mut detections: Vec<PlaceDetection> = Vec::new();

    for window_len in 1..=MAX_WINDOW.min(tokens.len().max(1)) {
        if tokens.len() < window_len {
            break;
        }
        for window in tokens.windows(window_len) {
            let joined: String = window.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ");
            let key = normalize(&joined);
            if key.is_empty() {
                continue;
            }
            let candidates = gazetteer.lookup_name(&key);
            if candidates.is_empty() {
                continue;
            }
            let best = candidates
                .iter()
                .max_by(|a, b| {
                    score_candidate(a, source, context, section)
                        .partial_cmp(&score_candidate(b, source, context, section))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .expect("non-empty candidates");

            detections.push(PlaceDetection {
                place: best.clone(),
                source,
                offset_start: window.first().unwrap().start,
                offset_end: window.last().unwrap().end,
                score: score_candidate(best, source, context, section),
            });
        }
    }

    detections.sort_by(|a, b| a.offset_start.cmp(&b.offset_start).then(a.offset_end.cmp(&b.offset_end)));
    detections.dedup_by(|a, b| {
        a.source == b.source && a.place.place_id == b.place.place_id && a.offset_start == b.offset_start && a.offset_end == b.offset_end
    });
    detections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::Gazetteer;
    use crate::types::{PlaceKind, PlaceRecord};

    fn iceland_gazetteer() -> Gazetteer {
        Gazetteer::builder()
            .add_place(PlaceRecord {
                place_id: "is".to_string(),
                name: "Iceland".to_string(),
                kind: PlaceKind::Country,
                population: 372_000,
                country_code: "IS".to_string(),
                slugs: vec!["iceland".to_string()],
            })
            .build()
    }

    #[test]
    fn round_trip_single_known_place_name_byte_offsets() {
        let gaz = iceland_gazetteer();
        let text = "Iceland clinches another win in the tournament";
        let detections = extract_places_from_text(text, MatchSource::Text, &gaz, &Context::default(), None);
        assert_eq!(detections.len(), 1);
        let d = &detections[0];
        assert_eq!(&text[d.offset_start..d.offset_end], "Iceland");
    }

    #[test]
    fn scenario_article_analysis_detects_place() {
        let gaz = iceland_gazetteer();
        let ctx = Context { tld_country: Some("IS".to_string()), ..Default::default() };
        let text = "Iceland clinches another win against the visiting side";
        let detections = extract_places_from_text(text, MatchSource::Text, &gaz, &ctx, Some("Sport"));
        assert!(detections.iter().any(|d| d.place.name == "Iceland"));
    }

    #[test]
    fn no_detections_when_no_place_names_present() {
        let gaz = iceland_gazetteer();
        let detections = extract_places_from_text(
            "the weather today is sunny with a light breeze",
            MatchSource::Text,
            &gaz,
            &Context::default(),
            None,
        );
        assert!(detections.is_empty());
    }

    #[test]
    fn empty_text_yields_no_detections() {
        let gaz = iceland_gazetteer();
        let detections = extract_places_from_text("", MatchSource::Text, &gaz, &Context::default(), None);
        assert!(detections.is_empty());
    }
}
