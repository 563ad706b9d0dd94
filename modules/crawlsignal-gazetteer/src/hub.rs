//! Hub-candidate construction from a resolved URL place match plus the
//! pipeline's page-classification signal.

use crate::gazetteer::Gazetteer;
use crate::types::{TopicHint, UrlPlaceResult};

#[derive(Debug, Clone, PartialEq)]
pub struct HubCandidate {
    pub place_slug: String,
    pub place_kind: &'static str,
    pub topic: Option<TopicHint>,
}

/// Emit a hub candidate when (a) a chain or single URL-place match exists and
/// (b) the page was classified `nav` or is article-link-dense, optionally
/// carrying a topic hint. The trailing URL segment is tried first; when it
/// names no recognized topic, a publisher-declared section string (e.g. a
/// `article:section` meta tag) is checked against the gazetteer's topic
/// tokens instead.
pub fn detect_hub(
    result: &UrlPlaceResult,
    is_nav_or_link_dense: bool,
    gazetteer: &Gazetteer,
    section: Option<&str>,
) -> Option<HubCandidate> {
    if !is_nav_or_link_dense {
        return None;
    }

    let place = result
        .best_chain
        .as_ref()
        .and_then(|c| c.places.last())
        .or_else(|| result.matches.first().map(|m| &m.place))?;

    let place_slug = crate::normalize::normalize(&place.name);
    let topic = result
        .topics
        .trailing
        .iter()
        .find(|seg| result.topics.recognized.contains(seg))
        .map(|slug| TopicHint { slug: slug.clone(), label: slug.clone(), kind: "topic", source: "trailing_segment" })
        .or_else(|| {
            let section = section?;
            if gazetteer.is_topic_token(section) {
                let slug = crate::normalize::normalize(section);
                Some(TopicHint { slug, label: section.to_string(), kind: "section", source: "section" })
            } else {
                None
            }
        });

    Some(HubCandidate { place_slug, place_kind: place.kind.as_str(), topic })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::Gazetteer;
    use crate::types::Context;
    use crate::url_extract::resolve_url_places;

    fn gazetteer_with_iceland_and_sport() -> Gazetteer {
        Gazetteer::builder()
            .add_place(crate::types::PlaceRecord {
                place_id: "is".to_string(),
                name: "Iceland".to_string(),
                kind: crate::types::PlaceKind::Country,
                population: 372_000,
                country_code: "IS".to_string(),
                slugs: vec!["iceland".to_string()],
            })
            .add_topic_token("sport")
            .build()
    }

    #[test]
    fn scenario_article_hub_candidate() {
        let gaz = gazetteer_with_iceland_and_sport();
        let result = resolve_url_places("/iceland/sport", &gaz, &Context::default());
        let candidate = detect_hub(&result, true, &gaz, None).expect("expected a hub candidate");
        assert_eq!(candidate.place_slug, "iceland");
        assert_eq!(candidate.place_kind, "country");
        assert_eq!(candidate.topic.unwrap().slug, "sport");
    }

    #[test]
    fn scenario_section_derived_topic_when_url_has_no_trailing_topic() {
        // https://www.theguardian.com/sport/iceland: "sport" is a leading
        // segment (it precedes the place match), not trailing, so the
        // section string carries the topic instead.
        let gaz = gazetteer_with_iceland_and_sport();
        let result = resolve_url_places("/sport/iceland", &gaz, &Context::default());
        let candidate = detect_hub(&result, true, &gaz, Some("Sport")).expect("expected a hub candidate");
        assert_eq!(candidate.place_slug, "iceland");
        let topic = candidate.topic.expect("expected a section-derived topic hint");
        assert_eq!(topic.slug, "sport");
        assert_eq!(topic.kind, "section");
        assert_eq!(topic.source, "section");
    }

    #[test]
    fn no_topic_hint_when_section_is_not_a_recognized_token() {
        let gaz = gazetteer_with_iceland_and_sport();
        let result = resolve_url_places("/sport/iceland", &gaz, &Context::default());
        let candidate = detect_hub(&result, true, &gaz, Some("Weather")).expect("expected a hub candidate");
        assert!(candidate.topic.is_none());
    }

    #[test]
    fn no_candidate_when_page_is_not_nav_or_dense() {
        let gaz = gazetteer_with_iceland_and_sport();
        let result = resolve_url_places("/iceland/sport", &gaz, &Context::default());
        assert!(detect_hub(&result, false, &gaz, None).is_none());
    }

    #[test]
    fn no_candidate_without_a_place_match() {
        let gaz = gazetteer_with_iceland_and_sport();
        let result = resolve_url_places("/opinion/columns", &gaz, &Context::default());
        assert!(detect_hub(&result, true, &gaz, None).is_none());
    }
}
