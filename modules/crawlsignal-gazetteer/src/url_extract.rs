//! `resolve_url_places`: gazetteer matching over URL path segments, with
//! hierarchical chain building and topic-segment partitioning.

use crate::gazetteer::Gazetteer;
use crate::normalize::slug_candidates;
use crate::types::{Chain, Context, MatchSource, PlaceMatch, SharedPlace, Topics, UrlPlaceResult};

fn path_segments(path: &str) -> Vec<String> {
    path.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// Pick the best single place record for one segment's candidate slugs:
/// population descending is the dominant order; country-code matching the
/// inferred host country only disambiguates among records tied for the top
/// population.
fn best_for_segment(gazetteer: &Gazetteer, segment: &str, context: &Context) -> Option<SharedPlace> {
    let mut seen = std::collections::HashSet::new();
    let mut candidates: Vec<SharedPlace> = Vec::new();
    for slug in slug_candidates(segment) {
        for place in gazetteer.lookup_slug(&slug) {
            if seen.insert(place.place_id.clone()) {
                candidates.push(place.clone());
            }
        }
    }
    if candidates.is_empty() {
        return None;
    }

    // Each slug's bucket from `lookup_slug` is already population-sorted, but
    // merging several slugs' buckets (the segment itself plus its
    // hyphen-split parts) needs a global re-sort to keep population dominant.
    candidates.sort_by(|a, b| b.population.cmp(&a.population));

    if let Some(host_cc) = &context.host_country {
        let top_population = candidates[0].population;
        if let Some(pos) = candidates
            .iter()
            .position(|p| &p.country_code == host_cc && p.population == top_population)
        {
            if pos != 0 {
                let preferred = candidates.remove(pos);
                candidates.insert(0, preferred);
            }
        }
    }
    candidates.into_iter().next()
}

/// Build all hierarchical chains from an ordered sequence of per-segment
/// matches: a chain is a run where each next place is a descendant of the
/// previous (per `hierarchy.is_ancestor`). Chains do not need to be
/// contiguous in segment position, only ascending in order.
fn build_chains(gazetteer: &Gazetteer, ordered_matches: &[(usize, SharedPlace)]) -> Vec<Chain> {
    let n = ordered_matches.len();
    if n == 0 {
        return Vec::new();
    }

    // chains_ending_at[i] = all chains (as place lists) ending at match i.
    let mut chains_ending_at: Vec<Vec<Vec<SharedPlace>>> = vec![Vec::new(); n];
    for i in 0..n {
        chains_ending_at[i].push(vec![ordered_matches[i].1.clone()]);
        for j in 0..i {
            if gazetteer.is_ancestor(&ordered_matches[j].1.place_id, &ordered_matches[i].1.place_id) {
                let extensions: Vec<Vec<SharedPlace>> = chains_ending_at[j]
                    .iter()
                    .map(|chain| {
                        let mut extended = chain.clone();
                        extended.push(ordered_matches[i].1.clone());
                        extended
                    })
                    .collect();
                chains_ending_at[i].extend(extensions);
            }
        }
    }

    chains_ending_at
        .into_iter()
        .flatten()
        .map(|places| {
            let cumulative_population = places.iter().map(|p| p.population).sum();
            Chain { places, cumulative_population }
        })
        .collect()
}

fn pick_best_chain(chains: &[Chain]) -> Option<Chain> {
    chains
        .iter()
        .max_by(|a, b| {
            a.len()
                .cmp(&b.len())
                .then(a.cumulative_population.cmp(&b.cumulative_population))
        })
        .cloned()
}

pub fn resolve_url_places(path: &str, gazetteer: &Gazetteer, context: &Context) -> UrlPlaceResult {
    let segments = path_segments(path);

    let mut matches: Vec<PlaceMatch> = Vec::new();
    let mut ordered_place_segments: Vec<(usize, SharedPlace)> = Vec::new();
    let mut place_segment_indices = std::collections::HashSet::new();

    for (idx, segment) in segments.iter().enumerate() {
        if let Some(place) = best_for_segment(gazetteer, segment, context) {
            matches.push(PlaceMatch {
                place: place.clone(),
                segment_index: Some(idx),
                offset_start: None,
                offset_end: None,
                source: MatchSource::Url,
                score: 1.0,
            });
            ordered_place_segments.push((idx, place));
            place_segment_indices.insert(idx);
        }
    }

    let chains = build_chains(gazetteer, &ordered_place_segments);
    let best_chain = pick_best_chain(&chains);

    let topic_segments: Vec<(usize, &String)> = segments
        .iter()
        .enumerate()
        .filter(|(idx, _)| !place_segment_indices.contains(idx))
        .collect();

    let first_place_idx = place_segment_indices.iter().min().copied();
    let last_place_idx = place_segment_indices.iter().max().copied();

    let mut topics = Topics::default();
    for (idx, segment) in &topic_segments {
        topics.all.push((*segment).clone());
        if gazetteer.is_topic_token(segment) {
            topics.recognized.push((*segment).clone());
        }
        match (first_place_idx, last_place_idx) {
            (Some(first), _) if *idx < first => topics.leading.push((*segment).clone()),
            (_, Some(last)) if *idx > last => topics.trailing.push((*segment).clone()),
            (None, None) => {}
            _ => {}
        }
    }

    UrlPlaceResult { matches, chains, best_chain, topics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::Gazetteer;
    use crate::types::PlaceKind;

    fn test_gazetteer() -> Gazetteer {
        Gazetteer::builder()
            .add_place({
                let mut r = crate::types::PlaceRecord {
                    place_id: "us".to_string(),
                    name: "United States".to_string(),
                    kind: PlaceKind::Country,
                    population: 331_000_000,
                    country_code: "US".to_string(),
                    slugs: vec!["united-states".to_string(), "us".to_string(), "usa".to_string()],
                };
                r.slugs.sort();
                r
            })
            .add_place(crate::types::PlaceRecord {
                place_id: "ca".to_string(),
                name: "California".to_string(),
                kind: PlaceKind::Region,
                population: 39_500_000,
                country_code: "US".to_string(),
                slugs: vec!["california".to_string()],
            })
            .add_hierarchy_edge("us", "ca")
            .add_topic_token("news")
            .add_topic_token("business")
            .build()
    }

    #[test]
    fn scenario_gazetteer_matching() {
        let gaz = test_gazetteer();
        let ctx = Context { host_country: Some("US".to_string()), ..Default::default() };
        let result = resolve_url_places("/us/california/news", &gaz, &ctx);
        let best = result.best_chain.expect("expected a best chain");
        let names: Vec<&str> = best.places.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["United States", "California"]);
        assert!(result.topics.trailing.contains(&"news".to_string()));
    }

    #[test]
    fn scenario_synonym_country() {
        let gaz = test_gazetteer();
        let ctx = Context::default();
        let result = resolve_url_places("/usa/business", &gaz, &ctx);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].place.name, "United States");
        assert!(result.topics.trailing.contains(&"business".to_string()));
    }

    #[test]
    fn no_matches_yields_empty_chains_and_full_topic_list() {
        let gaz = test_gazetteer();
        let result = resolve_url_places("/opinion/climate", &gaz, &Context::default());
        assert!(result.chains.is_empty());
        assert!(result.best_chain.is_none());
        assert_eq!(result.topics.all, vec!["opinion".to_string(), "climate".to_string()]);
    }

    #[test]
    fn country_code_tie_break_never_overrides_population() {
        // "georgia" is ambiguous between the country (pop 3.7M) and the US
        // state (pop 10.9M) sharing the slug "georgia". Even when the host
        // country matches the smaller one, population stays dominant.
        let gaz = Gazetteer::builder()
            .add_place(crate::types::PlaceRecord {
                place_id: "ge".to_string(),
                name: "Georgia".to_string(),
                kind: PlaceKind::Country,
                population: 3_700_000,
                country_code: "GE".to_string(),
                slugs: vec!["georgia".to_string()],
            })
            .add_place(crate::types::PlaceRecord {
                place_id: "us-ga".to_string(),
                name: "Georgia (US)".to_string(),
                kind: PlaceKind::Region,
                population: 10_900_000,
                country_code: "US".to_string(),
                slugs: vec!["georgia".to_string()],
            })
            .build();
        let ctx = Context { host_country: Some("GE".to_string()), ..Default::default() };
        let result = resolve_url_places("/georgia/news", &gaz, &ctx);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].place.place_id, "us-ga");
    }

    #[test]
    fn country_code_breaks_a_genuine_population_tie() {
        let gaz = Gazetteer::builder()
            .add_place(crate::types::PlaceRecord {
                place_id: "a".to_string(),
                name: "Springfield A".to_string(),
                kind: PlaceKind::City,
                population: 100_000,
                country_code: "FR".to_string(),
                slugs: vec!["springfield".to_string()],
            })
            .add_place(crate::types::PlaceRecord {
                place_id: "b".to_string(),
                name: "Springfield B".to_string(),
                kind: PlaceKind::City,
                population: 100_000,
                country_code: "US".to_string(),
                slugs: vec!["springfield".to_string()],
            })
            .build();
        let ctx = Context { host_country: Some("US".to_string()), ..Default::default() };
        let result = resolve_url_places("/springfield", &gaz, &ctx);
        assert_eq!(result.matches[0].place.place_id, "b");
    }
}
