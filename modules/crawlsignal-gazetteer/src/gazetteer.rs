use std::collections::{HashMap, HashSet};

use crate::hierarchy::Hierarchy;
use crate::normalize::normalize;
use crate::types::{PlaceRecord, SharedPlace};

/// The read-mostly, in-memory gazetteer. Built once at startup from the
/// persistence layer; immutable and freely shared (behind an `Arc`) for the
/// rest of the job.
#[derive(Debug, Default)]
pub struct Gazetteer {
    pub(crate) name_map: HashMap<String, Vec<SharedPlace>>,
    pub(crate) slug_map: HashMap<String, Vec<SharedPlace>>,
    pub(crate) hierarchy: Hierarchy,
    pub(crate) topic_tokens: HashSet<String>,
}

impl Gazetteer {
    pub fn builder() -> GazetteerBuilder {
        GazetteerBuilder::default()
    }

    pub fn lookup_name(&self, normalized_name: &str) -> &[SharedPlace] {
        self.name_map.get(normalized_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn lookup_slug(&self, slug: &str) -> &[SharedPlace] {
        self.slug_map.get(slug).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_ancestor(&self, ancestor_id: &str, descendant_id: &str) -> bool {
        self.hierarchy.is_ancestor(ancestor_id, descendant_id)
    }

    pub fn is_topic_token(&self, token: &str) -> bool {
        self.topic_tokens.contains(&normalize(token))
    }

    pub fn place_count(&self) -> usize {
        self.name_map
            .values()
            .flatten()
            .map(|p| p.place_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

#[derive(Default)]
pub struct GazetteerBuilder {
    records: Vec<PlaceRecord>,
    edges: Vec<(String, String)>,
    topic_tokens: HashSet<String>,
}

impl GazetteerBuilder {
    pub fn add_place(mut self, record: PlaceRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn add_hierarchy_edge(mut self, parent_id: impl Into<String>, child_id: impl Into<String>) -> Self {
        self.edges.push((parent_id.into(), child_id.into()));
        self
    }

    pub fn add_topic_token(mut self, token: impl Into<String>) -> Self {
        self.topic_tokens.insert(normalize(&token.into()));
        self
    }

    pub fn build(self) -> Gazetteer {
        let mut name_map: HashMap<String, Vec<SharedPlace>> = HashMap::new();
        let mut slug_map: HashMap<String, Vec<SharedPlace>> = HashMap::new();

        for record in self.records {
            let shared = std::sync::Arc::new(record);
            let name_key = normalize(&shared.name);
            name_map.entry(name_key).or_default().push(shared.clone());

            let mut slug_keys: Vec<String> = shared.slugs.iter().map(|s| normalize(s)).collect();
            slug_keys.push(normalize(&shared.name));
            slug_keys.sort();
            slug_keys.dedup();
            for slug in slug_keys {
                slug_map.entry(slug).or_default().push(shared.clone());
            }
        }

        for records in name_map.values_mut() {
            records.sort_by(|a, b| b.population.cmp(&a.population));
        }
        for records in slug_map.values_mut() {
            records.sort_by(|a, b| b.population.cmp(&a.population));
        }

        let mut hierarchy = Hierarchy::new();
        for (parent, child) in self.edges {
            hierarchy.add_edge(&parent, &child);
        }
        hierarchy.build_closure();

        Gazetteer {
            name_map,
            slug_map,
            hierarchy,
            topic_tokens: self.topic_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlaceKind;

    fn place(id: &str, name: &str, kind: PlaceKind, pop: u64, cc: &str) -> PlaceRecord {
        PlaceRecord {
            place_id: id.to_string(),
            name: name.to_string(),
            kind,
            population: pop,
            country_code: cc.to_string(),
            slugs: vec![],
        }
    }

    #[test]
    fn name_map_sorted_by_population_descending() {
        let gaz = Gazetteer::builder()
            .add_place(place("us", "United States", PlaceKind::Country, 331_000_000, "US"))
            .add_place({
                let mut r = place("usa-alt", "United States", PlaceKind::Country, 1, "US");
                r.place_id = "usa-alt".to_string();
                r
            })
            .build();
        let matches = gaz.lookup_name("united-states");
        assert_eq!(matches.len(), 2);
        assert!(matches[0].population >= matches[1].population);
    }

    #[test]
    fn slug_map_includes_explicit_synonyms() {
        let mut record = place("us", "United States", PlaceKind::Country, 331_000_000, "US");
        record.slugs = vec!["usa".to_string(), "us".to_string()];
        let gaz = Gazetteer::builder().add_place(record).build();
        assert_eq!(gaz.lookup_slug("usa").len(), 1);
        assert_eq!(gaz.lookup_slug("us").len(), 1);
    }

    #[test]
    fn hierarchy_ancestor_query_works_after_build() {
        let gaz = Gazetteer::builder()
            .add_place(place("us", "United States", PlaceKind::Country, 331_000_000, "US"))
            .add_place(place("ca", "California", PlaceKind::Region, 39_500_000, "US"))
            .add_hierarchy_edge("us", "ca")
            .build();
        assert!(gaz.is_ancestor("us", "ca"));
    }

    #[test]
    fn topic_tokens_are_normalized() {
        let gaz = Gazetteer::builder().add_topic_token("News").build();
        assert!(gaz.is_topic_token("news"));
        assert!(gaz.is_topic_token("NEWS"));
    }
}
