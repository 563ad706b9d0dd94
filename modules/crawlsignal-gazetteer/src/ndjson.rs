//! NDJSON gazetteer import: one record per line, one file per logical table
//! (`places`, `place_names`, `place_hierarchy`, `place_attributes`,
//! `place_external_ids`, `place_hubs`, `place_provenance`). Validates
//! foreign-key consistency against `places` before building the in-memory
//! gazetteer.

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::{GazetteerError, Result};
use crate::gazetteer::Gazetteer;
use crate::types::{PlaceKind, PlaceRecord};

#[derive(Debug, Deserialize)]
struct PlaceRow {
    place_id: String,
    kind: PlaceKind,
    population: u64,
    country_code: String,
}

#[derive(Debug, Deserialize)]
struct PlaceNameRow {
    place_id: String,
    name: String,
    #[serde(default)]
    is_primary: bool,
    #[serde(default)]
    slug: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceHierarchyRow {
    parent_id: String,
    child_id: String,
}

#[derive(Debug, Deserialize)]
struct PlaceAttributeRow {
    place_id: String,
    #[allow(dead_code)]
    key: String,
    #[allow(dead_code)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct PlaceExternalIdRow {
    place_id: String,
    #[allow(dead_code)]
    source: String,
    #[allow(dead_code)]
    external_id: String,
}

#[derive(Debug, Deserialize)]
struct PlaceHubRow {
    place_id: String,
    topic_token: String,
}

#[derive(Debug, Deserialize)]
struct PlaceProvenanceRow {
    place_id: String,
    #[allow(dead_code)]
    source: String,
    #[allow(dead_code)]
    fetched_at: String,
}

fn parse_lines<T: for<'de> Deserialize<'de>>(table: &'static str, content: &str) -> Result<Vec<T>> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(|source| GazetteerError::MalformedRecord { table, source }))
        .collect()
}

/// Raw NDJSON text per logical table, as read from the seven import files.
#[derive(Debug, Default)]
pub struct GazetteerImport<'a> {
    pub places: &'a str,
    pub place_names: &'a str,
    pub place_hierarchy: &'a str,
    pub place_attributes: &'a str,
    pub place_external_ids: &'a str,
    pub place_hubs: &'a str,
    pub place_provenance: &'a str,
}

pub fn import(input: GazetteerImport<'_>) -> Result<Gazetteer> {
    let places: Vec<PlaceRow> = parse_lines("places", input.places)?;
    let known_ids: HashSet<&str> = places.iter().map(|p| p.place_id.as_str()).collect();

    let names: Vec<PlaceNameRow> = parse_lines("place_names", input.place_names)?;
    let hierarchy: Vec<PlaceHierarchyRow> = parse_lines("place_hierarchy", input.place_hierarchy)?;
    let attributes: Vec<PlaceAttributeRow> = parse_lines("place_attributes", input.place_attributes)?;
    let external_ids: Vec<PlaceExternalIdRow> = parse_lines("place_external_ids", input.place_external_ids)?;
    let hubs: Vec<PlaceHubRow> = parse_lines("place_hubs", input.place_hubs)?;
    let provenance: Vec<PlaceProvenanceRow> = parse_lines("place_provenance", input.place_provenance)?;

    for row in &names {
        check_fk("place_names", &row.place_id, &known_ids)?;
    }
    for row in &hierarchy {
        check_fk("place_hierarchy", &row.parent_id, &known_ids)?;
        check_fk("place_hierarchy", &row.child_id, &known_ids)?;
    }
    for row in &attributes {
        check_fk("place_attributes", &row.place_id, &known_ids)?;
    }
    for row in &external_ids {
        check_fk("place_external_ids", &row.place_id, &known_ids)?;
    }
    for row in &hubs {
        check_fk("place_hubs", &row.place_id, &known_ids)?;
    }
    for row in &provenance {
        check_fk("place_provenance", &row.place_id, &known_ids)?;
    }

    // Group names per place: primary name (or first) becomes `PlaceRecord::name`,
    // every name/slug becomes a `slugs` entry.
    let mut builder = Gazetteer::builder();
    for place in &places {
        let own_names: Vec<&PlaceNameRow> = names.iter().filter(|n| n.place_id == place.place_id).collect();
        let primary = own_names
            .iter()
            .find(|n| n.is_primary)
            .or_else(|| own_names.first())
            .map(|n| n.name.clone())
            .unwrap_or_else(|| place.place_id.clone());

        let mut slugs: Vec<String> = own_names.iter().flat_map(|n| n.slug.clone()).collect();
        slugs.extend(own_names.iter().map(|n| n.name.clone()));

        builder = builder.add_place(PlaceRecord {
            place_id: place.place_id.clone(),
            name: primary,
            kind: place.kind,
            population: place.population,
            country_code: place.country_code.clone(),
            slugs,
        });
    }
    for edge in &hierarchy {
        builder = builder.add_hierarchy_edge(edge.parent_id.clone(), edge.child_id.clone());
    }
    for hub in &hubs {
        builder = builder.add_topic_token(hub.topic_token.clone());
    }

    Ok(builder.build())
}

fn check_fk(table: &'static str, place_id: &str, known_ids: &HashSet<&str>) -> Result<()> {
    if known_ids.contains(place_id) {
        Ok(())
    } else {
        Err(GazetteerError::ForeignKeyViolation {
            table,
            detail: format!("place_id {place_id:?} not found in places"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imports_places_and_names() {
        let places = r#"{"place_id":"us","kind":"country","population":331000000,"country_code":"US"}"#;
        let names = r#"{"place_id":"us","name":"United States","is_primary":true,"slug":"usa"}"#;
        let gaz = import(GazetteerImport {
            places,
            place_names: names,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(gaz.lookup_slug("usa").len(), 1);
    }

    #[test]
    fn rejects_dangling_foreign_key() {
        let names = r#"{"place_id":"missing","name":"Nowhere"}"#;
        let result = import(GazetteerImport {
            places: "",
            place_names: names,
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn hierarchy_edges_become_queryable() {
        let places = "{\"place_id\":\"us\",\"kind\":\"country\",\"population\":331000000,\"country_code\":\"US\"}\n\
                       {\"place_id\":\"ca\",\"kind\":\"region\",\"population\":39500000,\"country_code\":\"US\"}";
        let hierarchy = r#"{"parent_id":"us","child_id":"ca"}"#;
        let gaz = import(GazetteerImport {
            places,
            place_hierarchy: hierarchy,
            ..Default::default()
        })
        .unwrap();
        assert!(gaz.is_ancestor("us", "ca"));
    }
}
