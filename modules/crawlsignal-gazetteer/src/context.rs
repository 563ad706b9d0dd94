//! Context inference: host, TLD -> country code, and declared domain locale,
//! used to bias place-match disambiguation.

use std::collections::HashMap;

use crate::types::Context;

/// ccTLD exceptions where the TLD does not already equal the ISO-3166 alpha-2
/// country code.
const TLD_COUNTRY_EXCEPTIONS: &[(&str, &str)] = &[("uk", "GB")];

fn tld_country(tld: &str) -> Option<String> {
    let lower = tld.to_lowercase();
    if let Some((_, cc)) = TLD_COUNTRY_EXCEPTIONS.iter().find(|(t, _)| *t == lower) {
        return Some(cc.to_string());
    }
    if lower.len() == 2 {
        return Some(lower.to_uppercase());
    }
    None
}

/// Declared country/language per domain, as loaded from an operator-supplied
/// table (typically persisted alongside the gazetteer, not part of it).
pub type DomainLocales = HashMap<String, (String, String)>;

/// Infer context from `host` and the non-empty URL path segments.
pub fn infer_context(host: &str, url_segments: &[String], domain_locales: &DomainLocales) -> Context {
    let tld = host.rsplit('.').next().unwrap_or("");
    let tld_cc = tld_country(tld);

    let (declared_country, declared_language) = domain_locales
        .get(host)
        .map(|(c, l)| (Some(c.clone()), Some(l.clone())))
        .unwrap_or((None, None));

    let url_ccs: Vec<String> = url_segments
        .iter()
        .filter(|seg| seg.len() == 2 && seg.chars().all(|c| c.is_ascii_alphabetic()))
        .map(|seg| seg.to_uppercase())
        .collect();

    Context {
        host_country: declared_country.or_else(|| tld_cc.clone()),
        tld_country: tld_cc,
        url_ccs,
        declared_language,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_two_letter_tld_maps_directly() {
        let ctx = infer_context("example.de", &[], &DomainLocales::new());
        assert_eq!(ctx.tld_country, Some("DE".to_string()));
    }

    #[test]
    fn uk_tld_exception_maps_to_gb() {
        let ctx = infer_context("example.co.uk", &[], &DomainLocales::new());
        assert_eq!(ctx.tld_country, Some("GB".to_string()));
    }

    #[test]
    fn domain_locales_table_overrides_tld_guess() {
        let mut locales = DomainLocales::new();
        locales.insert("example.com".to_string(), ("FR".to_string(), "fr".to_string()));
        let ctx = infer_context("example.com", &[], &locales);
        assert_eq!(ctx.host_country, Some("FR".to_string()));
        assert_eq!(ctx.declared_language, Some("fr".to_string()));
    }

    #[test]
    fn url_segments_matching_iso2_are_uppercased() {
        let segments = vec!["us".to_string(), "business".to_string()];
        let ctx = infer_context("example.com", &segments, &DomainLocales::new());
        assert_eq!(ctx.url_ccs, vec!["US".to_string()]);
    }
}
