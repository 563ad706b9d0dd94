//! Place-name normalization: NFD decompose, strip combining marks, lowercase,
//! collapse non-alphanumeric runs to `-`, trim `-`. Used to build both
//! `name_map` and `slug_map` keys, and to slugify URL path segments for
//! lookup.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub fn normalize(input: &str) -> String {
    let decomposed: String = input.nfd().filter(|c| !is_combining_mark(*c)).collect();

    let mut out = String::with_capacity(decomposed.len());
    let mut last_was_dash = true; // swallow any leading dash
    for c in decomposed.to_lowercase().chars() {
        if c.is_alphanumeric() {
            out.push(c);
            last_was_dash = false;
        } else if !last_was_dash {
            out.push('-');
            last_was_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Split a hyphenated segment into its parts, e.g. `new-york` -> [`new-york`, `new`, `york`].
pub fn slug_candidates(segment: &str) -> Vec<String> {
    let normalized = normalize(segment);
    let mut candidates = vec![normalized.clone()];
    if normalized.contains('-') {
        candidates.extend(normalized.split('-').map(str::to_string));
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_accents_and_case() {
        assert_eq!(normalize("São Paulo"), "sao-paulo");
    }

    #[test]
    fn collapses_punctuation_runs() {
        assert_eq!(normalize("St.  Louis!!"), "st-louis");
    }

    #[test]
    fn trims_leading_and_trailing_dashes() {
        assert_eq!(normalize("-Reykjavik-"), "reykjavik");
    }

    #[test]
    fn idempotent() {
        let once = normalize("United States");
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn slug_candidates_splits_hyphenated_segment() {
        let candidates = slug_candidates("new-york");
        assert!(candidates.contains(&"new-york".to_string()));
        assert!(candidates.contains(&"new".to_string()));
        assert!(candidates.contains(&"york".to_string()));
    }
}
