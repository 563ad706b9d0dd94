//! Out-link discovery: href-only extraction, scope-filtered to the
//! registrable domain unless cross-domain crawling is enabled.

use std::sync::LazyLock;

use crawlsignal_common::{canonicalize_url, registrable_domain};
use regex::Regex;

static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).expect("valid regex"));

fn resolve_href(raw: &str, base: &url::Url) -> Option<String> {
    let parsed = if raw.starts_with("http://") || raw.starts_with("https://") {
        url::Url::parse(raw).ok()?
    } else {
        base.join(raw).ok()?
    };
    canonicalize_url(parsed.as_str())
}

/// Extracts, resolves, canonicalises, and dedupes every `href`-bearing link
/// on the page, then filters out-of-scope hosts unless `cross_domain` is set.
pub fn discover_links(html: &str, base_url: &str, cross_domain: bool) -> Vec<String> {
    let base = match url::Url::parse(base_url) {
        Ok(u) => u,
        Err(_) => return Vec::new(),
    };
    let base_domain = registrable_domain(base_url);

    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for cap in HREF_RE.captures_iter(html) {
        let raw = &cap[1];
        let Some(resolved) = resolve_href(raw, &base) else { continue };

        if !cross_domain {
            if registrable_domain(&resolved) != base_domain {
                continue;
            }
        }

        if seen.insert(resolved.clone()) {
            links.push(resolved);
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_only_href_attributes() {
        let html = r#"<a href="/a">a</a><img src="/b.png"><link href="/c">"#;
        let links = discover_links(html, "https://example.com/", true);
        assert_eq!(links, vec!["https://example.com/a", "https://example.com/c"]);
    }

    #[test]
    fn strips_fragment_and_dedupes() {
        let html = r#"<a href="/a#top">a</a><a href="/a">a again</a>"#;
        let links = discover_links(html, "https://example.com/", true);
        assert_eq!(links, vec!["https://example.com/a"]);
    }

    #[test]
    fn out_of_scope_hosts_are_dropped_unless_cross_domain() {
        let html = r#"<a href="https://other.com/x">x</a><a href="/local">local</a>"#;
        let links = discover_links(html, "https://example.com/", false);
        assert_eq!(links, vec!["https://example.com/local"]);
    }

    #[test]
    fn cross_domain_flag_keeps_foreign_hosts() {
        let html = r#"<a href="https://other.com/x">x</a>"#;
        let links = discover_links(html, "https://example.com/", true);
        assert_eq!(links, vec!["https://other.com/x"]);
    }
}
