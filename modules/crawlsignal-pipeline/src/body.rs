//! Article body extraction: a persisted per-host XPath, learned from
//! Readability output, with Readability itself as the fallback.

use scraper::{Html, Selector};
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};

use crate::types::ExtractedBody;

fn readability_text(html: &[u8], url: Option<&str>) -> String {
    let parsed_url = url.and_then(|u| url::Url::parse(u).ok());
    let config = TransformConfig {
        readability: true,
        main_content: true,
        return_format: ReturnFormat::Markdown,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let input = TransformInput {
        url: parsed_url.as_ref(),
        content: html,
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
        ignore_tags: None,
    };
    transform_content_input(input, &config)
}

fn title_of(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    document.select(&selector).next().map(|e| e.text().collect::<String>().trim().to_string())
}

/// Reads the publisher-declared section, preferring the `article:section`
/// meta tag (the common Open Graph convention) over a bare `meta[name=section]`
/// fallback.
fn section_of(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    for selector_str in ["meta[property='article:section']", "meta[name='section']"] {
        let selector = Selector::parse(selector_str).ok()?;
        if let Some(element) = document.select(&selector).next() {
            if let Some(content) = element.value().attr("content") {
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}

/// Applies a persisted XPath as a CSS selector against the parsed document.
/// `spider`'s gazetteer of HTML is CSS-based throughout this workspace, so a
/// "learned xpath" is stored and replayed as a CSS selector string.
fn apply_selector(html: &str, selector_str: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(selector_str).ok()?;
    let text: String = document
        .select(&selector)
        .flat_map(|el| el.text())
        .collect::<Vec<_>>()
        .join(" ");
    let trimmed = text.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Attempts to learn a reusable selector by finding the smallest element
/// whose text content exactly matches the Readability output, modulo
/// whitespace collapsing.
fn learn_selector(html: &str, target_text: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let candidates = ["article", "main", "[itemtype*='Article']", ".article-body", ".story-body"];
    for candidate in candidates {
        let selector = Selector::parse(candidate).ok()?;
        if let Some(element) = document.select(&selector).next() {
            let text: String = element.text().collect::<Vec<_>>().join(" ");
            if normalize_whitespace(&text) == normalize_whitespace(target_text) {
                return Some(candidate.to_string());
            }
        }
    }
    None
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn extract_body(
    html: &str,
    url: &str,
    persisted_xpath: Option<&str>,
    min_xpath_text: usize,
) -> ExtractedBody {
    let title = title_of(html);
    let section = section_of(html);

    if let Some(xpath) = persisted_xpath {
        if let Some(text) = apply_selector(html, xpath) {
            if text.len() >= min_xpath_text {
                return ExtractedBody {
                    text,
                    title,
                    section,
                    method: "xpath+heuristics@v1",
                    xpath: Some(xpath.to_string()),
                };
            }
        }
    }

    let readability = readability_text(html.as_bytes(), Some(url));
    if !readability.trim().is_empty() {
        if let Some(learned) = learn_selector(html, &readability) {
            return ExtractedBody {
                text: readability,
                title,
                section,
                method: "xpath-learned+heuristics@v1",
                xpath: Some(learned),
            };
        }
        return ExtractedBody {
            text: readability,
            title,
            section,
            method: "readability+heuristics@v1",
            xpath: persisted_xpath.map(|x| x.to_string()),
        };
    }

    ExtractedBody {
        text: String::new(),
        title,
        section,
        method: "readability+heuristics@v1",
        xpath: persisted_xpath.map(|x| x.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_of_extracts_title_tag() {
        let html = "<html><head><title>Example Headline</title></head><body></body></html>";
        assert_eq!(title_of(html).as_deref(), Some("Example Headline"));
    }

    #[test]
    fn apply_selector_returns_none_when_selector_matches_nothing() {
        let html = "<html><body><p>text</p></body></html>";
        assert!(apply_selector(html, "article").is_none());
    }

    #[test]
    fn apply_selector_extracts_matching_element_text() {
        let html = "<html><body><article>the body text here</article></body></html>";
        assert_eq!(apply_selector(html, "article").as_deref(), Some("the body text here"));
    }

    #[test]
    fn section_of_reads_article_section_meta() {
        let html = "<html><head><meta property='article:section' content='Sport'></head><body></body></html>";
        assert_eq!(section_of(html).as_deref(), Some("Sport"));
    }

    #[test]
    fn section_of_is_none_without_a_section_meta_tag() {
        let html = "<html><head><title>No section here</title></head><body></body></html>";
        assert!(section_of(html).is_none());
    }
}
