//! Page classification: `article` / `nav` / `minimal` from DOM-level signals.

use scraper::{Html, Selector};

use crate::types::{ClassifySignals, PageKind};

pub fn dom_signals(html: &str) -> ClassifySignals {
    let document = Html::parse_document(html);

    let article_tag = Selector::parse("article").unwrap();
    let microdata = Selector::parse("[itemtype*='Article']").unwrap();
    let anchor = Selector::parse("a[href]").unwrap();
    let nav = Selector::parse("nav a[href], header a[href], footer a[href]").unwrap();

    let has_article_signal =
        document.select(&article_tag).next().is_some() || document.select(&microdata).next().is_some();

    let nav_link_count = document.select(&nav).count();
    let total_links = document.select(&anchor).count();
    let article_link_count = total_links.saturating_sub(nav_link_count);

    let word_count = visible_text(&document).split_whitespace().count();

    ClassifySignals { nav_link_count, article_link_count, word_count, has_article_signal }
}

/// Joins visible text nodes, tracking a skip-depth across `script`/`style`/
/// `noscript` subtrees so their contents never reach the word count.
fn visible_text(document: &Html) -> String {
    use ego_tree::iter::Edge;

    let mut chunks: Vec<String> = Vec::new();
    let mut skip_depth = 0usize;

    for edge in document.root_element().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                scraper::Node::Element(el) if matches!(el.name(), "script" | "style" | "noscript") => {
                    skip_depth += 1;
                }
                scraper::Node::Text(text) if skip_depth == 0 => {
                    chunks.push(text.to_string());
                }
                _ => {}
            },
            Edge::Close(node) => {
                if let scraper::Node::Element(el) = node.value() {
                    if matches!(el.name(), "script" | "style" | "noscript") {
                        skip_depth -= 1;
                    }
                }
            }
        }
    }

    chunks.join(" ")
}

pub fn classify(signals: &ClassifySignals, min_article_words: usize, min_nav_article_links: usize) -> PageKind {
    if signals.word_count >= min_article_words && signals.has_article_signal {
        PageKind::Article
    } else if signals.article_link_count >= min_nav_article_links && signals.word_count < min_article_words {
        PageKind::Nav
    } else {
        PageKind::Minimal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_tag_with_enough_words_classifies_as_article() {
        let words = "word ".repeat(350);
        let html = format!("<html><body><article>{words}</article></body></html>");
        let signals = dom_signals(&html);
        assert_eq!(classify(&signals, 300, 20), PageKind::Article);
    }

    #[test]
    fn link_dense_short_page_classifies_as_nav() {
        let links: String = (0..25).map(|i| format!("<a href=\"/story-{i}\">headline {i}</a>")).collect();
        let html = format!("<html><body>{links}</body></html>");
        let signals = dom_signals(&html);
        assert_eq!(classify(&signals, 300, 20), PageKind::Nav);
    }

    #[test]
    fn sparse_short_page_is_minimal() {
        let html = "<html><body><p>hello</p></body></html>";
        let signals = dom_signals(html);
        assert_eq!(classify(&signals, 300, 20), PageKind::Minimal);
    }

    #[test]
    fn script_and_style_contents_are_excluded_from_word_count() {
        let html = r#"<html><body>
            <p>two visible words</p>
            <script>var junk = "plenty of extra words that should not count";</script>
            <style>.hidden { content: "more words that should not count either"; }</style>
        </body></html>"#;
        let signals = dom_signals(html);
        assert_eq!(signals.word_count, 3);
    }
}
