//! Article body extraction from HTML pages.

use scraper::{Html, Node, Selector};
use tracing::debug;

use crate::text::normalize_whitespace;
use crate::types::{AnalysisError, Result};

/// Tried in order; the first selector that yields any paragraph text wins.
const BODY_SELECTORS: &[&str] = &[
    "[itemprop=articleBody] p",
    "article p",
    "main p",
    "[role=main] p",
    "p",
];

pub struct ArticleExtractor {
    selectors: Vec<Selector>,
}

impl ArticleExtractor {
    pub fn new() -> Result<Self> {
        let selectors = BODY_SELECTORS
            .iter()
            .map(|s| {
                Selector::parse(s).map_err(|e| AnalysisError::InvalidInput(format!("invalid selector '{s}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { selectors })
    }

    /// The article's paragraphs separated by blank lines, or `None` when the page has no
    /// recognisable body text.
    pub fn extract(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        for selector in &self.selectors {
            let paragraphs: Vec<String> = document
                .select(selector)
                .map(|element| normalize_whitespace(&element.text().collect::<String>()))
                .filter(|text| !text.is_empty())
                .collect();

            if !paragraphs.is_empty() {
                debug!("Extracted {} paragraphs", paragraphs.len());
                return Some(paragraphs.join("\n\n"));
            }
        }

        None
    }
}

/// Elements that start a new line of text when rendered.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "br", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "tr", "td", "th",
    "section", "article", "figcaption",
];

/// Plain text of an HTML fragment with whitespace collapsed. Inline markup adds nothing;
/// block elements are separated by a space.
pub fn html_to_text(fragment: &str) -> String {
    if !fragment.contains('<') && !fragment.contains('&') {
        return normalize_whitespace(fragment);
    }
    let parsed = Html::parse_fragment(fragment);

    let mut text = String::new();
    for node in parsed.root_element().descendants() {
        match node.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(e) if BLOCK_ELEMENTS.contains(&e.name()) => text.push(' '),
            _ => {}
        }
    }
    normalize_whitespace(&text)
}
