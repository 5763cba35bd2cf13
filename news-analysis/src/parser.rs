use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use feed_rs::model::Feed;
use feed_rs::parser::{self, ParseFeedResult};
use tracing::{debug, info};
use url::Url;

use crate::extractor::html_to_text;
use crate::types::{AnalysisError, Article, Result};

/// Turns RSS/Atom documents into articles.
pub struct FeedParser;

impl FeedParser {
    /// Parse a feed document fetched from `source_url`. Entries without an absolute http(s)
    /// link, and repeats of a link already seen in the document, are dropped.
    pub fn parse_articles(content: &str, source_url: &Url) -> Result<Vec<Article>> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let (feed, dates) = parse_keeping_dates(content).map_err(|e| AnalysisError::FeedUnavailable {
            source_url: source_url.to_string(),
            cause: format!("failed to parse feed: {e}"),
        })?;

        let total = feed.entries.len();
        let mut seen_links = HashSet::new();
        let mut articles = Vec::with_capacity(total);

        for entry in feed.entries {
            let Some(article) = Self::parse_entry(entry, &dates) else {
                continue;
            };
            if !seen_links.insert(article.link.clone()) {
                debug!("Skipping duplicate entry with URL: {}", article.link);
                continue;
            }
            articles.push(article);
        }

        info!(
            "Parsed {} articles from {} ({} entries dropped)",
            articles.len(),
            source_url,
            total - articles.len()
        );
        Ok(articles)
    }

    fn parse_entry(entry: feed_rs::model::Entry, dates: &[String]) -> Option<Article> {
        let href = entry.links.first().map(|l| l.href.trim().to_string());
        let link = match href.as_deref().map(Url::parse) {
            Some(Ok(url)) if matches!(url.scheme(), "http" | "https") => url,
            _ => {
                debug!("Skipping entry without an absolute link: {:?}", href);
                return None;
            }
        };

        let title = entry
            .title
            .map(|t| html_to_text(&t.content))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());

        // Prefer the short summary; fall back to inline content
        let summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .map(|s| html_to_text(&s))
            .filter(|s| !s.is_empty());

        Some(Article {
            title,
            link,
            published: entry
                .published
                .and_then(|marker| usize::try_from(marker.timestamp()).ok())
                .and_then(|i| dates.get(i))
                .filter(|text| !text.is_empty())
                .cloned(),
            summary,
            full_text: None,
        })
    }

    /// Cheap check for something that looks like an RSS or Atom document.
    pub fn is_valid_feed_content(content: &str) -> bool {
        let content_lower = content.to_lowercase();
        content_lower.contains("<rss") || content_lower.contains("<feed") || content_lower.contains("<rdf:rdf")
    }
}

/// Parse with feed-rs while keeping every date exactly as written. feed-rs only exposes
/// parsed timestamps, so each date text is recorded and stood in for by a marker instant
/// whose seconds since the epoch index the recorded text.
fn parse_keeping_dates(content: &str) -> ParseFeedResult<(Feed, Vec<String>)> {
    let recorded = Rc::new(RefCell::new(Vec::new()));
    let recorder = Rc::clone(&recorded);
    let feed_parser = parser::Builder::new()
        .timestamp_parser(move |text: &str| -> Option<DateTime<Utc>> {
            let mut texts = recorder.borrow_mut();
            texts.push(text.trim().to_string());
            DateTime::from_timestamp(texts.len() as i64 - 1, 0)
        })
        .build();

    let feed = feed_parser.parse(content.as_bytes())?;
    let dates = recorded.take();
    Ok((feed, dates))
}
