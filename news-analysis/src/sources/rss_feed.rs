use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use url::Url;

use crate::extractor::ArticleExtractor;
use crate::traits::FeedSource;
use crate::types::{AnalysisError, Article, FetchConfig, Result};
use crate::{FeedParser, Fetcher};

/// Fetches RSS/Atom feeds over HTTP and optionally resolves each article's body.
///
/// Feed-level failures (network, HTTP status, unparseable document) are reported as
/// errors. Failures resolving an individual article body only leave that article's
/// `full_text` empty.
pub struct FeedFetcher {
    fetcher: Fetcher,
    extractor: ArticleExtractor,
    full_text_concurrency: usize,
}

impl FeedFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let full_text_concurrency = config.full_text_concurrency.max(1);
        Ok(Self {
            fetcher: Fetcher::new(config)?,
            extractor: ArticleExtractor::new()?,
            full_text_concurrency,
        })
    }

    async fn resolve_full_text(&self, article: &Article) -> Option<String> {
        let html = match self.fetcher.fetch_page(&article.link).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Could not retrieve article body {}: {}", article.link, e);
                return None;
            }
        };

        let text = self.extractor.extract(&html);
        if text.is_none() {
            warn!("No article text found at {}", article.link);
        }
        text
    }
}

#[async_trait]
impl FeedSource for FeedFetcher {
    async fn fetch(&self, source_url: &Url, resolve_full_text: bool) -> Result<Vec<Article>> {
        info!("Pulling RSS feed: {}", source_url);

        let content = self.fetcher.fetch_feed(source_url).await?;
        if !FeedParser::is_valid_feed_content(&content) {
            return Err(AnalysisError::FeedUnavailable {
                source_url: source_url.to_string(),
                cause: "response is not an RSS or Atom document".to_string(),
            });
        }

        let mut articles = FeedParser::parse_articles(&content, source_url)?;
        if !resolve_full_text {
            return Ok(articles);
        }

        debug!(
            "Resolving {} article bodies ({} at a time)",
            articles.len(),
            self.full_text_concurrency
        );
        // Owned items keep the buffered future Send
        let bodies: Vec<Option<String>> = stream::iter(articles.clone())
            .map(|article| async move { self.resolve_full_text(&article).await })
            .buffered(self.full_text_concurrency)
            .collect()
            .await;

        let resolved = bodies.iter().filter(|b| b.is_some()).count();
        for (article, body) in articles.iter_mut().zip(bodies) {
            article.full_text = body;
        }

        info!("Resolved {}/{} article bodies from {}", resolved, articles.len(), source_url);
        Ok(articles)
    }
}
