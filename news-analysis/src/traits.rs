use crate::types::{AnalysisResult, Article, Result, TaskKind};
use async_trait::async_trait;
use url::Url;

/// A single NLP capability behind a uniform contract.
///
/// Implementations may load their underlying model lazily, but must do so at most once
/// and must be safe to call from many requests at the same time.
#[async_trait]
pub trait AnalysisStrategy: Send + Sync {
    /// Which result variant this strategy produces
    fn kind(&self) -> TaskKind;

    /// Analyze `text`, with optional auxiliary `context` for tasks that need one.
    async fn analyze(&self, text: &str, context: Option<&str>) -> Result<AnalysisResult>;

    /// Load the underlying model ahead of the first request.
    async fn warm_up(&self) -> Result<()> {
        Ok(())
    }
}

/// Retrieves the articles of a syndication feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed at `source_url`. When `resolve_full_text` is set, each
    /// article's linked body is retrieved as well; a body that cannot be retrieved is
    /// left empty rather than failing the fetch.
    async fn fetch(&self, source_url: &Url, resolve_full_text: bool) -> Result<Vec<Article>>;
}
