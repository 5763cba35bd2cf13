use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// The boundary types shared with the rendering layer live in the interfaces crate
pub use interfaces::defs::{
    AnalysisResult, AnswerResult, Article, EmotionResult, EmotionScore, EntityResult, EntitySpan,
    Failure, FeedInfo, Interpretation, SentimentResult, SummaryResult, TaskInfo, TaskKind, TaskReport,
};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
    /// How many article bodies are resolved at once when full text is requested.
    pub full_text_concurrency: usize,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "news-analysis/0.1 (+https://github.com/tommywood81/nlp_project)".to_string(),
            timeout_seconds: 10,
            max_retries: 2,
            retry_delay_seconds: 1,
            max_feed_size_mb: 10,
            max_redirects: 5,
            full_text_concurrency: 4,
        }
    }
}

/// Coarse classification of an [`AnalysisError`], stable enough to render or match on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    MissingContext,
    UnknownTask,
    UnknownFeed,
    ArticleNotFound,
    FeedUnavailable,
    Timeout,
    ModelFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::MissingContext => "MissingContext",
            ErrorKind::UnknownTask => "UnknownTask",
            ErrorKind::UnknownFeed => "UnknownFeed",
            ErrorKind::ArticleNotFound => "ArticleNotFound",
            ErrorKind::FeedUnavailable => "FeedUnavailable",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::ModelFailure => "ModelFailure",
        };
        f.write_str(name)
    }
}

/// Causes are kept as strings so a failure can be cloned and handed to every caller that
/// waited on the same feed refresh.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Task '{task}' requires a non-empty context")]
    MissingContext { task: TaskKind },

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Task already registered: {0}")]
    DuplicateTask(String),

    #[error("Unknown feed: {0}")]
    UnknownFeed(String),

    #[error("Article {index} not found in feed '{feed_id}' ({available} articles available)")]
    ArticleNotFound {
        feed_id: String,
        index: usize,
        available: usize,
    },

    #[error("Feed unavailable ({source_url}): {cause}")]
    FeedUnavailable { source_url: String, cause: String },

    #[error("Request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("Model failure in '{task}': {message}")]
    ModelFailure { task: String, message: String },
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::InvalidInput(_) | AnalysisError::DuplicateTask(_) => ErrorKind::InvalidInput,
            AnalysisError::MissingContext { .. } => ErrorKind::MissingContext,
            AnalysisError::UnknownTask(_) => ErrorKind::UnknownTask,
            AnalysisError::UnknownFeed(_) => ErrorKind::UnknownFeed,
            AnalysisError::ArticleNotFound { .. } => ErrorKind::ArticleNotFound,
            AnalysisError::FeedUnavailable { .. } => ErrorKind::FeedUnavailable,
            AnalysisError::Timeout { .. } => ErrorKind::Timeout,
            AnalysisError::ModelFailure { .. } => ErrorKind::ModelFailure,
        }
    }

    /// Renderable form of the error.
    pub fn to_failure(&self) -> Failure {
        Failure {
            kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }

    pub(crate) fn model(task: impl Into<String>, message: impl Into<String>) -> Self {
        AnalysisError::ModelFailure {
            task: task.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Per-task outcome inside batch operations.
pub type TaskOutcome = Result<AnalysisResult>;
