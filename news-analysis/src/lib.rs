pub mod types;
pub mod config;
pub mod clock;
pub mod text;
pub mod model;
pub mod traits;
pub mod strategies;
pub mod registry;
pub mod fetcher;
pub mod parser;
pub mod extractor;
pub mod sources;
pub mod cache;
pub mod orchestrator;
pub mod samples;

pub use types::*;
pub use config::AppConfig;
pub use clock::{Clock, ManualClock, SystemClock};
pub use traits::{AnalysisStrategy, FeedSource};
pub use registry::StrategyRegistry;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use extractor::ArticleExtractor;
pub use sources::FeedFetcher;
pub use cache::{CacheStats, FeedCache, FeedCacheEntry};
pub use orchestrator::{AnalysisOrchestrator, ArticleAnalysis, ComparisonReport, TaskComparison};
