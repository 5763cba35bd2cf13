//! Runtime configuration for the analysis core.
//!
//! Defaults reproduce the ABC Australia feeds. Every value can be overridden from the
//! environment with `NEWS_ANALYSIS_*` variables, and the binary layers CLI flags on top.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::types::{AnalysisError, FeedInfo, FetchConfig, Result};

pub const ENV_FEEDS: &str = "NEWS_ANALYSIS_FEEDS";
pub const ENV_CACHE_TTL_MINUTES: &str = "NEWS_ANALYSIS_CACHE_TTL_MINUTES";
pub const ENV_TIMEOUT_SECONDS: &str = "NEWS_ANALYSIS_TIMEOUT_SECONDS";
pub const ENV_MAX_TEXT_CHARS: &str = "NEWS_ANALYSIS_MAX_TEXT_CHARS";
pub const ENV_FULL_TEXT: &str = "NEWS_ANALYSIS_FULL_TEXT";
pub const ENV_USER_AGENT: &str = "NEWS_ANALYSIS_USER_AGENT";

/// One week.
pub const MAX_CACHE_TTL_MINUTES: u64 = 7 * 24 * 60;

const DEFAULT_FEEDS: [(&str, &str, &str); 3] = [
    ("top_stories", "Top Stories", "https://www.abc.net.au/news/feed/51120/rss.xml"),
    ("australia", "Australia", "https://www.abc.net.au/news/feed/51892/rss.xml"),
    ("just_in", "Just In", "https://www.abc.net.au/news/feed/52498/rss.xml"),
];

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Configured feeds, in display order.
    pub feeds: Vec<FeedInfo>,
    pub cache_ttl_minutes: u64,
    /// Resolve the linked article body for every entry when a feed is fetched.
    pub resolve_full_text: bool,
    /// Longest text, in characters, accepted by the analysis operations.
    pub max_text_chars: usize,
    pub fetch: FetchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let feeds = DEFAULT_FEEDS
            .iter()
            .filter_map(|(id, name, url)| {
                Url::parse(url).ok().map(|url| FeedInfo {
                    feed_id: id.to_string(),
                    display_name: name.to_string(),
                    url,
                })
            })
            .collect();

        Self {
            feeds,
            cache_ttl_minutes: 10,
            resolve_full_text: false,
            max_text_chars: 10_000,
            fetch: FetchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by whatever `NEWS_ANALYSIS_*` variables are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_FEEDS) {
            config.feeds = parse_feed_list(&raw)?;
        }
        if let Some(raw) = lookup(ENV_CACHE_TTL_MINUTES) {
            config.cache_ttl_minutes = parse_value(ENV_CACHE_TTL_MINUTES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECONDS) {
            config.fetch.timeout_seconds = parse_value(ENV_TIMEOUT_SECONDS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_TEXT_CHARS) {
            config.max_text_chars = parse_value(ENV_MAX_TEXT_CHARS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_FULL_TEXT) {
            config.resolve_full_text = parse_value(ENV_FULL_TEXT, &raw)?;
        }
        if let Some(agent) = lookup(ENV_USER_AGENT) {
            config.fetch.user_agent = agent;
        }

        config.validate()?;
        debug!(
            "Loaded configuration: {} feeds, ttl {}m, timeout {}s",
            config.feeds.len(),
            config.cache_ttl_minutes,
            config.fetch.timeout_seconds
        );
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes.saturating_mul(60))
    }

    pub fn feed(&self, feed_id: &str) -> Option<&FeedInfo> {
        self.feeds.iter().find(|feed| feed.feed_id == feed_id)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch.timeout_seconds == 0 {
            return Err(AnalysisError::InvalidInput("network timeout must be at least one second".to_string()));
        }
        if self.cache_ttl_minutes > MAX_CACHE_TTL_MINUTES {
            return Err(AnalysisError::InvalidInput(format!(
                "cache TTL of {} minutes exceeds the maximum of {}",
                self.cache_ttl_minutes, MAX_CACHE_TTL_MINUTES
            )));
        }
        if self.max_text_chars == 0 {
            return Err(AnalysisError::InvalidInput("maximum text length must be positive".to_string()));
        }
        for (i, feed) in self.feeds.iter().enumerate() {
            if self.feeds[..i].iter().any(|other| other.feed_id == feed.feed_id) {
                return Err(AnalysisError::InvalidInput(format!("duplicate feed identifier: {}", feed.feed_id)));
            }
        }
        Ok(())
    }
}

/// Parses `id=url` pairs separated by commas. The display name defaults to the identifier
/// with underscores replaced and words capitalised.
pub fn parse_feed_list(raw: &str) -> Result<Vec<FeedInfo>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (id, url) = pair
                .split_once('=')
                .ok_or_else(|| AnalysisError::InvalidInput(format!("feed entry must be id=url: {pair}")))?;
            let id = id.trim();
            if id.is_empty() {
                return Err(AnalysisError::InvalidInput(format!("feed entry has an empty identifier: {pair}")));
            }
            let url = Url::parse(url.trim())
                .map_err(|e| AnalysisError::InvalidInput(format!("feed '{id}' has an invalid URL: {e}")))?;
            Ok(FeedInfo {
                feed_id: id.to_string(),
                display_name: display_name_for(id),
                url,
            })
        })
        .collect()
}

fn display_name_for(feed_id: &str) -> String {
    feed_id
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AnalysisError::InvalidInput(format!("{key} has an invalid value: {raw}")))
}
