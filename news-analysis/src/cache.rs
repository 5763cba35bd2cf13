//! Time-boxed cache of fetched feeds with single-flight refresh.
//!
//! Each configured feed has its own slot. A read of a fresh entry never waits. When the
//! entry is missing or expired, one caller fetches while every other caller for the same
//! feed waits and then shares that fetch's outcome, success or failure. If a refresh
//! fails while an older entry exists, the older entry keeps being served.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::traits::FeedSource;
use crate::types::{AnalysisError, Article, FeedInfo, Result};

/// One fetched snapshot of a feed. Entries are replaced on refresh, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedCacheEntry {
    pub feed_id: String,
    pub articles: Vec<Article>,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Distinguishes two fetches that landed on the same timestamp.
    pub fetch_id: Uuid,
}

impl FeedCacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn article(&self, index: usize) -> Option<&Article> {
        self.articles.get(index)
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads answered from a fresh entry without fetching.
    pub hits: u64,
    pub refreshes: u64,
    pub failed_refreshes: u64,
    /// Reads answered with an expired entry because its refresh failed.
    pub stale_serves: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    refreshes: AtomicU64,
    failed_refreshes: AtomicU64,
    stale_serves: AtomicU64,
}

#[derive(Default)]
struct RefreshState {
    /// Error of the most recent fetch, cleared by the next success.
    last_failure: Option<AnalysisError>,
}

struct FeedSlot {
    info: FeedInfo,
    entry: RwLock<Option<Arc<FeedCacheEntry>>>,
    /// Bumped after every completed fetch, successful or not.
    generation: AtomicU64,
    refresh: Mutex<RefreshState>,
}

impl FeedSlot {
    fn new(info: FeedInfo) -> Self {
        Self {
            info,
            entry: RwLock::new(None),
            generation: AtomicU64::new(0),
            refresh: Mutex::new(RefreshState::default()),
        }
    }

    fn current(&self) -> Option<Arc<FeedCacheEntry>> {
        self.entry.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn replace(&self, entry: Option<Arc<FeedCacheEntry>>) {
        *self.entry.write().unwrap_or_else(|e| e.into_inner()) = entry;
    }
}

pub struct FeedCache {
    slots: HashMap<String, FeedSlot>,
    order: Vec<String>,
    ttl: chrono::Duration,
    resolve_full_text: bool,
    source: Arc<dyn FeedSource>,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl FeedCache {
    pub fn new(feeds: Vec<FeedInfo>, ttl: Duration, source: Arc<dyn FeedSource>) -> Result<Self> {
        Self::with_clock(feeds, ttl, source, Arc::new(SystemClock))
    }

    pub fn with_clock(
        feeds: Vec<FeedInfo>,
        ttl: Duration,
        source: Arc<dyn FeedSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AnalysisError::InvalidInput(format!("cache TTL out of range: {e}")))?;

        let mut slots = HashMap::new();
        let mut order = Vec::new();
        for info in feeds {
            let feed_id = info.feed_id.clone();
            if slots.contains_key(&feed_id) {
                return Err(AnalysisError::InvalidInput(format!("feed '{feed_id}' configured twice")));
            }
            order.push(feed_id.clone());
            slots.insert(feed_id, FeedSlot::new(info));
        }

        Ok(Self {
            slots,
            order,
            ttl,
            resolve_full_text: false,
            source,
            clock,
            counters: Counters::default(),
        })
    }

    pub fn from_config(config: &AppConfig, source: Arc<dyn FeedSource>) -> Result<Self> {
        Ok(Self::new(config.feeds.clone(), config.cache_ttl(), source)?.with_full_text(config.resolve_full_text))
    }

    /// Resolve article bodies on every fetch.
    pub fn with_full_text(mut self, resolve_full_text: bool) -> Self {
        self.resolve_full_text = resolve_full_text;
        self
    }

    /// Configured feeds in configuration order.
    pub fn feeds(&self) -> Vec<FeedInfo> {
        self.order
            .iter()
            .filter_map(|id| self.slots.get(id))
            .map(|slot| slot.info.clone())
            .collect()
    }

    pub fn feed_url(&self, feed_id: &str) -> Option<&Url> {
        self.slots.get(feed_id).map(|slot| &slot.info.url)
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// The articles of `feed_id`, fetching them first when nothing fresh is cached.
    pub async fn get(&self, feed_id: &str) -> Result<Arc<FeedCacheEntry>> {
        let slot = self.slot(feed_id)?;

        // Read the generation first so a fetch finishing after this point is noticed below
        let observed = slot.generation.load(Ordering::Acquire);
        if let Some(entry) = slot.current().filter(|e| e.is_fresh(self.clock.now())) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for feed {}", feed_id);
            return Ok(entry);
        }

        let mut state = slot.refresh.lock().await;

        if slot.generation.load(Ordering::Acquire) != observed {
            // Another caller fetched while this one waited; share its outcome
            let current = slot.current();
            if let Some(entry) = current.as_ref().filter(|e| e.is_fresh(self.clock.now())) {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(entry));
            }
            if let Some(failure) = &state.last_failure {
                return self.serve_stale(feed_id, current, failure.clone());
            }
        }

        self.refresh(slot, &mut state).await
    }

    /// The cached entry for `feed_id`, fresh or not, without fetching.
    pub fn peek(&self, feed_id: &str) -> Option<Arc<FeedCacheEntry>> {
        self.slots.get(feed_id).and_then(FeedSlot::current)
    }

    /// Drop the cached entry so the next read fetches.
    pub fn invalidate(&self, feed_id: &str) -> Result<()> {
        self.slot(feed_id)?.replace(None);
        info!("Invalidated cached feed {}", feed_id);
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            refreshes: self.counters.refreshes.load(Ordering::Relaxed),
            failed_refreshes: self.counters.failed_refreshes.load(Ordering::Relaxed),
            stale_serves: self.counters.stale_serves.load(Ordering::Relaxed),
        }
    }

    fn slot(&self, feed_id: &str) -> Result<&FeedSlot> {
        self.slots
            .get(feed_id)
            .ok_or_else(|| AnalysisError::UnknownFeed(feed_id.to_string()))
    }

    /// Fetch with the slot's refresh lock held.
    async fn refresh(&self, slot: &FeedSlot, state: &mut RefreshState) -> Result<Arc<FeedCacheEntry>> {
        let feed_id = slot.info.feed_id.as_str();
        info!("Refreshing feed {} from {}", feed_id, slot.info.url);

        let outcome = self.source.fetch(&slot.info.url, self.resolve_full_text).await;
        let result = match outcome {
            Ok(articles) => {
                let fetched_at = self.clock.now();
                let entry = Arc::new(FeedCacheEntry {
                    feed_id: feed_id.to_string(),
                    articles,
                    fetched_at,
                    expires_at: fetched_at
                        .checked_add_signed(self.ttl)
                        .unwrap_or(DateTime::<Utc>::MAX_UTC),
                    fetch_id: Uuid::new_v4(),
                });
                slot.replace(Some(Arc::clone(&entry)));
                state.last_failure = None;
                self.counters.refreshes.fetch_add(1, Ordering::Relaxed);
                info!("Cached {} articles for feed {}", entry.len(), feed_id);
                Ok(entry)
            }
            Err(e) => {
                state.last_failure = Some(e.clone());
                self.counters.failed_refreshes.fetch_add(1, Ordering::Relaxed);
                self.serve_stale(feed_id, slot.current(), e)
            }
        };

        slot.generation.fetch_add(1, Ordering::Release);
        result
    }

    fn serve_stale(
        &self,
        feed_id: &str,
        previous: Option<Arc<FeedCacheEntry>>,
        failure: AnalysisError,
    ) -> Result<Arc<FeedCacheEntry>> {
        match previous {
            Some(entry) => {
                self.counters.stale_serves.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Refresh of feed {} failed ({}); serving entry fetched at {}",
                    feed_id, failure, entry.fetched_at
                );
                Ok(entry)
            }
            None => {
                error!("Feed {} unavailable: {}", feed_id, failure);
                Err(failure)
            }
        }
    }
}
