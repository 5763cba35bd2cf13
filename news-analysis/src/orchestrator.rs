//! Entry point for the rendering layer: single tasks, batches, comparisons and analysis of
//! cached feed articles.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::FeedCache;
use crate::config::AppConfig;
use crate::registry::StrategyRegistry;
use crate::text::smart_truncate;
use crate::traits::AnalysisStrategy;
use crate::types::{AnalysisError, AnalysisResult, Article, Result, TaskInfo, TaskKind, TaskOutcome, TaskReport};

pub const DEFAULT_MAX_TEXT_CHARS: usize = 10_000;

/// One task's entry in a [`ComparisonReport`].
#[derive(Debug, Clone)]
pub struct TaskComparison {
    pub task_id: String,
    pub display_name: String,
    pub outcome: TaskOutcome,
    pub elapsed: Duration,
    pub success: bool,
}

impl TaskComparison {
    pub fn to_report(&self) -> TaskReport {
        let mut report = task_report(&self.task_id, &self.outcome);
        report.display_name = self.display_name.clone();
        report.elapsed_ms = Some(self.elapsed.as_millis() as u64);
        report
    }
}

/// Every registered task run over the same text, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ComparisonReport {
    pub entries: Vec<TaskComparison>,
}

impl ComparisonReport {
    pub fn get(&self, task_id: &str) -> Option<&TaskComparison> {
        self.entries.iter().find(|entry| entry.task_id == task_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|entry| entry.success).count()
    }

    pub fn to_reports(&self) -> Vec<TaskReport> {
        self.entries.iter().map(TaskComparison::to_report).collect()
    }
}

/// The outcome of analysing one cached article.
#[derive(Debug, Clone)]
pub struct ArticleAnalysis {
    pub feed_id: String,
    pub index: usize,
    pub article: Article,
    /// The text the tasks ran over: the full body if resolved, else the summary.
    pub subject: String,
    pub fetched_at: DateTime<Utc>,
    pub results: BTreeMap<String, TaskOutcome>,
}

#[derive(Serialize)]
pub struct ArticleAnalysisView<'a> {
    pub feed_id: &'a str,
    pub index: usize,
    pub article: &'a Article,
    pub subject: &'a str,
    pub fetched_at: DateTime<Utc>,
    pub results: Vec<TaskReport>,
}

impl ArticleAnalysis {
    pub fn view(&self) -> ArticleAnalysisView<'_> {
        ArticleAnalysisView {
            feed_id: &self.feed_id,
            index: self.index,
            article: &self.article,
            subject: &self.subject,
            fetched_at: self.fetched_at,
            results: reports(&self.results),
        }
    }
}

/// Renderable form of a batch of outcomes.
pub fn reports(results: &BTreeMap<String, TaskOutcome>) -> Vec<TaskReport> {
    results.iter().map(|(task_id, outcome)| task_report(task_id, outcome)).collect()
}

fn task_report(task_id: &str, outcome: &TaskOutcome) -> TaskReport {
    let display_name = task_id
        .parse::<TaskKind>()
        .map(|kind| kind.display_name().to_string())
        .unwrap_or_else(|_| task_id.to_string());
    let (result, failure) = match outcome {
        Ok(result) => (Some(result.clone()), None),
        Err(e) => (None, Some(e.to_failure())),
    };
    TaskReport {
        task_id: task_id.to_string(),
        display_name,
        result,
        failure,
        elapsed_ms: None,
    }
}

pub struct AnalysisOrchestrator {
    registry: Arc<StrategyRegistry>,
    cache: Arc<FeedCache>,
    max_text_chars: usize,
}

impl AnalysisOrchestrator {
    pub fn new(registry: Arc<StrategyRegistry>, cache: Arc<FeedCache>) -> Self {
        Self {
            registry,
            cache,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
        }
    }

    pub fn from_config(config: &AppConfig, registry: Arc<StrategyRegistry>, cache: Arc<FeedCache>) -> Self {
        Self::new(registry, cache).with_max_text_chars(config.max_text_chars)
    }

    pub fn with_max_text_chars(mut self, max_text_chars: usize) -> Self {
        self.max_text_chars = max_text_chars;
        self
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    pub fn list_tasks(&self) -> Vec<TaskInfo> {
        self.registry.list_tasks()
    }

    /// Run a single task. Failures are returned directly.
    pub async fn run_one(&self, task_id: &str, text: &str, context: Option<&str>) -> Result<AnalysisResult> {
        let strategy = self.registry.resolve(task_id)?;
        self.validate(text, context)?;
        invoke(strategy.as_ref(), text, context).await
    }

    /// Run several tasks over the same input. The map holds exactly one outcome per
    /// distinct requested task; a failing task never affects the others.
    pub async fn run_many<I, S>(&self, task_ids: I, text: &str, context: Option<&str>) -> BTreeMap<String, TaskOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let task_ids: BTreeSet<String> = task_ids.into_iter().map(|id| id.as_ref().to_string()).collect();
        debug!("Running {} tasks", task_ids.len());

        let runs = task_ids.iter().map(|task_id| async move {
            let outcome = self.run_one(task_id, text, context).await;
            if let Err(e) = &outcome {
                debug!("Task {} failed: {}", task_id, e);
            }
            (task_id.clone(), outcome)
        });

        join_all(runs).await.into_iter().collect()
    }

    /// Run every registered task over `text`, timing each one.
    pub async fn compare_all(&self, text: &str) -> ComparisonReport {
        let tasks = self.registry.list_tasks();

        let runs = tasks.into_iter().map(|task| async move {
            let started = Instant::now();
            let outcome = self.run_one(&task.task_id, text, None).await;
            let elapsed = started.elapsed();
            TaskComparison {
                success: outcome.is_ok(),
                task_id: task.task_id,
                display_name: task.display_name,
                outcome,
                elapsed,
            }
        });

        let report = ComparisonReport {
            entries: join_all(runs).await,
        };
        info!("Compared {} tasks ({} succeeded)", report.len(), report.succeeded());
        report
    }

    /// Analyse one article of a cached feed. An unknown feed, a feed that cannot be
    /// fetched, or an index out of range fails the whole call before any task runs;
    /// after that, tasks fail independently.
    ///
    /// When `question` is given, the question-answering task receives it as its text and
    /// the article body as its context.
    pub async fn analyze_article<I, S>(
        &self,
        feed_id: &str,
        index: usize,
        task_ids: I,
        question: Option<&str>,
    ) -> Result<ArticleAnalysis>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.cache.get(feed_id).await?;
        let article = entry.article(index).cloned().ok_or_else(|| AnalysisError::ArticleNotFound {
            feed_id: feed_id.to_string(),
            index,
            available: entry.len(),
        })?;

        let body = article.body().unwrap_or_default();
        let subject = smart_truncate(body, self.max_text_chars);
        if subject.len() < body.len() {
            debug!("Truncated article {} of {} for analysis", index, feed_id);
        }

        let question = question.map(str::trim).filter(|q| !q.is_empty());
        let task_ids: BTreeSet<String> = task_ids.into_iter().map(|id| id.as_ref().to_string()).collect();
        let qa = TaskKind::Qa.as_str();

        let subject_ref = subject.as_str();
        let runs = task_ids.iter().map(|task_id| async move {
            let outcome = match question {
                Some(question) if task_id == qa => self.run_one(task_id, question, Some(subject_ref)).await,
                _ => self.run_one(task_id, subject_ref, None).await,
            };
            (task_id.clone(), outcome)
        });
        let results: BTreeMap<String, TaskOutcome> = join_all(runs).await.into_iter().collect();

        info!(
            "Analysed article {} of {} with {} tasks",
            index,
            feed_id,
            results.len()
        );
        Ok(ArticleAnalysis {
            feed_id: feed_id.to_string(),
            index,
            article,
            subject,
            fetched_at: entry.fetched_at,
            results,
        })
    }

    fn validate(&self, text: &str, context: Option<&str>) -> Result<()> {
        if text.trim().is_empty() {
            return Err(AnalysisError::InvalidInput("text must not be empty".to_string()));
        }
        let chars = text.chars().count();
        if chars > self.max_text_chars {
            return Err(AnalysisError::InvalidInput(format!(
                "text is {} characters long; the limit is {}",
                chars, self.max_text_chars
            )));
        }
        if let Some(context) = context {
            let chars = context.chars().count();
            if chars > self.max_text_chars {
                return Err(AnalysisError::InvalidInput(format!(
                    "context is {} characters long; the limit is {}",
                    chars, self.max_text_chars
                )));
            }
        }
        Ok(())
    }
}

/// Run a strategy, turning a panic into a model failure for that task alone.
async fn invoke(strategy: &dyn AnalysisStrategy, text: &str, context: Option<&str>) -> Result<AnalysisResult> {
    let kind = strategy.kind();
    let started = Instant::now();

    let outcome = match AssertUnwindSafe(strategy.analyze(text, context)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!("Strategy {} panicked: {}", kind, message);
            Err(AnalysisError::model(kind.as_str(), message))
        }
    };

    debug!("Task {} finished in {:?}", kind, started.elapsed());
    outcome
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "strategy panicked".to_string())
}
