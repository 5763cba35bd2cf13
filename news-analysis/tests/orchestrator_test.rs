use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use news_analysis::samples::sample_texts;
use news_analysis::strategies::builtin;
use news_analysis::{
    AnalysisError, AnalysisOrchestrator, AnalysisResult, AnalysisStrategy, Article, FeedCache, FeedInfo,
    FeedSource, Interpretation, Result, SentimentResult, StrategyRegistry, SummaryResult, TaskKind,
};
use tracing::info;
use url::Url;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

/// Records every call and answers with a fixed result of its kind.
struct RecordingStrategy {
    kind: TaskKind,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingStrategy {
    fn new(kind: TaskKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisStrategy for RecordingStrategy {
    fn kind(&self) -> TaskKind {
        self.kind
    }

    async fn analyze(&self, text: &str, context: Option<&str>) -> Result<AnalysisResult> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), context.map(str::to_string)));
        Ok(match self.kind {
            TaskKind::Summarize => AnalysisResult::Summarize(SummaryResult {
                summary: text.to_string(),
                original_length: 1,
                summary_length: 1,
                note: None,
            }),
            _ => AnalysisResult::Sentiment(SentimentResult {
                polarity: 0.0,
                subjectivity: 0.0,
                interpretation: Interpretation::Neutral,
            }),
        })
    }
}

struct PanickingStrategy;

#[async_trait]
impl AnalysisStrategy for PanickingStrategy {
    fn kind(&self) -> TaskKind {
        TaskKind::Emotion
    }

    async fn analyze(&self, _text: &str, _context: Option<&str>) -> Result<AnalysisResult> {
        panic!("classifier weights are corrupt");
    }
}

/// Serves two articles per feed: one with a resolved body, one with only a summary.
#[derive(Default)]
struct FakeSource {
    fetches: AtomicUsize,
    failing: AtomicBool,
}

#[async_trait]
impl FeedSource for FakeSource {
    async fn fetch(&self, source_url: &Url, _resolve_full_text: bool) -> Result<Vec<Article>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AnalysisError::FeedUnavailable {
                source_url: source_url.to_string(),
                cause: "HTTP 503 Service Unavailable".to_string(),
            });
        }
        Ok(vec![
            Article {
                title: "Budget passes".to_string(),
                link: source_url.join("/news/budget").unwrap(),
                published: None,
                summary: Some("The budget passed.".to_string()),
                full_text: Some(
                    "The federal budget passed the Senate on Thursday. Treasurer Jim Chalmers welcomed the result."
                        .to_string(),
                ),
            },
            Article {
                title: "Storm warning".to_string(),
                link: source_url.join("/news/storm").unwrap(),
                published: None,
                summary: Some("A severe storm is expected in Sydney tonight.".to_string()),
                full_text: None,
            },
        ])
    }
}

fn feed_cache(source: Arc<FakeSource>) -> Arc<FeedCache> {
    let feeds = vec![FeedInfo {
        feed_id: "top_stories".to_string(),
        display_name: "Top Stories".to_string(),
        url: Url::parse("https://feeds.example.org/top.xml").unwrap(),
    }];
    Arc::new(FeedCache::new(feeds, Duration::from_secs(600), source).unwrap())
}

fn orchestrator_with(registry: StrategyRegistry) -> AnalysisOrchestrator {
    AnalysisOrchestrator::new(Arc::new(registry), feed_cache(Arc::new(FakeSource::default())))
}

#[tokio::test]
async fn test_run_many_reports_every_requested_task() {
    init_tracing();
    let orchestrator = orchestrator_with(StrategyRegistry::with_builtin());

    let results = orchestrator
        .run_many(["sentiment", "ner", "nonexistent"], "Barack Obama visited Paris.", None)
        .await;

    assert_eq!(results.len(), 3);
    assert!(matches!(results["sentiment"], Ok(AnalysisResult::Sentiment(_))));
    assert!(matches!(results["ner"], Ok(AnalysisResult::Ner(_))));
    assert_eq!(
        results["nonexistent"],
        Err(AnalysisError::UnknownTask("nonexistent".to_string()))
    );
}

#[tokio::test]
async fn test_run_many_runs_duplicate_tasks_once() {
    init_tracing();
    let sentiment = RecordingStrategy::new(TaskKind::Sentiment);
    let mut registry = StrategyRegistry::new();
    registry.register(sentiment.clone()).unwrap();
    let orchestrator = orchestrator_with(registry);

    let results = orchestrator
        .run_many(vec!["sentiment".to_string(), "sentiment".to_string()], "Good news.", None)
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(sentiment.calls().len(), 1);
}

#[tokio::test]
async fn test_run_one_validates_input() {
    init_tracing();
    let orchestrator = orchestrator_with(StrategyRegistry::with_builtin()).with_max_text_chars(20);

    let err = orchestrator.run_one("sentiment", " \t", None).await.unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(_)));

    let err = orchestrator
        .run_one("sentiment", "This sentence is longer than twenty characters.", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(_)));

    let err = orchestrator
        .run_one("qa", "Where?", Some("This context is far longer than twenty characters."))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(_)));

    let err = orchestrator.run_one("sentiment!", "Fine.", None).await.unwrap_err();
    assert_eq!(err, AnalysisError::UnknownTask("sentiment!".to_string()));

    // The limit counts characters, not bytes
    assert!(orchestrator.run_one("sentiment", &"é".repeat(20), None).await.is_ok());
}

#[tokio::test]
async fn test_compare_all_matches_individual_runs() -> Result<()> {
    init_tracing();
    let orchestrator = orchestrator_with(StrategyRegistry::with_builtin());
    let text = sample_texts(TaskKind::Summarize)[0];

    let report = orchestrator.compare_all(text).await;
    let ids: Vec<&str> = report.entries.iter().map(|e| e.task_id.as_str()).collect();
    assert_eq!(ids, ["sentiment", "ner", "summarize", "emotion", "qa"]);
    assert_eq!(report.succeeded(), 4);

    let qa = report.get("qa").unwrap();
    assert!(!qa.success);
    assert_eq!(qa.outcome, Err(AnalysisError::MissingContext { task: TaskKind::Qa }));

    for entry in report.entries.iter().filter(|e| e.success) {
        let single = orchestrator.run_one(&entry.task_id, text, None).await?;
        assert_eq!(entry.outcome.as_ref().ok(), Some(&single), "{}", entry.task_id);
        info!("{} took {:?}", entry.display_name, entry.elapsed);
    }

    let reports = report.to_reports();
    assert_eq!(reports.len(), 5);
    assert!(reports.iter().all(|r| r.elapsed_ms.is_some()));
    assert_eq!(reports[4].failure.as_ref().unwrap().kind, "MissingContext");
    Ok(())
}

#[tokio::test]
async fn test_panicking_strategy_only_fails_its_own_task() {
    init_tracing();
    let mut registry = StrategyRegistry::new();
    registry.register(builtin(TaskKind::Sentiment)).unwrap();
    registry.register(Arc::new(PanickingStrategy)).unwrap();
    let orchestrator = orchestrator_with(registry);

    let results = orchestrator
        .run_many(["sentiment", "emotion"], "What a lovely morning.", None)
        .await;
    assert!(results["sentiment"].is_ok());
    match &results["emotion"] {
        Err(AnalysisError::ModelFailure { task, message }) => {
            assert_eq!(task, "emotion");
            assert_eq!(message, "classifier weights are corrupt");
        }
        other => panic!("expected a model failure, got {other:?}"),
    }

    let report = orchestrator.compare_all("What a lovely morning.").await;
    assert_eq!(report.len(), 2);
    assert_eq!(report.succeeded(), 1);
}

#[tokio::test]
async fn test_article_index_out_of_range_runs_no_task() {
    init_tracing();
    let sentiment = RecordingStrategy::new(TaskKind::Sentiment);
    let mut registry = StrategyRegistry::new();
    registry.register(sentiment.clone()).unwrap();
    let orchestrator = orchestrator_with(registry);

    let err = orchestrator
        .analyze_article("top_stories", 999, ["sentiment"], None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AnalysisError::ArticleNotFound {
            feed_id: "top_stories".to_string(),
            index: 999,
            available: 2,
        }
    );
    assert!(sentiment.calls().is_empty());
}

#[tokio::test]
async fn test_article_question_is_routed_to_qa() -> Result<()> {
    init_tracing();
    let qa = RecordingStrategy::new(TaskKind::Qa);
    let sentiment = RecordingStrategy::new(TaskKind::Sentiment);
    let mut registry = StrategyRegistry::new();
    registry.register(qa.clone())?;
    registry.register(sentiment.clone())?;
    let orchestrator = orchestrator_with(registry);

    let analysis = orchestrator
        .analyze_article("top_stories", 0, ["qa", "sentiment"], Some("  Who welcomed the result? "))
        .await?;

    let body = "The federal budget passed the Senate on Thursday. Treasurer Jim Chalmers welcomed the result.";
    assert_eq!(analysis.subject, body);
    assert_eq!(
        qa.calls(),
        [("Who welcomed the result?".to_string(), Some(body.to_string()))]
    );
    assert_eq!(sentiment.calls(), [(body.to_string(), None)]);
    assert_eq!(analysis.results.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_article_without_question_gives_qa_no_context() -> Result<()> {
    init_tracing();
    let orchestrator = orchestrator_with(StrategyRegistry::with_builtin());

    let analysis = orchestrator
        .analyze_article("top_stories", 1, ["qa", "ner"], Some("   "))
        .await?;
    assert_eq!(analysis.subject, "A severe storm is expected in Sydney tonight.");
    assert_eq!(
        analysis.results["qa"],
        Err(AnalysisError::MissingContext { task: TaskKind::Qa })
    );
    let Ok(AnalysisResult::Ner(entities)) = &analysis.results["ner"] else {
        panic!("ner failed: {:?}", analysis.results["ner"]);
    };
    assert_eq!(entities.entities["GPE"][0].text, "Sydney");
    Ok(())
}

#[tokio::test]
async fn test_article_subject_is_truncated_to_the_limit() -> Result<()> {
    init_tracing();
    let summarize = RecordingStrategy::new(TaskKind::Summarize);
    let mut registry = StrategyRegistry::new();
    registry.register(summarize.clone())?;
    let orchestrator = orchestrator_with(registry).with_max_text_chars(60);

    let analysis = orchestrator
        .analyze_article("top_stories", 0, ["summarize"], None)
        .await?;
    assert_eq!(analysis.subject, "The federal budget passed the Senate on Thursday.");
    assert_eq!(summarize.calls()[0].0, analysis.subject);
    Ok(())
}

#[tokio::test]
async fn test_feed_errors_fail_the_whole_article_call() {
    init_tracing();
    let source = Arc::new(FakeSource::default());
    source.failing.store(true, Ordering::SeqCst);
    let orchestrator = AnalysisOrchestrator::new(
        Arc::new(StrategyRegistry::with_builtin()),
        feed_cache(source.clone()),
    );

    let err = orchestrator
        .analyze_article("sport", 0, ["sentiment"], None)
        .await
        .unwrap_err();
    assert_eq!(err, AnalysisError::UnknownFeed("sport".to_string()));
    assert_eq!(source.fetches.load(Ordering::SeqCst), 0);

    let err = orchestrator
        .analyze_article("top_stories", 0, ["sentiment"], None)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::FeedUnavailable { .. }), "{err:?}");
}

#[tokio::test]
async fn test_article_view_serializes_every_result() -> Result<()> {
    init_tracing();
    let orchestrator = orchestrator_with(StrategyRegistry::with_builtin());

    let analysis = orchestrator
        .analyze_article("top_stories", 1, ["sentiment", "bogus"], None)
        .await?;
    let json = serde_json::to_value(analysis.view()).unwrap();

    assert_eq!(json["feed_id"], "top_stories");
    assert_eq!(json["article"]["title"], "Storm warning");
    assert_eq!(json["results"][0]["task_id"], "bogus");
    assert_eq!(json["results"][0]["failure"]["kind"], "UnknownTask");
    assert_eq!(json["results"][1]["result"]["task"], "sentiment");
    Ok(())
}
