use std::sync::Arc;

use news_analysis::strategies::{builtin, SentimentStrategy};
use news_analysis::{AnalysisError, StrategyRegistry, TaskKind};

#[test]
fn test_builtin_registry_lists_tasks_in_registration_order() {
    let registry = StrategyRegistry::with_builtin();
    let tasks = registry.list_tasks();

    let ids: Vec<&str> = tasks.iter().map(|t| t.task_id.as_str()).collect();
    assert_eq!(ids, ["sentiment", "ner", "summarize", "emotion", "qa"]);
    assert_eq!(tasks[0].display_name, "Sentiment Analysis");
    assert_eq!(tasks[4].display_name, "Question Answering");
    assert_eq!(registry.len(), 5);
}

#[test]
fn test_every_listed_task_resolves() {
    let registry = StrategyRegistry::default();
    for task in registry.list_tasks() {
        let strategy = registry.resolve(&task.task_id).expect("listed task resolves");
        assert_eq!(strategy.kind().as_str(), task.task_id);
    }
}

#[test]
fn test_unknown_task_is_reported() {
    let registry = StrategyRegistry::with_builtin();
    for task_id in ["nonexistent", "", "Sentiment"] {
        match registry.resolve(task_id) {
            Err(AnalysisError::UnknownTask(id)) => assert_eq!(id, task_id),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("'{task_id}' should not resolve"),
        }
    }
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let mut registry = StrategyRegistry::new();
    assert!(registry.is_empty());

    registry.register(Arc::new(SentimentStrategy::new())).unwrap();
    let err = registry.register(builtin(TaskKind::Sentiment)).unwrap_err();
    assert_eq!(err, AnalysisError::DuplicateTask("sentiment".to_string()));

    registry.register(builtin(TaskKind::Qa)).unwrap();
    assert_eq!(registry.task_ids(), ["sentiment", "qa"]);
    assert!(registry.contains("qa"));
    assert!(!registry.contains("ner"));
}

#[tokio::test]
async fn test_warm_up_loads_every_model() {
    let registry = StrategyRegistry::with_builtin();
    registry.warm_up().await.unwrap();
}
