use std::sync::{Arc, Once};

use news_analysis::samples::{sample_texts, split_qa_sample};
use news_analysis::strategies::{
    builtin, EmotionStrategy, NerStrategy, QaStrategy, SentimentStrategy, SummarizationStrategy,
};
use news_analysis::{AnalysisError, AnalysisResult, AnalysisStrategy, Interpretation, Result, TaskKind};
use tracing::info;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

#[tokio::test]
async fn test_sentiment_follows_polarity_thresholds() -> Result<()> {
    init_tracing();
    let strategy = SentimentStrategy::new();

    let cases = [
        ("I love this product! It works perfectly.", Interpretation::Positive),
        ("This is the worst experience I've ever had.", Interpretation::Negative),
        ("The food was cold and tasteless.", Interpretation::Negative),
        ("The meeting is on the third floor.", Interpretation::Neutral),
        ("The service was not good.", Interpretation::Negative),
    ];

    for (text, expected) in cases {
        let AnalysisResult::Sentiment(result) = strategy.analyze(text, None).await? else {
            panic!("sentiment strategy returned another result kind");
        };
        info!("{} -> {:?}", text, result);
        assert_eq!(result.interpretation, expected, "{text}");
    }

    for text in sample_texts(TaskKind::Sentiment) {
        let AnalysisResult::Sentiment(result) = strategy.analyze(text, None).await? else {
            panic!("sentiment strategy returned another result kind");
        };
        assert!((-1.0..=1.0).contains(&result.polarity));
        assert!((0.0..=1.0).contains(&result.subjectivity));
        assert_eq!(result.interpretation, Interpretation::from_polarity(result.polarity));
    }
    Ok(())
}

#[tokio::test]
async fn test_ner_labels_sample_sentences() -> Result<()> {
    init_tracing();
    let strategy = NerStrategy::new();

    let AnalysisResult::Ner(result) = strategy.analyze("Elon Musk founded SpaceX.", None).await? else {
        panic!("ner strategy returned another result kind");
    };
    assert_eq!(result.total, 2);
    assert_eq!(result.entities["PERSON"][0].text, "Elon Musk");
    assert_eq!(result.entities["ORG"][0].text, "SpaceX");
    assert!(result.labels.contains("PERSON") && result.labels.contains("ORG"));

    let AnalysisResult::Ner(result) = strategy.analyze("The Olympics will be held in Tokyo.", None).await? else {
        panic!("ner strategy returned another result kind");
    };
    assert_eq!(result.entities["EVENT"][0].text, "Olympics");
    assert_eq!(result.entities["GPE"][0].text, "Tokyo");
    Ok(())
}

#[tokio::test]
async fn test_ner_offsets_count_characters() -> Result<()> {
    init_tracing();
    let text = "Ça va. Barack Obama visited Paris.";
    let AnalysisResult::Ner(result) = NerStrategy::new().analyze(text, None).await? else {
        panic!("ner strategy returned another result kind");
    };

    let person = &result.entities["PERSON"][0];
    assert_eq!((person.text.as_str(), person.start, person.end), ("Barack Obama", 7, 19));
    let place = &result.entities["GPE"][0];
    assert_eq!((place.start, place.end), (28, 33));

    let chars: Vec<char> = text.chars().collect();
    let sliced: String = chars[place.start..place.end].iter().collect();
    assert_eq!(sliced, "Paris");
    Ok(())
}

#[tokio::test]
async fn test_short_text_is_echoed_with_note() -> Result<()> {
    init_tracing();
    let text = "Short texts are returned unchanged.";
    let AnalysisResult::Summarize(result) = SummarizationStrategy::new().analyze(text, None).await? else {
        panic!("summarization strategy returned another result kind");
    };

    assert_eq!(result.summary, text);
    assert_eq!(result.original_length, 5);
    assert_eq!(result.summary_length, 5);
    assert!(result.note.is_some());
    Ok(())
}

#[tokio::test]
async fn test_long_text_is_summarised_within_budget() -> Result<()> {
    init_tracing();
    let strategy = SummarizationStrategy::new();

    for text in sample_texts(TaskKind::Summarize) {
        let AnalysisResult::Summarize(result) = strategy.analyze(text, None).await? else {
            panic!("summarization strategy returned another result kind");
        };
        info!("Summary: {}", result.summary);
        assert!(result.original_length >= 50);
        assert!(result.note.is_none());
        assert!(!result.summary.is_empty());
        assert!(result.summary_length <= result.original_length);
        assert!(result.summary_length <= 60);
        let first_sentence = result.summary.split(". ").next().unwrap_or_default();
        assert!(text.contains(first_sentence));
    }
    Ok(())
}

#[tokio::test]
async fn test_emotion_covers_every_label() -> Result<()> {
    init_tracing();
    let strategy = EmotionStrategy::new();

    let cases = [
        ("I'm furious about what happened yesterday.", "anger"),
        ("This news makes me really sad.", "sadness"),
        ("I'm terrified of spiders.", "fear"),
        ("I am so excited for my birthday party!", "joy"),
    ];

    for (text, expected) in cases {
        let AnalysisResult::Emotion(result) = strategy.analyze(text, None).await? else {
            panic!("emotion strategy returned another result kind");
        };
        assert_eq!(result.primary, expected, "{text}");
        assert_eq!(result.scores.len(), 6);
        assert_eq!(result.confidence, result.scores[0].score);
        assert!(result.scores.windows(2).all(|pair| pair[0].score >= pair[1].score));

        let total: f64 = result.scores.iter().map(|s| s.score).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
    Ok(())
}

#[tokio::test]
async fn test_qa_requires_context() {
    init_tracing();
    let strategy = QaStrategy::new();

    for context in [None, Some(""), Some("   ")] {
        let err = strategy.analyze("Who wrote Hamlet?", context).await.unwrap_err();
        assert_eq!(err, AnalysisError::MissingContext { task: TaskKind::Qa });
    }
}

#[tokio::test]
async fn test_qa_answers_sample_questions() -> Result<()> {
    init_tracing();
    let strategy = QaStrategy::new();

    let expected = [
        ("What is the capital of France?", "Paris"),
        ("Who wrote Hamlet?", "William Shakespeare"),
        ("What is the boiling point of water?", "100 degrees Celsius"),
        ("What year did the first man land on the moon?", "1969"),
    ];

    for (question, answer) in expected {
        let sample = sample_texts(TaskKind::Qa)
            .iter()
            .find(|sample| sample.starts_with(question))
            .expect("sample exists");
        let (question, context) = split_qa_sample(sample);
        let context = context.expect("sample has context");

        let AnalysisResult::Qa(result) = strategy.analyze(question, Some(context)).await? else {
            panic!("qa strategy returned another result kind");
        };
        info!("{} -> {:?}", question, result);
        assert_eq!(result.answer, answer);
        assert_eq!(&context[result.start..result.end], answer);
        assert!(result.score > 0.0 && result.score <= 1.0);
    }
    Ok(())
}

#[tokio::test]
async fn test_empty_text_is_rejected_by_every_strategy() {
    init_tracing();
    for kind in TaskKind::ALL {
        let strategy = builtin(kind);
        let err = strategy.analyze("  \n ", Some("some context")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)), "{kind}: {err:?}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_use_gives_identical_results() {
    init_tracing();
    let strategy: Arc<dyn AnalysisStrategy> = Arc::new(SentimentStrategy::new());

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let strategy = Arc::clone(&strategy);
            tokio::spawn(async move { strategy.analyze("What a wonderful, happy day!", None).await })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
}
