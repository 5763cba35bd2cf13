pub mod emotion;
pub mod ner;
pub mod qa;
pub mod sentiment;
pub mod summarize;

use std::sync::Arc;

pub use emotion::EmotionStrategy;
pub use ner::NerStrategy;
pub use qa::QaStrategy;
pub use sentiment::SentimentStrategy;
pub use summarize::SummarizationStrategy;

use crate::traits::AnalysisStrategy;
use crate::types::{AnalysisError, Result, TaskKind};

/// The built-in strategy for `kind`. Adding a task kind without a strategy is a compile
/// error here.
pub fn builtin(kind: TaskKind) -> Arc<dyn AnalysisStrategy> {
    match kind {
        TaskKind::Sentiment => Arc::new(SentimentStrategy::new()),
        TaskKind::Ner => Arc::new(NerStrategy::new()),
        TaskKind::Summarize => Arc::new(SummarizationStrategy::new()),
        TaskKind::Emotion => Arc::new(EmotionStrategy::new()),
        TaskKind::Qa => Arc::new(QaStrategy::new()),
    }
}

pub(crate) fn require_text(kind: TaskKind, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(AnalysisError::InvalidInput(format!("text for '{kind}' must not be empty")));
    }
    Ok(())
}
