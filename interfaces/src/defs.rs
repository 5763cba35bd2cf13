use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// The fixed set of analysis tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Sentiment,
    Ner,
    Summarize,
    Emotion,
    Qa,
}

impl TaskKind {
    /// Every task, in the order the default registry registers them.
    pub const ALL: [TaskKind; 5] = [
        TaskKind::Sentiment,
        TaskKind::Ner,
        TaskKind::Summarize,
        TaskKind::Emotion,
        TaskKind::Qa,
    ];

    /// Stable task identifier used as the registry key.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Sentiment => "sentiment",
            TaskKind::Ner => "ner",
            TaskKind::Summarize => "summarize",
            TaskKind::Emotion => "emotion",
            TaskKind::Qa => "qa",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TaskKind::Sentiment => "Sentiment Analysis",
            TaskKind::Ner => "Named Entity Recognition",
            TaskKind::Summarize => "Summarisation",
            TaskKind::Emotion => "Emotion Classification",
            TaskKind::Qa => "Question Answering",
        }
    }

    /// Whether the task needs auxiliary context alongside its text.
    pub fn requires_context(&self) -> bool {
        matches!(self, TaskKind::Qa)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown task: {s}"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpretation {
    Positive,
    Negative,
    Neutral,
}

impl Interpretation {
    pub const POSITIVE_THRESHOLD: f64 = 0.1;
    pub const NEGATIVE_THRESHOLD: f64 = -0.1;

    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > Self::POSITIVE_THRESHOLD {
            Interpretation::Positive
        } else if polarity < Self::NEGATIVE_THRESHOLD {
            Interpretation::Negative
        } else {
            Interpretation::Neutral
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// In [-1, 1].
    pub polarity: f64,
    /// In [0, 1].
    pub subjectivity: f64,
    pub interpretation: Interpretation,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    /// Character offset of the first character.
    pub start: usize,
    /// Character offset one past the last character.
    pub end: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityResult {
    /// Entity label to spans, each list ordered by start offset.
    pub entities: BTreeMap<String, Vec<EntitySpan>>,
    pub total: usize,
    pub labels: BTreeSet<String>,
}

impl EntityResult {
    pub fn from_entities(entities: BTreeMap<String, Vec<EntitySpan>>) -> Self {
        let total = entities.values().map(Vec::len).sum();
        let labels = entities.keys().cloned().collect();
        Self {
            entities,
            total,
            labels,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    /// Word count of the input.
    pub original_length: usize,
    /// Word count of the summary.
    pub summary_length: usize,
    /// Set when the input was too short to summarise and was echoed back.
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub label: String,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmotionResult {
    /// Every label of the classifier, highest score first.
    pub scores: Vec<EmotionScore>,
    pub primary: String,
    pub confidence: f64,
}

impl EmotionResult {
    /// Sorts the scores and derives the primary label. Ties keep the input order.
    pub fn from_scores(mut scores: Vec<EmotionScore>) -> Self {
        scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        let (primary, confidence) = scores
            .first()
            .map(|top| (top.label.clone(), top.score))
            .unwrap_or_default();
        Self {
            scores,
            primary,
            confidence,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    /// In [0, 1].
    pub score: f64,
    /// Character offsets of the answer inside the context.
    pub start: usize,
    pub end: usize,
}

/// Output of a single analysis task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "lowercase")]
pub enum AnalysisResult {
    Sentiment(SentimentResult),
    Ner(EntityResult),
    Summarize(SummaryResult),
    Emotion(EmotionResult),
    Qa(AnswerResult),
}

impl AnalysisResult {
    pub fn kind(&self) -> TaskKind {
        match self {
            AnalysisResult::Sentiment(_) => TaskKind::Sentiment,
            AnalysisResult::Ner(_) => TaskKind::Ner,
            AnalysisResult::Summarize(_) => TaskKind::Summarize,
            AnalysisResult::Emotion(_) => TaskKind::Emotion,
            AnalysisResult::Qa(_) => TaskKind::Qa,
        }
    }
}

/// A syndicated article. `published` is the date text exactly as the feed supplied it.
/// `full_text` is only populated when body resolution was requested and succeeded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: Url,
    pub published: Option<String>,
    pub summary: Option<String>,
    pub full_text: Option<String>,
}

impl Article {
    /// The text an analysis should run over: the full body when present, else the summary.
    pub fn body(&self) -> Option<&str> {
        self.full_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .or_else(|| self.summary.as_deref().filter(|text| !text.trim().is_empty()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub task_id: String,
    pub display_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedInfo {
    pub feed_id: String,
    pub display_name: String,
    pub url: Url,
}

/// A bounded, renderable description of why an operation failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: String,
    pub message: String,
}

/// One task's outcome as handed to the rendering layer: either a result or a failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub task_id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    /// Wall-clock time the task took, when it was measured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl TaskReport {
    pub fn success(&self) -> bool {
        self.result.is_some()
    }
}
