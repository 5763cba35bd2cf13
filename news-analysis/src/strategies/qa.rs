//! Extractive question answering over a supplied context.
//!
//! The context sentence sharing the most content terms with the question is selected;
//! within it, an entity of the type the question asks for becomes the answer. When no
//! such entity exists the whole sentence is returned with a lower confidence.

use std::collections::HashSet;
use std::ops::Range;

use async_trait::async_trait;

use super::ner::{self, EntityRecognizer};
use super::require_text;
use crate::model::LazyModel;
use crate::text::{char_offset, content_terms, split_sentences, tokens};
use crate::traits::AnalysisStrategy;
use crate::types::{AnalysisError, AnalysisResult, AnswerResult, Result, TaskKind};

const TYPED_FACTOR: f64 = 1.0;
const UNTYPED_FACTOR: f64 = 0.6;
const SENTENCE_FACTOR: f64 = 0.35;

const MEASURE_WORDS: &[&str] = &["tall", "long", "far", "big", "high", "old", "heavy", "deep", "large", "wide"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuestionType {
    Who,
    Where,
    When,
    Count,
    Measure,
    Thing,
}

impl QuestionType {
    fn detect(question: &str) -> Self {
        let words: Vec<String> = tokens(question).iter().map(|t| t.lower()).collect();
        let has = |w: &str| words.iter().any(|word| word == w);

        if followed_by(&words, "how", |next| next == "many") {
            QuestionType::Count
        } else if followed_by(&words, "how", |next| next == "much" || MEASURE_WORDS.contains(&next)) {
            QuestionType::Measure
        } else if has("when") || followed_by(&words, "what", |next| matches!(next, "year" | "date" | "day" | "month")) {
            QuestionType::When
        } else if has("where") {
            QuestionType::Where
        } else if has("who") || has("whom") || has("whose") {
            QuestionType::Who
        } else {
            QuestionType::Thing
        }
    }

    /// Entity labels that answer this kind of question, most preferred first.
    fn labels(self) -> &'static [&'static str] {
        match self {
            QuestionType::Who => &[ner::PERSON, ner::ORG, ner::NORP],
            QuestionType::Where => &[ner::GPE, ner::LOC, ner::FAC],
            QuestionType::When => &[ner::DATE],
            QuestionType::Count => &[ner::CARDINAL, ner::QUANTITY, ner::PERCENT, ner::MONEY],
            QuestionType::Measure => &[ner::QUANTITY, ner::MONEY, ner::PERCENT, ner::CARDINAL],
            QuestionType::Thing => &[],
        }
    }
}

pub struct AnswerExtractor {
    recognizer: EntityRecognizer,
}

impl AnswerExtractor {
    fn load() -> Result<Self> {
        Ok(Self {
            recognizer: EntityRecognizer::load()?,
        })
    }

    pub fn answer(&self, question: &str, context: &str) -> AnswerResult {
        let question_terms: HashSet<String> = content_terms(question).into_iter().collect();
        let question_words: HashSet<String> = tokens(question).iter().map(|t| t.lower()).collect();

        let mut sentences = split_sentences(context);
        if sentences.is_empty() {
            sentences.push(0..context.len());
        }

        let (sentence, overlap) = sentences
            .into_iter()
            .map(|range| {
                let overlap = term_overlap(&question_terms, &context[range.clone()]);
                (range, overlap)
            })
            .fold(None::<(Range<usize>, f64)>, |best, candidate| match best {
                Some(best) if best.1 >= candidate.1 => Some(best),
                _ => Some(candidate),
            })
            .unwrap_or((0..context.len(), 0.0));

        let base = 0.3 + 0.7 * overlap;
        let qtype = QuestionType::detect(question);
        let sentence_text = &context[sentence.clone()];

        let candidates: Vec<_> = self
            .recognizer
            .recognize(sentence_text)
            .into_iter()
            .filter(|e| !mentioned_in_question(&sentence_text[e.start..e.end], &question_words))
            .collect();

        let typed = qtype.labels().iter().find_map(|label| {
            let mut matching = candidates.iter().filter(|e| e.label == *label);
            if qtype == QuestionType::Where {
                let all: Vec<_> = matching.collect();
                all.iter()
                    .find(|e| follows_locative(sentence_text, e.start))
                    .or(all.first())
                    .map(|e| (**e).clone())
            } else {
                matching.next().cloned()
            }
        });

        let (span, factor) = match typed {
            Some(entity) => (entity.start..entity.end, TYPED_FACTOR),
            None if qtype == QuestionType::Thing && !candidates.is_empty() => {
                (candidates[0].start..candidates[0].end, UNTYPED_FACTOR)
            }
            None => (0..sentence_text.len(), SENTENCE_FACTOR),
        };

        let start = sentence.start + span.start;
        let end = sentence.start + span.end;
        AnswerResult {
            answer: context[start..end].to_string(),
            score: (base * factor).clamp(0.0, 1.0),
            start: char_offset(context, start),
            end: char_offset(context, end),
        }
    }
}

fn followed_by(words: &[String], first: &str, next: impl Fn(&str) -> bool) -> bool {
    words.windows(2).any(|pair| pair[0] == first && next(&pair[1]))
}

/// Share of the question's content terms that appear in `sentence`, in [0, 1].
fn term_overlap(question_terms: &HashSet<String>, sentence: &str) -> f64 {
    if question_terms.is_empty() {
        return 0.0;
    }
    let sentence_terms: HashSet<String> = content_terms(sentence).into_iter().collect();
    question_terms.intersection(&sentence_terms).count() as f64 / question_terms.len() as f64
}

fn mentioned_in_question(entity: &str, question_words: &HashSet<String>) -> bool {
    let words = tokens(entity);
    !words.is_empty() && words.iter().all(|w| question_words.contains(&w.lower()))
}

fn follows_locative(text: &str, start: usize) -> bool {
    text[..start]
        .split_whitespace()
        .last()
        .is_some_and(|prev| matches!(prev.to_lowercase().as_str(), "in" | "at" | "from" | "near" | "on"))
}

pub struct QaStrategy {
    model: LazyModel<AnswerExtractor>,
}

impl QaStrategy {
    pub fn new() -> Self {
        Self {
            model: LazyModel::new("answer-extractor", AnswerExtractor::load),
        }
    }
}

impl Default for QaStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisStrategy for QaStrategy {
    fn kind(&self) -> TaskKind {
        TaskKind::Qa
    }

    async fn analyze(&self, text: &str, context: Option<&str>) -> Result<AnalysisResult> {
        let context = context
            .filter(|c| !c.trim().is_empty())
            .ok_or(AnalysisError::MissingContext { task: self.kind() })?;
        require_text(self.kind(), text)?;

        let extractor = self.model.get().await?;
        Ok(AnalysisResult::Qa(extractor.answer(text, context)))
    }

    async fn warm_up(&self) -> Result<()> {
        self.model.get().await.map(|_| ())
    }
}
