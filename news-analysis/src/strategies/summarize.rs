//! Extractive summarisation.
//!
//! Sentences are scored by the document frequency of their content terms and the best
//! ones are kept, in their original order, until the word budget is spent.

use std::collections::HashMap;

use async_trait::async_trait;

use super::require_text;
use crate::model::LazyModel;
use crate::text::{content_terms, split_sentences, word_count};
use crate::traits::AnalysisStrategy;
use crate::types::{AnalysisResult, Result, SummaryResult, TaskKind};

/// Inputs shorter than this are echoed back instead of summarised.
pub const MIN_SUMMARY_WORDS: usize = 50;
pub const SUMMARY_WORD_BUDGET: usize = 60;
const LEAD_BONUS: f64 = 1.25;

pub const TOO_SHORT_NOTE: &str = "Text is too short to summarise (fewer than 50 words); showing the original text.";

pub struct Summarizer {
    budget: usize,
}

impl Summarizer {
    fn load() -> Result<Self> {
        Ok(Self {
            budget: SUMMARY_WORD_BUDGET,
        })
    }

    pub fn summarize(&self, text: &str) -> SummaryResult {
        let original_length = word_count(text);
        if original_length < MIN_SUMMARY_WORDS {
            return SummaryResult {
                summary: text.to_string(),
                original_length,
                summary_length: original_length,
                note: Some(TOO_SHORT_NOTE.to_string()),
            };
        }

        let sentences: Vec<&str> = split_sentences(text).into_iter().map(|r| &text[r]).collect();

        let mut frequencies: HashMap<String, f64> = HashMap::new();
        for term in content_terms(text) {
            *frequencies.entry(term).or_default() += 1.0;
        }
        let max = frequencies.values().copied().fold(1.0, f64::max);

        let mut ranked: Vec<(usize, f64)> = sentences
            .iter()
            .enumerate()
            .map(|(i, sentence)| {
                let terms = content_terms(sentence);
                let total: f64 = terms.iter().map(|t| frequencies.get(t).copied().unwrap_or(0.0) / max).sum();
                let mut score = if terms.is_empty() { 0.0 } else { total / (terms.len() as f64).sqrt() };
                if i == 0 {
                    score *= LEAD_BONUS;
                }
                (i, score)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut chosen = Vec::new();
        let mut used = 0;
        for (i, _) in &ranked {
            let words = word_count(sentences[*i]);
            if used + words <= self.budget {
                chosen.push(*i);
                used += words;
            }
        }

        let summary = if chosen.is_empty() {
            // Every sentence is longer than the budget; cut the best one down
            let best = ranked.first().map_or(text, |(i, _)| sentences[*i]);
            let mut cut = best.split_whitespace().take(self.budget).collect::<Vec<_>>().join(" ");
            cut.push('…');
            cut
        } else {
            chosen.sort_unstable();
            chosen.iter().map(|i| sentences[*i]).collect::<Vec<_>>().join(" ")
        };

        SummaryResult {
            summary_length: word_count(&summary),
            summary,
            original_length,
            note: None,
        }
    }
}

pub struct SummarizationStrategy {
    model: LazyModel<Summarizer>,
}

impl SummarizationStrategy {
    pub fn new() -> Self {
        Self {
            model: LazyModel::new("extractive-summarizer", Summarizer::load),
        }
    }
}

impl Default for SummarizationStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisStrategy for SummarizationStrategy {
    fn kind(&self) -> TaskKind {
        TaskKind::Summarize
    }

    async fn analyze(&self, text: &str, _context: Option<&str>) -> Result<AnalysisResult> {
        require_text(self.kind(), text)?;
        let summarizer = self.model.get().await?;
        Ok(AnalysisResult::Summarize(summarizer.summarize(text)))
    }

    async fn warm_up(&self) -> Result<()> {
        self.model.get().await.map(|_| ())
    }
}
