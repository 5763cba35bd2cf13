//! Lexicon-based polarity and subjectivity scoring.
//!
//! Each known word carries a (polarity, subjectivity) pair. A preceding intensifier scales
//! the pair and a negation within the previous three words flips and halves the polarity.
//! The document scores are the means over all matched words.

use std::collections::HashMap;

use async_trait::async_trait;

use super::require_text;
use crate::model::LazyModel;
use crate::text::tokens;
use crate::traits::AnalysisStrategy;
use crate::types::{AnalysisResult, Interpretation, Result, SentimentResult, TaskKind};

const LEXICON: &[(&str, f64, f64)] = &[
    // positive
    ("love", 0.5, 0.6),
    ("loved", 0.7, 0.8),
    ("lovely", 0.5, 0.75),
    ("like", 0.1, 0.2),
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("excellent", 1.0, 1.0),
    ("amazing", 0.6, 0.9),
    ("awesome", 1.0, 1.0),
    ("fantastic", 0.4, 0.9),
    ("wonderful", 1.0, 1.0),
    ("perfect", 1.0, 1.0),
    ("perfectly", 1.0, 1.0),
    ("best", 1.0, 0.3),
    ("better", 0.5, 0.5),
    ("nice", 0.6, 1.0),
    ("happy", 0.8, 1.0),
    ("glad", 0.5, 1.0),
    ("pleased", 0.5, 1.0),
    ("delighted", 0.7, 0.7),
    ("enjoy", 0.4, 0.5),
    ("enjoyed", 0.4, 0.5),
    ("beautiful", 0.85, 1.0),
    ("brilliant", 0.9, 1.0),
    ("superb", 1.0, 1.0),
    ("positive", 0.23, 0.55),
    ("successful", 0.75, 0.95),
    ("success", 0.3, 0.5),
    ("strong", 0.43, 0.73),
    ("win", 0.8, 0.4),
    ("wins", 0.8, 0.4),
    ("won", 0.6, 0.4),
    ("fun", 0.3, 0.2),
    ("funny", 0.25, 1.0),
    ("hilarious", 0.5, 1.0),
    ("exciting", 0.3, 0.8),
    ("excited", 0.375, 0.75),
    ("grateful", 0.5, 0.9),
    ("proud", 0.8, 1.0),
    ("helpful", 0.5, 0.5),
    ("recommend", 0.3, 0.5),
    ("easy", 0.43, 0.83),
    ("calm", 0.3, 0.75),
    ("relaxed", 0.3, 0.5),
    ("popular", 0.6, 0.8),
    ("safe", 0.5, 0.5),
    ("affordable", 0.3, 0.6),
    ("improve", 0.3, 0.5),
    ("improved", 0.4, 0.5),
    ("efficient", 0.4, 0.6),
    ("innovative", 0.5, 0.6),
    ("impressive", 0.9, 1.0),
    ("satisfied", 0.5, 1.0),
    ("sure", 0.5, 0.89),
    ("okay", 0.5, 0.5),
    ("ok", 0.5, 0.5),
    ("fine", 0.4, 0.5),
    ("special", 0.36, 0.57),
    ("favourite", 0.5, 1.0),
    ("favorite", 0.5, 1.0),
    ("incredible", 0.9, 0.9),
    ("outstanding", 0.5, 0.67),
    ("remarkable", 0.75, 0.75),
    ("hopeful", 0.5, 0.6),
    ("thrilled", 0.6, 0.8),
    ("welcome", 0.8, 0.9),
    ("boost", 0.3, 0.4),
    ("praised", 0.5, 0.6),
    // negative
    ("hate", -0.8, 0.9),
    ("hated", -0.9, 0.7),
    ("bad", -0.7, 0.67),
    ("worse", -0.4, 0.6),
    ("worst", -1.0, 1.0),
    ("terrible", -1.0, 1.0),
    ("awful", -1.0, 1.0),
    ("horrible", -1.0, 1.0),
    ("poor", -0.4, 0.6),
    ("sad", -0.5, 1.0),
    ("angry", -0.5, 1.0),
    ("furious", -0.6, 0.9),
    ("disappointed", -0.75, 0.75),
    ("disappointing", -0.6, 0.7),
    ("boring", -1.0, 1.0),
    ("cold", -0.6, 1.0),
    ("tasteless", -0.5, 0.8),
    ("ugly", -0.7, 1.0),
    ("wrong", -0.5, 0.9),
    ("broken", -0.4, 0.5),
    ("fail", -0.5, 0.5),
    ("failed", -0.5, 0.3),
    ("failure", -0.32, 0.3),
    ("terrified", -1.0, 1.0),
    ("scary", -0.5, 1.0),
    ("afraid", -0.6, 0.9),
    ("anxious", -0.25, 1.0),
    ("worried", -0.4, 0.7),
    ("stupid", -0.8, 1.0),
    ("useless", -0.5, 0.2),
    ("annoying", -0.8, 0.9),
    ("dangerous", -0.6, 0.9),
    ("crisis", -0.4, 0.5),
    ("catastrophic", -0.8, 0.9),
    ("crash", -0.5, 0.6),
    ("collapse", -0.5, 0.5),
    ("decline", -0.3, 0.4),
    ("loss", -0.4, 0.4),
    ("threat", -0.4, 0.5),
    ("violent", -0.8, 0.8),
    ("tragic", -0.75, 0.75),
    ("unfortunately", -0.5, 1.0),
    ("slow", -0.3, 0.4),
    ("difficult", -0.5, 1.0),
    ("expensive", -0.5, 0.7),
    ("average", -0.15, 0.4),
    ("mediocre", -0.5, 0.7),
    ("miserable", -1.0, 1.0),
    ("painful", -0.7, 0.9),
    ("shocking", -0.8, 0.9),
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("extremely", 1.5),
    ("so", 1.3),
    ("absolutely", 1.4),
    ("incredibly", 1.5),
    ("totally", 1.3),
    ("quite", 1.1),
    ("too", 1.2),
    ("super", 1.4),
    ("highly", 1.3),
    ("pretty", 1.1),
    ("truly", 1.3),
    ("slightly", 0.5),
    ("somewhat", 0.7),
    ("barely", 0.3),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "nobody", "nothing", "neither", "nor", "without", "hardly", "cannot", "can't", "don't",
    "doesn't", "didn't", "isn't", "aren't", "wasn't", "weren't", "won't", "wouldn't", "shouldn't", "couldn't", "ain't",
];

/// How many words back a negation still applies.
const NEGATION_WINDOW: usize = 3;
const NEGATION_FACTOR: f64 = -0.5;

pub struct SentimentLexicon {
    words: HashMap<&'static str, (f64, f64)>,
    intensifiers: HashMap<&'static str, f64>,
}

impl SentimentLexicon {
    fn load() -> Result<Self> {
        Ok(Self {
            words: LEXICON.iter().map(|(w, p, s)| (*w, (*p, *s))).collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        })
    }

    pub fn score(&self, text: &str) -> SentimentResult {
        let words: Vec<String> = tokens(text)
            .into_iter()
            .map(|token| token.lower().replace('’', "'"))
            .collect();

        let mut polarities = Vec::new();
        let mut subjectivities = Vec::new();

        for (i, word) in words.iter().enumerate() {
            let Some(&(mut polarity, mut subjectivity)) = self.words.get(word.as_str()) else {
                continue;
            };

            if let Some(factor) = i.checked_sub(1).and_then(|prev| self.intensifiers.get(words[prev].as_str())) {
                polarity *= factor;
                subjectivity *= factor;
            }

            let window = &words[i.saturating_sub(NEGATION_WINDOW)..i];
            if window.iter().any(|w| NEGATIONS.contains(&w.as_str())) {
                polarity *= NEGATION_FACTOR;
            }

            polarities.push(polarity.clamp(-1.0, 1.0));
            subjectivities.push(subjectivity.clamp(0.0, 1.0));
        }

        let polarity = mean(&polarities).clamp(-1.0, 1.0);
        let subjectivity = mean(&subjectivities).clamp(0.0, 1.0);

        SentimentResult {
            polarity,
            subjectivity,
            interpretation: Interpretation::from_polarity(polarity),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub struct SentimentStrategy {
    model: LazyModel<SentimentLexicon>,
}

impl SentimentStrategy {
    pub fn new() -> Self {
        Self {
            model: LazyModel::new("sentiment-lexicon", SentimentLexicon::load),
        }
    }
}

impl Default for SentimentStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisStrategy for SentimentStrategy {
    fn kind(&self) -> TaskKind {
        TaskKind::Sentiment
    }

    async fn analyze(&self, text: &str, _context: Option<&str>) -> Result<AnalysisResult> {
        require_text(self.kind(), text)?;
        let lexicon = self.model.get().await?;
        Ok(AnalysisResult::Sentiment(lexicon.score(text)))
    }

    async fn warm_up(&self) -> Result<()> {
        self.model.get().await.map(|_| ())
    }
}
