//! Six-way emotion classification.
//!
//! Cue words add evidence to one label each; a negated cue is ignored. Evidence plus a
//! small per-label prior becomes a probability distribution through softmax.

use std::collections::HashMap;

use async_trait::async_trait;

use super::require_text;
use crate::model::LazyModel;
use crate::text::{stem, tokens};
use crate::traits::AnalysisStrategy;
use crate::types::{AnalysisResult, EmotionResult, EmotionScore, Result, TaskKind};

pub const EMOTION_LABELS: [&str; 6] = ["sadness", "joy", "love", "anger", "fear", "surprise"];

const PRIORS: [f64; 6] = [0.1, 0.3, 0.0, 0.05, 0.05, 0.0];
const CUE_WEIGHT: f64 = 1.6;
const NEGATION_WINDOW: usize = 3;

const CUES: &[(&str, &str)] = &[
    // sadness
    ("sad", "sadness"), ("unhappy", "sadness"), ("depress", "sadness"), ("depressed", "sadness"),
    ("cry", "sadness"), ("cried", "sadness"), ("tear", "sadness"), ("grief", "sadness"), ("griev", "sadness"),
    ("lonely", "sadness"), ("miss", "sadness"), ("heartbroken", "sadness"), ("mourn", "sadness"),
    ("loss", "sadness"), ("lost", "sadness"), ("sorrow", "sadness"), ("miserable", "sadness"),
    ("disappoint", "sadness"), ("hopeless", "sadness"), ("gloomy", "sadness"), ("regret", "sadness"),
    ("funeral", "sadness"), ("died", "sadness"), ("death", "sadness"),
    // joy
    ("happy", "joy"), ("joy", "joy"), ("glad", "joy"), ("delight", "joy"), ("excit", "joy"),
    ("cheer", "joy"), ("celebrat", "joy"), ("wonderful", "joy"), ("great", "joy"), ("fun", "joy"),
    ("laugh", "joy"), ("smile", "joy"), ("pleas", "joy"), ("thrill", "joy"), ("enjoy", "joy"),
    ("amazing", "joy"), ("fantastic", "joy"), ("proud", "joy"), ("win", "joy"), ("won", "joy"),
    ("success", "joy"), ("grateful", "joy"), ("relief", "joy"), ("relieved", "joy"),
    // love
    ("love", "love"), ("lov", "love"), ("ador", "love"), ("cherish", "love"), ("affection", "love"),
    ("romantic", "love"), ("darling", "love"), ("sweetheart", "love"), ("caring", "love"), ("tender", "love"),
    ("passion", "love"), ("devot", "love"), ("hug", "love"), ("kiss", "love"), ("fond", "love"),
    // anger
    ("angry", "anger"), ("anger", "anger"), ("furious", "anger"), ("rage", "anger"), ("mad", "anger"),
    ("hate", "anger"), ("hated", "anger"), ("annoy", "anger"), ("irritat", "anger"), ("outrage", "anger"),
    ("frustrat", "anger"), ("resent", "anger"), ("hostile", "anger"), ("disgust", "anger"),
    ("unfair", "anger"), ("betray", "anger"), ("slam", "anger"), ("blame", "anger"),
    // fear
    ("afraid", "fear"), ("fear", "fear"), ("scared", "fear"), ("scary", "fear"), ("terrifi", "fear"),
    ("terror", "fear"), ("panic", "fear"), ("anxious", "fear"), ("anxiety", "fear"), ("worri", "fear"),
    ("worry", "fear"), ("nervous", "fear"), ("dread", "fear"), ("threat", "fear"), ("danger", "fear"),
    ("dangerous", "fear"), ("alarm", "fear"), ("frighten", "fear"), ("warn", "fear"), ("risk", "fear"),
    // surprise
    ("surpris", "surprise"), ("shock", "surprise"), ("astonish", "surprise"), ("amaz", "surprise"),
    ("unexpect", "surprise"), ("stun", "surprise"), ("wow", "surprise"), ("sudden", "surprise"),
    ("suddenly", "surprise"), ("startl", "surprise"), ("incredible", "surprise"), ("unbelievable", "surprise"),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "without", "hardly", "don't", "doesn't", "didn't", "isn't", "wasn't", "aren't",
    "weren't", "can't", "cannot", "won't",
];

pub struct EmotionClassifier {
    cues: HashMap<&'static str, usize>,
}

impl EmotionClassifier {
    fn load() -> Result<Self> {
        let cues = CUES
            .iter()
            .filter_map(|(cue, label)| EMOTION_LABELS.iter().position(|l| l == label).map(|i| (*cue, i)))
            .collect();
        Ok(Self { cues })
    }

    fn label_of(&self, word: &str) -> Option<usize> {
        self.cues
            .get(word)
            .or_else(|| self.cues.get(stem(word).as_str()))
            .copied()
    }

    pub fn classify(&self, text: &str) -> EmotionResult {
        let words: Vec<String> = tokens(text)
            .into_iter()
            .map(|token| token.lower().replace('’', "'"))
            .collect();

        let mut logits = PRIORS;
        for (i, word) in words.iter().enumerate() {
            let Some(label) = self.label_of(word) else {
                continue;
            };
            let negated = words[i.saturating_sub(NEGATION_WINDOW)..i]
                .iter()
                .any(|w| NEGATIONS.contains(&w.as_str()));
            if !negated {
                logits[label] += CUE_WEIGHT;
            }
        }

        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = exps.iter().sum();

        let scores = EMOTION_LABELS
            .iter()
            .zip(exps)
            .map(|(label, e)| EmotionScore {
                label: label.to_string(),
                score: e / total,
            })
            .collect();

        EmotionResult::from_scores(scores)
    }
}

pub struct EmotionStrategy {
    model: LazyModel<EmotionClassifier>,
}

impl EmotionStrategy {
    pub fn new() -> Self {
        Self {
            model: LazyModel::new("emotion-classifier", EmotionClassifier::load),
        }
    }
}

impl Default for EmotionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisStrategy for EmotionStrategy {
    fn kind(&self) -> TaskKind {
        TaskKind::Emotion
    }

    async fn analyze(&self, text: &str, _context: Option<&str>) -> Result<AnalysisResult> {
        require_text(self.kind(), text)?;
        let classifier = self.model.get().await?;
        Ok(AnalysisResult::Emotion(classifier.classify(text)))
    }

    async fn warm_up(&self) -> Result<()> {
        self.model.get().await.map(|_| ())
    }
}
