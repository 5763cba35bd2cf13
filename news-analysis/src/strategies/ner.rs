//! Named entity recognition from patterns and capitalised spans.
//!
//! Numeric and temporal entities (MONEY, PERCENT, QUANTITY, DATE, ORDINAL, CARDINAL) are
//! found by regular expressions, applied in that priority order. Remaining runs of
//! capitalised words are labelled through a gazetteer and a few structural cues (titles,
//! organisation and place suffixes, preceding prepositions, first names). Anything left
//! unexplained is labelled MISC.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use regex::Regex;

use super::require_text;
use crate::model::LazyModel;
use crate::text::{char_offset, is_stop_word, split_sentences, tokens, Token};
use crate::traits::AnalysisStrategy;
use crate::types::{AnalysisError, AnalysisResult, EntityResult, EntitySpan, Result, TaskKind};

pub const PERSON: &str = "PERSON";
pub const ORG: &str = "ORG";
pub const GPE: &str = "GPE";
pub const LOC: &str = "LOC";
pub const FAC: &str = "FAC";
pub const NORP: &str = "NORP";
pub const EVENT: &str = "EVENT";
pub const WORK_OF_ART: &str = "WORK_OF_ART";
pub const DATE: &str = "DATE";
pub const MONEY: &str = "MONEY";
pub const PERCENT: &str = "PERCENT";
pub const QUANTITY: &str = "QUANTITY";
pub const ORDINAL: &str = "ORDINAL";
pub const CARDINAL: &str = "CARDINAL";
pub const MISC: &str = "MISC";

const MONTHS: &str = "Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?";

const GAZETTEER: &[(&str, &str)] = &[
    // countries, states and cities
    ("australia", GPE), ("france", GPE), ("germany", GPE), ("japan", GPE), ("china", GPE), ("india", GPE),
    ("united states", GPE), ("usa", GPE), ("us", GPE), ("united kingdom", GPE), ("uk", GPE), ("britain", GPE),
    ("canada", GPE), ("new zealand", GPE), ("italy", GPE), ("spain", GPE), ("russia", GPE), ("ukraine", GPE),
    ("brazil", GPE), ("mexico", GPE), ("indonesia", GPE), ("israel", GPE), ("iran", GPE), ("egypt", GPE),
    ("south africa", GPE), ("north korea", GPE), ("south korea", GPE), ("vietnam", GPE), ("singapore", GPE),
    ("hawaii", GPE), ("california", GPE), ("texas", GPE), ("new york", GPE), ("florida", GPE),
    ("queensland", GPE), ("victoria", GPE), ("new south wales", GPE), ("tasmania", GPE),
    ("western australia", GPE), ("south australia", GPE), ("northern territory", GPE),
    ("paris", GPE), ("london", GPE), ("tokyo", GPE), ("seattle", GPE), ("sydney", GPE), ("melbourne", GPE),
    ("brisbane", GPE), ("perth", GPE), ("adelaide", GPE), ("canberra", GPE), ("hobart", GPE),
    ("washington", GPE), ("beijing", GPE), ("moscow", GPE), ("berlin", GPE), ("rome", GPE), ("madrid", GPE),
    ("los angeles", GPE), ("san francisco", GPE), ("chicago", GPE), ("boston", GPE), ("mountain view", GPE),
    ("new delhi", GPE), ("mumbai", GPE), ("hong kong", GPE), ("gaza", GPE), ("kyiv", GPE),
    ("jerusalem", GPE), ("auckland", GPE), ("wellington", GPE),
    // regions and natural features
    ("europe", LOC), ("asia", LOC), ("africa", LOC), ("antarctica", LOC), ("north america", LOC),
    ("south america", LOC), ("oceania", LOC), ("pacific", LOC), ("pacific ocean", LOC), ("atlantic", LOC),
    ("atlantic ocean", LOC), ("indian ocean", LOC), ("mount everest", LOC), ("everest", LOC), ("alps", LOC),
    ("himalayas", LOC), ("silicon valley", LOC), ("mars", LOC), ("jupiter", LOC), ("great barrier reef", LOC),
    // facilities
    ("eiffel tower", FAC), ("louvre", FAC), ("international space station", FAC),
    ("golden gate bridge", FAC), ("sydney opera house", FAC), ("sydney harbour bridge", FAC),
    // organisations
    ("apple", ORG), ("google", ORG), ("amazon", ORG), ("microsoft", ORG), ("tesla", ORG), ("spacex", ORG),
    ("nasa", ORG), ("meta", ORG), ("facebook", ORG), ("twitter", ORG), ("netflix", ORG), ("ibm", ORG),
    ("intel", ORG), ("nvidia", ORG), ("openai", ORG), ("samsung", ORG), ("toyota", ORG), ("abc", ORG),
    ("bbc", ORG), ("cnn", ORG), ("reuters", ORG), ("united nations", ORG), ("nato", ORG),
    ("european union", ORG), ("federal reserve", ORG), ("reserve bank", ORG), ("arpanet", ORG),
    ("parliament", ORG), ("senate", ORG), ("congress", ORG), ("supreme court", ORG), ("qantas", ORG),
    ("telstra", ORG), ("bhp", ORG), ("woolworths", ORG), ("coles", ORG), ("commonwealth bank", ORG),
    ("westpac", ORG), ("labor", ORG),
    // well-known people
    ("obama", PERSON), ("shakespeare", PERSON), ("william shakespeare", PERSON), ("einstein", PERSON),
    ("trump", PERSON), ("biden", PERSON), ("musk", PERSON), ("albanese", PERSON), ("dutton", PERSON),
    // nationalities and groups
    ("australian", NORP), ("australians", NORP), ("american", NORP), ("americans", NORP), ("british", NORP),
    ("french", NORP), ("german", NORP), ("chinese", NORP), ("japanese", NORP), ("indian", NORP),
    ("european", NORP), ("indigenous", NORP), ("aboriginal", NORP), ("christian", NORP), ("muslim", NORP),
    ("jewish", NORP), ("democrats", NORP), ("republicans", NORP),
    // events and works
    ("olympics", EVENT), ("olympic games", EVENT), ("world cup", EVENT), ("world war ii", EVENT),
    ("world war i", EVENT), ("super bowl", EVENT), ("world wide web", WORK_OF_ART), ("hamlet", WORK_OF_ART),
    ("mona lisa", WORK_OF_ART),
];

const FIRST_NAMES: &[&str] = &[
    "john", "james", "michael", "david", "robert", "william", "richard", "thomas", "mary", "elizabeth", "sarah",
    "jennifer", "emma", "olivia", "jack", "george", "peter", "paul", "mark", "anthony", "scott", "kevin",
    "malcolm", "julia", "penny", "elon", "barack", "donald", "joe", "kamala", "hillary", "bill", "steve", "tim",
    "jeff", "neil", "alexander", "leonardo", "albert", "isaac", "marie", "charles", "vincent", "winston",
    "nelson", "angela", "emmanuel", "vladimir", "narendra", "jacinda", "sam", "satya", "sundar", "taylor",
    "jane", "chris", "andrew", "daniel", "matthew", "jessica", "laura", "anna", "sophie", "lucy", "grace",
];

const TITLES: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "professor", "president", "senator", "minister", "premier", "judge", "king",
    "queen", "sir", "dame", "pope", "prince", "princess", "captain", "chancellor", "governor", "mayor",
];

const ORG_SUFFIXES: &[&str] = &[
    "inc", "corp", "corporation", "ltd", "llc", "company", "co", "group", "university", "institute", "bank",
    "association", "council", "party", "department", "ministry", "agency", "foundation", "commission",
    "bureau", "network", "news", "times", "limited", "holdings", "partners", "school", "college", "hospital",
    "club", "union", "authority", "court", "service", "services",
];

const ORG_HEADS: &[&str] = &["university", "bank", "department", "ministry", "institute", "bureau", "college", "office"];

const LOC_SUFFIXES: &[&str] = &[
    "river", "mountain", "mountains", "island", "islands", "ocean", "sea", "lake", "valley", "desert", "bay",
    "coast", "peninsula", "range", "reef", "creek", "beach", "park", "forest",
];

const LOC_HEADS: &[&str] = &["mount", "lake", "cape", "port"];

const GPE_SUFFIXES: &[&str] = &["city", "county", "state", "province", "shire", "territory"];

const LOCATIVE_PREPOSITIONS: &[&str] = &["in", "at", "from", "near", "across", "outside", "throughout"];

/// Lowercase words that may join two capitalised words into one name.
const CONNECTORS: &[&str] = &["of", "de", "da", "van", "von", "del", "la", "le", "bin", "al"];

/// An entity with byte offsets into the analysed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedEntity {
    pub label: &'static str,
    pub start: usize,
    pub end: usize,
}

pub struct EntityRecognizer {
    patterns: Vec<(&'static str, Regex)>,
    gazetteer: HashMap<&'static str, &'static str>,
    first_names: HashSet<&'static str>,
}

impl EntityRecognizer {
    pub(crate) fn load() -> Result<Self> {
        let sources = [
            (
                MONEY,
                r"(?i)(?:[$€£]\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:million|billion|trillion|thousand|bn|m|k)\b)?|\b\d[\d,]*(?:\.\d+)?\s(?:dollars|euros|pounds|cents)\b)".to_string(),
            ),
            (PERCENT, r"(?i)\b\d+(?:\.\d+)?(?:\s?%|\s(?:per cent|percent)\b)".to_string()),
            (
                QUANTITY,
                r"(?i)\b\d[\d,]*(?:\.\d+)?\s?(?:metres|meters|kilometres|kilometers|km|kg|kilograms|tonnes|litres|liters|miles|feet|degrees(?:\s(?:celsius|fahrenheit))?)\b".to_string(),
            ),
            (DATE, r"(?i)\b(?:early\s|mid-|late\s)?\d{1,2}(?:st|nd|rd|th)\scentury\b".to_string()),
            (DATE, format!(r"\b(?:{MONTHS})\.?(?:\s+\d{{1,2}}(?:st|nd|rd|th)?)?(?:,?\s+\d{{4}})?\b")),
            (DATE, format!(r"\b\d{{1,2}}(?:st|nd|rd|th)?\s+(?:{MONTHS})(?:,?\s+\d{{4}})?\b")),
            (DATE, r"\b(?:Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday)s?\b".to_string()),
            (
                DATE,
                r"(?i)\b(?:today|yesterday|tomorrow|tonight|(?:last|next|this)\s(?:week|month|year|decade))\b".to_string(),
            ),
            (DATE, r"\b(?:1[0-9]|20)\d{2}s?\b".to_string()),
            (
                ORDINAL,
                r"(?i)\b(?:\d+(?:st|nd|rd|th)|first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth)\b".to_string(),
            ),
            (CARDINAL, r"\b\d+(?:,\d{3})*(?:\.\d+)?\b".to_string()),
            (
                CARDINAL,
                r"(?i)\b(?:two|three|four|five|six|seven|eight|nine|ten|dozens?|hundreds?|thousands?|millions?|billions?)\b".to_string(),
            ),
        ];

        let patterns = sources
            .into_iter()
            .map(|(label, source)| {
                Regex::new(&source)
                    .map(|regex| (label, regex))
                    .map_err(|e| AnalysisError::model(TaskKind::Ner.as_str(), format!("invalid {label} pattern: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            patterns,
            gazetteer: GAZETTEER.iter().copied().collect(),
            first_names: FIRST_NAMES.iter().copied().collect(),
        })
    }

    /// All entities in `text`, ordered by start offset.
    pub fn recognize(&self, text: &str) -> Vec<RecognizedEntity> {
        let mut found: Vec<RecognizedEntity> = Vec::new();

        for (label, regex) in &self.patterns {
            for m in regex.find_iter(text) {
                if !overlaps_any(&found, m.start(), m.end()) {
                    found.push(RecognizedEntity {
                        label: *label,
                        start: m.start(),
                        end: m.end(),
                    });
                }
            }
        }

        let toks: Vec<Token<'_>> = tokens(text)
            .into_iter()
            .filter(|t| !overlaps_any(&found, t.start, t.end))
            .collect();
        let sentence_starts: HashSet<usize> = split_sentences(text).into_iter().map(|r| r.start).collect();

        let mut i = 0;
        while i < toks.len() {
            if !toks[i].is_capitalized() {
                i += 1;
                continue;
            }
            let end = self.span_end(text, &toks, i);
            if let Some(entity) = self.classify(text, &toks, i, end, &sentence_starts) {
                found.push(entity);
            }
            i = end;
        }

        found.sort_by_key(|e| (e.start, e.end));
        found
    }

    /// Index one past the last token of the capitalised run starting at `start`.
    fn span_end(&self, text: &str, toks: &[Token<'_>], start: usize) -> usize {
        let mut end = start + 1;
        while end < toks.len() {
            let prev = &toks[end - 1];
            let next = &toks[end];
            let gap = text[prev.end..next.start].trim();
            let title_gap = gap == "." && TITLES.contains(&prev.lower().as_str());
            if !(gap.is_empty() || title_gap) {
                break;
            }

            if next.is_capitalized() {
                end += 1;
                continue;
            }

            let connector = CONNECTORS.contains(&next.lower().as_str());
            let joined = toks
                .get(end + 1)
                .is_some_and(|after| after.is_capitalized() && text[next.end..after.start].trim().is_empty());
            if connector && joined {
                end += 2;
                continue;
            }
            break;
        }
        end
    }

    fn classify(
        &self,
        text: &str,
        toks: &[Token<'_>],
        mut start: usize,
        end: usize,
        sentence_starts: &HashSet<usize>,
    ) -> Option<RecognizedEntity> {
        let mut titled = false;
        while start < end {
            let lower = toks[start].lower();
            if TITLES.contains(&lower.as_str()) && end - start > 1 {
                titled = true;
                start += 1;
            } else if is_stop_word(&lower) && !self.gazetteer.contains_key(lower.as_str()) {
                start += 1;
            } else {
                break;
            }
        }
        if start >= end {
            return None;
        }

        let first = &toks[start];
        let last = &toks[end - 1];
        let span_start = first.start;
        let span_end = strip_possessive(last.text).map_or(last.end, |stem| last.start + stem.len());
        let surface = &text[span_start..span_end];
        let key = surface.to_lowercase();
        let words: Vec<String> = toks[start..end].iter().map(Token::lower).collect();
        let first_word = words[0].as_str();
        let last_word = words[words.len() - 1].as_str();
        let last_word = strip_possessive(last_word).unwrap_or(last_word);

        let entity = |label: &'static str| {
            Some(RecognizedEntity {
                label,
                start: span_start,
                end: span_end,
            })
        };

        if let Some(label) = self.gazetteer.get(key.as_str()) {
            return entity(*label);
        }
        if titled {
            return entity(PERSON);
        }
        if ORG_SUFFIXES.contains(&last_word) || (ORG_HEADS.contains(&first_word) && words.iter().any(|w| w == "of")) {
            return entity(ORG);
        }
        if GPE_SUFFIXES.contains(&last_word) {
            return entity(GPE);
        }
        if LOC_SUFFIXES.contains(&last_word) || (LOC_HEADS.contains(&first_word) && words.len() > 1) {
            return entity(LOC);
        }
        if self.first_names.contains(first_word) {
            return entity(PERSON);
        }

        let is_acronym = surface.chars().filter(|c| c.is_alphabetic()).count() >= 2
            && surface.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase);
        if is_acronym {
            return entity(ORG);
        }

        // A lone capitalised word opening a sentence is usually just an ordinary word
        let single = end - start == 1;
        if single && sentence_starts.contains(&first.start) {
            return None;
        }

        let after_preposition = start
            .checked_sub(1)
            .map(|prev| &toks[prev])
            .filter(|prev| text[prev.end..first.start].trim().is_empty())
            .is_some_and(|prev| LOCATIVE_PREPOSITIONS.contains(&prev.lower().as_str()));
        if single && after_preposition {
            return entity(GPE);
        }
        if !single && end - start <= 3 {
            return entity(PERSON);
        }
        entity(MISC)
    }
}

fn strip_possessive(word: &str) -> Option<&str> {
    word.strip_suffix("'s").or_else(|| word.strip_suffix("’s"))
}

fn overlaps_any(found: &[RecognizedEntity], start: usize, end: usize) -> bool {
    found.iter().any(|e| start < e.end && e.start < end)
}

pub struct NerStrategy {
    model: LazyModel<EntityRecognizer>,
}

impl NerStrategy {
    pub fn new() -> Self {
        Self {
            model: LazyModel::new("entity-recognizer", EntityRecognizer::load),
        }
    }
}

impl Default for NerStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisStrategy for NerStrategy {
    fn kind(&self) -> TaskKind {
        TaskKind::Ner
    }

    async fn analyze(&self, text: &str, _context: Option<&str>) -> Result<AnalysisResult> {
        require_text(self.kind(), text)?;
        let recognizer = self.model.get().await?;

        let mut entities: BTreeMap<String, Vec<EntitySpan>> = BTreeMap::new();
        for entity in recognizer.recognize(text) {
            entities.entry(entity.label.to_string()).or_default().push(EntitySpan {
                text: text[entity.start..entity.end].to_string(),
                start: char_offset(text, entity.start),
                end: char_offset(text, entity.end),
            });
        }

        Ok(AnalysisResult::Ner(EntityResult::from_entities(entities)))
    }

    async fn warm_up(&self) -> Result<()> {
        self.model.get().await.map(|_| ())
    }
}
