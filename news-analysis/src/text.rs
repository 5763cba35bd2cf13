//! Tokenisation helpers shared by the analysis engines.
//!
//! All offsets produced here are byte offsets into the input; use [`char_offset`] to turn
//! them into the character offsets exposed in results.

use std::ops::Range;

/// A word or number together with its byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

impl Token<'_> {
    pub fn is_capitalized(&self) -> bool {
        self.text.chars().next().is_some_and(char::is_uppercase)
    }

    pub fn is_numeric(&self) -> bool {
        self.text.chars().next().is_some_and(|c| c.is_ascii_digit())
    }

    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }
}

/// Splits text into word tokens. Apostrophes and hyphens inside a word, and commas or
/// periods between digits, stay part of the token.
pub fn tokens(text: &str) -> Vec<Token<'_>> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (start, c) = chars[i];
        if !c.is_alphanumeric() {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() {
            let (_, cur) = chars[j];
            if cur.is_alphanumeric() {
                j += 1;
                continue;
            }
            let next = chars.get(j + 1).map(|(_, n)| *n);
            let prev = chars[j - 1].1;
            let joins_word = matches!(cur, '\'' | '’' | '-') && next.is_some_and(char::is_alphanumeric);
            let joins_number = matches!(cur, ',' | '.') && prev.is_ascii_digit() && next.is_some_and(|n| n.is_ascii_digit());
            if joins_word || joins_number {
                j += 1;
            } else {
                break;
            }
        }

        let end = chars.get(j).map(|(b, _)| *b).unwrap_or(text.len());
        out.push(Token {
            text: &text[start..end],
            start,
            end,
        });
        i = j;
    }

    out
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "st", "jr", "sr", "vs", "etc", "inc", "ltd", "co", "corp", "gov", "sen", "rep",
    "gen", "col", "lt", "mt", "no", "e.g", "i.e", "u.s", "u.k",
];

/// Byte ranges of the sentences in `text`, with surrounding whitespace trimmed.
pub fn split_sentences(text: &str) -> Vec<Range<usize>> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];

        let paragraph_break = c == '\n' && chars.get(i + 1).is_some_and(|(_, n)| *n == '\n');
        if paragraph_break {
            push_trimmed(text, start..pos, &mut sentences);
            start = pos;
            i += 2;
            continue;
        }

        if matches!(c, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && matches!(chars[j].1, '.' | '!' | '?' | '"' | '\'' | '”' | '’' | ')') {
                j += 1;
            }
            let at_end = j >= chars.len();
            let before_space = chars.get(j).is_some_and(|(_, n)| n.is_whitespace());
            if (at_end || before_space) && !(c == '.' && ends_with_abbreviation(&text[start..pos])) {
                let end = chars.get(j).map(|(b, _)| *b).unwrap_or(text.len());
                push_trimmed(text, start..end, &mut sentences);
                start = end;
            }
            i = j;
            continue;
        }

        i += 1;
    }

    push_trimmed(text, start..text.len(), &mut sentences);
    sentences
}

fn push_trimmed(text: &str, range: Range<usize>, out: &mut Vec<Range<usize>>) {
    let slice = &text[range.clone()];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    if leading + trailing < slice.len() {
        out.push(range.start + leading..range.end - trailing);
    }
}

fn ends_with_abbreviation(before_period: &str) -> bool {
    let last = before_period
        .rsplit(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or("");
    if last.chars().count() == 1 && last.chars().all(char::is_uppercase) {
        return true;
    }
    let lower = last.to_lowercase();
    ABBREVIATIONS.contains(&lower.as_str())
}

/// Check if a word is a common stop word
pub fn is_stop_word(word: &str) -> bool {
    matches!(
        word,
        "the" | "and" | "or" | "but" | "in" | "on" | "at" | "to" | "for" | "of" | "with" | "by" |
        "a" | "an" | "is" | "are" | "was" | "were" | "be" | "been" | "have" | "has" | "had" |
        "do" | "does" | "did" | "will" | "would" | "could" | "should" | "may" | "might" | "must" |
        "can" | "this" | "that" | "these" | "those" | "it" | "its" | "it's" | "as" | "from" | "into" |
        "i" | "i'm" | "me" | "my" | "we" | "our" | "you" | "your" | "he" | "she" | "his" | "her" |
        "they" | "them" | "their" | "there" | "then" | "than" | "so" | "if" | "not" | "no" | "about" |
        "what" | "which" | "who" | "whom" | "when" | "where" | "why" | "how" | "also" | "just" |
        "some" | "such" | "very" | "over" | "more" | "most" | "other" | "up" | "out" | "all" | "any"
    )
}

/// Crude suffix stripping so that "stocks" and "stock" compare equal.
pub fn stem(word: &str) -> String {
    let word = word.trim_end_matches(['\'', '’']);
    let word = word.strip_suffix("'s").or_else(|| word.strip_suffix("’s")).unwrap_or(word);
    let len = word.chars().count();
    let stripped = if len > 5 && word.ends_with("ing") {
        &word[..word.len() - 3]
    } else if len > 4 && word.ends_with("ed") {
        &word[..word.len() - 2]
    } else if len > 4 && word.ends_with("es") && !word.ends_with("ses") {
        &word[..word.len() - 2]
    } else if len > 3 && word.ends_with('s') && !word.ends_with("ss") {
        &word[..word.len() - 1]
    } else {
        word
    };
    stripped.to_string()
}

/// Lowercased, stemmed tokens that are not stop words.
pub fn content_terms(text: &str) -> Vec<String> {
    tokens(text)
        .into_iter()
        .map(|token| token.lower())
        .filter(|word| !is_stop_word(word))
        .filter(|word| word.chars().count() > 1 || word.chars().all(|c| c.is_ascii_digit()))
        .map(|word| stem(&word))
        .collect()
}

/// Converts a byte offset into a character offset.
pub fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte.min(text.len())].chars().count()
}

/// Collapse runs of whitespace into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate text to at most `max_chars` characters, trying to break at sentence boundaries.
/// A sentence break that would keep less than half the budget is ignored in favour of the
/// last word boundary.
pub fn smart_truncate(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let truncated = &text[..cut];
    let sentence_end = truncated
        .char_indices()
        .filter(|&(i, c)| matches!(c, '.' | '!' | '?') && text[i + c.len_utf8()..].starts_with(char::is_whitespace))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .filter(|&end| truncated[..end].chars().count() * 2 >= max_chars);

    if let Some(end) = sentence_end {
        truncated[..end].to_string()
    } else if let Some(last_space) = truncated.rfind(char::is_whitespace) {
        truncated[..last_space].trim_end().to_string()
    } else {
        truncated.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<&str> {
        tokens(text).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn tokens_keep_contractions_and_numbers_together() {
        assert_eq!(words("I'm sure it's 1,000.5 well-known"), ["I'm", "sure", "it's", "1,000.5", "well-known"]);
        assert_eq!(words("Hawaii."), ["Hawaii"]);
        assert_eq!(words("  -- "), Vec::<&str>::new());
    }

    #[test]
    fn token_offsets_slice_the_source() {
        let text = "Café owners rejoice";
        for token in tokens(text) {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }

    #[test]
    fn sentences_respect_abbreviations() {
        let text = "Dr. Smith arrived. He said hello! Was it J. Doe? Yes.";
        let sentences: Vec<&str> = split_sentences(text).into_iter().map(|r| &text[r]).collect();
        assert_eq!(sentences, ["Dr. Smith arrived.", "He said hello!", "Was it J. Doe?", "Yes."]);
    }

    #[test]
    fn sentences_without_terminal_punctuation_are_kept() {
        let text = "First line.\n\nSecond paragraph without a stop";
        let sentences: Vec<&str> = split_sentences(text).into_iter().map(|r| &text[r]).collect();
        assert_eq!(sentences, ["First line.", "Second paragraph without a stop"]);
    }

    #[test]
    fn smart_truncate_prefers_sentence_boundaries() {
        assert_eq!(smart_truncate("One. Two three four", 12), "One. Two");
        assert_eq!(smart_truncate("First sentence here. Then more words", 30), "First sentence here.");
        assert_eq!(smart_truncate("alpha beta gamma", 12), "alpha beta");
        assert_eq!(smart_truncate("short", 12), "short");
    }

    #[test]
    fn smart_truncate_keeps_most_of_the_budget() {
        let text = format!("Version 1. {}", "word ".repeat(40));
        let cut = smart_truncate(&text, 100);
        assert!(cut.chars().count() > 90, "{cut}");
        assert!(cut.ends_with("word"));

        // Decimal points are not sentence ends
        assert_eq!(smart_truncate("Growth was 2.5 percent overall", 20), "Growth was 2.5");
    }

    #[test]
    fn stemming_is_conservative() {
        assert_eq!(stem("stocks"), "stock");
        assert_eq!(stem("boiling"), "boil");
        assert_eq!(stem("class"), "class");
        assert_eq!(stem("obama's"), "obama");
    }
}
