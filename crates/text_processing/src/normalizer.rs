//! Text normalization shared by the slot extractors
//!
//! Covers spelled-out number conversion, filler-phrase stripping, repeated
//! token collapse and the punctuation/whitespace cleanup that transcribed
//! speech needs before any pattern matching.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

// =============================================================================
// NUMBER WORDS
// =============================================================================

const NUMBER_WORDS: &[(&str, &str)] = &[
    ("zero", "0"),
    ("oh", "0"),
    ("o", "0"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("ten", "10"),
    ("eleven", "11"),
    ("twelve", "12"),
    ("thirteen", "13"),
    ("fourteen", "14"),
    ("fifteen", "15"),
    ("sixteen", "16"),
    ("seventeen", "17"),
    ("eighteen", "18"),
    ("nineteen", "19"),
    ("twenty", "20"),
    ("thirty", "30"),
    ("forty", "40"),
    ("fifty", "50"),
    ("sixty", "60"),
    ("seventy", "70"),
    ("eighty", "80"),
    ("ninety", "90"),
    ("hundred", "100"),
    ("thousand", "1000"),
];

/// Spoken combinations whose value is not the sum of their words
const SPECIAL_NUMBERS: &[(&str, &str)] = &[
    ("three thousand three hundred", "3300"),
    ("twelve hundred", "1200"),
    ("five thousand", "5000"),
    ("nine hundred", "900"),
    ("eight hundred", "800"),
    ("four hundred", "400"),
    ("one fifty", "150"),
    ("fifteen fifty", "1550"),
    ("four twenty", "420"),
    ("eight oh eight", "808"),
    ("three oh one", "301"),
];

/// ZIP codes commonly dictated digit by digit
const WRITTEN_ZIP_CODES: &[(&str, &str)] = &[
    ("one one two zero one", "11201"),
    ("one zero zero one nine", "10019"),
    ("nine eight one zero one", "98101"),
    ("six zero six one one", "60611"),
    ("eight nine one zero nine", "89109"),
    ("two zero zero zero four", "20004"),
    ("nine zero zero three six", "90036"),
    ("nine four one zero five", "94105"),
    ("nine three one zero one", "93101"),
    ("one nine one zero nine", "19109"),
];

/// Digit homophones heard in dictated phone numbers
const DIGIT_HOMOPHONES: &[(&str, &str)] = &[
    ("zero", "0"),
    ("oh", "0"),
    ("o", "0"),
    ("one", "1"),
    ("won", "1"),
    ("two", "2"),
    ("to", "2"),
    ("too", "2"),
    ("three", "3"),
    ("tree", "3"),
    ("four", "4"),
    ("for", "4"),
    ("fore", "4"),
    ("five", "5"),
    ("six", "6"),
    ("sicks", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("ate", "8"),
    ("nine", "9"),
    ("niner", "9"),
];

const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "for", "with", "from", "to", "of", "in", "on", "at",
];

/// Word-boundary alternation over `phrases`, longest first, tolerant of extra spaces
fn phrase_table_regex(phrases: &[(&str, &str)]) -> Regex {
    let mut keys: Vec<&str> = phrases.iter().map(|(k, _)| *k).collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()));
    let alternation = keys
        .iter()
        .map(|k| k.split_whitespace().map(regex::escape).collect::<Vec<_>>().join(r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).unwrap()
}

fn lookup_table(phrases: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
    phrases.iter().copied().collect()
}

static SPECIAL_NUMBERS_RE: Lazy<Regex> = Lazy::new(|| phrase_table_regex(SPECIAL_NUMBERS));
static SPECIAL_NUMBERS_MAP: Lazy<HashMap<&str, &str>> = Lazy::new(|| lookup_table(SPECIAL_NUMBERS));

static ZIP_CODES_RE: Lazy<Regex> = Lazy::new(|| phrase_table_regex(WRITTEN_ZIP_CODES));
static ZIP_CODES_MAP: Lazy<HashMap<&str, &str>> = Lazy::new(|| lookup_table(WRITTEN_ZIP_CODES));

static NUMBER_WORDS_RE: Lazy<Regex> = Lazy::new(|| phrase_table_regex(NUMBER_WORDS));
static NUMBER_WORDS_MAP: Lazy<HashMap<&str, &str>> = Lazy::new(|| lookup_table(NUMBER_WORDS));

static HOMOPHONES_RE: Lazy<Regex> = Lazy::new(|| phrase_table_regex(DIGIT_HOMOPHONES));
static HOMOPHONES_MAP: Lazy<HashMap<&str, &str>> = Lazy::new(|| lookup_table(DIGIT_HOMOPHONES));

static TENS_AND_ONES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(twenty|thirty|forty|fifty|sixty|seventy|eighty|ninety)[\s-]+(one|two|three|four|five|six|seven|eight|nine)\b",
    )
    .unwrap()
});

static SINGLE_DIGIT_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d(?:[ \t]+\d)+\b").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static PUNCTUATION_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,.\s]+").unwrap());
static ELLIPSIS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\.{2,}|…)\s*").unwrap());
static WORD_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w'-]+").unwrap());

fn canonical_key(matched: &str) -> String {
    normalize_whitespace(&matched.to_lowercase())
}

fn replace_from_table(text: &str, pattern: &Regex, table: &HashMap<&str, &str>) -> String {
    pattern
        .replace_all(text, |caps: &Captures| {
            let key = canonical_key(&caps[0]);
            table
                .get(key.as_str())
                .map(|digits| digits.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn word_value(word: &str) -> u32 {
    NUMBER_WORDS_MAP
        .get(word.to_lowercase().as_str())
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

/// Convert spelled-out numbers to digits
///
/// Order matters: special combinations ("twelve hundred" → 1200) and dictated
/// ZIP codes are replaced first, then tens/ones pairs ("forty two" → 42), then
/// single number words. Runs of single digits left over ("eight zero eight")
/// are joined into one number.
pub fn normalize_numbers(text: &str) -> String {
    let normalized = replace_from_table(text, &SPECIAL_NUMBERS_RE, &SPECIAL_NUMBERS_MAP);
    let normalized = replace_from_table(&normalized, &ZIP_CODES_RE, &ZIP_CODES_MAP);

    let normalized = TENS_AND_ONES_RE
        .replace_all(&normalized, |caps: &Captures| {
            (word_value(&caps[1]) + word_value(&caps[2])).to_string()
        })
        .into_owned();

    let normalized = replace_from_table(&normalized, &NUMBER_WORDS_RE, &NUMBER_WORDS_MAP);

    SINGLE_DIGIT_RUN_RE
        .replace_all(&normalized, |caps: &Captures| {
            caps[0].chars().filter(|c| c.is_ascii_digit()).collect::<String>()
        })
        .into_owned()
}

/// Replace spoken digits and their common homophones ("for", "ate", "oh") with numerals
///
/// Digits stay space separated so grouping can still be inspected afterwards.
pub fn spoken_digits_to_numerals(text: &str) -> String {
    replace_from_table(text, &HOMOPHONES_RE, &HOMOPHONES_MAP)
}

// =============================================================================
// FILLER PHRASES
// =============================================================================

/// A compiled list of filler phrases removed case-insensitively
#[derive(Debug, Clone)]
pub struct FillerSet {
    patterns: Vec<Regex>,
}

impl FillerSet {
    /// Compile `phrases`; longer phrases are stripped before their substrings
    pub fn new(phrases: &[&str]) -> Self {
        let mut phrases: Vec<&str> = phrases
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        phrases.sort_by(|a, b| b.len().cmp(&a.len()));

        let patterns = phrases
            .iter()
            .filter_map(|phrase| {
                let body = phrase
                    .split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+");
                let starts_word = phrase.chars().next().map_or(false, is_word_char);
                let ends_word = phrase.chars().last().map_or(false, is_word_char);
                let pattern = format!(
                    r"(?i){}{}{}\s*",
                    if starts_word { r"\b" } else { "" },
                    body,
                    if ends_word { r"\b" } else { "" },
                );
                Regex::new(&pattern).ok()
            })
            .collect();

        Self { patterns }
    }

    /// Remove every filler phrase and trim the result
    pub fn strip(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        for pattern in &self.patterns {
            cleaned = pattern.replace_all(&cleaned, "").into_owned();
        }
        cleaned.trim().to_string()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// =============================================================================
// CLEANUP
// =============================================================================

/// Collapse runs of whitespace to single spaces and trim
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Turn commas, periods and whitespace runs into single spaces and trim stray punctuation
pub fn clean_punctuation(text: &str) -> String {
    PUNCTUATION_RUN_RE
        .replace_all(text, " ")
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | ';' | ':' | '!' | '?'))
        .to_string()
}

/// Replace ellipses left by transcription with spaces
pub fn fix_transcription_issues(text: &str) -> String {
    normalize_whitespace(&ELLIPSIS_RE.replace_all(text, " "))
}

/// Collapse false starts and immediate repeats, keeping the later token
///
/// "david, david rozovsky" → "david rozovsky"; "raj, rajesh" → "rajesh".
/// A prefix-only repeat is collapsed only across a comma or ellipsis so that
/// names like "Li Lin" survive.
pub fn handle_repeated_pattern(text: &str) -> String {
    let tokens: Vec<regex::Match<'_>> = WORD_TOKEN_RE.find_iter(text).collect();
    let mut collapsed = String::with_capacity(text.len());
    let mut cursor = 0;

    for pair in tokens.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        let gap = &text[first.end()..second.start()];
        if is_repeat(first.as_str(), second.as_str(), gap) {
            collapsed.push_str(&text[cursor..first.start()]);
            cursor = second.start();
        }
    }

    collapsed.push_str(&text[cursor..]);
    collapsed
}

fn is_repeat(first: &str, second: &str, gap: &str) -> bool {
    if gap.is_empty()
        || !gap
            .chars()
            .all(|c| c.is_whitespace() || matches!(c, ',' | '.' | '…'))
    {
        return false;
    }

    let first = first.to_lowercase();
    let second = second.to_lowercase();
    if first == second {
        return true;
    }

    let hesitation = gap.contains(',') || gap.contains('.') || gap.contains('…');
    hesitation && first.chars().count() >= 2 && second.starts_with(&first)
}

/// Keep only ASCII digits
pub fn extract_digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word.to_lowercase().as_str())
}
