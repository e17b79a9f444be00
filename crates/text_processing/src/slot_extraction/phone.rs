//! Phone number extraction
//!
//! Strategies, in order:
//! 1. `parser`: an injected [`PhoneParser`]; first valid number in the target region.
//! 2. `spoken`: digits dictated as words ("seven one eight ..."), reassembled
//!    from an area code and a seven digit body.
//! 3. `regex`: well-formed written numbers.
//!
//! Every hit is rendered as `(AAA) EEE-EEEE`.

use once_cell::sync::Lazy;
use regex::Regex;
use slot_agent_core::SlotCategory;
use std::ops::Range;
use std::sync::Arc;

use super::backends::PhoneParser;
use super::{ExtractionMiss, SlotExtractor, StrategyChain, StrategyResult};
use crate::normalizer::{extract_digits_only, spoken_digits_to_numerals, FillerSet};

const PHONE_FILLERS: &[&str] = &[
    "my number is",
    "my phone number is",
    "phone number is",
    "the number is",
    "number is",
    "the phone is",
    "phone is",
    "call me at",
    "you can call at",
    "you can reach them at",
    "you can reach me at",
    "reach me at",
    "it's",
    "its",
    "it is",
    "area code",
    "and then",
    "then",
    "let me check",
    "let me think",
    "um",
    "uh",
    "umm",
    "uhh",
    "ummm",
    "hmm",
    "yeah",
    "sure",
    "okay",
    "ok",
    "so",
    "well",
    "wait",
];

/// Area code candidates; each pattern captures exactly three single digits
static AREA_CODE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        (
            "explicit",
            Regex::new(r"area\s+code\W*(?:(?:is|it's|its|it\s+is)\W+)?(\d)[\s,.-]*(\d)[\s,.-]*(\d)\b")
                .unwrap(),
        ),
        (
            "country_code",
            Regex::new(r"(?:\+|\bplus)\s*1[\s.-]*\(?(\d)[\s.-]*(\d)[\s.-]*(\d)").unwrap(),
        ),
        ("contiguous", Regex::new(r"\b(\d)(\d)(\d)\d{7}\b").unwrap()),
        ("grouped", Regex::new(r"\b(\d)(\d)(\d)\b").unwrap()),
        ("spelled", Regex::new(r"\b(\d)[\s,.-]+(\d)[\s,.-]+(\d)\b").unwrap()),
    ]
});

/// Seven digit subscriber-number candidates
static MAIN_NUMBER_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("standard", Regex::new(r"\b\d{3}[-.\s]?\d{4}\b").unwrap()),
        (
            "triple_five",
            Regex::new(r"\b5[\s,.-]*5[\s,.-]*5[\s,.-]*(?:\d[\s,.-]*){3}\d\b").unwrap(),
        ),
        ("seven_digits", Regex::new(r"\b\d(?:[\s,]+\d){6}\b").unwrap()),
        (
            "dot_separated",
            Regex::new(r"\b(?:\d\s*){2}\d\s*(?:\.|\bdot\b)\s*(?:\d\s*){3}\d\b").unwrap(),
        ),
        (
            "dash_separated",
            Regex::new(r"\b(?:\d\s*){2}\d\s*(?:-|\bdash\b)\s*(?:\d\s*){3}\d\b").unwrap(),
        ),
        ("loose_groups", Regex::new(r"\d+(?:[\s,.-]+\d+)*").unwrap()),
    ]
});

/// Written forms, tried in order
static WRITTEN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\+1[-.\s]?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap(),
        Regex::new(r"\b1[-.\s]?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap(),
        Regex::new(r"\(\d{3}\)\s*\d{3}[-\s]?\d{4}\b").unwrap(),
        Regex::new(r"\b\d{3}-\d{3}-\d{4}\b").unwrap(),
        Regex::new(r"\b\d{3}\.\d{3}\.\d{4}\b").unwrap(),
        Regex::new(r"\b\d{3}\s+\d{3}\s+\d{4}\b").unwrap(),
        Regex::new(r"\b\d{10}\b").unwrap(),
    ]
});

static CORRECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:no\s+wait|no\s+sorry|sorry|i\s+mean|actually)\b").unwrap()
});

static PHONE_FILLER_SET: Lazy<FillerSet> = Lazy::new(|| FillerSet::new(PHONE_FILLERS));

/// Format a US number as `(AAA) EEE-EEEE`
///
/// Accepts 10 digits, or 11 with a leading country code 1. The area code may
/// not start with 0 or 1; the exchange may not start with 0.
pub fn format_phone_number(raw: &str) -> Option<String> {
    let digits = extract_digits_only(raw);
    let digits = match digits.len() {
        11 if digits.starts_with('1') => &digits[1..],
        10 => digits.as_str(),
        _ => return None,
    };

    let bytes = digits.as_bytes();
    if matches!(bytes[0], b'0' | b'1') || bytes[3] == b'0' {
        return None;
    }

    Some(format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]))
}

/// The ten digit run a dictated number spells out, if one can be assembled
pub fn spoken_digit_run(text: &str) -> Option<String> {
    let converted = spoken_digits_to_numerals(&text.to_lowercase());
    let converted = after_last_correction(&converted);

    let (area, span) = find_area_code(converted)?;
    let remainder = format!("{} ; {}", &converted[..span.start], &converted[span.end..]);
    let remainder = PHONE_FILLER_SET.strip(&remainder);
    let body = find_main_number(&remainder)?;

    Some(format!("{}{}", area, body))
}

/// Text after the last self-correction ("no wait", "sorry") when it still
/// holds a complete number
fn after_last_correction(text: &str) -> &str {
    match CORRECTION_RE.find_iter(text).last() {
        Some(m) if extract_digits_only(&text[m.end()..]).len() >= 10 => &text[m.end()..],
        _ => text,
    }
}

fn find_area_code(text: &str) -> Option<(String, Range<usize>)> {
    AREA_CODE_PATTERNS.iter().find_map(|(name, pattern)| {
        let caps = pattern.captures(text)?;
        let start = caps.get(0)?.start();
        let end = caps.get(3)?.end();
        let area = format!("{}{}{}", &caps[1], &caps[2], &caps[3]);
        tracing::trace!(pattern = *name, "Area code candidate");
        Some((area, start..end))
    })
}

fn find_main_number(text: &str) -> Option<String> {
    MAIN_NUMBER_PATTERNS.iter().find_map(|(name, pattern)| {
        pattern.find_iter(text).find_map(|m| {
            let digits = extract_digits_only(m.as_str());
            if digits.len() == 7 {
                tracing::trace!(pattern = *name, "Subscriber number candidate");
                Some(digits)
            } else {
                None
            }
        })
    })
}

/// Phone number extractor
#[derive(Clone)]
pub struct PhoneExtractor {
    region: String,
    parser: Option<Arc<dyn PhoneParser>>,
}

impl PhoneExtractor {
    /// Extractor for numbers in `region` without a structured parser
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            parser: None,
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn PhoneParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Strategy 1: structured parser
    pub fn by_parser(&self, text: &str) -> StrategyResult {
        let parser = self.parser.as_ref().ok_or(ExtractionMiss::NoBackend)?;
        let candidates = parser.find_numbers(text, &self.region)?;
        if candidates.is_empty() {
            return Err(ExtractionMiss::NoCandidate);
        }

        candidates
            .into_iter()
            .find(|candidate| candidate.valid && candidate.region.eq_ignore_ascii_case(&self.region))
            .map(|candidate| candidate.national)
            .ok_or_else(|| ExtractionMiss::Rejected(format!("no valid number in region {}", self.region)))
    }

    /// Strategy 2: dictated digits
    pub fn by_spoken_digits(&self, text: &str) -> StrategyResult {
        let run = spoken_digit_run(text).ok_or(ExtractionMiss::NoCandidate)?;
        format_phone_number(&run)
            .ok_or_else(|| ExtractionMiss::Rejected(format!("{} is not a valid US number", run)))
    }

    /// Strategy 3: written patterns
    pub fn by_written_pattern(&self, text: &str) -> StrategyResult {
        let mut saw_candidate = false;
        for pattern in WRITTEN_PATTERNS.iter() {
            for m in pattern.find_iter(text) {
                saw_candidate = true;
                if let Some(formatted) = format_phone_number(m.as_str()) {
                    return Ok(formatted);
                }
            }
        }

        if saw_candidate {
            Err(ExtractionMiss::Rejected("no candidate passed validation".to_string()))
        } else {
            Err(ExtractionMiss::NoCandidate)
        }
    }
}

impl SlotExtractor for PhoneExtractor {
    fn category(&self) -> SlotCategory {
        SlotCategory::Phone
    }

    fn extract(&self, text: &str) -> Option<String> {
        StrategyChain::new(SlotCategory::Phone)
            .attempt("parser", || self.by_parser(text))
            .attempt("spoken", || self.by_spoken_digits(text))
            .attempt("regex", || self.by_written_pattern(text))
            .finish()
    }
}
