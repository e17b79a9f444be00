//! Street address extraction
//!
//! Strategies, in order:
//! 1. `parser`: longest address an injected [`AddressParser`] finds in the raw reply.
//! 2. `reconstruction`: clean the reply (fillers, spoken numbers, ellipses) and
//!    rebuild `street[, unit], city, ST ZIP` from its pieces.
//! 3. `heuristic`: accept the cleaned reply when it still looks like an address.

use once_cell::sync::Lazy;
use regex::Regex;
use slot_agent_core::SlotCategory;
use std::sync::Arc;

use super::backends::AddressParser;
use super::{ExtractionMiss, SlotExtractor, StrategyChain, StrategyResult};
use crate::normalizer::{fix_transcription_issues, normalize_numbers, FillerSet};

const ADDRESS_FILLERS: &[&str] = &[
    "the address is",
    "the mailing address is",
    "my office is at",
    "i live at",
    "i'm at",
    "send it to",
    "send everything to",
    "you can mail it to",
    "you'll find them at",
    "so you'll find them at",
    "they're at",
    "they're located at",
    "oh the address?",
    "it's gonna be",
    "it's at",
    "it's",
    "address is",
    "let me see",
    "let me think",
    "i think",
    "no sorry",
    "no wait",
    "wait",
    "that's on the",
    "um",
    "uh",
    "umm",
    "ummm",
    "uhh",
    "hmm",
    "yeah",
    "so",
    "well",
];

const STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA", "KS",
    "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY",
    "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV",
    "WI", "WY", "DC", "PR", "GU", "VI", "AS", "MP",
];

const STREET_SUFFIXES: &str = "street|st|avenue|ave|road|rd|boulevard|blvd|lane|ln|drive|dr|way|court|ct|place|pl|broadway|parkway|pkwy|circle|cir|terrace|highway|hwy";

/// House number, up to five name words (ordinals allowed), suffix, optional direction
static STREET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b\d+[a-z]?\s+(?:(?:[a-z][a-z0-9.']*|\d+(?:st|nd|rd|th))\s+){{0,5}}?(?:{})\b(?:\s+(?:north|south|east|west|northwest|northeast|southwest|southeast|nw|ne|sw|se|n|s|e|w)\b)?",
        STREET_SUFFIXES
    ))
    .unwrap()
});

static CITY_STATE_ZIP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)([a-z][a-z.\s]*?)[\s,]+({})[\s,]+(\d{{5}}(?:-\d{{4}})?)\b",
        STATE_CODES.join("|")
    ))
    .unwrap()
});

static UNIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(apartment|apt|suite|ste|unit|floor|fl)\b\.?\s*#?\s*([a-z0-9-]+)").unwrap()
});

static CITY_PREPOSITION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:in|at)\s+").unwrap());

static STREET_KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b(?:{})\b", STREET_SUFFIXES)).unwrap());

static STATE_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{2}\b").unwrap());
static ZIP_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{5}\b").unwrap());

static ADDRESS_FILLER_SET: Lazy<FillerSet> = Lazy::new(|| FillerSet::new(ADDRESS_FILLERS));

/// Strip fillers, convert spoken numbers and remove ellipses
///
/// Fillers go first so phrases like "oh the address?" are still intact when
/// they are matched.
pub fn clean_address_response(text: &str) -> String {
    let cleaned = ADDRESS_FILLER_SET.strip(text.trim());
    let cleaned = normalize_numbers(&cleaned);
    fix_transcription_issues(&cleaned)
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

/// Rebuild `street[, unit], city, ST ZIP` from cleaned text
pub fn reconstruct_address(cleaned: &str) -> Option<String> {
    let street = STREET_RE.find(cleaned)?;
    let rest = &cleaned[street.end()..];
    let place = CITY_STATE_ZIP_RE.captures(rest)?;

    let city_start = place.get(1)?.start();
    let unit = UNIT_RE
        .captures(&rest[..city_start])
        .map(|caps| format!("{} {}", &caps[1], &caps[2]));

    let city = place[1].trim().trim_end_matches(',');
    let city = CITY_PREPOSITION_RE.replace(city, "");
    let state = place[2].to_uppercase();
    let zip = &place[3];

    let mut address = street.as_str().trim().to_string();
    if let Some(unit) = unit {
        address.push_str(", ");
        address.push_str(&unit);
    }
    address.push_str(&format!(", {}, {} {}", city, state, zip));
    Some(address)
}

/// Digits plus a street suffix, or digits plus a state token and a ZIP
pub fn looks_like_address(cleaned: &str) -> bool {
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    STREET_KEYWORD_RE.is_match(cleaned)
        || (STATE_TOKEN_RE.is_match(cleaned) && ZIP_TOKEN_RE.is_match(cleaned))
}

/// Street address extractor
#[derive(Clone, Default)]
pub struct AddressExtractor {
    parser: Option<Arc<dyn AddressParser>>,
}

impl AddressExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parser(mut self, parser: Arc<dyn AddressParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Strategy 1: structured parser, longest candidate
    pub fn by_parser(&self, text: &str) -> StrategyResult {
        let parser = self.parser.as_ref().ok_or(ExtractionMiss::NoBackend)?;
        parser
            .parse(text)?
            .into_iter()
            .fold(None, |longest: Option<String>, candidate| match longest {
                Some(current) if current.len() >= candidate.len() => Some(current),
                _ => Some(candidate),
            })
            .ok_or(ExtractionMiss::NoCandidate)
    }

    /// Strategy 2: reconstruction from cleaned pieces
    pub fn by_reconstruction(&self, text: &str) -> StrategyResult {
        let cleaned = clean_address_response(text);
        if !STREET_RE.is_match(&cleaned) {
            return Err(ExtractionMiss::NoCandidate);
        }
        reconstruct_address(&cleaned)
            .ok_or_else(|| ExtractionMiss::Rejected("street without city, state and ZIP".to_string()))
    }

    /// Strategy 3: accept the cleaned reply as-is
    pub fn by_heuristic(&self, text: &str) -> StrategyResult {
        let cleaned = clean_address_response(text);
        if looks_like_address(&cleaned) {
            Ok(cleaned)
        } else {
            Err(ExtractionMiss::NoCandidate)
        }
    }
}

impl SlotExtractor for AddressExtractor {
    fn category(&self) -> SlotCategory {
        SlotCategory::Address
    }

    fn extract(&self, text: &str) -> Option<String> {
        StrategyChain::new(SlotCategory::Address)
            .attempt("parser", || self.by_parser(text))
            .attempt("reconstruction", || self.by_reconstruction(text))
            .attempt("heuristic", || self.by_heuristic(text))
            .finish()
    }
}

impl std::fmt::Debug for AddressExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressExtractor")
            .field("parser", &self.parser.is_some())
            .finish()
    }
}
