//! Person-name extraction
//!
//! Strategies, in order:
//! 1. `entities`: longest person name from an injected [`EntityRecognizer`].
//! 2. `name_parts`: filler strip, repeat collapse, then a token scan for
//!    capitalized words, apostrophe names, lowercase particles and titles.
//! 3. `lowercase_pairs`: the first two or three plausible words when the
//!    transcript carries no capitalization.

use once_cell::sync::Lazy;
use slot_agent_core::SlotCategory;
use std::sync::Arc;

use super::backends::EntityRecognizer;
use super::{ExtractionMiss, SlotExtractor, StrategyChain, StrategyResult};
use crate::normalizer::{clean_punctuation, handle_repeated_pattern, is_stop_word, FillerSet};

const NAME_FILLERS: &[&str] = &[
    "you can put down",
    "the name is",
    "client's name is",
    "his name is",
    "her name is",
    "it's gonna be",
    "the name?",
    "oh right,",
    "yeah,",
    "so the client's name is",
    "let me think",
    "ah yes,",
    "or maybe",
    "no wait,",
    "no,",
    "it's",
    "its",
    "it is",
    "ehh",
    "um",
    "uh",
    "umm",
    "uhh",
    "uhhh",
    "ummm",
    "well",
    "oh",
    "ah",
    "hmm",
    "err",
    "so the",
    "client's",
    "name is",
    "let me",
    "think",
];

/// Lowercase surname particles ("van", "de la")
const PARTICLES: &[&str] = &["van", "der", "de", "la", "von", "del", "di", "da"];

const TITLES: &[&str] = &["dr", "mr", "mrs", "ms", "prof", "professor"];

static NAME_FILLER_SET: Lazy<FillerSet> = Lazy::new(|| FillerSet::new(NAME_FILLERS));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartKind {
    Title,
    Particle,
    Given,
}

/// Strip fillers, collapse false starts and drop punctuation
pub fn clean_name_response(text: &str) -> String {
    let cleaned = NAME_FILLER_SET.strip(text.trim());
    let cleaned = handle_repeated_pattern(&cleaned);
    clean_punctuation(&cleaned)
}

/// Name tokens found in already-cleaned text
///
/// Particles count in any position but must lead into a given name, so
/// trailing ones are dropped. When the first given name is contained in the
/// second ("raj rajesh") the first is dropped.
pub fn name_parts(cleaned: &str) -> Vec<String> {
    let mut parts: Vec<(PartKind, String)> = Vec::new();

    for word in cleaned.split_whitespace() {
        let token: String = word
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '\'' || *c == '-')
            .collect();
        if token.chars().count() < 2 {
            continue;
        }

        let lower = token.to_lowercase();
        if TITLES.contains(&lower.as_str()) {
            parts.push((PartKind::Title, format!("{}.", capitalize(&lower))));
        } else if PARTICLES.contains(&lower.as_str()) {
            parts.push((PartKind::Particle, token));
        } else if token.contains('\'') {
            if !lower.ends_with("'s") {
                parts.push((PartKind::Given, token));
            }
        } else if token.chars().next().map_or(false, char::is_uppercase) && !is_stop_word(&token) {
            parts.push((PartKind::Given, token));
        }
    }

    while parts.last().map_or(false, |(kind, _)| *kind == PartKind::Particle) {
        parts.pop();
    }

    if parts.len() >= 2
        && parts[0].0 == PartKind::Given
        && parts[1].0 == PartKind::Given
        && parts[1].1.to_lowercase().contains(&parts[0].1.to_lowercase())
    {
        parts.remove(0);
    }

    if !parts.iter().any(|(kind, _)| *kind == PartKind::Given) {
        return Vec::new();
    }

    parts.into_iter().map(|(_, part)| part).collect()
}

/// First run of two or three plausible name words in uncapitalized text
pub fn lowercase_name_window(cleaned: &str) -> Option<String> {
    let words: Vec<&str> = cleaned
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c == '.' || c == ','))
        .collect();

    let plausible = |word: &str| {
        word.chars().count() >= 2 && !word.chars().any(|c| c.is_ascii_digit()) && !is_stop_word(word)
    };

    for (i, pair) in words.windows(2).enumerate() {
        if !(plausible(pair[0]) && plausible(pair[1])) {
            continue;
        }
        return match words.get(i + 2) {
            Some(third) if plausible(third) => Some(format!("{} {} {}", pair[0], pair[1], third)),
            _ => Some(format!("{} {}", pair[0], pair[1])),
        };
    }

    None
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Person-name extractor
#[derive(Clone, Default)]
pub struct NameExtractor {
    recognizer: Option<Arc<dyn EntityRecognizer>>,
}

impl NameExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Strategy 1: entity recognition, longest name wins
    pub fn by_entities(&self, text: &str) -> StrategyResult {
        let recognizer = self.recognizer.as_ref().ok_or(ExtractionMiss::NoBackend)?;
        let names = recognizer.person_names(text.trim())?;

        names
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .fold(None, |longest: Option<String>, name| match longest {
                Some(current) if current.chars().count() >= name.chars().count() => Some(current),
                _ => Some(name),
            })
            .ok_or(ExtractionMiss::NoCandidate)
    }

    /// Strategy 2: capitalized token scan
    pub fn by_name_parts(&self, text: &str) -> StrategyResult {
        let parts = name_parts(&clean_name_response(text));
        if parts.is_empty() {
            Err(ExtractionMiss::NoCandidate)
        } else {
            Ok(parts.join(" "))
        }
    }

    /// Strategy 3: uncapitalized word window
    pub fn by_lowercase_pairs(&self, text: &str) -> StrategyResult {
        lowercase_name_window(&clean_name_response(text)).ok_or(ExtractionMiss::NoCandidate)
    }
}

impl SlotExtractor for NameExtractor {
    fn category(&self) -> SlotCategory {
        SlotCategory::Name
    }

    fn extract(&self, text: &str) -> Option<String> {
        StrategyChain::new(SlotCategory::Name)
            .attempt("entities", || self.by_entities(text))
            .attempt("name_parts", || self.by_name_parts(text))
            .attempt("lowercase_pairs", || self.by_lowercase_pairs(text))
            .finish()
    }
}

impl std::fmt::Debug for NameExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameExtractor")
            .field("recognizer", &self.recognizer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot_extraction::backends::BackendError;

    struct FixedRecognizer(Vec<&'static str>);

    impl EntityRecognizer for FixedRecognizer {
        fn person_names(&self, _text: &str) -> Result<Vec<String>, BackendError> {
            Ok(self.0.iter().map(|n| n.to_string()).collect())
        }
    }

    struct BrokenRecognizer;

    impl EntityRecognizer for BrokenRecognizer {
        fn person_names(&self, _text: &str) -> Result<Vec<String>, BackendError> {
            Err(BackendError::new("ner", "model not loaded"))
        }
    }

    #[test]
    fn test_false_start_in_lowercase_transcript() {
        let extractor = NameExtractor::new();
        assert_eq!(
            extractor.extract("ehh, it's david, david rozovsky"),
            Some("david rozovsky".to_string())
        );
        assert_eq!(extractor.by_name_parts("ehh, it's david, david rozovsky"), Err(ExtractionMiss::NoCandidate));
    }

    #[test]
    fn test_title_is_normalized() {
        assert_eq!(
            NameExtractor::new().extract("the name is Dr. Elizabeth Martinez"),
            Some("Dr. Elizabeth Martinez".to_string())
        );
    }

    #[test]
    fn test_prefix_false_start_is_dropped() {
        assert_eq!(
            NameExtractor::new().extract("um, it's Raj, Rajesh Patel"),
            Some("Rajesh Patel".to_string())
        );
    }

    #[test]
    fn test_particles_follow_a_name() {
        assert_eq!(
            NameExtractor::new().extract("you can put down Ludwig van Beethoven"),
            Some("Ludwig van Beethoven".to_string())
        );
        assert!(name_parts("van").is_empty());
        assert_eq!(name_parts("Ludwig van"), vec!["Ludwig"]);
    }

    #[test]
    fn test_leading_particles_are_kept() {
        let extractor = NameExtractor::new();
        assert_eq!(extractor.extract("de la Cruz"), Some("de la Cruz".to_string()));
        assert_eq!(extractor.extract("van Gogh"), Some("van Gogh".to_string()));
        assert_eq!(extractor.extract("Maria de la Cruz"), Some("Maria de la Cruz".to_string()));
        // A particle is never mistaken for a false start
        assert_eq!(name_parts("di Dio"), vec!["di", "Dio"]);
    }

    #[test]
    fn test_possessives_and_stop_words_are_not_names() {
        assert_eq!(name_parts("The Client's Ana Lopez"), vec!["Ana", "Lopez"]);
        assert_eq!(name_parts("Mary O'Connor"), vec!["Mary", "O'Connor"]);
    }

    #[test]
    fn test_title_alone_is_not_a_name() {
        assert!(name_parts("Dr").is_empty());
        assert_eq!(NameExtractor::new().extract("Dr"), None);
    }

    #[test]
    fn test_lowercase_window() {
        assert_eq!(lowercase_name_window("mary jane watson"), Some("mary jane watson".to_string()));
        assert_eq!(lowercase_name_window("to the 42 ana lopez"), Some("ana lopez".to_string()));
        assert_eq!(lowercase_name_window("ana"), None);
    }

    #[test]
    fn test_recognizer_takes_priority() {
        let extractor = NameExtractor::new()
            .with_recognizer(Arc::new(FixedRecognizer(vec!["Ana", "Ana Maria Lopez", "Bob"])));
        assert_eq!(extractor.extract("anything"), Some("Ana Maria Lopez".to_string()));
    }

    #[test]
    fn test_recognizer_misses_fall_through() {
        let empty = NameExtractor::new().with_recognizer(Arc::new(FixedRecognizer(vec![])));
        assert_eq!(empty.by_entities("John Smith"), Err(ExtractionMiss::NoCandidate));
        assert_eq!(empty.extract("John Smith"), Some("John Smith".to_string()));

        let broken = NameExtractor::new().with_recognizer(Arc::new(BrokenRecognizer));
        assert!(matches!(broken.by_entities("John Smith"), Err(ExtractionMiss::Backend(_))));
        assert_eq!(broken.extract("John Smith"), Some("John Smith".to_string()));
    }

    #[test]
    fn test_no_backend_is_reported() {
        assert_eq!(NameExtractor::new().by_entities("John"), Err(ExtractionMiss::NoBackend));
        assert_eq!(NameExtractor::new().extract("42"), None);
    }
}
