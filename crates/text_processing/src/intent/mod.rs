//! Keyword and fuzzy intent classification
//!
//! Maps an utterance to one of the configured function names. Matching runs
//! in two phases:
//!
//! 1. Exact: the first keyword (in declaration order) that is a substring of
//!    the lowercased utterance wins.
//! 2. Fuzzy: whole-keyword similarity and per-word similarity, each scaled by
//!    its weight; the single best weighted score wins, earlier entries win ties.
//!
//! Nothing matching yields `unknown` at the configured low confidence.
//!
//! # Example
//!
//! ```
//! use slot_agent_text_processing::intent::{ClassifierConfig, IntentClassifier};
//!
//! let classifier = IntentClassifier::new(
//!     vec![("check_weather".to_string(), vec!["weather".to_string()])],
//!     ClassifierConfig::default(),
//! );
//! let result = classifier.classify("what's the weather like");
//! assert_eq!(result.intent, "check_weather");
//! ```

mod inline;

pub use inline::{extract_inline, InlineRule};

use serde::{Deserialize, Serialize};
use slot_agent_core::UNKNOWN_INTENT;
use unicode_segmentation::UnicodeSegmentation;

use crate::similarity::similarity_ratio;

/// Confidences and thresholds of the classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub exact_whole_confidence: f32,
    pub exact_partial_confidence: f32,
    /// Whole-keyword similarity must exceed this
    pub phrase_threshold: f32,
    pub phrase_weight: f32,
    /// Per-word similarity must exceed this
    pub word_threshold: f32,
    pub word_weight: f32,
    pub unknown_confidence: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            exact_whole_confidence: 0.9,
            exact_partial_confidence: 0.8,
            phrase_threshold: 0.7,
            phrase_weight: 0.8,
            word_threshold: 0.8,
            word_weight: 0.7,
            unknown_confidence: 0.3,
        }
    }
}

/// How a classification was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    FuzzyPhrase,
    FuzzyWord,
    None,
}

/// Classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: String,
    pub confidence: f32,
    pub kind: MatchKind,
    /// Keyword responsible for the match
    pub keyword: Option<String>,
}

impl Classification {
    fn unknown(confidence: f32) -> Self {
        Self {
            intent: UNKNOWN_INTENT.to_string(),
            confidence,
            kind: MatchKind::None,
            keyword: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.kind == MatchKind::None
    }
}

#[derive(Debug, Clone)]
struct IntentKeywords {
    intent: String,
    keywords: Vec<String>,
}

/// Keyword/fuzzy intent classifier over an ordered keyword table
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    table: Vec<IntentKeywords>,
    config: ClassifierConfig,
}

impl IntentClassifier {
    /// Build from `(intent, keywords)` pairs; order is the tie-break order
    pub fn new(table: Vec<(String, Vec<String>)>, config: ClassifierConfig) -> Self {
        let table = table
            .into_iter()
            .map(|(intent, keywords)| IntentKeywords {
                intent,
                keywords: keywords
                    .into_iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();

        Self { table, config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn intents(&self) -> impl Iterator<Item = &str> {
        self.table.iter().map(|entry| entry.intent.as_str())
    }

    /// Classify an utterance
    pub fn classify(&self, text: &str) -> Classification {
        let text_lower = text.trim().to_lowercase();

        if let Some(result) = self.exact_match(&text_lower) {
            tracing::debug!(intent = %result.intent, keyword = ?result.keyword, "Exact intent match");
            return result;
        }

        if let Some(result) = self.fuzzy_match(&text_lower) {
            tracing::debug!(
                intent = %result.intent,
                confidence = result.confidence,
                kind = ?result.kind,
                "Fuzzy intent match"
            );
            return result;
        }

        tracing::debug!("No intent matched");
        Classification::unknown(self.config.unknown_confidence)
    }

    fn exact_match(&self, text_lower: &str) -> Option<Classification> {
        if text_lower.is_empty() {
            return None;
        }

        for entry in &self.table {
            for keyword in &entry.keywords {
                if text_lower.contains(keyword.as_str()) {
                    let confidence = if keyword == text_lower {
                        self.config.exact_whole_confidence
                    } else {
                        self.config.exact_partial_confidence
                    };
                    return Some(Classification {
                        intent: entry.intent.clone(),
                        confidence,
                        kind: MatchKind::Exact,
                        keyword: Some(keyword.clone()),
                    });
                }
            }
        }

        None
    }

    fn fuzzy_match(&self, text_lower: &str) -> Option<Classification> {
        let words: Vec<&str> = text_lower.unicode_words().collect();
        let mut best: Option<Classification> = None;

        let mut consider = |candidate: Classification| {
            let better = best
                .as_ref()
                .map_or(true, |current| candidate.confidence > current.confidence);
            if better {
                best = Some(candidate);
            }
        };

        for entry in &self.table {
            for keyword in &entry.keywords {
                let similarity = similarity_ratio(text_lower, keyword);
                if similarity > self.config.phrase_threshold {
                    consider(Classification {
                        intent: entry.intent.clone(),
                        confidence: similarity * self.config.phrase_weight,
                        kind: MatchKind::FuzzyPhrase,
                        keyword: Some(keyword.clone()),
                    });
                }

                for keyword_word in keyword.split_whitespace() {
                    for word in &words {
                        let word_similarity = similarity_ratio(word, keyword_word);
                        if word_similarity > self.config.word_threshold {
                            consider(Classification {
                                intent: entry.intent.clone(),
                                confidence: word_similarity * self.config.word_weight,
                                kind: MatchKind::FuzzyWord,
                                keyword: Some(keyword.clone()),
                            });
                        }
                    }
                }
            }
        }

        best
    }
}
