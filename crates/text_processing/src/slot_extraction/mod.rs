//! Slot value extraction from free-form replies
//!
//! One extractor per value category (name, phone, address, email). Each runs
//! an ordered chain of strategies and returns the first hit; every strategy
//! reports a typed [`ExtractionMiss`] instead of swallowing failures, so tests
//! can see exactly which path produced (or failed to produce) a value.
//!
//! Library-grade recognizers (NER, address parsing, phone metadata) are
//! injected as backends, see [`backends`].

pub mod address;
pub mod backends;
pub mod name;
pub mod phone;

pub use address::AddressExtractor;
pub use backends::{
    AddressParser, BackendError, EntityRecognizer, NanpPhoneParser, PatternAddressParser,
    PhoneCandidate, PhoneParser,
};
pub use name::NameExtractor;
pub use phone::{format_phone_number, PhoneExtractor};

use slot_agent_core::SlotCategory;
use std::sync::Arc;
use thiserror::Error;

/// Why a single strategy produced nothing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionMiss {
    #[error("no backend configured")]
    NoBackend,

    #[error("backend failed: {0}")]
    Backend(String),

    #[error("no candidate found")]
    NoCandidate,

    #[error("candidate rejected: {0}")]
    Rejected(String),
}

impl From<BackendError> for ExtractionMiss {
    fn from(err: BackendError) -> Self {
        ExtractionMiss::Backend(err.to_string())
    }
}

pub type StrategyResult = Result<String, ExtractionMiss>;

/// Runs strategies in order until one hits
///
/// Strategies are closures so later ones are never evaluated after a hit.
pub struct StrategyChain {
    category: SlotCategory,
    found: Option<String>,
}

impl StrategyChain {
    pub fn new(category: SlotCategory) -> Self {
        Self { category, found: None }
    }

    pub fn attempt<F>(mut self, strategy: &'static str, run: F) -> Self
    where
        F: FnOnce() -> StrategyResult,
    {
        if self.found.is_some() {
            return self;
        }

        match run() {
            Ok(value) => {
                tracing::debug!(slot = %self.category, strategy, "Extraction strategy hit");
                self.found = Some(value);
            },
            Err(miss) => {
                tracing::debug!(slot = %self.category, strategy, reason = %miss, "Extraction strategy missed");
            },
        }
        self
    }

    pub fn finish(self) -> Option<String> {
        self.found
    }
}

/// Extracts a value of one category from a reply
pub trait SlotExtractor: Send + Sync {
    fn category(&self) -> SlotCategory;

    /// Best value found in `text`, or `None`
    fn extract(&self, text: &str) -> Option<String>;
}

/// Email by containment: any reply with an "@" is taken whole
#[derive(Debug, Clone, Default)]
pub struct EmailExtractor;

impl EmailExtractor {
    pub fn by_containment(&self, text: &str) -> StrategyResult {
        let trimmed = text.trim();
        if trimmed.contains('@') {
            Ok(trimmed.to_string())
        } else {
            Err(ExtractionMiss::NoCandidate)
        }
    }
}

impl SlotExtractor for EmailExtractor {
    fn category(&self) -> SlotCategory {
        SlotCategory::Email
    }

    fn extract(&self, text: &str) -> Option<String> {
        StrategyChain::new(SlotCategory::Email)
            .attempt("containment", || self.by_containment(text))
            .finish()
    }
}

/// Extractors keyed by category
#[derive(Clone, Default)]
pub struct SlotExtractors {
    extractors: Vec<Arc<dyn SlotExtractor>>,
}

impl SlotExtractors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name, phone (validated for `phone_region`), address and email extractors
    /// with the in-crate backends
    pub fn standard(phone_region: &str) -> Self {
        Self::new()
            .with(NameExtractor::new())
            .with(PhoneExtractor::new(phone_region).with_parser(Arc::new(default_phone_parser())))
            .with(AddressExtractor::new().with_parser(Arc::new(PatternAddressParser::new())))
            .with(EmailExtractor)
    }

    /// Register an extractor, replacing any earlier one of the same category
    pub fn with(mut self, extractor: impl SlotExtractor + 'static) -> Self {
        self.insert(Arc::new(extractor));
        self
    }

    pub fn insert(&mut self, extractor: Arc<dyn SlotExtractor>) {
        let category = extractor.category();
        self.extractors.retain(|existing| existing.category() != category);
        self.extractors.push(extractor);
    }

    pub fn get(&self, category: SlotCategory) -> Option<&dyn SlotExtractor> {
        self.extractors
            .iter()
            .find(|extractor| extractor.category() == category)
            .map(|extractor| extractor.as_ref())
    }

    pub fn supports(&self, category: SlotCategory) -> bool {
        self.get(category).is_some()
    }
}

impl std::fmt::Debug for SlotExtractors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.extractors.iter().map(|e| e.category()))
            .finish()
    }
}

#[cfg(not(feature = "libphonenumber"))]
fn default_phone_parser() -> NanpPhoneParser {
    NanpPhoneParser::new()
}

#[cfg(feature = "libphonenumber")]
fn default_phone_parser() -> backends::LibPhoneNumberParser {
    backends::LibPhoneNumberParser::new()
}
