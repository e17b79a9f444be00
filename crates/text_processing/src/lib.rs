//! Text processing for the slot-filling agent
//!
//! This crate turns noisy, transcribed replies into structured values:
//! - **Normalization**: filler stripping, spoken numbers, repeat collapse
//! - **Intent Classification**: exact and fuzzy keyword matching
//! - **Slot Extraction**: name, phone, address and email strategy chains
//!
//! # Example
//!
//! ```
//! use slot_agent_text_processing::{PhoneExtractor, SlotExtractor};
//!
//! let phone = PhoneExtractor::new("US");
//! assert_eq!(
//!     phone.extract("seven one 8 92 four 71 88").as_deref(),
//!     Some("(718) 924-7188")
//! );
//! ```

pub mod intent;
pub mod normalizer;
pub mod similarity;
pub mod slot_extraction;

pub use intent::{extract_inline, Classification, ClassifierConfig, InlineRule, IntentClassifier, MatchKind};
pub use normalizer::{
    clean_punctuation, extract_digits_only, fix_transcription_issues, handle_repeated_pattern,
    is_stop_word, normalize_numbers, normalize_whitespace, spoken_digits_to_numerals, FillerSet,
};
pub use similarity::similarity_ratio;
pub use slot_extraction::{
    format_phone_number, AddressExtractor, AddressParser, BackendError, EmailExtractor,
    EntityRecognizer, ExtractionMiss, NameExtractor, NanpPhoneParser, PatternAddressParser,
    PhoneCandidate, PhoneExtractor, PhoneParser, SlotExtractor, SlotExtractors, StrategyResult,
};
