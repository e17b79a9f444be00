//! Pluggable recognizer backends used by the structured extraction strategies
//!
//! The extractors only see these traits. In-crate implementations cover
//! address patterns and NANP phone numbers; a person-name recognizer has no
//! in-crate implementation and is injected by the embedding application.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::phone::format_phone_number;

/// A backend call that failed outright (as opposed to finding nothing)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{backend} backend failed: {message}")]
pub struct BackendError {
    pub backend: String,
    pub message: String,
}

impl BackendError {
    pub fn new(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// Named-entity recognition restricted to person names
pub trait EntityRecognizer: Send + Sync {
    /// Person-name spans found in `text`, in order of appearance
    fn person_names(&self, text: &str) -> Result<Vec<String>, BackendError>;
}

/// Structured street-address recognition
pub trait AddressParser: Send + Sync {
    /// Address spans found in `text`
    fn parse(&self, text: &str) -> Result<Vec<String>, BackendError>;
}

/// A phone number located by a [`PhoneParser`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneCandidate {
    /// National format, e.g. "(212) 555-0123"
    pub national: String,
    /// Region code the number belongs to
    pub region: String,
    pub valid: bool,
}

/// Phone-number recognition with region metadata
pub trait PhoneParser: Send + Sync {
    /// Numbers found in `text`; numbers without a country code are read in `default_region`
    fn find_numbers(&self, text: &str, default_region: &str) -> Result<Vec<PhoneCandidate>, BackendError>;
}

// =============================================================================
// PATTERN ADDRESS PARSER
// =============================================================================

const STREET_TYPES: &str =
    "Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Way|Court|Ct|Place|Pl";

static ADDRESS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // Number + street, City, ST ZIP
        Regex::new(&format!(
            r"(?i)\b\d+\s+[A-Za-z\s]+(?:{})[\s,]+[A-Za-z\s]+,\s*[A-Z]{{2}}\s+\d{{5}}(?:-\d{{4}})?\b",
            STREET_TYPES
        ))
        .unwrap(),
        // PO Box, City, ST ZIP
        Regex::new(r"(?i)\bP\.?O\.?\s*Box\s+\d+[\s,]+[A-Za-z\s]+,\s*[A-Z]{2}\s+\d{5}(?:-\d{4})?\b")
            .unwrap(),
        // Street with unit/suite before the city
        Regex::new(&format!(
            r"(?i)\b\d+\s+[A-Za-z0-9\s.,#-]+(?:{})[A-Za-z0-9\s.,#-]*,\s*[A-Za-z\s]+,\s*[A-Z]{{2}}\s+\d{{5}}(?:-\d{{4}})?\b",
            STREET_TYPES
        ))
        .unwrap(),
    ]
});

/// Finds complete written addresses with a family of regular expressions
#[derive(Debug, Clone, Default)]
pub struct PatternAddressParser;

impl PatternAddressParser {
    pub fn new() -> Self {
        Self
    }
}

impl AddressParser for PatternAddressParser {
    fn parse(&self, text: &str) -> Result<Vec<String>, BackendError> {
        let mut found: Vec<String> = Vec::new();
        for pattern in ADDRESS_PATTERNS.iter() {
            for m in pattern.find_iter(text) {
                let candidate = m.as_str().trim().to_string();
                if !found.contains(&candidate) {
                    found.push(candidate);
                }
            }
        }
        Ok(found)
    }
}

// =============================================================================
// NANP PHONE PARSER
// =============================================================================

static PHONE_CANDIDATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:\+(?P<cc>\d{1,3})[\s.-]?|\b1[\s.-])?(?P<number>(?:\(\d{3}\)|\b\d{3})[\s.-]?\d{3}[\s.-]?\d{4})\b",
    )
    .unwrap()
});

/// North American Numbering Plan parser
///
/// Numbers without a country code, or with `+1`, belong to the plan and are
/// labelled with region "US"; any other country code is kept as `+NN` and
/// never reported valid.
#[derive(Debug, Clone, Default)]
pub struct NanpPhoneParser;

impl NanpPhoneParser {
    pub fn new() -> Self {
        Self
    }
}

impl PhoneParser for NanpPhoneParser {
    fn find_numbers(&self, text: &str, _default_region: &str) -> Result<Vec<PhoneCandidate>, BackendError> {
        let candidates = PHONE_CANDIDATE_RE
            .captures_iter(text)
            .filter_map(|caps| {
                let number = caps.name("number")?.as_str();
                let country_code = caps.name("cc").map(|m| m.as_str());
                let in_plan = matches!(country_code, None | Some("1"));

                let formatted = if in_plan { format_phone_number(number) } else { None };
                Some(PhoneCandidate {
                    national: formatted.clone().unwrap_or_else(|| number.to_string()),
                    region: match country_code {
                        Some(cc) if !in_plan => format!("+{}", cc),
                        _ => "US".to_string(),
                    },
                    valid: formatted.is_some(),
                })
            })
            .collect();
        Ok(candidates)
    }
}

// =============================================================================
// LIBPHONENUMBER PARSER
// =============================================================================

#[cfg(feature = "libphonenumber")]
pub use self::libphonenumber::LibPhoneNumberParser;

#[cfg(feature = "libphonenumber")]
mod libphonenumber {
    use once_cell::sync::Lazy;
    use phonenumber::{country, Mode};
    use regex::Regex;

    use super::{BackendError, PhoneCandidate, PhoneParser};

    static INTERNATIONAL_CANDIDATE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\+?\(?\d[\d\s().-]{6,}\d").unwrap());

    /// Parser backed by libphonenumber metadata (the `phonenumber` crate)
    #[derive(Debug, Clone)]
    pub struct LibPhoneNumberParser {
        default_country: country::Id,
    }

    impl LibPhoneNumberParser {
        pub fn new() -> Self {
            Self { default_country: country::Id::US }
        }

        pub fn with_default_country(default_country: country::Id) -> Self {
            Self { default_country }
        }
    }

    impl Default for LibPhoneNumberParser {
        fn default() -> Self {
            Self::new()
        }
    }

    impl PhoneParser for LibPhoneNumberParser {
        fn find_numbers(&self, text: &str, _default_region: &str) -> Result<Vec<PhoneCandidate>, BackendError> {
            let mut candidates = Vec::new();
            for m in INTERNATIONAL_CANDIDATE_RE.find_iter(text) {
                let Ok(number) = phonenumber::parse(Some(self.default_country), m.as_str()) else {
                    continue;
                };
                let region = number
                    .country()
                    .id()
                    .map(|id| format!("{:?}", id))
                    .unwrap_or_default();
                candidates.push(PhoneCandidate {
                    national: number.format().mode(Mode::National).to_string(),
                    region,
                    valid: phonenumber::is_valid(&number),
                });
            }
            Ok(candidates)
        }
    }
}
