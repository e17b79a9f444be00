//! Values pulled from the same utterance that revealed the intent
//!
//! "create a client, email is ana@example.com" should not make the user repeat
//! the email later.

use once_cell::sync::Lazy;
use regex::Regex;
use slot_agent_core::SlotCategory;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

static PHONE_DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap());

static AFTER_IN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bin\s+([A-Za-z][\w'-]*)").unwrap());

/// How a parameter can be spotted inline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineRule {
    /// An email address anywhere in the text
    Email,
    /// Ten digits with optional dash/dot separators
    PhoneDigits,
    /// The first word after " in " ("weather in Paris")
    WordAfterIn,
}

impl InlineRule {
    /// Rule for a parameter, if it has one
    pub fn for_parameter(name: &str, category: SlotCategory) -> Option<Self> {
        match category {
            SlotCategory::Email => Some(InlineRule::Email),
            SlotCategory::Phone => Some(InlineRule::PhoneDigits),
            _ if matches!(name, "location" | "city") => Some(InlineRule::WordAfterIn),
            _ => None,
        }
    }

    pub fn apply(&self, text: &str) -> Option<String> {
        match self {
            InlineRule::Email => EMAIL_RE.find(text).map(|m| m.as_str().to_string()),
            InlineRule::PhoneDigits => PHONE_DIGITS_RE.find(text).map(|m| m.as_str().to_string()),
            InlineRule::WordAfterIn => AFTER_IN_RE
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim_end_matches(|c: char| c == '\'' || c == '-').to_string()),
        }
    }
}

/// Apply each `(parameter, rule)` pair, returning the parameters that matched
pub fn extract_inline(text: &str, rules: &[(String, InlineRule)]) -> Vec<(String, String)> {
    rules
        .iter()
        .filter_map(|(parameter, rule)| rule.apply(text).map(|value| (parameter.clone(), value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_follow_categories() {
        assert_eq!(InlineRule::for_parameter("email", SlotCategory::Email), Some(InlineRule::Email));
        assert_eq!(
            InlineRule::for_parameter("phone_number", SlotCategory::Phone),
            Some(InlineRule::PhoneDigits)
        );
        assert_eq!(
            InlineRule::for_parameter("location", SlotCategory::Other),
            Some(InlineRule::WordAfterIn)
        );
        assert_eq!(InlineRule::for_parameter("client_name", SlotCategory::Name), None);
    }

    #[test]
    fn test_extract_email_and_phone() {
        let rules = vec![
            ("email".to_string(), InlineRule::Email),
            ("phone_number".to_string(), InlineRule::PhoneDigits),
        ];
        let found = extract_inline(
            "create a client, email ana.lee@example.com and phone 555-123-4567",
            &rules,
        );
        assert_eq!(
            found,
            vec![
                ("email".to_string(), "ana.lee@example.com".to_string()),
                ("phone_number".to_string(), "555-123-4567".to_string()),
            ]
        );
    }

    #[test]
    fn test_location_after_in() {
        let rules = vec![("location".to_string(), InlineRule::WordAfterIn)];
        assert_eq!(
            extract_inline("what's the weather in Paris today", &rules),
            vec![("location".to_string(), "Paris".to_string())]
        );
        assert!(extract_inline("what's the weather", &rules).is_empty());
    }
}
