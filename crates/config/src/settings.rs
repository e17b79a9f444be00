//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{AgentProfile, ConfigError};

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub agent: AgentProfile,

    #[serde(default)]
    pub dialogue: DialogueConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Path to the function schema file (JSON or YAML); built-in set when absent
    #[serde(default)]
    pub functions_path: Option<String>,
}

/// Dialogue engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Intent confidence must be strictly above this to accept it
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f32,

    /// History entries passed along with a clarification request
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Missing parameters asked about in a single question (1 or 2)
    #[serde(default = "default_question_batch")]
    pub question_batch: usize,

    /// Region phone numbers are validated against
    #[serde(default = "default_phone_region")]
    pub phone_region: String,
}

fn default_acceptance_threshold() -> f32 {
    0.7
}

fn default_history_window() -> usize {
    3
}

fn default_question_batch() -> usize {
    1
}

fn default_phone_region() -> String {
    "US".to_string()
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: default_acceptance_threshold(),
            history_window: default_history_window(),
            question_batch: default_question_batch(),
            phone_region: default_phone_region(),
        }
    }
}

/// Keyword classifier confidences and fuzzy thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Confidence when the whole utterance equals a keyword
    #[serde(default = "default_exact_whole")]
    pub exact_whole_confidence: f32,

    /// Confidence when a keyword is a substring of the utterance
    #[serde(default = "default_exact_partial")]
    pub exact_partial_confidence: f32,

    #[serde(default = "default_phrase_threshold")]
    pub phrase_threshold: f32,

    #[serde(default = "default_phrase_weight")]
    pub phrase_weight: f32,

    #[serde(default = "default_word_threshold")]
    pub word_threshold: f32,

    #[serde(default = "default_word_weight")]
    pub word_weight: f32,

    #[serde(default = "default_unknown_confidence")]
    pub unknown_confidence: f32,
}

fn default_exact_whole() -> f32 {
    0.9
}
fn default_exact_partial() -> f32 {
    0.8
}
fn default_phrase_threshold() -> f32 {
    0.7
}
fn default_phrase_weight() -> f32 {
    0.8
}
fn default_word_threshold() -> f32 {
    0.8
}
fn default_word_weight() -> f32 {
    0.7
}
fn default_unknown_confidence() -> f32 {
    0.3
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            exact_whole_confidence: default_exact_whole(),
            exact_partial_confidence: default_exact_partial(),
            phrase_threshold: default_phrase_threshold(),
            phrase_weight: default_phrase_weight(),
            word_threshold: default_word_threshold(),
            word_weight: default_word_weight(),
            unknown_confidence: default_unknown_confidence(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_dialogue()?;
        self.validate_classifier()?;
        self.validate_observability()?;
        Ok(())
    }

    fn validate_dialogue(&self) -> Result<(), ConfigError> {
        let dialogue = &self.dialogue;

        check_unit_range("dialogue.acceptance_threshold", dialogue.acceptance_threshold)?;

        if !(1..=2).contains(&dialogue.question_batch) {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.question_batch".to_string(),
                message: format!("Must be 1 or 2, got {}", dialogue.question_batch),
            });
        }

        if dialogue.phone_region.trim().is_empty() {
            return Err(ConfigError::MissingField("dialogue.phone_region".to_string()));
        }

        Ok(())
    }

    fn validate_classifier(&self) -> Result<(), ConfigError> {
        let c = &self.classifier;
        check_unit_range("classifier.exact_whole_confidence", c.exact_whole_confidence)?;
        check_unit_range("classifier.exact_partial_confidence", c.exact_partial_confidence)?;
        check_unit_range("classifier.phrase_threshold", c.phrase_threshold)?;
        check_unit_range("classifier.phrase_weight", c.phrase_weight)?;
        check_unit_range("classifier.word_threshold", c.word_threshold)?;
        check_unit_range("classifier.word_weight", c.word_weight)?;
        check_unit_range("classifier.unknown_confidence", c.unknown_confidence)?;
        Ok(())
    }

    fn validate_observability(&self) -> Result<(), ConfigError> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        let level = self.observability.log_level.to_lowercase();
        if !LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "observability.log_level".to_string(),
                message: format!("Unknown level '{}'", self.observability.log_level),
            });
        }
        Ok(())
    }
}

fn check_unit_range(field: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be between 0.0 and 1.0, got {}", value),
        });
    }
    Ok(())
}

/// Load settings from `config/` in the working directory
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env)
}

/// Load settings from `{dir}/default`, then `{dir}/{env}`, then `SLOT_AGENT__*` variables
pub fn load_settings_from(dir: impl AsRef<Path>, env: Option<&str>) -> Result<Settings, ConfigError> {
    let dir = dir.as_ref();
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::from(dir.join("default")).required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder = builder.add_source(File::from(dir.join(env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("SLOT_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    // Validate
    settings.validate()?;

    tracing::debug!(dir = %dir.display(), env = ?env, "Settings loaded");

    Ok(settings)
}
