//! Configuration management for the slot-filling agent
//!
//! Supports loading configuration from:
//! - YAML/TOML/JSON files (`config/default`, `config/{env}`)
//! - Environment variables (SLOT_AGENT_ prefix, `__` separator)
//!
//! Function schemas live in their own JSON or YAML file, see [`FunctionsConfig`].

pub mod agent;
pub mod functions;
pub mod settings;

pub use agent::AgentProfile;
pub use functions::{FunctionConfig, FunctionsConfig};
pub use settings::{
    load_settings, load_settings_from, ClassifierConfig, DialogueConfig, ObservabilityConfig,
    Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Duplicate function name: {0}")]
    DuplicateFunction(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for slot_agent_core::Error {
    fn from(err: ConfigError) -> Self {
        slot_agent_core::Error::Config(err.to_string())
    }
}
