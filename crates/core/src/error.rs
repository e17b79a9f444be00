//! Error types shared across the agent crates

use thiserror::Error;

/// Errors raised at the suggester boundary and while resolving schemas
#[derive(Error, Debug)]
pub enum Error {
    #[error("Suggester error: {0}")]
    Suggester(String),

    #[error("Invalid suggester response: {0}")]
    InvalidResponse(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
