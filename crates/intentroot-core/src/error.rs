//! Error types for intentroot

use thiserror::Error;

/// Result type alias using IntentRootError
pub type Result<T> = std::result::Result<T, IntentRootError>;

/// Error type alias for convenience
pub type Error = IntentRootError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for intentroot
#[derive(Debug, Error)]
pub enum IntentRootError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Collection already exists: {0}")]
    CollectionExists(String),

    #[error("Invalid vector size: expected {expected}, got {actual}")]
    InvalidVectorSize { expected: usize, actual: usize },

    #[error("Unknown facet '{facet}' for collection {collection}")]
    UnknownFacet { collection: String, facet: String },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("{service} timed out after {elapsed_ms}ms")]
    Timeout { service: String, elapsed_ms: u64 },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Resolution cancelled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl IntentRootError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CollectionNotFound(_) => exit_codes::NOT_FOUND,
            Self::Config(_)
            | Self::Regex(_)
            | Self::InvalidInput(_)
            | Self::InvalidVectorSize { .. }
            | Self::UnknownFacet { .. } => exit_codes::INVALID_INPUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// Whether this error came from an external call exceeding its deadline
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}
