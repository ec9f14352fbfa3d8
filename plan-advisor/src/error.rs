use thiserror::Error;

/// Errors produced by the advisor core and its collaborators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdvisorError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown plan: {0}")]
    UnknownPlan(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Narrative generation failed: {0}")]
    Narrative(String),

    #[error("Context retrieval failed: {0}")]
    Retrieval(String),

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },
}

pub type Result<T> = std::result::Result<T, AdvisorError>;
