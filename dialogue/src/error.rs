use thiserror::Error;
use zoey_core::ZoeyError;

/// Errors raised by the dialogue layer
#[derive(Error, Debug)]
pub enum DialogueError {
    #[error("Invalid mode: {0}")]
    UnknownMode(String),

    #[error("Unknown flow step: {0}")]
    UnknownFlowStep(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Product search failed: {0}")]
    ProductSearch(String),

    #[error(transparent)]
    Upstream(#[from] ZoeyError),
}

/// Result type for dialogue operations
pub type DialogueResult<T> = Result<T, DialogueError>;
