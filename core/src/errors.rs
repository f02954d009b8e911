use thiserror::Error;

/// Errors raised while loading configuration or talking to the completion endpoint
#[derive(Error, Debug)]
pub enum ZoeyError {
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Request Error: {0}")]
    RequestError(String),

    #[error("Response Error: {0}")]
    ResponseError(String),

    #[error("Parsing Error: {0}")]
    ParsingError(String),

    #[error("HTTP Error: {status_code} - {message}")]
    HttpError { status_code: u16, message: String },

    #[error("Stream Error: {0}")]
    StreamError(String),
}

/// Result type for Zoey core operations
pub type ZoeyResult<T> = Result<T, ZoeyError>;
