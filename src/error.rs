use thiserror::Error;

#[derive(Error, Debug)]
pub enum NdrError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Action gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of the single call to the courier's action gateway.
///
/// None of these are retried by the engine; the caller decides whether to
/// re-submit the same (or a corrected) selection.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed gateway response: {0}")]
    MalformedResponse(String),

    #[error("gateway rejected the request: {0}")]
    Rejected(String),
}

impl NdrError {
    /// Gateway failures can be retried as-is; everything else needs the input fixed first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NdrError::Gateway(_))
    }
}

pub type Result<T> = std::result::Result<T, NdrError>;
