use risk_calc::FormError;
use thiserror::Error;
use types::errors::{ParseError, RequestError};

/// Central error type for the account-sync service
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("invalid response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("trade rejected: {0}")]
    Rejected(String),

    #[error("invalid request signature")]
    InvalidSignature,

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("mock backend failure: {0}")]
    Mock(String),
}

impl SyncError {
    /// True for failures reaching or talking to the backend, as opposed to
    /// requests refused before they were sent
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            SyncError::Transport { .. } | SyncError::Status { .. } | SyncError::Decode { .. } | SyncError::Mock(_)
        )
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
