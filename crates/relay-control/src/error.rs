//! Relay control errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    /// Transport failure: refused connection, timeout, or a relay-side 5xx.
    #[error("Relay unavailable: {0}")]
    Unavailable(String),

    /// The relay understood the request and refused it.
    #[error("Relay rejected request: {status} - {message}")]
    Rejected { status: u16, message: String },

    #[error("Not found on relay: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RelayError {
    /// Whether the failure came from the transport rather than the relay.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, RelayError::Unavailable(_))
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            if status.is_client_error() {
                return RelayError::Rejected {
                    status: status.as_u16(),
                    message: e.to_string(),
                };
            }
        }
        RelayError::Unavailable(e.to_string())
    }
}
