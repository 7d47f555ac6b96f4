//! Reconciliation engine errors.

use ledger_store::StoreError;
use relay_control::RelayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// Transport failure reaching the relay. Nothing was committed locally.
    #[error("Relay unavailable: {0}")]
    RelayUnavailable(String),

    #[error("Relay rejected request: {0}")]
    RelayRejected(String),

    #[error("Invalid or already used registration token")]
    InvalidToken,

    #[error("User {0} is already registered")]
    AlreadyRegistered(i64),

    #[error("User {0} is not registered")]
    NotRegistered(i64),

    #[error("Concurrent update conflict: {0}")]
    StoreConflict(String),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Credential {0} is missing from the store")]
    MissingCredential(String),
}

impl LedgerError {
    pub fn is_relay_failure(&self) -> bool {
        matches!(
            self,
            LedgerError::RelayUnavailable(_) | LedgerError::RelayRejected(_)
        )
    }
}

impl From<RelayError> for LedgerError {
    fn from(e: RelayError) -> Self {
        match e {
            RelayError::Unavailable(msg) => LedgerError::RelayUnavailable(msg),
            RelayError::Json(e) => LedgerError::RelayUnavailable(format!("malformed reply: {}", e)),
            other @ (RelayError::Rejected { .. } | RelayError::NotFound(_)) => {
                LedgerError::RelayRejected(other.to_string())
            }
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(_) => LedgerError::StoreConflict(e.to_string()),
            other => LedgerError::Store(other),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
