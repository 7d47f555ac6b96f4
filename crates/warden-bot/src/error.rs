//! Application error types.

use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Telegram error: {0}")]
    Telegram(#[from] telegram_client::TelegramError),

    #[error("Relay error: {0}")]
    Relay(#[from] relay_control::RelayError),

    #[error("Store error: {0}")]
    Store(#[from] ledger_store::StoreError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] relay_ledger::LedgerError),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;
