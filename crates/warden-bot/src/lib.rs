//! Telegram front end for the relay ledger.
//!
//! The binary wires configuration, the ledger database, the relay control
//! client and the reconciliation engine together and exposes them as bot
//! commands.

pub mod commands;
pub mod config;
pub mod error;
pub mod format;
