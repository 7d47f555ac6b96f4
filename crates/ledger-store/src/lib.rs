//! Durable ledger for relay credentials and registered identities.
//!
//! Two SQLite tables: `credentials` holds connection material keyed by an
//! opaque id, `identities` holds registered users with their credential list
//! and cumulative traffic totals. The schema only ever grows.

mod credentials;
mod db;
mod error;
mod types;
mod users;

pub use credentials::CredentialStore;
pub use db::Database;
pub use error::StoreError;
pub use types::*;
pub use users::UserStore;
