//! Shared helpers for ledger-store integration tests.

use ledger_store::{Credential, Database};
use tempfile::TempDir;

pub async fn memory_db() -> Database {
    Database::in_memory().await.expect("in-memory database")
}

/// On-disk database in a fresh temp dir. Keep the dir alive for the test.
pub async fn file_db() -> (Database, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let db = Database::open(&dir.path().join("ledger.db"))
        .await
        .expect("open database");
    (db, dir)
}

pub fn credential(id: &str) -> Credential {
    Credential::new(id, format!("vmess-in-{}", id), format!("secret-{}", id))
}
