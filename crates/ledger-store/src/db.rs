//! SQLite connection and schema management.

use crate::credentials::CredentialStore;
use crate::error::StoreError;
use crate::users::UserStore;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};

const TIMESTAMP_COLUMN: &str = "TEXT NOT NULL DEFAULT '1970-01-01T00:00:00+00:00'";

/// Columns every `credentials` table must have, in addition to `id`.
///
/// Older files gain missing columns on open; nothing is dropped.
const CREDENTIAL_COLUMNS: &[(&str, &str)] = &[
    ("correlation_key", "TEXT NOT NULL DEFAULT ''"),
    ("secret", "TEXT NOT NULL DEFAULT ''"),
    ("link", "TEXT"),
    ("created_at", TIMESTAMP_COLUMN),
];

/// Columns every `identities` table must have, in addition to `id`.
const IDENTITY_COLUMNS: &[(&str, &str)] = &[
    ("external_id", "INTEGER NOT NULL DEFAULT 0"),
    ("name", "TEXT NOT NULL DEFAULT ''"),
    ("uplink", "INTEGER NOT NULL DEFAULT 0"),
    ("downlink", "INTEGER NOT NULL DEFAULT 0"),
    ("credential_ids", "TEXT NOT NULL DEFAULT '[]'"),
    ("revision", "INTEGER NOT NULL DEFAULT 0"),
    ("created_at", TIMESTAMP_COLUMN),
    ("updated_at", TIMESTAMP_COLUMN),
];

/// Handle to the ledger database.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database file at `path` and migrate it.
    #[instrument]
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;

        info!("Ledger database ready at {}", path.display());
        Ok(db)
    }

    /// Private in-memory database, for tests.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // A single connection that never expires, or the data goes with it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn credentials(&self) -> CredentialStore {
        CredentialStore::new(self.pool.clone())
    }

    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query("CREATE TABLE IF NOT EXISTS credentials (id TEXT PRIMARY KEY NOT NULL)")
            .execute(&self.pool)
            .await?;
        self.ensure_columns("credentials", CREDENTIAL_COLUMNS).await?;

        sqlx::query("CREATE TABLE IF NOT EXISTS identities (id INTEGER PRIMARY KEY AUTOINCREMENT)")
            .execute(&self.pool)
            .await?;
        self.ensure_columns("identities", IDENTITY_COLUMNS).await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_credentials_correlation_key \
             ON credentials(correlation_key)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_identities_external_id \
             ON identities(external_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add any of `columns` that `table` lacks.
    async fn ensure_columns(
        &self,
        table: &str,
        columns: &[(&str, &str)],
    ) -> Result<(), StoreError> {
        let existing: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?1)")
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        for (name, decl) in columns {
            if existing.iter().any(|c| c == name) {
                continue;
            }
            sqlx::query(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, name, decl))
                .execute(&self.pool)
                .await?;
            debug!("Added column {}.{}", table, name);
        }

        Ok(())
    }
}
