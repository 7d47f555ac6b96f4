//! Credential table access.

use crate::error::StoreError;
use crate::types::{format_timestamp, Credential, CredentialRow};
use sqlx::SqlitePool;
use tracing::{debug, instrument};

/// Durable credential material, keyed by credential id.
///
/// Independent of identities: ownership lives in the identity's credential list.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    pool: SqlitePool,
}

impl CredentialStore {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, credential), fields(id = %credential.id))]
    pub async fn insert(&self, credential: &Credential) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO credentials (id, correlation_key, secret, link, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&credential.id)
        .bind(&credential.correlation_key)
        .bind(&credential.secret)
        .bind(&credential.link)
        .bind(format_timestamp(&credential.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, format!("credential {}", credential.id)))?;

        debug!("Stored credential {}", credential.id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, correlation_key, secret, link, created_at FROM credentials WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Credential::try_from).transpose()
    }

    /// Delete a credential row. Returns whether a row was removed.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM credentials WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Point a credential at a new relay key. Returns whether a row changed.
    #[instrument(skip(self))]
    pub async fn set_correlation_key(&self, id: &str, correlation_key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE credentials SET correlation_key = ?1 WHERE id = ?2")
            .bind(correlation_key)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from_insert(e, format!("correlation key {}", correlation_key)))?;

        Ok(result.rows_affected() > 0)
    }

    /// Return the cached link for `id`, rendering and caching it on first use.
    #[instrument(skip(self, render))]
    pub async fn link_or_render<F>(&self, id: &str, render: F) -> Result<String, StoreError>
    where
        F: FnOnce(&Credential) -> String,
    {
        let credential = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("credential {}", id)))?;

        if let Some(link) = credential.link {
            return Ok(link);
        }

        let link = render(&credential);
        sqlx::query("UPDATE credentials SET link = ?1 WHERE id = ?2 AND link IS NULL")
            .bind(&link)
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!("Cached link for credential {}", id);
        Ok(link)
    }
}
