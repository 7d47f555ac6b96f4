//! Identity table access.

use crate::error::StoreError;
use crate::types::{format_timestamp, Identity, IdentityRow, Traffic};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, instrument, warn};

const SELECT_IDENTITY: &str = "SELECT id, external_id, name, uplink, downlink, credential_ids, \
                               revision, created_at, updated_at FROM identities";

/// Durable identity records and their traffic totals.
///
/// Every write goes through a revision check, so concurrent writers never
/// silently overwrite each other.
#[derive(Clone, Debug)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an identity for `external_id`. Fails with `AlreadyExists` if one is present.
    #[instrument(skip(self))]
    pub async fn create(&self, external_id: i64, name: &str) -> Result<Identity, StoreError> {
        let now = format_timestamp(&Utc::now());
        let result = sqlx::query(
            r#"
            INSERT INTO identities
                (external_id, name, uplink, downlink, credential_ids, revision, created_at, updated_at)
            VALUES (?1, ?2, 0, 0, '[]', 0, ?3, ?3)
            "#,
        )
        .bind(external_id)
        .bind(name)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, format!("identity for user {}", external_id)))?;

        let id = result.last_insert_rowid();
        info!("Created identity {} for user {}", id, external_id);

        self.get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("identity {}", id)))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!("{} WHERE id = ?1", SELECT_IDENTITY))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Identity::try_from).transpose()
    }

    #[instrument(skip(self))]
    pub async fn find_by_external_id(&self, external_id: i64) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "{} WHERE external_id = ?1",
            SELECT_IDENTITY
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Identity::try_from).transpose()
    }

    /// Identity whose credential list contains `credential_id`, if any.
    #[instrument(skip(self))]
    pub async fn find_by_credential(&self, credential_id: &str) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "{} WHERE EXISTS (SELECT 1 FROM json_each(identities.credential_ids) WHERE value = ?1) \
             ORDER BY id LIMIT 1",
            SELECT_IDENTITY
        ))
        .bind(credential_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Identity::try_from).transpose()
    }

    /// Every identity, oldest first.
    #[instrument(skip(self))]
    pub async fn all(&self) -> Result<Vec<Identity>, StoreError> {
        let rows = sqlx::query_as::<_, IdentityRow>(&format!("{} ORDER BY id", SELECT_IDENTITY))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Identity::try_from).collect()
    }

    /// Write `identity` back if nobody else wrote it since it was read.
    ///
    /// Returns the stored record with its new revision, or `Conflict` if the
    /// revision moved.
    pub async fn save(&self, identity: &Identity) -> Result<Identity, StoreError> {
        let uplink = to_column(identity.id, identity.traffic.uplink)?;
        let downlink = to_column(identity.id, identity.traffic.downlink)?;
        let credential_ids = serde_json::to_string(&identity.credential_ids)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE identities
            SET name = ?1, uplink = ?2, downlink = ?3, credential_ids = ?4,
                revision = revision + 1, updated_at = ?5
            WHERE id = ?6 AND revision = ?7
            "#,
        )
        .bind(&identity.name)
        .bind(uplink)
        .bind(downlink)
        .bind(&credential_ids)
        .bind(format_timestamp(&now))
        .bind(identity.id)
        .bind(identity.revision)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(identity.id));
        }

        let mut saved = identity.clone();
        saved.revision += 1;
        saved.updated_at = now;
        Ok(saved)
    }

    /// Read-modify-write of one identity.
    ///
    /// `f` is applied to a fresh read. If another writer got in between,
    /// the record is re-read and `f` applied once more; a second lost race
    /// surfaces as `Conflict`.
    #[instrument(skip(self, f))]
    pub async fn modify<F>(&self, id: i64, mut f: F) -> Result<Identity, StoreError>
    where
        F: FnMut(&mut Identity) -> Result<(), StoreError>,
    {
        for attempt in 0..2 {
            let mut identity = self
                .get(id)
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("identity {}", id)))?;

            f(&mut identity)?;

            match self.save(&identity).await {
                Ok(saved) => return Ok(saved),
                Err(StoreError::Conflict(_)) if attempt == 0 => {
                    warn!("Identity {} changed underneath us, retrying", id);
                }
                Err(e) => return Err(e),
            }
        }

        Err(StoreError::Conflict(id))
    }

    pub async fn set_name(&self, id: i64, name: &str) -> Result<Identity, StoreError> {
        self.modify(id, |identity| {
            identity.name = name.to_string();
            Ok(())
        })
        .await
    }

    pub async fn set_credentials(
        &self,
        id: i64,
        credential_ids: Vec<String>,
    ) -> Result<Identity, StoreError> {
        self.modify(id, |identity| {
            identity.credential_ids = credential_ids.clone();
            Ok(())
        })
        .await
    }

    /// Add `delta` to both directions in a single write.
    pub async fn add_traffic(&self, id: i64, delta: Traffic) -> Result<Identity, StoreError> {
        let identity = self
            .modify(id, |identity| {
                identity.traffic = identity
                    .traffic
                    .checked_add(delta)
                    .ok_or(StoreError::Overflow(identity.id))?;
                Ok(())
            })
            .await?;

        debug!(
            "Identity {} traffic now up={} down={}",
            id, identity.traffic.uplink, identity.traffic.downlink
        );
        Ok(identity)
    }

    /// Delete an identity. Its credential rows are left for audit.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM identities WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("identity {}", id)));
        }

        info!("Deleted identity {}", id);
        Ok(())
    }
}

fn to_column(id: i64, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Overflow(id))
}
