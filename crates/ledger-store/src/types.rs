//! Ledger record types.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest total a ledger column can hold (SQLite INTEGER is signed 64-bit).
pub const MAX_TOTAL: u64 = i64::MAX as u64;

/// Cumulative or per-pass byte counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traffic {
    pub uplink: u64,
    pub downlink: u64,
}

impl Traffic {
    pub fn new(uplink: u64, downlink: u64) -> Self {
        Self { uplink, downlink }
    }

    pub fn is_zero(&self) -> bool {
        self.uplink == 0 && self.downlink == 0
    }

    /// Add `other`, or `None` if either direction would exceed [`MAX_TOTAL`].
    pub fn checked_add(self, other: Traffic) -> Option<Traffic> {
        let uplink = self.uplink.checked_add(other.uplink)?;
        let downlink = self.downlink.checked_add(other.downlink)?;
        if uplink > MAX_TOTAL || downlink > MAX_TOTAL {
            return None;
        }
        Some(Traffic { uplink, downlink })
    }

    /// Saturating sum, for in-memory aggregation of a single pass.
    pub fn saturating_add(self, other: Traffic) -> Traffic {
        Traffic {
            uplink: self.uplink.saturating_add(other.uplink),
            downlink: self.downlink.saturating_add(other.downlink),
        }
    }
}

/// A registered end user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    /// Messaging-platform user id the identity was registered with.
    pub external_id: i64,
    pub name: String,
    pub traffic: Traffic,
    /// Ordered credential ids; in practice zero or one.
    pub credential_ids: Vec<String>,
    /// Bumped on every write; used for optimistic concurrency.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Connection material for one relay user entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    /// Relay-visible user key; appears inside traffic counter names.
    pub correlation_key: String,
    pub secret: String,
    /// Rendered share link, filled lazily on first request.
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(
        id: impl Into<String>,
        correlation_key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            correlation_key: correlation_key.into(),
            secret: secret.into(),
            link: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct IdentityRow {
    pub id: i64,
    pub external_id: i64,
    pub name: String,
    pub uplink: i64,
    pub downlink: i64,
    pub credential_ids: String,
    pub revision: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = StoreError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        let credential_ids: Vec<String> = if row.credential_ids.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&row.credential_ids)?
        };

        Ok(Identity {
            id: row.id,
            external_id: row.external_id,
            name: row.name,
            traffic: Traffic {
                uplink: row.uplink.max(0) as u64,
                downlink: row.downlink.max(0) as u64,
            },
            credential_ids,
            revision: row.revision,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CredentialRow {
    pub id: String,
    pub correlation_key: String,
    pub secret: String,
    pub link: Option<String>,
    pub created_at: String,
}

impl TryFrom<CredentialRow> for Credential {
    type Error = StoreError;

    fn try_from(row: CredentialRow) -> Result<Self, Self::Error> {
        Ok(Credential {
            id: row.id,
            correlation_key: row.correlation_key,
            secret: row.secret,
            link: row.link,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp {:?}: {}", value, e)))
}

pub(crate) fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}
