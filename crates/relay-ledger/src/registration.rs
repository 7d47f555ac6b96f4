//! Single-use registration tokens.

use crate::error::{LedgerError, LedgerResult};
use ledger_store::{Identity, StoreError, UserStore};
use rand::RngCore;
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Issues invite tokens and turns a redeemed token into a new identity.
///
/// Outstanding tokens live in process memory only and are lost on restart.
pub struct RegistrationAuthority {
    users: UserStore,
    outstanding: Mutex<HashSet<String>>,
}

impl RegistrationAuthority {
    pub fn new(users: UserStore) -> Self {
        Self {
            users,
            outstanding: Mutex::new(HashSet::new()),
        }
    }

    /// Mint a fresh 128-bit token, hex encoded.
    pub async fn gen_token(&self) -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        self.outstanding.lock().await.insert(token.clone());
        info!("Issued registration token");
        token
    }

    /// Redeem `token` for `external_id`.
    ///
    /// The token is consumed only when the identity is created; a user that
    /// is already registered leaves it outstanding.
    #[instrument(skip(self, token))]
    pub async fn register(&self, token: &str, external_id: i64, name: &str) -> LedgerResult<Identity> {
        let mut outstanding = self.outstanding.lock().await;
        if !outstanding.contains(token) {
            warn!("Registration attempt with unknown token by {}", external_id);
            return Err(LedgerError::InvalidToken);
        }

        if self.users.find_by_external_id(external_id).await?.is_some() {
            return Err(LedgerError::AlreadyRegistered(external_id));
        }

        let identity = match self.users.create(external_id, name).await {
            Ok(identity) => identity,
            Err(StoreError::AlreadyExists(_)) => {
                return Err(LedgerError::AlreadyRegistered(external_id))
            }
            Err(e) => return Err(e.into()),
        };

        outstanding.remove(token);
        info!("Registered user {} as identity {}", external_id, identity.id);
        Ok(identity)
    }

    /// Number of tokens issued and not yet redeemed.
    pub async fn outstanding(&self) -> usize {
        self.outstanding.lock().await.len()
    }
}
