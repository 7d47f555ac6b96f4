//! Shared helpers for relay-ledger integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ledger_store::{Database, Identity, Traffic};
use relay_control::{CounterStat, InboundSpec, LinkRenderer, RelayControl, RelayError};
use relay_ledger::{EngineConfig, ReconciliationEngine, RegistrationAuthority};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TAG: &str = "vmess-in";

#[derive(Default)]
struct RelayState {
    inbounds: HashSet<String>,
    /// (tag, correlation key) -> secret
    users: BTreeMap<(String, String), String>,
    counters: BTreeMap<String, u64>,
    failing_keys: HashSet<String>,
}

/// In-memory relay with the control plane's observable behaviour:
/// duplicate user keys are rejected, removal of unknown keys succeeds and
/// `reset` zeroes exactly the counters it returns.
#[derive(Default)]
pub struct FakeRelay {
    state: Mutex<RelayState>,
    unavailable: AtomicBool,
    pub activations: AtomicUsize,
    pub queries: AtomicUsize,
}

impl FakeRelay {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every call fail as if the relay were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Reject activation of one key.
    pub fn fail_activation_of(&self, key: &str) {
        self.state.lock().unwrap().failing_keys.insert(key.to_string());
    }

    /// Forget all users and counters, as after a relay restart.
    pub fn wipe(&self) {
        let mut state = self.state.lock().unwrap();
        state.users.clear();
        state.counters.clear();
    }

    /// Whether `key` is a user of any inbound.
    pub fn is_active(&self, key: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .users
            .keys()
            .any(|(_, active)| active == key)
    }

    pub fn active_keys(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .users
            .keys()
            .map(|(_, key)| key.clone())
            .collect()
    }

    pub fn has_inbound(&self, tag: &str) -> bool {
        self.state.lock().unwrap().inbounds.contains(tag)
    }

    pub fn add_inbound(&self, tag: &str) {
        self.state.lock().unwrap().inbounds.insert(tag.to_string());
    }

    /// Traffic through an active user entry, as the relay would count it.
    pub fn carry(&self, key: &str, traffic: Traffic) {
        assert!(self.is_active(key), "no active user {}", key);
        self.bump(&format!("user>>>{}>>>traffic>>>uplink", key), traffic.uplink);
        self.bump(&format!("user>>>{}>>>traffic>>>downlink", key), traffic.downlink);
    }

    /// Bump an arbitrary counter.
    pub fn bump(&self, name: &str, value: u64) {
        *self
            .state
            .lock()
            .unwrap()
            .counters
            .entry(name.to_string())
            .or_default() += value;
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.state.lock().unwrap().counters.get(name).copied().unwrap_or(0)
    }

    fn check_available(&self) -> Result<(), RelayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RelayError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RelayControl for FakeRelay {
    async fn configure_inbound(&self, inbound: &InboundSpec) -> Result<(), RelayError> {
        self.check_available()?;
        let mut state = self.state.lock().unwrap();
        if !state.inbounds.insert(inbound.tag.clone()) {
            return Err(RelayError::Rejected {
                status: 409,
                message: format!("existing tag found: {}", inbound.tag),
            });
        }
        Ok(())
    }

    async fn remove_inbound(&self, tag: &str) -> Result<(), RelayError> {
        self.check_available()?;
        let mut state = self.state.lock().unwrap();
        if !state.inbounds.remove(tag) {
            return Err(RelayError::NotFound(format!("handler not found: {}", tag)));
        }
        state.users.retain(|(t, _), _| t != tag);
        Ok(())
    }

    async fn activate_credential(
        &self,
        tag: &str,
        correlation_key: &str,
        secret: &str,
    ) -> Result<(), RelayError> {
        self.check_available()?;
        let mut state = self.state.lock().unwrap();
        if state.failing_keys.contains(correlation_key) {
            return Err(RelayError::Rejected {
                status: 400,
                message: format!("invalid user {}", correlation_key),
            });
        }
        let slot = (tag.to_string(), correlation_key.to_string());
        if state.users.contains_key(&slot) {
            return Err(RelayError::Rejected {
                status: 409,
                message: format!("User {} already exists.", correlation_key),
            });
        }
        state.users.insert(slot, secret.to_string());
        self.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn deactivate_credential(&self, tag: &str, correlation_key: &str) -> Result<(), RelayError> {
        self.check_available()?;
        self.state
            .lock()
            .unwrap()
            .users
            .remove(&(tag.to_string(), correlation_key.to_string()));
        Ok(())
    }

    async fn query_counters(&self, pattern: &str, reset: bool) -> Result<Vec<CounterStat>, RelayError> {
        self.check_available()?;
        self.queries.fetch_add(1, Ordering::SeqCst);

        let stats = {
            let mut state = self.state.lock().unwrap();
            let mut stats = Vec::new();
            for (name, value) in state.counters.iter_mut() {
                if name.contains(pattern) {
                    stats.push(CounterStat::new(name.clone(), *value));
                    if reset {
                        *value = 0;
                    }
                }
            }
            stats
        };

        // Let concurrent callers interleave with a pass in flight.
        tokio::task::yield_now().await;
        Ok(stats)
    }
}

pub struct Harness {
    pub relay: Arc<FakeRelay>,
    pub db: Database,
    pub engine: Arc<ReconciliationEngine>,
    pub authority: RegistrationAuthority,
}

impl Harness {
    pub async fn new() -> Self {
        let relay = FakeRelay::new();
        let db = Database::in_memory().await.expect("in-memory database");

        let engine = start_engine(&relay, &db, TAG).await;

        let authority = RegistrationAuthority::new(db.users());
        Self {
            relay,
            db,
            engine,
            authority,
        }
    }

    /// A second engine over the same relay and ledger, as after a restart
    /// with a different inbound tag.
    pub async fn restart_with_tag(&self, tag: &str) -> Arc<ReconciliationEngine> {
        start_engine(&self.relay, &self.db, tag).await
    }

    /// Register a user through a freshly minted token.
    pub async fn register(&self, external_id: i64) -> Identity {
        let token = self.authority.gen_token().await;
        self.authority
            .register(&token, external_id, &format!("user{}", external_id))
            .await
            .expect("register")
    }

    pub async fn identity(&self, external_id: i64) -> Identity {
        self.db
            .users()
            .find_by_external_id(external_id)
            .await
            .unwrap()
            .expect("identity exists")
    }

    /// Relay key of the user's only credential.
    pub async fn key_of(&self, external_id: i64) -> String {
        let identity = self.identity(external_id).await;
        assert_eq!(identity.credential_ids.len(), 1);
        format!("{}-{}", TAG, identity.credential_ids[0])
    }

    pub async fn totals(&self, external_id: i64) -> Traffic {
        self.identity(external_id).await.traffic
    }
}

async fn start_engine(relay: &Arc<FakeRelay>, db: &Database, tag: &str) -> Arc<ReconciliationEngine> {
    let config = EngineConfig {
        inbound: InboundSpec {
            tag: tag.into(),
            port: 12345,
            path: "/ws".into(),
        },
        links: LinkRenderer::new("relay.example.org", 443, "/ws"),
        restore_concurrency: 4,
    };
    let engine = Arc::new(ReconciliationEngine::new(
        relay.clone(),
        db.credentials(),
        db.users(),
        config,
    ));
    engine.prepare_inbound().await.expect("prepare inbound");
    engine
}

pub fn user_counter(key: &str, direction: &str) -> String {
    format!("user>>>{}>>>traffic>>>{}", key, direction)
}
