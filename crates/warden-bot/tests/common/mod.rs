//! Common test utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ledger_store::{Database, Traffic};
use relay_control::{CounterStat, InboundSpec, LinkRenderer, RelayControl, RelayError};
use relay_ledger::{EngineConfig, ReconciliationEngine, RegistrationAuthority};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use telegram_client::BotMessage;
use warden_bot::commands::Dispatcher;

pub const TAG: &str = "vmess-in";
pub const ADMIN: i64 = 1000;

#[derive(Default)]
struct RelayState {
    users: BTreeSet<String>,
    counters: BTreeMap<String, u64>,
}

/// Relay double that accepts every control call and keeps counters in memory.
#[derive(Default)]
pub struct FakeRelay {
    state: Mutex<RelayState>,
    unavailable: AtomicBool,
}

impl FakeRelay {
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn active_keys(&self) -> Vec<String> {
        self.state.lock().unwrap().users.iter().cloned().collect()
    }

    /// Traffic through an active user entry.
    pub fn carry(&self, key: &str, traffic: Traffic) {
        self.bump(&format!("user>>>{}>>>traffic>>>uplink", key), traffic.uplink);
        self.bump(&format!("user>>>{}>>>traffic>>>downlink", key), traffic.downlink);
    }

    pub fn carry_inbound(&self, tag: &str, traffic: Traffic) {
        self.bump(&format!("inbound>>>{}>>>traffic>>>uplink", tag), traffic.uplink);
        self.bump(&format!("inbound>>>{}>>>traffic>>>downlink", tag), traffic.downlink);
    }

    fn bump(&self, name: &str, value: u64) {
        *self
            .state
            .lock()
            .unwrap()
            .counters
            .entry(name.to_string())
            .or_default() += value;
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
    async fn configure_inbound(&self, _inbound: &InboundSpec) -> Result<(), RelayError> {
        self.check_available()
    }

    async fn remove_inbound(&self, _tag: &str) -> Result<(), RelayError> {
        self.check_available()
    }

    async fn activate_credential(
        &self,
        _tag: &str,
        correlation_key: &str,
        _secret: &str,
    ) -> Result<(), RelayError> {
        self.check_available()?;
        self.state
            .lock()
            .unwrap()
            .users
            .insert(correlation_key.to_string());
        Ok(())
    }

    async fn deactivate_credential(&self, _tag: &str, correlation_key: &str) -> Result<(), RelayError> {
        self.check_available()?;
        self.state.lock().unwrap().users.remove(correlation_key);
        Ok(())
    }

    async fn query_counters(&self, pattern: &str, reset: bool) -> Result<Vec<CounterStat>, RelayError> {
        self.check_available()?;
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
        Ok(stats)
    }
}

/// A dispatcher wired to an in-memory ledger and a fake relay.
pub struct TestBot {
    pub relay: Arc<FakeRelay>,
    pub db: Database,
    pub dispatcher: Dispatcher,
}

impl TestBot {
    pub async fn new() -> Self {
        let relay = Arc::new(FakeRelay::default());
        let db = Database::in_memory().await.unwrap();

        let engine = Arc::new(ReconciliationEngine::new(
            relay.clone(),
            db.credentials(),
            db.users(),
            EngineConfig {
                inbound: InboundSpec {
                    tag: TAG.into(),
                    port: 12345,
                    path: "/ws".into(),
                },
                links: LinkRenderer::new("relay.example.org", 443, "/ws"),
                restore_concurrency: 2,
            },
        ));
        engine.prepare_inbound().await.unwrap();

        let authority = Arc::new(RegistrationAuthority::new(db.users()));
        let admins = Arc::new(HashSet::from([ADMIN]));
        let dispatcher = Dispatcher::standard(engine, authority, admins);

        Self {
            relay,
            db,
            dispatcher,
        }
    }

    /// Send a private message and return the reply.
    pub async fn send(&self, user_id: i64, text: &str) -> String {
        self.dispatcher
            .dispatch(&private_message(user_id, text))
            .await
            .unwrap_or_default()
    }

    /// Register a user through an admin-issued token.
    pub async fn register(&self, user_id: i64) {
        let reply = self.send(ADMIN, "/token").await;
        let token = extract_code(&reply).to_string();
        let welcome = self.send(user_id, &format!("/register {}", token)).await;
        assert!(welcome.starts_with("Welcome"), "unexpected reply: {}", welcome);
    }
}

pub fn private_message(user_id: i64, text: &str) -> BotMessage {
    BotMessage {
        user_id,
        chat_id: user_id,
        text: text.into(),
        is_private: true,
        display_name: format!("user{}", user_id),
    }
}

pub fn group_message(user_id: i64, text: &str) -> BotMessage {
    BotMessage {
        chat_id: -500,
        is_private: false,
        ..private_message(user_id, text)
    }
}

/// Contents of the first `<code>` element in a reply.
pub fn extract_code(reply: &str) -> &str {
    let start = reply.find("<code>").expect("reply has <code>") + "<code>".len();
    let end = reply[start..].find("</code>").expect("closed <code>") + start;
    &reply[start..end]
}
