//! Credential activation and traffic reconciliation against one relay inbound.

use crate::counter::{parse_counter_name, CounterCategory};
use crate::error::{LedgerError, LedgerResult};
use crate::locks::KeyedLocks;
use futures::stream::{self, StreamExt};
use ledger_store::{Credential, CredentialStore, Identity, StoreError, Traffic, UserStore};
use relay_control::link::{
    correlation_key, correlation_prefix, inbound_counter_pattern, user_counter_pattern,
};
use relay_control::{InboundSpec, LinkRenderer, RelayControl, RelayError};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Static settings of the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub inbound: InboundSpec,
    pub links: LinkRenderer,
    /// Activation calls in flight during a restore pass.
    pub restore_concurrency: usize,
}

/// Outcome of a restore pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub identities: usize,
    pub activated: usize,
    pub failed: usize,
    /// Credential ids listed on an identity but absent from the credential table.
    pub missing: usize,
}

impl RestoreReport {
    fn merge(mut self, other: RestoreReport) -> Self {
        self.identities += other.identities;
        self.activated += other.activated;
        self.failed += other.failed;
        self.missing += other.missing;
        self
    }
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Counters returned by the relay.
    pub samples: usize,
    /// Identities whose totals were written.
    pub committed: usize,
    /// Credentials whose traffic resolved to no identity and was dropped.
    pub stale: usize,
    /// Counters that did not parse or were outside the inbound's namespace.
    pub skipped: usize,
    /// Credentials whose traffic is held for the next pass.
    pub carried_over: usize,
}

/// Aggregate counter of one inbound for the current relay interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundTraffic {
    pub tag: String,
    pub traffic: Traffic,
}

/// Connection material ready to hand to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub credential_id: String,
    pub link: String,
    pub settings: String,
}

/// Keeps relay state and the durable ledger in step.
///
/// Construct once and share through an `Arc`. Flows touching the same
/// identity are serialised; reconciliation passes are serialised with each
/// other.
pub struct ReconciliationEngine {
    relay: Arc<dyn RelayControl>,
    credentials: CredentialStore,
    users: UserStore,
    config: EngineConfig,
    /// Held for the whole of a reconciliation pass. Guards traffic that was
    /// read and reset on the relay but not yet committed, keyed by credential id.
    pending: Mutex<HashMap<String, Traffic>>,
    identity_locks: KeyedLocks<i64>,
}

impl ReconciliationEngine {
    pub fn new(
        relay: Arc<dyn RelayControl>,
        credentials: CredentialStore,
        users: UserStore,
        config: EngineConfig,
    ) -> Self {
        Self {
            relay,
            credentials,
            users,
            config,
            pending: Mutex::new(HashMap::new()),
            identity_locks: KeyedLocks::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn tag(&self) -> &str {
        &self.config.inbound.tag
    }

    /// Reset the inbound to a clean slate: remove it if present, then create it.
    #[instrument(skip(self))]
    pub async fn prepare_inbound(&self) -> LedgerResult<()> {
        match self.relay.remove_inbound(self.tag()).await {
            Ok(()) => debug!("Removed previous inbound {}", self.tag()),
            Err(RelayError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        self.relay.configure_inbound(&self.config.inbound).await?;
        info!("Inbound {} ready", self.tag());
        Ok(())
    }

    /// Issue, activate and attach a new credential for a registered user.
    #[instrument(skip(self))]
    pub async fn provision(&self, external_id: i64) -> LedgerResult<IssuedCredential> {
        let identity = self.identity_for(external_id).await?;
        let _guard = self.identity_locks.lock(identity.id).await;
        let identity = self.reread(identity.id, external_id).await?;

        let credential = self.attach_new(&identity, identity.credential_ids.clone()).await?;
        self.issue(&credential).await
    }

    /// Replace every credential of a user with a single fresh one.
    ///
    /// On failure the previous credentials stay attached and are re-activated.
    #[instrument(skip(self))]
    pub async fn rotate(&self, external_id: i64) -> LedgerResult<IssuedCredential> {
        let identity = self.identity_for(external_id).await?;
        let _guard = self.identity_locks.lock(identity.id).await;
        let identity = self.reread(identity.id, external_id).await?;

        let previous = self.existing_credentials(&identity).await?;
        for key in self.relay_keys(&identity, &previous) {
            self.deactivate_quietly(&key).await;
        }

        match self.attach_new(&identity, Vec::new()).await {
            Ok(credential) => {
                info!(
                    "Rotated identity {}: {} old credential(s) replaced by {}",
                    identity.id,
                    previous.len(),
                    credential.id
                );
                self.issue(&credential).await
            }
            Err(e) => {
                for credential in &previous {
                    if let Err(re) = self.activate(credential).await {
                        warn!("Failed to re-activate {} after rotation failure: {}", credential.id, re);
                    }
                }
                Err(e)
            }
        }
    }

    /// Current connection material for a user, re-pushed to the relay.
    ///
    /// A user without credentials is provisioned one.
    #[instrument(skip(self))]
    pub async fn credentials(&self, external_id: i64) -> LedgerResult<Vec<IssuedCredential>> {
        let identity = self.identity_for(external_id).await?;
        let _guard = self.identity_locks.lock(identity.id).await;
        let identity = self.reread(identity.id, external_id).await?;

        if identity.credential_ids.is_empty() {
            let credential = self.attach_new(&identity, Vec::new()).await?;
            return Ok(vec![self.issue(&credential).await?]);
        }

        let mut issued = Vec::with_capacity(identity.credential_ids.len());
        for credential in self.load_credentials(&identity).await? {
            self.activate(&credential).await?;
            issued.push(self.issue(&credential).await?);
        }
        Ok(issued)
    }

    /// Re-activate every durable credential on the relay.
    ///
    /// Safe to run at any time. A failing credential is logged and counted,
    /// the rest are still processed.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> LedgerResult<RestoreReport> {
        let ids: Vec<i64> = self.users.all().await?.into_iter().map(|i| i.id).collect();
        info!("Restoring credentials of {} identities", ids.len());

        let report = stream::iter(ids)
            .map(|id| self.restore_identity(id))
            .buffer_unordered(self.config.restore_concurrency.max(1))
            .fold(RestoreReport::default(), |acc, r| async move { acc.merge(r) })
            .await;

        info!(
            "Restore finished: identities={} activated={} failed={} missing={}",
            report.identities, report.activated, report.failed, report.missing
        );
        Ok(report)
    }

    async fn restore_identity(&self, id: i64) -> RestoreReport {
        let mut report = RestoreReport::default();
        let _guard = self.identity_locks.lock(id).await;

        let identity = match self.users.get(id).await {
            Ok(Some(identity)) => identity,
            Ok(None) => return report,
            Err(e) => {
                warn!("Restore could not read identity {}: {}", id, e);
                report.failed += 1;
                return report;
            }
        };
        report.identities = 1;

        for credential_id in &identity.credential_ids {
            match self.credentials.get(credential_id).await {
                Ok(Some(credential)) => match self.activate(&credential).await {
                    Ok(()) => report.activated += 1,
                    Err(e) => {
                        warn!("Restore failed to activate {}: {}", credential.id, e);
                        report.failed += 1;
                    }
                },
                Ok(None) => {
                    warn!("Identity {} lists unknown credential {}", id, credential_id);
                    report.missing += 1;
                }
                Err(e) => {
                    warn!("Restore could not read credential {}: {}", credential_id, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Pull and reset per-credential counters and fold them into user totals.
    ///
    /// Passes never overlap. Traffic that was reset on the relay but could
    /// not be committed is retried on the next pass.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> LedgerResult<ReconcileReport> {
        let mut pending = self.pending.lock().await;
        let mut report = ReconcileReport::default();

        let stats = self
            .relay
            .query_counters(&user_counter_pattern(self.tag()), true)
            .await?;
        report.samples = stats.len();

        let prefix = correlation_prefix(self.tag());
        let mut by_credential: HashMap<String, Traffic> = std::mem::take(&mut *pending);

        for stat in stats {
            let name = match parse_counter_name(&stat.name) {
                Some(name) if name.category == CounterCategory::User => name,
                _ => {
                    debug!("Ignoring counter {:?}", stat.name);
                    report.skipped += 1;
                    continue;
                }
            };
            let Some(credential_id) = name.key.strip_prefix(&prefix) else {
                debug!("Counter {:?} is outside inbound {}", stat.name, self.tag());
                report.skipped += 1;
                continue;
            };
            if stat.value == 0 {
                continue;
            }

            let entry = by_credential.entry(credential_id.to_string()).or_default();
            *entry = entry.saturating_add(name.direction.traffic(stat.value));
        }

        // Resolve each credential to its owner and group by identity.
        let mut by_identity: BTreeMap<i64, Vec<(String, Traffic)>> = BTreeMap::new();
        for (credential_id, delta) in by_credential {
            match self.resolve(&credential_id).await {
                Ok(Some(identity_id)) => {
                    by_identity.entry(identity_id).or_default().push((credential_id, delta));
                }
                Ok(None) => {
                    warn!(
                        "Stale counter for credential {} (up={} down={}), dropping",
                        credential_id, delta.uplink, delta.downlink
                    );
                    report.stale += 1;
                }
                Err(e) => {
                    warn!("Could not resolve credential {}: {}", credential_id, e);
                    pending.insert(credential_id, delta);
                }
            }
        }

        for (identity_id, parts) in by_identity {
            let delta = parts
                .iter()
                .fold(Traffic::default(), |acc, (_, t)| acc.saturating_add(*t));

            let result = {
                let _guard = self.identity_locks.lock(identity_id).await;
                self.users.add_traffic(identity_id, delta).await
            };

            match result {
                Ok(identity) => {
                    debug!(
                        "Identity {} +up={} +down={}",
                        identity.id, delta.uplink, delta.downlink
                    );
                    report.committed += 1;
                }
                Err(StoreError::NotFound(_)) => {
                    warn!("Identity {} disappeared before commit, dropping traffic", identity_id);
                    report.stale += parts.len();
                }
                Err(StoreError::Overflow(_)) => {
                    error!(
                        "Traffic total of identity {} would overflow, dropping up={} down={}",
                        identity_id, delta.uplink, delta.downlink
                    );
                    report.skipped += parts.len();
                }
                Err(e) => {
                    warn!("Commit for identity {} failed, keeping delta: {}", identity_id, e);
                    for (credential_id, part) in parts {
                        let entry = pending.entry(credential_id).or_default();
                        *entry = entry.saturating_add(part);
                    }
                }
            }
        }

        report.carried_over = pending.len();
        info!(
            "Reconciled: samples={} committed={} stale={} skipped={} carried_over={}",
            report.samples, report.committed, report.stale, report.skipped, report.carried_over
        );
        Ok(report)
    }

    /// Inbound-level counters for the current interval. Read-only.
    #[instrument(skip(self))]
    pub async fn inbound_traffic(&self) -> LedgerResult<Vec<InboundTraffic>> {
        let stats = self
            .relay
            .query_counters(inbound_counter_pattern(), false)
            .await?;

        let mut by_tag: BTreeMap<String, Traffic> = BTreeMap::new();
        for stat in &stats {
            if let Some(name) = parse_counter_name(&stat.name) {
                if name.category == CounterCategory::Inbound {
                    let entry = by_tag.entry(name.key.to_string()).or_default();
                    *entry = entry.saturating_add(name.direction.traffic(stat.value));
                }
            }
        }

        Ok(by_tag
            .into_iter()
            .map(|(tag, traffic)| InboundTraffic { tag, traffic })
            .collect())
    }

    /// Bring the ledger up to date, then return the user's record.
    ///
    /// A relay failure is returned rather than showing stale totals.
    #[instrument(skip(self))]
    pub async fn usage(&self, external_id: i64) -> LedgerResult<Identity> {
        let identity = self.identity_for(external_id).await?;
        self.reconcile().await?;
        self.reread(identity.id, external_id).await
    }

    /// Deactivate a user's credentials and delete the identity.
    #[instrument(skip(self))]
    pub async fn delete_identity(&self, external_id: i64) -> LedgerResult<Identity> {
        let identity = self.identity_for(external_id).await?;
        let _guard = self.identity_locks.lock(identity.id).await;
        let identity = self.reread(identity.id, external_id).await?;

        let existing = self.existing_credentials(&identity).await?;
        for key in self.relay_keys(&identity, &existing) {
            self.deactivate_quietly(&key).await;
        }

        self.users.delete(identity.id).await?;
        info!("Deleted user {} (identity {})", external_id, identity.id);
        Ok(identity)
    }

    /// Every identity, heaviest downlink first.
    pub async fn leaderboard(&self) -> LedgerResult<Vec<Identity>> {
        let mut identities = self.users.all().await?;
        identities.sort_by(|a, b| b.traffic.downlink.cmp(&a.traffic.downlink));
        Ok(identities)
    }

    /// Every identity in registration order.
    pub async fn identities(&self) -> LedgerResult<Vec<Identity>> {
        Ok(self.users.all().await?)
    }

    async fn identity_for(&self, external_id: i64) -> LedgerResult<Identity> {
        self.users
            .find_by_external_id(external_id)
            .await?
            .ok_or(LedgerError::NotRegistered(external_id))
    }

    async fn reread(&self, id: i64, external_id: i64) -> LedgerResult<Identity> {
        self.users
            .get(id)
            .await?
            .ok_or(LedgerError::NotRegistered(external_id))
    }

    async fn load_credentials(&self, identity: &Identity) -> LedgerResult<Vec<Credential>> {
        let mut loaded = Vec::with_capacity(identity.credential_ids.len());
        for id in &identity.credential_ids {
            let credential = self
                .credentials
                .get(id)
                .await?
                .ok_or_else(|| LedgerError::MissingCredential(id.clone()))?;
            loaded.push(credential);
        }
        Ok(loaded)
    }

    /// The identity's credentials that still have a row; missing ones are logged.
    async fn existing_credentials(&self, identity: &Identity) -> LedgerResult<Vec<Credential>> {
        let mut found = Vec::with_capacity(identity.credential_ids.len());
        for id in &identity.credential_ids {
            match self.credentials.get(id).await? {
                Some(credential) => found.push(credential),
                None => warn!("Identity {} lists unknown credential {}", identity.id, id),
            }
        }
        Ok(found)
    }

    /// Relay user keys for every credential the identity lists, including
    /// keys stored under a previous inbound tag.
    fn relay_keys(&self, identity: &Identity, existing: &[Credential]) -> Vec<String> {
        let mut keys: Vec<String> = identity
            .credential_ids
            .iter()
            .map(|id| correlation_key(self.tag(), id))
            .collect();
        for credential in existing {
            if !keys.contains(&credential.correlation_key) {
                keys.push(credential.correlation_key.clone());
            }
        }
        keys
    }

    /// Owner of a credential, if the credential exists and is attached.
    async fn resolve(&self, credential_id: &str) -> Result<Option<i64>, StoreError> {
        if self.credentials.get(credential_id).await?.is_none() {
            return Ok(None);
        }
        Ok(self
            .users
            .find_by_credential(credential_id)
            .await?
            .map(|identity| identity.id))
    }

    fn new_credential(&self) -> Credential {
        let id = Uuid::new_v4().simple().to_string();
        let secret = Uuid::new_v4().to_string();
        Credential::new(id.clone(), correlation_key(self.tag(), &id), secret)
    }

    /// Create, activate and attach a credential; `keep` are the ids that stay
    /// attached alongside it. All-or-nothing.
    async fn attach_new(&self, identity: &Identity, keep: Vec<String>) -> LedgerResult<Credential> {
        let credential = self.new_credential();
        self.credentials.insert(&credential).await?;

        if let Err(e) = self.activate(&credential).await {
            warn!("Activation of {} failed, rolling back: {}", credential.id, e);
            self.discard(&credential).await;
            return Err(e);
        }

        let mut ids = keep;
        ids.push(credential.id.clone());
        if let Err(e) = self.users.set_credentials(identity.id, ids).await {
            warn!("Attaching {} to identity {} failed, rolling back: {}", credential.id, identity.id, e);
            self.deactivate_quietly(&credential.correlation_key).await;
            self.discard(&credential).await;
            return Err(e.into());
        }

        info!("Provisioned credential {} for identity {}", credential.id, identity.id);
        Ok(credential)
    }

    /// Push a credential to the relay under the current inbound's key,
    /// replacing any existing entry.
    ///
    /// A credential stored under another tag's key is re-keyed first so its
    /// counters fall inside the reconciled namespace.
    async fn activate(&self, credential: &Credential) -> LedgerResult<()> {
        let key = correlation_key(self.tag(), &credential.id);
        if credential.correlation_key != key {
            info!(
                "Re-keying credential {}: {} -> {}",
                credential.id, credential.correlation_key, key
            );
            self.deactivate_quietly(&credential.correlation_key).await;
            self.credentials
                .set_correlation_key(&credential.id, &key)
                .await?;
        }

        if let Err(e) = self.relay.deactivate_credential(self.tag(), &key).await {
            debug!("Pre-removal of {} failed: {}", key, e);
        }

        self.relay
            .activate_credential(self.tag(), &key, &credential.secret)
            .await?;
        Ok(())
    }

    async fn deactivate_quietly(&self, key: &str) {
        if let Err(e) = self.relay.deactivate_credential(self.tag(), key).await {
            warn!("Deactivation of {} failed: {}", key, e);
        }
    }

    async fn discard(&self, credential: &Credential) {
        if let Err(e) = self.credentials.remove(&credential.id).await {
            warn!("Could not remove unused credential {}: {}", credential.id, e);
        }
    }

    async fn issue(&self, credential: &Credential) -> LedgerResult<IssuedCredential> {
        let links = &self.config.links;
        let link = self
            .credentials
            .link_or_render(&credential.id, |c| links.link(&c.id, &c.secret))
            .await?;

        Ok(IssuedCredential {
            credential_id: credential.id.clone(),
            link,
            settings: links.settings_text(&credential.secret),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ledger_store::Database;
    use mockall::mock;
    use relay_control::CounterStat;
    use std::sync::Mutex as StdMutex;

    mock! {
        pub Relay {}

        #[async_trait]
        impl RelayControl for Relay {
            async fn configure_inbound(&self, inbound: &InboundSpec) -> Result<(), RelayError>;
            async fn remove_inbound(&self, tag: &str) -> Result<(), RelayError>;
            async fn activate_credential(
                &self,
                tag: &str,
                correlation_key: &str,
                secret: &str,
            ) -> Result<(), RelayError>;
            async fn deactivate_credential(
                &self,
                tag: &str,
                correlation_key: &str,
            ) -> Result<(), RelayError>;
            async fn query_counters(
                &self,
                pattern: &str,
                reset: bool,
            ) -> Result<Vec<CounterStat>, RelayError>;
        }
    }

    fn config() -> EngineConfig {
        EngineConfig {
            inbound: InboundSpec {
                tag: "vmess-in".into(),
                port: 12345,
                path: "/ws".into(),
            },
            links: LinkRenderer::new("relay.example.org", 443, "/ws"),
            restore_concurrency: 2,
        }
    }

    async fn engine_with(relay: MockRelay) -> (ReconciliationEngine, Database) {
        let db = Database::in_memory().await.unwrap();
        let engine = ReconciliationEngine::new(Arc::new(relay), db.credentials(), db.users(), config());
        (engine, db)
    }

    #[tokio::test]
    async fn test_prepare_inbound_ignores_missing_inbound() {
        let mut relay = MockRelay::new();
        relay
            .expect_remove_inbound()
            .times(1)
            .returning(|_| Err(RelayError::NotFound("handler not found".into())));
        relay
            .expect_configure_inbound()
            .withf(|spec| spec.tag == "vmess-in" && spec.port == 12345)
            .times(1)
            .returning(|_| Ok(()));

        let (engine, _db) = engine_with(relay).await;
        engine.prepare_inbound().await.unwrap();
    }

    #[tokio::test]
    async fn test_prepare_inbound_fails_when_configure_rejected() {
        let mut relay = MockRelay::new();
        relay.expect_remove_inbound().returning(|_| Ok(()));
        relay.expect_configure_inbound().returning(|_| {
            Err(RelayError::Rejected {
                status: 400,
                message: "port in use".into(),
            })
        });

        let (engine, _db) = engine_with(relay).await;
        let result = engine.prepare_inbound().await;
        assert!(matches!(result, Err(LedgerError::RelayRejected(_))));
    }

    #[tokio::test]
    async fn test_rejected_activation_leaves_identity_untouched() {
        let mut relay = MockRelay::new();
        relay.expect_deactivate_credential().returning(|_, _| Ok(()));
        relay
            .expect_activate_credential()
            .times(1)
            .returning(|_, _, _| {
                Err(RelayError::Rejected {
                    status: 409,
                    message: "already exists".into(),
                })
            });

        let (engine, db) = engine_with(relay).await;
        let identity = db.users().create(7, "carol").await.unwrap();

        let result = engine.provision(7).await;
        assert!(matches!(result, Err(LedgerError::RelayRejected(_))));

        let after = db.users().get(identity.id).await.unwrap().unwrap();
        assert!(after.credential_ids.is_empty());
        assert_eq!(after.revision, identity.revision);
    }

    #[tokio::test]
    async fn test_failed_rotation_reactivates_old_credential() {
        let activated = Arc::new(StdMutex::new(Vec::<String>::new()));

        let mut relay = MockRelay::new();
        relay.expect_deactivate_credential().returning(|_, _| Ok(()));
        {
            let activated = activated.clone();
            relay
                .expect_activate_credential()
                .times(3)
                .returning(move |_, key, _| {
                    let mut calls = activated.lock().unwrap();
                    calls.push(key.to_string());
                    // First: initial provision. Second: the rotated credential.
                    if calls.len() == 2 {
                        Err(RelayError::Unavailable("timeout".into()))
                    } else {
                        Ok(())
                    }
                });
        }

        let (engine, db) = engine_with(relay).await;
        db.users().create(7, "carol").await.unwrap();
        let old = engine.provision(7).await.unwrap();

        let result = engine.rotate(7).await;
        assert!(matches!(result, Err(LedgerError::RelayUnavailable(_))));

        let calls = activated.lock().unwrap().clone();
        let old_key = correlation_key("vmess-in", &old.credential_id);
        assert_eq!(calls[0], old_key);
        assert_ne!(calls[1], old_key);
        assert_eq!(calls[2], old_key);

        let identity = db.users().find_by_external_id(7).await.unwrap().unwrap();
        assert_eq!(identity.credential_ids, vec![old.credential_id]);
    }

    #[tokio::test]
    async fn test_reconcile_queries_user_namespace_with_reset() {
        let mut relay = MockRelay::new();
        relay
            .expect_query_counters()
            .withf(|pattern, reset| pattern.to_string() == "user>>>vmess-in-" && *reset)
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let (engine, _db) = engine_with(relay).await;
        let report = engine.reconcile().await.unwrap();
        assert_eq!(report, ReconcileReport::default());
    }

    #[tokio::test]
    async fn test_inbound_traffic_never_resets() {
        let mut relay = MockRelay::new();
        relay
            .expect_query_counters()
            .withf(|pattern, reset| pattern.to_string() == "inbound>>>" && !*reset)
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    CounterStat::new("inbound>>>vmess-in>>>traffic>>>uplink", 3),
                    CounterStat::new("user>>>vmess-in-x>>>traffic>>>uplink", 99),
                ])
            });

        let (engine, _db) = engine_with(relay).await;
        let snapshot = engine.inbound_traffic().await.unwrap();
        assert_eq!(
            snapshot,
            vec![InboundTraffic {
                tag: "vmess-in".into(),
                traffic: Traffic::new(3, 0),
            }]
        );
    }

    #[test]
    fn test_restore_report_merge() {
        let a = RestoreReport {
            identities: 1,
            activated: 2,
            failed: 0,
            missing: 1,
        };
        let b = RestoreReport {
            identities: 1,
            activated: 0,
            failed: 1,
            missing: 0,
        };
        assert_eq!(
            a.merge(b),
            RestoreReport {
                identities: 2,
                activated: 2,
                failed: 1,
                missing: 1,
            }
        );
    }
}
