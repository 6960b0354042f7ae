//! The mirror service: singleton state, update listener, aggregation
//! triggering.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::json;
use tokio::sync::RwLock;
use tracing::{info, warn};

use tally_bus::EventBus;
use tally_cache::{AttestationCache, BoundedStateMap};
use tally_ranking::{Aggregator, Debouncer, Leaderboard, RewardFormula};
use tally_types::{
    keys, Attestation, FullState, LedgerUpdate, Snapshot, StateDiff, Timestamp, TokenMeta, Topic,
};

use crate::attestation::AttestationLookup;
use crate::config::MirrorConfig;
use crate::error::MirrorError;
use crate::snapshot;

type StateMap = BoundedStateMap<serde_json::Value>;

/// The process-wide state mirror.
///
/// Owns the four bounded maps, the leaderboard, and the event bus. All
/// writes flow through the update listener methods (`initialize`,
/// `reinitialize`, `apply_update`); every other component reads.
pub struct MirrorService {
    config: MirrorConfig,
    state: Arc<RwLock<StateMap>>,
    governance: Arc<RwLock<StateMap>>,
    tokens: Arc<RwLock<BoundedStateMap<TokenMeta>>>,
    attestations: RwLock<AttestationCache>,
    leaderboard: Arc<Leaderboard>,
    aggregator: Arc<Aggregator>,
    bus: Arc<EventBus>,
    debouncer: Debouncer,
    lookup: Arc<dyn AttestationLookup>,
    initialized: AtomicBool,
}

impl MirrorService {
    /// Construct the service and spawn its debounce task. Must run inside
    /// a tokio runtime.
    pub fn new(
        config: MirrorConfig,
        formula: Arc<dyn RewardFormula>,
        lookup: Arc<dyn AttestationLookup>,
    ) -> Arc<Self> {
        let bus = Arc::new(EventBus::new(config.channel_capacity));
        let leaderboard = Arc::new(Leaderboard::new(config.ranking_capacity));
        let aggregator = Arc::new(Aggregator::new(
            formula,
            Arc::clone(&leaderboard),
            config.batch_size,
        ));
        let state = Arc::new(RwLock::new(BoundedStateMap::new(config.state_capacity)));
        let governance = Arc::new(RwLock::new(BoundedStateMap::new(config.governance_capacity)));
        let tokens = Arc::new(RwLock::new(BoundedStateMap::new(config.token_capacity)));
        let attestations = RwLock::new(AttestationCache::new(
            config.attestation_capacity,
            config.attestation_ttl_secs,
        ));

        let (debouncer, _task) = {
            let state = Arc::clone(&state);
            let aggregator = Arc::clone(&aggregator);
            let bus = Arc::clone(&bus);
            Debouncer::spawn(config.debounce(), move || {
                let state = Arc::clone(&state);
                let aggregator = Arc::clone(&aggregator);
                let bus = Arc::clone(&bus);
                async move {
                    run_pass(&state, &aggregator, &bus).await;
                }
            })
        };

        Arc::new(Self {
            config,
            state,
            governance,
            tokens,
            attestations,
            leaderboard,
            aggregator,
            bus,
            debouncer,
            lookup,
            initialized: AtomicBool::new(false),
        })
    }

    /// Seed the maps from the first full state dump and run the first
    /// aggregation immediately (not debounced).
    ///
    /// Fails with [`MirrorError::MissingConstants`] when the dump lacks
    /// the required constants entry — fatal, since no meaningful snapshot
    /// can be built.
    pub async fn initialize(&self, dump: FullState) -> Result<(), MirrorError> {
        if !dump.state.contains_key(keys::CONSTANTS_KEY) {
            return Err(MirrorError::MissingConstants);
        }
        self.seed(dump).await;
        self.initialized.store(true, Ordering::SeqCst);
        info!("mirror initialized, running first aggregation");
        self.run_aggregation_now().await;
        Ok(())
    }

    /// Re-seed the existing maps in place after a ledger-client
    /// reconnect. The dump is also relayed as one update per program so
    /// connected clients converge without reconnecting.
    pub async fn reinitialize(&self, dump: FullState) -> Result<(), MirrorError> {
        if !dump.state.contains_key(keys::CONSTANTS_KEY) {
            return Err(MirrorError::MissingConstants);
        }
        let state_payload = diff_payload(&dump.state);
        let governance_payload = diff_payload(&dump.governance);
        self.seed(dump).await;
        self.initialized.store(true, Ordering::SeqCst);
        self.bus.publish(Topic::StateUpdate, state_payload);
        self.bus.publish(Topic::GovernanceStateUpdate, governance_payload);
        info!("mirror reinitialized after ledger reconnect");
        self.run_aggregation_now().await;
        Ok(())
    }

    /// Apply one incremental diff from the ledger client.
    ///
    /// Entries are applied strictly in arrival order; each non-empty
    /// partition is written under a single map lock (no interleaved
    /// partial writes), relayed on its topic, and the aggregation
    /// debounce re-armed. Empty partitions are dropped.
    pub async fn apply_update(&self, update: LedgerUpdate) {
        if update.is_empty() {
            return;
        }
        if !update.state.is_empty() {
            let payload = diff_payload(&update.state);
            {
                let mut map = self.state.write().await;
                for (key, value) in update.state {
                    map.set(key, value);
                }
            }
            self.bus.publish(Topic::StateUpdate, payload);
        }
        if !update.governance.is_empty() {
            let payload = diff_payload(&update.governance);
            {
                let mut map = self.governance.write().await;
                for (key, value) in update.governance {
                    map.set(key, value);
                }
            }
            self.bus.publish(Topic::GovernanceStateUpdate, payload);
        }
        self.debouncer.trigger();
    }

    /// Record token metadata the first time an asset is seen. Token
    /// metadata is immutable; later registrations of the same asset are
    /// ignored.
    pub async fn register_token(&self, meta: TokenMeta) {
        let mut map = self.tokens.write().await;
        if map.peek(&meta.asset).is_none() {
            map.set(meta.asset.clone(), meta);
        }
    }

    /// Assemble the full point-in-time view for a newly connecting client.
    pub async fn snapshot(&self) -> Result<Snapshot, MirrorError> {
        if !self.is_initialized() {
            return Err(MirrorError::NotInitialized);
        }
        let state = self.state.read().await;
        let governance = self.governance.read().await;
        let tokens = self.tokens.read().await;
        Ok(snapshot::build(&state, &governance, &tokens))
    }

    /// Resolve an address to its attestation, consulting the cache first.
    ///
    /// A lookup failure is logged and reported as absent; it never breaks
    /// the caller's pipeline.
    pub async fn attestation_for(&self, address: &str) -> Option<Attestation> {
        let now = Timestamp::now();
        {
            let mut cache = self.attestations.write().await;
            if let Some(found) = cache.get(address, now) {
                return Some(found);
            }
        }
        match self.lookup.lookup(address).await {
            Ok(Some(attestation)) => {
                self.attestations
                    .write()
                    .await
                    .insert(address, attestation.clone(), now);
                Some(attestation)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(address, error = %e, "attestation lookup failed, treating as absent");
                None
            }
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn leaderboard(&self) -> &Arc<Leaderboard> {
        &self.leaderboard
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    async fn seed(&self, dump: FullState) {
        {
            let mut map = self.state.write().await;
            map.clear();
            for (key, value) in dump.state {
                map.set(key, value);
            }
        }
        {
            let mut map = self.governance.write().await;
            map.clear();
            for (key, value) in dump.governance {
                map.set(key, value);
            }
        }
        {
            let mut map = self.tokens.write().await;
            map.clear();
            for meta in dump.tokens {
                map.set(meta.asset.clone(), meta);
            }
        }
    }

    async fn run_aggregation_now(&self) {
        run_pass(&self.state, &self.aggregator, &self.bus).await;
    }
}

/// One aggregation pass: materialize the state map, rebuild, publish.
/// A failed pass is abandoned whole; the previous ranking stays visible
/// and the next state update re-arms the debounce.
async fn run_pass(state: &RwLock<StateMap>, aggregator: &Aggregator, bus: &EventBus) {
    let entries: Vec<(String, serde_json::Value)> = {
        let map = state.read().await;
        map.entries()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    };
    match aggregator.rebuild(entries).await {
        Ok(ranks) => {
            let payload = serde_json::to_value(&ranks).unwrap_or_else(|_| json!([]));
            bus.publish(Topic::RankingUpdate, payload);
        }
        Err(e) => {
            warn!(error = %e, "aggregation pass abandoned, keeping previous ranking");
        }
    }
}

/// Encode a diff as a key-sorted JSON object for relay.
fn diff_payload(diff: &StateDiff) -> serde_json::Value {
    let sorted: std::collections::BTreeMap<&str, &serde_json::Value> =
        diff.iter().map(|(key, value)| (key.as_str(), value)).collect();
    serde_json::to_value(sorted).unwrap_or_else(|_| json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    use tally_ranking::StaticRateFormula;

    use crate::attestation::{DisabledLookup, LookupError};

    fn test_service() -> Arc<MirrorService> {
        MirrorService::new(
            MirrorConfig::default(),
            Arc::new(StaticRateFormula::default()),
            Arc::new(DisabledLookup),
        )
    }

    fn dump_with_users() -> FullState {
        FullState {
            state: StateDiff::from([
                ("constants".to_string(), json!({"launch": 2024})),
                ("user_A".to_string(), json!({"balances": {"pts": 100}})),
                ("user_B".to_string(), json!({"balances": {"pts": 200}})),
                ("friend_A_2024-01-01".to_string(), json!("B")),
            ]),
            governance: StateDiff::from([("quorum".to_string(), json!(10))]),
            tokens: vec![TokenMeta::new("asset-1", "TLY", 6)],
        }
    }

    #[tokio::test]
    async fn initialize_requires_constants() {
        let service = test_service();
        let result = service.initialize(FullState::default()).await;
        assert!(matches!(result, Err(MirrorError::MissingConstants)));
        assert!(!service.is_initialized());
    }

    #[tokio::test]
    async fn snapshot_before_initialization_fails() {
        let service = test_service();
        assert!(matches!(
            service.snapshot().await,
            Err(MirrorError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn initialize_runs_first_aggregation_immediately() {
        let service = test_service();
        service.initialize(dump_with_users()).await.unwrap();

        let ranks = service.leaderboard().ranks().await;
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks[0].address, "B");
        assert_eq!(ranks[1].friends, 1);
    }

    #[tokio::test]
    async fn apply_update_relays_sorted_diff() {
        let service = test_service();
        service.initialize(dump_with_users()).await.unwrap();

        let mut rx = service.bus().subscribe(Topic::StateUpdate);
        service
            .apply_update(LedgerUpdate {
                state: StateDiff::from([
                    ("user_C".to_string(), json!({"balances": {}})),
                    ("user_A".to_string(), json!({"balances": {"pts": 50}})),
                ]),
                governance: StateDiff::new(),
            })
            .await;

        let event = rx.recv().await.unwrap();
        let object = event.data.as_object().unwrap();
        let keys: Vec<&String> = object.keys().collect();
        assert_eq!(keys, vec!["user_A", "user_C"]);
    }

    #[tokio::test]
    async fn empty_partitions_are_dropped() {
        let service = test_service();
        service.initialize(dump_with_users()).await.unwrap();

        let mut state_rx = service.bus().subscribe(Topic::StateUpdate);
        let mut governance_rx = service.bus().subscribe(Topic::GovernanceStateUpdate);

        service
            .apply_update(LedgerUpdate {
                state: StateDiff::new(),
                governance: StateDiff::from([("quorum".to_string(), json!(12))]),
            })
            .await;
        service.apply_update(LedgerUpdate::default()).await;

        let event = governance_rx.recv().await.unwrap();
        assert_eq!(event.data["quorum"], 12);
        assert!(state_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reinitialize_reseeds_in_place_and_relays() {
        let service = test_service();
        service.initialize(dump_with_users()).await.unwrap();

        let mut rx = service.bus().subscribe(Topic::StateUpdate);
        let fresh = FullState {
            state: StateDiff::from([
                ("constants".to_string(), json!({"launch": 2024})),
                ("user_Z".to_string(), json!({"balances": {"pts": 5}})),
            ]),
            governance: StateDiff::new(),
            tokens: Vec::new(),
        };
        service.reinitialize(fresh).await.unwrap();

        let snapshot = service.snapshot().await.unwrap();
        assert!(snapshot.state.contains_key("user_Z"));
        assert!(!snapshot.state.contains_key("user_A"));

        let event = rx.recv().await.unwrap();
        assert!(event.data.as_object().unwrap().contains_key("user_Z"));
    }

    #[tokio::test]
    async fn register_token_is_write_once() {
        let service = test_service();
        service.initialize(dump_with_users()).await.unwrap();

        service
            .register_token(TokenMeta::new("asset-1", "OTHER", 0))
            .await;
        service
            .register_token(TokenMeta::new("asset-2", "NEW", 2))
            .await;

        let snapshot = service.snapshot().await.unwrap();
        assert_eq!(snapshot.tokens["asset-1"].symbol, "TLY");
        assert_eq!(snapshot.tokens["asset-2"].symbol, "NEW");
    }

    struct CountingLookup(AtomicUsize);

    #[async_trait]
    impl AttestationLookup for CountingLookup {
        async fn lookup(&self, _address: &str) -> Result<Option<Attestation>, LookupError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Attestation::new(Some("alice".into()), None)))
        }
    }

    #[tokio::test]
    async fn attestation_lookup_result_is_cached() {
        let lookup = Arc::new(CountingLookup(AtomicUsize::new(0)));
        let service = MirrorService::new(
            MirrorConfig::default(),
            Arc::new(StaticRateFormula::default()),
            Arc::clone(&lookup) as Arc<dyn AttestationLookup>,
        );

        let first = service.attestation_for("addr").await.unwrap();
        let second = service.attestation_for("addr").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(lookup.0.load(Ordering::SeqCst), 1);
    }

    struct FailingLookup;

    #[async_trait]
    impl AttestationLookup for FailingLookup {
        async fn lookup(&self, _address: &str) -> Result<Option<Attestation>, LookupError> {
            let err = reqwest::Client::new()
                .get("http://[invalid")
                .build()
                .unwrap_err();
            Err(LookupError::Http(err))
        }
    }

    #[tokio::test]
    async fn attestation_failure_is_treated_as_absent() {
        let service = MirrorService::new(
            MirrorConfig::default(),
            Arc::new(StaticRateFormula::default()),
            Arc::new(FailingLookup),
        );
        assert_eq!(service.attestation_for("addr").await, None);
    }
}
