//! End-to-end tests of the update pipeline: diff ingestion, debounced
//! aggregation, and snapshot coherence.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use tally_cache::BoundedStateMap;
use tally_mirror::{DisabledLookup, MirrorConfig, MirrorService};
use tally_ranking::{FormulaError, RewardFormula, StaticRateFormula};
use tally_types::{FullState, LedgerUpdate, StateDiff, Topic};

/// Formula that counts aggregation passes by counting its own invocations
/// per distinct pass (one candidate per test state keeps this 1:1).
struct PassCounter(AtomicUsize);

#[async_trait]
impl RewardFormula for PassCounter {
    async fn normalized_total(
        &self,
        _address: &str,
        _user_state: &serde_json::Value,
    ) -> Result<f64, FormulaError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(1.0)
    }
}

fn initial_dump() -> FullState {
    FullState {
        state: StateDiff::from([
            ("constants".to_string(), json!({"launch": 2024})),
            ("user_A".to_string(), json!({"balances": {"pts": 1}})),
        ]),
        governance: StateDiff::new(),
        tokens: Vec::new(),
    }
}

fn update(n: u64) -> LedgerUpdate {
    LedgerUpdate {
        state: StateDiff::from([("user_A".to_string(), json!({"balances": {"pts": n}}))]),
        governance: StateDiff::new(),
    }
}

#[tokio::test(start_paused = true)]
async fn rapid_updates_cause_one_debounced_pass() {
    let formula = Arc::new(PassCounter(AtomicUsize::new(0)));
    let service = MirrorService::new(
        MirrorConfig::default(),
        Arc::clone(&formula) as Arc<dyn RewardFormula>,
        Arc::new(DisabledLookup),
    );
    service.initialize(initial_dump()).await.unwrap();
    // The immediate first aggregation computed the single candidate once.
    assert_eq!(formula.0.load(Ordering::SeqCst), 1);

    for n in 0..10 {
        service.apply_update(update(n)).await;
    }

    // Inside the quiet period nothing further has run.
    tokio::time::sleep(Duration::from_millis(1900)).await;
    assert_eq!(formula.0.load(Ordering::SeqCst), 1);

    // After the quiet period elapses, exactly one more pass.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(formula.0.load(Ordering::SeqCst), 2);

    // And it stays that way without new triggers.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(formula.0.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn debounced_pass_publishes_ranking_update() {
    let service = MirrorService::new(
        MirrorConfig::default(),
        Arc::new(StaticRateFormula::default()),
        Arc::new(DisabledLookup),
    );
    service.initialize(initial_dump()).await.unwrap();

    let mut rx = service.bus().subscribe(Topic::RankingUpdate);
    service.apply_update(update(41)).await;
    tokio::time::sleep(Duration::from_secs(3)).await;

    let event = rx.recv().await.unwrap();
    let ranks = event.data.as_array().unwrap();
    assert_eq!(ranks.len(), 1);
    assert_eq!(ranks[0]["address"], "A");
    assert_eq!(ranks[0]["amount"], 41.0);
}

#[tokio::test]
async fn snapshot_equals_incremental_application_of_its_diffs() {
    let service = MirrorService::new(
        MirrorConfig::default(),
        Arc::new(StaticRateFormula::default()),
        Arc::new(DisabledLookup),
    );

    let diffs: Vec<StateDiff> = vec![
        StateDiff::from([
            ("constants".to_string(), json!({"launch": 2024})),
            ("user_A".to_string(), json!({"balances": {"pts": 1}})),
        ]),
        StateDiff::from([("user_B".to_string(), json!({"balances": {"pts": 2}}))]),
        // Overwrites user_A; last write wins.
        StateDiff::from([("user_A".to_string(), json!({"balances": {"pts": 7}}))]),
    ];

    service
        .initialize(FullState {
            state: diffs[0].clone(),
            governance: StateDiff::new(),
            tokens: Vec::new(),
        })
        .await
        .unwrap();
    for diff in &diffs[1..] {
        service
            .apply_update(LedgerUpdate {
                state: diff.clone(),
                governance: StateDiff::new(),
            })
            .await;
    }

    let snapshot = service.snapshot().await.unwrap();

    // Replaying the same diffs against a fresh map reconstructs the state.
    let mut replay = BoundedStateMap::new(10_000);
    for diff in &diffs {
        for (key, value) in diff {
            replay.set(key.clone(), value.clone());
        }
    }
    let replayed: std::collections::BTreeMap<String, serde_json::Value> = replay
        .entries()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();

    assert_eq!(snapshot.state, replayed);
}

#[tokio::test(start_paused = true)]
async fn updates_during_a_pass_schedule_another() {
    let formula = Arc::new(PassCounter(AtomicUsize::new(0)));
    let service = MirrorService::new(
        MirrorConfig::default(),
        Arc::clone(&formula) as Arc<dyn RewardFormula>,
        Arc::new(DisabledLookup),
    );
    service.initialize(initial_dump()).await.unwrap();

    service.apply_update(update(1)).await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    service.apply_update(update(2)).await;
    tokio::time::sleep(Duration::from_secs(3)).await;

    // Initial pass + two debounced passes.
    assert_eq!(formula.0.load(Ordering::SeqCst), 3);
}
