//! Checkpoint tests
//!
//! Snapshot round trips, digest determinism, and resuming operations on a
//! restored engine.

use mintwindow_core_rs::{
    ClearingEngine, InMemoryAssets, RegistrySnapshot, RolloverOption, SessionSpec,
};

// ============================================================================
// Test Helpers
// ============================================================================

const ASSET: &str = "CREDIT";

fn assets() -> InMemoryAssets {
    let mut assets = InMemoryAssets::new();
    assets.fund(ASSET, "ALICE", 1_000_000);
    assets.fund(ASSET, "BOB", 1_000_000);
    assets.escrow_supply("UNIT", 10_000);
    assets
}

fn mid_lifecycle_engine() -> (ClearingEngine<InMemoryAssets>, u64) {
    let mut engine = ClearingEngine::new(assets());
    let id = engine
        .create_session(
            SessionSpec {
                unit_ref: "UNIT".to_string(),
                coordinator: "COORD".to_string(),
                deposit_asset: ASSET.to_string(),
                allocation_start: 100,
                allocation_end: 200,
                minting_start: 300,
                minting_end: 400,
                min_price: 1,
                max_supply: 10_000,
                rollover: RolloverOption::Close,
            },
            50,
        )
        .unwrap();
    engine.deposit(id, "ALICE", 10_000, 150).unwrap();
    engine.deposit(id, "BOB", 10_000, 180).unwrap();
    engine.mint(id, "ALICE", 10_000, 300).unwrap();
    (engine, id)
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_snapshot_json_round_trip() {
    let (engine, _) = mid_lifecycle_engine();

    let snapshot = engine.snapshot();
    let json = snapshot.to_json().unwrap();
    let parsed = RegistrySnapshot::from_json(&json).unwrap();

    assert_eq!(parsed, snapshot);
    assert_eq!(parsed.digest().unwrap(), snapshot.digest().unwrap());
}

#[test]
fn test_restored_engine_preserves_state() {
    let (engine, id) = mid_lifecycle_engine();
    let snapshot = engine.snapshot();
    let original_session = engine.session(id).unwrap().clone();

    // The asset store lives with the host; hand the restored engine the
    // same one.
    let restored = ClearingEngine::restore(snapshot, engine.assets().clone());

    let session = restored.session(id).unwrap();
    assert_eq!(*session, original_session);
    assert_eq!(restored.deposit_balance(id, "ALICE"), 0);
    assert_eq!(restored.deposit_balance(id, "BOB"), 10_000);
    assert_eq!(restored.reward_balance("COORD", ASSET), 10_000);
    assert!(restored.registry().deposit_invariant_holds(id));
}

#[test]
fn test_restored_engine_keeps_operating() {
    let (engine, id) = mid_lifecycle_engine();
    let snapshot = engine.snapshot();
    let mut restored = ClearingEngine::restore(snapshot, engine.assets().clone());

    // The epoch price survived the round trip: BOB settles at the same
    // fixed price.
    let receipt = restored.mint(id, "BOB", 10_000, 350).unwrap();
    assert_eq!(receipt.unit_price, 2);
    assert_eq!(receipt.first_index, 5_000);
    assert_eq!(restored.session(id).unwrap().next_unit_index(), 10_000);
}

// ============================================================================
// Digest
// ============================================================================

#[test]
fn test_digest_changes_with_state() {
    let (engine, _) = mid_lifecycle_engine();
    let before = engine.snapshot().digest().unwrap();

    let (mut other, id) = mid_lifecycle_engine();
    other.mint(id, "BOB", 4_000, 350).unwrap();
    let after = other.snapshot().digest().unwrap();

    assert_ne!(before, after);
}

#[test]
fn test_digest_is_stable_for_identical_state() {
    let (a, _) = mid_lifecycle_engine();
    let (b, _) = mid_lifecycle_engine();
    assert_eq!(
        a.snapshot().digest().unwrap(),
        b.snapshot().digest().unwrap()
    );
}
