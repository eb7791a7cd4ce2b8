//! Session lifecycle tests
//!
//! Creation validation, phase-guarded operations, and the terminal states.

use mintwindow_core_rs::{
    ClearingEngine, EngineError, InMemoryAssets, Phase, RolloverOption, SessionSpec,
};

// ============================================================================
// Test Helpers
// ============================================================================

const ASSET: &str = "CREDIT";
const UNITS: &str = "UNIT";
const COORD: &str = "COORD";

fn standard_spec(rollover: RolloverOption) -> SessionSpec {
    SessionSpec {
        unit_ref: UNITS.to_string(),
        coordinator: COORD.to_string(),
        deposit_asset: ASSET.to_string(),
        allocation_start: 100,
        allocation_end: 200,
        minting_start: 300,
        minting_end: 400,
        min_price: 1,
        max_supply: 10_000,
        rollover,
    }
}

fn funded_engine() -> ClearingEngine<InMemoryAssets> {
    let mut assets = InMemoryAssets::new();
    assets.fund(ASSET, "ALICE", 1_000_000);
    assets.fund(ASSET, "BOB", 1_000_000);
    assets.escrow_supply(UNITS, 10_000);
    ClearingEngine::new(assets)
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_create_session_records_attributes() {
    let mut engine = funded_engine();
    let id = engine
        .create_session(standard_spec(RolloverOption::Restart), 50)
        .unwrap();

    let session = engine.session(id).unwrap();
    assert_eq!(session.session_id(), id);
    assert_eq!(session.unit_ref(), UNITS);
    assert_eq!(session.coordinator(), COORD);
    assert_eq!(session.deposit_asset(), ASSET);
    assert_eq!(session.min_price(), 1);
    assert_eq!(session.max_supply(), 10_000);
    assert_eq!(session.rollover_option(), RolloverOption::Restart);
    assert_eq!(session.total_deposits(), 0);
    assert_eq!(session.result_price(), 0);
    assert_eq!(session.next_unit_index(), 0);
    assert_eq!(session.rollover_offset(), None);
    assert!(!session.is_closed());
}

#[test]
fn test_create_session_requires_custody() {
    let mut engine = funded_engine();
    let mut spec = standard_spec(RolloverOption::Close);
    spec.max_supply = 10_001; // one more than escrowed

    let err = engine.create_session(spec, 50).unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientCustody {
            required: 10_001,
            held: 10_000,
        }
    );
    assert_eq!(engine.registry().num_sessions(), 0);
}

#[test]
fn test_create_session_rejects_bad_bounds() {
    let mut engine = funded_engine();
    let mut spec = standard_spec(RolloverOption::Close);
    spec.minting_start = 199; // overlaps allocation window

    let err = engine.create_session(spec, 50).unwrap_err();
    assert!(matches!(err, EngineError::BadSessionBounds { .. }));
}

#[test]
fn test_unknown_session_fails_every_operation() {
    let mut engine = funded_engine();

    let invalid = EngineError::InvalidSession { session_id: 9 };
    assert_eq!(engine.session(9).unwrap_err(), invalid);
    assert_eq!(engine.deposit(9, "ALICE", 100, 150).unwrap_err(), invalid);
    assert_eq!(engine.withdraw(9, "ALICE", 100, 150).unwrap_err(), invalid);
    assert_eq!(engine.mint(9, "ALICE", 100, 350).unwrap_err(), invalid);
    assert_eq!(engine.forgo(9, "ALICE", 100, 350).unwrap_err(), invalid);
    assert_eq!(engine.rollover(9, COORD, 500).unwrap_err(), invalid);
}

// ============================================================================
// Window guards (Scenario D)
// ============================================================================

#[test]
fn test_mint_fails_before_minting_start_then_succeeds() {
    let mut engine = funded_engine();
    let id = engine
        .create_session(standard_spec(RolloverOption::Close), 50)
        .unwrap();

    engine.deposit(id, "ALICE", 10_000, 150).unwrap();

    // Cooldown: the same call fails...
    let err = engine.mint(id, "ALICE", 10_000, 250).unwrap_err();
    assert_eq!(
        err,
        EngineError::OutsideMintingWindow {
            now: 250,
            start: 300,
            end: 400,
        }
    );

    // ...and succeeds once now reaches minting start.
    let receipt = engine.mint(id, "ALICE", 10_000, 300).unwrap();
    assert!(receipt.units > 0);
}

#[test]
fn test_deposit_fails_outside_allocation() {
    let mut engine = funded_engine();
    let id = engine
        .create_session(standard_spec(RolloverOption::Close), 50)
        .unwrap();

    for now in [99, 201, 350, 500] {
        let err = engine.deposit(id, "ALICE", 1_000, now).unwrap_err();
        assert!(
            matches!(err, EngineError::OutsideAllocationWindow { .. }),
            "deposit at {} should be outside the allocation window",
            now
        );
    }
}

// ============================================================================
// Terminal states
// ============================================================================

#[test]
fn test_closed_session_stays_queryable() {
    let mut engine = funded_engine();
    let id = engine
        .create_session(standard_spec(RolloverOption::Close), 50)
        .unwrap();

    engine.deposit(id, "ALICE", 5_000, 150).unwrap();
    engine.rollover(id, COORD, 500).unwrap();

    assert_eq!(engine.phase(id, 600).unwrap(), Phase::Closed);
    let session = engine.session(id).unwrap();
    assert!(session.is_closed());
    assert_eq!(session.total_deposits(), 5_000);
    assert_eq!(session.rollover_offset(), Some(500));
}

#[test]
fn test_concluded_until_rollover() {
    let mut engine = funded_engine();
    let id = engine
        .create_session(standard_spec(RolloverOption::Close), 50)
        .unwrap();

    assert_eq!(engine.phase(id, 500).unwrap(), Phase::Concluded);

    // Minting is over: settlement calls fail fast.
    engine.deposit(id, "ALICE", 1_000, 150).unwrap();
    let err = engine.mint(id, "ALICE", 1_000, 500).unwrap_err();
    assert!(matches!(err, EngineError::OutsideMintingWindow { .. }));
}
