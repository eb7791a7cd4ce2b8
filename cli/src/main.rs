//! MintWindow demo driver
//!
//! Runs one complete session lifecycle against the in-memory asset store
//! (deposits, lazy price discovery, minting, rollover, reward withdrawal)
//! and prints the event log plus a state summary as JSON.

use mintwindow_core_rs::{ClearingEngine, InMemoryAssets, RolloverOption, SessionSpec};
use serde_json::json;
use std::error::Error;

const ASSET: &str = "CREDIT";
const UNITS: &str = "UNIT";
const COORD: &str = "COORD";

fn main() -> Result<(), Box<dyn Error>> {
    let mut assets = InMemoryAssets::new();
    assets.fund(ASSET, "ALICE", 100_000);
    assets.fund(ASSET, "BOB", 100_000);
    assets.escrow_supply(UNITS, 10_000);

    let mut engine = ClearingEngine::new(assets);
    let id = engine.create_session(
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
            rollover: RolloverOption::Close,
        },
        50,
    )?;

    // Allocation window: two bidders lock equal deposits.
    engine.deposit(id, "ALICE", 10_000, 120)?;
    engine.deposit(id, "BOB", 10_000, 180)?;

    // A mint during cooldown fails fast; the caller simply retries later.
    if let Err(e) = engine.mint(id, "ALICE", 10_000, 250) {
        eprintln!("rejected as expected: {}", e);
    }

    // Minting window: the first settlement call fixes the clearing price.
    let receipt = engine.mint(id, "ALICE", 10_000, 300)?;
    eprintln!(
        "ALICE minted {} units at price {} (receipt {})",
        receipt.units, receipt.unit_price, receipt.receipt_id
    );
    let receipt = engine.mint(id, "BOB", 10_000, 320)?;
    eprintln!(
        "BOB minted {} units at price {} (receipt {})",
        receipt.units, receipt.unit_price, receipt.receipt_id
    );

    // After the window: close the session and collect the proceeds.
    engine.rollover(id, COORD, 500)?;
    let paid = engine.withdraw_rewards(COORD, ASSET, 510)?;
    eprintln!("coordinator collected {}", paid);

    let session = engine.session(id)?;
    let summary = json!({
        "session_id": session.session_id(),
        "result_price": session.result_price(),
        "units_issued": session.next_unit_index(),
        "remaining_supply": session.remaining_supply(),
        "total_deposits": session.total_deposits(),
        "closed": session.is_closed(),
        "coordinator_paid": paid,
        "alice_units": engine.assets().units_of(UNITS, "ALICE").len(),
        "bob_units": engine.assets().units_of(UNITS, "BOB").len(),
        "registry_digest": engine.snapshot().digest()?,
    });

    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!("{}", engine.events().to_json()?);
    Ok(())
}
