//! MintWindow Core - Allocation & Clearing Engine
//!
//! Time-boxed, demand-driven allocation of a fixed supply of indivisible
//! units: participants lock a fungible deposit during an allocation window,
//! a single clearing price is derived lazily from aggregate demand once the
//! minting window opens, and locked deposits convert into units at that
//! price (or are forgone, possibly at a penalty).
//!
//! # Architecture
//!
//! - **core**: time primitives (explicit `now`, inclusive windows)
//! - **models**: domain types (Session, deposit/reward ledgers, events)
//! - **registry**: session arena and creation validation
//! - **settlement**: price discovery, mint, forgo, penalty model
//! - **rollover**: post-window restart/extend/close controller
//! - **transfer**: external asset capabilities (traits + in-memory impl)
//! - **engine**: the facade hosts call
//! - **checkpoint**: deterministic snapshots with a SHA-256 audit digest
//!
//! # Critical Invariants
//!
//! 1. All money values are i64 (minor units)
//! 2. A session's `total_deposits` equals the sum of its ledger entries
//! 3. The unit pointer is monotone and never exceeds max supply
//! 4. Ledger mutations land before any external transfer call (re-entrancy)
//! 5. A failed operation reverts all of its own mutations

// Module declarations
pub mod checkpoint;
pub mod core;
pub mod engine;
pub mod error;
pub mod models;
pub mod registry;
pub mod rollover;
pub mod settlement;
pub mod transfer;

// Re-exports for convenience
pub use crate::core::time::{Timestamp, Window, MAX_TIMESTAMP};
pub use checkpoint::RegistrySnapshot;
pub use engine::{ClearingEngine, EngineConfig};
pub use error::EngineError;
pub use models::{
    deposit::{DepositLedger, ParticipantDeposit},
    event::{Event, EventLog},
    rewards::RewardLedger,
    session::{Phase, RolloverOption, Session, SessionId},
};
pub use registry::{SessionRegistry, SessionSpec};
pub use rollover::RolloverOutcome;
pub use settlement::{ForgoOutcome, MintOutcome, MintReceipt, PenaltyConfig, PriceSet};
pub use transfer::{FungibleTransfer, InMemoryAssets, TransferError, UnitTransfer};
