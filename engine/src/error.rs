//! Engine error taxonomy
//!
//! Fail-fast, no internal retries: every guard violation surfaces as a typed
//! failure with the offending values attached, and no partial mutation
//! survives a failed call. All variants are terminal for the attempted call
//! only; the caller corrects and retries.

use crate::core::time::Timestamp;
use crate::models::session::SessionId;
use crate::transfer::TransferError;
use thiserror::Error;

/// Errors returned by engine operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// Unknown session id, or a session whose unit-supply reference is
    /// empty (such a session is "non-existent" and every operation against
    /// it fails).
    #[error("invalid session: {session_id}")]
    InvalidSession { session_id: SessionId },

    /// Window ordering violated at creation. The required ordering is
    /// `allocation_start <= allocation_end <= minting_start <= minting_end`.
    #[error("bad session bounds: allocation [{allocation_start}, {allocation_end}], minting [{minting_start}, {minting_end}]")]
    BadSessionBounds {
        allocation_start: Timestamp,
        allocation_end: Timestamp,
        minting_start: Timestamp,
        minting_end: Timestamp,
    },

    /// Session created with no supply to allocate. The clearing price
    /// divides total deposits by max supply, so zero is never valid.
    #[error("max supply must be at least 1")]
    ZeroSupply,

    /// Deposit or withdrawal attempted outside the allocation window.
    #[error("outside allocation window: now {now}, window [{start}, {end}]")]
    OutsideAllocationWindow {
        now: Timestamp,
        start: Timestamp,
        end: Timestamp,
    },

    /// Mint or forgo attempted outside the minting window.
    #[error("outside minting window: now {now}, window [{start}, {end}]")]
    OutsideMintingWindow {
        now: Timestamp,
        start: Timestamp,
        end: Timestamp,
    },

    /// Withdraw, mint, or forgo exceeds the participant's locked balance.
    /// Underflow is a hard error, never a silent clamp.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: i64, available: i64 },

    /// Mint amount cannot buy a single unit at the effective price.
    #[error("amount {amount} is below the unit price {unit_price}")]
    BelowUnitPrice { amount: i64, unit_price: i64 },

    /// Mint attempted after every unit of the session's supply was issued.
    #[error("supply exhausted: all {max_supply} units issued")]
    SupplyExhausted { max_supply: u64 },

    /// Rollover attempted before the minting window closed.
    #[error("minting not over: now {now}, minting ends at {minting_end}")]
    MintingNotOver { now: Timestamp, minting_end: Timestamp },

    /// Rollover invoked by an identity other than the session coordinator.
    #[error("caller {caller} is not the coordinator {coordinator}")]
    NotCoordinator { caller: String, coordinator: String },

    /// Custody precondition unmet at creation: the escrowed unit supply is
    /// smaller than the supply the session would sell.
    #[error("insufficient custody: required {required} units, held {held}")]
    InsufficientCustody { required: u64, held: u64 },

    /// Zero or negative amount passed to a balance-moving operation.
    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount { amount: i64 },

    /// A transfer capability failed. The operation's own mutations were
    /// reverted before this surfaced.
    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),
}
