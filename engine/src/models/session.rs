//! Session record and lifecycle state machine
//!
//! A session is one complete allocation-and-mint cycle: a fixed supply of
//! indivisible units, two time windows, a price floor, and a rollover
//! policy. Its "current phase" is never stored: it is recomputed on every
//! call from `now` against the window bounds, so there is no stored state to
//! drift out of sync with the clock.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──▶ Allocation ──▶ Cooldown ──▶ Minting ──▶ Concluded
//!                 ▲                                       │ rollover
//!                 └────────── Restart ◀───────────────────┤
//!                             ExtendAtClearingPrice ──▶ Minting (forever)
//!                             Close ──▶ Closed (withdraw-only, permanent)
//! ```
//!
//! # Critical Invariants
//!
//! 1. `allocation.start <= allocation.end <= minting.start <= minting.end`
//! 2. `total_deposits` equals the sum of this session's ledger entries
//! 3. `next_unit_index` is monotone and never exceeds `max_supply`
//! 4. `result_price` is set at most once per epoch (a Restart opens a new epoch)

use crate::core::time::{Timestamp, Window, MAX_TIMESTAMP};
use serde::{Deserialize, Serialize};

/// Unique, monotonically assigned session identifier.
pub type SessionId = u64;

/// What happens to the session once its minting window has closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RolloverOption {
    /// Re-anchor all windows at the rollover instant and clear the session
    /// back to a fresh allocation round for the unsold remainder.
    Restart,

    /// Hold the session in its minting phase indefinitely at the already
    /// fixed price.
    ExtendAtClearingPrice,

    /// Terminate. Remaining deposits become unconditionally withdrawable.
    Close,
}

/// Phase of a session at a given instant, derived from `now` and the
/// window bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before the allocation window opens.
    Created,
    /// Deposits and withdrawals accepted.
    Allocation,
    /// Between allocation end and minting start (possibly empty).
    Cooldown,
    /// Mint and forgo accepted.
    Minting,
    /// Minting window passed; awaiting the coordinator's rollover call.
    Concluded,
    /// Permanently terminated by a Close rollover; withdraw-only.
    Closed,
}

/// One allocation-and-mint session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    session_id: SessionId,

    /// Reference to the escrowed indivisible supply. An empty reference
    /// marks a non-existent session; every operation against it fails.
    unit_ref: String,

    /// Identity that owns the proceeds and controls rollover.
    coordinator: String,

    /// Fungible asset participants lock to bid.
    deposit_asset: String,

    allocation: Window,
    minting: Window,

    /// Reserve price per unit. The effective mint price never goes below it.
    min_price: i64,

    /// Total indivisible units available, fixed at creation.
    max_supply: u64,

    rollover: RolloverOption,

    /// Sum of all locked participant deposits for this session.
    total_deposits: i64,

    /// Clearing price per unit; 0 until discovery runs (see
    /// `price_discovered_at` for the authoritative once-only flag).
    result_price: i64,

    /// When lazy price discovery first ran in the current epoch.
    price_discovered_at: Option<Timestamp>,

    /// Next unissued unit. Monotone, persists across Restart rollovers.
    next_unit_index: u64,

    /// When the first rollover executed.
    rollover_offset: Option<Timestamp>,

    /// Set by the Close rollover; unlocks unconditional withdrawal.
    closed: bool,

    /// Forgo penalties retained by the session (stay in fungible custody,
    /// outside `total_deposits`).
    retained_penalties: i64,
}

impl Session {
    pub(crate) fn new(
        session_id: SessionId,
        unit_ref: String,
        coordinator: String,
        deposit_asset: String,
        allocation: Window,
        minting: Window,
        min_price: i64,
        max_supply: u64,
        rollover: RolloverOption,
    ) -> Self {
        Self {
            session_id,
            unit_ref,
            coordinator,
            deposit_asset,
            allocation,
            minting,
            min_price,
            max_supply,
            rollover,
            total_deposits: 0,
            result_price: 0,
            price_discovered_at: None,
            next_unit_index: 0,
            rollover_offset: None,
            closed: false,
            retained_penalties: 0,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn unit_ref(&self) -> &str {
        &self.unit_ref
    }

    pub fn coordinator(&self) -> &str {
        &self.coordinator
    }

    pub fn deposit_asset(&self) -> &str {
        &self.deposit_asset
    }

    pub fn allocation(&self) -> &Window {
        &self.allocation
    }

    pub fn minting(&self) -> &Window {
        &self.minting
    }

    pub fn min_price(&self) -> i64 {
        self.min_price
    }

    pub fn max_supply(&self) -> u64 {
        self.max_supply
    }

    pub fn rollover_option(&self) -> RolloverOption {
        self.rollover
    }

    pub fn total_deposits(&self) -> i64 {
        self.total_deposits
    }

    /// Clearing price for the current epoch; 0 means not yet discovered.
    pub fn result_price(&self) -> i64 {
        self.result_price
    }

    pub fn price_discovered_at(&self) -> Option<Timestamp> {
        self.price_discovered_at
    }

    pub fn next_unit_index(&self) -> u64 {
        self.next_unit_index
    }

    pub fn rollover_offset(&self) -> Option<Timestamp> {
        self.rollover_offset
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn retained_penalties(&self) -> i64 {
        self.retained_penalties
    }

    /// Units not yet issued.
    pub fn remaining_supply(&self) -> u64 {
        self.max_supply - self.next_unit_index
    }

    /// Recompute the phase from `now`. When `minting.start == allocation.end`
    /// the shared instant counts as Allocation.
    ///
    /// # Example
    /// ```
    /// use mintwindow_core_rs::models::session::Phase;
    /// # use mintwindow_core_rs::engine::{ClearingEngine, SessionSpec};
    /// # use mintwindow_core_rs::models::session::RolloverOption;
    /// # use mintwindow_core_rs::transfer::InMemoryAssets;
    /// # let mut assets = InMemoryAssets::new();
    /// # assets.escrow_supply("UNIT", 100);
    /// # let mut engine = ClearingEngine::new(assets);
    /// # let id = engine.create_session(SessionSpec {
    /// #     unit_ref: "UNIT".to_string(),
    /// #     coordinator: "COORD".to_string(),
    /// #     deposit_asset: "CREDIT".to_string(),
    /// #     allocation_start: 100,
    /// #     allocation_end: 200,
    /// #     minting_start: 300,
    /// #     minting_end: 400,
    /// #     min_price: 1,
    /// #     max_supply: 100,
    /// #     rollover: RolloverOption::Close,
    /// # }, 0).unwrap();
    /// let session = engine.session(id).unwrap();
    /// assert_eq!(session.phase(50), Phase::Created);
    /// assert_eq!(session.phase(150), Phase::Allocation);
    /// assert_eq!(session.phase(250), Phase::Cooldown);
    /// assert_eq!(session.phase(350), Phase::Minting);
    /// assert_eq!(session.phase(450), Phase::Concluded);
    /// ```
    pub fn phase(&self, now: Timestamp) -> Phase {
        if self.closed {
            Phase::Closed
        } else if self.allocation.is_before(now) {
            Phase::Created
        } else if self.allocation.contains(now) {
            Phase::Allocation
        } else if self.minting.is_before(now) {
            Phase::Cooldown
        } else if self.minting.contains(now) {
            Phase::Minting
        } else {
            Phase::Concluded
        }
    }

    // ========================================================================
    // Crate-internal mutators (ledger bookkeeping)
    // ========================================================================

    pub(crate) fn add_deposits(&mut self, amount: i64) {
        self.total_deposits += amount;
    }

    pub(crate) fn sub_deposits(&mut self, amount: i64) {
        debug_assert!(amount <= self.total_deposits);
        self.total_deposits -= amount;
    }

    pub(crate) fn set_price(&mut self, price: i64, at: Timestamp) {
        self.result_price = price;
        self.price_discovered_at = Some(at);
    }

    /// Undo a price discovery performed earlier in a failed operation.
    pub(crate) fn clear_price(&mut self) {
        self.result_price = 0;
        self.price_discovered_at = None;
    }

    pub(crate) fn advance_units(&mut self, count: u64) {
        debug_assert!(self.next_unit_index + count <= self.max_supply);
        self.next_unit_index += count;
    }

    /// Undo a pointer advance performed earlier in a failed operation.
    pub(crate) fn rewind_units(&mut self, count: u64) {
        debug_assert!(count <= self.next_unit_index);
        self.next_unit_index -= count;
    }

    pub(crate) fn add_retained_penalty(&mut self, amount: i64) {
        self.retained_penalties += amount;
    }

    pub(crate) fn sub_retained_penalty(&mut self, amount: i64) {
        self.retained_penalties -= amount;
    }

    // ========================================================================
    // Rollover transitions
    // ========================================================================

    /// Restart: re-anchor both windows at `now` preserving the original
    /// durations, and open a new pricing epoch. The unit pointer is NOT
    /// reset; remaining supply persists across restarts.
    pub(crate) fn apply_restart(&mut self, now: Timestamp) {
        let cooldown = self.minting.start - self.allocation.end;
        let minting_duration = self.minting.duration();

        self.allocation = self.allocation.anchored_at(now);
        self.minting = Window::new(
            self.allocation.end + cooldown,
            self.allocation.end + cooldown + minting_duration,
        );
        self.result_price = 0;
        self.price_discovered_at = None;
        self.rollover_offset.get_or_insert(now);
    }

    /// ExtendAtClearingPrice: hold the minting window open forever.
    pub(crate) fn apply_extend(&mut self, now: Timestamp) {
        self.minting.end = MAX_TIMESTAMP;
        self.rollover_offset.get_or_insert(now);
    }

    /// Close: terminal, unlocks unconditional withdrawal.
    pub(crate) fn mark_closed(&mut self, now: Timestamp) {
        self.closed = true;
        self.rollover_offset.get_or_insert(now);
    }
}
