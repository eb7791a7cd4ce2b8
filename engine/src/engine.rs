//! Engine facade
//!
//! `ClearingEngine` wires the session registry, the keyed ledgers, the
//! external transfer capabilities, and the event log into the operation set
//! the host calls: create, deposit, withdraw, mint, forgo, rollover, reward
//! withdrawal, plus read-only accessors. The host environment serializes
//! mutating calls (`&mut self`); the engine's own job is to keep every
//! operation atomic and to order its ledger mutations before any external
//! transfer call that could re-enter.
//!
//! # Example
//!
//! ```
//! use mintwindow_core_rs::engine::{ClearingEngine, SessionSpec};
//! use mintwindow_core_rs::models::session::RolloverOption;
//! use mintwindow_core_rs::transfer::InMemoryAssets;
//!
//! let mut assets = InMemoryAssets::new();
//! assets.fund("CREDIT", "ALICE", 10_000);
//! assets.escrow_supply("UNIT", 100);
//!
//! let mut engine = ClearingEngine::new(assets);
//! let id = engine
//!     .create_session(
//!         SessionSpec {
//!             unit_ref: "UNIT".to_string(),
//!             coordinator: "COORD".to_string(),
//!             deposit_asset: "CREDIT".to_string(),
//!             allocation_start: 100,
//!             allocation_end: 200,
//!             minting_start: 300,
//!             minting_end: 400,
//!             min_price: 1,
//!             max_supply: 100,
//!             rollover: RolloverOption::Close,
//!         },
//!         0,
//!     )
//!     .unwrap();
//!
//! engine.deposit(id, "ALICE", 10_000, 150).unwrap();
//! let receipt = engine.mint(id, "ALICE", 10_000, 300).unwrap();
//! assert_eq!(receipt.units, 100); // clearing price 100, all supply
//! assert_eq!(engine.reward_balance("COORD", "CREDIT"), 10_000);
//! ```

use crate::checkpoint::RegistrySnapshot;
use crate::core::time::Timestamp;
use crate::error::EngineError;
use crate::models::event::{Event, EventLog};
use crate::models::session::{Phase, RolloverOption, Session, SessionId};
use crate::registry::SessionRegistry;
use crate::rollover::{self, RolloverOutcome};
use crate::settlement::{self, ForgoOutcome, MintReceipt, PenaltyConfig, PriceSet};
use crate::transfer::{FungibleTransfer, UnitTransfer};

pub use crate::registry::SessionSpec;

/// Engine-level configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub penalty: PenaltyConfig,
}

/// The allocation-and-clearing engine.
pub struct ClearingEngine<A: FungibleTransfer + UnitTransfer> {
    registry: SessionRegistry,
    assets: A,
    events: EventLog,
    config: EngineConfig,
}

impl<A: FungibleTransfer + UnitTransfer> ClearingEngine<A> {
    pub fn new(assets: A) -> Self {
        Self::with_config(EngineConfig::default(), assets)
    }

    pub fn with_config(config: EngineConfig, assets: A) -> Self {
        Self {
            registry: SessionRegistry::new(),
            assets,
            events: EventLog::new(),
            config,
        }
    }

    // ========================================================================
    // Session provisioning
    // ========================================================================

    /// Create a session. Enforces window ordering and the custody
    /// precondition (the full supply must already be escrowed behind
    /// `spec.unit_ref`) before instantiating any state.
    pub fn create_session(
        &mut self,
        spec: SessionSpec,
        now: Timestamp,
    ) -> Result<SessionId, EngineError> {
        let escrowed = self.assets.escrowed_supply(&spec.unit_ref);
        let coordinator = spec.coordinator.clone();
        let unit_ref = spec.unit_ref.clone();
        let max_supply = spec.max_supply;

        let session_id = self.registry.create_session(spec, escrowed)?;
        self.events.log(Event::SessionCreated {
            at: now,
            session_id,
            coordinator,
            unit_ref,
            max_supply,
        });
        Ok(session_id)
    }

    // ========================================================================
    // Allocation window: deposit / withdraw
    // ========================================================================

    /// Lock `amount` of the deposit asset for `participant`. Allocation
    /// phase only.
    pub fn deposit(
        &mut self,
        session_id: SessionId,
        participant: &str,
        amount: i64,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        let (session, deposits, _) = self.registry.split_mut(session_id)?;

        if session.phase(now) != Phase::Allocation {
            return Err(EngineError::OutsideAllocationWindow {
                now,
                start: session.allocation().start,
                end: session.allocation().end,
            });
        }
        if amount <= 0 {
            return Err(EngineError::NonPositiveAmount { amount });
        }

        // Effects before the external pull.
        let lateness = settlement::penalty::lateness(session.allocation(), now);
        let entry = deposits.entry_mut(session_id, participant);
        let prior_entry = entry.clone();
        entry.record_deposit(amount, lateness);
        session.add_deposits(amount);

        if let Err(e) = self
            .assets
            .transfer_in(session.deposit_asset(), participant, amount)
        {
            *deposits.entry_mut(session_id, participant) = prior_entry;
            session.sub_deposits(amount);
            return Err(e.into());
        }

        self.events.log(Event::Deposited {
            at: now,
            session_id,
            participant: participant.to_string(),
            amount,
        });
        Ok(())
    }

    /// Return `amount` of locked deposit to `participant`. Valid during the
    /// allocation phase, or unconditionally once a Close session is dead
    /// (past its minting window or formally closed): participants may
    /// always exit a dead session.
    pub fn withdraw(
        &mut self,
        session_id: SessionId,
        participant: &str,
        amount: i64,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        let (session, deposits, _) = self.registry.split_mut(session_id)?;

        let phase = session.phase(now);
        let dead_close_session = phase == Phase::Closed
            || (phase == Phase::Concluded
                && session.rollover_option() == RolloverOption::Close);
        if phase != Phase::Allocation && !dead_close_session {
            return Err(EngineError::OutsideAllocationWindow {
                now,
                start: session.allocation().start,
                end: session.allocation().end,
            });
        }
        if amount <= 0 {
            return Err(EngineError::NonPositiveAmount { amount });
        }

        // Effects before the external payout.
        let entry = deposits.entry_mut(session_id, participant);
        let prior_entry = entry.clone();
        entry.debit_exact(amount)?;
        session.sub_deposits(amount);

        if let Err(e) = self
            .assets
            .transfer_out(session.deposit_asset(), participant, amount)
        {
            *deposits.entry_mut(session_id, participant) = prior_entry;
            session.add_deposits(amount);
            return Err(e.into());
        }

        self.events.log(Event::Withdrawn {
            at: now,
            session_id,
            participant: participant.to_string(),
            amount,
        });
        Ok(())
    }

    // ========================================================================
    // Minting window: mint / forgo
    // ========================================================================

    /// Convert locked deposit into units at the effective price.
    pub fn mint(
        &mut self,
        session_id: SessionId,
        participant: &str,
        amount: i64,
        now: Timestamp,
    ) -> Result<MintReceipt, EngineError> {
        let (session, deposits, rewards) = self.registry.split_mut(session_id)?;

        let outcome = settlement::mint(
            session,
            deposits,
            rewards,
            &mut self.assets,
            participant,
            amount,
            now,
        )?;

        self.log_price_event(session_id, now, outcome.price_event);
        let receipt = outcome.receipt;
        self.events.log(Event::UnitsMinted {
            at: now,
            session_id,
            participant: participant.to_string(),
            units: receipt.units,
            unit_price: receipt.unit_price,
            first_index: receipt.first_index,
            receipt_id: receipt.receipt_id.clone(),
        });
        Ok(receipt)
    }

    /// Release locked deposit back to the participant, net of the loss
    /// penalty. Triggers price discovery like a mint.
    pub fn forgo(
        &mut self,
        session_id: SessionId,
        participant: &str,
        amount: i64,
        now: Timestamp,
    ) -> Result<ForgoOutcome, EngineError> {
        let (session, deposits, _) = self.registry.split_mut(session_id)?;

        let outcome = settlement::forgo(
            session,
            deposits,
            &mut self.assets,
            &self.config.penalty,
            participant,
            amount,
            now,
        )?;

        self.log_price_event(session_id, now, outcome.price_event);
        self.events.log(Event::DepositForgone {
            at: now,
            session_id,
            participant: participant.to_string(),
            released: outcome.released,
            penalty: outcome.penalty,
        });
        Ok(outcome)
    }

    // ========================================================================
    // Post-window: rollover / rewards
    // ========================================================================

    /// Apply the session's rollover policy. Coordinator-only, after the
    /// minting window.
    pub fn rollover(
        &mut self,
        session_id: SessionId,
        caller: &str,
        now: Timestamp,
    ) -> Result<RolloverOutcome, EngineError> {
        let (session, deposits, _) = self.registry.split_mut(session_id)?;
        let outcome = rollover::rollover(session, deposits, caller, now)?;
        self.events.log(Event::RolledOver {
            at: now,
            session_id,
            outcome,
        });
        Ok(outcome)
    }

    /// Pay out the coordinator's accrued rewards for `asset`. The ledger
    /// entry is zeroed before the external transfer; a failed transfer
    /// restores it. Returns the amount paid; when nothing had accrued it
    /// pays 0 and makes no external call.
    pub fn withdraw_rewards(
        &mut self,
        coordinator: &str,
        asset: &str,
        now: Timestamp,
    ) -> Result<i64, EngineError> {
        let amount = self.registry.rewards_mut().take(coordinator, asset);
        if amount == 0 {
            return Ok(0);
        }

        if let Err(e) = self.assets.transfer_out(asset, coordinator, amount) {
            self.registry.rewards_mut().restore(coordinator, asset, amount);
            return Err(e.into());
        }

        self.events.log(Event::RewardsWithdrawn {
            at: now,
            coordinator: coordinator.to_string(),
            asset: asset.to_string(),
            amount,
        });
        Ok(amount)
    }

    // ========================================================================
    // Read-only accessors
    // ========================================================================

    pub fn session(&self, session_id: SessionId) -> Result<&Session, EngineError> {
        self.registry.session(session_id)
    }

    pub fn phase(&self, session_id: SessionId, now: Timestamp) -> Result<Phase, EngineError> {
        Ok(self.registry.session(session_id)?.phase(now))
    }

    pub fn deposit_balance(&self, session_id: SessionId, participant: &str) -> i64 {
        self.registry.deposits().balance_of(session_id, participant)
    }

    pub fn reward_balance(&self, coordinator: &str, asset: &str) -> i64 {
        self.registry.rewards().balance_of(coordinator, asset)
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn assets(&self) -> &A {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut A {
        &mut self.assets
    }

    // ========================================================================
    // Snapshot / restore
    // ========================================================================

    /// Capture the registry (sessions + ledgers) for persistence or audit.
    /// The event log is not part of the snapshot; export it separately via
    /// [`EventLog::to_json`].
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot::capture(&self.registry)
    }

    /// Rebuild an engine around a previously captured registry.
    pub fn restore(snapshot: RegistrySnapshot, assets: A) -> Self {
        Self::restore_with_config(snapshot, EngineConfig::default(), assets)
    }

    pub fn restore_with_config(
        snapshot: RegistrySnapshot,
        config: EngineConfig,
        assets: A,
    ) -> Self {
        Self {
            registry: snapshot.restore(),
            assets,
            events: EventLog::new(),
            config,
        }
    }

    fn log_price_event(
        &mut self,
        session_id: SessionId,
        now: Timestamp,
        price_event: Option<PriceSet>,
    ) {
        if let Some(set) = price_event {
            self.events.log(Event::ClearingPriceSet {
                at: now,
                session_id,
                result_price: set.result_price,
                effective_price: set.effective_price,
            });
        }
    }
}
