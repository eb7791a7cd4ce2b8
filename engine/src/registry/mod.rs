//! Session registry
//!
//! Owns every session record plus the deposit and reward ledgers. Sessions
//! live in an arena (`Vec<Session>`) indexed by their monotonically
//! assigned id: one table of structs instead of parallel maps keyed by the
//! same identity, so the cross-field invariants live in one place. Sessions
//! are never deleted; a closed session stays queryable indefinitely.

use crate::core::time::{Timestamp, Window};
use crate::error::EngineError;
use crate::models::deposit::DepositLedger;
use crate::models::rewards::RewardLedger;
use crate::models::session::{RolloverOption, Session, SessionId};

/// Everything needed to instantiate a session. Provisioning and
/// permissioning (who may call this) are the host's concern; the registry
/// still enforces the structural invariants and the custody precondition.
#[derive(Debug, Clone)]
pub struct SessionSpec {
    /// Reference to the escrowed indivisible supply.
    pub unit_ref: String,
    pub coordinator: String,
    pub deposit_asset: String,
    pub allocation_start: Timestamp,
    pub allocation_end: Timestamp,
    pub minting_start: Timestamp,
    pub minting_end: Timestamp,
    /// Reserve price per unit.
    pub min_price: i64,
    pub max_supply: u64,
    pub rollover: RolloverOption,
}

/// Arena of sessions plus the keyed ledgers they share.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
    deposits: DepositLedger,
    rewards: RewardLedger,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a spec and instantiate the session. `escrowed` is the unit
    /// supply currently held behind `spec.unit_ref`, read from the unit
    /// transfer capability by the caller.
    pub fn create_session(
        &mut self,
        spec: SessionSpec,
        escrowed: u64,
    ) -> Result<SessionId, EngineError> {
        let session_id = self.sessions.len() as SessionId;

        // An empty unit reference denotes a non-existent session.
        if spec.unit_ref.is_empty() {
            return Err(EngineError::InvalidSession { session_id });
        }
        let ordered = spec.allocation_start <= spec.allocation_end
            && spec.allocation_end <= spec.minting_start
            && spec.minting_start <= spec.minting_end;
        if !ordered {
            return Err(EngineError::BadSessionBounds {
                allocation_start: spec.allocation_start,
                allocation_end: spec.allocation_end,
                minting_start: spec.minting_start,
                minting_end: spec.minting_end,
            });
        }
        if spec.max_supply == 0 {
            return Err(EngineError::ZeroSupply);
        }
        // Custody precondition: the full supply must already be escrowed.
        if escrowed < spec.max_supply {
            return Err(EngineError::InsufficientCustody {
                required: spec.max_supply,
                held: escrowed,
            });
        }

        self.sessions.push(Session::new(
            session_id,
            spec.unit_ref,
            spec.coordinator,
            spec.deposit_asset,
            Window::new(spec.allocation_start, spec.allocation_end),
            Window::new(spec.minting_start, spec.minting_end),
            spec.min_price,
            spec.max_supply,
            spec.rollover,
        ));
        Ok(session_id)
    }

    pub fn session(&self, session_id: SessionId) -> Result<&Session, EngineError> {
        match self.sessions.get(session_id as usize) {
            Some(s) if !s.unit_ref().is_empty() => Ok(s),
            _ => Err(EngineError::InvalidSession { session_id }),
        }
    }

    pub(crate) fn session_mut(
        &mut self,
        session_id: SessionId,
    ) -> Result<&mut Session, EngineError> {
        match self.sessions.get_mut(session_id as usize) {
            Some(s) if !s.unit_ref().is_empty() => Ok(s),
            _ => Err(EngineError::InvalidSession { session_id }),
        }
    }

    /// Borrow one session together with both ledgers (disjoint fields, so
    /// the borrows coexist).
    pub(crate) fn split_mut(
        &mut self,
        session_id: SessionId,
    ) -> Result<(&mut Session, &mut DepositLedger, &mut RewardLedger), EngineError> {
        match self.sessions.get_mut(session_id as usize) {
            Some(s) if !s.unit_ref().is_empty() => Ok((s, &mut self.deposits, &mut self.rewards)),
            _ => Err(EngineError::InvalidSession { session_id }),
        }
    }

    pub fn num_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn deposits(&self) -> &DepositLedger {
        &self.deposits
    }

    pub fn rewards(&self) -> &RewardLedger {
        &self.rewards
    }

    pub(crate) fn rewards_mut(&mut self) -> &mut RewardLedger {
        &mut self.rewards
    }

    pub(crate) fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Check the core accounting invariant for one session:
    /// `total_deposits == sum(participant balances)`.
    pub fn deposit_invariant_holds(&self, session_id: SessionId) -> bool {
        match self.session(session_id) {
            Ok(s) => s.total_deposits() == self.deposits.session_total(session_id),
            Err(_) => false,
        }
    }

    pub(crate) fn from_parts(
        sessions: Vec<Session>,
        deposits: DepositLedger,
        rewards: RewardLedger,
    ) -> Self {
        Self {
            sessions,
            deposits,
            rewards,
        }
    }
}
