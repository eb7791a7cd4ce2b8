//! Participant deposit ledger
//!
//! One entry per (session, participant): the locked balance plus the
//! amount-weighted lateness accumulator that feeds the loss-penalty model.
//! The store is explicit and keyed: operations receive it as an argument,
//! so tests can build isolated fixtures without a full engine.
//!
//! # Critical Invariants
//!
//! 1. A balance never goes negative: every decrease is preceded by an
//!    exactness check, and a violation is a hard failure, never a clamp.
//! 2. For every session, the sum of entry balances equals the session's
//!    `total_deposits` (see [`DepositLedger::session_total`]).

use crate::error::EngineError;
use crate::models::session::SessionId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A participant's locked deposit within one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantDeposit {
    /// Amount of the deposit asset currently locked.
    balance: i64,

    /// Amount-weighted sum of normalized deposit lateness in [0, 1].
    /// `lateness_weight / balance` is the average lateness of the locked
    /// balance; debits scale it proportionally so the average is unchanged.
    lateness_weight: f64,
}

impl ParticipantDeposit {
    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Average lateness of the remaining balance, in [0, 1].
    pub fn average_lateness(&self) -> f64 {
        if self.balance <= 0 {
            0.0
        } else {
            (self.lateness_weight / self.balance as f64).clamp(0.0, 1.0)
        }
    }

    pub(crate) fn record_deposit(&mut self, amount: i64, lateness: f64) {
        self.balance += amount;
        self.lateness_weight += amount as f64 * lateness;
    }

    /// Decrease the balance by exactly `amount`, failing the whole call if
    /// the balance is smaller. The lateness weight scales with the
    /// remaining balance.
    pub(crate) fn debit_exact(&mut self, amount: i64) -> Result<(), EngineError> {
        if amount > self.balance {
            return Err(EngineError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }
        let remaining = self.balance - amount;
        self.lateness_weight = if self.balance > 0 {
            self.lateness_weight * remaining as f64 / self.balance as f64
        } else {
            0.0
        };
        self.balance = remaining;
        Ok(())
    }

    pub(crate) fn reset_lateness(&mut self) {
        self.lateness_weight = 0.0;
    }

    pub(crate) fn lateness_weight(&self) -> f64 {
        self.lateness_weight
    }

    pub(crate) fn from_parts(balance: i64, lateness_weight: f64) -> Self {
        Self {
            balance,
            lateness_weight,
        }
    }
}

/// Keyed store of every participant deposit across all sessions.
#[derive(Debug, Clone, Default)]
pub struct DepositLedger {
    entries: HashMap<(SessionId, String), ParticipantDeposit>,
}

impl DepositLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locked balance of `participant` in `session_id` (0 if no entry).
    pub fn balance_of(&self, session_id: SessionId, participant: &str) -> i64 {
        self.entries
            .get(&(session_id, participant.to_string()))
            .map(ParticipantDeposit::balance)
            .unwrap_or(0)
    }

    pub fn get(&self, session_id: SessionId, participant: &str) -> Option<&ParticipantDeposit> {
        self.entries.get(&(session_id, participant.to_string()))
    }

    pub(crate) fn entry_mut(
        &mut self,
        session_id: SessionId,
        participant: &str,
    ) -> &mut ParticipantDeposit {
        self.entries
            .entry((session_id, participant.to_string()))
            .or_default()
    }

    /// Sum of all entry balances for one session. Must equal the session's
    /// `total_deposits` at every observation point.
    pub fn session_total(&self, session_id: SessionId) -> i64 {
        self.entries
            .iter()
            .filter(|((sid, _), _)| *sid == session_id)
            .map(|(_, entry)| entry.balance())
            .sum()
    }

    /// Zero the lateness accumulators of one session (Restart rollover:
    /// carried-over deposits count as made at the new allocation start).
    pub(crate) fn reset_lateness(&mut self, session_id: SessionId) {
        for ((sid, _), entry) in self.entries.iter_mut() {
            if *sid == session_id {
                entry.reset_lateness();
            }
        }
    }

    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(
        &self,
    ) -> impl Iterator<Item = (&(SessionId, String), &ParticipantDeposit)> {
        self.entries.iter()
    }

    pub(crate) fn insert(
        &mut self,
        session_id: SessionId,
        participant: String,
        entry: ParticipantDeposit,
    ) {
        self.entries.insert((session_id, participant), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_exact_rejects_underflow() {
        let mut entry = ParticipantDeposit::default();
        entry.record_deposit(100, 0.0);

        let err = entry.debit_exact(101).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientBalance {
                requested: 101,
                available: 100,
            }
        );
        assert_eq!(entry.balance(), 100);
    }

    #[test]
    fn test_debit_scales_lateness_proportionally() {
        let mut entry = ParticipantDeposit::default();
        entry.record_deposit(100, 0.5);
        assert!((entry.average_lateness() - 0.5).abs() < 1e-9);

        entry.debit_exact(60).unwrap();
        assert_eq!(entry.balance(), 40);
        assert!((entry.average_lateness() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_lateness_across_deposits() {
        let mut entry = ParticipantDeposit::default();
        entry.record_deposit(100, 0.0);
        entry.record_deposit(100, 1.0);
        assert!((entry.average_lateness() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_session_total_sums_entries() {
        let mut ledger = DepositLedger::new();
        ledger.entry_mut(0, "ALICE").record_deposit(100, 0.0);
        ledger.entry_mut(0, "BOB").record_deposit(250, 0.0);
        ledger.entry_mut(1, "ALICE").record_deposit(999, 0.0);

        assert_eq!(ledger.session_total(0), 350);
        assert_eq!(ledger.session_total(1), 999);
        assert_eq!(ledger.balance_of(0, "ALICE"), 100);
        assert_eq!(ledger.balance_of(0, "CAROL"), 0);
    }
}
