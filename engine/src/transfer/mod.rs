//! Asset transfer capabilities (external collaborators)
//!
//! The engine never moves value itself. It calls out through two traits:
//! [`FungibleTransfer`] for the deposit asset and [`UnitTransfer`] for the
//! indivisible supply units. Any implementation can run arbitrary logic
//! before returning, so the engine treats every call through these traits as
//! potentially re-entrant and applies its own ledger mutations first
//! (checks-effects-interactions).
//!
//! [`InMemoryAssets`] is the implementation used by tests and the demo CLI.
//! It keeps plain maps of balances and escrowed units, and can be told to
//! refuse unit delivery to a recipient so revert paths can be exercised.

use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors raised by a transfer capability.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransferError {
    #[error("insufficient funds: {holder} holds {available} of {asset}, requested {requested}")]
    InsufficientFunds {
        asset: String,
        holder: String,
        requested: i64,
        available: i64,
    },

    /// The recipient-acceptance hook declined the delivery.
    #[error("recipient {recipient} does not accept units of {unit_ref}")]
    RecipientRefused { unit_ref: String, recipient: String },

    #[error("custody shortfall for {unit_ref}: requested {requested}, escrowed {available}")]
    CustodyShortfall {
        unit_ref: String,
        requested: u64,
        available: u64,
    },
}

/// Moves the fungible deposit asset between participants and the session
/// custody vault.
pub trait FungibleTransfer {
    /// Pull `amount` of `asset` from `from` into session custody.
    fn transfer_in(&mut self, asset: &str, from: &str, amount: i64) -> Result<(), TransferError>;

    /// Pay `amount` of `asset` out of session custody to `to`.
    fn transfer_out(&mut self, asset: &str, to: &str, amount: i64) -> Result<(), TransferError>;
}

/// Moves indivisible supply units out of escrow to a recipient.
pub trait UnitTransfer {
    /// Number of units currently escrowed behind `unit_ref`. Checked at
    /// session creation against the session's max supply.
    fn escrowed_supply(&self, unit_ref: &str) -> u64;

    /// Deliver the consecutive range `[start_index, start_index + count)` to
    /// `to`. All-or-nothing: a refusing recipient (or an escrow shortfall)
    /// fails the whole call and delivers nothing.
    fn transfer_units(
        &mut self,
        unit_ref: &str,
        to: &str,
        start_index: u64,
        count: u64,
    ) -> Result<(), TransferError>;
}

/// In-memory implementation of both transfer capabilities.
///
/// # Example
/// ```
/// use mintwindow_core_rs::transfer::{FungibleTransfer, InMemoryAssets, UnitTransfer};
///
/// let mut assets = InMemoryAssets::new();
/// assets.fund("CREDIT", "ALICE", 50_000);
/// assets.escrow_supply("UNIT", 100);
///
/// assets.transfer_in("CREDIT", "ALICE", 20_000).unwrap();
/// assert_eq!(assets.balance_of("CREDIT", "ALICE"), 30_000);
/// assert_eq!(assets.vault_balance("CREDIT"), 20_000);
///
/// assets.transfer_units("UNIT", "ALICE", 0, 3).unwrap();
/// assert_eq!(assets.units_of("UNIT", "ALICE"), &[0, 1, 2]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssets {
    /// Free balances, keyed by (asset, holder).
    balances: HashMap<(String, String), i64>,

    /// Session custody per asset (deposits live here while locked).
    vault: HashMap<String, i64>,

    /// Units still escrowed per unit reference.
    escrow: HashMap<String, u64>,

    /// Delivered units, keyed by (unit_ref, holder).
    collections: HashMap<(String, String), Vec<u64>>,

    /// Holders whose acceptance hook refuses all unit deliveries.
    refusing: HashSet<String>,
}

impl InMemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `asset` to `holder`'s free balance.
    pub fn fund(&mut self, asset: &str, holder: &str, amount: i64) {
        assert!(amount >= 0, "amount must be non-negative");
        *self
            .balances
            .entry((asset.to_string(), holder.to_string()))
            .or_insert(0) += amount;
    }

    /// Place `count` units behind `unit_ref` into escrow.
    pub fn escrow_supply(&mut self, unit_ref: &str, count: u64) {
        *self.escrow.entry(unit_ref.to_string()).or_insert(0) += count;
    }

    /// Free balance of `holder` in `asset`.
    pub fn balance_of(&self, asset: &str, holder: &str) -> i64 {
        self.balances
            .get(&(asset.to_string(), holder.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Amount of `asset` currently held in session custody.
    pub fn vault_balance(&self, asset: &str) -> i64 {
        self.vault.get(asset).copied().unwrap_or(0)
    }

    /// Unit indexes delivered to `holder` from `unit_ref`, in delivery order.
    pub fn units_of(&self, unit_ref: &str, holder: &str) -> &[u64] {
        self.collections
            .get(&(unit_ref.to_string(), holder.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Toggle the acceptance hook for `holder`. A refusing holder fails
    /// every `transfer_units` call addressed to them.
    pub fn set_refusing(&mut self, holder: &str, refusing: bool) {
        if refusing {
            self.refusing.insert(holder.to_string());
        } else {
            self.refusing.remove(holder);
        }
    }
}

impl FungibleTransfer for InMemoryAssets {
    fn transfer_in(&mut self, asset: &str, from: &str, amount: i64) -> Result<(), TransferError> {
        let key = (asset.to_string(), from.to_string());
        let available = self.balances.get(&key).copied().unwrap_or(0);
        if amount > available {
            return Err(TransferError::InsufficientFunds {
                asset: asset.to_string(),
                holder: from.to_string(),
                requested: amount,
                available,
            });
        }
        *self.balances.entry(key).or_insert(0) -= amount;
        *self.vault.entry(asset.to_string()).or_insert(0) += amount;
        Ok(())
    }

    fn transfer_out(&mut self, asset: &str, to: &str, amount: i64) -> Result<(), TransferError> {
        let held = self.vault.get(asset).copied().unwrap_or(0);
        if amount > held {
            return Err(TransferError::InsufficientFunds {
                asset: asset.to_string(),
                holder: "custody".to_string(),
                requested: amount,
                available: held,
            });
        }
        *self.vault.entry(asset.to_string()).or_insert(0) -= amount;
        *self
            .balances
            .entry((asset.to_string(), to.to_string()))
            .or_insert(0) += amount;
        Ok(())
    }
}

impl UnitTransfer for InMemoryAssets {
    fn escrowed_supply(&self, unit_ref: &str) -> u64 {
        self.escrow.get(unit_ref).copied().unwrap_or(0)
    }

    fn transfer_units(
        &mut self,
        unit_ref: &str,
        to: &str,
        start_index: u64,
        count: u64,
    ) -> Result<(), TransferError> {
        if self.refusing.contains(to) {
            return Err(TransferError::RecipientRefused {
                unit_ref: unit_ref.to_string(),
                recipient: to.to_string(),
            });
        }
        let available = self.escrow.get(unit_ref).copied().unwrap_or(0);
        if count > available {
            return Err(TransferError::CustodyShortfall {
                unit_ref: unit_ref.to_string(),
                requested: count,
                available,
            });
        }
        *self.escrow.entry(unit_ref.to_string()).or_insert(0) -= count;
        self.collections
            .entry((unit_ref.to_string(), to.to_string()))
            .or_default()
            .extend(start_index..start_index + count);
        Ok(())
    }
}
