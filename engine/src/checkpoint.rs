//! Checkpoint - save/load registry state
//!
//! Serializes the complete registry (sessions + both ledgers) for
//! pause/resume and audit. Snapshots are deterministic: ledger entries are
//! sorted by key before capture, so the same state always produces the same
//! JSON and the same SHA-256 digest.
//!
//! # Critical Invariants
//!
//! - **Round trip**: `capture → JSON → restore` reproduces the registry.
//! - **Determinism**: identical state yields an identical digest.
//! - **Id stability**: sessions are stored in id order; restoring preserves
//!   the arena indexing (ids are never reassigned).

use crate::models::deposit::{DepositLedger, ParticipantDeposit};
use crate::models::rewards::RewardLedger;
use crate::models::session::{Session, SessionId};
use crate::registry::SessionRegistry;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One deposit ledger entry, flattened for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositSnapshot {
    pub session_id: SessionId,
    pub participant: String,
    pub balance: i64,
    pub lateness_weight: f64,
}

/// One reward ledger entry, flattened for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardSnapshot {
    pub coordinator: String,
    pub asset: String,
    pub accrued: i64,
}

/// Complete registry snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub sessions: Vec<Session>,
    pub deposits: Vec<DepositSnapshot>,
    pub rewards: Vec<RewardSnapshot>,
}

impl RegistrySnapshot {
    /// Capture the registry in deterministic order.
    pub fn capture(registry: &SessionRegistry) -> Self {
        let sessions = registry.sessions().to_vec();

        let mut deposits: Vec<DepositSnapshot> = registry
            .deposits()
            .iter()
            .map(|((session_id, participant), entry)| DepositSnapshot {
                session_id: *session_id,
                participant: participant.clone(),
                balance: entry.balance(),
                lateness_weight: entry.lateness_weight(),
            })
            .collect();
        deposits.sort_by(|a, b| {
            (a.session_id, &a.participant).cmp(&(b.session_id, &b.participant))
        });

        let mut rewards: Vec<RewardSnapshot> = registry
            .rewards()
            .iter()
            .map(|((coordinator, asset), accrued)| RewardSnapshot {
                coordinator: coordinator.clone(),
                asset: asset.clone(),
                accrued: *accrued,
            })
            .collect();
        rewards.sort_by(|a, b| (&a.coordinator, &a.asset).cmp(&(&b.coordinator, &b.asset)));

        Self {
            sessions,
            deposits,
            rewards,
        }
    }

    /// Rebuild a registry from this snapshot.
    pub fn restore(self) -> SessionRegistry {
        let mut deposits = DepositLedger::new();
        for d in self.deposits {
            deposits.insert(
                d.session_id,
                d.participant,
                ParticipantDeposit::from_parts(d.balance, d.lateness_weight),
            );
        }
        let mut rewards = RewardLedger::new();
        for r in self.rewards {
            rewards.credit(&r.coordinator, &r.asset, r.accrued);
        }
        SessionRegistry::from_parts(self.sessions, deposits, rewards)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// SHA-256 over the canonical (compact) JSON form, hex-encoded.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        let canonical = serde_json::to_string(self)?;
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}
