//! Rollover controller
//!
//! Once a session's minting window has passed, its coordinator decides what
//! happens next: restart the cycle for the unsold remainder, hold the
//! minting window open forever at the fixed price, or close the session for
//! good. Re-invocation rules fall out of the window guard itself: a Restart
//! re-anchors the windows into the future and an Extend pushes the minting
//! end to the maximum timestamp, so a second Restart/Extend fails with
//! `MintingNotOver` until a new minting window has genuinely elapsed. Close
//! is idempotent.

use crate::core::time::Timestamp;
use crate::error::EngineError;
use crate::models::deposit::DepositLedger;
use crate::models::session::{RolloverOption, Session};
use serde::{Deserialize, Serialize};

/// What a rollover call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RolloverOutcome {
    /// Windows re-anchored at the rollover instant; new pricing epoch.
    Restarted,
    /// Minting held open indefinitely at the fixed price.
    ExtendedMinting,
    /// Session permanently terminated; deposits withdraw-only.
    Closed,
}

/// Apply the session's rollover policy. Coordinator-only, and only once
/// `now` has reached the end of the minting window.
pub fn rollover(
    session: &mut Session,
    deposits: &mut DepositLedger,
    caller: &str,
    now: Timestamp,
) -> Result<RolloverOutcome, EngineError> {
    if caller != session.coordinator() {
        return Err(EngineError::NotCoordinator {
            caller: caller.to_string(),
            coordinator: session.coordinator().to_string(),
        });
    }
    if session.is_closed() {
        // Only a Close rollover sets the flag; repeating it is a no-op.
        return Ok(RolloverOutcome::Closed);
    }
    if now < session.minting().end {
        return Err(EngineError::MintingNotOver {
            now,
            minting_end: session.minting().end,
        });
    }

    match session.rollover_option() {
        RolloverOption::Restart => {
            session.apply_restart(now);
            // Carried-over deposits count as made at the new allocation
            // start for the next epoch's penalty model.
            deposits.reset_lateness(session.session_id());
            Ok(RolloverOutcome::Restarted)
        }
        RolloverOption::ExtendAtClearingPrice => {
            session.apply_extend(now);
            Ok(RolloverOutcome::ExtendedMinting)
        }
        RolloverOption::Close => {
            session.mark_closed(now);
            Ok(RolloverOutcome::Closed)
        }
    }
}
