//! Mint and forgo operations
//!
//! Both run only inside the minting window and both trigger lazy price
//! discovery (a participant cannot dodge price-setting by forgoing first).
//! Mutation order is fixed for re-entrancy safety: participant balance,
//! session totals, and the unit pointer move *before* the external transfer
//! call; the coordinator reward is credited only after the unit transfer
//! succeeded. A failed external call reverts every mutation the operation
//! made, including a price discovery it performed itself.

use crate::core::time::Timestamp;
use crate::error::EngineError;
use crate::models::deposit::DepositLedger;
use crate::models::rewards::RewardLedger;
use crate::models::session::{Phase, Session};
use crate::settlement::clearing::{discover_price, PriceSet};
use crate::settlement::penalty::{self, PenaltyConfig};
use crate::transfer::{FungibleTransfer, UnitTransfer};

/// Proof of a successful mint: which units were issued, at what price.
#[derive(Debug, Clone, PartialEq)]
pub struct MintReceipt {
    pub receipt_id: String,
    pub session_id: u64,
    pub participant: String,
    /// Number of units issued.
    pub units: u64,
    /// Effective price paid per unit.
    pub unit_price: i64,
    /// First index of the consecutive issued range.
    pub first_index: u64,
    /// Total deposit converted (`units * unit_price`).
    pub cost: i64,
}

/// Result of a successful mint, with the price-discovery detail when this
/// call was the one that fixed the epoch price.
#[derive(Debug, Clone, PartialEq)]
pub struct MintOutcome {
    pub receipt: MintReceipt,
    pub price_event: Option<PriceSet>,
}

/// Result of a successful forgo.
#[derive(Debug, Clone, PartialEq)]
pub struct ForgoOutcome {
    /// Amount returned to the participant (`amount - penalty`).
    pub released: i64,
    /// Amount retained by the session.
    pub penalty: i64,
    pub price_event: Option<PriceSet>,
}

fn minting_guard(session: &Session, now: Timestamp) -> Result<(), EngineError> {
    if session.phase(now) != Phase::Minting {
        return Err(EngineError::OutsideMintingWindow {
            now,
            start: session.minting().start,
            end: session.minting().end,
        });
    }
    Ok(())
}

/// Convert `amount` of the participant's locked deposit into units at the
/// effective price. Excess beyond an exact multiple of the price stays
/// locked for a later call.
pub fn mint<A: UnitTransfer>(
    session: &mut Session,
    deposits: &mut DepositLedger,
    rewards: &mut RewardLedger,
    assets: &mut A,
    participant: &str,
    amount: i64,
    now: Timestamp,
) -> Result<MintOutcome, EngineError> {
    minting_guard(session, now)?;
    if amount <= 0 {
        return Err(EngineError::NonPositiveAmount { amount });
    }
    let session_id = session.session_id();
    let available = deposits.balance_of(session_id, participant);
    if amount > available {
        return Err(EngineError::InsufficientBalance {
            requested: amount,
            available,
        });
    }

    let (unit_price, price_event) = discover_price(session, now);
    let newly_priced = price_event.is_some();

    if unit_price <= 0 || amount < unit_price {
        if newly_priced {
            session.clear_price();
        }
        return Err(EngineError::BelowUnitPrice { amount, unit_price });
    }
    let remaining = session.remaining_supply();
    if remaining == 0 {
        if newly_priced {
            session.clear_price();
        }
        return Err(EngineError::SupplyExhausted {
            max_supply: session.max_supply(),
        });
    }

    let units = ((amount / unit_price) as u64).min(remaining);
    let cost = units as i64 * unit_price;
    let first_index = session.next_unit_index();

    // Effects before the external call.
    let entry = deposits.entry_mut(session_id, participant);
    let prior_entry = entry.clone();
    if let Err(e) = entry.debit_exact(cost) {
        if newly_priced {
            session.clear_price();
        }
        return Err(e);
    }
    session.sub_deposits(cost);
    session.advance_units(units);

    // Interaction: the unit capability may re-enter before returning.
    if let Err(e) = assets.transfer_units(session.unit_ref(), participant, first_index, units) {
        *deposits.entry_mut(session_id, participant) = prior_entry;
        session.add_deposits(cost);
        session.rewind_units(units);
        if newly_priced {
            session.clear_price();
        }
        return Err(e.into());
    }

    // Reward accrues only once the units are delivered.
    rewards.credit(session.coordinator(), session.deposit_asset(), cost);

    Ok(MintOutcome {
        receipt: MintReceipt {
            receipt_id: uuid::Uuid::new_v4().to_string(),
            session_id,
            participant: participant.to_string(),
            units,
            unit_price,
            first_index,
            cost,
        },
        price_event,
    })
}

/// Release `amount` of the participant's locked deposit back to them, net
/// of the loss penalty retained by the session.
pub fn forgo<A: FungibleTransfer>(
    session: &mut Session,
    deposits: &mut DepositLedger,
    assets: &mut A,
    config: &PenaltyConfig,
    participant: &str,
    amount: i64,
    now: Timestamp,
) -> Result<ForgoOutcome, EngineError> {
    minting_guard(session, now)?;
    if amount <= 0 {
        return Err(EngineError::NonPositiveAmount { amount });
    }
    let session_id = session.session_id();
    let available = deposits.balance_of(session_id, participant);
    if amount > available {
        return Err(EngineError::InsufficientBalance {
            requested: amount,
            available,
        });
    }

    // Price discovery runs even though nothing is minted.
    let (unit_price, price_event) = discover_price(session, now);
    let newly_priced = price_event.is_some();

    let entry = deposits.entry_mut(session_id, participant);
    let prior_entry = entry.clone();
    let retained = penalty::assess(config, &prior_entry, unit_price, amount);

    // Effects before the external call.
    if let Err(e) = entry.debit_exact(amount) {
        if newly_priced {
            session.clear_price();
        }
        return Err(e);
    }
    session.sub_deposits(amount);
    session.add_retained_penalty(retained);

    // Interaction: pay the net amount back out of custody.
    let released = amount - retained;
    if released > 0 {
        if let Err(e) = assets.transfer_out(session.deposit_asset(), participant, released) {
            *deposits.entry_mut(session_id, participant) = prior_entry;
            session.add_deposits(amount);
            session.sub_retained_penalty(retained);
            if newly_priced {
                session.clear_price();
            }
            return Err(e.into());
        }
    }

    Ok(ForgoOutcome {
        released,
        penalty: retained,
        price_event,
    })
}
