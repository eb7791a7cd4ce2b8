//! Clearing price discovery
//!
//! The clearing price is derived once per session epoch, lazily, on the
//! first settlement call (mint or forgo) inside the minting window:
//!
//! ```text
//! result_price = total_deposits / max_supply      (integer floor division)
//! ```
//!
//! Any remainder of the division is forfeited (a deliberate
//! simplification). Once discovered the price is a constant for the rest of
//! the epoch; a Restart rollover clears it so the next epoch re-clears
//! against its own deposits. The price actually charged at settlement is
//! `max(result_price, min_price)`: the floor protects the coordinator from
//! a clearing price below their stated reserve.

use crate::core::time::Timestamp;
use crate::models::session::Session;
use serde::{Deserialize, Serialize};

/// Emitted detail when discovery fixes the price for an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSet {
    pub result_price: i64,
    pub effective_price: i64,
}

/// Price per unit applied to settlement: the clearing price, floored at the
/// session's reserve.
pub fn effective_price(session: &Session) -> i64 {
    session.result_price().max(session.min_price())
}

/// Run lazy price discovery. Returns the effective price and, when this
/// call was the one that fixed the price, the discovery detail for event
/// emission. Idempotent after the first call of an epoch.
pub fn discover_price(session: &mut Session, now: Timestamp) -> (i64, Option<PriceSet>) {
    if session.price_discovered_at().is_some() {
        return (effective_price(session), None);
    }

    let result_price = session.total_deposits() / session.max_supply() as i64;
    session.set_price(result_price, now);
    let effective = effective_price(session);
    (
        effective,
        Some(PriceSet {
            result_price,
            effective_price: effective,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::Window;
    use crate::models::session::RolloverOption;

    fn session(total_deposits: i64, max_supply: u64, min_price: i64) -> Session {
        let mut s = Session::new(
            0,
            "UNIT".to_string(),
            "COORD".to_string(),
            "CREDIT".to_string(),
            Window::new(0, 100),
            Window::new(200, 300),
            min_price,
            max_supply,
            RolloverOption::Close,
        );
        s.add_deposits(total_deposits);
        s
    }

    #[test]
    fn test_floor_division() {
        let mut s = session(20_000, 10_000, 1);
        let (eff, set) = discover_price(&mut s, 200);
        assert_eq!(eff, 2);
        assert_eq!(
            set,
            Some(PriceSet {
                result_price: 2,
                effective_price: 2,
            })
        );

        let mut s = session(19_999, 10_000, 1);
        let (eff, _) = discover_price(&mut s, 200);
        assert_eq!(s.result_price(), 1); // remainder forfeited
        assert_eq!(eff, 1);
    }

    #[test]
    fn test_min_price_floor() {
        let mut s = session(5_000, 10_000, 3);
        let (eff, set) = discover_price(&mut s, 200);
        assert_eq!(s.result_price(), 0);
        assert_eq!(eff, 3);
        assert_eq!(set.unwrap().effective_price, 3);
    }

    #[test]
    fn test_discovery_is_once_only() {
        let mut s = session(20_000, 10_000, 1);
        discover_price(&mut s, 200);

        // Deposits change (settlement debits), price does not.
        s.sub_deposits(10_000);
        let (eff, set) = discover_price(&mut s, 250);
        assert_eq!(eff, 2);
        assert_eq!(set, None);
        assert_eq!(s.price_discovered_at(), Some(200));
    }
}
