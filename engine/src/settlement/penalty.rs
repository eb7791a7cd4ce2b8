//! Loss penalty model for forgone deposits
//!
//! Contract: the penalty is zero for deposits made at the allocation start,
//! grows monotonically the later the deposit was made within the allocation
//! window, is capped at a configurable maximum fraction, and is waived
//! entirely when the participant's whole locked balance could never afford
//! a single unit. The curve is linear in the amount-weighted average
//! lateness of the participant's deposits:
//!
//! ```text
//! penalty(amount) = floor(amount × max_fraction × avg_lateness)
//! ```

use crate::core::time::{Timestamp, Window};
use crate::models::deposit::ParticipantDeposit;

/// Penalty model parameters.
#[derive(Debug, Clone)]
pub struct PenaltyConfig {
    /// Largest fraction of a forgone amount the session may retain.
    /// Reached only by deposits made at the very end of the allocation
    /// window.
    pub max_fraction: f64,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self { max_fraction: 0.10 }
    }
}

impl PenaltyConfig {
    /// # Panics
    /// Panics if `max_fraction` is not in `[0.0, 1.0]`.
    pub fn new(max_fraction: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&max_fraction),
            "max_fraction must be between 0.0 and 1.0"
        );
        Self { max_fraction }
    }
}

/// Normalized lateness of an instant within a window, in [0, 1].
/// A zero-length window yields 0 (there is no "late" in a single instant).
pub fn lateness(window: &Window, at: Timestamp) -> f64 {
    if window.duration() == 0 || at <= window.start {
        return 0.0;
    }
    let elapsed = (at - window.start).min(window.duration());
    elapsed as f64 / window.duration() as f64
}

/// Penalty retained from forgoing `amount`, given the participant's entry
/// and the effective unit price.
pub fn assess(
    config: &PenaltyConfig,
    entry: &ParticipantDeposit,
    effective_price: i64,
    amount: i64,
) -> i64 {
    // Waived: the whole balance can never afford one unit.
    if effective_price > 0 && entry.balance() < effective_price {
        return 0;
    }
    let fraction = config.max_fraction * entry.average_lateness();
    let penalty = (amount as f64 * fraction).floor() as i64;
    penalty.clamp(0, amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(balance: i64, avg_lateness: f64) -> ParticipantDeposit {
        let mut e = ParticipantDeposit::default();
        e.record_deposit(balance, avg_lateness);
        e
    }

    #[test]
    fn test_lateness_is_linear_and_clamped() {
        let w = Window::new(100, 200);
        assert_eq!(lateness(&w, 100), 0.0);
        assert!((lateness(&w, 150) - 0.5).abs() < 1e-9);
        assert_eq!(lateness(&w, 200), 1.0);
        assert_eq!(lateness(&w, 250), 1.0);
        assert_eq!(lateness(&w, 50), 0.0);
    }

    #[test]
    fn test_zero_length_window_has_no_lateness() {
        let w = Window::new(100, 100);
        assert_eq!(lateness(&w, 100), 0.0);
    }

    #[test]
    fn test_penalty_monotone_in_lateness() {
        let config = PenaltyConfig::default();
        let early = assess(&config, &entry(10_000, 0.0), 10, 1_000);
        let mid = assess(&config, &entry(10_000, 0.5), 10, 1_000);
        let late = assess(&config, &entry(10_000, 1.0), 10, 1_000);

        assert_eq!(early, 0);
        assert_eq!(mid, 50);
        assert_eq!(late, 100); // the configured cap: 10% of 1_000
        assert!(early <= mid && mid <= late);
    }

    #[test]
    fn test_waived_when_balance_below_unit_price() {
        let config = PenaltyConfig::default();
        let small = entry(5, 1.0);
        assert_eq!(assess(&config, &small, 10, 5), 0);
    }

    #[test]
    fn test_not_waived_at_exactly_one_unit() {
        let config = PenaltyConfig::default();
        let exact = entry(10, 1.0);
        assert_eq!(assess(&config, &exact, 10, 10), 1);
    }
}
