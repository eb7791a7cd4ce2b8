//! Time primitives for window evaluation
//!
//! The engine never reads a clock of its own. Every state-changing operation
//! takes an explicit `now: Timestamp` from the caller, so the host (or a
//! test) fully controls time. A session's current phase is always recomputed
//! from `now` against its window bounds, never stored.

use serde::{Deserialize, Serialize};

/// Monotonically non-decreasing time signal supplied by the host.
pub type Timestamp = u64;

/// Largest representable timestamp. Used by the ExtendAtClearingPrice
/// rollover to hold a session in its minting phase indefinitely.
pub const MAX_TIMESTAMP: Timestamp = Timestamp::MAX;

/// A closed time interval `[start, end]`. Both bounds are inclusive.
///
/// # Example
/// ```
/// use mintwindow_core_rs::core::time::Window;
///
/// let w = Window::new(100, 200);
/// assert!(w.contains(100));
/// assert!(w.contains(200));
/// assert!(!w.contains(201));
/// assert_eq!(w.duration(), 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Window {
    /// Create a window. Bound ordering is validated at session creation,
    /// not here.
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// True while `start <= now <= end`.
    pub fn contains(&self, now: Timestamp) -> bool {
        self.start <= now && now <= self.end
    }

    /// True before the window opens (`now < start`).
    pub fn is_before(&self, now: Timestamp) -> bool {
        now < self.start
    }

    /// True once the window has passed (`now > end`).
    pub fn is_after(&self, now: Timestamp) -> bool {
        now > self.end
    }

    /// Window length. Zero-duration windows are legal (a single instant).
    pub fn duration(&self) -> u64 {
        self.end - self.start
    }

    /// Re-anchor this window to open at `at`, preserving its duration.
    pub(crate) fn anchored_at(&self, at: Timestamp) -> Self {
        Self {
            start: at,
            end: at + self.duration(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        let w = Window::new(10, 20);
        assert!(!w.contains(9));
        assert!(w.contains(10));
        assert!(w.contains(15));
        assert!(w.contains(20));
        assert!(!w.contains(21));
    }

    #[test]
    fn test_zero_duration_window() {
        let w = Window::new(10, 10);
        assert!(w.contains(10));
        assert!(w.is_before(9));
        assert!(w.is_after(11));
        assert_eq!(w.duration(), 0);
    }

    #[test]
    fn test_anchored_at_preserves_duration() {
        let w = Window::new(100, 250);
        let moved = w.anchored_at(1_000);
        assert_eq!(moved.start, 1_000);
        assert_eq!(moved.end, 1_150);
        assert_eq!(moved.duration(), w.duration());
    }
}
