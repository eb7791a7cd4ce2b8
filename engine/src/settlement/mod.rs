//! Settlement engine: price discovery, minting, forgoing
//!
//! Operations are free functions over explicit stores (`Session`,
//! `DepositLedger`, `RewardLedger`, a transfer capability), so each scenario
//! can be tested against an isolated fixture. All of them follow
//! checks-effects-interactions: internal ledger mutations land before the
//! external transfer call that could re-enter, and a failed transfer rolls
//! the operation's own mutations back.

pub mod clearing;
pub mod mint;
pub mod penalty;

pub use clearing::{discover_price, effective_price, PriceSet};
pub use mint::{forgo, mint, ForgoOutcome, MintOutcome, MintReceipt};
pub use penalty::PenaltyConfig;
