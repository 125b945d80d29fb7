//! Pure pricing, admission and grading rules. No I/O happens here.

pub mod admission;
pub mod odds;
pub mod settlement;

pub use admission::{admit, BetRejection, BetSlip};
pub use odds::{compute_payout, quote, Odds, Payout};
pub use settlement::{credit_for, settle_bet, SettlementError};
