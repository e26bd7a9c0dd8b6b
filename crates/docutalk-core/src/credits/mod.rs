//! Credit accounting: fixed-point balance and authoritative refetch.

pub mod ledger;
pub mod refresh;

pub use ledger::{credits_from_dollars, CreditLedger, CreditSnapshot, CREDITS_PER_DOLLAR};
pub use refresh::{refresh_account, spawn_refetch};
