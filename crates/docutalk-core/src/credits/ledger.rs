//! Fixed-point credit balance.
//!
//! Balances are kept in credits, where one dollar is worth
//! [`CREDITS_PER_DOLLAR`] credits. The total allowance and the consumed
//! amount are both truncated to whole credits before subtracting, and the
//! result is never clamped: a negative remainder means the allowance is
//! depleted.
//!
//! The ledger publishes snapshots through a `tokio::sync::watch` channel so
//! displays can follow balance changes without polling.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use docutalk_types::stream::CreditNotice;

/// Credits per dollar of allowance.
pub const CREDITS_PER_DOLLAR: f64 = 1000.0;

/// Tolerance for binary float error when scaling dollars to credits.
const DRIFT_EPSILON: f64 = 1e-6;

/// Convert a dollar amount to whole credits, truncating toward negative
/// infinity.
///
/// Values within float drift of an integer are snapped to it first, so
/// `1.237` dollars is 1237 credits even though `1.237 * 1000.0` evaluates to
/// `1236.9999999999998`.
pub fn credits_from_dollars(dollars: f64) -> i64 {
    let scaled = dollars * CREDITS_PER_DOLLAR;
    let nearest = scaled.round();
    if (scaled - nearest).abs() < DRIFT_EPSILON {
        nearest as i64
    } else {
        scaled.floor() as i64
    }
}

/// Point-in-time view of the balance. Either side may still be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreditSnapshot {
    pub total: Option<i64>,
    pub consumed: Option<i64>,
}

impl CreditSnapshot {
    /// `total - consumed`, once both are known.
    pub fn remaining(&self) -> Option<i64> {
        Some(self.total? - self.consumed?)
    }
}

/// Shared credit balance. Cloning yields another handle to the same ledger.
#[derive(Debug, Clone)]
pub struct CreditLedger {
    state: Arc<watch::Sender<CreditSnapshot>>,
    exchange_rate: f64,
}

impl CreditLedger {
    /// `exchange_rate` is the number of notice credits per dollar, used to
    /// turn credit notices into a provisional balance.
    pub fn new(exchange_rate: f64) -> Self {
        let (tx, _rx) = watch::channel(CreditSnapshot::default());
        Self {
            state: Arc::new(tx),
            exchange_rate,
        }
    }

    /// Set the period allowance from the profile's dollar amount.
    pub fn set_allowance(&self, period_dollar_amount: f64) {
        let total = credits_from_dollars(period_dollar_amount);
        self.state.send_modify(|s| s.total = Some(total));
        debug!(total, "credit allowance set");
    }

    /// Authoritative update from the consumed price in dollars. Replaces any
    /// provisional value.
    pub fn apply(&self, consumed_price_dollars: f64) {
        let consumed = credits_from_dollars(consumed_price_dollars);
        self.state.send_modify(|s| s.consumed = Some(consumed));
        debug!(consumed, remaining = ?self.remaining(), "credit balance reconciled");
    }

    /// Provisional update from a credit notice, pending the refetch.
    ///
    /// Has no effect until an authoritative consumed amount is known.
    pub fn apply_notice(&self, notice: &CreditNotice) {
        if self.exchange_rate <= 0.0 {
            return;
        }
        let delta = credits_from_dollars(notice.consumed_credits / self.exchange_rate);
        self.state.send_if_modified(|s| match s.consumed.as_mut() {
            Some(consumed) => {
                *consumed += delta;
                true
            }
            None => false,
        });
    }

    pub fn remaining(&self) -> Option<i64> {
        self.state.borrow().remaining()
    }

    pub fn total(&self) -> Option<i64> {
        self.state.borrow().total
    }

    pub fn snapshot(&self) -> CreditSnapshot {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<CreditSnapshot> {
        self.state.subscribe()
    }
}
