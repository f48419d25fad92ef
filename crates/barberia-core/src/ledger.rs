//! # Loyalty Ledger
//!
//! Append-only record of every stamp and credit movement. Each path that
//! changes a customer's balances appends exactly one entry per movement:
//!
//! | Path               | reason           | delta_stamps   | delta_credit |
//! |--------------------|------------------|----------------|--------------|
//! | settlement         | `earn`           | +stamps earned | 0            |
//! | settlement         | `reward_applied` | -cost (or 0)   | 0            |
//! | settlement         | `credit_applied` | 0              | -credit      |
//! | redemption         | `redeem`         | -cost          | 0            |
//! | owner correction   | `adjustment`     | ±n             | ±amount      |
//!
//! Since nothing else moves a balance, summing a customer's entries gives
//! their current balances back. [`reconcile`] reports any drift, e.g. for
//! customers imported with an opening balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::snapshot::Snapshot;
use crate::types::{Customer, LedgerEntry, LedgerReason};
use crate::validation::validate_amount_delta;

// =============================================================================
// Entry Constructors
// =============================================================================

impl LedgerEntry {
    fn base(phone: &str, reason: LedgerReason, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            customer_phone: phone.to_string(),
            order_id: None,
            payment_ref: None,
            delta_stamps: 0,
            delta_credit: Money::zero(),
            reason,
            reward_id: None,
            note: None,
            created_at: now,
        }
    }

    fn for_order(mut self, order_id: &str, payment_ref: &str) -> Self {
        self.order_id = Some(order_id.to_string());
        self.payment_ref = Some(payment_ref.to_string());
        self
    }

    /// Stamps earned by a settled order. Appended even when zero.
    pub fn earn(
        phone: &str,
        order_id: &str,
        payment_ref: &str,
        stamps: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            delta_stamps: i64::from(stamps),
            ..Self::base(phone, LedgerReason::Earn, now).for_order(order_id, payment_ref)
        }
    }

    /// Reward consumed by a settled order. `stamps_spent` is 0 when a
    /// voucher covered it.
    pub fn reward_applied(
        phone: &str,
        order_id: &str,
        payment_ref: &str,
        reward_id: u32,
        stamps_spent: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            delta_stamps: -i64::from(stamps_spent),
            reward_id: Some(reward_id),
            ..Self::base(phone, LedgerReason::RewardApplied, now).for_order(order_id, payment_ref)
        }
    }

    /// Credit spent on a settled order.
    pub fn credit_applied(
        phone: &str,
        order_id: &str,
        payment_ref: &str,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            delta_credit: Money::zero() - amount,
            ..Self::base(phone, LedgerReason::CreditApplied, now).for_order(order_id, payment_ref)
        }
    }

    /// Stand-alone redemption of a reward for a voucher.
    pub fn redeem(phone: &str, reward_id: u32, stamp_cost: u32, now: DateTime<Utc>) -> Self {
        Self {
            delta_stamps: -i64::from(stamp_cost),
            reward_id: Some(reward_id),
            ..Self::base(phone, LedgerReason::Redeem, now)
        }
    }

    /// Owner correction.
    pub fn adjustment(
        phone: &str,
        delta_stamps: i64,
        delta_credit: Money,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            delta_stamps,
            delta_credit,
            note,
            ..Self::base(phone, LedgerReason::Adjustment, now)
        }
    }
}

// =============================================================================
// Balance Arithmetic
// =============================================================================

fn balance_out_of_range(field: &str, max: i64) -> CoreError {
    CoreError::Validation(ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max,
    })
}

/// Applies a signed stamp delta, refusing to go below zero.
pub(crate) fn apply_stamp_delta(balance: u32, delta: i64) -> CoreResult<u32> {
    let next = i64::from(balance)
        .checked_add(delta)
        .ok_or_else(|| balance_out_of_range("stamps_balance", i64::from(u32::MAX)))?;
    if next < 0 {
        return Err(CoreError::InsufficientStamps {
            available: balance,
            required: u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX),
        });
    }
    u32::try_from(next).map_err(|_| balance_out_of_range("stamps_balance", i64::from(u32::MAX)))
}

/// Applies a signed credit delta, refusing to go below zero.
pub(crate) fn apply_credit_delta(balance: Money, delta: Money) -> CoreResult<Money> {
    let next = balance
        .checked_add(delta)
        .ok_or_else(|| balance_out_of_range("credit_balance", i64::MAX))?;
    if next.is_negative() {
        return Err(CoreError::InsufficientCredit {
            available: balance,
            required: delta.abs(),
        });
    }
    Ok(next)
}

// =============================================================================
// Manual Adjustment
// =============================================================================

/// Owner correction of a customer's balances, ledgered as `adjustment`.
///
/// ## Rules
/// - At least one delta must be non-zero
/// - The credit delta is at most [`crate::MAX_AMOUNT_PESOS`] either way
/// - Neither balance may end up negative or overflow
pub fn adjust_balance(
    snapshot: &mut Snapshot,
    phone: &str,
    delta_stamps: i64,
    delta_credit: Money,
    note: Option<String>,
    now: DateTime<Utc>,
) -> CoreResult<LedgerEntry> {
    if delta_stamps == 0 && delta_credit.is_zero() {
        return Err(ValidationError::Required {
            field: "adjustment".to_string(),
        }
        .into());
    }
    validate_amount_delta("delta_credit", delta_credit)?;

    let customer = snapshot
        .customer(phone)
        .ok_or_else(|| CoreError::CustomerNotFound(phone.to_string()))?;
    let stamps = apply_stamp_delta(customer.stamps_balance, delta_stamps)?;
    let credit = apply_credit_delta(customer.credit_balance, delta_credit)?;

    let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    let entry = LedgerEntry::adjustment(phone, delta_stamps, delta_credit, note, now);

    if let Some(customer) = snapshot.customer_mut(phone) {
        customer.stamps_balance = stamps;
        customer.credit_balance = credit;
    }
    snapshot.ledger.push(entry.clone());
    Ok(entry)
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Ledger sums next to the stored balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Reconciliation {
    pub ledger_stamps: i64,
    pub ledger_credit: Money,
    pub stamps_balance: u32,
    pub credit_balance: Money,
    /// balance - ledger sum
    pub stamps_drift: i64,
    pub credit_drift: Money,
}

impl Reconciliation {
    #[inline]
    pub fn is_balanced(&self) -> bool {
        self.stamps_drift == 0 && self.credit_drift.is_zero()
    }
}

/// Compares a customer's balances with the sum of their ledger entries.
pub fn reconcile<'a>(
    customer: &Customer,
    entries: impl IntoIterator<Item = &'a LedgerEntry>,
) -> Reconciliation {
    let (ledger_stamps, ledger_credit) = entries
        .into_iter()
        .filter(|e| e.customer_phone == customer.phone)
        .fold((0i64, Money::zero()), |(s, c), e| {
            (s + e.delta_stamps, c + e.delta_credit)
        });

    Reconciliation {
        ledger_stamps,
        ledger_credit,
        stamps_balance: customer.stamps_balance,
        credit_balance: customer.credit_balance,
        stamps_drift: i64::from(customer.stamps_balance) - ledger_stamps,
        credit_drift: customer.credit_balance - ledger_credit,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
