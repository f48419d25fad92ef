//! # Order Pricing
//!
//! Computes what a customer owes for a set of services. Pure and
//! side-effect free: balances only move at settlement.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. subtotal        = Σ price(service)                                  │
//! │  2. discount        = reward value (CREDIT) or service price (SERVICE)  │
//! │  3. credit_applied  = min(credit_balance, max(0, subtotal - discount))  │
//! │  4. total           = max(0, subtotal - discount - credit_applied)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Neither the reward nor the credit can push the total below zero, and a
//! discount larger than the subtotal leaves the credit balance untouched.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{Reward, RewardBenefit};

/// Locked-in amounts for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderQuote {
    pub subtotal: Money,
    pub discount: Money,
    pub credit_applied: Money,
    pub total: Money,
}

/// Discount a reward is worth against the current price list.
///
/// A free-service reward is valued at the listed price of its service, or
/// zero if that service has been removed from the list.
pub fn reward_discount(catalog: Catalog<'_>, reward: &Reward) -> Money {
    let discount = match &reward.benefit {
        RewardBenefit::Credit { value } => *value,
        RewardBenefit::Service { service_code } => {
            catalog.listed_price(service_code).unwrap_or_default()
        }
    };
    discount.non_negative()
}

/// Prices `services` for a customer holding `credit_balance`.
///
/// ## Errors
/// `ServiceNotFound` for any code outside the active catalog.
///
/// ## Example
/// ```rust
/// use barberia_core::{pricing::price_order, Money, Snapshot};
///
/// let snapshot = Snapshot::seeded();
/// let services = vec!["FULL_HAIR_CUT".to_string(), "BEARD".to_string()];
/// let quote = price_order(snapshot.catalog(), &services, None, Money::zero()).unwrap();
///
/// assert_eq!(quote.subtotal.pesos(), 50_000);
/// assert_eq!(quote.total.pesos(), 50_000);
/// ```
pub fn price_order(
    catalog: Catalog<'_>,
    services: &[String],
    reward: Option<&Reward>,
    credit_balance: Money,
) -> CoreResult<OrderQuote> {
    let subtotal = catalog.subtotal(services)?;
    let discount = reward.map_or(Money::zero(), |r| reward_discount(catalog, r));

    let remainder = (subtotal - discount).non_negative();
    let credit_applied = credit_balance.non_negative().min(remainder);
    let total = (subtotal - discount - credit_applied).non_negative();

    Ok(OrderQuote {
        subtotal,
        discount,
        credit_applied,
        total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
