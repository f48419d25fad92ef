//! # Tier Engine
//!
//! A customer's tier is derived from how often they paid for a visit in the
//! trailing window, never stored as truth.
//!
//! ```text
//!   paid visits with created_at > as_of - 90d
//!   ─────────────────────────────────────────
//!        0..=2  →  BRONZE
//!        3..=5  →  SILVER
//!        6..    →  GOLD
//! ```
//!
//! The window boundary is exclusive: an order created exactly 90 days
//! before `as_of` no longer counts.

use chrono::{DateTime, Duration, Utc};

use crate::types::{Order, OrderStatus, Tier};
use crate::{GOLD_MIN_VISITS, SILVER_MIN_VISITS, TIER_WINDOW_DAYS};

/// Maps a visit count to its tier.
pub fn tier_for_visits(visits: usize) -> Tier {
    if visits >= GOLD_MIN_VISITS {
        Tier::Gold
    } else if visits >= SILVER_MIN_VISITS {
        Tier::Silver
    } else {
        Tier::Bronze
    }
}

/// Paid orders of `phone` created strictly inside the trailing window.
pub fn recent_paid_visits(orders: &[Order], phone: &str, as_of: DateTime<Utc>) -> usize {
    let cutoff = as_of - Duration::days(TIER_WINDOW_DAYS);
    orders
        .iter()
        .filter(|o| o.customer_phone == phone)
        .filter(|o| o.status == OrderStatus::Paid)
        .filter(|o| o.created_at > cutoff)
        .count()
}

/// Current tier of a customer, recomputed from order history.
///
/// ## Example
/// ```rust
/// use barberia_core::{tier::tier_of, Tier};
///
/// let now = chrono::Utc::now();
/// assert_eq!(tier_of(&[], "3001234567", now), Tier::Bronze);
/// ```
pub fn tier_of(orders: &[Order], phone: &str, as_of: DateTime<Utc>) -> Tier {
    tier_for_visits(recent_paid_visits(orders, phone, as_of))
}
