//! # barberia-core: Pure Business Logic for the Barbershop Front Desk
//!
//! Pricing, stamps, tiers, rewards, settlement and the loyalty ledger, as
//! pure functions over one in-memory [`Snapshot`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Barberia Front Desk                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/frontdesk (Session + Commands)             │   │
//! │  │    walk-in, checkout, confirm payment, redeem, book, ...        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ &mut Snapshot                          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ barberia-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   catalog ─► pricing ─► checkout ─► settlement ─► ledger        │   │
//! │  │   stamps     tier       rewards     redemption    booking       │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK • NO NETWORK • VALIDATE THEN APPLY          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌───────────────────┐  ┌──────▼────────────┐                           │
//! │  │ barberia-sync     │  │ barberia-db       │                           │
//! │  │ remote pull/push  │  │ snapshot storage  │                           │
//! │  └───────────────────┘  └───────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Customer, Order, Appointment, LedgerEntry, ...)
//! - [`money`] - Whole-peso money type
//! - [`catalog`] - Price list and reward table
//! - [`stamps`] / [`tier`] / [`rewards`] - Loyalty rules
//! - [`pricing`] - Order quote
//! - [`checkout`] / [`settlement`] - Order lifecycle
//! - [`redemption`] / [`ledger`] - Stamp spending and bookkeeping
//! - [`booking`] / [`customers`] / [`tips`] - Front desk records
//! - [`messaging`] - Outbound message decisions and rendering
//! - [`reports`] - Daily totals and follow-up lists
//!
//! ## Design Principles
//!
//! 1. **Time is an argument**: every operation takes `now`, nothing reads the clock
//! 2. **Validate, then apply**: an `Err` means the snapshot was not touched
//! 3. **Balances move only at settlement, redemption or adjustment**, each ledgered
//! 4. **Integer Money**: whole pesos, never floats
//!
//! ## Example Usage
//!
//! ```rust
//! use barberia_core::{stamps::stamps_for, Money, Snapshot};
//!
//! let snapshot = Snapshot::seeded();
//! let services = vec!["FULL_HAIR_CUT".to_string(), "BEARD".to_string()];
//!
//! assert_eq!(snapshot.catalog().subtotal(&services).unwrap(), Money::from_pesos(50_000));
//! assert_eq!(stamps_for(&services), 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod booking;
pub mod catalog;
pub mod checkout;
pub mod customers;
pub mod error;
pub mod ledger;
pub mod messaging;
pub mod money;
pub mod permissions;
pub mod pricing;
pub mod redemption;
pub mod reports;
pub mod rewards;
pub mod settlement;
pub mod snapshot;
pub mod stamps;
pub mod tier;
pub mod tips;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use snapshot::Snapshot;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Layout version of the persisted snapshot.
///
/// A stored payload with any other version is discarded, not migrated.
pub const DATA_VERSION: u32 = 2;

/// Service codes with built-in meaning for the stamp rule.
pub const FULL_HAIR_CUT: &str = "FULL_HAIR_CUT";
pub const CLEAN_CUT: &str = "CLEAN_CUT";
pub const BEARD: &str = "BEARD";
pub const EYEBROWS: &str = "EYEBROWS";

/// Either haircut earns the haircut stamp (at most one per order).
pub const HAIRCUT_CODES: [&str; 2] = [FULL_HAIR_CUT, CLEAN_CUT];

/// Trailing window for tier visits, in days.
pub const TIER_WINDOW_DAYS: i64 = 90;

pub const SILVER_MIN_VISITS: usize = 3;
pub const GOLD_MIN_VISITS: usize = 6;

/// Two active appointments of one barber closer than this conflict.
pub const BOOKING_CONFLICT_WINDOW_MINS: i64 = 30;

/// Slack for bookings made "right now" from a slow form.
pub const PAST_BOOKING_TOLERANCE_SECS: i64 = 60;

pub const MIN_PHONE_DIGITS: usize = 7;
pub const MAX_PHONE_DIGITS: usize = 15;
pub const MAX_NAME_LEN: usize = 100;

/// Upper bound for any single amount typed at the front desk.
pub const MAX_AMOUNT_PESOS: i64 = 100_000_000;

/// Delay after settlement before the tip request goes out.
pub const TIP_REQUEST_DELAY_SECS: u64 = 2;

/// Delay after settlement before the reward-unlocked message goes out.
pub const REWARD_UNLOCKED_DELAY_SECS: u64 = 4;

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Utc};

    use crate::money::Money;
    use crate::snapshot::Snapshot;
    use crate::types::{Customer, Order, OrderStatus};

    /// Bronze customer "Ana" with empty balances.
    pub fn customer(phone: &str) -> Customer {
        Customer::new(phone, "Ana", Utc::now())
    }

    /// A paid one-haircut order.
    pub fn paid_order(phone: &str, created_at: DateTime<Utc>) -> Order {
        Order {
            id: uuid::Uuid::new_v4().to_string(),
            customer_phone: phone.to_string(),
            customer_name: "Ana".to_string(),
            barber_id: 1,
            chair_id: 1,
            appointment_id: None,
            services: vec![crate::FULL_HAIR_CUT.to_string()],
            subtotal: Money::from_pesos(35_000),
            discount: Money::zero(),
            credit_applied: Money::zero(),
            reward_used: None,
            reward_source: None,
            total_due: Money::from_pesos(35_000),
            total_paid: Money::from_pesos(35_000),
            status: OrderStatus::Paid,
            payment_ref: "ORD-TEST0001".to_string(),
            payment_url: None,
            created_at,
            paid_at: Some(created_at),
        }
    }

    /// Seeded snapshot holding one customer.
    pub fn snapshot_with(customer: Customer) -> Snapshot {
        let mut snapshot = Snapshot::seeded();
        snapshot.customers.push(customer);
        snapshot
    }
}
