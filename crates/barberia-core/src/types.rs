//! # Domain Types
//!
//! Core domain types shared by every layer of the front desk.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog                 People                 Visits                  │
//! │  ┌──────────────┐        ┌──────────────┐       ┌──────────────────┐    │
//! │  │ Service      │        │ Customer     │       │ Appointment      │    │
//! │  │ code, price  │        │ phone (key)  │◄──────│ customer_phone   │    │
//! │  │ duration     │        │ stamps       │       │ status           │    │
//! │  └──────────────┘        │ credit, tier │       └────────┬─────────┘    │
//! │  ┌──────────────┐        └──────▲───────┘                │ 0..1         │
//! │  │ Reward       │               │               ┌────────▼─────────┐    │
//! │  │ stamp_cost   │               │               │ Order            │    │
//! │  │ benefit      │               ├───────────────│ quote, status    │    │
//! │  │ tier gate    │               │               └────────┬─────────┘    │
//! │  └──────────────┘        ┌──────┴───────┐                │              │
//! │  ┌──────────────┐        │ LedgerEntry  │       ┌────────▼─────────┐    │
//! │  │ Barber       │        │ signed delta │       │ Tip              │    │
//! │  │ chair        │        │ reason       │       └──────────────────┘    │
//! │  └──────────────┘        └──────────────┘                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! - Customers are keyed by their normalized phone (digits only).
//! - Orders, appointments, ledger entries, tips and notifications use UUID v4
//!   strings.
//! - Services are keyed by a stable code (`FULL_HAIR_CUT`); rewards and
//!   barbers by small catalog integers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tier
// =============================================================================

/// Loyalty tier derived from paid visits in the trailing window.
///
/// See [`crate::tier`] for the rule. The value stored on a customer is a
/// cache refreshed at settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Bronze
    }
}

impl Tier {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Tier::Bronze => "BRONZE",
            Tier::Silver => "SILVER",
            Tier::Gold => "GOLD",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A service on the price list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Service {
    /// Stable key, e.g. `FULL_HAIR_CUT`
    pub code: String,
    pub name: String,
    pub price: Money,
    pub duration_mins: u32,
    pub active: bool,
}

/// What a reward gives the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardBenefit {
    /// Fixed amount off the order.
    Credit { value: Money },
    /// One service free (discount = that service's price).
    Service { service_code: String },
}

/// A reward that can be bought with stamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Reward {
    pub id: u32,
    pub name: String,
    pub benefit: RewardBenefit,
    /// Always > 0
    pub stamp_cost: u32,
    /// `None` = any tier
    pub tier_restriction: Option<Tier>,
    pub active: bool,
}

impl Reward {
    /// True if a customer of `tier` passes this reward's tier gate.
    #[inline]
    pub fn allows_tier(&self, tier: Tier) -> bool {
        self.tier_restriction.map_or(true, |gate| gate == tier)
    }
}

/// A barber and the chair they work from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Barber {
    pub id: u32,
    pub name: String,
    pub chair_id: u32,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub active: bool,
}

// =============================================================================
// Customer
// =============================================================================

/// A shop customer, keyed by normalized phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    /// Digits only; unique
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub opt_in: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub last_visit: Option<DateTime<Utc>>,
    pub stamps_balance: u32,
    pub credit_balance: Money,
    /// Cached; recomputed at settlement
    pub tier: Tier,
    /// Rewards redeemed with stamps and not yet applied to an order
    #[serde(default)]
    pub reward_vouchers: Vec<u32>,
}

impl Customer {
    /// Creates a first-visit customer with empty balances.
    pub fn new(phone: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            phone: phone.into(),
            name: name.into(),
            email: None,
            opt_in: true,
            created_at: now,
            last_visit: None,
            stamps_balance: 0,
            credit_balance: Money::zero(),
            tier: Tier::Bronze,
            reward_vouchers: Vec::new(),
        }
    }

    /// True if an unspent voucher for `reward_id` is held.
    #[inline]
    pub fn holds_voucher(&self, reward_id: u32) -> bool {
        self.reward_vouchers.contains(&reward_id)
    }
}

// =============================================================================
// Order
// =============================================================================

/// Order lifecycle status.
///
/// ## Transitions
/// ```text
///            settle
/// PENDING ─────────► PAID ─────► REFUNDED
///    │
///    ├──────────────► CANCELLED
///    └──────────────► FAILED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
    Failed,
    Refunded,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }

    /// Checks whether moving to `to` is allowed.
    ///
    /// Unlike most state machines, same-status moves are rejected: a PAID
    /// order must never be paid again.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (OrderStatus::Pending, OrderStatus::Paid)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Pending, OrderStatus::Failed)
                | (OrderStatus::Paid, OrderStatus::Refunded)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the reward on an order is paid for, fixed when the order opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardSource {
    /// A voucher redeemed earlier; no stamps move at settlement.
    Voucher,
    /// `stamp_cost` stamps are deducted at settlement.
    Stamps,
}

/// One checkout transaction with its locked-in amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub customer_phone: String,
    pub customer_name: String,
    pub barber_id: u32,
    pub chair_id: u32,
    pub appointment_id: Option<String>,
    pub services: Vec<String>,
    pub subtotal: Money,
    pub discount: Money,
    pub credit_applied: Money,
    pub reward_used: Option<u32>,
    /// Set whenever `reward_used` is
    #[serde(default)]
    pub reward_source: Option<RewardSource>,
    pub total_due: Money,
    pub total_paid: Money,
    pub status: OrderStatus,
    /// Opaque payment reference (shown as text next to the QR)
    pub payment_ref: String,
    pub payment_url: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    #[inline]
    pub fn is_paid(&self) -> bool {
        self.status == OrderStatus::Paid
    }
}

// =============================================================================
// Appointment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }

    /// Still occupies the barber's slot.
    #[inline]
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    /// Can still be cancelled or rescheduled.
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Pending | AppointmentStatus::Scheduled | AppointmentStatus::Confirmed
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
}

/// Where the appointment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentSource {
    Walkin,
    Client,
    Reception,
}

/// A scheduled or walk-in visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Appointment {
    pub id: String,
    pub customer_phone: String,
    pub customer_name: String,
    pub barber_id: u32,
    pub chair_id: u32,
    #[ts(as = "String")]
    pub scheduled_at: DateTime<Utc>,
    pub services: Vec<String>,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub source: AppointmentSource,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Ledger
// =============================================================================

/// Why a customer's balance moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LedgerReason {
    /// Stamps earned at settlement
    Earn,
    /// Stamps spent on a voucher outside checkout
    Redeem,
    /// Reward consumed at settlement
    RewardApplied,
    /// Credit spent at settlement
    CreditApplied,
    /// Owner correction
    Adjustment,
}

/// Append-only record of one balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerEntry {
    pub id: String,
    pub customer_phone: String,
    pub order_id: Option<String>,
    pub payment_ref: Option<String>,
    pub delta_stamps: i64,
    pub delta_credit: Money,
    pub reason: LedgerReason,
    pub reward_id: Option<u32>,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Tip
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipStatus {
    Paid,
}

/// Gratuity for the barber of a paid order. Not part of the loyalty ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tip {
    pub id: String,
    pub order_id: String,
    pub barber_id: u32,
    pub chair_id: u32,
    pub customer_phone: String,
    pub amount: Money,
    pub payment_ref: String,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
    pub status: TipStatus,
}

// =============================================================================
// Notification
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    CalendarSync,
    MessageSent,
    MessageBlocked,
    PrivacyBlock,
    RewardUnlocked,
    RewardRedeemed,
    Export,
    Info,
}

/// Entry in the front desk activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notification {
    pub id: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub customer_phone: Option<String>,
    pub barber_id: Option<u32>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: now,
            read: false,
            kind,
            title: title.into(),
            message: message.into(),
            customer_phone: None,
            barber_id: None,
        }
    }

    pub fn for_customer(mut self, phone: impl Into<String>) -> Self {
        self.customer_phone = Some(phone.into());
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
