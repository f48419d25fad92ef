//! # Reports
//!
//! Read-only views for the dashboard: the day's totals and the customers
//! worth a follow-up message.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::messaging::{MessageIntent, OutboundMessage};
use crate::money::Money;
use crate::snapshot::Snapshot;
use crate::types::{Order, OrderStatus};
use crate::{CLEAN_CUT, FULL_HAIR_CUT};

// =============================================================================
// Daily Summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub paid_orders: usize,
    /// Sum of `total_paid`
    pub revenue: Money,
    pub tips: Money,
    pub appointments: usize,
    pub average_ticket: Money,
    /// Service code → times sold in paid orders
    pub services: BTreeMap<String, usize>,
}

fn paid_on(order: &Order) -> NaiveDate {
    order.paid_at.unwrap_or(order.created_at).date_naive()
}

/// Totals for one calendar day (UTC).
pub fn daily_summary(snapshot: &Snapshot, date: NaiveDate) -> DailySummary {
    let paid: Vec<&Order> = snapshot
        .orders
        .iter()
        .filter(|o| o.status == OrderStatus::Paid && paid_on(o) == date)
        .collect();

    let revenue: Money = paid.iter().map(|o| o.total_paid).sum();
    let average_ticket = if paid.is_empty() {
        Money::zero()
    } else {
        Money::from_pesos(revenue.pesos() / paid.len() as i64)
    };

    let mut services = BTreeMap::new();
    for code in paid.iter().flat_map(|o| o.services.iter()) {
        *services.entry(code.clone()).or_insert(0) += 1;
    }

    DailySummary {
        date,
        paid_orders: paid.len(),
        revenue,
        tips: snapshot
            .tips
            .iter()
            .filter(|t| t.paid_at.date_naive() == date)
            .map(|t| t.amount)
            .sum(),
        appointments: snapshot
            .appointments
            .iter()
            .filter(|a| a.status.is_active() && a.scheduled_at.date_naive() == date)
            .count(),
        average_ticket,
        services,
    }
}

// =============================================================================
// Follow-ups
// =============================================================================

/// A customer due for a retouch or win-back message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FollowUp {
    pub customer_phone: String,
    pub customer_name: String,
    pub days_since_visit: i64,
    pub message: OutboundMessage,
}

impl FollowUp {
    pub fn intent(&self) -> MessageIntent {
        MessageIntent::now(self.customer_phone.clone(), self.message.clone())
    }
}

/// Customers to contact, based on their last paid visit.
///
/// - No visit for `winback_days` → win-back
/// - Last visit had a full cut and `fresh_cut_days_full` passed, or a clean
///   cut and `fresh_cut_days_clean` passed → retouch reminder
///
/// Customers with an upcoming open appointment are skipped.
pub fn due_follow_ups(snapshot: &Snapshot, now: DateTime<Utc>) -> Vec<FollowUp> {
    let settings = &snapshot.settings;

    snapshot
        .customers
        .iter()
        .filter(|c| {
            !snapshot
                .appointments
                .iter()
                .any(|a| a.customer_phone == c.phone && a.status.is_open() && a.scheduled_at > now)
        })
        .filter_map(|c| {
            let last = snapshot
                .orders
                .iter()
                .filter(|o| o.customer_phone == c.phone && o.status == OrderStatus::Paid)
                .max_by_key(|o| o.paid_at.unwrap_or(o.created_at))?;
            let days = (now - last.paid_at.unwrap_or(last.created_at)).num_days();
            let has = |code: &str| last.services.iter().any(|s| s == code);

            let message = if days >= i64::from(settings.winback_days) {
                OutboundMessage::Winback { days }
            } else if (has(FULL_HAIR_CUT) && days >= i64::from(settings.fresh_cut_days_full))
                || (has(CLEAN_CUT) && days >= i64::from(settings.fresh_cut_days_clean))
            {
                OutboundMessage::FreshCut
            } else {
                return None;
            };

            Some(FollowUp {
                customer_phone: c.phone.clone(),
                customer_name: c.name.clone(),
                days_since_visit: days,
                message,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
