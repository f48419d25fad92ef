//! # Settlement
//!
//! The one transition that moves loyalty balances: a PENDING order becomes
//! PAID when its payment is confirmed.
//!
//! ## Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │ PLAN (read-only, any failure leaves the snapshot untouched)             │
//! │   1. order must be PENDING              ─► InvalidOrderStatus           │
//! │   2. reward: voucher order consumes a voucher ─► RewardNotEligible      │
//! │              stamps order deducts stamp_cost ─► InsufficientStamps      │
//! │   3. credit_applied ≤ credit_balance    ─► InsufficientCredit           │
//! │   4. earned = stamps_for(services)                                      │
//! │   5. unlocked = next_reward(balance before earning) reached after       │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │ APPLY                                                                   │
//! │   order PAID, total_paid = total_due, paid_at = now                     │
//! │   customer balances, vouchers, last_visit, tier (order now counted)     │
//! │   appointment COMPLETED / PAID                                          │
//! │   ledger: reward_applied?, credit_applied?, earn                        │
//! │   notification REWARD_UNLOCKED?                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Re-confirming a PAID order fails at step 1, so stamps are never credited
//! twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::ledger::{apply_credit_delta, apply_stamp_delta};
use crate::messaging::{MessageIntent, OutboundMessage};
use crate::money::Money;
use crate::rewards::{progress, unlocked_reward, RewardProgress};
use crate::snapshot::Snapshot;
use crate::stamps::stamps_for;
use crate::tier::tier_of;
use crate::types::{
    AppointmentStatus, LedgerEntry, Notification, NotificationKind, Order, OrderStatus,
    PaymentStatus, Reward, RewardSource, Tier,
};
use crate::{REWARD_UNLOCKED_DELAY_SECS, TIP_REQUEST_DELAY_SECS};

/// Result of a confirmed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettlementReceipt {
    pub order: Order,
    pub stamps_earned: u32,
    pub stamps_balance: u32,
    pub credit_balance: Money,
    pub tier: Tier,
    pub next_reward: Option<RewardProgress>,
    pub unlocked_reward: Option<Reward>,
    pub ledger_entries: Vec<LedgerEntry>,
    /// Receipt, tip request and reward-unlocked messages for the dispatcher
    pub messages: Vec<MessageIntent>,
}

/// Confirms payment of `order_id` and applies every balance change.
///
/// ## Errors
/// - `OrderNotFound`, `CustomerNotFound`
/// - `InvalidOrderStatus` unless the order is PENDING
/// - `InsufficientStamps` / `InsufficientCredit` if balances changed since
///   the order was opened
pub fn settle_order(
    snapshot: &mut Snapshot,
    order_id: &str,
    now: DateTime<Utc>,
) -> CoreResult<SettlementReceipt> {
    let order = snapshot
        .order(order_id)
        .cloned()
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
    if !order.status.can_transition_to(OrderStatus::Paid) {
        return Err(CoreError::InvalidOrderStatus {
            order_id: order.id,
            current_status: order.status.to_string(),
        });
    }

    let customer = snapshot
        .customer(&order.customer_phone)
        .cloned()
        .ok_or_else(|| CoreError::CustomerNotFound(order.customer_phone.clone()))?;
    let phone = customer.phone.clone();

    // -------------------------------------------------------------------------
    // Plan
    // -------------------------------------------------------------------------
    let mut vouchers = customer.reward_vouchers.clone();
    let mut stamps = customer.stamps_balance;
    let mut entries = Vec::with_capacity(3);

    if let Some(reward_id) = order.reward_used {
        let reward = snapshot.catalog().reward_by_id(reward_id)?;
        let held = vouchers.iter().position(|v| *v == reward_id);
        let spent = match (order.reward_source, held) {
            (Some(RewardSource::Voucher), Some(pos)) => {
                vouchers.remove(pos);
                0
            }
            (Some(RewardSource::Voucher), None) => {
                return Err(CoreError::RewardNotEligible {
                    reward_id,
                    reason: "voucher already used".to_string(),
                });
            }
            (Some(RewardSource::Stamps), _) => {
                stamps = apply_stamp_delta(stamps, -i64::from(reward.stamp_cost))?;
                reward.stamp_cost
            }
            // Orders stored before the source was recorded
            (None, Some(pos)) => {
                vouchers.remove(pos);
                0
            }
            (None, None) => {
                stamps = apply_stamp_delta(stamps, -i64::from(reward.stamp_cost))?;
                reward.stamp_cost
            }
        };
        entries.push(LedgerEntry::reward_applied(
            &phone,
            &order.id,
            &order.payment_ref,
            reward_id,
            spent,
            now,
        ));
    }

    let credit = apply_credit_delta(customer.credit_balance, Money::zero() - order.credit_applied)?;
    if order.credit_applied.is_positive() {
        entries.push(LedgerEntry::credit_applied(
            &phone,
            &order.id,
            &order.payment_ref,
            order.credit_applied,
            now,
        ));
    }

    let earned = stamps_for(&order.services);
    let before = stamps;
    let after = apply_stamp_delta(before, i64::from(earned))?;
    entries.push(LedgerEntry::earn(&phone, &order.id, &order.payment_ref, earned, now));

    let catalog = snapshot.catalog();
    let unlocked = unlocked_reward(catalog, before, after).cloned();
    let next = progress(catalog, after);
    let service_names = catalog.service_names(&order.services);
    let barber_name = snapshot
        .barbers
        .iter()
        .find(|b| b.id == order.barber_id)
        .map_or_else(|| "tu barbero".to_string(), |b| b.name.clone());

    // -------------------------------------------------------------------------
    // Apply
    // -------------------------------------------------------------------------
    let paid = Order {
        status: OrderStatus::Paid,
        total_paid: order.total_due,
        paid_at: Some(now),
        ..order
    };
    if let Some(slot) = snapshot.order_mut(order_id) {
        *slot = paid.clone();
    }

    let tier = tier_of(&snapshot.orders, &phone, now);
    if let Some(c) = snapshot.customer_mut(&phone) {
        c.stamps_balance = after;
        c.credit_balance = credit;
        c.reward_vouchers = vouchers;
        c.last_visit = Some(now);
        c.tier = tier;
    }

    if let Some(appointment_id) = paid.appointment_id.as_deref() {
        if let Some(a) = snapshot.appointment_mut(appointment_id) {
            a.status = AppointmentStatus::Completed;
            a.payment_status = PaymentStatus::Paid;
        }
    }

    snapshot.ledger.extend(entries.iter().cloned());

    let mut messages = vec![
        MessageIntent::now(
            &phone,
            OutboundMessage::Receipt {
                services: service_names,
                total: paid.total_paid,
                stamps_earned: earned,
                stamps_balance: after,
                next_reward: next.clone(),
            },
        ),
        MessageIntent::after(
            &phone,
            OutboundMessage::TipRequest { barber_name },
            TIP_REQUEST_DELAY_SECS,
        ),
    ];

    if let Some(reward) = &unlocked {
        snapshot.push_notification(
            Notification::new(
                NotificationKind::RewardUnlocked,
                "Recompensa desbloqueada",
                format!("{} desbloqueo {}", customer.name, reward.name),
                now,
            )
            .for_customer(&phone),
        );
        messages.push(MessageIntent::after(
            &phone,
            OutboundMessage::RewardUnlocked {
                reward_name: reward.name.clone(),
            },
            REWARD_UNLOCKED_DELAY_SECS,
        ));
    }

    Ok(SettlementReceipt {
        order: paid,
        stamps_earned: earned,
        stamps_balance: after,
        credit_balance: credit,
        tier,
        next_reward: next,
        unlocked_reward: unlocked,
        ledger_entries: entries,
        messages,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{open_order, start_walk_in, OrderDraft, WalkInRequest};
    use crate::ledger::reconcile;
    use crate::redemption::redeem_reward;
    use crate::test_support::{customer, paid_order, snapshot_with};
    use crate::types::LedgerReason;
    use crate::{BEARD, CLEAN_CUT, FULL_HAIR_CUT};
    use chrono::Duration;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn draft(services: &[&str], reward_id: Option<u32>) -> OrderDraft {
        OrderDraft {
            customer_phone: "3001234567".into(),
            barber_id: 1,
            services: codes(services),
            reward_id,
            appointment_id: None,
        }
    }

    #[test]
    fn test_first_visit_haircut_and_beard() {
        let now = Utc::now();
        let mut snapshot = Snapshot::seeded();
        let walk_in = start_walk_in(
            &mut snapshot,
            WalkInRequest {
                phone: "3001234567".into(),
                name: Some("Ana".into()),
                barber_id: 1,
                services: codes(&[FULL_HAIR_CUT, BEARD]),
                reward_id: None,
                notes: None,
            },
            now,
        )
        .unwrap();

        let receipt = settle_order(&mut snapshot, &walk_in.order.id, now).unwrap();

        assert_eq!(receipt.order.status, OrderStatus::Paid);
        assert_eq!(receipt.order.total_paid.pesos(), 50_000);
        assert_eq!(receipt.order.total_paid, receipt.order.total_due);
        assert_eq!(receipt.stamps_earned, 2);
        assert_eq!(receipt.stamps_balance, 2);
        assert_eq!(receipt.tier, Tier::Bronze);
        assert_eq!(receipt.next_reward.as_ref().unwrap().stamps_needed, 4);
        assert!(receipt.unlocked_reward.is_none());

        let ana = snapshot.customer("3001234567").unwrap();
        assert_eq!(ana.stamps_balance, 2);
        assert_eq!(ana.last_visit, Some(now));

        let appt = snapshot.appointment(&walk_in.appointment.id).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Completed);
        assert_eq!(appt.payment_status, PaymentStatus::Paid);

        assert_eq!(snapshot.ledger.len(), 1);
        assert_eq!(snapshot.ledger[0].reason, LedgerReason::Earn);
        assert_eq!(snapshot.ledger[0].delta_stamps, 2);

        // Receipt now, tip after a delay
        assert_eq!(receipt.messages.len(), 2);
        assert_eq!(receipt.messages[0].delay_secs, 0);
        assert_eq!(receipt.messages[1].delay_secs, TIP_REQUEST_DELAY_SECS);
    }

    #[test]
    fn test_settling_twice_is_rejected() {
        let now = Utc::now();
        let mut snapshot = snapshot_with(customer("3001234567"));
        let order = open_order(&mut snapshot, draft(&[FULL_HAIR_CUT, BEARD], None), now).unwrap();

        settle_order(&mut snapshot, &order.id, now).unwrap();
        let after_first = snapshot.clone();

        let err = settle_order(&mut snapshot, &order.id, now).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidOrderStatus { ref current_status, .. } if current_status == "PAID"
        ));
        assert_eq!(snapshot, after_first);
        assert_eq!(snapshot.customer("3001234567").unwrap().stamps_balance, 2);
    }

    #[test]
    fn test_sixth_visit_reaches_gold() {
        let now = Utc::now();
        let mut snapshot = snapshot_with(customer("3001234567"));
        for d in 1..=5 {
            snapshot
                .orders
                .push(paid_order("3001234567", now - Duration::days(d * 10)));
        }

        let order = open_order(&mut snapshot, draft(&[CLEAN_CUT], None), now).unwrap();
        let receipt = settle_order(&mut snapshot, &order.id, now).unwrap();

        assert_eq!(receipt.tier, Tier::Gold);
        assert_eq!(snapshot.customer("3001234567").unwrap().tier, Tier::Gold);
    }

    #[test]
    fn test_reward_and_credit_are_deducted_and_ledgered() {
        let now = Utc::now();
        let mut ana = customer("3001234567");
        ana.stamps_balance = 7;
        ana.credit_balance = Money::from_pesos(5_000);
        let mut snapshot = snapshot_with(ana);

        // Barba Gratis (6 stamps) plus $5.000 credit
        let order =
            open_order(&mut snapshot, draft(&[FULL_HAIR_CUT, BEARD], Some(5)), now).unwrap();
        let receipt = settle_order(&mut snapshot, &order.id, now).unwrap();

        // 7 - 6 + 2
        assert_eq!(receipt.stamps_balance, 3);
        assert_eq!(receipt.credit_balance, Money::zero());
        assert_eq!(receipt.order.total_paid.pesos(), 30_000);

        let reasons: Vec<_> = receipt.ledger_entries.iter().map(|e| e.reason).collect();
        assert_eq!(
            reasons,
            vec![
                LedgerReason::RewardApplied,
                LedgerReason::CreditApplied,
                LedgerReason::Earn
            ]
        );
        assert_eq!(receipt.ledger_entries[0].delta_stamps, -6);
        assert_eq!(receipt.ledger_entries[1].delta_credit.pesos(), -5_000);
    }

    #[test]
    fn test_balance_spent_elsewhere_fails_settlement() {
        let now = Utc::now();
        let mut ana = customer("3001234567");
        ana.stamps_balance = 6;
        let mut snapshot = snapshot_with(ana);

        let order = open_order(&mut snapshot, draft(&[FULL_HAIR_CUT], Some(5)), now).unwrap();
        // Stamps redeemed for something else while the order was pending
        snapshot.customers[0].stamps_balance = 2;
        let before = snapshot.clone();

        assert!(matches!(
            settle_order(&mut snapshot, &order.id, now),
            Err(CoreError::InsufficientStamps {
                available: 2,
                required: 6
            })
        ));
        assert_eq!(snapshot, before);
    }

    #[test]
    fn test_credit_spent_elsewhere_fails_settlement() {
        let now = Utc::now();
        let mut ana = customer("3001234567");
        ana.credit_balance = Money::from_pesos(20_000);
        let mut snapshot = snapshot_with(ana);

        let order = open_order(&mut snapshot, draft(&[BEARD], None), now).unwrap();
        assert_eq!(order.total_due, Money::zero());
        snapshot.customers[0].credit_balance = Money::from_pesos(1_000);

        assert!(matches!(
            settle_order(&mut snapshot, &order.id, now),
            Err(CoreError::InsufficientCredit { .. })
        ));
        assert_eq!(snapshot.order(&order.id).unwrap().status, OrderStatus::Pending);
    }

    #[test]
    fn test_reward_unlocked_triggers_notification() {
        let now = Utc::now();
        let mut ana = customer("3001234567");
        ana.stamps_balance = 5;
        let mut snapshot = snapshot_with(ana);

        let order = open_order(&mut snapshot, draft(&[FULL_HAIR_CUT], None), now).unwrap();
        let receipt = settle_order(&mut snapshot, &order.id, now).unwrap();

        assert_eq!(receipt.unlocked_reward.as_ref().unwrap().id, 5);
        assert_eq!(
            snapshot.notifications[0].kind,
            NotificationKind::RewardUnlocked
        );
        let last = receipt.messages.last().unwrap();
        assert_eq!(last.delay_secs, REWARD_UNLOCKED_DELAY_SECS);
        assert!(matches!(
            &last.message,
            OutboundMessage::RewardUnlocked { reward_name } if reward_name == "Barba Gratis"
        ));
    }

    #[test]
    fn test_voucher_consumed_without_second_deduction() {
        let now = Utc::now();
        let mut ana = customer("3001234567");
        ana.stamps_balance = 6;
        let mut snapshot = snapshot_with(ana);

        redeem_reward(&mut snapshot, "3001234567", 5, now).unwrap();
        assert_eq!(snapshot.customers[0].stamps_balance, 0);

        let order = open_order(&mut snapshot, draft(&[CLEAN_CUT, BEARD], Some(5)), now).unwrap();
        assert_eq!(order.discount.pesos(), 15_000);
        let receipt = settle_order(&mut snapshot, &order.id, now).unwrap();

        assert_eq!(receipt.ledger_entries[0].reason, LedgerReason::RewardApplied);
        assert_eq!(receipt.ledger_entries[0].delta_stamps, 0);
        assert_eq!(receipt.stamps_balance, 2);
        assert!(snapshot.customers[0].reward_vouchers.is_empty());
    }

    #[test]
    fn test_one_voucher_pays_for_one_order_only() {
        let now = Utc::now();
        let mut ana = customer("3001234567");
        ana.stamps_balance = 12;
        let mut snapshot = snapshot_with(ana);

        redeem_reward(&mut snapshot, "3001234567", 5, now).unwrap();
        assert_eq!(snapshot.customers[0].stamps_balance, 6);

        // Both open against the same voucher
        let first = open_order(&mut snapshot, draft(&[CLEAN_CUT, BEARD], Some(5)), now).unwrap();
        let second = open_order(&mut snapshot, draft(&[CLEAN_CUT, BEARD], Some(5)), now).unwrap();
        assert_eq!(first.reward_source, Some(RewardSource::Voucher));
        assert_eq!(second.reward_source, Some(RewardSource::Voucher));

        let receipt = settle_order(&mut snapshot, &first.id, now).unwrap();
        assert_eq!(receipt.ledger_entries[0].delta_stamps, 0);
        assert_eq!(receipt.stamps_balance, 8);

        // No voucher left, and the stamps are not touched instead
        let before = snapshot.clone();
        assert!(matches!(
            settle_order(&mut snapshot, &second.id, now),
            Err(CoreError::RewardNotEligible { reward_id: 5, .. })
        ));
        assert_eq!(snapshot, before);
        assert_eq!(snapshot.customers[0].stamps_balance, 8);
        assert_eq!(snapshot.order(&second.id).unwrap().status, OrderStatus::Pending);
    }

    #[test]
    fn test_ledger_reconciles_after_mixed_activity() {
        let now = Utc::now();
        let mut snapshot = snapshot_with(customer("3001234567"));

        for _ in 0..4 {
            let order =
                open_order(&mut snapshot, draft(&[FULL_HAIR_CUT, BEARD], None), now).unwrap();
            settle_order(&mut snapshot, &order.id, now).unwrap();
        }
        // 8 stamps earned, all spent on a $15.000 credit voucher
        redeem_reward(&mut snapshot, "3001234567", 1, now).unwrap();
        let order = open_order(&mut snapshot, draft(&[CLEAN_CUT], Some(1)), now).unwrap();
        let receipt = settle_order(&mut snapshot, &order.id, now).unwrap();
        assert_eq!(receipt.order.total_paid.pesos(), 10_000);

        let ana = snapshot.customer("3001234567").unwrap();
        assert_eq!(ana.stamps_balance, 1);
        let report = reconcile(ana, &snapshot.ledger);
        assert!(report.is_balanced());
        assert_eq!(report.ledger_stamps, 1);
    }
}
