//! # Redemption
//!
//! Spending stamps on a reward outside of checkout. The stamps leave the
//! balance now; the benefit is a voucher the customer applies at a later
//! checkout, where it costs nothing further.
//!
//! ```text
//! stamps 12 ── redeem "Barba Gratis" (6) ──► stamps 6, vouchers [5]
//!                                             ledger: redeem -6
//! later checkout with reward 5 ─────────────► vouchers [], ledger: reward_applied 0
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::ledger::apply_stamp_delta;
use crate::rewards::check_reward_affordable;
use crate::snapshot::Snapshot;
use crate::types::{Customer, LedgerEntry, Notification, NotificationKind, Reward};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Redemption {
    pub customer: Customer,
    pub reward: Reward,
    pub entry: LedgerEntry,
}

/// Redeems `reward_id` for `phone`, deducting its stamp cost.
///
/// ## Errors
/// - `CustomerNotFound`, `RewardNotFound`
/// - `RewardNotEligible` (inactive, or tier gate not met)
/// - `InsufficientStamps`
pub fn redeem_reward(
    snapshot: &mut Snapshot,
    phone: &str,
    reward_id: u32,
    now: DateTime<Utc>,
) -> CoreResult<Redemption> {
    let customer = snapshot
        .customer(phone)
        .ok_or_else(|| CoreError::CustomerNotFound(phone.to_string()))?;
    let reward = snapshot.catalog().reward_by_id(reward_id)?.clone();

    check_reward_affordable(snapshot, customer, &reward, now)?;
    let stamps = apply_stamp_delta(customer.stamps_balance, -i64::from(reward.stamp_cost))?;
    let name = customer.name.clone();

    let entry = LedgerEntry::redeem(phone, reward.id, reward.stamp_cost, now);
    snapshot.ledger.push(entry.clone());

    let customer = match snapshot.customer_mut(phone) {
        Some(c) => {
            c.stamps_balance = stamps;
            c.reward_vouchers.push(reward.id);
            c.clone()
        }
        None => return Err(CoreError::CustomerNotFound(phone.to_string())),
    };

    snapshot.push_notification(
        Notification::new(
            NotificationKind::RewardRedeemed,
            "Recompensa canjeada",
            format!("{} canjeo {}", name, reward.name),
            now,
        )
        .for_customer(phone),
    );

    Ok(Redemption {
        customer,
        reward,
        entry,
    })
}
