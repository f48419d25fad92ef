//! # Reward Eligibility
//!
//! Which rewards a customer may use right now, and which one they are
//! working towards.
//!
//! ```text
//!  stamps: 7, tier: SILVER
//!
//!  id  cost  gate   eligible?       next?
//!  5   6     -      ✓
//!  1   8     -                      ◄── cheapest cost > 7
//!  2   10    -
//!  6   12    GOLD
//! ```
//!
//! Tier gates are checked against a freshly derived tier, never the cached
//! value on the customer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::snapshot::Snapshot;
use crate::tier::tier_of;
use crate::types::{Customer, Reward, Tier};

pub use crate::types::RewardSource;

/// Active rewards affordable with `stamps` whose tier gate admits `tier`.
pub fn eligible_rewards<'a>(catalog: Catalog<'a>, stamps: u32, tier: Tier) -> Vec<&'a Reward> {
    catalog
        .active_rewards()
        .filter(|r| r.stamp_cost <= stamps && r.allows_tier(tier))
        .collect()
}

/// [`eligible_rewards`] for a stored customer, with the tier derived as of
/// `as_of`.
pub fn eligible_for_customer<'a>(
    snapshot: &'a Snapshot,
    customer: &Customer,
    as_of: DateTime<Utc>,
) -> Vec<&'a Reward> {
    let tier = tier_of(&snapshot.orders, &customer.phone, as_of);
    eligible_rewards(snapshot.catalog(), customer.stamps_balance, tier)
}

/// Cheapest active reward still out of reach.
///
/// Ties on cost keep catalog order. `None` when every reward is already
/// affordable or none are configured.
///
/// ## Example
/// ```rust
/// use barberia_core::{rewards::next_reward, Snapshot};
///
/// let snapshot = Snapshot::seeded();
/// let next = next_reward(snapshot.catalog(), 7).unwrap();
/// assert_eq!(next.stamp_cost, 8);
/// assert!(next_reward(snapshot.catalog(), 18).is_none());
/// ```
pub fn next_reward(catalog: Catalog<'_>, stamps: u32) -> Option<&Reward> {
    catalog
        .active_rewards()
        .filter(|r| r.stamp_cost > stamps)
        .min_by_key(|r| r.stamp_cost)
}

/// The reward a settlement just unlocked, if any.
///
/// Fires when the balance before earning had a next reward and the balance
/// after earning reaches its cost.
pub fn unlocked_reward(catalog: Catalog<'_>, before: u32, after: u32) -> Option<&Reward> {
    next_reward(catalog, before).filter(|r| after >= r.stamp_cost)
}

/// Checks that `customer` can buy `reward` with stamps right now: active,
/// affordable, and admitted by the tier gate.
pub fn check_reward_affordable(
    snapshot: &Snapshot,
    customer: &Customer,
    reward: &Reward,
    as_of: DateTime<Utc>,
) -> CoreResult<()> {
    if !reward.active {
        return Err(CoreError::RewardNotEligible {
            reward_id: reward.id,
            reason: "reward is inactive".to_string(),
        });
    }

    if customer.stamps_balance < reward.stamp_cost {
        return Err(CoreError::InsufficientStamps {
            available: customer.stamps_balance,
            required: reward.stamp_cost,
        });
    }

    let tier = tier_of(&snapshot.orders, &customer.phone, as_of);
    if !reward.allows_tier(tier) {
        let gate = reward.tier_restriction.unwrap_or_default();
        return Err(CoreError::RewardNotEligible {
            reward_id: reward.id,
            reason: format!("requires {} tier, customer is {}", gate, tier),
        });
    }

    Ok(())
}

/// Checks that `customer` may apply `reward_id` to an order now.
///
/// A held voucher always qualifies (it was paid for at redemption).
/// Otherwise see [`check_reward_affordable`].
pub fn check_reward_usable(
    snapshot: &Snapshot,
    customer: &Customer,
    reward_id: u32,
    as_of: DateTime<Utc>,
) -> CoreResult<RewardSource> {
    let reward = snapshot.catalog().reward_by_id(reward_id)?;

    if customer.holds_voucher(reward_id) {
        return Ok(RewardSource::Voucher);
    }

    check_reward_affordable(snapshot, customer, reward, as_of)?;
    Ok(RewardSource::Stamps)
}

// =============================================================================
// Progress
// =============================================================================

/// How far a balance is from the next reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RewardProgress {
    pub reward_id: u32,
    pub name: String,
    pub stamp_cost: u32,
    pub stamps_needed: u32,
}

/// Progress towards [`next_reward`] from `stamps`.
pub fn progress(catalog: Catalog<'_>, stamps: u32) -> Option<RewardProgress> {
    next_reward(catalog, stamps).map(|r| RewardProgress {
        reward_id: r.id,
        name: r.name.clone(),
        stamp_cost: r.stamp_cost,
        stamps_needed: r.stamp_cost - stamps,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
