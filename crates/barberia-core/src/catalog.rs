//! # Catalog
//!
//! Price list and reward table lookups, plus the few admin edits the owner
//! may make to them.
//!
//! Unknown or inactive service codes are an error here, never a silent
//! zero price. A checkout that references one is rejected before anything
//! is stored.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::snapshot::Snapshot;
use crate::types::{Reward, RewardBenefit, Service};
use crate::validation::{validate_positive_amount, validate_price, validate_stamp_cost};

// =============================================================================
// Read-only View
// =============================================================================

/// Borrowed view over the snapshot's services and rewards.
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'a> {
    services: &'a [Service],
    rewards: &'a [Reward],
}

impl<'a> Catalog<'a> {
    pub fn new(services: &'a [Service], rewards: &'a [Reward]) -> Self {
        Self { services, rewards }
    }

    /// Active service by code.
    pub fn service(&self, code: &str) -> CoreResult<&'a Service> {
        self.services
            .iter()
            .find(|s| s.code == code && s.active)
            .ok_or_else(|| CoreError::ServiceNotFound(code.to_string()))
    }

    /// Price of an active service.
    ///
    /// ## Example
    /// ```rust
    /// use barberia_core::{Money, Snapshot};
    ///
    /// let snapshot = Snapshot::seeded();
    /// let catalog = snapshot.catalog();
    /// assert_eq!(catalog.price_of("BEARD").unwrap(), Money::from_pesos(15_000));
    /// assert!(catalog.price_of("PERM").is_err());
    /// ```
    pub fn price_of(&self, code: &str) -> CoreResult<Money> {
        self.service(code).map(|s| s.price)
    }

    /// Sum of prices; fails on the first unknown code, or with
    /// `OutOfRange` if the sum does not fit.
    pub fn subtotal(&self, codes: &[String]) -> CoreResult<Money> {
        codes.iter().try_fold(Money::zero(), |acc, code| {
            let price = self.price_of(code)?;
            acc.checked_add(price).filter(|sum| !sum.is_negative()).ok_or_else(|| {
                CoreError::Validation(ValidationError::OutOfRange {
                    field: "subtotal".to_string(),
                    min: 0,
                    max: i64::MAX,
                })
            })
        })
    }

    /// Listed price regardless of the active flag. Used to value a free
    /// service reward.
    pub fn listed_price(&self, code: &str) -> Option<Money> {
        self.services.iter().find(|s| s.code == code).map(|s| s.price)
    }

    /// Reward by id, active or not.
    pub fn reward_by_id(&self, id: u32) -> CoreResult<&'a Reward> {
        self.rewards
            .iter()
            .find(|r| r.id == id)
            .ok_or(CoreError::RewardNotFound(id))
    }

    /// Active rewards in catalog order.
    pub fn active_rewards(&self) -> impl Iterator<Item = &'a Reward> + 'a {
        let rewards: &'a [Reward] = self.rewards;
        rewards.iter().filter(|r| r.active)
    }

    /// Display names for receipts. Unknown codes fall back to the code.
    pub fn service_names(&self, codes: &[String]) -> Vec<String> {
        codes
            .iter()
            .map(|code| {
                self.services
                    .iter()
                    .find(|s| &s.code == code)
                    .map_or_else(|| code.clone(), |s| s.name.clone())
            })
            .collect()
    }
}

// =============================================================================
// Admin Edits
// =============================================================================

/// Changes the price of a listed service (active or not).
pub fn set_service_price(snapshot: &mut Snapshot, code: &str, price: Money) -> CoreResult<()> {
    validate_price(price)?;
    let service = snapshot
        .services
        .iter_mut()
        .find(|s| s.code == code)
        .ok_or_else(|| CoreError::ServiceNotFound(code.to_string()))?;
    service.price = price;
    Ok(())
}

/// Shows or hides a service at checkout.
pub fn set_service_active(snapshot: &mut Snapshot, code: &str, active: bool) -> CoreResult<()> {
    let service = snapshot
        .services
        .iter_mut()
        .find(|s| s.code == code)
        .ok_or_else(|| CoreError::ServiceNotFound(code.to_string()))?;
    service.active = active;
    Ok(())
}

/// Inserts a new reward or replaces the one with the same id.
///
/// ## Rules
/// - `stamp_cost` > 0
/// - CREDIT rewards carry a positive value
/// - SERVICE rewards point at a listed service
pub fn upsert_reward(snapshot: &mut Snapshot, reward: Reward) -> CoreResult<()> {
    validate_stamp_cost(reward.stamp_cost)?;
    match &reward.benefit {
        RewardBenefit::Credit { value } => validate_positive_amount("reward value", *value)?,
        RewardBenefit::Service { service_code } => {
            if snapshot.catalog().listed_price(service_code).is_none() {
                return Err(CoreError::ServiceNotFound(service_code.clone()));
            }
        }
    }

    match snapshot.rewards.iter_mut().find(|r| r.id == reward.id) {
        Some(existing) => *existing = reward,
        None => snapshot.rewards.push(reward),
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tier;
    use crate::{BEARD, EYEBROWS, FULL_HAIR_CUT};

    #[test]
    fn test_price_of_known_and_unknown() {
        let snapshot = Snapshot::seeded();
        let catalog = snapshot.catalog();
        assert_eq!(catalog.price_of(FULL_HAIR_CUT).unwrap().pesos(), 35_000);
        assert!(matches!(
            catalog.price_of("KERATINA"),
            Err(CoreError::ServiceNotFound(code)) if code == "KERATINA"
        ));
    }

    #[test]
    fn test_subtotal_fails_on_first_unknown() {
        let snapshot = Snapshot::seeded();
        let catalog = snapshot.catalog();
        let ok = vec![FULL_HAIR_CUT.to_string(), BEARD.to_string()];
        assert_eq!(catalog.subtotal(&ok).unwrap().pesos(), 50_000);

        let bad = vec![FULL_HAIR_CUT.to_string(), "TINTE".to_string()];
        assert!(catalog.subtotal(&bad).is_err());
    }

    #[test]
    fn test_oversized_prices_never_overflow() {
        let mut snapshot = Snapshot::seeded();
        assert!(matches!(
            set_service_price(&mut snapshot, BEARD, Money::from_pesos(i64::MAX)),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert_eq!(snapshot.catalog().price_of(BEARD).unwrap().pesos(), 15_000);

        // A price that bypassed validation, e.g. from a pulled snapshot
        if let Some(beard) = snapshot.services.iter_mut().find(|s| s.code == BEARD) {
            beard.price = Money::from_pesos(i64::MAX);
        }
        let both = vec![FULL_HAIR_CUT.to_string(), BEARD.to_string()];
        assert!(matches!(
            snapshot.catalog().subtotal(&both),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_inactive_service_is_not_sellable() {
        let mut snapshot = Snapshot::seeded();
        set_service_active(&mut snapshot, EYEBROWS, false).unwrap();
        assert!(snapshot.catalog().price_of(EYEBROWS).is_err());
        assert_eq!(
            snapshot.catalog().listed_price(EYEBROWS),
            Some(Money::from_pesos(8_000))
        );
    }

    #[test]
    fn test_set_service_price() {
        let mut snapshot = Snapshot::seeded();
        set_service_price(&mut snapshot, BEARD, Money::from_pesos(18_000)).unwrap();
        assert_eq!(snapshot.catalog().price_of(BEARD).unwrap().pesos(), 18_000);
        assert!(set_service_price(&mut snapshot, BEARD, Money::from_pesos(-1)).is_err());
        assert!(set_service_price(&mut snapshot, "NOPE", Money::zero()).is_err());
    }

    #[test]
    fn test_reward_lookup_and_upsert() {
        let mut snapshot = Snapshot::seeded();
        assert_eq!(snapshot.catalog().reward_by_id(5).unwrap().name, "Barba Gratis");
        assert!(matches!(
            snapshot.catalog().reward_by_id(42),
            Err(CoreError::RewardNotFound(42))
        ));

        let eyebrows = Reward {
            id: 7,
            name: "Cejas Gratis".into(),
            benefit: RewardBenefit::Service {
                service_code: EYEBROWS.into(),
            },
            stamp_cost: 4,
            tier_restriction: Some(Tier::Silver),
            active: true,
        };
        upsert_reward(&mut snapshot, eyebrows.clone()).unwrap();
        assert_eq!(snapshot.rewards.len(), 7);

        let zero_cost = Reward {
            stamp_cost: 0,
            ..eyebrows.clone()
        };
        assert!(upsert_reward(&mut snapshot, zero_cost).is_err());

        let unknown_service = Reward {
            benefit: RewardBenefit::Service {
                service_code: "MASAJE".into(),
            },
            ..eyebrows
        };
        assert!(upsert_reward(&mut snapshot, unknown_service).is_err());
    }

    #[test]
    fn test_service_names_for_receipt() {
        let snapshot = Snapshot::seeded();
        let names = snapshot
            .catalog()
            .service_names(&[FULL_HAIR_CUT.to_string(), "OLD_CODE".to_string()]);
        assert_eq!(names, vec!["Corte completo".to_string(), "OLD_CODE".to_string()]);
    }
}
