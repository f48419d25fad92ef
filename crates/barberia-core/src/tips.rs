//! Gratuities for the barber of a paid order. Tips are money for the barber,
//! not loyalty value, so they never touch the ledger.

use chrono::{DateTime, Utc};

use crate::checkout::new_reference;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::snapshot::Snapshot;
use crate::types::{OrderStatus, Tip, TipStatus};
use crate::validation::validate_positive_amount;

/// Records a tip against a PAID order.
pub fn record_tip(
    snapshot: &mut Snapshot,
    order_id: &str,
    amount: Money,
    now: DateTime<Utc>,
) -> CoreResult<Tip> {
    validate_positive_amount("tip amount", amount)?;
    let order = snapshot
        .order(order_id)
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
    if order.status != OrderStatus::Paid {
        return Err(CoreError::InvalidOrderStatus {
            order_id: order_id.to_string(),
            current_status: order.status.to_string(),
        });
    }

    let tip = Tip {
        id: uuid::Uuid::new_v4().to_string(),
        order_id: order.id.clone(),
        barber_id: order.barber_id,
        chair_id: order.chair_id,
        customer_phone: order.customer_phone.clone(),
        amount,
        payment_ref: new_reference("TIP"),
        paid_at: now,
        status: TipStatus::Paid,
    };
    snapshot.tips.push(tip.clone());
    Ok(tip)
}

/// Sum of tips for one barber.
pub fn tips_for_barber(snapshot: &Snapshot, barber_id: u32) -> Money {
    snapshot
        .tips
        .iter()
        .filter(|t| t.barber_id == barber_id)
        .map(|t| t.amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{customer, paid_order, snapshot_with};

    #[test]
    fn test_tip_on_paid_order() {
        let now = Utc::now();
        let mut snapshot = snapshot_with(customer("3001234567"));
        let order = paid_order("3001234567", now);
        let order_id = order.id.clone();
        snapshot.orders.push(order);

        let tip = record_tip(&mut snapshot, &order_id, Money::from_pesos(10_000), now).unwrap();
        assert_eq!(tip.barber_id, 1);
        assert!(tip.payment_ref.starts_with("TIP-"));
        assert_eq!(tips_for_barber(&snapshot, 1).pesos(), 10_000);
        assert!(snapshot.ledger.is_empty());
    }

    #[test]
    fn test_tip_rejections() {
        let now = Utc::now();
        let mut snapshot = snapshot_with(customer("3001234567"));
        let mut pending = paid_order("3001234567", now);
        pending.status = OrderStatus::Pending;
        let pending_id = pending.id.clone();
        snapshot.orders.push(pending);

        assert!(matches!(
            record_tip(&mut snapshot, &pending_id, Money::from_pesos(5_000), now),
            Err(CoreError::InvalidOrderStatus { .. })
        ));
        assert!(record_tip(&mut snapshot, &pending_id, Money::zero(), now).is_err());
        assert!(matches!(
            record_tip(&mut snapshot, "nope", Money::from_pesos(5_000), now),
            Err(CoreError::OrderNotFound(_))
        ));
        assert!(snapshot.tips.is_empty());
    }
}
