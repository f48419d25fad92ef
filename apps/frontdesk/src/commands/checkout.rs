//! # Checkout Commands
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  start_walk_in / open_order / checkout_appointment                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PENDING order ── total_due == 0 ──► settled in the same transaction    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  payment_url attached (when a checkout page is configured)              │
//! │       │                                                                 │
//! │       │  cashier taps "pago confirmado"                                 │
//! │       ▼                                                                 │
//! │  confirm_payment ──► settle_order ──► receipt + messages                │
//! │                                        │                                │
//! │                                        ├─ receipt          (now)        │
//! │                                        ├─ tip request      (+2 s)       │
//! │                                        └─ reward unlocked  (+4 s)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use barberia_core::checkout::{self, OrderDraft, WalkIn, WalkInRequest};
use barberia_core::permissions::{Module, Role};
use barberia_core::pricing::OrderQuote;
use barberia_core::settlement::{settle_order, SettlementReceipt};
use barberia_core::tips;
use barberia_core::{CoreError, CoreResult, Money, Order, Snapshot, Tip};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::messaging::Dispatcher;
use crate::payment::PaymentLinks;
use crate::state::SessionState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order: Order,
    /// Present when the order was settled on the spot
    pub receipt: Option<SettlementReceipt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkInResponse {
    pub walk_in: WalkIn,
    pub receipt: Option<SettlementReceipt>,
}

/// Settles a free order right away, otherwise attaches its payment link.
fn finish_opening(
    snapshot: &mut Snapshot,
    payments: &dyn PaymentLinks,
    order: Order,
    now: DateTime<Utc>,
) -> CoreResult<CheckoutResponse> {
    if order.total_due.is_zero() {
        let receipt = settle_order(snapshot, &order.id, now)?;
        return Ok(CheckoutResponse {
            order: receipt.order.clone(),
            receipt: Some(receipt),
        });
    }

    if let Some(url) = payments.link_for(&order) {
        checkout::attach_payment_url(snapshot, &order.id, url)?;
    }
    let order = snapshot
        .order(&order.id)
        .cloned()
        .ok_or_else(|| CoreError::OrderNotFound(order.id.clone()))?;
    Ok(CheckoutResponse {
        order,
        receipt: None,
    })
}

async fn send_receipt_messages(
    session: &SessionState,
    dispatcher: &Dispatcher,
    receipt: Option<&SettlementReceipt>,
) {
    if let Some(receipt) = receipt {
        dispatcher
            .dispatch_all(session, receipt.messages.clone())
            .await;
    }
}

/// Prices a prospective order without storing anything.
pub async fn quote_order(
    session: &SessionState,
    role: Role,
    draft: OrderDraft,
) -> Result<OrderQuote, ApiError> {
    debug!("quote_order command");

    session
        .read(|s| -> Result<_, ApiError> {
            s.settings
                .permissions
                .require(role, Module::Walkin, "quote orders")?;
            Ok(checkout::quote_order(s, &draft, Utc::now())?)
        })
        .await
}

pub async fn open_order(
    session: &SessionState,
    dispatcher: &Dispatcher,
    payments: &dyn PaymentLinks,
    role: Role,
    draft: OrderDraft,
) -> Result<CheckoutResponse, ApiError> {
    debug!("open_order command");

    let response = session
        .transact(|s| {
            s.settings
                .permissions
                .require(role, Module::Walkin, "open orders")?;
            let now = Utc::now();
            let order = checkout::open_order(s, draft, now)?;
            finish_opening(s, payments, order, now)
        })
        .await?;

    info!(
        order_id = %response.order.id,
        total = %response.order.total_due,
        settled = response.receipt.is_some(),
        "Order opened"
    );
    send_receipt_messages(session, dispatcher, response.receipt.as_ref()).await;
    Ok(response)
}

/// Registers an unscheduled visit: customer, WALKIN appointment and order.
pub async fn start_walk_in(
    session: &SessionState,
    dispatcher: &Dispatcher,
    payments: &dyn PaymentLinks,
    role: Role,
    request: WalkInRequest,
) -> Result<WalkInResponse, ApiError> {
    debug!("start_walk_in command");

    let response = session
        .transact(|s| {
            s.settings
                .permissions
                .require(role, Module::Walkin, "register walk-ins")?;
            let now = Utc::now();
            let mut walk_in = checkout::start_walk_in(s, request, now)?;
            let opened = finish_opening(s, payments, walk_in.order.clone(), now)?;
            walk_in.order = opened.order;
            if let Some(appointment) = s.appointment(&walk_in.appointment.id) {
                walk_in.appointment = appointment.clone();
            }
            Ok::<_, CoreError>(WalkInResponse {
                walk_in,
                receipt: opened.receipt,
            })
        })
        .await?;

    info!(
        order_id = %response.walk_in.order.id,
        appointment_id = %response.walk_in.appointment.id,
        new_customer = response.walk_in.customer_created,
        "Walk-in started"
    );
    send_receipt_messages(session, dispatcher, response.receipt.as_ref()).await;
    Ok(response)
}

/// Bills a booked appointment, reusing its PENDING order when one exists.
pub async fn checkout_appointment(
    session: &SessionState,
    dispatcher: &Dispatcher,
    payments: &dyn PaymentLinks,
    role: Role,
    appointment_id: String,
    reward_id: Option<u32>,
) -> Result<CheckoutResponse, ApiError> {
    debug!(appointment_id = %appointment_id, "checkout_appointment command");

    let response = session
        .transact(|s| {
            s.settings
                .permissions
                .require(role, Module::Appointments, "bill appointments")?;
            let now = Utc::now();
            let order = checkout::checkout_appointment(s, &appointment_id, reward_id, now)?;
            finish_opening(s, payments, order, now)
        })
        .await?;

    info!(
        order_id = %response.order.id,
        appointment_id = %appointment_id,
        "Appointment checkout opened"
    );
    send_receipt_messages(session, dispatcher, response.receipt.as_ref()).await;
    Ok(response)
}

/// Cashier confirmation that the customer paid. Settles the order and
/// sends the receipt, tip request and reward messages.
pub async fn confirm_payment(
    session: &SessionState,
    dispatcher: &Dispatcher,
    role: Role,
    order_id: String,
) -> Result<SettlementReceipt, ApiError> {
    debug!(order_id = %order_id, "confirm_payment command");

    let receipt = session
        .transact(|s| {
            s.settings
                .permissions
                .require(role, Module::Walkin, "confirm payments")?;
            settle_order(s, &order_id, Utc::now())
        })
        .await?;

    info!(
        order_id = %order_id,
        total_paid = %receipt.order.total_paid,
        stamps_earned = receipt.stamps_earned,
        stamps_balance = receipt.stamps_balance,
        tier = ?receipt.tier,
        "Payment confirmed"
    );
    if let Some(reward) = &receipt.unlocked_reward {
        info!(order_id = %order_id, reward = %reward.name, "Reward unlocked");
    }

    dispatcher
        .dispatch_all(session, receipt.messages.clone())
        .await;
    Ok(receipt)
}

pub async fn cancel_order(
    session: &SessionState,
    role: Role,
    order_id: String,
) -> Result<Order, ApiError> {
    debug!(order_id = %order_id, "cancel_order command");

    let order = session
        .transact(|s| {
            s.settings
                .permissions
                .require(role, Module::Walkin, "cancel orders")?;
            checkout::cancel_order(s, &order_id)
        })
        .await?;

    info!(order_id = %order_id, "Order cancelled");
    Ok(order)
}

/// The payment provider reported a failed charge.
pub async fn report_payment_failed(
    session: &SessionState,
    role: Role,
    order_id: String,
) -> Result<Order, ApiError> {
    debug!(order_id = %order_id, "report_payment_failed command");

    let order = session
        .transact(|s| {
            s.settings
                .permissions
                .require(role, Module::Walkin, "update payments")?;
            checkout::mark_payment_failed(s, &order_id)
        })
        .await?;

    warn!(order_id = %order_id, "Payment failed");
    Ok(order)
}

pub async fn record_tip(
    session: &SessionState,
    role: Role,
    order_id: String,
    amount_pesos: i64,
) -> Result<Tip, ApiError> {
    debug!(order_id = %order_id, "record_tip command");

    let tip = session
        .transact(|s| {
            s.settings
                .permissions
                .require(role, Module::Walkin, "record tips")?;
            tips::record_tip(s, &order_id, Money::from_pesos(amount_pesos), Utc::now())
        })
        .await?;

    info!(order_id = %order_id, barber_id = tip.barber_id, amount = %tip.amount, "Tip recorded");
    Ok(tip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{dispatcher, session};
    use crate::error::ErrorCode;
    use crate::payment::{CheckoutLinks, NoPaymentLinks};
    use barberia_core::{AppointmentStatus, LedgerReason, OrderStatus, BEARD, FULL_HAIR_CUT};

    fn walk_in_request(phone: &str) -> WalkInRequest {
        WalkInRequest {
            phone: phone.into(),
            name: Some("Ana".into()),
            barber_id: 1,
            services: vec![FULL_HAIR_CUT.into(), BEARD.into()],
            reward_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_walk_in_then_confirm_payment() {
        let session = session().await;
        let (dispatcher, messenger) = dispatcher();
        let links = CheckoutLinks::parse("https://pay.example.com/checkout").unwrap();

        let started = start_walk_in(
            &session,
            &dispatcher,
            &links,
            Role::Reception,
            walk_in_request("3001234567"),
        )
        .await
        .unwrap();

        let order = &started.walk_in.order;
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_due.pesos(), 50_000);
        let url = order.payment_url.as_deref().unwrap();
        assert!(url.contains(&order.payment_ref));
        assert!(started.receipt.is_none());
        assert!(messenger.sent.lock().await.is_empty());

        let receipt = confirm_payment(&session, &dispatcher, Role::Reception, order.id.clone())
            .await
            .unwrap();
        assert_eq!(receipt.order.status, OrderStatus::Paid);
        assert_eq!(receipt.order.total_paid.pesos(), 50_000);

        let appointment = session
            .read(|s| s.appointment(&started.walk_in.appointment.id).cloned())
            .await
            .unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Completed);

        // Receipt and tip request went out
        assert!(messenger.sent.lock().await.len() >= 2);

        // Settling twice is rejected
        let err = confirm_payment(&session, &dispatcher, Role::Reception, order.id.clone())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_free_order_settles_immediately() {
        let session = session().await;
        let (dispatcher, messenger) = dispatcher();
        session
            .transact(|s| {
                let mut ana = barberia_core::Customer::new("3001234567", "Ana", Utc::now());
                ana.credit_balance = Money::from_pesos(100_000);
                s.customers.push(ana);
                Ok::<_, CoreError>(())
            })
            .await
            .unwrap();

        let response = open_order(
            &session,
            &dispatcher,
            &NoPaymentLinks,
            Role::Owner,
            OrderDraft {
                customer_phone: "3001234567".into(),
                barber_id: 1,
                services: vec![FULL_HAIR_CUT.into()],
                reward_id: None,
                appointment_id: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(response.order.status, OrderStatus::Paid);
        let receipt = response.receipt.unwrap();
        assert_eq!(receipt.credit_balance.pesos(), 65_000);
        assert!(receipt
            .ledger_entries
            .iter()
            .any(|e| e.reason == LedgerReason::CreditApplied));
        assert!(!messenger.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_service_is_not_found() {
        let session = session().await;
        let (dispatcher, _) = dispatcher();
        let mut request = walk_in_request("3001234567");
        request.services = vec!["PERM".into()];

        let err = start_walk_in(&session, &dispatcher, &NoPaymentLinks, Role::Owner, request)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        // All-or-nothing: no customer, appointment or order left behind
        let counts = session
            .read(|s| (s.customers.len(), s.appointments.len(), s.orders.len()))
            .await;
        assert_eq!(counts, (0, 0, 0));
    }

    #[tokio::test]
    async fn test_cancel_tip_and_failure() {
        let session = session().await;
        let (dispatcher, _) = dispatcher();

        let first = start_walk_in(
            &session,
            &dispatcher,
            &NoPaymentLinks,
            Role::Owner,
            walk_in_request("3001234567"),
        )
        .await
        .unwrap();
        let order_id = first.walk_in.order.id.clone();

        // No tip on an unpaid order
        let err = record_tip(&session, Role::Barber, order_id.clone(), 5_000)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let failed = report_payment_failed(&session, Role::Owner, order_id.clone())
            .await
            .unwrap();
        assert_eq!(failed.status, OrderStatus::Failed);

        let second = start_walk_in(
            &session,
            &dispatcher,
            &NoPaymentLinks,
            Role::Owner,
            walk_in_request("3119998888"),
        )
        .await
        .unwrap();
        let cancelled = cancel_order(&session, Role::Owner, second.walk_in.order.id.clone())
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let third = start_walk_in(
            &session,
            &dispatcher,
            &NoPaymentLinks,
            Role::Owner,
            walk_in_request("3205556666"),
        )
        .await
        .unwrap();
        confirm_payment(&session, &dispatcher, Role::Owner, third.walk_in.order.id.clone())
            .await
            .unwrap();
        let tip = record_tip(&session, Role::Barber, third.walk_in.order.id.clone(), 5_000)
            .await
            .unwrap();
        assert_eq!(tip.amount.pesos(), 5_000);
    }

    #[tokio::test]
    async fn test_quote_matches_opened_order() {
        let session = session().await;
        let (dispatcher, _) = dispatcher();
        start_walk_in(
            &session,
            &dispatcher,
            &NoPaymentLinks,
            Role::Owner,
            walk_in_request("3001234567"),
        )
        .await
        .unwrap();

        let draft = OrderDraft {
            customer_phone: "3001234567".into(),
            barber_id: 2,
            services: vec![BEARD.into()],
            reward_id: None,
            appointment_id: None,
        };
        let quote = quote_order(&session, Role::Owner, draft.clone()).await.unwrap();
        let opened = open_order(&session, &dispatcher, &NoPaymentLinks, Role::Owner, draft)
            .await
            .unwrap();
        assert_eq!(quote.total, opened.order.total_due);
        assert_eq!(quote.total.pesos(), 15_000);
    }
}
