//! # Checkout
//!
//! Opens PENDING orders with locked-in amounts. No balance moves here;
//! stamps and credit are only touched when the payment is confirmed (see
//! [`crate::settlement`]).
//!
//! ## Flows
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ Walk-in                                                              │
//! │   phone + name ─► customer (found/created)                           │
//! │                 ─► WALKIN appointment (PENDING, now, barber's chair) │
//! │                 ─► PENDING order ──────────────┐                     │
//! │                                                │                     │
//! │ Booked appointment                             │                     │
//! │   checkout_appointment ─► reuse PENDING order  │                     │
//! │                           or open a new one ───┤                     │
//! │                                                ▼                     │
//! │                             payment link (payment_ref / payment_url) │
//! │                                                │ "pago confirmado"   │
//! │                                                ▼                     │
//! │                                         settle_order (PAID)          │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each operation plans the complete change against the current snapshot
//! first and only writes once every check has passed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::customers::{resolve_customer, store_customer};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{price_order, OrderQuote};
use crate::rewards::check_reward_usable;
use crate::snapshot::Snapshot;
use crate::types::{
    Appointment, AppointmentSource, AppointmentStatus, Customer, Order, OrderStatus,
    PaymentStatus, RewardSource,
};
use crate::validation::{validate_phone, validate_services_selected};

// =============================================================================
// Requests
// =============================================================================

/// Everything needed to open an order for a known customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDraft {
    pub customer_phone: String,
    pub barber_id: u32,
    pub services: Vec<String>,
    pub reward_id: Option<u32>,
    pub appointment_id: Option<String>,
}

/// Front desk walk-in form.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WalkInRequest {
    pub phone: String,
    /// Required for first-time customers
    pub name: Option<String>,
    pub barber_id: u32,
    pub services: Vec<String>,
    pub reward_id: Option<u32>,
    pub notes: Option<String>,
}

/// What a walk-in created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WalkIn {
    pub customer: Customer,
    pub customer_created: bool,
    pub appointment: Appointment,
    pub order: Order,
}

// =============================================================================
// Planning
// =============================================================================

/// Opaque reference shown next to the payment QR.
pub(crate) fn new_reference(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, id[..8].to_uppercase())
}

/// Builds the PENDING order for `customer` without touching the snapshot.
///
/// `customer` may be one that is about to be inserted (walk-in).
fn plan_order(
    snapshot: &Snapshot,
    customer: &Customer,
    barber_id: u32,
    services: &[String],
    reward_id: Option<u32>,
    appointment_id: Option<&str>,
    now: DateTime<Utc>,
) -> CoreResult<Order> {
    validate_services_selected(services)?;
    let barber = snapshot
        .barber(barber_id)
        .ok_or(CoreError::BarberNotFound(barber_id))?;

    let (reward, reward_source) = match reward_id {
        Some(id) => {
            let source = check_reward_usable(snapshot, customer, id, now)?;
            (Some(snapshot.catalog().reward_by_id(id)?), Some(source))
        }
        None => (None, None),
    };

    let OrderQuote {
        subtotal,
        discount,
        credit_applied,
        total,
    } = price_order(snapshot.catalog(), services, reward, customer.credit_balance)?;

    Ok(Order {
        id: uuid::Uuid::new_v4().to_string(),
        customer_phone: customer.phone.clone(),
        customer_name: customer.name.clone(),
        barber_id: barber.id,
        chair_id: barber.chair_id,
        appointment_id: appointment_id.map(str::to_string),
        services: services.to_vec(),
        subtotal,
        discount,
        credit_applied,
        reward_used: reward_id,
        reward_source,
        total_due: total,
        total_paid: Money::zero(),
        status: OrderStatus::Pending,
        payment_ref: new_reference("ORD"),
        payment_url: None,
        created_at: now,
        paid_at: None,
    })
}

/// Checks the appointment exists, is still open, and has no live order.
fn check_appointment_billable(snapshot: &Snapshot, appointment_id: &str) -> CoreResult<()> {
    let appointment = snapshot
        .appointment(appointment_id)
        .ok_or_else(|| CoreError::AppointmentNotFound(appointment_id.to_string()))?;
    if !appointment.status.is_open() {
        return Err(CoreError::InvalidAppointmentStatus {
            appointment_id: appointment_id.to_string(),
            current_status: appointment.status.to_string(),
        });
    }
    if let Some(existing) = snapshot.order_for_appointment(appointment_id) {
        return Err(CoreError::AppointmentAlreadyBilled {
            appointment_id: appointment_id.to_string(),
            order_id: existing.id.clone(),
        });
    }
    Ok(())
}

fn existing_customer(snapshot: &Snapshot, raw_phone: &str) -> CoreResult<Customer> {
    let phone = validate_phone(raw_phone)?;
    snapshot
        .customer(&phone)
        .cloned()
        .ok_or(CoreError::CustomerNotFound(phone))
}

// =============================================================================
// Operations
// =============================================================================

/// Prices a draft without storing anything (checkout preview).
pub fn quote_order(
    snapshot: &Snapshot,
    draft: &OrderDraft,
    now: DateTime<Utc>,
) -> CoreResult<OrderQuote> {
    let customer = existing_customer(snapshot, &draft.customer_phone)?;
    let order = plan_order(
        snapshot,
        &customer,
        draft.barber_id,
        &draft.services,
        draft.reward_id,
        draft.appointment_id.as_deref(),
        now,
    )?;
    Ok(OrderQuote {
        subtotal: order.subtotal,
        discount: order.discount,
        credit_applied: order.credit_applied,
        total: order.total_due,
    })
}

/// Stores a PENDING order for an existing customer.
///
/// ## Errors
/// - `CustomerNotFound`, `BarberNotFound`, `ServiceNotFound`
/// - `RewardNotFound` / `RewardNotEligible` / `InsufficientStamps`
/// - `AppointmentAlreadyBilled` if the appointment has a live order
pub fn open_order(
    snapshot: &mut Snapshot,
    draft: OrderDraft,
    now: DateTime<Utc>,
) -> CoreResult<Order> {
    let customer = existing_customer(snapshot, &draft.customer_phone)?;
    if let Some(appointment_id) = draft.appointment_id.as_deref() {
        check_appointment_billable(snapshot, appointment_id)?;
    }

    let order = plan_order(
        snapshot,
        &customer,
        draft.barber_id,
        &draft.services,
        draft.reward_id,
        draft.appointment_id.as_deref(),
        now,
    )?;
    snapshot.orders.push(order.clone());
    Ok(order)
}

/// Registers a walk-in: customer, WALKIN appointment and its order, all or
/// nothing.
pub fn start_walk_in(
    snapshot: &mut Snapshot,
    request: WalkInRequest,
    now: DateTime<Utc>,
) -> CoreResult<WalkIn> {
    let resolved = resolve_customer(snapshot, &request.phone, request.name.as_deref(), now)?;
    let customer = resolved.customer.clone();
    let barber = snapshot
        .barber(request.barber_id)
        .ok_or(CoreError::BarberNotFound(request.barber_id))?;

    let appointment = Appointment {
        id: uuid::Uuid::new_v4().to_string(),
        customer_phone: customer.phone.clone(),
        customer_name: customer.name.clone(),
        barber_id: barber.id,
        chair_id: barber.chair_id,
        scheduled_at: now,
        services: request.services.clone(),
        status: AppointmentStatus::Pending,
        payment_status: PaymentStatus::Pending,
        source: AppointmentSource::Walkin,
        notes: request
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        created_at: now,
    };

    let order = plan_order(
        snapshot,
        &customer,
        request.barber_id,
        &request.services,
        request.reward_id,
        Some(&appointment.id),
        now,
    )?;

    let customer_created = resolved.is_new;
    store_customer(snapshot, resolved);
    snapshot.appointments.push(appointment.clone());
    snapshot.orders.push(order.clone());

    Ok(WalkIn {
        customer,
        customer_created,
        appointment,
        order,
    })
}

/// Returns the order to pay for an appointment.
///
/// A PENDING order already linked to the appointment is reused when it
/// carries the same reward; asking for a different reward replaces it.
/// Otherwise a new order is opened from the appointment's services.
pub fn checkout_appointment(
    snapshot: &mut Snapshot,
    appointment_id: &str,
    reward_id: Option<u32>,
    now: DateTime<Utc>,
) -> CoreResult<Order> {
    let appointment = snapshot
        .appointment(appointment_id)
        .cloned()
        .ok_or_else(|| CoreError::AppointmentNotFound(appointment_id.to_string()))?;
    if !appointment.status.is_open() {
        return Err(CoreError::InvalidAppointmentStatus {
            appointment_id: appointment.id,
            current_status: appointment.status.to_string(),
        });
    }

    let existing = snapshot.order_for_appointment(appointment_id).cloned();
    let replaced = match existing {
        Some(order) if order.status != OrderStatus::Pending => {
            return Err(CoreError::AppointmentAlreadyBilled {
                appointment_id: appointment.id,
                order_id: order.id,
            });
        }
        Some(order) if reward_id.is_none() || reward_id == order.reward_used => {
            return Ok(order);
        }
        Some(order) => Some(order.id),
        None => None,
    };

    let customer = existing_customer(snapshot, &appointment.customer_phone)?;
    let order = plan_order(
        snapshot,
        &customer,
        appointment.barber_id,
        &appointment.services,
        reward_id,
        Some(&appointment.id),
        now,
    )?;

    if let Some(old_id) = replaced {
        if let Some(old) = snapshot.order_mut(&old_id) {
            old.status = OrderStatus::Cancelled;
        }
    }
    snapshot.orders.push(order.clone());
    Ok(order)
}

/// Attaches the payment link returned by the payment provider.
pub fn attach_payment_url(snapshot: &mut Snapshot, order_id: &str, url: String) -> CoreResult<()> {
    let order = snapshot
        .order_mut(order_id)
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
    if order.status != OrderStatus::Pending {
        return Err(CoreError::InvalidOrderStatus {
            order_id: order_id.to_string(),
            current_status: order.status.to_string(),
        });
    }
    order.payment_url = Some(url);
    Ok(())
}

fn transition_order(snapshot: &mut Snapshot, order_id: &str, to: OrderStatus) -> CoreResult<Order> {
    let order = snapshot
        .order_mut(order_id)
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
    if !order.status.can_transition_to(to) {
        return Err(CoreError::InvalidOrderStatus {
            order_id: order_id.to_string(),
            current_status: order.status.to_string(),
        });
    }
    order.status = to;
    Ok(order.clone())
}

/// Abandons a PENDING order. Nothing was deducted, so nothing is returned.
pub fn cancel_order(snapshot: &mut Snapshot, order_id: &str) -> CoreResult<Order> {
    transition_order(snapshot, order_id, OrderStatus::Cancelled)
}

/// Records a payment the provider reported as failed.
pub fn mark_payment_failed(snapshot: &mut Snapshot, order_id: &str) -> CoreResult<Order> {
    transition_order(snapshot, order_id, OrderStatus::Failed)
}

// =============================================================================
// Unit Tests
// =============================================================================
