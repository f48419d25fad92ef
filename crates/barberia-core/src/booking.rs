//! # Booking
//!
//! Appointment scheduling for the front desk and the customer portal.
//!
//! ## Appointment Lifecycle
//! ```text
//!  book ──► SCHEDULED ──reply "SI"──► CONFIRMED ──┐
//!               │  ▲                      │       │ settle_order
//!    reschedule └──┘                      │       ▼
//!               │                         │   COMPLETED
//!               └────── cancel ───────────┴──► CANCELLED
//!
//!  walk-in ──► PENDING ─────────────────────────► COMPLETED
//! ```
//!
//! ## Conflict Rule
//! One barber cannot hold two active appointments whose start times are
//! less than [`BOOKING_CONFLICT_WINDOW_MINS`] apart. Walk-ins are seated
//! immediately and skip the check.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::customers::{resolve_customer, store_customer};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::snapshot::Snapshot;
use crate::types::{
    Appointment, AppointmentSource, AppointmentStatus, OrderStatus, PaymentStatus,
};
use crate::validation::{validate_phone, validate_services_selected};
use crate::{BOOKING_CONFLICT_WINDOW_MINS, PAST_BOOKING_TOLERANCE_SECS};

/// Booking form from reception or the customer portal.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookingRequest {
    pub phone: String,
    pub name: Option<String>,
    pub barber_id: u32,
    #[ts(as = "String")]
    pub scheduled_at: DateTime<Utc>,
    pub services: Vec<String>,
    pub notes: Option<String>,
    pub source: AppointmentSource,
}

/// First active appointment of `barber_id` too close to `at`.
pub fn find_conflict<'a>(
    snapshot: &'a Snapshot,
    barber_id: u32,
    at: DateTime<Utc>,
    exclude_id: Option<&str>,
) -> Option<&'a Appointment> {
    let window = Duration::minutes(BOOKING_CONFLICT_WINDOW_MINS);
    snapshot.appointments.iter().find(|a| {
        a.barber_id == barber_id
            && a.status.is_active()
            && Some(a.id.as_str()) != exclude_id
            && (a.scheduled_at - at).abs() < window
    })
}

fn check_slot(
    snapshot: &Snapshot,
    barber_id: u32,
    at: DateTime<Utc>,
    exclude_id: Option<&str>,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    if at < now - Duration::seconds(PAST_BOOKING_TOLERANCE_SECS) {
        return Err(ValidationError::InPast {
            field: "scheduled_at".to_string(),
        }
        .into());
    }
    if find_conflict(snapshot, barber_id, at, exclude_id).is_some() {
        return Err(CoreError::BookingConflict {
            barber_id,
            scheduled_at: at.to_rfc3339(),
        });
    }
    Ok(())
}

fn open_appointment<'a>(snapshot: &'a Snapshot, id: &str) -> CoreResult<&'a Appointment> {
    let appointment = snapshot
        .appointment(id)
        .ok_or_else(|| CoreError::AppointmentNotFound(id.to_string()))?;
    if !appointment.status.is_open() {
        return Err(CoreError::InvalidAppointmentStatus {
            appointment_id: id.to_string(),
            current_status: appointment.status.to_string(),
        });
    }
    Ok(appointment)
}

// =============================================================================
// Operations
// =============================================================================

/// Books a SCHEDULED appointment, creating the customer if new.
pub fn book_appointment(
    snapshot: &mut Snapshot,
    request: BookingRequest,
    now: DateTime<Utc>,
) -> CoreResult<Appointment> {
    let resolved = resolve_customer(snapshot, &request.phone, request.name.as_deref(), now)?;
    validate_services_selected(&request.services)?;
    for code in &request.services {
        snapshot.catalog().service(code)?;
    }
    let barber = snapshot
        .barber(request.barber_id)
        .ok_or(CoreError::BarberNotFound(request.barber_id))?;
    check_slot(snapshot, barber.id, request.scheduled_at, None, now)?;

    let appointment = Appointment {
        id: uuid::Uuid::new_v4().to_string(),
        customer_phone: resolved.customer.phone.clone(),
        customer_name: resolved.customer.name.clone(),
        barber_id: barber.id,
        chair_id: barber.chair_id,
        scheduled_at: request.scheduled_at,
        services: request.services,
        status: AppointmentStatus::Scheduled,
        payment_status: PaymentStatus::Pending,
        source: request.source,
        notes: request
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        created_at: now,
    };

    store_customer(snapshot, resolved);
    snapshot.appointments.push(appointment.clone());
    Ok(appointment)
}

/// Moves an open appointment, optionally to another barber. It goes back
/// to SCHEDULED and needs a fresh confirmation.
pub fn reschedule_appointment(
    snapshot: &mut Snapshot,
    appointment_id: &str,
    scheduled_at: DateTime<Utc>,
    barber_id: Option<u32>,
    now: DateTime<Utc>,
) -> CoreResult<Appointment> {
    let current = open_appointment(snapshot, appointment_id)?;
    let barber_id = barber_id.unwrap_or(current.barber_id);
    let barber = snapshot
        .barber(barber_id)
        .ok_or(CoreError::BarberNotFound(barber_id))?;
    let chair_id = barber.chair_id;
    check_slot(snapshot, barber_id, scheduled_at, Some(appointment_id), now)?;

    let appointment = snapshot
        .appointment_mut(appointment_id)
        .ok_or_else(|| CoreError::AppointmentNotFound(appointment_id.to_string()))?;
    appointment.scheduled_at = scheduled_at;
    appointment.barber_id = barber_id;
    appointment.chair_id = chair_id;
    appointment.status = AppointmentStatus::Scheduled;
    Ok(appointment.clone())
}

/// Cancels an open appointment and any unpaid order opened for it.
pub fn cancel_appointment(snapshot: &mut Snapshot, appointment_id: &str) -> CoreResult<Appointment> {
    open_appointment(snapshot, appointment_id)?;

    for order in snapshot.orders.iter_mut().filter(|o| {
        o.appointment_id.as_deref() == Some(appointment_id) && o.status == OrderStatus::Pending
    }) {
        order.status = OrderStatus::Cancelled;
    }

    let appointment = snapshot
        .appointment_mut(appointment_id)
        .ok_or_else(|| CoreError::AppointmentNotFound(appointment_id.to_string()))?;
    appointment.status = AppointmentStatus::Cancelled;
    appointment.payment_status = PaymentStatus::Cancelled;
    Ok(appointment.clone())
}

/// Confirms the customer's PENDING/SCHEDULED appointments after they reply
/// to a reminder. Returns how many were confirmed.
pub fn confirm_reply(snapshot: &mut Snapshot, raw_phone: &str) -> CoreResult<usize> {
    let phone = validate_phone(raw_phone)?;
    let mut confirmed = 0;
    for a in snapshot.appointments.iter_mut().filter(|a| {
        a.customer_phone == phone
            && matches!(
                a.status,
                AppointmentStatus::Pending | AppointmentStatus::Scheduled
            )
    }) {
        a.status = AppointmentStatus::Confirmed;
        confirmed += 1;
    }
    Ok(confirmed)
}

/// Active appointments of one day, earliest first.
pub fn appointments_on(snapshot: &Snapshot, day: chrono::NaiveDate) -> Vec<&Appointment> {
    let mut list: Vec<_> = snapshot
        .appointments
        .iter()
        .filter(|a| a.status.is_active() && a.scheduled_at.date_naive() == day)
        .collect();
    list.sort_by_key(|a| a.scheduled_at);
    list
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{checkout_appointment, start_walk_in, WalkInRequest};
    use crate::{BEARD, FULL_HAIR_CUT};

    fn request(barber_id: u32, at: DateTime<Utc>) -> BookingRequest {
        BookingRequest {
            phone: "3001234567".into(),
            name: Some("Ana".into()),
            barber_id,
            scheduled_at: at,
            services: vec![FULL_HAIR_CUT.to_string()],
            notes: Some("  ".into()),
            source: AppointmentSource::Reception,
        }
    }

    #[test]
    fn test_book_creates_customer_and_scheduled_appointment() {
        let now = Utc::now();
        let mut snapshot = Snapshot::seeded();
        let appt = book_appointment(&mut snapshot, request(1, now + Duration::hours(3)), now)
            .unwrap();

        assert_eq!(appt.status, AppointmentStatus::Scheduled);
        assert_eq!(appt.payment_status, PaymentStatus::Pending);
        assert!(appt.notes.is_none());
        assert!(snapshot.customer("3001234567").is_some());
    }

    #[test]
    fn test_conflict_within_thirty_minutes() {
        let now = Utc::now();
        let at = now + Duration::hours(3);
        let mut snapshot = Snapshot::seeded();
        book_appointment(&mut snapshot, request(1, at), now).unwrap();

        let clash = book_appointment(&mut snapshot, request(1, at + Duration::minutes(29)), now);
        assert!(matches!(clash, Err(CoreError::BookingConflict { barber_id: 1, .. })));

        // Exactly 30 minutes apart is fine, as is another barber
        book_appointment(&mut snapshot, request(1, at + Duration::minutes(30)), now).unwrap();
        book_appointment(&mut snapshot, request(2, at), now).unwrap();
        assert_eq!(snapshot.appointments.len(), 3);
    }

    #[test]
    fn test_cancelled_slot_is_free_again() {
        let now = Utc::now();
        let at = now + Duration::hours(3);
        let mut snapshot = Snapshot::seeded();
        let first = book_appointment(&mut snapshot, request(1, at), now).unwrap();
        cancel_appointment(&mut snapshot, &first.id).unwrap();

        book_appointment(&mut snapshot, request(1, at), now).unwrap();
        assert!(cancel_appointment(&mut snapshot, &first.id).is_err());
    }

    #[test]
    fn test_book_rejects_past_and_unknowns() {
        let now = Utc::now();
        let mut snapshot = Snapshot::seeded();

        assert!(matches!(
            book_appointment(&mut snapshot, request(1, now - Duration::hours(1)), now),
            Err(CoreError::Validation(ValidationError::InPast { .. }))
        ));
        // Within the tolerance
        book_appointment(&mut snapshot, request(1, now - Duration::seconds(30)), now).unwrap();

        assert!(matches!(
            book_appointment(&mut snapshot, request(8, now + Duration::hours(1)), now),
            Err(CoreError::BarberNotFound(8))
        ));
        let mut bad = request(2, now + Duration::hours(1));
        bad.services = vec!["PERM".into()];
        assert!(matches!(
            book_appointment(&mut snapshot, bad, now),
            Err(CoreError::ServiceNotFound(_))
        ));
    }

    #[test]
    fn test_reschedule_excludes_itself_and_resets_status() {
        let now = Utc::now();
        let at = now + Duration::hours(3);
        let mut snapshot = Snapshot::seeded();
        let appt = book_appointment(&mut snapshot, request(1, at), now).unwrap();
        confirm_reply(&mut snapshot, "300-123-4567").unwrap();

        let moved = reschedule_appointment(
            &mut snapshot,
            &appt.id,
            at + Duration::minutes(10),
            None,
            now,
        )
        .unwrap();
        assert_eq!(moved.status, AppointmentStatus::Scheduled);

        let other = book_appointment(&mut snapshot, request(2, at), now).unwrap();
        assert!(matches!(
            reschedule_appointment(&mut snapshot, &other.id, at, Some(1), now),
            Err(CoreError::BookingConflict { .. })
        ));
        let moved = reschedule_appointment(&mut snapshot, &other.id, at, Some(3), now).unwrap();
        assert_eq!(moved.chair_id, 3);
    }

    #[test]
    fn test_cancel_cancels_pending_order() {
        let now = Utc::now();
        let mut snapshot = Snapshot::seeded();
        let appt = book_appointment(&mut snapshot, request(1, now + Duration::hours(1)), now)
            .unwrap();
        let order = checkout_appointment(&mut snapshot, &appt.id, None, now).unwrap();

        let cancelled = cancel_appointment(&mut snapshot, &appt.id).unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(cancelled.payment_status, PaymentStatus::Cancelled);
        assert_eq!(
            snapshot.order(&order.id).unwrap().status,
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn test_completed_appointment_cannot_be_cancelled() {
        let now = Utc::now();
        let mut snapshot = Snapshot::seeded();
        let walk_in = start_walk_in(
            &mut snapshot,
            WalkInRequest {
                phone: "3001234567".into(),
                name: Some("Ana".into()),
                barber_id: 1,
                services: vec![FULL_HAIR_CUT.to_string(), BEARD.to_string()],
                reward_id: None,
                notes: None,
            },
            now,
        )
        .unwrap();
        crate::settlement::settle_order(&mut snapshot, &walk_in.order.id, now).unwrap();

        assert!(matches!(
            cancel_appointment(&mut snapshot, &walk_in.appointment.id),
            Err(CoreError::InvalidAppointmentStatus { .. })
        ));
    }

    #[test]
    fn test_confirm_reply() {
        let now = Utc::now();
        let mut snapshot = Snapshot::seeded();
        book_appointment(&mut snapshot, request(1, now + Duration::hours(2)), now).unwrap();
        book_appointment(&mut snapshot, request(2, now + Duration::hours(26)), now).unwrap();

        assert_eq!(confirm_reply(&mut snapshot, "3001234567").unwrap(), 2);
        assert_eq!(confirm_reply(&mut snapshot, "3001234567").unwrap(), 0);
        assert!(snapshot
            .appointments
            .iter()
            .all(|a| a.status == AppointmentStatus::Confirmed));
    }

    #[test]
    fn test_appointments_on_day_sorted() {
        let now = Utc::now();
        let day = (now + Duration::days(2)).date_naive();
        let start = day.and_hms_opt(10, 0, 0).unwrap().and_utc();
        let mut snapshot = Snapshot::seeded();
        book_appointment(&mut snapshot, request(1, start + Duration::hours(4)), now).unwrap();
        book_appointment(&mut snapshot, request(2, start), now).unwrap();

        let list = appointments_on(&snapshot, day);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].barber_id, 2);
    }
}
