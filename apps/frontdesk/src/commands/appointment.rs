//! # Appointment Commands
//!
//! Booking from reception or the customer portal, plus the reminder sweep.

use barberia_core::booking::{self, BookingRequest};
use barberia_core::messaging::due_reminders;
use barberia_core::permissions::{Module, Role};
use barberia_core::{Appointment, AppointmentSource, CoreResult, Snapshot};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::messaging::Dispatcher;
use crate::state::{ReminderLog, SessionState};

/// Portal bookings (`CLIENT`) are self-service; every other source needs
/// the appointments module.
fn authorize_booking(snapshot: &Snapshot, role: Role, source: AppointmentSource) -> CoreResult<()> {
    if source == AppointmentSource::Client {
        return Ok(());
    }
    snapshot
        .settings
        .permissions
        .require(role, Module::Appointments, "book appointments")
}

pub async fn book_appointment(
    session: &SessionState,
    role: Role,
    request: BookingRequest,
) -> Result<Appointment, ApiError> {
    debug!("book_appointment command");

    let appointment = session
        .transact(|s| {
            authorize_booking(s, role, request.source)?;
            booking::book_appointment(s, request, Utc::now())
        })
        .await?;

    info!(
        appointment_id = %appointment.id,
        barber_id = appointment.barber_id,
        scheduled_at = %appointment.scheduled_at,
        "Appointment booked"
    );
    Ok(appointment)
}

pub async fn reschedule_appointment(
    session: &SessionState,
    role: Role,
    appointment_id: String,
    scheduled_at: DateTime<Utc>,
    barber_id: Option<u32>,
) -> Result<Appointment, ApiError> {
    debug!(appointment_id = %appointment_id, "reschedule_appointment command");

    let appointment = session
        .transact(|s| {
            s.settings
                .permissions
                .require(role, Module::Appointments, "reschedule appointments")?;
            booking::reschedule_appointment(s, &appointment_id, scheduled_at, barber_id, Utc::now())
        })
        .await?;

    info!(
        appointment_id = %appointment_id,
        scheduled_at = %appointment.scheduled_at,
        "Appointment rescheduled"
    );
    Ok(appointment)
}

pub async fn cancel_appointment(
    session: &SessionState,
    role: Role,
    appointment_id: String,
) -> Result<Appointment, ApiError> {
    debug!(appointment_id = %appointment_id, "cancel_appointment command");

    let appointment = session
        .transact(|s| {
            s.settings
                .permissions
                .require(role, Module::Appointments, "cancel appointments")?;
            booking::cancel_appointment(s, &appointment_id)
        })
        .await?;

    info!(appointment_id = %appointment_id, "Appointment cancelled");
    Ok(appointment)
}

/// Inbound "confirmo" reply from a customer's phone.
pub async fn confirm_reply(session: &SessionState, phone: String) -> Result<usize, ApiError> {
    debug!("confirm_reply command");

    let confirmed = session
        .transact(|s| booking::confirm_reply(s, &phone))
        .await?;

    info!(confirmed, "Confirmation reply processed");
    Ok(confirmed)
}

/// Active appointments of one day, earliest first.
pub async fn list_appointments(
    session: &SessionState,
    role: Role,
    day: NaiveDate,
) -> Result<Vec<Appointment>, ApiError> {
    debug!(day = %day, "list_appointments command");

    session
        .read(|s| -> Result<_, ApiError> {
            s.settings
                .permissions
                .require(role, Module::Appointments, "view appointments")?;
            Ok(booking::appointments_on(s, day).into_iter().cloned().collect())
        })
        .await
}

/// Sends the 24 h and 2 h reminders due at `now` that were not sent yet.
///
/// Returns how many reminders were handed to the dispatcher.
pub async fn send_due_reminders(
    session: &SessionState,
    dispatcher: &Dispatcher,
    log: &ReminderLog,
    now: DateTime<Utc>,
) -> usize {
    let due = session.read(|s| due_reminders(s, now)).await;
    let fresh = log.claim(due, now).await;
    let count = fresh.len();

    if count > 0 {
        info!(count, "Sending appointment reminders");
        dispatcher.dispatch_all(session, fresh).await;
    }
    count
}
