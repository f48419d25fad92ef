//! # Messaging Decisions
//!
//! What to send, over which channel, and whether it may be sent at all.
//! Actual delivery is the app's job; this module only decides and renders.
//!
//! ## Delivery Decision
//! ```text
//! privacy_consent? ──no──► Blocked(NoConsent)         → PRIVACY_BLOCK
//!       │yes
//! customer opt_in? ──no──► Blocked(CustomerOptedOut)  → PRIVACY_BLOCK
//!       │yes
//! whatsapp_enabled ──yes─► Send(WhatsApp)             → MESSAGE_SENT
//!       │no
//! sms_enabled ─────yes───► Send(Sms)                  → MESSAGE_SENT
//!       │no
//!       └────────────────► Blocked(ChannelsDisabled)  → MESSAGE_BLOCKED
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::rewards::RewardProgress;
use crate::snapshot::{MessageTemplates, Settings, Snapshot};
use crate::types::{AppointmentStatus, Notification, NotificationKind};

// =============================================================================
// Delivery
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    WhatsApp,
    Sms,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Channel::WhatsApp => "WHATSAPP",
            Channel::Sms => "SMS",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockReason {
    /// Shop has no consent to contact customers
    NoConsent,
    CustomerOptedOut,
    /// Both WhatsApp and SMS are switched off
    ChannelsDisabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Send(Channel),
    Blocked(BlockReason),
}

/// Picks the channel for a message to a customer, or why none applies.
pub fn decide_delivery(settings: &Settings, opt_in: bool) -> Delivery {
    if !settings.privacy_consent {
        return Delivery::Blocked(BlockReason::NoConsent);
    }
    if !opt_in {
        return Delivery::Blocked(BlockReason::CustomerOptedOut);
    }
    if settings.whatsapp_enabled {
        Delivery::Send(Channel::WhatsApp)
    } else if settings.sms_enabled {
        Delivery::Send(Channel::Sms)
    } else {
        Delivery::Blocked(BlockReason::ChannelsDisabled)
    }
}

/// Activity-feed entry recording the outcome of a delivery decision.
pub fn delivery_notification(phone: &str, delivery: Delivery, now: DateTime<Utc>) -> Notification {
    let (kind, title, message) = match delivery {
        Delivery::Send(channel) => (
            NotificationKind::MessageSent,
            format!("{} enviado", channel),
            format!("Mensaje enviado a {}", phone),
        ),
        Delivery::Blocked(BlockReason::NoConsent) => (
            NotificationKind::PrivacyBlock,
            "Consentimiento requerido".to_string(),
            format!(
                "No se envio mensaje a {} porque no hay consentimiento de comunicacion",
                phone
            ),
        ),
        Delivery::Blocked(BlockReason::CustomerOptedOut) => (
            NotificationKind::PrivacyBlock,
            "Cliente sin autorizacion".to_string(),
            format!("No se envio mensaje a {} porque el cliente no acepta mensajes", phone),
        ),
        Delivery::Blocked(BlockReason::ChannelsDisabled) => (
            NotificationKind::MessageBlocked,
            "Notificaciones desactivadas".to_string(),
            format!(
                "No se envio mensaje a {} porque WhatsApp y SMS estan desactivados",
                phone
            ),
        ),
    };
    Notification::new(kind, title, message, now).for_customer(phone)
}

// =============================================================================
// Messages
// =============================================================================

/// A customer-facing message with the values its template needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundMessage {
    Receipt {
        services: Vec<String>,
        total: Money,
        stamps_earned: u32,
        stamps_balance: u32,
        next_reward: Option<RewardProgress>,
    },
    TipRequest {
        barber_name: String,
    },
    RewardUnlocked {
        reward_name: String,
    },
    Reminder24h {
        time: String,
        barber_name: String,
    },
    Reminder2h {
        time: String,
        barber_name: String,
    },
    FreshCut,
    Winback {
        days: i64,
    },
}

impl OutboundMessage {
    /// Fills the matching template.
    pub fn render(&self, templates: &MessageTemplates) -> String {
        match self {
            OutboundMessage::Receipt {
                services,
                total,
                stamps_earned,
                stamps_balance,
                next_reward,
            } => {
                let next = next_reward.as_ref().map_or_else(
                    || "Ninguna".to_string(),
                    |p| format!("{} ({} sellos mas)", p.name, p.stamps_needed),
                );
                fill(
                    &templates.receipt,
                    &[
                        ("services", bullet_list(services)),
                        ("total", total.to_string()),
                        ("stamps", stamps_earned.to_string()),
                        ("total_stamps", stamps_balance.to_string()),
                        ("next_reward", next),
                    ],
                )
            }
            OutboundMessage::TipRequest { barber_name } => {
                fill(&templates.tip, &[("barber_name", barber_name.clone())])
            }
            OutboundMessage::RewardUnlocked { reward_name } => fill(
                &templates.reward_unlocked,
                &[("reward_name", reward_name.clone())],
            ),
            OutboundMessage::Reminder24h { time, barber_name } => fill(
                &templates.reminder_24h,
                &[("time", time.clone()), ("barber_name", barber_name.clone())],
            ),
            OutboundMessage::Reminder2h { time, barber_name } => fill(
                &templates.reminder_2h,
                &[("time", time.clone()), ("barber_name", barber_name.clone())],
            ),
            OutboundMessage::FreshCut => templates.fresh_cut.clone(),
            OutboundMessage::Winback { days } => {
                fill(&templates.winback, &[("days", days.to_string())])
            }
        }
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("• {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn fill(template: &str, values: &[(&str, String)]) -> String {
    values.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{}}}", key), value)
    })
}

/// A message to send, possibly after a delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MessageIntent {
    pub phone: String,
    pub message: OutboundMessage,
    pub delay_secs: u64,
}

impl MessageIntent {
    pub fn now(phone: impl Into<String>, message: OutboundMessage) -> Self {
        Self::after(phone, message, 0)
    }

    pub fn after(phone: impl Into<String>, message: OutboundMessage, delay_secs: u64) -> Self {
        Self {
            phone: phone.into(),
            message,
            delay_secs,
        }
    }
}

// =============================================================================
// Appointment Reminders
// =============================================================================

/// Reminders due for upcoming appointments.
///
/// Scheduled or confirmed appointments starting in 23–25 hours get the 24h
/// reminder; those starting in 90–150 minutes get the 2h one. Times render
/// as `HH:MM` UTC.
pub fn due_reminders(snapshot: &Snapshot, now: DateTime<Utc>) -> Vec<MessageIntent> {
    snapshot
        .appointments
        .iter()
        .filter(|a| {
            matches!(
                a.status,
                AppointmentStatus::Scheduled | AppointmentStatus::Confirmed
            )
        })
        .filter_map(|a| {
            let until = a.scheduled_at - now;
            let time = a.scheduled_at.format("%H:%M").to_string();
            let barber_name = snapshot
                .barbers
                .iter()
                .find(|b| b.id == a.barber_id)
                .map_or_else(|| "tu barbero".to_string(), |b| b.name.clone());

            let message = if until > Duration::hours(23) && until < Duration::hours(25) {
                OutboundMessage::Reminder24h { time, barber_name }
            } else if until > Duration::minutes(90) && until < Duration::minutes(150) {
                OutboundMessage::Reminder2h { time, barber_name }
            } else {
                return None;
            };
            Some(MessageIntent::now(a.customer_phone.clone(), message))
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
