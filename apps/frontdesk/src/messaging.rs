//! # Message Dispatch
//!
//! Turns the core's `MessageIntent`s into sends through a `Messenger`.
//!
//! ```text
//! MessageIntent { phone, message, delay_secs }
//!      │
//!      ├── delay > 0 ──► tokio::spawn(sleep, then deliver)
//!      │
//!      ▼
//! decide_delivery(settings, customer.opt_in)
//!      │
//!      ├── Blocked(reason) ──► PRIVACY_BLOCK / MESSAGE_BLOCKED notification
//!      │
//!      ▼ Send(channel)
//! Messenger::send(phone, rendered text, channel)
//!      │
//!      ├── Ok  ──► MESSAGE_SENT notification
//!      └── Err ──► MESSAGE_BLOCKED notification, warn! log
//! ```
//!
//! Consent is checked at delivery time, not when the intent was created, so
//! a customer who opts out during the delay is not messaged.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use barberia_core::messaging::{
    decide_delivery, delivery_notification, BlockReason, Channel, Delivery, MessageIntent,
};
use barberia_core::{Notification, NotificationKind};
use chrono::Utc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::state::SessionState;

// =============================================================================
// Messenger
// =============================================================================

/// Failure reported by a messaging provider.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("Provider rejected message: {0}")]
    Rejected(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// Outbound WhatsApp/SMS provider.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, phone: &str, text: &str, channel: Channel) -> Result<(), SendError>;
}

/// Writes messages to the log instead of a provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMessenger;

#[async_trait]
impl Messenger for LogMessenger {
    async fn send(&self, phone: &str, text: &str, channel: Channel) -> Result<(), SendError> {
        info!(
            phone = %mask_phone(phone),
            channel = %channel,
            chars = text.chars().count(),
            "Message sent"
        );
        Ok(())
    }
}

/// `3001234567` → `******4567`
pub fn mask_phone(phone: &str) -> String {
    let count = phone.chars().count();
    phone
        .chars()
        .enumerate()
        .map(|(i, c)| if i + 4 < count { '*' } else { c })
        .collect()
}

// =============================================================================
// Dispatcher
// =============================================================================

/// What happened to one intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent(Channel),
    Blocked(BlockReason),
    /// The provider refused or was unreachable
    Failed,
    /// Customer no longer exists
    Skipped,
}

/// Sends intents through a shared `Messenger`. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    messenger: Arc<dyn Messenger>,
    /// Wall time per intent delay second; zero delivers everything inline
    delay_unit: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("delay_unit", &self.delay_unit)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Dispatcher {
            messenger,
            delay_unit: Duration::from_secs(1),
        }
    }

    /// Dispatcher backed by `LogMessenger`.
    pub fn logging() -> Self {
        Self::new(Arc::new(LogMessenger))
    }

    /// Ignores intent delays.
    pub fn without_delays(mut self) -> Self {
        self.delay_unit = Duration::ZERO;
        self
    }

    /// Delivers immediate intents now and schedules delayed ones.
    ///
    /// Returns handles for the scheduled sends; callers may drop them.
    pub async fn dispatch_all(
        &self,
        session: &SessionState,
        intents: Vec<MessageIntent>,
    ) -> Vec<JoinHandle<DeliveryOutcome>> {
        let mut scheduled = Vec::new();
        for intent in intents {
            let delay = self.delay_unit * intent.delay_secs as u32;
            if delay.is_zero() {
                self.deliver(session, &intent).await;
            } else {
                debug!(delay_secs = intent.delay_secs, "Scheduling message");
                let dispatcher = self.clone();
                let session = session.clone();
                scheduled.push(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    dispatcher.deliver(&session, &intent).await
                }));
            }
        }
        scheduled
    }

    /// Decides, sends and records one intent.
    pub async fn deliver(&self, session: &SessionState, intent: &MessageIntent) -> DeliveryOutcome {
        let decided = session
            .read(|s| {
                s.customer(&intent.phone).map(|customer| {
                    (
                        decide_delivery(&s.settings, customer.opt_in),
                        intent.message.render(&s.templates),
                    )
                })
            })
            .await;

        let Some((delivery, text)) = decided else {
            debug!(phone = %mask_phone(&intent.phone), "Recipient gone, message dropped");
            return DeliveryOutcome::Skipped;
        };

        let outcome = match delivery {
            Delivery::Blocked(reason) => {
                info!(phone = %mask_phone(&intent.phone), reason = ?reason, "Message blocked");
                DeliveryOutcome::Blocked(reason)
            }
            Delivery::Send(channel) => {
                match self.messenger.send(&intent.phone, &text, channel).await {
                    Ok(()) => DeliveryOutcome::Sent(channel),
                    Err(e) => {
                        warn!(
                            phone = %mask_phone(&intent.phone),
                            channel = %channel,
                            error = %e,
                            "Message send failed"
                        );
                        session
                            .record_notification(
                                Notification::new(
                                    NotificationKind::MessageBlocked,
                                    "Mensaje no enviado",
                                    format!("No se pudo enviar mensaje a {}: {}", intent.phone, e),
                                    Utc::now(),
                                )
                                .for_customer(intent.phone.as_str()),
                            )
                            .await;
                        return DeliveryOutcome::Failed;
                    }
                }
            }
        };

        session
            .record_notification(delivery_notification(&intent.phone, delivery, Utc::now()))
            .await;
        outcome
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use barberia_core::messaging::OutboundMessage;
    use barberia_core::{Customer, Snapshot};
    use barberia_db::{Database, DbConfig};
    use tokio::sync::Mutex;

    /// Keeps every message instead of sending it.
    #[derive(Default)]
    pub(crate) struct RecordingMessenger {
        pub sent: Mutex<Vec<(String, String, Channel)>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send(&self, phone: &str, text: &str, channel: Channel) -> Result<(), SendError> {
            if self.fail {
                return Err(SendError::Unavailable("offline".into()));
            }
            self.sent
                .lock()
                .await
                .push((phone.to_string(), text.to_string(), channel));
            Ok(())
        }
    }

    async fn session_with_customer(opt_in: bool) -> SessionState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut snapshot = Snapshot::seeded();
        let mut customer = Customer::new("3001234567", "Ana", Utc::now());
        customer.opt_in = opt_in;
        snapshot.customers.push(customer);
        SessionState::new(db, snapshot)
    }

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("3001234567"), "******4567");
        assert_eq!(mask_phone("4567"), "4567");
        assert_eq!(mask_phone(""), "");
    }

    #[tokio::test]
    async fn test_deliver_sends_and_records() {
        let session = session_with_customer(true).await;
        let messenger = Arc::new(RecordingMessenger::default());
        let dispatcher = Dispatcher::new(messenger.clone());

        let outcome = dispatcher
            .deliver(
                &session,
                &MessageIntent::now("3001234567", OutboundMessage::FreshCut),
            )
            .await;

        assert_eq!(outcome, DeliveryOutcome::Sent(Channel::WhatsApp));
        let sent = messenger.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "3001234567");
        let kinds = session
            .read(|s| s.notifications.iter().map(|n| n.kind).collect::<Vec<_>>())
            .await;
        assert_eq!(kinds, vec![NotificationKind::MessageSent]);
    }

    #[tokio::test]
    async fn test_deliver_respects_opt_out() {
        let session = session_with_customer(false).await;
        let messenger = Arc::new(RecordingMessenger::default());
        let dispatcher = Dispatcher::new(messenger.clone());

        let outcome = dispatcher
            .deliver(
                &session,
                &MessageIntent::now("3001234567", OutboundMessage::FreshCut),
            )
            .await;

        assert_eq!(outcome, DeliveryOutcome::Blocked(BlockReason::CustomerOptedOut));
        assert!(messenger.sent.lock().await.is_empty());
        let kinds = session
            .read(|s| s.notifications.iter().map(|n| n.kind).collect::<Vec<_>>())
            .await;
        assert_eq!(kinds, vec![NotificationKind::PrivacyBlock]);
    }

    #[tokio::test]
    async fn test_provider_failure_is_recorded() {
        let session = session_with_customer(true).await;
        let dispatcher = Dispatcher::new(Arc::new(RecordingMessenger {
            fail: true,
            ..Default::default()
        }));

        let outcome = dispatcher
            .deliver(
                &session,
                &MessageIntent::now("3001234567", OutboundMessage::FreshCut),
            )
            .await;

        assert_eq!(outcome, DeliveryOutcome::Failed);
        let kinds = session
            .read(|s| s.notifications.iter().map(|n| n.kind).collect::<Vec<_>>())
            .await;
        assert_eq!(kinds, vec![NotificationKind::MessageBlocked]);
    }

    #[tokio::test]
    async fn test_dispatch_all_schedules_delayed() {
        let session = session_with_customer(true).await;
        let messenger = Arc::new(RecordingMessenger::default());
        let dispatcher = Dispatcher::new(messenger.clone());

        let handles = dispatcher
            .dispatch_all(
                &session,
                vec![
                    MessageIntent::now("3001234567", OutboundMessage::FreshCut),
                    MessageIntent::after(
                        "3001234567",
                        OutboundMessage::TipRequest {
                            barber_name: "Carlos".into(),
                        },
                        1,
                    ),
                    MessageIntent::now("3119999999", OutboundMessage::FreshCut),
                ],
            )
            .await;

        assert_eq!(handles.len(), 1);
        assert_eq!(messenger.sent.lock().await.len(), 1);

        for handle in handles {
            assert_eq!(handle.await.unwrap(), DeliveryOutcome::Sent(Channel::WhatsApp));
        }
        assert_eq!(messenger.sent.lock().await.len(), 2);
    }
}
