//! Reminders already sent in this session.
//!
//! `due_reminders` reports an appointment on every sweep while it sits in a
//! reminder window, so the sweep remembers what it sent. The log is kept in
//! memory only: after a restart a reminder may go out once more.

use std::collections::HashMap;
use std::sync::Arc;

use barberia_core::messaging::MessageIntent;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

/// Entries older than this can no longer match a due reminder.
const RETENTION_HOURS: i64 = 48;

#[derive(Debug, Clone, Default)]
pub struct ReminderLog {
    sent: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

fn key(intent: &MessageIntent) -> String {
    format!("{}|{:?}", intent.phone, intent.message)
}

impl ReminderLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the intents not sent before and marks them as sent.
    pub async fn claim(&self, intents: Vec<MessageIntent>, now: DateTime<Utc>) -> Vec<MessageIntent> {
        let mut sent = self.sent.lock().await;
        sent.retain(|_, at| now - *at < Duration::hours(RETENTION_HOURS));

        intents
            .into_iter()
            .filter(|intent| sent.insert(key(intent), now).is_none())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.sent.lock().await.len()
    }
}
