//! # Front Desk Commands
//!
//! Everything the UI can ask of the shop.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs          ◄─── You are here (exports)
//! ├── customer.rs     ◄─── Lookup, registration, profile, deletion
//! ├── checkout.rs     ◄─── Walk-ins, orders, payment confirmation, tips
//! ├── appointment.rs  ◄─── Booking, reminders, confirmation replies
//! ├── loyalty.rs      ◄─── Redemption, manual adjustment, ledger
//! ├── admin.rs        ◄─── Catalog, settings, permissions, activity feed
//! └── report.rs       ◄─── Daily summary and follow-ups
//! ```
//!
//! ## Command Shape
//! ```rust,ignore
//! pub async fn redeem_reward(
//!     session: &SessionState,   ◄── only the state it needs
//!     role: Role,               ◄── who is at the desk
//!     phone: String,            ◄── from the UI form
//!     reward_id: u32,
//! ) -> Result<Redemption, ApiError>
//! ```
//!
//! Mutations run inside `SessionState::transact`, so the permission check,
//! the core operation and the save happen under one lock.

pub mod admin;
pub mod appointment;
pub mod checkout;
pub mod customer;
pub mod loyalty;
pub mod report;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use barberia_core::Snapshot;
    use barberia_db::{Database, DbConfig};

    use crate::messaging::tests::RecordingMessenger;
    use crate::messaging::Dispatcher;
    use crate::state::SessionState;

    /// Seeded session on an in-memory database.
    pub async fn session() -> SessionState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        SessionState::new(db, Snapshot::seeded())
    }

    /// Dispatcher that records instead of sending and ignores delays.
    pub fn dispatcher() -> (Dispatcher, Arc<RecordingMessenger>) {
        let messenger = Arc::new(RecordingMessenger::default());
        (
            Dispatcher::new(messenger.clone()).without_delays(),
            messenger,
        )
    }
}
