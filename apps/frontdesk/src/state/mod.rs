//! # State Module
//!
//! Separate state types instead of one `AppState`; each command declares
//! exactly the state it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐      │
//! │  │  SessionState    │  │  Dispatcher      │  │  ConfigState     │      │
//! │  │                  │  │  (messaging.rs)  │  │                  │      │
//! │  │  Arc<Mutex<      │  │  Arc<dyn         │  │  db path         │      │
//! │  │    Snapshot>>    │  │    Messenger>    │  │  sync.toml path  │      │
//! │  │  Database        │  │                  │  │  payment URL     │      │
//! │  │  SyncLink        │  │                  │  │                  │      │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────┘      │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • SessionState: one async mutex, held for a whole mutation + save     │
//! │  • Dispatcher: stateless apart from the messenger                      │
//! │  • ConfigState: read-only after initialization                         │
//! │  • ReminderLog: own mutex, touched only by the reminder sweep          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod reminders;
mod session;

pub use config::ConfigState;
pub use reminders::ReminderLog;
pub use session::{SessionState, SyncLink};
