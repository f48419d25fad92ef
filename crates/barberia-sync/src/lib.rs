//! # barberia-sync: Remote Snapshot Sync
//!
//! Keeps an off-device copy of the shop snapshot. The local snapshot is
//! always authoritative; the remote copy is a convenience.
//!
//! ## Sync Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  STARTUP                                                               │
//! │  ───────                                                               │
//! │  local = db.load() or seeded                                           │
//! │  RemoteSync::pull(url) ──► Some(remote) passes version guard           │
//! │                            └─► replaces local                          │
//! │                        ──► None (offline, 5xx, bad JSON, old version)  │
//! │                            └─► keep local, log                         │
//! │                                                                         │
//! │  AFTER EVERY MUTATION                                                  │
//! │  ────────────────────                                                  │
//! │  RemoteSync::spawn_push(url, &snapshot)                                │
//! │       └─► background task: POST { "snapshot": redacted }               │
//! │           failure is logged, never surfaced                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`client`] - `RemoteSync` HTTP client
//! - [`config`] - Sync configuration (TOML + environment)
//! - [`error`] - Sync error types
//! - [`protocol`] - Wire envelope for snapshot bodies
//!
//! ## Usage
//!
//! ```rust,ignore
//! use barberia_sync::{RemoteSync, SyncConfig};
//!
//! let config = SyncConfig::load_or_default(None);
//! let sync = RemoteSync::new(&config)?;
//! if let Some(url) = config.target_url(&snapshot.settings) {
//!     if let Some(remote) = sync.pull(&url).await {
//!         snapshot = remote;
//!     }
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;

// =============================================================================
// Re-exports
// =============================================================================

pub use client::RemoteSync;
pub use config::{DeviceConfig, SyncConfig, SyncSettings};
pub use error::{SyncError, SyncResult};
pub use protocol::SnapshotEnvelope;
