//! # Session State
//!
//! The one live snapshot of the shop, and the only way to change it.
//!
//! ## Single Writer
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    transact(|snapshot| core_op(...))                    │
//! │                                                                         │
//! │  lock ──► clone ──► core_op(&mut working)                               │
//! │                          │                                              │
//! │            Err ◄─────────┤ live snapshot untouched, nothing saved       │
//! │                          │                                              │
//! │                          ▼ Ok                                           │
//! │                   live = working                                        │
//! │                          │                                              │
//! │                          ├──► SnapshotRepository::save   (logged only)  │
//! │                          └──► RemoteSync::spawn_push     (background)   │
//! │                          │                                              │
//! │                       unlock                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lock is held across the local save so saves land in mutation order.
//! Remote pushes are spawned and never awaited.

use std::sync::Arc;

use barberia_core::{Notification, Snapshot};
use barberia_db::Database;
use barberia_sync::{RemoteSync, SyncConfig, SyncResult};
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::error::ApiError;

/// Remote sync client plus the device config that decides the target URL.
#[derive(Debug, Clone)]
pub struct SyncLink {
    client: RemoteSync,
    config: SyncConfig,
}

impl SyncLink {
    pub fn new(config: SyncConfig) -> SyncResult<Self> {
        Ok(SyncLink {
            client: RemoteSync::new(&config)?,
            config,
        })
    }

    pub fn client(&self) -> &RemoteSync {
        &self.client
    }

    /// Where to sync, given the shop settings of `snapshot`.
    pub fn target_url(&self, snapshot: &Snapshot) -> Option<String> {
        self.config.target_url(&snapshot.settings)
    }
}

/// Shared handle to the live snapshot. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SessionState {
    snapshot: Arc<Mutex<Snapshot>>,
    db: Database,
    sync: Option<Arc<SyncLink>>,
}

impl SessionState {
    pub fn new(db: Database, snapshot: Snapshot) -> Self {
        SessionState {
            snapshot: Arc::new(Mutex::new(snapshot)),
            db,
            sync: None,
        }
    }

    pub fn with_sync(mut self, link: SyncLink) -> Self {
        self.sync = Some(Arc::new(link));
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Runs a read-only view over the live snapshot.
    pub async fn read<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> R {
        let guard = self.snapshot.lock().await;
        f(&guard)
    }

    /// Copy of the live snapshot.
    pub async fn current(&self) -> Snapshot {
        self.read(Snapshot::clone).await
    }

    /// Applies `f` to a copy of the snapshot and commits it only on success.
    ///
    /// ## Errors
    /// Whatever `f` returns. Save and push failures are logged, not
    /// returned: the committed change stands.
    pub async fn transact<R, E>(
        &self,
        f: impl FnOnce(&mut Snapshot) -> Result<R, E>,
    ) -> Result<R, ApiError>
    where
        E: Into<ApiError>,
    {
        let mut guard = self.snapshot.lock().await;
        let mut working = guard.clone();
        let value = f(&mut working).map_err(Into::into)?;
        *guard = working;
        self.persist(&guard).await;
        Ok(value)
    }

    /// Swaps in a whole snapshot (remote pull at startup) and saves it
    /// locally. Not pushed back.
    pub async fn replace(&self, snapshot: Snapshot) {
        let mut guard = self.snapshot.lock().await;
        *guard = snapshot;
        self.save_local(&guard).await;
    }

    /// Appends an activity-feed entry.
    pub async fn record_notification(&self, notification: Notification) {
        let mut guard = self.snapshot.lock().await;
        guard.push_notification(notification);
        self.persist(&guard).await;
    }

    async fn persist(&self, snapshot: &Snapshot) {
        self.save_local(snapshot).await;

        if let Some(link) = &self.sync {
            if let Some(url) = link.target_url(snapshot) {
                debug!(url = %url, "Pushing snapshot");
                link.client.spawn_push(url, snapshot);
            }
        }
    }

    async fn save_local(&self, snapshot: &Snapshot) {
        if let Err(e) = self.db.snapshots().save(snapshot).await {
            error!(error = %e, "Failed to save snapshot; keeping in-memory state");
        }
    }
}
