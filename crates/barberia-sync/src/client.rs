//! # Remote Sync Client
//!
//! HTTP pull/push of the shop snapshot.
//!
//! ```text
//! pull:  GET  <url>                       ──► 200 {snapshot} | bare snapshot
//! push:  POST <url>  {"snapshot": ...}    ──► 2xx
//!        X-Barberia-Device: <device id>
//! ```
//!
//! `pull`, `push` and `spawn_push` never fail: errors are logged and the
//! caller keeps working on its local snapshot. `try_pull` and `try_push`
//! expose the typed error.

use barberia_core::Snapshot;
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{decode_body, SnapshotEnvelope};

const DEVICE_HEADER: &str = "X-Barberia-Device";

/// Best-effort snapshot sync over HTTP. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RemoteSync {
    client: Client,
    device_id: String,
    timeout_secs: u64,
}

impl RemoteSync {
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            device_id: config.device.id.clone(),
            timeout_secs: config.sync.timeout_secs,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> SyncError {
        if err.is_timeout() {
            SyncError::Timeout(self.timeout_secs)
        } else if let Some(status) = err.status() {
            SyncError::HttpStatus {
                status: status.as_u16(),
            }
        } else {
            SyncError::ConnectionFailed(err.to_string())
        }
    }

    // =========================================================================
    // Pull
    // =========================================================================

    /// Fetches and version-checks the remote snapshot.
    pub async fn try_pull(&self, url: &str) -> SyncResult<Snapshot> {
        debug!(url = %url, "Pulling remote snapshot");

        let response = self
            .client
            .get(url)
            .header(DEVICE_HEADER, &self.device_id)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        decode_body(&body)
    }

    /// Like [`try_pull`](Self::try_pull), returning `None` on any failure.
    pub async fn pull(&self, url: &str) -> Option<Snapshot> {
        match self.try_pull(url).await {
            Ok(snapshot) => {
                info!(
                    customers = snapshot.customers.len(),
                    orders = snapshot.orders.len(),
                    "Remote snapshot pulled"
                );
                Some(snapshot)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Remote pull failed, keeping local snapshot");
                None
            }
        }
    }

    // =========================================================================
    // Push
    // =========================================================================

    /// Uploads the redacted snapshot.
    pub async fn try_push(&self, url: &str, snapshot: &Snapshot) -> SyncResult<()> {
        let redacted = snapshot.redacted();
        let body = serde_json::to_vec(&SnapshotEnvelope {
            snapshot: &redacted,
        })?;

        let response = self
            .client
            .post(url)
            .header(DEVICE_HEADER, &self.device_id)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus {
                status: status.as_u16(),
            });
        }

        debug!(url = %url, "Snapshot pushed");
        Ok(())
    }

    /// Like [`try_push`](Self::try_push), logging instead of failing.
    pub async fn push(&self, url: &str, snapshot: &Snapshot) {
        if let Err(e) = self.try_push(url, snapshot).await {
            warn!(
                url = %url,
                error = %e,
                retryable = e.is_retryable(),
                "Remote push failed"
            );
        }
    }

    /// Pushes in a background task. The snapshot is redacted before the
    /// task starts, so secrets never cross the task boundary.
    pub fn spawn_push(&self, url: String, snapshot: &Snapshot) -> JoinHandle<()> {
        let sync = self.clone();
        let redacted = snapshot.redacted();
        tokio::spawn(async move {
            sync.push(&url, &redacted).await;
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
