//! # Snapshot Repository
//!
//! Persists the whole shop [`Snapshot`] as a single JSON row.
//!
//! ## Version Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  load()                                                                 │
//! │    │                                                                    │
//! │    ├── no row ─────────────────────────────► None  (first run)         │
//! │    ├── version column ≠ DATA_VERSION ──────► None  (warn, discard)     │
//! │    ├── payload fails to decode ────────────► None  (warn, discard)     │
//! │    └── ok ─────────────────────────────────► Some(snapshot)            │
//! │                                                                         │
//! │  The caller falls back to `Snapshot::seeded()` on None. Nothing is     │
//! │  migrated: an old payload is left in place until the next save.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use barberia_core::snapshot::decode;
use barberia_core::{Snapshot, DATA_VERSION};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbResult;

/// The single row id. See `001_snapshots.sql`.
const SNAPSHOT_ROW: i64 = 1;

/// Repository for the persisted shop snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    pool: SqlitePool,
}

impl SnapshotRepository {
    /// Creates a new SnapshotRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SnapshotRepository { pool }
    }

    /// Loads the stored snapshot.
    ///
    /// Returns `Ok(None)` when nothing usable is stored; only database
    /// failures are errors.
    pub async fn load(&self) -> DbResult<Option<Snapshot>> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT version, payload FROM snapshots WHERE id = ?1")
                .bind(SNAPSHOT_ROW)
                .fetch_optional(&self.pool)
                .await?;

        let Some((version, payload)) = row else {
            debug!("No stored snapshot");
            return Ok(None);
        };

        if version != i64::from(DATA_VERSION) {
            warn!(
                stored = version,
                expected = DATA_VERSION,
                "Discarding stored snapshot with mismatched version"
            );
            return Ok(None);
        }

        match decode(&payload) {
            Ok(snapshot) => {
                debug!(
                    customers = snapshot.customers.len(),
                    orders = snapshot.orders.len(),
                    "Snapshot loaded"
                );
                Ok(Some(snapshot))
            }
            Err(e) => {
                warn!(error = %e, "Discarding undecodable snapshot");
                Ok(None)
            }
        }
    }

    /// Saves `snapshot`, replacing whatever was stored.
    ///
    /// The payload is always stamped with the current [`DATA_VERSION`].
    pub async fn save(&self, snapshot: &Snapshot) -> DbResult<()> {
        let mut value = serde_json::to_value(snapshot)?;
        value["version"] = serde_json::Value::from(DATA_VERSION);
        let payload = serde_json::to_string(&value)?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO snapshots (id, version, payload, saved_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                version = excluded.version,
                payload = excluded.payload,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(SNAPSHOT_ROW)
        .bind(i64::from(DATA_VERSION))
        .bind(&payload)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(bytes = payload.len(), "Snapshot saved");
        Ok(())
    }

    /// When the stored snapshot was last written, if any.
    pub async fn saved_at(&self) -> DbResult<Option<DateTime<Utc>>> {
        let saved_at = sqlx::query_scalar("SELECT saved_at FROM snapshots WHERE id = ?1")
            .bind(SNAPSHOT_ROW)
            .fetch_optional(&self.pool)
            .await?;
        Ok(saved_at)
    }

    /// Deletes the stored snapshot. The next load returns `None`.
    pub async fn clear(&self) -> DbResult<()> {
        sqlx::query("DELETE FROM snapshots")
            .execute(&self.pool)
            .await?;
        debug!("Stored snapshot cleared");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
