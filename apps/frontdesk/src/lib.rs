//! # Barberia Front Desk Library
//!
//! Wires the core rules to storage, sync and messaging, and runs the shop
//! session.
//!
//! ## Module Organization
//! ```text
//! barberia_frontdesk/
//! ├── lib.rs          ◄─── You are here (startup & run loop)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── session.rs  ◄─── Single-writer snapshot + persistence
//! │   ├── reminders.rs◄─── Reminders already sent
//! │   └── config.rs   ◄─── Configuration state
//! ├── commands/       ◄─── Everything the UI can ask for
//! ├── messaging.rs    ◄─── Messenger trait + dispatcher
//! ├── payment.rs      ◄─── Payment links for the QR
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod error;
pub mod messaging;
pub mod payment;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use barberia_core::Snapshot;
use barberia_db::{Database, DbConfig, DbError};
use barberia_sync::SyncConfig;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::EnvFilter;

use messaging::Dispatcher;
use payment::{CheckoutLinks, NoPaymentLinks, PaymentLinks};
use state::{ConfigState, ReminderLog, SessionState, SyncLink};

/// Errors that stop the front desk from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Could not create data directory: {0}")]
    DataDir(#[from] std::io::Error),

    #[error("Database unavailable: {0}")]
    Database(#[from] DbError),
}

/// Everything a running front desk holds.
#[derive(Clone)]
pub struct FrontDesk {
    pub session: SessionState,
    pub dispatcher: Dispatcher,
    pub payments: Arc<dyn PaymentLinks>,
    pub reminders: ReminderLog,
    pub config: ConfigState,
}

impl FrontDesk {
    /// One reminder pass; does nothing while auto reminders are off.
    pub async fn reminder_sweep(&self) -> usize {
        let enabled = self.session.read(|s| s.settings.auto_reminders).await;
        if !enabled {
            debug!("Auto reminders off, skipping sweep");
            return 0;
        }
        commands::appointment::send_due_reminders(
            &self.session,
            &self.dispatcher,
            &self.reminders,
            Utc::now(),
        )
        .await
    }
}

// =============================================================================
// Startup
// =============================================================================

/// Opens the database at the configured path and starts the session.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Open SQLite (WAL, migrations)                                       │
/// │  2. Load local snapshot ── none / old version ──► seeded store (saved)  │
/// │  3. Load sync.toml (defaults on error)                                  │
/// │  4. Sync on? ── pull remote ── passes version guard ──► replace local   │
/// │  5. Payment links from BARBERIA_PAYMENT_URL                             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn start(config: ConfigState, dispatcher: Dispatcher) -> Result<FrontDesk, StartupError> {
    if let Some(dir) = config.database_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    info!(db_path = %config.database_path.display(), "Opening database");
    let db = Database::new(DbConfig::new(&config.database_path)).await?;

    let sync_config = SyncConfig::load_or_default(config.sync_config_path.clone());
    start_with_database(db, config, sync_config, dispatcher).await
}

/// Starts the session on an already opened database.
pub async fn start_with_database(
    db: Database,
    config: ConfigState,
    sync_config: SyncConfig,
    dispatcher: Dispatcher,
) -> Result<FrontDesk, StartupError> {
    let stored = db.snapshots().load().await?;
    let fresh = stored.is_none();
    let snapshot = match stored {
        Some(snapshot) => snapshot.normalized(),
        None => {
            info!("No usable local snapshot, starting a fresh store");
            let mut snapshot = Snapshot::seeded();
            if let Some(name) = &config.shop_name {
                snapshot.settings.shop_name = name.clone();
            }
            snapshot
        }
    };

    let mut session = SessionState::new(db, snapshot.clone());
    if fresh {
        session.replace(snapshot.clone()).await;
    }

    match SyncLink::new(sync_config) {
        Ok(link) => {
            if let Some(url) = link.target_url(&snapshot) {
                match link.client().pull(&url).await {
                    Some(remote) => {
                        info!(url = %url, customers = remote.customers.len(), "Using remote snapshot");
                        session.replace(remote.normalized()).await;
                    }
                    None => warn!(url = %url, "Remote snapshot unavailable, using local data"),
                }
            }
            session = session.with_sync(link);
        }
        Err(e) => warn!(error = %e, "Remote sync disabled"),
    }

    let payments: Arc<dyn PaymentLinks> = match config.payment_base_url.as_deref() {
        Some(base) => match CheckoutLinks::parse(base) {
            Ok(links) => Arc::new(links),
            Err(e) => {
                warn!(url = %base, error = %e, "Invalid payment URL, payment links disabled");
                Arc::new(NoPaymentLinks)
            }
        },
        None => Arc::new(NoPaymentLinks),
    };

    info!("Front desk ready");
    Ok(FrontDesk {
        session,
        dispatcher,
        payments,
        reminders: ReminderLog::new(),
        config,
    })
}

/// Runs the front desk until Ctrl+C.
///
/// Reminders are swept every `reminder_interval_secs`.
pub async fn run() -> Result<(), StartupError> {
    init_tracing();

    info!("Starting Barberia front desk");
    let desk = start(ConfigState::from_env(), Dispatcher::logging()).await?;

    let mut ticker =
        tokio::time::interval(Duration::from_secs(desk.config.reminder_interval_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let sent = desk.reminder_sweep().await;
                debug!(sent, "Reminder sweep finished");
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    desk.session.database().close().await;
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=barberia=trace` - Show trace for barberia crates only
/// - Default: `info,barberia=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,barberia=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use barberia_core::DATA_VERSION;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned `200 OK` JSON response.
    async fn serve_once(body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{}/snapshot", addr)
    }

    async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn config() -> ConfigState {
        ConfigState {
            shop_name: Some("La Esquina".into()),
            ..ConfigState::default()
        }
    }

    #[tokio::test]
    async fn test_fresh_start_seeds_and_saves() {
        let desk = start_with_database(
            memory_db().await,
            config(),
            SyncConfig::default(),
            Dispatcher::logging(),
        )
        .await
        .unwrap();

        let name = desk.session.read(|s| s.settings.shop_name.clone()).await;
        assert_eq!(name, "La Esquina");
        let stored = desk.session.database().snapshots().load().await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_existing_snapshot_kept() {
        let db = memory_db().await;
        let mut stored = Snapshot::seeded();
        stored.settings.shop_name = "Guardada".into();
        db.snapshots().save(&stored).await.unwrap();

        let desk = start_with_database(db, config(), SyncConfig::default(), Dispatcher::logging())
            .await
            .unwrap();
        let name = desk.session.read(|s| s.settings.shop_name.clone()).await;
        assert_eq!(name, "Guardada");
    }

    #[tokio::test]
    async fn test_remote_snapshot_replaces_local() {
        let mut remote = Snapshot::seeded();
        remote.settings.shop_name = "Remota".into();
        let url = serve_once(serde_json::json!({ "snapshot": remote }).to_string()).await;

        let db = memory_db().await;
        let mut local = Snapshot::seeded();
        local.settings.sync_enabled = true;
        local.settings.sync_url = url;
        db.snapshots().save(&local).await.unwrap();

        let desk = start_with_database(db, config(), SyncConfig::default(), Dispatcher::logging())
            .await
            .unwrap();
        let name = desk.session.read(|s| s.settings.shop_name.clone()).await;
        assert_eq!(name, "Remota");
    }

    #[tokio::test]
    async fn test_remote_with_old_version_ignored() {
        let mut remote = serde_json::to_value(Snapshot::seeded()).unwrap();
        remote["version"] = serde_json::json!(DATA_VERSION - 1);
        remote["settings"]["shop_name"] = serde_json::json!("Vieja");
        let url = serve_once(serde_json::json!({ "snapshot": remote }).to_string()).await;

        let db = memory_db().await;
        let mut local = Snapshot::seeded();
        local.settings.shop_name = "Local".into();
        local.settings.sync_enabled = true;
        local.settings.sync_url = url;
        db.snapshots().save(&local).await.unwrap();

        let desk = start_with_database(db, config(), SyncConfig::default(), Dispatcher::logging())
            .await
            .unwrap();
        let name = desk.session.read(|s| s.settings.shop_name.clone()).await;
        assert_eq!(name, "Local");
    }

    #[tokio::test]
    async fn test_reminder_sweep_respects_setting() {
        let desk = start_with_database(
            memory_db().await,
            config(),
            SyncConfig::default(),
            Dispatcher::logging(),
        )
        .await
        .unwrap();
        desk.session
            .transact(|s| {
                s.settings.auto_reminders = false;
                Ok::<_, barberia_core::CoreError>(())
            })
            .await
            .unwrap();

        assert_eq!(desk.reminder_sweep().await, 0);
    }
}
