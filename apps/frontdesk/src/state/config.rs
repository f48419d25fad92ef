//! # Configuration State
//!
//! Runtime paths and shop identity loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`BARBERIA_*`)
//! 2. Defaults (this file)
//!
//! Business settings (consent, channels, permission table) are not here; they
//! live in the snapshot and travel with it. Remote sync has its own TOML file
//! handled by `barberia-sync`.
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Shop name used when the store starts empty.
    /// An existing snapshot keeps its own name.
    pub shop_name: Option<String>,

    /// SQLite file holding the snapshot
    pub database_path: PathBuf,

    /// Explicit `sync.toml` location; platform config dir when unset
    pub sync_config_path: Option<PathBuf>,

    /// Checkout page that turns an order reference into a payment QR
    pub payment_base_url: Option<String>,

    /// Seconds between appointment reminder sweeps
    pub reminder_interval_secs: u64,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            shop_name: None,
            database_path: default_database_path(),
            sync_config_path: None,
            payment_base_url: None,
            reminder_interval_secs: 300,
        }
    }
}

impl ConfigState {
    /// Creates a new ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `BARBERIA_DB_PATH`: SQLite file
    /// - `BARBERIA_SHOP_NAME`: shop name for a fresh store
    /// - `BARBERIA_SYNC_CONFIG`: path to `sync.toml`
    /// - `BARBERIA_PAYMENT_URL`: checkout page base URL
    /// - `BARBERIA_REMINDER_INTERVAL_SECS`: reminder sweep period
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ConfigState::default();

        if let Some(path) = lookup("BARBERIA_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(name) = lookup("BARBERIA_SHOP_NAME") {
            let name = name.trim();
            if !name.is_empty() {
                config.shop_name = Some(name.to_string());
            }
        }

        if let Some(path) = lookup("BARBERIA_SYNC_CONFIG") {
            config.sync_config_path = Some(PathBuf::from(path));
        }

        if let Some(url) = lookup("BARBERIA_PAYMENT_URL") {
            config.payment_base_url = Some(url);
        }

        if let Some(secs) = lookup("BARBERIA_REMINDER_INTERVAL_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => config.reminder_interval_secs = secs,
                _ => tracing::warn!(value = %secs, "Ignoring invalid reminder interval"),
            }
        }

        config
    }
}

/// `<data dir>/barberia.db`, or the working directory when the platform
/// has no data dir.
fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "barberia", "frontdesk")
        .map(|dirs| dirs.data_dir().join("barberia.db"))
        .unwrap_or_else(|| PathBuf::from("barberia.db"))
}
