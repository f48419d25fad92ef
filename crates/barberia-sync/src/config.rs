//! # Sync Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BARBERIA_SYNC_URL=https://backup.example.com/shop                  │
//! │     BARBERIA_SYNC_ENABLED=true                                         │
//! │     BARBERIA_SYNC_TIMEOUT_SECS=10                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/barberia/sync.toml (Linux)                               │
//! │                                                                         │
//! │  3. Shop settings inside the snapshot (sync_enabled, sync_url)         │
//! │     Used only when 1 and 2 leave sync off                              │
//! │                                                                         │
//! │  4. Default Values (lowest priority): disabled                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [device]
//! id = "550e8400-e29b-41d4-a716-446655440000"
//! name = "Front desk"
//!
//! [sync]
//! enabled = true
//! url = "https://backup.example.com/shop"
//! timeout_secs = 10
//! ```

use barberia_core::snapshot::Settings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Device Configuration
// =============================================================================

/// Identifies this front desk to the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Generated on first run if not provided.
    pub id: String,

    #[serde(default = "default_device_name")]
    pub name: String,
}

fn default_device_name() -> String {
    "Front desk".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            id: Uuid::new_v4().to_string(),
            name: default_device_name(),
        }
    }
}

// =============================================================================
// Sync Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default)]
    pub enabled: bool,

    /// HTTP(S) endpoint that answers GET with a snapshot and accepts POST.
    #[serde(default)]
    pub url: Option<String>,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            enabled: false,
            url: None,
            timeout_secs: default_timeout(),
        }
    }
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub sync: SyncSettings,
}

impl SyncConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.device.id.is_empty() {
            return Err(SyncError::InvalidConfig("device id is empty".into()));
        }

        if let Some(ref url) = self.sync.url {
            validate_url(url)?;
        }

        if self.sync.enabled && self.sync.url.is_none() {
            return Err(SyncError::InvalidConfig(
                "sync is enabled but no url is set".into(),
            ));
        }

        if self.sync.timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `BARBERIA_SYNC_*` overrides from `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("BARBERIA_SYNC_URL") {
            debug!(url = %url, "Overriding sync URL from environment");
            self.sync.url = Some(url);
        }

        if let Some(enabled) = lookup("BARBERIA_SYNC_ENABLED") {
            match enabled.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.sync.enabled = true,
                "0" | "false" | "no" | "off" => self.sync.enabled = false,
                _ => warn!(value = %enabled, "Unknown BARBERIA_SYNC_ENABLED value"),
            }
        }

        if let Some(timeout) = lookup("BARBERIA_SYNC_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                self.sync.timeout_secs = secs;
            }
        }

        if let Some(id) = lookup("BARBERIA_DEVICE_ID") {
            self.device.id = id;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "barberia", "frontdesk")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.sync.timeout_secs)
    }

    /// The endpoint to sync with, if sync is on.
    ///
    /// The device config wins; the shop settings in the snapshot are the
    /// fallback. An invalid settings URL is treated as sync off.
    pub fn target_url(&self, settings: &Settings) -> Option<String> {
        if self.sync.enabled {
            return self.sync.url.clone();
        }
        if settings.sync_enabled && !settings.sync_url.trim().is_empty() {
            let url = settings.sync_url.trim();
            return match validate_url(url) {
                Ok(()) => Some(url.to_string()),
                Err(e) => {
                    warn!(error = %e, "Ignoring invalid sync URL in shop settings");
                    None
                }
            };
        }
        None
    }
}

fn validate_url(raw: &str) -> SyncResult<()> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SyncError::InvalidUrl(format!(
            "sync URL must be http or https, got: {}",
            other
        ))),
    }
}
