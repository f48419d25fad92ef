//! # Admin Commands
//!
//! Catalog administration (owner-only), shop settings, the permission table
//! and the activity feed.

use barberia_core::catalog;
use barberia_core::permissions::{require_owner, Module, Role, RoleAccess};
use barberia_core::snapshot::{MessageTemplates, Settings};
use barberia_core::{Barber, CoreResult, Money, Notification, Reward, Service, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::ApiError;
use crate::state::SessionState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub services: Vec<Service>,
    pub rewards: Vec<Reward>,
    pub barbers: Vec<Barber>,
}

// =============================================================================
// Catalog
// =============================================================================

/// Full price list, rewards and barbers, inactive entries included.
pub async fn get_catalog(session: &SessionState, role: Role) -> Result<CatalogResponse, ApiError> {
    debug!("get_catalog command");

    session
        .read(|s| -> Result<_, ApiError> {
            s.settings
                .permissions
                .require(role, Module::Dashboard, "view the catalog")?;
            Ok(CatalogResponse {
                services: s.services.clone(),
                rewards: s.rewards.clone(),
                barbers: s.barbers.clone(),
            })
        })
        .await
}

pub async fn set_service_price(
    session: &SessionState,
    role: Role,
    code: String,
    price_pesos: i64,
) -> Result<(), ApiError> {
    debug!(code = %code, "set_service_price command");

    session
        .transact(|s| {
            require_owner(role, "edit the catalog")?;
            catalog::set_service_price(s, &code, Money::from_pesos(price_pesos))
        })
        .await?;

    info!(code = %code, price = price_pesos, "Service price changed");
    Ok(())
}

pub async fn set_service_active(
    session: &SessionState,
    role: Role,
    code: String,
    active: bool,
) -> Result<(), ApiError> {
    debug!(code = %code, "set_service_active command");

    session
        .transact(|s| {
            require_owner(role, "edit the catalog")?;
            catalog::set_service_active(s, &code, active)
        })
        .await?;

    info!(code = %code, active, "Service visibility changed");
    Ok(())
}

pub async fn upsert_reward(
    session: &SessionState,
    role: Role,
    reward: Reward,
) -> Result<(), ApiError> {
    debug!(reward_id = reward.id, "upsert_reward command");

    let reward_id = reward.id;
    session
        .transact(|s| {
            require_owner(role, "edit rewards")?;
            catalog::upsert_reward(s, reward)
        })
        .await?;

    info!(reward_id, "Reward saved");
    Ok(())
}

// =============================================================================
// Settings
// =============================================================================

pub async fn get_settings(session: &SessionState, role: Role) -> Result<Settings, ApiError> {
    debug!("get_settings command");

    session
        .read(|s| -> Result<_, ApiError> {
            s.settings
                .permissions
                .require(role, Module::Settings, "view settings")?;
            Ok(s.settings.clone())
        })
        .await
}

fn check_sync_url(url: &str) -> CoreResult<()> {
    let url = url.trim();
    if url.is_empty() {
        return Ok(());
    }
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        Ok(_) => Err(ValidationError::InvalidFormat {
            field: "sync_url".to_string(),
            reason: "must be http or https".to_string(),
        }
        .into()),
        Err(e) => Err(ValidationError::InvalidFormat {
            field: "sync_url".to_string(),
            reason: e.to_string(),
        }
        .into()),
    }
}

/// Replaces the shop settings. The permission table is kept; it changes
/// only through [`set_permission`].
pub async fn update_settings(
    session: &SessionState,
    role: Role,
    mut settings: Settings,
) -> Result<Settings, ApiError> {
    debug!("update_settings command");

    let saved = session
        .transact(|s| {
            s.settings
                .permissions
                .require(role, Module::Settings, "change settings")?;
            check_sync_url(&settings.sync_url)?;
            settings.sync_url = settings.sync_url.trim().to_string();
            settings.permissions = s.settings.permissions.clone();
            s.settings = settings;
            Ok::<_, barberia_core::CoreError>(s.settings.clone())
        })
        .await?;

    info!(
        privacy_consent = saved.privacy_consent,
        whatsapp = saved.whatsapp_enabled,
        sms = saved.sms_enabled,
        sync_enabled = saved.sync_enabled,
        "Settings updated"
    );
    Ok(saved)
}

pub async fn update_templates(
    session: &SessionState,
    role: Role,
    templates: MessageTemplates,
) -> Result<(), ApiError> {
    debug!("update_templates command");

    session
        .transact(|s| {
            s.settings
                .permissions
                .require(role, Module::Settings, "change message templates")?;
            s.templates = templates;
            Ok::<_, barberia_core::CoreError>(())
        })
        .await?;

    info!("Message templates updated");
    Ok(())
}

/// Owner-only edit of one row of the permission table.
pub async fn set_permission(
    session: &SessionState,
    role: Role,
    module: Module,
    access: RoleAccess,
) -> Result<(), ApiError> {
    debug!(module = ?module, "set_permission command");

    session
        .transact(|s| {
            require_owner(role, "change permissions")?;
            s.settings.permissions.set(module, access);
            Ok::<_, barberia_core::CoreError>(())
        })
        .await?;

    info!(module = ?module, ?access, "Permission changed");
    Ok(())
}

// =============================================================================
// Activity Feed
// =============================================================================

/// Newest first.
pub async fn list_notifications(
    session: &SessionState,
    role: Role,
    unread_only: bool,
) -> Result<Vec<Notification>, ApiError> {
    session
        .read(|s| -> Result<_, ApiError> {
            s.settings
                .permissions
                .require(role, Module::Dashboard, "view notifications")?;
            Ok(s.notifications
                .iter()
                .filter(|n| !unread_only || !n.read)
                .cloned()
                .collect())
        })
        .await
}

pub async fn mark_notifications_read(session: &SessionState, role: Role) -> Result<usize, ApiError> {
    session
        .transact(|s| {
            s.settings
                .permissions
                .require(role, Module::Dashboard, "update notifications")?;
            Ok::<_, barberia_core::CoreError>(s.mark_notifications_read())
        })
        .await
}
