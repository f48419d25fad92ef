//! # Snapshot
//!
//! The whole shop dataset as one value: catalog, customers, visits, ledger,
//! settings. The front desk session owns exactly one of these; every core
//! operation reads it and, on success, leaves it in its next state.
//!
//! ## Lifecycle
//! ```text
//! ┌──────────────┐  decode()   ┌──────────────┐  core ops   ┌──────────────┐
//! │ stored JSON  │────────────►│   Snapshot   │────────────►│   Snapshot'  │
//! │ (db / sync)  │  version    │  (session)   │  validated  │  persisted   │
//! └──────────────┘  guard      └──────────────┘  then       └──────┬───────┘
//!                                                applied           │ redacted()
//!                                                                  ▼
//!                                                          remote push body
//! ```
//!
//! A payload whose `version` differs from [`DATA_VERSION`] is rejected, not
//! migrated. Callers fall back to [`Snapshot::seeded`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::money::Money;
use crate::permissions::PermissionTable;
use crate::types::*;
use crate::DATA_VERSION;

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BusinessHours {
    pub start: String,
    pub end: String,
}

/// Credentials for third-party integrations. Never leaves the device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct IntegrationSecrets {
    pub payment_public_key: String,
    pub payment_access_token: String,
    pub payment_webhook_url: String,
    pub calendar_client_id: String,
    pub calendar_client_secret: String,
    pub messaging_instance_id: String,
    pub messaging_token: String,
}

/// Shop-wide settings persisted inside the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct Settings {
    pub shop_name: String,
    pub shop_address: String,
    pub shop_phone: String,
    pub business_hours: BusinessHours,
    pub timezone: String,
    pub currency: String,

    /// Shop-level consent to contact customers at all.
    pub privacy_consent: bool,
    pub whatsapp_enabled: bool,
    pub sms_enabled: bool,
    pub auto_reminders: bool,

    pub fresh_cut_days_clean: u32,
    pub fresh_cut_days_full: u32,
    pub winback_days: u32,

    pub sync_enabled: bool,
    pub sync_url: String,

    pub integrations: IntegrationSecrets,
    pub permissions: PermissionTable,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shop_name: "Barberia Colombia".to_string(),
            shop_address: "Calle 123 #45-67, Bogota".to_string(),
            shop_phone: "3001234567".to_string(),
            business_hours: BusinessHours::default(),
            timezone: "America/Bogota".to_string(),
            currency: "COP".to_string(),
            privacy_consent: true,
            whatsapp_enabled: true,
            sms_enabled: true,
            auto_reminders: true,
            fresh_cut_days_clean: 25,
            fresh_cut_days_full: 35,
            winback_days: 60,
            sync_enabled: false,
            sync_url: String::new(),
            integrations: IntegrationSecrets::default(),
            permissions: PermissionTable::default(),
        }
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start: "09:00".to_string(),
            end: "19:00".to_string(),
        }
    }
}

/// Outbound message texts with `{placeholder}` fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct MessageTemplates {
    pub receipt: String,
    pub tip: String,
    pub reward_unlocked: String,
    pub reminder_24h: String,
    pub reminder_2h: String,
    pub fresh_cut: String,
    pub winback: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            receipt: "Gracias por visitarnos\n\nServicios:\n{services}\n\nTotal pagado: {total}\n\
                      Sellos ganados: +{stamps}\nSellos acumulados: {total_stamps}\n\n\
                      Proxima recompensa:\n{next_reward}"
                .to_string(),
            tip: "Quieres dejar propina a tu barbero? 100% va directo para {barber_name}.\n\n\
                  Elige un monto:\n• $5.000\n• $10.000\n• $15.000\n• Otro valor"
                .to_string(),
            reward_unlocked: "Felicidades! Has desbloqueado: {reward_name}\n\
                              Puedes usarlo en tu proxima visita."
                .to_string(),
            reminder_24h: "Recordatorio: Tienes cita manana a las {time} con {barber_name}"
                .to_string(),
            reminder_2h: "Tu cita es en 2 horas ({time}) con {barber_name}. Te esperamos!"
                .to_string(),
            fresh_cut: "Ya va siendo hora de un retoque. Agenda tu proximo corte cuando quieras."
                .to_string(),
            winback: "Te extranamos!\nHace {days} dias que no te vemos.\n\n\
                      Tenemos una sorpresa para ti en tu proxima visita."
                .to_string(),
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// The complete shop dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub barbers: Vec<Barber>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
    #[serde(default)]
    pub tips: Vec<Tip>,
    /// Newest first
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub ledger: Vec<LedgerEntry>,
    #[serde(default)]
    pub templates: MessageTemplates,
    #[serde(default)]
    pub settings: Settings,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Snapshot {
    /// A fresh shop: default catalog, three barbers, no customers.
    pub fn seeded() -> Self {
        Self {
            version: DATA_VERSION,
            barbers: default_barbers(),
            services: default_services(),
            rewards: default_rewards(),
            customers: Vec::new(),
            orders: Vec::new(),
            appointments: Vec::new(),
            tips: Vec::new(),
            notifications: Vec::new(),
            ledger: Vec::new(),
            templates: MessageTemplates::default(),
            settings: Settings::default(),
        }
    }

    /// Fills empty catalog sections and missing permission rows from the
    /// defaults. Customer data is never touched.
    pub fn normalized(mut self) -> Self {
        if self.barbers.is_empty() {
            self.barbers = default_barbers();
        }
        if self.services.is_empty() {
            self.services = default_services();
        }
        if self.rewards.is_empty() {
            self.rewards = default_rewards();
        }
        self.settings.permissions = self.settings.permissions.merged_with_defaults();
        self
    }

    /// Copy safe to send off-device: every integration secret blanked.
    ///
    /// The sync URL itself is kept so a pulled snapshot can keep syncing.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.settings.integrations = IntegrationSecrets::default();
        copy
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    /// Read-only catalog view over services and rewards.
    #[inline]
    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(&self.services, &self.rewards)
    }

    pub fn customer(&self, phone: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.phone == phone)
    }

    pub fn customer_mut(&mut self, phone: &str) -> Option<&mut Customer> {
        self.customers.iter_mut().find(|c| c.phone == phone)
    }

    pub fn order(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn order_mut(&mut self, id: &str) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.id == id)
    }

    pub fn appointment(&self, id: &str) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    pub fn appointment_mut(&mut self, id: &str) -> Option<&mut Appointment> {
        self.appointments.iter_mut().find(|a| a.id == id)
    }

    /// Active barber by id.
    pub fn barber(&self, id: u32) -> Option<&Barber> {
        self.barbers.iter().find(|b| b.id == id && b.active)
    }

    /// The live (PENDING or PAID) order of an appointment, if any.
    ///
    /// Cancelled and failed orders do not count, so the appointment can be
    /// billed again after either.
    pub fn order_for_appointment(&self, appointment_id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| {
            o.appointment_id.as_deref() == Some(appointment_id)
                && matches!(o.status, OrderStatus::Pending | OrderStatus::Paid)
        })
    }

    /// Ledger entries of one customer, oldest first.
    pub fn ledger_for<'a>(&'a self, phone: &'a str) -> impl Iterator<Item = &'a LedgerEntry> + 'a {
        self.ledger.iter().filter(move |e| e.customer_phone == phone)
    }

    /// Prepends to the activity feed.
    pub fn push_notification(&mut self, notification: Notification) {
        self.notifications.insert(0, notification);
    }

    /// Marks every notification read. Returns how many changed.
    pub fn mark_notifications_read(&mut self) -> usize {
        let mut changed = 0;
        for n in self.notifications.iter_mut().filter(|n| !n.read) {
            n.read = true;
            changed += 1;
        }
        changed
    }

    /// Latest activity timestamp across visits, for status lines.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        let orders = self.orders.iter().map(|o| o.paid_at.unwrap_or(o.created_at));
        let appts = self.appointments.iter().map(|a| a.created_at);
        orders.chain(appts).max()
    }
}

// =============================================================================
// Decoding with Version Guard
// =============================================================================

/// Why a stored payload was not accepted.
#[derive(Debug, Error)]
pub enum SnapshotDecodeError {
    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Written by a different data version; discarded, not migrated.
    #[error("Snapshot version {found:?} does not match expected {expected}")]
    VersionMismatch { found: Option<u64>, expected: u32 },
}

/// Decodes a snapshot from a JSON value, enforcing [`DATA_VERSION`].
///
/// The version is checked before the body is parsed, so an older layout is
/// reported as a mismatch rather than a parse failure.
pub fn decode_value(value: serde_json::Value) -> Result<Snapshot, SnapshotDecodeError> {
    let found = value.get("version").and_then(serde_json::Value::as_u64);
    if found != Some(u64::from(DATA_VERSION)) {
        return Err(SnapshotDecodeError::VersionMismatch {
            found,
            expected: DATA_VERSION,
        });
    }

    let snapshot: Snapshot = serde_json::from_value(value)?;
    Ok(snapshot.normalized())
}

/// Decodes a snapshot from JSON text. See [`decode_value`].
pub fn decode(json: &str) -> Result<Snapshot, SnapshotDecodeError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    decode_value(value)
}

// =============================================================================
// Defaults
// =============================================================================

fn default_barbers() -> Vec<Barber> {
    let barber = |id: u32, name: &str, phone: &str, specialty: &str| Barber {
        id,
        name: name.to_string(),
        chair_id: id,
        phone: Some(phone.to_string()),
        specialty: Some(specialty.to_string()),
        active: true,
    };
    vec![
        barber(1, "Carlos Ruiz", "3001234567", "Cortes modernos"),
        barber(2, "Miguel Santos", "3009876543", "Barba y afeitado"),
        barber(3, "Juan Perez", "3005555555", "Disenos"),
    ]
}

fn default_services() -> Vec<Service> {
    let service = |code: &str, name: &str, price: i64, duration_mins: u32| Service {
        code: code.to_string(),
        name: name.to_string(),
        price: Money::from_pesos(price),
        duration_mins,
        active: true,
    };
    vec![
        service(crate::FULL_HAIR_CUT, "Corte completo", 35_000, 45),
        service(crate::CLEAN_CUT, "Retoque / Corte limpio", 25_000, 30),
        service(crate::BEARD, "Barba", 15_000, 20),
        service(crate::EYEBROWS, "Cejas", 8_000, 10),
    ]
}

fn default_rewards() -> Vec<Reward> {
    let credit = |id: u32, value: i64, stamp_cost: u32, gate: Option<Tier>| Reward {
        id,
        name: format!("Credito {}", Money::from_pesos(value)),
        benefit: RewardBenefit::Credit {
            value: Money::from_pesos(value),
        },
        stamp_cost,
        tier_restriction: gate,
        active: true,
    };
    let free = |id: u32, name: &str, code: &str, stamp_cost: u32, gate: Option<Tier>| Reward {
        id,
        name: name.to_string(),
        benefit: RewardBenefit::Service {
            service_code: code.to_string(),
        },
        stamp_cost,
        tier_restriction: gate,
        active: true,
    };
    vec![
        credit(1, 15_000, 8, None),
        credit(2, 25_000, 10, None),
        credit(3, 50_000, 14, Some(Tier::Gold)),
        credit(4, 75_000, 18, Some(Tier::Gold)),
        free(5, "Barba Gratis", crate::BEARD, 6, None),
        free(6, "Corte Gratis", crate::FULL_HAIR_CUT, 12, Some(Tier::Gold)),
    ]
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_catalog() {
        let snapshot = Snapshot::seeded();
        assert_eq!(snapshot.version, DATA_VERSION);
        assert_eq!(snapshot.services.len(), 4);
        assert_eq!(snapshot.rewards.len(), 6);
        assert_eq!(snapshot.barbers.len(), 3);
        assert_eq!(snapshot.rewards[0].name, "Credito $15.000");
        assert_eq!(
            snapshot.catalog().price_of(crate::FULL_HAIR_CUT).unwrap(),
            Money::from_pesos(35_000)
        );
    }

    #[test]
    fn test_redacted_blanks_secrets_keeps_sync_url() {
        let mut snapshot = Snapshot::seeded();
        snapshot.settings.sync_url = "https://sheets.example/exec".into();
        snapshot.settings.integrations.payment_access_token = "APP_USR-secret".into();
        snapshot.settings.integrations.calendar_client_secret = "gcal".into();
        snapshot.settings.integrations.messaging_token = "tok".into();

        let redacted = snapshot.redacted();
        assert_eq!(redacted.settings.integrations, IntegrationSecrets::default());
        assert_eq!(redacted.settings.sync_url, "https://sheets.example/exec");
        // Original untouched
        assert_eq!(
            snapshot.settings.integrations.payment_access_token,
            "APP_USR-secret"
        );
    }

    #[test]
    fn test_decode_round_trip_and_version_guard() {
        let snapshot = Snapshot::seeded();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(decode(&json).unwrap(), snapshot);

        let mut old = serde_json::to_value(&snapshot).unwrap();
        old["version"] = serde_json::json!(1);
        assert!(matches!(
            decode_value(old),
            Err(SnapshotDecodeError::VersionMismatch { found: Some(1), .. })
        ));

        assert!(matches!(
            decode(r#"{"customers": []}"#),
            Err(SnapshotDecodeError::VersionMismatch { found: None, .. })
        ));
        assert!(matches!(
            decode("not json"),
            Err(SnapshotDecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_fills_missing_sections() {
        let snapshot = decode(r#"{"version": 2, "customers": []}"#).unwrap();
        assert_eq!(snapshot.services.len(), 4);
        assert_eq!(snapshot.settings.shop_name, "Barberia Colombia");
        assert!(snapshot.orders.is_empty());
    }

    #[test]
    fn test_notifications_newest_first() {
        let mut snapshot = Snapshot::seeded();
        let now = Utc::now();
        snapshot.push_notification(Notification::new(NotificationKind::Info, "a", "first", now));
        snapshot.push_notification(Notification::new(NotificationKind::Info, "b", "second", now));
        assert_eq!(snapshot.notifications[0].message, "second");
        assert_eq!(snapshot.mark_notifications_read(), 2);
        assert_eq!(snapshot.mark_notifications_read(), 0);
    }
}
