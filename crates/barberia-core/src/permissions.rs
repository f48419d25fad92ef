//! # Permissions
//!
//! UI-level permission table: which staff role may open which module of
//! the front desk. This is a visibility table, not an authentication layer.
//!
//! ```text
//!                 owner  barber  reception
//! dashboard         ✓      ✓        ✓
//! walkin            ✓      ✓        ✓
//! appointments      ✓      ✓        ✓
//! customers         ✓               ✓
//! history           ✓               ✓
//! rewards           ✓
//! settings          ✓
//! exports           ✓
//! ```
//!
//! A handful of destructive actions are owner-only regardless of the table
//! (see [`require_owner`]).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Who is operating the front desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Owner,
    Barber,
    Reception,
    /// Self-service kiosk / customer portal
    Client,
}

impl Default for Role {
    fn default() -> Self {
        Role::Owner
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Owner => "owner",
            Role::Barber => "barber",
            Role::Reception => "reception",
            Role::Client => "client",
        };
        f.write_str(s)
    }
}

/// Front desk modules gated by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Dashboard,
    Walkin,
    Appointments,
    Customers,
    History,
    Rewards,
    Settings,
    Exports,
}

impl Module {
    pub const ALL: [Module; 8] = [
        Module::Dashboard,
        Module::Walkin,
        Module::Appointments,
        Module::Customers,
        Module::History,
        Module::Rewards,
        Module::Settings,
        Module::Exports,
    ];
}

/// Per-role access flags for one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoleAccess {
    pub owner: bool,
    pub barber: bool,
    pub reception: bool,
}

impl RoleAccess {
    const fn new(owner: bool, barber: bool, reception: bool) -> Self {
        Self {
            owner,
            barber,
            reception,
        }
    }
}

/// Module → role access. Missing modules deny everyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PermissionTable(BTreeMap<Module, RoleAccess>);

impl Default for PermissionTable {
    fn default() -> Self {
        let mut table = BTreeMap::new();
        table.insert(Module::Dashboard, RoleAccess::new(true, true, true));
        table.insert(Module::Walkin, RoleAccess::new(true, true, true));
        table.insert(Module::Appointments, RoleAccess::new(true, true, true));
        table.insert(Module::Customers, RoleAccess::new(true, false, true));
        table.insert(Module::History, RoleAccess::new(true, false, true));
        table.insert(Module::Rewards, RoleAccess::new(true, false, false));
        table.insert(Module::Settings, RoleAccess::new(true, false, false));
        table.insert(Module::Exports, RoleAccess::new(true, false, false));
        PermissionTable(table)
    }
}

impl PermissionTable {
    /// Looks up whether `role` may open `module`.
    pub fn can_access(&self, role: Role, module: Module) -> bool {
        let Some(access) = self.0.get(&module) else {
            return false;
        };
        match role {
            Role::Owner => access.owner,
            Role::Barber => access.barber,
            Role::Reception => access.reception,
            Role::Client => false,
        }
    }

    pub fn set(&mut self, module: Module, access: RoleAccess) {
        self.0.insert(module, access);
    }

    /// Fills modules missing from a stored table with the defaults.
    pub fn merged_with_defaults(mut self) -> Self {
        for (module, access) in PermissionTable::default().0 {
            self.0.entry(module).or_insert(access);
        }
        self
    }

    /// Rejects with `PermissionDenied` unless `role` may open `module`.
    pub fn require(&self, role: Role, module: Module, action: &str) -> CoreResult<()> {
        if self.can_access(role, module) {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied {
                role: role.to_string(),
                action: action.to_string(),
            })
        }
    }
}

/// Owner-only actions: deleting customers, manual balance corrections,
/// catalog edits.
pub fn require_owner(role: Role, action: &str) -> CoreResult<()> {
    if role == Role::Owner {
        Ok(())
    } else {
        Err(CoreError::PermissionDenied {
            role: role.to_string(),
            action: action.to_string(),
        })
    }
}
