//! # Customers
//!
//! Lookup, creation, profile edits and the owner-only delete cascade.
//!
//! The phone number is the customer key, so changing it rewrites the key on
//! every record that refers to the customer:
//!
//! ```text
//!  update_profile(phone: 300.. → 311..)
//!      │
//!      ├── customers[].phone
//!      ├── orders[].customer_phone
//!      ├── appointments[].customer_phone
//!      ├── ledger[].customer_phone
//!      └── tips[].customer_phone
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::rewards::{progress, RewardProgress};
use crate::snapshot::Snapshot;
use crate::tier::{recent_paid_visits, tier_for_visits};
use crate::types::{Customer, OrderStatus, Tier};
use crate::validation::{validate_customer_name, validate_email, validate_phone};

// =============================================================================
// Lookup / Creation
// =============================================================================

/// A customer ready to be used by an operation, plus whether it still has
/// to be inserted.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedCustomer {
    pub customer: Customer,
    pub is_new: bool,
}

/// Finds the customer for `raw_phone` or prepares a new one, without
/// touching the snapshot.
///
/// A non-blank `name` replaces the stored name of an existing customer;
/// a new customer requires one.
pub(crate) fn resolve_customer(
    snapshot: &Snapshot,
    raw_phone: &str,
    name: Option<&str>,
    now: DateTime<Utc>,
) -> CoreResult<ResolvedCustomer> {
    let phone = validate_phone(raw_phone)?;
    let name = name.map(str::trim).filter(|n| !n.is_empty());

    match snapshot.customer(&phone) {
        Some(existing) => {
            let mut customer = existing.clone();
            if let Some(name) = name {
                customer.name = validate_customer_name(name)?;
            }
            Ok(ResolvedCustomer {
                customer,
                is_new: false,
            })
        }
        None => {
            let name = validate_customer_name(name.unwrap_or_default())?;
            Ok(ResolvedCustomer {
                customer: Customer::new(phone, name, now),
                is_new: true,
            })
        }
    }
}

/// Writes a resolved customer back (insert or replace).
pub(crate) fn store_customer(snapshot: &mut Snapshot, resolved: ResolvedCustomer) {
    if resolved.is_new {
        snapshot.customers.push(resolved.customer);
    } else if let Some(slot) = snapshot.customer_mut(&resolved.customer.phone) {
        *slot = resolved.customer;
    }
}

/// Finds a customer by phone, creating them on first visit.
///
/// Returns the stored customer and whether it was created.
pub fn find_or_create_customer(
    snapshot: &mut Snapshot,
    raw_phone: &str,
    name: Option<&str>,
    now: DateTime<Utc>,
) -> CoreResult<(Customer, bool)> {
    let resolved = resolve_customer(snapshot, raw_phone, name, now)?;
    let result = (resolved.customer.clone(), resolved.is_new);
    store_customer(snapshot, resolved);
    Ok(result)
}

/// Looks up a stored customer by any phone spelling.
pub fn lookup_customer<'a>(snapshot: &'a Snapshot, raw_phone: &str) -> CoreResult<&'a Customer> {
    let phone = validate_phone(raw_phone)?;
    snapshot
        .customer(&phone)
        .ok_or(CoreError::CustomerNotFound(phone))
}

/// Case-insensitive match on name, or digit match on phone.
pub fn search_customers<'a>(snapshot: &'a Snapshot, query: &str) -> Vec<&'a Customer> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return snapshot.customers.iter().collect();
    }
    let digits: String = query.chars().filter(|c| c.is_ascii_digit()).collect();

    snapshot
        .customers
        .iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&query)
                || (!digits.is_empty() && c.phone.contains(&digits))
        })
        .collect()
}

// =============================================================================
// Profile
// =============================================================================

/// Fields a customer (or the front desk) may change. `None` leaves a field
/// as is; an empty email clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub opt_in: Option<bool>,
}

/// Applies a profile edit, cascading a phone change to every dependent
/// record.
pub fn update_profile(
    snapshot: &mut Snapshot,
    phone: &str,
    update: ProfileUpdate,
) -> CoreResult<Customer> {
    let mut customer = snapshot
        .customer(phone)
        .cloned()
        .ok_or_else(|| CoreError::CustomerNotFound(phone.to_string()))?;

    if let Some(name) = update.name.as_deref() {
        customer.name = validate_customer_name(name)?;
    }
    if let Some(email) = update.email.as_deref() {
        customer.email = validate_email(Some(email))?;
    }
    if let Some(opt_in) = update.opt_in {
        customer.opt_in = opt_in;
    }

    let new_phone = match update.phone.as_deref() {
        Some(raw) => validate_phone(raw)?,
        None => customer.phone.clone(),
    };
    if new_phone != phone && snapshot.customer(&new_phone).is_some() {
        return Err(ValidationError::Duplicate {
            field: "phone".to_string(),
            value: new_phone,
        }
        .into());
    }
    customer.phone = new_phone.clone();

    if new_phone != phone {
        rekey_customer(snapshot, phone, &new_phone);
    }
    if let Some(slot) = snapshot.customer_mut(&new_phone) {
        *slot = customer.clone();
    }
    Ok(customer)
}

fn rekey_customer(snapshot: &mut Snapshot, old: &str, new: &str) {
    for c in snapshot.customers.iter_mut().filter(|c| c.phone == old) {
        c.phone = new.to_string();
    }
    for o in snapshot.orders.iter_mut().filter(|o| o.customer_phone == old) {
        o.customer_phone = new.to_string();
    }
    for a in snapshot
        .appointments
        .iter_mut()
        .filter(|a| a.customer_phone == old)
    {
        a.customer_phone = new.to_string();
    }
    for e in snapshot.ledger.iter_mut().filter(|e| e.customer_phone == old) {
        e.customer_phone = new.to_string();
    }
    for t in snapshot.tips.iter_mut().filter(|t| t.customer_phone == old) {
        t.customer_phone = new.to_string();
    }
}

// =============================================================================
// Deletion
// =============================================================================

/// What a customer deletion removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeletionSummary {
    pub orders: usize,
    pub appointments: usize,
    pub tips: usize,
    pub ledger_entries: usize,
}

/// Removes a customer and everything that refers to them.
///
/// Callers gate this behind the owner role.
pub fn delete_customer(snapshot: &mut Snapshot, phone: &str) -> CoreResult<DeletionSummary> {
    if snapshot.customer(phone).is_none() {
        return Err(CoreError::CustomerNotFound(phone.to_string()));
    }

    fn drain<T>(items: &mut Vec<T>, belongs: impl Fn(&T) -> bool) -> usize {
        let before = items.len();
        items.retain(|item| !belongs(item));
        before - items.len()
    }

    snapshot.customers.retain(|c| c.phone != phone);
    Ok(DeletionSummary {
        orders: drain(&mut snapshot.orders, |o| o.customer_phone == phone),
        appointments: drain(&mut snapshot.appointments, |a| a.customer_phone == phone),
        tips: drain(&mut snapshot.tips, |t| t.customer_phone == phone),
        ledger_entries: drain(&mut snapshot.ledger, |e| e.customer_phone == phone),
    })
}

// =============================================================================
// Summary
// =============================================================================

/// Profile card shown at the front desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerSummary {
    pub customer: Customer,
    /// Derived now, not the cached value
    pub tier: Tier,
    pub recent_visits: usize,
    pub paid_visits: usize,
    pub total_spent: Money,
    pub average_ticket: Money,
    pub next_reward: Option<RewardProgress>,
}

pub fn customer_summary(
    snapshot: &Snapshot,
    phone: &str,
    as_of: DateTime<Utc>,
) -> CoreResult<CustomerSummary> {
    let customer = snapshot
        .customer(phone)
        .ok_or_else(|| CoreError::CustomerNotFound(phone.to_string()))?;

    let paid: Vec<_> = snapshot
        .orders
        .iter()
        .filter(|o| o.customer_phone == phone && o.status == OrderStatus::Paid)
        .collect();
    let total_spent: Money = paid.iter().map(|o| o.total_paid).sum();
    let average_ticket = if paid.is_empty() {
        Money::zero()
    } else {
        Money::from_pesos(total_spent.pesos() / paid.len() as i64)
    };
    let recent_visits = recent_paid_visits(&snapshot.orders, phone, as_of);

    Ok(CustomerSummary {
        customer: customer.clone(),
        tier: tier_for_visits(recent_visits),
        recent_visits,
        paid_visits: paid.len(),
        total_spent,
        average_ticket,
        next_reward: progress(snapshot.catalog(), customer.stamps_balance),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
