//! # Customer Commands

use barberia_core::customers::{self, CustomerSummary, DeletionSummary, ProfileUpdate};
use barberia_core::permissions::{require_owner, Module, Role};
use barberia_core::Customer;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::SessionState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub customer: Customer,
    pub created: bool,
}

/// Phone-first registration: returns the customer for `phone`, creating
/// them with `name` on a first visit.
pub async fn find_or_create_customer(
    session: &SessionState,
    role: Role,
    phone: String,
    name: Option<String>,
) -> Result<CustomerResponse, ApiError> {
    debug!("find_or_create_customer command");

    let (customer, created) = session
        .transact(|s| {
            s.settings
                .permissions
                .require(role, Module::Customers, "register customers")?;
            customers::find_or_create_customer(s, &phone, name.as_deref(), Utc::now())
        })
        .await?;

    if created {
        info!(customer_id = %customer.id, "Customer registered");
    }
    Ok(CustomerResponse { customer, created })
}

pub async fn lookup_customer(
    session: &SessionState,
    role: Role,
    phone: String,
) -> Result<Customer, ApiError> {
    debug!("lookup_customer command");

    session
        .read(|s| -> Result<_, ApiError> {
            s.settings
                .permissions
                .require(role, Module::Customers, "view customers")?;
            Ok(customers::lookup_customer(s, &phone)?.clone())
        })
        .await
}

pub async fn search_customers(
    session: &SessionState,
    role: Role,
    query: String,
) -> Result<Vec<Customer>, ApiError> {
    debug!(query = %query, "search_customers command");

    session
        .read(|s| -> Result<_, ApiError> {
            s.settings
                .permissions
                .require(role, Module::Customers, "search customers")?;
            Ok(customers::search_customers(s, &query)
                .into_iter()
                .cloned()
                .collect())
        })
        .await
}

pub async fn update_profile(
    session: &SessionState,
    role: Role,
    phone: String,
    update: ProfileUpdate,
) -> Result<Customer, ApiError> {
    debug!("update_profile command");

    let customer = session
        .transact(|s| {
            s.settings
                .permissions
                .require(role, Module::Customers, "edit customers")?;
            customers::update_profile(s, &phone, update)
        })
        .await?;

    info!(customer_id = %customer.id, "Customer profile updated");
    Ok(customer)
}

/// Owner-only. Removes the customer with their orders, appointments, tips
/// and ledger entries.
pub async fn delete_customer(
    session: &SessionState,
    role: Role,
    phone: String,
) -> Result<DeletionSummary, ApiError> {
    debug!("delete_customer command");

    let summary = session
        .transact(|s| {
            require_owner(role, "delete customers")?;
            customers::delete_customer(s, &phone)
        })
        .await?;

    info!(
        orders = summary.orders,
        appointments = summary.appointments,
        ledger_entries = summary.ledger_entries,
        "Customer deleted"
    );
    Ok(summary)
}

pub async fn get_customer_summary(
    session: &SessionState,
    role: Role,
    phone: String,
) -> Result<CustomerSummary, ApiError> {
    debug!("get_customer_summary command");

    session
        .read(|s| -> Result<_, ApiError> {
            s.settings
                .permissions
                .require(role, Module::Customers, "view customers")?;
            let customer = customers::lookup_customer(s, &phone)?;
            Ok(customers::customer_summary(s, &customer.phone, Utc::now())?)
        })
        .await
}
