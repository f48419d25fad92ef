//! # Loyalty Commands
//!
//! Stamps, credit and vouchers outside of checkout.

use barberia_core::customers::lookup_customer;
use barberia_core::ledger::{self, Reconciliation};
use barberia_core::permissions::{require_owner, Module, Role};
use barberia_core::redemption::{self, Redemption};
use barberia_core::rewards::eligible_for_customer;
use barberia_core::{LedgerEntry, Money, Reward};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::SessionState;

/// Owner correction form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRequest {
    pub phone: String,
    pub delta_stamps: i64,
    pub delta_credit_pesos: i64,
    pub note: Option<String>,
}

/// Spends stamps on a voucher for a later checkout.
pub async fn redeem_reward(
    session: &SessionState,
    role: Role,
    phone: String,
    reward_id: u32,
) -> Result<Redemption, ApiError> {
    debug!(reward_id, "redeem_reward command");

    let redemption = session
        .transact(|s| {
            s.settings
                .permissions
                .require(role, Module::Customers, "redeem rewards")?;
            let phone = lookup_customer(s, &phone)?.phone.clone();
            redemption::redeem_reward(s, &phone, reward_id, Utc::now())
        })
        .await?;

    info!(
        reward_id,
        stamps_balance = redemption.customer.stamps_balance,
        "Reward redeemed"
    );
    Ok(redemption)
}

/// Owner-only manual correction, ledgered as `adjustment`.
pub async fn adjust_balance(
    session: &SessionState,
    role: Role,
    request: AdjustmentRequest,
) -> Result<LedgerEntry, ApiError> {
    debug!("adjust_balance command");

    let entry = session
        .transact(|s| {
            require_owner(role, "adjust balances")?;
            let phone = lookup_customer(s, &request.phone)?.phone.clone();
            ledger::adjust_balance(
                s,
                &phone,
                request.delta_stamps,
                Money::from_pesos(request.delta_credit_pesos),
                request.note,
                Utc::now(),
            )
        })
        .await?;

    info!(
        delta_stamps = entry.delta_stamps,
        delta_credit = %entry.delta_credit,
        "Balance adjusted"
    );
    Ok(entry)
}

/// Ledger sums next to the stored balances.
pub async fn reconcile_customer(
    session: &SessionState,
    role: Role,
    phone: String,
) -> Result<Reconciliation, ApiError> {
    debug!("reconcile_customer command");

    let reconciliation = session
        .read(|s| -> Result<_, ApiError> {
            s.settings
                .permissions
                .require(role, Module::History, "view the ledger")?;
            let customer = lookup_customer(s, &phone)?;
            Ok(ledger::reconcile(customer, &s.ledger))
        })
        .await?;

    if !reconciliation.is_balanced() {
        warn!(
            stamps_drift = reconciliation.stamps_drift,
            credit_drift = %reconciliation.credit_drift,
            "Balance does not match ledger"
        );
    }
    Ok(reconciliation)
}

/// Rewards the customer can use right now.
pub async fn eligible_rewards(
    session: &SessionState,
    role: Role,
    phone: String,
) -> Result<Vec<Reward>, ApiError> {
    debug!("eligible_rewards command");

    session
        .read(|s| -> Result<_, ApiError> {
            s.settings
                .permissions
                .require(role, Module::Walkin, "view rewards")?;
            let customer = lookup_customer(s, &phone)?;
            Ok(eligible_for_customer(s, customer, Utc::now())
                .into_iter()
                .cloned()
                .collect())
        })
        .await
}

/// The customer's ledger entries, oldest first.
pub async fn ledger_history(
    session: &SessionState,
    role: Role,
    phone: String,
) -> Result<Vec<LedgerEntry>, ApiError> {
    debug!("ledger_history command");

    session
        .read(|s| -> Result<_, ApiError> {
            s.settings
                .permissions
                .require(role, Module::History, "view the ledger")?;
            let customer = lookup_customer(s, &phone)?;
            Ok(s.ledger_for(&customer.phone).cloned().collect())
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::customer::find_or_create_customer;
    use crate::commands::test_support::session;
    use crate::error::ErrorCode;
    use barberia_core::LedgerReason;

    async fn with_ana(session: &SessionState) {
        find_or_create_customer(session, Role::Owner, "3001234567".into(), Some("Ana".into()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_adjust_then_redeem_stays_reconciled() {
        let session = session().await;
        with_ana(&session).await;

        let err = adjust_balance(
            &session,
            Role::Reception,
            AdjustmentRequest {
                phone: "3001234567".into(),
                delta_stamps: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let entry = adjust_balance(
            &session,
            Role::Owner,
            AdjustmentRequest {
                phone: "3001234567".into(),
                delta_stamps: 10,
                delta_credit_pesos: 5_000,
                note: Some("Migracion de tarjeta".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(entry.reason, LedgerReason::Adjustment);

        let rewards = eligible_rewards(&session, Role::Reception, "3001234567".into())
            .await
            .unwrap();
        assert!(rewards.iter().any(|r| r.id == 1));

        let redemption = redeem_reward(&session, Role::Reception, "3001234567".into(), 1)
            .await
            .unwrap();
        assert_eq!(redemption.customer.stamps_balance, 2);
        assert_eq!(redemption.customer.reward_vouchers, vec![1]);

        let reconciliation = reconcile_customer(&session, Role::Owner, "3001234567".into())
            .await
            .unwrap();
        assert!(reconciliation.is_balanced());

        let history = ledger_history(&session, Role::Owner, "3001234567".into())
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_redeem_without_stamps() {
        let session = session().await;
        with_ana(&session).await;

        let err = redeem_reward(&session, Role::Owner, "3001234567".into(), 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientBalance);
    }

    #[tokio::test]
    async fn test_negative_adjustment_rejected() {
        let session = session().await;
        with_ana(&session).await;

        let err = adjust_balance(
            &session,
            Role::Owner,
            AdjustmentRequest {
                phone: "3001234567".into(),
                delta_stamps: -1,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientBalance);
        assert!(ledger_history(&session, Role::Owner, "3001234567".into())
            .await
            .unwrap()
            .is_empty());
    }
}
