//! # Report Commands

use barberia_core::permissions::{Module, Role};
use barberia_core::reports::{self, DailySummary, FollowUp};
use barberia_core::tips::tips_for_barber;
use barberia_core::Money;
use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::messaging::Dispatcher;
use crate::state::SessionState;

pub async fn daily_summary(
    session: &SessionState,
    role: Role,
    date: NaiveDate,
) -> Result<DailySummary, ApiError> {
    debug!(date = %date, "daily_summary command");

    session
        .read(|s| -> Result<_, ApiError> {
            s.settings
                .permissions
                .require(role, Module::Dashboard, "view the daily summary")?;
            Ok(reports::daily_summary(s, date))
        })
        .await
}

pub async fn barber_tips(
    session: &SessionState,
    role: Role,
    barber_id: u32,
) -> Result<Money, ApiError> {
    session
        .read(|s| -> Result<_, ApiError> {
            s.settings
                .permissions
                .require(role, Module::Dashboard, "view tips")?;
            Ok(tips_for_barber(s, barber_id))
        })
        .await
}

/// Customers due for a retouch or win-back message.
pub async fn due_follow_ups(session: &SessionState, role: Role) -> Result<Vec<FollowUp>, ApiError> {
    debug!("due_follow_ups command");

    session
        .read(|s| -> Result<_, ApiError> {
            s.settings
                .permissions
                .require(role, Module::Customers, "view follow-ups")?;
            Ok(reports::due_follow_ups(s, Utc::now()))
        })
        .await
}

/// Sends every due follow-up through the consent-gated dispatcher.
pub async fn send_follow_ups(
    session: &SessionState,
    dispatcher: &Dispatcher,
    role: Role,
) -> Result<usize, ApiError> {
    let due = due_follow_ups(session, role).await?;
    let count = due.len();

    dispatcher
        .dispatch_all(session, due.iter().map(FollowUp::intent).collect())
        .await;

    info!(count, "Follow-ups sent");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::checkout::{confirm_payment, start_walk_in};
    use crate::commands::test_support::{dispatcher, session};
    use crate::payment::NoPaymentLinks;
    use barberia_core::checkout::WalkInRequest;
    use barberia_core::{OrderStatus, FULL_HAIR_CUT};
    use chrono::Duration;

    #[tokio::test]
    async fn test_daily_summary_counts_paid_orders() {
        let session = session().await;
        let (dispatcher, _) = dispatcher();

        let walk_in = start_walk_in(
            &session,
            &dispatcher,
            &NoPaymentLinks,
            Role::Owner,
            WalkInRequest {
                phone: "3001234567".into(),
                name: Some("Ana".into()),
                barber_id: 2,
                services: vec![FULL_HAIR_CUT.into()],
                reward_id: None,
                notes: None,
            },
        )
        .await
        .unwrap();
        confirm_payment(&session, &dispatcher, Role::Owner, walk_in.walk_in.order.id.clone())
            .await
            .unwrap();

        let summary = daily_summary(&session, Role::Barber, Utc::now().date_naive())
            .await
            .unwrap();
        assert_eq!(summary.paid_orders, 1);
        assert_eq!(summary.revenue.pesos(), 35_000);
        assert_eq!(barber_tips(&session, Role::Owner, 2).await, Ok(Money::zero()));
    }

    #[tokio::test]
    async fn test_send_follow_ups() {
        let session = session().await;
        let (dispatcher, messenger) = dispatcher();

        // A paid visit 70 days ago
        session
            .transact(|s| {
                let when = Utc::now() - Duration::days(70);
                let mut ana = barberia_core::Customer::new("3001234567", "Ana", when);
                ana.last_visit = Some(when);
                s.customers.push(ana);
                let order = barberia_core::checkout::open_order(
                    s,
                    barberia_core::checkout::OrderDraft {
                        customer_phone: "3001234567".into(),
                        barber_id: 1,
                        services: vec![FULL_HAIR_CUT.into()],
                        reward_id: None,
                        appointment_id: None,
                    },
                    when,
                )?;
                barberia_core::settlement::settle_order(s, &order.id, when)?;
                Ok::<_, barberia_core::CoreError>(())
            })
            .await
            .unwrap();
        assert_eq!(
            session.read(|s| s.orders[0].status).await,
            OrderStatus::Paid
        );

        let due = due_follow_ups(&session, Role::Reception).await.unwrap();
        assert_eq!(due.len(), 1);

        assert_eq!(send_follow_ups(&session, &dispatcher, Role::Owner).await, Ok(1));
        let sent = messenger.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "3001234567");
    }
}
