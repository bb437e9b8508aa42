use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use crates::domain::{
    repositories::{
        boosts::BoostRepository, dashboard::DashboardRepository,
        subscriptions::SubscriptionRepository,
    },
    value_objects::{boosts::boost_duration, dashboard::DashboardSnapshot},
};
use tracing::debug;
use uuid::Uuid;

use crate::usecases::plan_resolver::PlanResolver;

pub struct DashboardUseCase<B, S, D>
where
    B: BoostRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    D: DashboardRepository + Send + Sync + 'static,
{
    boost_repo: Arc<B>,
    dashboard_repo: Arc<D>,
    plan_resolver: Arc<PlanResolver<S, D>>,
}

impl<B, S, D> DashboardUseCase<B, S, D>
where
    B: BoostRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    D: DashboardRepository + Send + Sync + 'static,
{
    pub fn new(
        boost_repo: Arc<B>,
        dashboard_repo: Arc<D>,
        plan_resolver: Arc<PlanResolver<S, D>>,
    ) -> Self {
        Self {
            boost_repo,
            dashboard_repo,
            plan_resolver,
        }
    }

    pub async fn refresh(&self, user_id: Uuid) -> Result<DashboardSnapshot> {
        self.refresh_at(user_id, Utc::now()).await
    }

    /// Every figure is re-read; nothing is cached between calls.
    pub async fn refresh_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<DashboardSnapshot> {
        let boost_cutoff = now - boost_duration();
        let counts = self
            .dashboard_repo
            .dashboard_counts(user_id, boost_cutoff)
            .await?;
        let credits = self.boost_repo.find_credits(user_id).await?;
        let content_gate = self.plan_resolver.content_gate(user_id).await?;

        debug!(
            %user_id,
            total_content = content_gate.total_content,
            can_create_content = content_gate.can_create_content,
            "dashboard: snapshot refreshed"
        );

        Ok(DashboardSnapshot::new(counts, credits, content_gate, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::plan_resolver::test_support::profile;
    use chrono::Duration;
    use crates::domain::{
        repositories::{
            boosts::MockBoostRepository, dashboard::MockDashboardRepository,
            subscriptions::MockSubscriptionRepository,
        },
        value_objects::{
            boosts::BoostCredits, dashboard::DashboardCounts, enums::plan_types::PlanType,
        },
    };
    use mockall::predicate::eq;

    #[tokio::test]
    async fn snapshot_uses_72h_cutoff_and_live_gate() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let mut dashboard_repo = MockDashboardRepository::new();
        dashboard_repo
            .expect_dashboard_counts()
            .with(eq(user_id), eq(now - Duration::hours(72)))
            .returning(|_, _| {
                Ok(DashboardCounts {
                    commerces: 1,
                    offers: 1,
                    events: 1,
                    boosted_commerces: 1,
                    boosted_offers: 0,
                    boosted_events: 0,
                })
            });
        dashboard_repo
            .expect_count_content()
            .with(eq(user_id))
            .returning(|_| Ok(2));
        let dashboard_repo = Arc::new(dashboard_repo);

        let mut boost_repo = MockBoostRepository::new();
        boost_repo.expect_find_credits().returning(|_| {
            Ok(BoostCredits {
                available_en_vedette: 0,
                available_visibilite: 1,
            })
        });

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_current_subscription()
            .returning(|_| Ok(None));
        subscription_repo
            .expect_find_profile()
            .returning(|user_id| Ok(Some(profile(user_id, false, None))));

        let plan_resolver = PlanResolver::new(Arc::new(subscription_repo), Arc::clone(&dashboard_repo));
        let snapshot = DashboardUseCase::new(
            Arc::new(boost_repo),
            dashboard_repo,
            Arc::new(plan_resolver),
        )
        .refresh_at(user_id, now)
        .await
        .unwrap();

        assert_eq!(snapshot.commerce_count, 1);
        assert_eq!(snapshot.boosted_commerces, 1);
        assert_eq!(snapshot.credits.available_visibilite, 1);
        assert_eq!(snapshot.content_gate.plan_type, PlanType::Free);
        assert!(!snapshot.content_gate.can_create_content);
        assert_eq!(snapshot.generated_at, now);
    }

    #[tokio::test]
    async fn repository_failure_propagates() {
        let mut dashboard_repo = MockDashboardRepository::new();
        dashboard_repo
            .expect_dashboard_counts()
            .returning(|_, _| Err(anyhow::anyhow!("connection reset")));
        let dashboard_repo = Arc::new(dashboard_repo);
        let plan_resolver = PlanResolver::new(
            Arc::new(MockSubscriptionRepository::new()),
            Arc::clone(&dashboard_repo),
        );

        let result = DashboardUseCase::new(
            Arc::new(MockBoostRepository::new()),
            dashboard_repo,
            Arc::new(plan_resolver),
        )
        .refresh(Uuid::new_v4())
        .await;

        assert!(result.is_err());
    }
}
