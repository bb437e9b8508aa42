use anyhow::Result;
use crates::domain::{
    repositories::{dashboard::DashboardRepository, subscriptions::SubscriptionRepository},
    value_objects::{enums::plan_types::PlanType, plans::ContentGate},
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Resolves the effective plan for a user: an active subscription row, then the
/// `profiles.is_subscribed` flag, then free.
pub struct PlanResolver<S, D>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    D: DashboardRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    dashboard_repo: Arc<D>,
}

impl<S, D> PlanResolver<S, D>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    D: DashboardRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, dashboard_repo: Arc<D>) -> Self {
        Self {
            subscription_repo,
            dashboard_repo,
        }
    }

    pub async fn resolve_plan_type(&self, user_id: Uuid) -> Result<PlanType> {
        if let Some(subscription) = self
            .subscription_repo
            .find_current_subscription(user_id)
            .await?
        {
            if subscription.status().grants_plan() {
                debug!(
                    %user_id,
                    plan_type = %subscription.plan_type,
                    "plan_resolver: using active subscription plan"
                );
                return Ok(subscription.plan_type());
            }
        }

        let subscribed = self
            .subscription_repo
            .find_profile(user_id)
            .await?
            .map(|profile| profile.is_subscribed)
            .unwrap_or(false);

        if subscribed {
            debug!(%user_id, "plan_resolver: using profile subscription flag");
            return Ok(PlanType::Pro);
        }

        debug!(%user_id, "plan_resolver: falling back to free plan");
        Ok(PlanType::Free)
    }

    /// Plan, limit and live content count, recomputed on every call.
    pub async fn content_gate(&self, user_id: Uuid) -> Result<ContentGate> {
        let plan_type = self.resolve_plan_type(user_id).await?;
        let total_content = self.dashboard_repo.count_content(user_id).await?;

        Ok(ContentGate::new(plan_type, total_content))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use crates::domain::entities::{profiles::ProfileEntity, subscriptions::SubscriptionEntity};
    use uuid::Uuid;

    pub fn subscription(user_id: Uuid, plan_type: &str, status: &str) -> SubscriptionEntity {
        let now = Utc::now();
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            plan_type: plan_type.to_string(),
            status: status.to_string(),
            provider_subscription_id: Some("sub_123".to_string()),
            current_period_end: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn profile(user_id: Uuid, is_subscribed: bool, customer: Option<&str>) -> ProfileEntity {
        let now = Utc::now();
        ProfileEntity {
            id: user_id,
            email: Some("partner@example.com".to_string()),
            is_subscribed,
            stripe_customer_id: customer.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{profile, subscription};
    use super::*;
    use crates::domain::repositories::{
        dashboard::MockDashboardRepository, subscriptions::MockSubscriptionRepository,
    };
    use mockall::predicate::eq;

    fn resolver(
        subscription_repo: MockSubscriptionRepository,
        dashboard_repo: MockDashboardRepository,
    ) -> PlanResolver<MockSubscriptionRepository, MockDashboardRepository> {
        PlanResolver::new(Arc::new(subscription_repo), Arc::new(dashboard_repo))
    }

    #[tokio::test]
    async fn active_subscription_decides_the_plan() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_current_subscription()
            .with(eq(user_id))
            .returning(move |user_id| Ok(Some(subscription(user_id, "pro", "active"))));

        let plan = resolver(subscription_repo, MockDashboardRepository::new())
            .resolve_plan_type(user_id)
            .await
            .unwrap();

        assert_eq!(plan, PlanType::Pro);
    }

    #[tokio::test]
    async fn canceled_subscription_falls_back_to_profile_flag() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_current_subscription()
            .returning(move |user_id| Ok(Some(subscription(user_id, "pro", "canceled"))));
        subscription_repo
            .expect_find_profile()
            .with(eq(user_id))
            .returning(move |user_id| Ok(Some(profile(user_id, false, None))));

        let plan = resolver(subscription_repo, MockDashboardRepository::new())
            .resolve_plan_type(user_id)
            .await
            .unwrap();

        assert_eq!(plan, PlanType::Free);
    }

    #[tokio::test]
    async fn profile_flag_grants_pro_without_subscription_row() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_current_subscription()
            .returning(|_| Ok(None));
        subscription_repo
            .expect_find_profile()
            .returning(move |user_id| Ok(Some(profile(user_id, true, None))));

        let plan = resolver(subscription_repo, MockDashboardRepository::new())
            .resolve_plan_type(user_id)
            .await
            .unwrap();

        assert_eq!(plan, PlanType::Pro);
    }

    #[tokio::test]
    async fn free_partner_at_two_items_cannot_create() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_current_subscription()
            .returning(|_| Ok(None));
        subscription_repo.expect_find_profile().returning(|_| Ok(None));
        let mut dashboard_repo = MockDashboardRepository::new();
        dashboard_repo
            .expect_count_content()
            .with(eq(user_id))
            .returning(|_| Ok(2));

        let gate = resolver(subscription_repo, dashboard_repo)
            .content_gate(user_id)
            .await
            .unwrap();

        assert_eq!(gate.plan_type, PlanType::Free);
        assert_eq!(gate.content_limit, 2);
        assert_eq!(gate.total_content, 2);
        assert!(!gate.can_create_content);
    }

    #[tokio::test]
    async fn pro_partner_below_ten_can_create() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_current_subscription()
            .returning(move |user_id| Ok(Some(subscription(user_id, "pro", "trialing"))));
        let mut dashboard_repo = MockDashboardRepository::new();
        dashboard_repo.expect_count_content().returning(|_| Ok(9));

        let gate = resolver(subscription_repo, dashboard_repo)
            .content_gate(user_id)
            .await
            .unwrap();

        assert_eq!(gate.content_limit, 10);
        assert!(gate.can_create_content);
    }
}
