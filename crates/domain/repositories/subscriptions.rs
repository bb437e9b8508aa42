use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{
        profiles::ProfileEntity, subscriptions::SubscriptionEntity,
        transactions::InsertSubscriptionTransactionEntity,
    },
    value_objects::enums::{plan_types::PlanType, subscription_statuses::SubscriptionStatus},
};

/// Everything a confirmed subscription payment changes, applied in one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionActivation {
    pub user_id: Uuid,
    pub plan_type: PlanType,
    pub provider_subscription_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub payment: Option<InsertSubscriptionTransactionEntity>,
    pub grant_en_vedette: i32,
    pub grant_visibilite: i32,
}

#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    /// Most recently updated subscription row for the user, whatever its status.
    async fn find_current_subscription(&self, user_id: Uuid)
    -> Result<Option<SubscriptionEntity>>;

    async fn find_by_provider_subscription_id(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<SubscriptionEntity>>;

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<ProfileEntity>>;

    async fn save_stripe_customer_id(&self, user_id: Uuid, customer_id: &str) -> Result<()>;

    /// Upserts the subscription row, flags the profile as subscribed, stores the payment and
    /// grants credits. Returns false (and changes nothing) when the payment was already
    /// recorded.
    async fn activate_subscription(&self, activation: SubscriptionActivation) -> Result<bool>;

    /// Moves the row to `status`, drops it back to the free plan and clears
    /// `profiles.is_subscribed`. Returns the affected user, if any.
    async fn end_subscription(
        &self,
        provider_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<Option<Uuid>>;
}
