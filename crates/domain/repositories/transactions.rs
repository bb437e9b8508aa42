use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::transactions::{BoostTransactionEntity, SubscriptionTransactionEntity};

#[automock]
#[async_trait]
pub trait TransactionRepository {
    async fn list_boost_transactions(&self, user_id: Uuid) -> Result<Vec<BoostTransactionEntity>>;

    async fn list_subscription_transactions(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<SubscriptionTransactionEntity>>;

    async fn find_boost_transaction(
        &self,
        user_id: Uuid,
        payment_intent_id: &str,
    ) -> Result<Option<BoostTransactionEntity>>;

    async fn find_subscription_transaction(
        &self,
        user_id: Uuid,
        payment_intent_id: &str,
    ) -> Result<Option<SubscriptionTransactionEntity>>;
}
