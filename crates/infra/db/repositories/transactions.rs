use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{boost_transactions, subscription_transactions},
    },
};
use domain::{
    entities::transactions::{BoostTransactionEntity, SubscriptionTransactionEntity},
    repositories::transactions::TransactionRepository,
};

pub struct TransactionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl TransactionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl TransactionRepository for TransactionPostgres {
    async fn list_boost_transactions(&self, user_id: Uuid) -> Result<Vec<BoostTransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = boost_transactions::table
            .filter(boost_transactions::user_id.eq(user_id))
            .order(boost_transactions::created_at.desc())
            .select(BoostTransactionEntity::as_select())
            .load::<BoostTransactionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_subscription_transactions(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<SubscriptionTransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = subscription_transactions::table
            .filter(subscription_transactions::user_id.eq(user_id))
            .order(subscription_transactions::created_at.desc())
            .select(SubscriptionTransactionEntity::as_select())
            .load::<SubscriptionTransactionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_boost_transaction(
        &self,
        user_id: Uuid,
        payment_intent_id: &str,
    ) -> Result<Option<BoostTransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = boost_transactions::table
            .filter(boost_transactions::user_id.eq(user_id))
            .filter(boost_transactions::stripe_payment_intent_id.eq(payment_intent_id))
            .select(BoostTransactionEntity::as_select())
            .first::<BoostTransactionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_subscription_transaction(
        &self,
        user_id: Uuid,
        payment_intent_id: &str,
    ) -> Result<Option<SubscriptionTransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscription_transactions::table
            .filter(subscription_transactions::user_id.eq(user_id))
            .filter(subscription_transactions::stripe_payment_intent_id.eq(payment_intent_id))
            .select(SubscriptionTransactionEntity::as_select())
            .first::<SubscriptionTransactionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }
}
