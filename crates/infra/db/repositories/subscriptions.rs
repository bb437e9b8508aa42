use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use super::boosts::add_credits;
use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{profiles, subscription_transactions, subscriptions},
    },
};
use domain::{
    entities::{
        profiles::ProfileEntity,
        subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
    },
    repositories::subscriptions::{SubscriptionActivation, SubscriptionRepository},
    value_objects::enums::{plan_types::PlanType, subscription_statuses::SubscriptionStatus},
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn find_current_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .order(subscriptions::updated_at.desc())
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_provider_subscription_id(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscriptions::table
            .filter(subscriptions::provider_subscription_id.eq(provider_subscription_id))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = profiles::table
            .filter(profiles::id.eq(user_id))
            .select(ProfileEntity::as_select())
            .first::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn save_stripe_customer_id(&self, user_id: Uuid, customer_id: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        insert_into(profiles::table)
            .values((
                profiles::id.eq(user_id),
                profiles::stripe_customer_id.eq(Some(customer_id)),
                profiles::updated_at.eq(now),
            ))
            .on_conflict(profiles::id)
            .do_update()
            .set((
                profiles::stripe_customer_id.eq(Some(customer_id)),
                profiles::updated_at.eq(now),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn activate_subscription(&self, activation: SubscriptionActivation) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let activated = conn.transaction::<_, anyhow::Error, _>(|conn| {
            if let Some(payment) = activation.payment.as_ref() {
                let inserted = insert_into(subscription_transactions::table)
                    .values(payment)
                    .on_conflict(subscription_transactions::stripe_payment_intent_id)
                    .do_nothing()
                    .execute(conn)?;

                if inserted == 0 {
                    return Ok(false);
                }
            }

            let existing = subscriptions::table
                .filter(subscriptions::user_id.eq(activation.user_id))
                .order(subscriptions::updated_at.desc())
                .select(subscriptions::id)
                .for_update()
                .first::<Uuid>(conn)
                .optional()?;

            match existing {
                Some(subscription_id) => {
                    diesel::update(subscriptions::table.filter(subscriptions::id.eq(subscription_id)))
                        .set((
                            subscriptions::plan_type.eq(activation.plan_type.to_string()),
                            subscriptions::status.eq(SubscriptionStatus::Active.to_string()),
                            subscriptions::current_period_end.eq(activation.current_period_end),
                            subscriptions::updated_at.eq(now),
                        ))
                        .execute(conn)?;

                    if let Some(provider_subscription_id) =
                        activation.provider_subscription_id.as_deref()
                    {
                        diesel::update(
                            subscriptions::table.filter(subscriptions::id.eq(subscription_id)),
                        )
                        .set(subscriptions::provider_subscription_id.eq(provider_subscription_id))
                        .execute(conn)?;
                    }
                }
                None => {
                    insert_into(subscriptions::table)
                        .values(&InsertSubscriptionEntity {
                            user_id: activation.user_id,
                            plan_type: activation.plan_type.to_string(),
                            status: SubscriptionStatus::Active.to_string(),
                            provider_subscription_id: activation.provider_subscription_id.clone(),
                            current_period_end: activation.current_period_end,
                        })
                        .execute(conn)?;
                }
            }

            let is_subscribed = activation.plan_type == PlanType::Pro;
            insert_into(profiles::table)
                .values((
                    profiles::id.eq(activation.user_id),
                    profiles::is_subscribed.eq(is_subscribed),
                    profiles::updated_at.eq(now),
                ))
                .on_conflict(profiles::id)
                .do_update()
                .set((
                    profiles::is_subscribed.eq(is_subscribed),
                    profiles::updated_at.eq(now),
                ))
                .execute(conn)?;

            if activation.grant_en_vedette > 0 || activation.grant_visibilite > 0 {
                add_credits(
                    conn,
                    activation.user_id,
                    activation.grant_en_vedette,
                    activation.grant_visibilite,
                )?;
            }

            Ok(true)
        })?;

        Ok(activated)
    }

    async fn end_subscription(
        &self,
        provider_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<Option<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let user_id = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let user_id = diesel::update(
                subscriptions::table
                    .filter(subscriptions::provider_subscription_id.eq(provider_subscription_id)),
            )
            .set((
                subscriptions::status.eq(status.to_string()),
                subscriptions::plan_type.eq(PlanType::Free.to_string()),
                subscriptions::updated_at.eq(now),
            ))
            .returning(subscriptions::user_id)
            .get_result::<Uuid>(conn)
            .optional()?;

            if let Some(user_id) = user_id {
                diesel::update(profiles::table.filter(profiles::id.eq(user_id)))
                    .set((profiles::is_subscribed.eq(false), profiles::updated_at.eq(now)))
                    .execute(conn)?;
            }

            Ok(user_id)
        })?;

        Ok(user_id)
    }
}
