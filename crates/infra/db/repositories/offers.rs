use anyhow::Result;
use async_trait::async_trait;
use diesel::{PgConnection, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use super::content_counts::{count_user_content, lock_user_content};
use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{offer_commerces, offers},
    },
};
use domain::{
    entities::offers::{InsertOfferEntity, OfferCommerceEntity, OfferEntity, UpdateOfferEntity},
    repositories::offers::OfferRepository,
};

pub struct OfferPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl OfferPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn replace_offer_commerces(
    conn: &mut PgConnection,
    offer_id: Uuid,
    commerce_ids: &[Uuid],
) -> QueryResult<()> {
    diesel::delete(offer_commerces::table.filter(offer_commerces::offer_id.eq(offer_id)))
        .execute(conn)?;

    if commerce_ids.is_empty() {
        return Ok(());
    }

    let rows: Vec<OfferCommerceEntity> = commerce_ids
        .iter()
        .map(|commerce_id| OfferCommerceEntity {
            offer_id,
            commerce_id: *commerce_id,
        })
        .collect();

    insert_into(offer_commerces::table)
        .values(&rows)
        .on_conflict_do_nothing()
        .execute(conn)?;

    Ok(())
}

#[async_trait]
impl OfferRepository for OfferPostgres {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<OfferEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = offers::table
            .filter(offers::user_id.eq(user_id))
            .order(offers::created_at.desc())
            .select(OfferEntity::as_select())
            .load::<OfferEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_offer_commerces(&self, offer_ids: Vec<Uuid>) -> Result<Vec<OfferCommerceEntity>> {
        if offer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = offer_commerces::table
            .filter(offer_commerces::offer_id.eq_any(offer_ids))
            .order((offer_commerces::offer_id, offer_commerces::commerce_id))
            .load::<OfferCommerceEntity>(&mut conn)?;

        Ok(results)
    }

    async fn create_within_limit(
        &self,
        insert_offer_entity: InsertOfferEntity,
        additional_commerce_ids: Vec<Uuid>,
        content_limit: i64,
    ) -> Result<Option<OfferEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = conn.transaction::<_, anyhow::Error, _>(|conn| {
            lock_user_content(conn, insert_offer_entity.user_id)?;

            if count_user_content(conn, insert_offer_entity.user_id)? >= content_limit {
                return Ok(None);
            }

            let offer = insert_into(offers::table)
                .values(&insert_offer_entity)
                .returning(OfferEntity::as_returning())
                .get_result::<OfferEntity>(conn)?;

            replace_offer_commerces(conn, offer.id, &additional_commerce_ids)?;

            Ok(Some(offer))
        })?;

        Ok(created)
    }

    async fn update(
        &self,
        user_id: Uuid,
        offer_id: Uuid,
        update_offer_entity: UpdateOfferEntity,
        additional_commerce_ids: Vec<Uuid>,
    ) -> Result<Option<OfferEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let offer = diesel::update(
                offers::table
                    .filter(offers::id.eq(offer_id))
                    .filter(offers::user_id.eq(user_id)),
            )
            .set(&update_offer_entity)
            .returning(OfferEntity::as_returning())
            .get_result::<OfferEntity>(conn)
            .optional()?;

            if let Some(offer) = offer.as_ref() {
                replace_offer_commerces(conn, offer.id, &additional_commerce_ids)?;
            }

            Ok(offer)
        })?;

        Ok(updated)
    }

    async fn delete(&self, user_id: Uuid, offer_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let owned = offers::table
                .filter(offers::id.eq(offer_id))
                .filter(offers::user_id.eq(user_id))
                .select(offers::id)
                .for_update()
                .first::<Uuid>(conn)
                .optional()?;

            if owned.is_none() {
                return Ok(false);
            }

            diesel::delete(offer_commerces::table.filter(offer_commerces::offer_id.eq(offer_id)))
                .execute(conn)?;
            diesel::delete(offers::table.filter(offers::id.eq(offer_id))).execute(conn)?;

            Ok(true)
        })?;

        Ok(deleted)
    }
}
