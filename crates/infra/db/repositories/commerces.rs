use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{PgConnection, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{commerces, event_commerces, events, offer_commerces, offers},
    },
};
use domain::{
    entities::commerces::{CommerceEntity, InsertCommerceEntity, UpdateCommerceEntity},
    repositories::commerces::CommerceRepository,
    value_objects::commerces::CommerceDeletionSummary,
};

pub struct CommercePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CommercePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

/// Moves offers whose primary commerce is going away to their next associated commerce,
/// or deletes them when there is none. Returns (reassigned, deleted).
fn detach_offers(conn: &mut PgConnection, commerce_id: Uuid) -> QueryResult<(usize, usize)> {
    let now = Utc::now();
    let offer_ids = offers::table
        .filter(offers::commerce_id.eq(commerce_id))
        .select(offers::id)
        .load::<Uuid>(conn)?;

    let (mut reassigned, mut deleted) = (0, 0);
    for offer_id in offer_ids {
        let next_commerce = offer_commerces::table
            .filter(offer_commerces::offer_id.eq(offer_id))
            .filter(offer_commerces::commerce_id.ne(commerce_id))
            .select(offer_commerces::commerce_id)
            .order(offer_commerces::commerce_id.asc())
            .first::<Uuid>(conn)
            .optional()?;

        match next_commerce {
            Some(next_commerce) => {
                diesel::update(offers::table.filter(offers::id.eq(offer_id)))
                    .set((
                        offers::commerce_id.eq(next_commerce),
                        offers::updated_at.eq(now),
                    ))
                    .execute(conn)?;
                diesel::delete(
                    offer_commerces::table
                        .filter(offer_commerces::offer_id.eq(offer_id))
                        .filter(offer_commerces::commerce_id.eq(next_commerce)),
                )
                .execute(conn)?;
                reassigned += 1;
            }
            None => {
                diesel::delete(
                    offer_commerces::table.filter(offer_commerces::offer_id.eq(offer_id)),
                )
                .execute(conn)?;
                diesel::delete(offers::table.filter(offers::id.eq(offer_id))).execute(conn)?;
                deleted += 1;
            }
        }
    }

    diesel::delete(offer_commerces::table.filter(offer_commerces::commerce_id.eq(commerce_id)))
        .execute(conn)?;

    Ok((reassigned, deleted))
}

fn detach_events(conn: &mut PgConnection, commerce_id: Uuid) -> QueryResult<(usize, usize)> {
    let now = Utc::now();
    let event_ids = events::table
        .filter(events::commerce_id.eq(commerce_id))
        .select(events::id)
        .load::<Uuid>(conn)?;

    let (mut reassigned, mut deleted) = (0, 0);
    for event_id in event_ids {
        let next_commerce = event_commerces::table
            .filter(event_commerces::event_id.eq(event_id))
            .filter(event_commerces::commerce_id.ne(commerce_id))
            .select(event_commerces::commerce_id)
            .order(event_commerces::commerce_id.asc())
            .first::<Uuid>(conn)
            .optional()?;

        match next_commerce {
            Some(next_commerce) => {
                diesel::update(events::table.filter(events::id.eq(event_id)))
                    .set((
                        events::commerce_id.eq(next_commerce),
                        events::updated_at.eq(now),
                    ))
                    .execute(conn)?;
                diesel::delete(
                    event_commerces::table
                        .filter(event_commerces::event_id.eq(event_id))
                        .filter(event_commerces::commerce_id.eq(next_commerce)),
                )
                .execute(conn)?;
                reassigned += 1;
            }
            None => {
                diesel::delete(
                    event_commerces::table.filter(event_commerces::event_id.eq(event_id)),
                )
                .execute(conn)?;
                diesel::delete(events::table.filter(events::id.eq(event_id))).execute(conn)?;
                deleted += 1;
            }
        }
    }

    diesel::delete(event_commerces::table.filter(event_commerces::commerce_id.eq(commerce_id)))
        .execute(conn)?;

    Ok((reassigned, deleted))
}

#[async_trait]
impl CommerceRepository for CommercePostgres {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<CommerceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = commerces::table
            .filter(commerces::user_id.eq(user_id))
            .order(commerces::created_at.desc())
            .select(CommerceEntity::as_select())
            .load::<CommerceEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_by_id(
        &self,
        user_id: Uuid,
        commerce_id: Uuid,
    ) -> Result<Option<CommerceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = commerces::table
            .filter(commerces::id.eq(commerce_id))
            .filter(commerces::user_id.eq(user_id))
            .select(CommerceEntity::as_select())
            .first::<CommerceEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn count_owned(&self, user_id: Uuid, commerce_ids: Vec<Uuid>) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = commerces::table
            .filter(commerces::user_id.eq(user_id))
            .filter(commerces::id.eq_any(commerce_ids))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn create(&self, insert_commerce_entity: InsertCommerceEntity) -> Result<CommerceEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(commerces::table)
            .values(&insert_commerce_entity)
            .returning(CommerceEntity::as_returning())
            .get_result::<CommerceEntity>(&mut conn)?;

        Ok(result)
    }

    async fn update(
        &self,
        user_id: Uuid,
        commerce_id: Uuid,
        update_commerce_entity: UpdateCommerceEntity,
    ) -> Result<Option<CommerceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = diesel::update(
            commerces::table
                .filter(commerces::id.eq(commerce_id))
                .filter(commerces::user_id.eq(user_id)),
        )
        .set(&update_commerce_entity)
        .returning(CommerceEntity::as_returning())
        .get_result::<CommerceEntity>(&mut conn)
        .optional()?;

        Ok(result)
    }

    async fn delete_cascade(
        &self,
        user_id: Uuid,
        commerce_id: Uuid,
    ) -> Result<Option<CommerceDeletionSummary>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let summary = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let owned = commerces::table
                .filter(commerces::id.eq(commerce_id))
                .filter(commerces::user_id.eq(user_id))
                .select(commerces::id)
                .for_update()
                .first::<Uuid>(conn)
                .optional()?;

            if owned.is_none() {
                return Ok(None);
            }

            let (reassigned_offers, deleted_offers) = detach_offers(conn, commerce_id)?;
            let (reassigned_events, deleted_events) = detach_events(conn, commerce_id)?;

            diesel::delete(commerces::table.filter(commerces::id.eq(commerce_id)))
                .execute(conn)?;

            Ok(Some(CommerceDeletionSummary {
                reassigned_offers,
                deleted_offers,
                reassigned_events,
                deleted_events,
            }))
        })?;

        Ok(summary)
    }
}
