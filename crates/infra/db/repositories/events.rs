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
        schema::{event_commerces, events},
    },
};
use domain::{
    entities::events::{EventCommerceEntity, EventEntity, InsertEventEntity, UpdateEventEntity},
    repositories::events::EventRepository,
};

pub struct EventPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl EventPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn replace_event_commerces(
    conn: &mut PgConnection,
    event_id: Uuid,
    commerce_ids: &[Uuid],
) -> QueryResult<()> {
    diesel::delete(event_commerces::table.filter(event_commerces::event_id.eq(event_id)))
        .execute(conn)?;

    if commerce_ids.is_empty() {
        return Ok(());
    }

    let rows: Vec<EventCommerceEntity> = commerce_ids
        .iter()
        .map(|commerce_id| EventCommerceEntity {
            event_id,
            commerce_id: *commerce_id,
        })
        .collect();

    insert_into(event_commerces::table)
        .values(&rows)
        .on_conflict_do_nothing()
        .execute(conn)?;

    Ok(())
}

#[async_trait]
impl EventRepository for EventPostgres {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<EventEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = events::table
            .filter(events::user_id.eq(user_id))
            .order(events::created_at.desc())
            .select(EventEntity::as_select())
            .load::<EventEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_event_commerces(&self, event_ids: Vec<Uuid>) -> Result<Vec<EventCommerceEntity>> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = event_commerces::table
            .filter(event_commerces::event_id.eq_any(event_ids))
            .order((event_commerces::event_id, event_commerces::commerce_id))
            .load::<EventCommerceEntity>(&mut conn)?;

        Ok(results)
    }

    async fn create_within_limit(
        &self,
        insert_event_entity: InsertEventEntity,
        additional_commerce_ids: Vec<Uuid>,
        content_limit: i64,
    ) -> Result<Option<EventEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = conn.transaction::<_, anyhow::Error, _>(|conn| {
            lock_user_content(conn, insert_event_entity.user_id)?;

            if count_user_content(conn, insert_event_entity.user_id)? >= content_limit {
                return Ok(None);
            }

            let event = insert_into(events::table)
                .values(&insert_event_entity)
                .returning(EventEntity::as_returning())
                .get_result::<EventEntity>(conn)?;

            replace_event_commerces(conn, event.id, &additional_commerce_ids)?;

            Ok(Some(event))
        })?;

        Ok(created)
    }

    async fn update(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        update_event_entity: UpdateEventEntity,
        additional_commerce_ids: Vec<Uuid>,
    ) -> Result<Option<EventEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let event = diesel::update(
                events::table
                    .filter(events::id.eq(event_id))
                    .filter(events::user_id.eq(user_id)),
            )
            .set(&update_event_entity)
            .returning(EventEntity::as_returning())
            .get_result::<EventEntity>(conn)
            .optional()?;

            if let Some(event) = event.as_ref() {
                replace_event_commerces(conn, event.id, &additional_commerce_ids)?;
            }

            Ok(event)
        })?;

        Ok(updated)
    }

    async fn delete(&self, user_id: Uuid, event_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let owned = events::table
                .filter(events::id.eq(event_id))
                .filter(events::user_id.eq(user_id))
                .select(events::id)
                .for_update()
                .first::<Uuid>(conn)
                .optional()?;

            if owned.is_none() {
                return Ok(false);
            }

            diesel::delete(event_commerces::table.filter(event_commerces::event_id.eq(event_id)))
                .execute(conn)?;
            diesel::delete(events::table.filter(events::id.eq(event_id))).execute(conn)?;

            Ok(true)
        })?;

        Ok(deleted)
    }
}
