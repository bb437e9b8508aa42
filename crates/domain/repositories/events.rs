use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::events::{
    EventCommerceEntity, EventEntity, InsertEventEntity, UpdateEventEntity,
};

#[automock]
#[async_trait]
pub trait EventRepository {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<EventEntity>>;

    async fn list_event_commerces(&self, event_ids: Vec<Uuid>) -> Result<Vec<EventCommerceEntity>>;

    /// Same limit contract as offers; junction rows are written in the same transaction.
    async fn create_within_limit(
        &self,
        insert_event_entity: InsertEventEntity,
        additional_commerce_ids: Vec<Uuid>,
        content_limit: i64,
    ) -> Result<Option<EventEntity>>;

    /// Replaces the event columns and its junction rows.
    async fn update(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        update_event_entity: UpdateEventEntity,
        additional_commerce_ids: Vec<Uuid>,
    ) -> Result<Option<EventEntity>>;

    async fn delete(&self, user_id: Uuid, event_id: Uuid) -> Result<bool>;
}
