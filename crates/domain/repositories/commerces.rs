use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::commerces::{CommerceEntity, InsertCommerceEntity, UpdateCommerceEntity},
    value_objects::commerces::CommerceDeletionSummary,
};

#[automock]
#[async_trait]
pub trait CommerceRepository {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<CommerceEntity>>;

    async fn find_by_id(&self, user_id: Uuid, commerce_id: Uuid)
    -> Result<Option<CommerceEntity>>;

    /// How many of `commerce_ids` belong to the user.
    async fn count_owned(&self, user_id: Uuid, commerce_ids: Vec<Uuid>) -> Result<i64>;

    async fn create(&self, insert_commerce_entity: InsertCommerceEntity) -> Result<CommerceEntity>;

    async fn update(
        &self,
        user_id: Uuid,
        commerce_id: Uuid,
        update_commerce_entity: UpdateCommerceEntity,
    ) -> Result<Option<CommerceEntity>>;

    /// Reassigns or deletes dependent offers/events, then deletes the commerce, in one
    /// transaction. `None` when the commerce does not belong to the user.
    async fn delete_cascade(
        &self,
        user_id: Uuid,
        commerce_id: Uuid,
    ) -> Result<Option<CommerceDeletionSummary>>;
}
