use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::offers::{
    InsertOfferEntity, OfferCommerceEntity, OfferEntity, UpdateOfferEntity,
};

#[automock]
#[async_trait]
pub trait OfferRepository {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<OfferEntity>>;

    async fn list_offer_commerces(&self, offer_ids: Vec<Uuid>) -> Result<Vec<OfferCommerceEntity>>;

    /// Re-counts offers + events under a per-user advisory lock and inserts only while
    /// the count is below `content_limit`. `None` means the limit was reached. Junction rows
    /// for `additional_commerce_ids` are written in the same transaction.
    async fn create_within_limit(
        &self,
        insert_offer_entity: InsertOfferEntity,
        additional_commerce_ids: Vec<Uuid>,
        content_limit: i64,
    ) -> Result<Option<OfferEntity>>;

    /// Replaces the offer columns and its junction rows.
    async fn update(
        &self,
        user_id: Uuid,
        offer_id: Uuid,
        update_offer_entity: UpdateOfferEntity,
        additional_commerce_ids: Vec<Uuid>,
    ) -> Result<Option<OfferEntity>>;

    async fn delete(&self, user_id: Uuid, offer_id: Uuid) -> Result<bool>;
}
