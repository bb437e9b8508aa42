use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::transactions::InsertBoostTransactionEntity,
    value_objects::{
        boosts::{ApplyBoostOutcome, BoostCredits, BoostState, BoostTarget},
        enums::boost_types::BoostType,
    },
};

#[automock]
#[async_trait]
pub trait BoostRepository {
    /// A user without a credits row has zero of each kind.
    async fn find_credits(&self, user_id: Uuid) -> Result<BoostCredits>;

    async fn find_boost_state(
        &self,
        user_id: Uuid,
        target: BoostTarget,
    ) -> Result<Option<BoostState>>;

    /// Decrements the matching counter and sets the boost triplet in one transaction.
    async fn apply_boost(
        &self,
        user_id: Uuid,
        target: BoostTarget,
        boost_type: BoostType,
        now: DateTime<Utc>,
    ) -> Result<ApplyBoostOutcome>;

    /// Clears the triplet. Returns false when the row does not belong to the user.
    async fn remove_boost(&self, user_id: Uuid, target: BoostTarget) -> Result<bool>;

    async fn grant_credits(
        &self,
        user_id: Uuid,
        en_vedette: i32,
        visibilite: i32,
    ) -> Result<BoostCredits>;

    /// Stores the payment and adds one credit of its type, atomically. Returns false when
    /// the payment intent was already recorded.
    async fn record_boost_purchase(&self, transaction: InsertBoostTransactionEntity)
    -> Result<bool>;
}
