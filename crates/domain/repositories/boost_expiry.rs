use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mockall::automock;

use crate::domain::value_objects::boosts::ExpiredBoostCounts;

#[automock]
#[async_trait]
pub trait BoostExpiryRepository {
    /// Clears boosts applied at or before `cutoff` and deactivates offers/events that
    /// ended before `today`.
    async fn expire_old_boosts(
        &self,
        cutoff: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<ExpiredBoostCounts>;
}
