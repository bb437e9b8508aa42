use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::dashboard::DashboardCounts;

#[automock]
#[async_trait]
pub trait DashboardRepository {
    /// Live offers + events count used by the content gate.
    async fn count_content(&self, user_id: Uuid) -> Result<i64>;

    /// Boosted counts only include rows boosted after `boost_cutoff`.
    async fn dashboard_counts(
        &self,
        user_id: Uuid,
        boost_cutoff: DateTime<Utc>,
    ) -> Result<DashboardCounts>;
}
