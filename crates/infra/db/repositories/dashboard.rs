use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use super::content_counts::count_user_content;
use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{commerces, events, offers},
    },
};
use domain::{repositories::dashboard::DashboardRepository, value_objects::dashboard::DashboardCounts};

pub struct DashboardPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl DashboardPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl DashboardRepository for DashboardPostgres {
    async fn count_content(&self, user_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        Ok(count_user_content(&mut conn, user_id)?)
    }

    async fn dashboard_counts(
        &self,
        user_id: Uuid,
        boost_cutoff: DateTime<Utc>,
    ) -> Result<DashboardCounts> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let commerce_count = commerces::table
            .filter(commerces::user_id.eq(user_id))
            .count()
            .get_result::<i64>(&mut conn)?;
        let boosted_commerces = commerces::table
            .filter(commerces::user_id.eq(user_id))
            .filter(commerces::boosted.eq(true))
            .filter(commerces::boosted_at.gt(boost_cutoff))
            .count()
            .get_result::<i64>(&mut conn)?;

        let offer_count = offers::table
            .filter(offers::user_id.eq(user_id))
            .count()
            .get_result::<i64>(&mut conn)?;
        let boosted_offers = offers::table
            .filter(offers::user_id.eq(user_id))
            .filter(offers::boosted.eq(true))
            .filter(offers::boosted_at.gt(boost_cutoff))
            .count()
            .get_result::<i64>(&mut conn)?;

        let event_count = events::table
            .filter(events::user_id.eq(user_id))
            .count()
            .get_result::<i64>(&mut conn)?;
        let boosted_events = events::table
            .filter(events::user_id.eq(user_id))
            .filter(events::boosted.eq(true))
            .filter(events::boosted_at.gt(boost_cutoff))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(DashboardCounts {
            commerces: commerce_count,
            offers: offer_count,
            events: event_count,
            boosted_commerces,
            boosted_offers,
            boosted_events,
        })
    }
}
