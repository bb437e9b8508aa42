use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use std::sync::Arc;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{commerces, events, offers},
    },
};
use domain::{
    repositories::boost_expiry::BoostExpiryRepository, value_objects::boosts::ExpiredBoostCounts,
};

pub struct BoostExpiryPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BoostExpiryPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BoostExpiryRepository for BoostExpiryPostgres {
    async fn expire_old_boosts(
        &self,
        cutoff: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<ExpiredBoostCounts> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let counts = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let commerces_cleared = diesel::update(
                commerces::table
                    .filter(commerces::boosted.eq(true))
                    .filter(commerces::boosted_at.le(cutoff)),
            )
            .set((
                commerces::boosted.eq(false),
                commerces::boost_type.eq(None::<String>),
                commerces::boosted_at.eq(None::<DateTime<Utc>>),
            ))
            .execute(conn)?;

            let offers_cleared = diesel::update(
                offers::table
                    .filter(offers::boosted.eq(true))
                    .filter(offers::boosted_at.le(cutoff)),
            )
            .set((
                offers::boosted.eq(false),
                offers::boost_type.eq(None::<String>),
                offers::boosted_at.eq(None::<DateTime<Utc>>),
            ))
            .execute(conn)?;

            let events_cleared = diesel::update(
                events::table
                    .filter(events::boosted.eq(true))
                    .filter(events::boosted_at.le(cutoff)),
            )
            .set((
                events::boosted.eq(false),
                events::boost_type.eq(None::<String>),
                events::boosted_at.eq(None::<DateTime<Utc>>),
            ))
            .execute(conn)?;

            let deactivated_offers = diesel::update(
                offers::table
                    .filter(offers::is_active.eq(true))
                    .filter(offers::end_date.lt(today)),
            )
            .set(offers::is_active.eq(false))
            .execute(conn)?;

            let deactivated_events = diesel::update(
                events::table
                    .filter(events::is_active.eq(true))
                    .filter(events::end_date.lt(today)),
            )
            .set(events::is_active.eq(false))
            .execute(conn)?;

            Ok(ExpiredBoostCounts {
                commerces: commerces_cleared,
                offers: offers_cleared,
                events: events_cleared,
                deactivated_offers,
                deactivated_events,
            })
        })?;

        Ok(counts)
    }
}
