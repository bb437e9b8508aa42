use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{PgConnection, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{boost_transactions, commerces, events, offers, user_boost_credits},
    },
};
use domain::{
    entities::{boost_credits::UserBoostCreditsEntity, transactions::InsertBoostTransactionEntity},
    repositories::boosts::BoostRepository,
    value_objects::{
        boosts::{ApplyBoostOutcome, BoostCredits, BoostState, BoostTarget},
        enums::boost_types::BoostType,
    },
};

type BoostColumns = (bool, Option<String>, Option<DateTime<Utc>>);

pub struct BoostPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BoostPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

/// Reads the boost triplet of a row owned by `user_id`, optionally locking it.
fn load_boost_state(
    conn: &mut PgConnection,
    user_id: Uuid,
    target: BoostTarget,
    lock: bool,
) -> QueryResult<Option<BoostState>> {
    let columns: Option<BoostColumns> = match target {
        BoostTarget::Commerce(id) => {
            let query = commerces::table
                .filter(commerces::id.eq(id))
                .filter(commerces::user_id.eq(user_id))
                .select((commerces::boosted, commerces::boost_type, commerces::boosted_at));
            if lock {
                query.for_update().first(conn).optional()?
            } else {
                query.first(conn).optional()?
            }
        }
        BoostTarget::Offer(id) => {
            let query = offers::table
                .filter(offers::id.eq(id))
                .filter(offers::user_id.eq(user_id))
                .select((offers::boosted, offers::boost_type, offers::boosted_at));
            if lock {
                query.for_update().first(conn).optional()?
            } else {
                query.first(conn).optional()?
            }
        }
        BoostTarget::Event(id) => {
            let query = events::table
                .filter(events::id.eq(id))
                .filter(events::user_id.eq(user_id))
                .select((events::boosted, events::boost_type, events::boosted_at));
            if lock {
                query.for_update().first(conn).optional()?
            } else {
                query.first(conn).optional()?
            }
        }
    };

    Ok(columns.map(|(boosted, boost_type, boosted_at)| {
        BoostState::from_columns(boosted, boost_type.as_deref(), boosted_at)
    }))
}

/// Takes one credit of `boost_type`. `None` when the counter is already at zero or the
/// user has no credits row; the `> 0` guard keeps the counter non-negative.
fn take_credit(
    conn: &mut PgConnection,
    user_id: Uuid,
    boost_type: BoostType,
    now: DateTime<Utc>,
) -> QueryResult<Option<i32>> {
    let credits = user_boost_credits::table.filter(user_boost_credits::user_id.eq(user_id));

    match boost_type {
        BoostType::EnVedette => diesel::update(
            credits.filter(user_boost_credits::available_en_vedette.gt(0)),
        )
        .set((
            user_boost_credits::available_en_vedette
                .eq(user_boost_credits::available_en_vedette - 1),
            user_boost_credits::updated_at.eq(now),
        ))
        .returning(user_boost_credits::available_en_vedette)
        .get_result::<i32>(conn)
        .optional(),
        BoostType::Visibilite => diesel::update(
            credits.filter(user_boost_credits::available_visibilite.gt(0)),
        )
        .set((
            user_boost_credits::available_visibilite
                .eq(user_boost_credits::available_visibilite - 1),
            user_boost_credits::updated_at.eq(now),
        ))
        .returning(user_boost_credits::available_visibilite)
        .get_result::<i32>(conn)
        .optional(),
    }
}

/// `None` clears the triplet, `Some` sets it.
fn write_boost(
    conn: &mut PgConnection,
    user_id: Uuid,
    target: BoostTarget,
    boost: Option<(BoostType, DateTime<Utc>)>,
) -> QueryResult<usize> {
    let boosted = boost.is_some();
    let boost_type = boost.map(|(boost_type, _)| boost_type.to_string());
    let boosted_at = boost.map(|(_, at)| at);

    match target {
        BoostTarget::Commerce(id) => diesel::update(
            commerces::table
                .filter(commerces::id.eq(id))
                .filter(commerces::user_id.eq(user_id)),
        )
        .set((
            commerces::boosted.eq(boosted),
            commerces::boost_type.eq(boost_type),
            commerces::boosted_at.eq(boosted_at),
        ))
        .execute(conn),
        BoostTarget::Offer(id) => diesel::update(
            offers::table
                .filter(offers::id.eq(id))
                .filter(offers::user_id.eq(user_id)),
        )
        .set((
            offers::boosted.eq(boosted),
            offers::boost_type.eq(boost_type),
            offers::boosted_at.eq(boosted_at),
        ))
        .execute(conn),
        BoostTarget::Event(id) => diesel::update(
            events::table
                .filter(events::id.eq(id))
                .filter(events::user_id.eq(user_id)),
        )
        .set((
            events::boosted.eq(boosted),
            events::boost_type.eq(boost_type),
            events::boosted_at.eq(boosted_at),
        ))
        .execute(conn),
    }
}

/// Adds to both counters, creating the row on first grant.
pub(crate) fn add_credits(
    conn: &mut PgConnection,
    user_id: Uuid,
    en_vedette: i32,
    visibilite: i32,
) -> QueryResult<UserBoostCreditsEntity> {
    let now = Utc::now();

    insert_into(user_boost_credits::table)
        .values((
            user_boost_credits::user_id.eq(user_id),
            user_boost_credits::available_en_vedette.eq(en_vedette),
            user_boost_credits::available_visibilite.eq(visibilite),
            user_boost_credits::updated_at.eq(now),
        ))
        .on_conflict(user_boost_credits::user_id)
        .do_update()
        .set((
            user_boost_credits::available_en_vedette
                .eq(user_boost_credits::available_en_vedette + en_vedette),
            user_boost_credits::available_visibilite
                .eq(user_boost_credits::available_visibilite + visibilite),
            user_boost_credits::updated_at.eq(now),
        ))
        .returning(UserBoostCreditsEntity::as_returning())
        .get_result(conn)
}

#[async_trait]
impl BoostRepository for BoostPostgres {
    async fn find_credits(&self, user_id: Uuid) -> Result<BoostCredits> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = user_boost_credits::table
            .filter(user_boost_credits::user_id.eq(user_id))
            .select(UserBoostCreditsEntity::as_select())
            .first::<UserBoostCreditsEntity>(&mut conn)
            .optional()?;

        Ok(row.map(BoostCredits::from).unwrap_or_default())
    }

    async fn find_boost_state(
        &self,
        user_id: Uuid,
        target: BoostTarget,
    ) -> Result<Option<BoostState>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        Ok(load_boost_state(&mut conn, user_id, target, false)?)
    }

    async fn apply_boost(
        &self,
        user_id: Uuid,
        target: BoostTarget,
        boost_type: BoostType,
        now: DateTime<Utc>,
    ) -> Result<ApplyBoostOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let Some(state) = load_boost_state(conn, user_id, target, true)? else {
                return Ok(ApplyBoostOutcome::NotFound);
            };

            if state.is_currently_boosted_at(now) {
                return Ok(ApplyBoostOutcome::AlreadyBoosted);
            }

            let Some(remaining_credits) = take_credit(conn, user_id, boost_type, now)? else {
                return Ok(ApplyBoostOutcome::InsufficientCredits);
            };

            write_boost(conn, user_id, target, Some((boost_type, now)))?;

            Ok(ApplyBoostOutcome::Applied {
                boosted_at: now,
                remaining_credits,
            })
        })?;

        Ok(outcome)
    }

    async fn remove_boost(&self, user_id: Uuid, target: BoostTarget) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = write_boost(&mut conn, user_id, target, None)?;

        Ok(updated > 0)
    }

    async fn grant_credits(
        &self,
        user_id: Uuid,
        en_vedette: i32,
        visibilite: i32,
    ) -> Result<BoostCredits> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = add_credits(&mut conn, user_id, en_vedette.max(0), visibilite.max(0))?;

        Ok(row.into())
    }

    async fn record_boost_purchase(
        &self,
        transaction: InsertBoostTransactionEntity,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let recorded = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let inserted = insert_into(boost_transactions::table)
                .values(&transaction)
                .on_conflict(boost_transactions::stripe_payment_intent_id)
                .do_nothing()
                .execute(conn)?;

            if inserted == 0 {
                return Ok(false);
            }

            let (en_vedette, visibilite) = match BoostType::from_str(&transaction.boost_type) {
                Some(BoostType::EnVedette) => (1, 0),
                Some(BoostType::Visibilite) => (0, 1),
                None => anyhow::bail!("unknown boost type {}", transaction.boost_type),
            };
            add_credits(conn, transaction.user_id, en_vedette, visibilite)?;

            Ok(true)
        })?;

        Ok(recorded)
    }
}
