use diesel::{PgConnection, prelude::*, sql_types::Text};
use uuid::Uuid;

use crate::infra::db::postgres::schema::{events, offers};

/// Serializes content creation per user for the rest of the transaction, so two tabs
/// cannot both pass the limit check.
pub(crate) fn lock_user_content(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<()> {
    diesel::sql_query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind::<Text, _>(user_id.to_string())
        .execute(conn)?;
    Ok(())
}

pub(crate) fn count_user_content(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<i64> {
    let offer_count = offers::table
        .filter(offers::user_id.eq(user_id))
        .count()
        .get_result::<i64>(conn)?;
    let event_count = events::table
        .filter(events::user_id.eq(user_id))
        .count()
        .get_result::<i64>(conn)?;

    Ok(offer_count + event_count)
}
