use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::boosts::BoostCredits, infra::db::postgres::schema::user_boost_credits,
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = user_boost_credits, primary_key(user_id))]
pub struct UserBoostCreditsEntity {
    pub user_id: Uuid,
    pub available_en_vedette: i32,
    pub available_visibilite: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<UserBoostCreditsEntity> for BoostCredits {
    fn from(value: UserBoostCreditsEntity) -> Self {
        Self {
            available_en_vedette: value.available_en_vedette.max(0),
            available_visibilite: value.available_visibilite.max(0),
        }
    }
}
