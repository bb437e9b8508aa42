use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::boosts::BoostState,
    infra::db::postgres::schema::{offer_commerces, offers},
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = offers)]
pub struct OfferEntity {
    pub id: Uuid,
    pub commerce_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub offer_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub image_url: Option<String>,
    pub boosted: bool,
    pub boost_type: Option<String>,
    pub boosted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OfferEntity {
    pub fn boost_state(&self) -> BoostState {
        BoostState::from_columns(self.boosted, self.boost_type.as_deref(), self.boosted_at)
    }

    /// Same rule as the sweep: an offer past its end date is inactive whatever the flag says.
    pub fn is_live_on(&self, today: NaiveDate) -> bool {
        self.is_active && self.end_date >= today
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = offers)]
pub struct InsertOfferEntity {
    pub commerce_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub offer_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = offers, treat_none_as_null = true)]
pub struct UpdateOfferEntity {
    pub commerce_id: Uuid,
    pub title: String,
    pub description: String,
    pub offer_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Additional, non-primary commerce an offer is shown under.
#[derive(Debug, Clone, PartialEq, Queryable, Insertable)]
#[diesel(table_name = offer_commerces)]
pub struct OfferCommerceEntity {
    pub offer_id: Uuid,
    pub commerce_id: Uuid,
}
