use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::boosts::BoostState,
    infra::db::postgres::schema::{event_commerces, events},
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = events)]
pub struct EventEntity {
    pub id: Uuid,
    pub commerce_id: Uuid,
    pub user_id: Uuid,
    pub category_events_id: Option<Uuid>,
    pub title: String,
    pub description: String,
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

impl EventEntity {
    pub fn boost_state(&self) -> BoostState {
        BoostState::from_columns(self.boosted, self.boost_type.as_deref(), self.boosted_at)
    }

    pub fn is_live_on(&self, today: NaiveDate) -> bool {
        self.is_active && self.end_date >= today
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = events)]
pub struct InsertEventEntity {
    pub commerce_id: Uuid,
    pub user_id: Uuid,
    pub category_events_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = events, treat_none_as_null = true)]
pub struct UpdateEventEntity {
    pub commerce_id: Uuid,
    pub category_events_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Additional, non-primary commerce an event is shown under.
#[derive(Debug, Clone, PartialEq, Queryable, Insertable)]
#[diesel(table_name = event_commerces)]
pub struct EventCommerceEntity {
    pub event_id: Uuid,
    pub commerce_id: Uuid,
}
