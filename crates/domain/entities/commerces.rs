use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{domain::value_objects::boosts::BoostState, infra::db::postgres::schema::commerces};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = commerces)]
pub struct CommerceEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
    pub boosted: bool,
    pub boost_type: Option<String>,
    pub boosted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommerceEntity {
    pub fn boost_state(&self) -> BoostState {
        BoostState::from_columns(self.boosted, self.boost_type.as_deref(), self.boosted_at)
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = commerces)]
pub struct InsertCommerceEntity {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
}

/// Full replacement of the editable columns. The boost triplet is never part of an edit.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = commerces, treat_none_as_null = true)]
pub struct UpdateCommerceEntity {
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}
