use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::{boost_transactions, subscription_transactions};

/// Payment records are append-only; nothing updates or deletes them.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = boost_transactions)]
pub struct BoostTransactionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub boost_type: String,
    pub amount_minor: i64,
    pub currency: String,
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
    pub stripe_payment_intent_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = boost_transactions)]
pub struct InsertBoostTransactionEntity {
    pub user_id: Uuid,
    pub boost_type: String,
    pub amount_minor: i64,
    pub currency: String,
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
    pub stripe_payment_intent_id: String,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_transactions)]
pub struct SubscriptionTransactionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_type: String,
    pub amount_minor: i64,
    pub currency: String,
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
    pub stripe_payment_intent_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = subscription_transactions)]
pub struct InsertSubscriptionTransactionEntity {
    pub user_id: Uuid,
    pub plan_type: String,
    pub amount_minor: i64,
    pub currency: String,
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
    pub stripe_payment_intent_id: String,
}
