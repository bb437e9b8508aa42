use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    entities::transactions::{BoostTransactionEntity, SubscriptionTransactionEntity},
    value_objects::enums::{boost_types::BoostType, plan_types::PlanType},
};

/// Payment facts pulled out of a confirmed Stripe checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    pub payment_intent_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BoostTransactionDto {
    pub id: Uuid,
    pub boost_type: Option<BoostType>,
    pub amount_minor: i64,
    pub currency: String,
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
    pub stripe_payment_intent_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<BoostTransactionEntity> for BoostTransactionDto {
    fn from(value: BoostTransactionEntity) -> Self {
        Self {
            id: value.id,
            boost_type: BoostType::from_str(&value.boost_type),
            amount_minor: value.amount_minor,
            currency: value.currency,
            card_brand: value.card_brand,
            card_last4: value.card_last4,
            stripe_payment_intent_id: value.stripe_payment_intent_id,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubscriptionTransactionDto {
    pub id: Uuid,
    pub plan_type: PlanType,
    pub amount_minor: i64,
    pub currency: String,
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
    pub stripe_payment_intent_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<SubscriptionTransactionEntity> for SubscriptionTransactionDto {
    fn from(value: SubscriptionTransactionEntity) -> Self {
        Self {
            id: value.id,
            plan_type: PlanType::from_str(&value.plan_type),
            amount_minor: value.amount_minor,
            currency: value.currency,
            card_brand: value.card_brand,
            card_last4: value.card_last4,
            stripe_payment_intent_id: value.stripe_payment_intent_id,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransactionDetailsDto {
    pub description: String,
    pub amount_minor: i64,
    pub currency: String,
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
    pub stripe_payment_intent_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<BoostTransactionEntity> for TransactionDetailsDto {
    fn from(value: BoostTransactionEntity) -> Self {
        Self {
            description: format!("Boost {}", value.boost_type),
            amount_minor: value.amount_minor,
            currency: value.currency,
            card_brand: value.card_brand,
            card_last4: value.card_last4,
            stripe_payment_intent_id: value.stripe_payment_intent_id,
            created_at: value.created_at,
        }
    }
}

impl From<SubscriptionTransactionEntity> for TransactionDetailsDto {
    fn from(value: SubscriptionTransactionEntity) -> Self {
        Self {
            description: format!("Abonnement {}", value.plan_type),
            amount_minor: value.amount_minor,
            currency: value.currency,
            card_brand: value.card_brand,
            card_last4: value.card_last4,
            stripe_payment_intent_id: value.stripe_payment_intent_id,
            created_at: value.created_at,
        }
    }
}
