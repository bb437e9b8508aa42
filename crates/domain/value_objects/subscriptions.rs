use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_objects::{
    enums::{plan_types::PlanType, subscription_statuses::SubscriptionStatus},
    transactions::TransactionDetailsDto,
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CurrentSubscriptionDto {
    pub plan_type: PlanType,
    pub status: Option<SubscriptionStatus>,
    pub current_period_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CheckoutUrlDto {
    pub url: String,
}

/// Either Stripe's hosted receipt or, when Stripe has none, what we stored at payment time.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ReceiptDto {
    Hosted { receipt_url: String },
    Stored { transaction_details: TransactionDetailsDto },
}
