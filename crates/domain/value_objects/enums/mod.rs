pub mod boost_types;
pub mod entity_types;
pub mod offer_types;
pub mod plan_types;
pub mod subscription_statuses;
