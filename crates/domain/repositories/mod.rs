pub mod boost_expiry;
pub mod boosts;
pub mod commerces;
pub mod dashboard;
pub mod events;
pub mod offers;
pub mod subscriptions;
pub mod transactions;
