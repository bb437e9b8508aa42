pub mod boosts;
pub mod commerces;
pub mod dashboard;
pub mod events;
pub mod offers;
pub mod stripe;
pub mod subscriptions;
pub mod transactions;
