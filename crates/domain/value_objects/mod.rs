pub mod boosts;
pub mod commerces;
pub mod content;
pub mod dashboard;
pub mod enums;
pub mod events;
pub mod offers;
pub mod plans;
pub mod subscriptions;
pub mod transactions;
