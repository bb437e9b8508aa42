pub mod boosts;
pub mod commerces;
pub mod content;
pub mod dashboard;
pub mod events;
pub mod offers;
pub mod plan_resolver;
pub mod stripe_gateway;
pub mod subscriptions;
