pub mod boost_credits;
pub mod commerces;
pub mod events;
pub mod offers;
pub mod profiles;
pub mod subscriptions;
pub mod transactions;
