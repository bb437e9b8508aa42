pub mod expire_boosts;
