use crates::domain::value_objects::enums::boost_types::BoostType;

use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub supabase: Supabase,
    pub stripe: Stripe,
    pub stage: Stage,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// MiB.
    pub body_limit: u64,
    /// Seconds.
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub secret_key: String,
    pub webhook_secret: String,
    pub success_url: String,
    pub cancel_url: String,
    pub portal_return_url: String,
    pub prices: StripePrices,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripePrices {
    pub pro: String,
    pub boost_en_vedette: String,
    pub boost_visibilite: String,
}

impl StripePrices {
    pub fn boost_price(&self, boost_type: BoostType) -> &str {
        match boost_type {
            BoostType::EnVedette => &self.boost_en_vedette,
            BoostType::Visibilite => &self.boost_visibilite,
        }
    }
}
