use anyhow::{Context, Result};

use super::{
    config_model::{BackendServer, Database, DotEnvyConfig, Stripe, StripePrices, Supabase},
    stage::Stage,
};

const DEFAULT_POOL_SIZE: u32 = 10;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();
    load_from(|key| std::env::var(key).ok())
}

/// Builds the config from any key lookup, so tests do not have to touch the process env.
pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<DotEnvyConfig> {
    let required = |key: &str| -> Result<String> {
        lookup(key)
            .filter(|value| !value.trim().is_empty())
            .with_context(|| format!("{key} is invalid"))
    };

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        pool_size: match lookup("DATABASE_POOL_SIZE") {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse()
                .context("DATABASE_POOL_SIZE is invalid")?,
            _ => DEFAULT_POOL_SIZE,
        },
    };

    let supabase = Supabase {
        jwt_secret: required("SUPABASE_JWT_SECRET")?,
    };

    let stripe = Stripe {
        secret_key: required("STRIPE_SECRET_KEY")?,
        webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
        success_url: required("STRIPE_SUCCESS_URL")?,
        cancel_url: required("STRIPE_CANCEL_URL")?,
        portal_return_url: required("STRIPE_PORTAL_RETURN_URL")?,
        prices: StripePrices {
            pro: required("STRIPE_PRICE_PRO")?,
            boost_en_vedette: required("STRIPE_PRICE_BOOST_EN_VEDETTE")?,
            boost_visibilite: required("STRIPE_PRICE_BOOST_VISIBILITE")?,
        },
    };

    let stage = Stage::try_from(&lookup("STAGE").unwrap_or_default()).unwrap_or_default();

    Ok(DotEnvyConfig {
        backend_server,
        database,
        supabase,
        stripe,
        stage,
    })
}

pub fn get_supabase_jwt_secret() -> Result<String> {
    dotenvy::dotenv().ok();

    std::env::var("SUPABASE_JWT_SECRET")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .context("SUPABASE_JWT_SECRET is invalid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("SERVER_PORT_BACKEND", "8080"),
            ("SERVER_BODY_LIMIT", "10"),
            ("SERVER_TIMEOUT", "30"),
            ("DATABASE_URL", "postgres://localhost:5432/gosholo"),
            ("SUPABASE_JWT_SECRET", "supersecretjwtsecretforunittesting123"),
            ("STRIPE_SECRET_KEY", "sk_test_123"),
            ("STRIPE_WEBHOOK_SECRET", "whsec_123"),
            ("STRIPE_SUCCESS_URL", "https://partner.gosholo.com/dashboard?success=1"),
            ("STRIPE_CANCEL_URL", "https://partner.gosholo.com/dashboard"),
            ("STRIPE_PORTAL_RETURN_URL", "https://partner.gosholo.com/dashboard/profile"),
            ("STRIPE_PRICE_PRO", "price_pro"),
            ("STRIPE_PRICE_BOOST_EN_VEDETTE", "price_vedette"),
            ("STRIPE_PRICE_BOOST_VISIBILITE", "price_visibilite"),
            ("STAGE", "production"),
        ])
    }

    fn load_with(env: &HashMap<&'static str, &'static str>) -> Result<DotEnvyConfig> {
        load_from(|key| env.get(key).map(|value| value.to_string()))
    }

    #[test]
    fn loads_complete_env() {
        let config = load_with(&full_env()).unwrap();

        assert_eq!(config.backend_server.port, 8080);
        assert_eq!(config.backend_server.body_limit, 10);
        assert_eq!(config.database.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.stripe.prices.pro, "price_pro");
        assert_eq!(config.stage, Stage::Production);
    }

    #[test]
    fn missing_required_key_names_it() {
        let mut env = full_env();
        env.remove("STRIPE_PRICE_PRO");

        let err = load_with(&env).unwrap_err();
        assert!(err.to_string().contains("STRIPE_PRICE_PRO"));
    }

    #[test]
    fn rejects_non_numeric_port() {
        let mut env = full_env();
        env.insert("SERVER_PORT_BACKEND", "http");

        assert!(load_with(&env).is_err());
    }

    #[test]
    fn unknown_stage_defaults_to_local() {
        let mut env = full_env();
        env.insert("STAGE", "staging");
        env.insert("DATABASE_POOL_SIZE", "4");

        let config = load_with(&env).unwrap();
        assert_eq!(config.stage, Stage::Local);
        assert_eq!(config.database.pool_size, 4);
    }
}
