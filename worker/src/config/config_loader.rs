use std::str::FromStr;

use anyhow::{Context, Result};

use super::config_model::{Database, DotEnvyConfig, Sweep, WorkerServer};

const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 1800;
const DEFAULT_BODY_LIMIT_MIB: u64 = 1;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();
    load_from(|key| std::env::var(key).ok())
}

pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<DotEnvyConfig> {
    let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    let required = |key: &str| -> Result<String> {
        present(key).with_context(|| format!("{key} is invalid"))
    };
    let parse_or = |key: &str, default: u64| -> Result<u64> {
        present(key).map_or(Ok(default), |raw| parse(key, &raw))
    };

    let worker_server = WorkerServer {
        port: parse("SERVER_PORT_WORKER", &required("SERVER_PORT_WORKER")?)?,
        body_limit: parse_or("SERVER_BODY_LIMIT", DEFAULT_BODY_LIMIT_MIB)?,
        timeout: parse_or("SERVER_TIMEOUT", DEFAULT_TIMEOUT_SECS)?,
        admin_token: present("WORKER_ADMIN_TOKEN").map(|token| token.trim().to_string()),
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        pool_size: match present("DATABASE_POOL_SIZE") {
            Some(raw) => parse("DATABASE_POOL_SIZE", &raw)?,
            None => DEFAULT_POOL_SIZE,
        },
    };

    let interval_secs = parse_or("BOOST_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?;
    if interval_secs == 0 {
        anyhow::bail!("BOOST_SWEEP_INTERVAL_SECS must be greater than zero");
    }

    Ok(DotEnvyConfig {
        worker_server,
        database,
        sweep: Sweep { interval_secs },
    })
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} is invalid"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_with(pairs: &[(&str, &str)]) -> Result<DotEnvyConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        load_from(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_fill_optional_keys() {
        let config = load_with(&[
            ("SERVER_PORT_WORKER", "8081"),
            ("DATABASE_URL", "postgres://localhost:5432/gosholo"),
        ])
        .unwrap();

        assert_eq!(config.worker_server.port, 8081);
        assert_eq!(config.sweep.interval_secs, 1800);
        assert_eq!(config.database.pool_size, 10);
        assert!(config.worker_server.admin_token.is_none());
    }

    #[test]
    fn reads_interval_and_token() {
        let config = load_with(&[
            ("SERVER_PORT_WORKER", "8081"),
            ("DATABASE_URL", "postgres://localhost:5432/gosholo"),
            ("BOOST_SWEEP_INTERVAL_SECS", "60"),
            ("WORKER_ADMIN_TOKEN", " s3cret "),
        ])
        .unwrap();

        assert_eq!(config.sweep.interval_secs, 60);
        assert_eq!(config.worker_server.admin_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = load_with(&[
            ("SERVER_PORT_WORKER", "8081"),
            ("DATABASE_URL", "postgres://localhost:5432/gosholo"),
            ("BOOST_SWEEP_INTERVAL_SECS", "0"),
        ])
        .unwrap_err();

        assert!(err.to_string().contains("BOOST_SWEEP_INTERVAL_SECS"));
    }

    #[test]
    fn missing_database_url_is_named() {
        let err = load_with(&[("SERVER_PORT_WORKER", "8081")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }
}
