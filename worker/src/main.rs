use anyhow::Result;
use crates::{
    domain::repositories::boost_expiry::BoostExpiryRepository,
    infra::db::{
        postgres::postgres_connection, repositories::boost_expiry::BoostExpiryPostgres,
    },
};
use std::sync::Arc;
use tracing::{error, info};
use worker::{
    axum_http, config, services::expiry_loop, usecases::expire_boosts::ExpireBoostsUseCase,
};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Worker exited with error: {}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        dotenvy_env.database.pool_size,
    )?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    let boost_expiry_repository: Arc<dyn BoostExpiryRepository + Send + Sync> =
        Arc::new(BoostExpiryPostgres::new(Arc::clone(&db_pool_arc)));

    let expire_boosts_usecase = Arc::new(ExpireBoostsUseCase::new(boost_expiry_repository));

    let expiry_loop = tokio::spawn(expiry_loop::run(
        Arc::clone(&expire_boosts_usecase),
        dotenvy_env.sweep.interval_secs,
    ));

    let server_config = Arc::clone(&dotenvy_env);
    let admin_server = tokio::spawn(async move {
        axum_http::http_serve::start(server_config, expire_boosts_usecase).await
    });

    tokio::select! {
        result = expiry_loop => result??,
        result = admin_server => result??,
    };
    Ok(())
}
