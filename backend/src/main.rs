use anyhow::Result;
use backend::axum_http::http_serve;
use backend::config::config_loader;
use crates::{
    infra::db::postgres::postgres_connection, payments::stripe_client::StripeClient,
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Backend exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("backend")?;

    let dotenvy_env = config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        dotenvy_env.database.pool_size,
    )?;
    info!("Postgres connection has been established");

    let stripe = &dotenvy_env.stripe;
    let stripe_client = StripeClient::new(
        stripe.secret_key.clone(),
        stripe.webhook_secret.clone(),
        stripe.success_url.clone(),
        stripe.cancel_url.clone(),
        stripe.portal_return_url.clone(),
    );

    http_serve::start(
        Arc::new(dotenvy_env),
        Arc::new(postgres_pool),
        Arc::new(stripe_client),
    )
    .await?;

    Ok(())
}
