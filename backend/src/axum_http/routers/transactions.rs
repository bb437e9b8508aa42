use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use crates::{
    infra::db::postgres::postgres_connection::PgPoolSquad, payments::stripe_client::StripeClient,
};

use crate::{
    auth::AuthUser,
    axum_http::{
        error_responses::AppError,
        routers::stripe::{SubscriptionUseCasePostgres, subscription_usecase},
    },
    config::config_model::DotEnvyConfig,
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    config: Arc<DotEnvyConfig>,
    stripe_client: Arc<StripeClient>,
) -> Router {
    let subscription_usecase = subscription_usecase(&db_pool, &config, stripe_client);

    Router::new()
        .route("/boosts", get(list_boost_transactions))
        .route("/subscriptions", get(list_subscription_transactions))
        .with_state(Arc::new(subscription_usecase))
}

pub async fn list_boost_transactions(
    State(subscription_usecase): State<Arc<SubscriptionUseCasePostgres>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let transactions = subscription_usecase
        .list_boost_transactions(auth.user_id)
        .await?;
    Ok(Json(transactions))
}

pub async fn list_subscription_transactions(
    State(subscription_usecase): State<Arc<SubscriptionUseCasePostgres>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let transactions = subscription_usecase
        .list_subscription_transactions(auth.user_id)
        .await?;
    Ok(Json(transactions))
}
