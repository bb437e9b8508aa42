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
        .route("/current", get(get_current_subscription))
        .route("/content-limit", get(get_content_limit))
        .with_state(Arc::new(subscription_usecase))
}

pub async fn get_current_subscription(
    State(subscription_usecase): State<Arc<SubscriptionUseCasePostgres>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let current = subscription_usecase
        .get_current_subscription(auth.user_id)
        .await?;
    Ok(Json(current))
}

pub async fn get_content_limit(
    State(subscription_usecase): State<Arc<SubscriptionUseCasePostgres>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let gate = subscription_usecase.get_content_limit(auth.user_id).await?;
    Ok(Json(gate))
}
