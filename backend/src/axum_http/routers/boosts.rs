use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    domain::value_objects::boosts::{ApplyBoostRequest, BoostCheckoutRequest, RemoveBoostRequest},
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{boosts::BoostPostgres, subscriptions::SubscriptionPostgres},
    },
    payments::stripe_client::StripeClient,
};

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    config::config_model::DotEnvyConfig,
    usecases::boosts::BoostUseCase,
};

pub type BoostUseCasePostgres = BoostUseCase<BoostPostgres, SubscriptionPostgres, StripeClient>;

pub fn boost_usecase(
    db_pool: &Arc<PgPoolSquad>,
    config: &DotEnvyConfig,
    stripe_client: Arc<StripeClient>,
) -> BoostUseCasePostgres {
    BoostUseCase::new(
        Arc::new(BoostPostgres::new(Arc::clone(db_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(db_pool))),
        stripe_client,
        config.stripe.prices.clone(),
    )
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    config: Arc<DotEnvyConfig>,
    stripe_client: Arc<StripeClient>,
) -> Router {
    let boost_usecase = boost_usecase(&db_pool, &config, stripe_client);

    Router::new()
        .route("/credits", get(get_credits))
        .route("/apply", post(apply_boost))
        .route("/remove", post(remove_boost))
        .route("/checkout", post(create_checkout))
        .with_state(Arc::new(boost_usecase))
}

pub async fn get_credits(
    State(boost_usecase): State<Arc<BoostUseCasePostgres>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let credits = boost_usecase.get_credits(auth.user_id).await?;
    Ok(Json(credits))
}

pub async fn apply_boost(
    State(boost_usecase): State<Arc<BoostUseCasePostgres>>,
    auth: AuthUser,
    Json(request): Json<ApplyBoostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let applied = boost_usecase
        .apply_boost(auth.user_id, request.target(), request.boost_type)
        .await?;
    Ok(Json(applied))
}

pub async fn remove_boost(
    State(boost_usecase): State<Arc<BoostUseCasePostgres>>,
    auth: AuthUser,
    Json(request): Json<RemoveBoostRequest>,
) -> Result<impl IntoResponse, AppError> {
    boost_usecase
        .remove_boost(auth.user_id, request.target())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_checkout(
    State(boost_usecase): State<Arc<BoostUseCasePostgres>>,
    auth: AuthUser,
    Json(request): Json<BoostCheckoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    let checkout = boost_usecase
        .create_checkout(auth.user_id, auth.email, request)
        .await?;
    Ok(Json(checkout))
}
