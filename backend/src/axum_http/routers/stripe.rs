use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            boosts::BoostPostgres, dashboard::DashboardPostgres,
            subscriptions::SubscriptionPostgres, transactions::TransactionPostgres,
        },
    },
    payments::stripe_client::StripeClient,
};
use serde_json::json;
use tracing::warn;

use crate::{
    auth::AuthUser,
    axum_http::{error_responses::AppError, routers::boosts::boost_usecase},
    config::config_model::DotEnvyConfig,
    usecases::{plan_resolver::PlanResolver, subscriptions::SubscriptionUseCase},
};

const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

pub type SubscriptionUseCasePostgres = SubscriptionUseCase<
    SubscriptionPostgres,
    TransactionPostgres,
    DashboardPostgres,
    BoostPostgres,
    StripeClient,
>;

pub fn subscription_usecase(
    db_pool: &Arc<PgPoolSquad>,
    config: &DotEnvyConfig,
    stripe_client: Arc<StripeClient>,
) -> SubscriptionUseCasePostgres {
    let subscription_repository = Arc::new(SubscriptionPostgres::new(Arc::clone(db_pool)));
    let plan_resolver = PlanResolver::new(
        Arc::clone(&subscription_repository),
        Arc::new(DashboardPostgres::new(Arc::clone(db_pool))),
    );

    SubscriptionUseCase::new(
        subscription_repository,
        Arc::new(TransactionPostgres::new(Arc::clone(db_pool))),
        Arc::new(plan_resolver),
        Arc::new(boost_usecase(db_pool, config, Arc::clone(&stripe_client))),
        stripe_client,
        config.stripe.prices.pro.clone(),
    )
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    config: Arc<DotEnvyConfig>,
    stripe_client: Arc<StripeClient>,
) -> Router {
    let subscription_usecase = subscription_usecase(&db_pool, &config, stripe_client);

    Router::new()
        .route("/create-subscription", post(create_subscription))
        .route("/create-portal-session", post(create_portal_session))
        .route("/get-receipt/:payment_intent_id", get(get_receipt))
        .route("/webhook", post(stripe_webhook))
        .with_state(Arc::new(subscription_usecase))
}

pub async fn create_subscription(
    State(subscription_usecase): State<Arc<SubscriptionUseCasePostgres>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let checkout = subscription_usecase
        .create_subscription_checkout(auth.user_id, auth.email)
        .await?;
    Ok(Json(checkout))
}

pub async fn create_portal_session(
    State(subscription_usecase): State<Arc<SubscriptionUseCasePostgres>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let portal = subscription_usecase
        .create_portal_session(auth.user_id)
        .await?;
    Ok(Json(portal))
}

pub async fn get_receipt(
    State(subscription_usecase): State<Arc<SubscriptionUseCasePostgres>>,
    auth: AuthUser,
    Path(payment_intent_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = subscription_usecase
        .get_receipt(auth.user_id, &payment_intent_id)
        .await?;
    Ok(Json(receipt))
}

/// Authenticated by the Stripe signature, not by a user token.
pub async fn stripe_webhook(
    State(subscription_usecase): State<Arc<SubscriptionUseCasePostgres>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let signature = stripe_signature(&headers)?;
    subscription_usecase
        .handle_stripe_webhook(&body, signature)
        .await?;
    Ok(Json(json!({ "received": true })))
}

pub(crate) fn stripe_signature(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            warn!("stripe: webhook without signature header");
            AppError::BadRequest("missing stripe-signature header".to_string())
        })
}
