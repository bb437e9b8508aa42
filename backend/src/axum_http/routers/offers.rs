use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use crates::{
    domain::value_objects::offers::OfferForm,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            commerces::CommercePostgres, dashboard::DashboardPostgres, offers::OfferPostgres,
            subscriptions::SubscriptionPostgres,
        },
    },
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::{error_responses::AppError, locale::RequestLocale},
    usecases::{offers::OfferUseCase, plan_resolver::PlanResolver},
};

type OfferUseCasePostgres =
    OfferUseCase<OfferPostgres, CommercePostgres, SubscriptionPostgres, DashboardPostgres>;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plan_resolver = PlanResolver::new(
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(DashboardPostgres::new(Arc::clone(&db_pool))),
    );
    let offer_usecase = OfferUseCase::new(
        Arc::new(OfferPostgres::new(Arc::clone(&db_pool))),
        Arc::new(CommercePostgres::new(Arc::clone(&db_pool))),
        Arc::new(plan_resolver),
    );

    Router::new()
        .route("/", get(list_offers).post(create_offer))
        .route("/:offer_id", put(update_offer).delete(delete_offer))
        .with_state(Arc::new(offer_usecase))
}

pub async fn list_offers(
    State(offer_usecase): State<Arc<OfferUseCasePostgres>>,
    auth: AuthUser,
    RequestLocale(locale): RequestLocale,
) -> Result<impl IntoResponse, AppError> {
    let offers = offer_usecase.list(auth.user_id, locale).await?;
    Ok(Json(offers))
}

pub async fn create_offer(
    State(offer_usecase): State<Arc<OfferUseCasePostgres>>,
    auth: AuthUser,
    RequestLocale(locale): RequestLocale,
    Json(form): Json<OfferForm>,
) -> Result<impl IntoResponse, AppError> {
    let offer = offer_usecase.create(auth.user_id, form, locale).await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

pub async fn update_offer(
    State(offer_usecase): State<Arc<OfferUseCasePostgres>>,
    auth: AuthUser,
    RequestLocale(locale): RequestLocale,
    Path(offer_id): Path<Uuid>,
    Json(form): Json<OfferForm>,
) -> Result<impl IntoResponse, AppError> {
    let offer = offer_usecase
        .update(auth.user_id, offer_id, form, locale)
        .await?;
    Ok(Json(offer))
}

pub async fn delete_offer(
    State(offer_usecase): State<Arc<OfferUseCasePostgres>>,
    auth: AuthUser,
    Path(offer_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    offer_usecase.delete(auth.user_id, offer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
