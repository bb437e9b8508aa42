use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use crates::{
    domain::value_objects::events::EventForm,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            commerces::CommercePostgres, dashboard::DashboardPostgres, events::EventPostgres,
            subscriptions::SubscriptionPostgres,
        },
    },
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::{error_responses::AppError, locale::RequestLocale},
    usecases::{events::EventUseCase, plan_resolver::PlanResolver},
};

type EventUseCasePostgres =
    EventUseCase<EventPostgres, CommercePostgres, SubscriptionPostgres, DashboardPostgres>;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plan_resolver = PlanResolver::new(
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(DashboardPostgres::new(Arc::clone(&db_pool))),
    );
    let event_usecase = EventUseCase::new(
        Arc::new(EventPostgres::new(Arc::clone(&db_pool))),
        Arc::new(CommercePostgres::new(Arc::clone(&db_pool))),
        Arc::new(plan_resolver),
    );

    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/:event_id", put(update_event).delete(delete_event))
        .with_state(Arc::new(event_usecase))
}

pub async fn list_events(
    State(event_usecase): State<Arc<EventUseCasePostgres>>,
    auth: AuthUser,
    RequestLocale(locale): RequestLocale,
) -> Result<impl IntoResponse, AppError> {
    let events = event_usecase.list(auth.user_id, locale).await?;
    Ok(Json(events))
}

pub async fn create_event(
    State(event_usecase): State<Arc<EventUseCasePostgres>>,
    auth: AuthUser,
    RequestLocale(locale): RequestLocale,
    Json(form): Json<EventForm>,
) -> Result<impl IntoResponse, AppError> {
    let event = event_usecase.create(auth.user_id, form, locale).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update_event(
    State(event_usecase): State<Arc<EventUseCasePostgres>>,
    auth: AuthUser,
    RequestLocale(locale): RequestLocale,
    Path(event_id): Path<Uuid>,
    Json(form): Json<EventForm>,
) -> Result<impl IntoResponse, AppError> {
    let event = event_usecase
        .update(auth.user_id, event_id, form, locale)
        .await?;
    Ok(Json(event))
}

pub async fn delete_event(
    State(event_usecase): State<Arc<EventUseCasePostgres>>,
    auth: AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    event_usecase.delete(auth.user_id, event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
