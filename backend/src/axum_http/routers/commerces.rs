use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use crates::{
    domain::{
        repositories::commerces::CommerceRepository, value_objects::commerces::CommerceForm,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::commerces::CommercePostgres,
    },
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::{error_responses::AppError, locale::RequestLocale},
    usecases::commerces::CommerceUseCase,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let commerce_repository = CommercePostgres::new(Arc::clone(&db_pool));
    let commerce_usecase = CommerceUseCase::new(Arc::new(commerce_repository));

    Router::new()
        .route("/", get(list_commerces).post(create_commerce))
        .route(
            "/:commerce_id",
            get(get_commerce).put(update_commerce).delete(delete_commerce),
        )
        .with_state(Arc::new(commerce_usecase))
}

pub async fn list_commerces<T>(
    State(commerce_usecase): State<Arc<CommerceUseCase<T>>>,
    auth: AuthUser,
    RequestLocale(locale): RequestLocale,
) -> Result<impl IntoResponse, AppError>
where
    T: CommerceRepository + Send + Sync,
{
    let commerces = commerce_usecase.list(auth.user_id, locale).await?;
    Ok(Json(commerces))
}

pub async fn get_commerce<T>(
    State(commerce_usecase): State<Arc<CommerceUseCase<T>>>,
    auth: AuthUser,
    RequestLocale(locale): RequestLocale,
    Path(commerce_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    T: CommerceRepository + Send + Sync,
{
    let commerce = commerce_usecase
        .get(auth.user_id, commerce_id, locale)
        .await?;
    Ok(Json(commerce))
}

pub async fn create_commerce<T>(
    State(commerce_usecase): State<Arc<CommerceUseCase<T>>>,
    auth: AuthUser,
    RequestLocale(locale): RequestLocale,
    Json(form): Json<CommerceForm>,
) -> Result<impl IntoResponse, AppError>
where
    T: CommerceRepository + Send + Sync,
{
    let commerce = commerce_usecase.create(auth.user_id, form, locale).await?;
    Ok((StatusCode::CREATED, Json(commerce)))
}

pub async fn update_commerce<T>(
    State(commerce_usecase): State<Arc<CommerceUseCase<T>>>,
    auth: AuthUser,
    RequestLocale(locale): RequestLocale,
    Path(commerce_id): Path<Uuid>,
    Json(form): Json<CommerceForm>,
) -> Result<impl IntoResponse, AppError>
where
    T: CommerceRepository + Send + Sync,
{
    let commerce = commerce_usecase
        .update(auth.user_id, commerce_id, form, locale)
        .await?;
    Ok(Json(commerce))
}

pub async fn delete_commerce<T>(
    State(commerce_usecase): State<Arc<CommerceUseCase<T>>>,
    auth: AuthUser,
    Path(commerce_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    T: CommerceRepository + Send + Sync,
{
    let summary = commerce_usecase.delete(auth.user_id, commerce_id).await?;
    Ok(Json(summary))
}
