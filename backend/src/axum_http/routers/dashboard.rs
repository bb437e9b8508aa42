use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use crates::{
    domain::repositories::{
        boosts::BoostRepository, dashboard::DashboardRepository,
        subscriptions::SubscriptionRepository,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            boosts::BoostPostgres, dashboard::DashboardPostgres,
            subscriptions::SubscriptionPostgres,
        },
    },
};
use tracing::error;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    usecases::{dashboard::DashboardUseCase, plan_resolver::PlanResolver},
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let dashboard_repository = Arc::new(DashboardPostgres::new(Arc::clone(&db_pool)));
    let plan_resolver = PlanResolver::new(
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::clone(&dashboard_repository),
    );
    let dashboard_usecase = DashboardUseCase::new(
        Arc::new(BoostPostgres::new(Arc::clone(&db_pool))),
        dashboard_repository,
        Arc::new(plan_resolver),
    );

    Router::new()
        .route("/", get(refresh_dashboard))
        .with_state(Arc::new(dashboard_usecase))
}

pub async fn refresh_dashboard<B, S, D>(
    State(dashboard_usecase): State<Arc<DashboardUseCase<B, S, D>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    B: BoostRepository + Send + Sync,
    S: SubscriptionRepository + Send + Sync,
    D: DashboardRepository + Send + Sync,
{
    let snapshot = dashboard_usecase
        .refresh(auth.user_id)
        .await
        .map_err(|err| {
            error!(user_id = %auth.user_id, db_error = ?err, "dashboard: refresh failed");
            AppError::Internal(err)
        })?;

    Ok(Json(snapshot))
}
