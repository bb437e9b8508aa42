use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{error, warn};

use crate::{config::config_model::DotEnvyConfig, usecases::expire_boosts::ExpireBoostsUseCase};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/internal/v1/boosts/expire" \
//     -H "Authorization: Bearer $WORKER_ADMIN_TOKEN"

#[derive(Clone)]
pub struct ExpireBoostsRouteState {
    config: Arc<DotEnvyConfig>,
    usecase: Arc<ExpireBoostsUseCase>,
}

pub fn routes(config: Arc<DotEnvyConfig>, usecase: Arc<ExpireBoostsUseCase>) -> Router {
    Router::new()
        .route("/expire", post(expire_boosts))
        .with_state(ExpireBoostsRouteState { config, usecase })
}

pub async fn expire_boosts(
    State(state): State<ExpireBoostsRouteState>,
    headers: HeaderMap,
) -> Response {
    let Some(expected_token) = state.config.worker_server.admin_token.as_deref() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "admin token is not configured",
        )
            .into_response();
    };

    if let Err(status) = authorize_bearer(&headers, expected_token) {
        warn!("expire_boosts: rejected unauthorized sweep request");
        return (status, "unauthorized").into_response();
    }

    match state.usecase.run().await {
        Ok(counts) => Json(counts).into_response(),
        Err(err) => {
            error!(error = ?err, "expire_boosts: usecase failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "sweep failed").into_response()
        }
    }
}

fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if tokens_match(token.trim(), expected_token) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// Compares MACs of both tokens under the expected one, so the final check is constant-time.
fn tokens_match(provided: &str, expected: &str) -> bool {
    let mac_of = |token: &str| {
        Hmac::<Sha256>::new_from_slice(expected.as_bytes()).map(|mut mac| {
            mac.update(token.as_bytes());
            mac
        })
    };

    match (mac_of(expected), mac_of(provided)) {
        (Ok(expected_mac), Ok(provided_mac)) => provided_mac
            .verify_slice(&expected_mac.finalize().into_bytes())
            .is_ok(),
        _ => false,
    }
}
