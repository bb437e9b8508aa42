use crate::{
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
};
use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::{
    infra::db::postgres::postgres_connection::PgPoolSquad, payments::stripe_client::StripeClient,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub async fn start(
    config: Arc<DotEnvyConfig>,
    db_pool: Arc<PgPoolSquad>,
    stripe_client: Arc<StripeClient>,
) -> Result<()> {
    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/dashboard",
            routers::dashboard::routes(Arc::clone(&db_pool)),
        )
        .nest(
            "/api/v1/commerces",
            routers::commerces::routes(Arc::clone(&db_pool)),
        )
        .nest("/api/v1/offers", routers::offers::routes(Arc::clone(&db_pool)))
        .nest("/api/v1/events", routers::events::routes(Arc::clone(&db_pool)))
        .nest(
            "/api/v1/boosts",
            routers::boosts::routes(
                Arc::clone(&db_pool),
                Arc::clone(&config),
                Arc::clone(&stripe_client),
            ),
        )
        .nest(
            "/api/v1/subscriptions",
            routers::subscriptions::routes(
                Arc::clone(&db_pool),
                Arc::clone(&config),
                Arc::clone(&stripe_client),
            ),
        )
        .nest(
            "/api/v1/stripe",
            routers::stripe::routes(
                Arc::clone(&db_pool),
                Arc::clone(&config),
                Arc::clone(&stripe_client),
            ),
        )
        .nest(
            "/api/v1/transactions",
            routers::transactions::routes(
                Arc::clone(&db_pool),
                Arc::clone(&config),
                Arc::clone(&stripe_client),
            ),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT_LANGUAGE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        port = config.backend_server.port,
        stage = %config.stage,
        "Server is running"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = ?err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = ?err, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
