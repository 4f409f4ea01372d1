use skit::config::ServerConfig;
use skit::handlers::healthcheck::HealthCheckEnv;
use skit::services::TokenValidator;
use skit::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("skit=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env().expect("SKIT_ADDR is not a socket address");
    let validator = TokenValidator::from_env().expect("JWT_VALIDATE_KEY must be set");

    let state = AppState {
        validator: Arc::new(validator),
        health: HealthCheckEnv::default(),
    };
    let app = skit::router(state).layer(TraceLayer::new_for_http());

    tracing::info!("listening on {}", config.addr);
    axum::Server::bind(&config.addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .expect("server error");
}
