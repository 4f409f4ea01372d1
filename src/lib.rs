use axum::extract::FromRef;
use std::sync::Arc;

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod layers;
pub mod models;
pub mod services;

use handlers::healthcheck::HealthCheckEnv;
use services::jwt_service::TokenValidator;

#[derive(FromRef, Clone)]
pub struct AppState {
    pub validator: Arc<TokenValidator>,
    pub health: HealthCheckEnv,
}

/// Health checks are public; everything under `/v1` requires a bearer token.
pub fn router(state: AppState) -> axum::Router {
    use axum::routing::get;
    use handlers::{healthcheck, identity};

    let protected = axum::Router::new()
        .route("/v1/whoami", get(identity::whoami))
        .route_layer(layers::AuthenticationLayer::new(state.validator.clone()));

    axum::Router::new()
        .route("/healthz", get(healthcheck::health_check_no_content))
        .route("/healthz/env", get(healthcheck::health_check_environment))
        .merge(protected)
        .with_state(state)
}
