//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: company orchestration, token issuing, repository selection
//! - `rules.rs`: business rules that need a repository lookup
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs local to the HTTP edge
//! - `errors.rs`: the error normalization boundary

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use corpreg_auth::{Hs256JwtValidator, JwtValidator};
use corpreg_infra::{AppConfig, CompanyRepository};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod rules;
pub mod services;

/// Build the full HTTP router over an already chosen repository.
pub fn build_app(config: &AppConfig, repository: Arc<dyn CompanyRepository>) -> Router {
    let jwt: Arc<dyn JwtValidator> = Arc::new(Hs256JwtValidator::new(&config.jwt));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services::AppServices::new(config, repository));

    // Protected routes: require a valid bearer token.
    let protected = routes::router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/api/auth/token", post(routes::auth::issue_token))
        .merge(protected)
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(errors::normalize_errors))
        .layer(TraceLayer::new_for_http())
}

/// Build the router with the repository selected by `config` (public entrypoint used by `main.rs`).
pub async fn build_app_from_config(config: &AppConfig) -> anyhow::Result<Router> {
    let repository = services::build_repository(config).await?;
    Ok(build_app(config, repository))
}
