use axum::Router;

pub mod auth;
pub mod companies;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new().nest("/api/v1/companies", companies::router())
}
