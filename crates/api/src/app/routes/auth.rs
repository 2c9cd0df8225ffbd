use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::app::dto::{TokenRequest, TokenResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub async fn issue_token(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body?;

    let issued = services
        .auth
        .issue_token(&request.username, &request.password, Utc::now())
        .map_err(anyhow::Error::from)?;

    match issued {
        Some(issued) => Ok(Json(TokenResponse {
            token: issued.token,
            expires_at: issued.expires_at,
        })
        .into_response()),
        None => Ok((StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS).into_response()),
    }
}
