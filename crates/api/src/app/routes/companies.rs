use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
    routing::get,
};

use corpreg_core::{ApiResult, CompanyDto, CompanyId, CreateCompany, UpdateCompany};

use crate::app::errors::ApiError;
use crate::app::services::{AppServices, ServiceError};
use crate::context::PrincipalContext;

pub const COMPANIES_PATH: &str = "/api/v1/companies";
pub const COMPANY_NOT_FOUND: &str = "Company not found";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route("/:id", get(get_company).put(update_company))
        .route("/isin/:isin", get(get_company_by_isin))
}

pub async fn list_companies(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let companies = services.companies.list().await?;
    Ok(Json(ApiResult::success(companies, "Companies retrieved successfully")).into_response())
}

pub async fn get_company(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: CompanyId = id.parse()?;
    Ok(found_or_404(services.companies.get_by_id(id).await?))
}

pub async fn get_company_by_isin(
    Extension(services): Extension<Arc<AppServices>>,
    Path(isin): Path<String>,
) -> Result<Response, ApiError> {
    Ok(found_or_404(services.companies.get_by_isin(&isin).await?))
}

pub async fn create_company(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<CreateCompany>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = body?;

    let result = services.companies.create(payload).await?;
    if !result.is_success() {
        return Ok((StatusCode::BAD_REQUEST, Json(result)).into_response());
    }

    let location = result
        .data()
        .and_then(|c| HeaderValue::from_str(&format!("{COMPANIES_PATH}/{}", c.id)).ok());
    let mut response = (StatusCode::CREATED, Json(result)).into_response();
    if let Some(location) = location {
        response.headers_mut().insert(LOCATION, location);
    }
    Ok(response)
}

pub async fn update_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateCompany>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id: CompanyId = id.parse()?;
    let Json(mut payload) = body?;

    if payload.id != id {
        return Err(ApiError::problem(
            "ID mismatch",
            format!("route id {id} does not match body id {}", payload.id),
        ));
    }
    if payload.updated_by.as_deref().is_none_or(str::is_empty) {
        payload.updated_by = Some(principal.subject().to_string());
    }

    match services.companies.update(payload).await {
        Ok(result) if result.is_success() => Ok(Json(result).into_response()),
        Ok(result) => Ok((StatusCode::BAD_REQUEST, Json(result)).into_response()),
        Err(ServiceError::NotFound) => Ok(not_found()),
        Err(ServiceError::Storage(e)) => Err(ApiError::Storage(e)),
    }
}

fn found_or_404(company: Option<CompanyDto>) -> Response {
    match company {
        Some(company) => {
            Json(ApiResult::success(company, "Company retrieved successfully")).into_response()
        }
        None => not_found(),
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResult::<CompanyDto>::failure(COMPANY_NOT_FOUND)),
    )
        .into_response()
}
