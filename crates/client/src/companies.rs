//! Company endpoints, each folded into an [`ApiResult`].

use std::sync::Arc;

use reqwest::{Method, StatusCode, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use corpreg_core::{ApiResult, CompanyDto, CompanyId, CreateCompany, ErrorMap, UpdateCompany};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::token::TokenService;

pub const COMPANIES_PATH: &str = "/api/v1/companies";
pub const INVALID_RESPONSE: &str = "Invalid response from server.";
pub const UNEXPECTED_ERROR: &str = "Unexpected error occurred.";
const REQUEST_FAILED: &str = "Request failed";

#[derive(Debug, Clone)]
pub struct CompanyClient {
    http: reqwest::Client,
    config: ClientConfig,
    tokens: Arc<TokenService>,
}

impl CompanyClient {
    pub fn new(config: ClientConfig) -> Self {
        let http = reqwest::Client::new();
        let tokens = Arc::new(TokenService::new(http.clone(), config.clone()));
        Self {
            http,
            config,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn list(&self) -> Result<ApiResult<Vec<CompanyDto>>, ClientError> {
        let url = self.endpoint(&[])?;
        self.send::<_, ()>(Method::GET, url, None).await
    }

    pub async fn get(&self, id: CompanyId) -> Result<ApiResult<CompanyDto>, ClientError> {
        let url = self.endpoint(&[id.to_string().as_str()])?;
        self.send::<_, ()>(Method::GET, url, None).await
    }

    pub async fn get_by_isin(&self, isin: &str) -> Result<ApiResult<CompanyDto>, ClientError> {
        let url = self.endpoint(&["isin", isin])?;
        self.send::<_, ()>(Method::GET, url, None).await
    }

    pub async fn create(
        &self,
        payload: &CreateCompany,
    ) -> Result<ApiResult<CompanyDto>, ClientError> {
        let url = self.endpoint(&[])?;
        self.send(Method::POST, url, Some(payload)).await
    }

    pub async fn update(
        &self,
        payload: &UpdateCompany,
    ) -> Result<ApiResult<CompanyDto>, ClientError> {
        let url = self.endpoint(&[payload.id.to_string().as_str()])?;
        self.send(Method::PUT, url, Some(payload)).await
    }

    /// Companies URL with `segments` appended, each percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let raw = self.config.url(COMPANIES_PATH);
        let mut url =
            Url::parse(&raw).map_err(|e| ClientError::InvalidBaseUrl(format!("{raw}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidBaseUrl(raw.clone()))?
            .extend(segments);
        Ok(url)
    }

    async fn send<T, B>(
        &self,
        method: Method,
        url: Url,
        payload: Option<&B>,
    ) -> Result<ApiResult<T>, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let path = url.path().to_string();
        let token = self.tokens.token().await?;
        let mut request = self.http.request(method.clone(), url).bearer_auth(token);
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(%method, path = %path, "API rejected the bearer token; dropping it");
            self.tokens.invalidate().await;
        }

        let body = response.text().await?;
        tracing::debug!(%method, path = %path, status = status.as_u16(), "API call finished");
        Ok(interpret(status, &body))
    }
}

#[derive(Debug, Deserialize)]
struct ProblemBody {
    title: Option<String>,
    detail: Option<String>,
    status: Option<u16>,
    #[serde(default)]
    errors: ErrorMap,
}

impl ProblemBody {
    fn is_problem(&self) -> bool {
        self.title.is_some() || self.detail.is_some()
    }
}

/// Turn a raw response into an envelope.
pub fn interpret<T: DeserializeOwned>(status: StatusCode, body: &str) -> ApiResult<T> {
    if status.is_success() {
        return match serde_json::from_str::<ApiResult<T>>(body) {
            Ok(result) if result.data().is_some() => result,
            _ => ApiResult::failure(INVALID_RESPONSE),
        };
    }

    if let Ok(envelope) = serde_json::from_str::<ApiResult<T>>(body) {
        return envelope;
    }

    match serde_json::from_str::<ProblemBody>(body) {
        Ok(problem) if problem.is_problem() => {
            let message = problem.detail.unwrap_or_else(|| REQUEST_FAILED.to_string());
            if problem.errors.is_empty() {
                ApiResult::failure(message)
            } else {
                let status = problem.status.unwrap_or(status.as_u16());
                ApiResult::failure_with_errors(message, problem.errors, Some(status))
            }
        }
        _ => ApiResult::failure(UNEXPECTED_ERROR),
    }
}
