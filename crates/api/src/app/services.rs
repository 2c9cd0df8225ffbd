//! Application services: company orchestration, token issuing, and wiring.

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use thiserror::Error;

use corpreg_auth::{ApiCredentials, Hs256TokenIssuer, IssuedToken, TokenIssueError};
use corpreg_core::{
    ApiResult, Company, CompanyDto, CompanyId, CreateCompany, UpdateCompany, ValidationOutcome,
    validate_create, validate_update,
};
use corpreg_infra::{
    AppConfig, CompanyRepository, InMemoryCompanyRepository, PostgresCompanyRepository,
    StorageError,
};

use crate::app::rules;

pub const VALIDATION_FAILED: &str = "Validation failed";
pub const COMPANY_CREATED: &str = "Company created successfully.";
pub const COMPANY_UPDATED: &str = "Company updated successfully.";

/// Failures that are not part of a regular envelope.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("company not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Validates, checks rules, persists, and wraps the outcome in an envelope.
///
/// Validation and rule failures come back as failure envelopes; storage
/// failures are never caught here.
#[derive(Clone)]
pub struct CompanyService {
    repository: Arc<dyn CompanyRepository>,
}

impl CompanyService {
    pub fn new(repository: Arc<dyn CompanyRepository>) -> Self {
        Self { repository }
    }

    pub async fn create(
        &self,
        payload: CreateCompany,
    ) -> Result<ApiResult<CompanyDto>, ServiceError> {
        if let failed @ ValidationOutcome::Invalid(_) = validate_create(&payload) {
            return Ok(validation_failure(failed));
        }

        let rules = rules::check_create(self.repository.as_ref(), &payload).await?;
        if !rules.is_valid() {
            tracing::info!(isin = %payload.isin, "create rejected by business rules");
            return Ok(validation_failure(rules));
        }

        let company = Company::create(payload, Utc::now());
        self.repository.insert(&company).await?;

        tracing::info!(company_id = %company.id(), isin = %company.isin(), "company created");
        Ok(ApiResult::success(company.to_dto(), COMPANY_CREATED))
    }

    pub async fn update(
        &self,
        payload: UpdateCompany,
    ) -> Result<ApiResult<CompanyDto>, ServiceError> {
        if let failed @ ValidationOutcome::Invalid(_) = validate_update(&payload) {
            return Ok(validation_failure(failed));
        }

        let (id, changes) = payload.into_parts();
        let updated = self
            .repository
            .update(id, changes)
            .await?
            .ok_or(ServiceError::NotFound)?;

        tracing::info!(company_id = %id, "company updated");
        Ok(ApiResult::success(updated.to_dto(), COMPANY_UPDATED))
    }

    pub async fn list(&self) -> Result<Vec<CompanyDto>, ServiceError> {
        let companies = self.repository.list_all().await?;
        Ok(companies.iter().map(Company::to_dto).collect())
    }

    pub async fn get_by_id(&self, id: CompanyId) -> Result<Option<CompanyDto>, ServiceError> {
        Ok(self.repository.find_by_id(id).await?.map(|c| c.to_dto()))
    }

    pub async fn get_by_isin(&self, isin: &str) -> Result<Option<CompanyDto>, ServiceError> {
        Ok(self.repository.find_by_isin(isin).await?.map(|c| c.to_dto()))
    }
}

fn validation_failure<T>(outcome: ValidationOutcome) -> ApiResult<T> {
    ApiResult::failure_with_errors(VALIDATION_FAILED, outcome.into_error_map(), None)
}

/// Exchanges the configured API credentials for a bearer token.
#[derive(Clone)]
pub struct AuthService {
    issuer: Hs256TokenIssuer,
    credentials: ApiCredentials,
}

impl AuthService {
    pub fn new(issuer: Hs256TokenIssuer, credentials: ApiCredentials) -> Self {
        Self { issuer, credentials }
    }

    /// `Ok(None)` when the credentials do not match.
    pub fn issue_token(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<IssuedToken>, TokenIssueError> {
        if !self.credentials.verify(username, password) {
            tracing::warn!(username, "token request with invalid credentials");
            return Ok(None);
        }
        self.issuer.issue(username, now).map(Some)
    }
}

/// Everything handlers need, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub companies: CompanyService,
    pub auth: AuthService,
}

impl AppServices {
    pub fn new(config: &AppConfig, repository: Arc<dyn CompanyRepository>) -> Self {
        Self {
            companies: CompanyService::new(repository),
            auth: AuthService::new(
                Hs256TokenIssuer::new(config.jwt.clone()),
                config.credentials.clone(),
            ),
        }
    }
}

/// Pick the repository for this process: Postgres when configured, memory otherwise.
pub async fn build_repository(config: &AppConfig) -> anyhow::Result<Arc<dyn CompanyRepository>> {
    match &config.database_url {
        Some(url) => {
            let repository = PostgresCompanyRepository::connect(url)
                .await
                .context("failed to connect to Postgres")?;
            repository
                .migrate()
                .await
                .context("failed to apply the companies schema")?;
            tracing::info!("using Postgres company repository");
            Ok(Arc::new(repository))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory company repository");
            Ok(Arc::new(InMemoryCompanyRepository::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpreg_infra::repository::StorageFailureKind;

    fn service() -> CompanyService {
        CompanyService::new(Arc::new(InMemoryCompanyRepository::new()))
    }

    fn payload(isin: &str) -> CreateCompany {
        CreateCompany {
            name: "Apple Inc.".to_string(),
            exchange: "NASDAQ".to_string(),
            ticker: "AAPL".to_string(),
            isin: isin.to_string(),
            website: Some("https://www.apple.com".to_string()),
        }
    }

    fn update_for(dto: &CompanyDto, name: &str) -> UpdateCompany {
        UpdateCompany {
            id: dto.id,
            name: name.to_string(),
            exchange: dto.exchange.clone(),
            ticker: dto.ticker.clone(),
            isin: dto.isin.clone(),
            website: dto.website.clone(),
            updated_by: Some("alice".to_string()),
        }
    }

    #[tokio::test]
    async fn create_persists_and_confirms() {
        let service = service();
        let result = service.create(payload("US0378331005")).await.unwrap();

        assert!(result.is_success());
        assert_eq!(result.message(), COMPANY_CREATED);
        let dto = result.data().unwrap();
        assert_eq!(dto.isin, "US0378331005");
        assert!(dto.date_updated.is_none());

        assert_eq!(service.get_by_isin("US0378331005").await.unwrap(), Some(dto.clone()));
    }

    #[tokio::test]
    async fn create_with_invalid_fields_fails_without_persisting() {
        let service = service();
        let result = service
            .create(CreateCompany {
                ticker: "TOO_LONG_TICKER".to_string(),
                isin: "12ABC".to_string(),
                ..payload("")
            })
            .await
            .unwrap();

        assert!(!result.is_success());
        assert_eq!(result.message(), VALIDATION_FAILED);
        assert_eq!(result.status_code(), Some(400));
        assert!(result.errors().contains_key("Ticker"));
        assert!(result.errors().contains_key("Isin"));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_isin_is_a_business_failure() {
        let service = service();
        service.create(payload("US0378331005")).await.unwrap();

        let result = service.create(payload("US0378331005")).await.unwrap();

        assert!(!result.is_success());
        assert_eq!(result.status_code(), Some(400));
        assert_eq!(result.errors()["Isin"], vec![rules::DUPLICATE_ISIN_MESSAGE]);
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_preserves_creation_and_stamps_update() {
        let service = service();
        let created = service
            .create(payload("US0378331005"))
            .await
            .unwrap()
            .into_data()
            .unwrap();

        let result = service.update(update_for(&created, "Apple")).await.unwrap();

        assert!(result.is_success());
        assert_eq!(result.message(), COMPANY_UPDATED);
        let updated = result.into_data().unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Apple");
        assert_eq!(updated.date_created, created.date_created);
        assert!(updated.date_updated.is_some());
        assert_eq!(updated.updated_by.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn update_with_nil_id_is_a_validation_failure() {
        let service = service();
        let result = service
            .update(UpdateCompany {
                id: CompanyId::default(),
                isin: "US0378331005".to_string(),
                ..UpdateCompany::default()
            })
            .await
            .unwrap();

        assert_eq!(result.errors()["Id"], vec!["Company ID is required."]);
    }

    #[tokio::test]
    async fn update_of_unknown_company_is_not_found() {
        let service = service();
        let dto = Company::create(payload("US0378331005"), Utc::now()).to_dto();

        let err = service.update(update_for(&dto, "Ghost")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn update_into_taken_isin_surfaces_storage_failure() {
        let service = service();
        service.create(payload("US0378331005")).await.unwrap();
        let second = service
            .create(payload("US5949181045"))
            .await
            .unwrap()
            .into_data()
            .unwrap();

        let mut update = update_for(&second, "Microsoft");
        update.isin = "US0378331005".to_string();
        let err = service.update(update).await.unwrap_err();

        match err {
            ServiceError::Storage(e) => assert_eq!(e.kind(), StorageFailureKind::UniqueViolation),
            other => panic!("expected storage failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_returns_companies_in_creation_order() {
        let service = service();
        service.create(payload("US0378331005")).await.unwrap();
        service.create(payload("US5949181045")).await.unwrap();

        let isins: Vec<String> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.isin)
            .collect();
        assert_eq!(isins, vec!["US0378331005", "US5949181045"]);
    }

    #[test]
    fn token_requires_matching_credentials() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let services = AppServices::new(&config, Arc::new(InMemoryCompanyRepository::new()));

        assert!(services
            .auth
            .issue_token("testuser", "password123", Utc::now())
            .unwrap()
            .is_some());
        assert!(services
            .auth
            .issue_token("testuser", "wrong", Utc::now())
            .unwrap()
            .is_none());
    }
}
