use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use corpreg_core::{Company, CompanyChanges, CompanyId};

use super::{CompanyRepository, ISIN_UNIQUE_CONSTRAINT, StorageError};

const UNIQUE_VIOLATION: i32 = 23505;
const STRING_TOO_LONG: i32 = 22001;
const MAX_ISIN_LEN: usize = 12;
const MAX_UPDATED_BY_LEN: usize = 255;

/// In-memory company store.
///
/// Intended for tests/dev. Enforces the same column limits and unique
/// constraint as the Postgres schema and reports violations with the same
/// codes.
#[derive(Debug, Default)]
pub struct InMemoryCompanyRepository {
    companies: RwLock<HashMap<CompanyId, Company>>,
}

impl InMemoryCompanyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<CompanyId, Company>>, StorageError> {
        self.companies
            .read()
            .map_err(|_| StorageError::new(0, "in-memory company store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<CompanyId, Company>>, StorageError> {
        self.companies
            .write()
            .map_err(|_| StorageError::new(0, "in-memory company store lock poisoned"))
    }
}

fn check_columns(isin: &str, updated_by: Option<&str>) -> Result<(), StorageError> {
    let too_long = |len: usize| {
        StorageError::new(
            STRING_TOO_LONG,
            format!("value too long for type character varying({len})"),
        )
    };
    if isin.chars().count() > MAX_ISIN_LEN {
        return Err(too_long(MAX_ISIN_LEN));
    }
    if updated_by.is_some_and(|u| u.chars().count() > MAX_UPDATED_BY_LEN) {
        return Err(too_long(MAX_UPDATED_BY_LEN));
    }
    Ok(())
}

fn check_isin_unique(
    companies: &HashMap<CompanyId, Company>,
    isin: &str,
    except: Option<CompanyId>,
) -> Result<(), StorageError> {
    let taken = companies
        .values()
        .any(|c| c.isin() == isin && Some(c.id()) != except);
    if taken {
        return Err(StorageError::new(
            UNIQUE_VIOLATION,
            format!("duplicate key value violates unique constraint \"{ISIN_UNIQUE_CONSTRAINT}\""),
        ));
    }
    Ok(())
}

#[async_trait::async_trait]
impl CompanyRepository for InMemoryCompanyRepository {
    async fn find_by_id(&self, id: CompanyId) -> Result<Option<Company>, StorageError> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn find_by_isin(&self, isin: &str) -> Result<Option<Company>, StorageError> {
        Ok(self.read()?.values().find(|c| c.isin() == isin).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Company>, StorageError> {
        let mut companies: Vec<Company> = self.read()?.values().cloned().collect();
        companies.sort_by_key(|c| (c.date_created(), c.id()));
        Ok(companies)
    }

    async fn insert(&self, company: &Company) -> Result<(), StorageError> {
        check_columns(company.isin(), company.updated_by())?;

        let mut companies = self.write()?;
        if companies.contains_key(&company.id()) {
            return Err(StorageError::new(
                UNIQUE_VIOLATION,
                "duplicate key value violates unique constraint \"companies_pkey\"",
            ));
        }
        check_isin_unique(&companies, company.isin(), None)?;
        companies.insert(company.id(), company.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: CompanyId,
        changes: CompanyChanges,
    ) -> Result<Option<Company>, StorageError> {
        check_columns(&changes.isin, changes.updated_by.as_deref())?;

        let mut companies = self.write()?;
        if !companies.contains_key(&id) {
            return Ok(None);
        }
        check_isin_unique(&companies, &changes.isin, Some(id))?;

        let Some(company) = companies.get_mut(&id) else {
            return Ok(None);
        };
        company.apply(changes, Utc::now());
        Ok(Some(company.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::StorageFailureKind;
    use chrono::Duration;
    use corpreg_core::{CompanyDto, CreateCompany};

    fn company(isin: &str) -> Company {
        Company::create(
            CreateCompany {
                name: format!("Company {isin}"),
                exchange: "NYSE".to_string(),
                ticker: "TCK".to_string(),
                isin: isin.to_string(),
                website: None,
            },
            Utc::now(),
        )
    }

    fn changes(isin: &str) -> CompanyChanges {
        CompanyChanges {
            name: "Renamed".to_string(),
            exchange: "NASDAQ".to_string(),
            ticker: "REN".to_string(),
            isin: isin.to_string(),
            website: None,
            updated_by: Some("alice".to_string()),
        }
    }

    #[tokio::test]
    async fn insert_then_find() {
        let repo = InMemoryCompanyRepository::new();
        let acme = company("US0000000001");
        repo.insert(&acme).await.unwrap();

        assert_eq!(repo.find_by_id(acme.id()).await.unwrap(), Some(acme.clone()));
        assert_eq!(repo.find_by_isin("US0000000001").await.unwrap(), Some(acme));
        assert_eq!(repo.find_by_isin("US0000000002").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_isin_is_a_unique_violation() {
        let repo = InMemoryCompanyRepository::new();
        repo.insert(&company("US0000000001")).await.unwrap();

        let err = repo.insert(&company("US0000000001")).await.unwrap_err();
        assert_eq!(err.kind(), StorageFailureKind::UniqueViolation);
        assert_eq!(
            err.client_message(),
            "A record with the same value for 'Isin' already exists."
        );
    }

    #[tokio::test]
    async fn overlong_isin_is_rejected_by_storage() {
        let repo = InMemoryCompanyRepository::new();
        let err = repo.insert(&company("US00000000001")).await.unwrap_err();
        assert_eq!(err.code, STRING_TOO_LONG);
        assert_eq!(err.client_message(), "A database error occurred.");
    }

    #[tokio::test]
    async fn list_is_ordered_by_creation() {
        let repo = InMemoryCompanyRepository::new();
        let base = Utc::now();
        for (offset, isin) in [(2, "US0000000003"), (0, "US0000000001"), (1, "US0000000002")] {
            let c = Company::from(CompanyDto {
                date_created: base + Duration::seconds(offset),
                ..company(isin).to_dto()
            });
            repo.insert(&c).await.unwrap();
        }

        let isins: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(|c| c.isin().to_string())
            .collect();
        assert_eq!(isins, vec!["US0000000001", "US0000000002", "US0000000003"]);
    }

    #[tokio::test]
    async fn update_stamps_and_preserves_creation() {
        let repo = InMemoryCompanyRepository::new();
        let acme = company("US0000000001");
        repo.insert(&acme).await.unwrap();

        let updated = repo
            .update(acme.id(), changes("US0000000001"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name(), "Renamed");
        assert_eq!(updated.date_created(), acme.date_created());
        assert!(updated.date_updated().is_some());
        assert_eq!(updated.updated_by(), Some("alice"));
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_none() {
        let repo = InMemoryCompanyRepository::new();
        let result = repo.update(CompanyId::new(), changes("US0000000001")).await;
        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn update_into_taken_isin_is_a_unique_violation() {
        let repo = InMemoryCompanyRepository::new();
        let first = company("US0000000001");
        let second = company("US0000000002");
        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();

        let err = repo
            .update(second.id(), changes("US0000000001"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageFailureKind::UniqueViolation);
    }
}
