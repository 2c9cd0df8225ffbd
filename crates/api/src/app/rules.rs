//! Cross-record rules that need a repository lookup.

use corpreg_core::{CreateCompany, ValidationFailure, ValidationOutcome};
use corpreg_infra::{CompanyRepository, StorageError};

pub const DUPLICATE_ISIN_MESSAGE: &str = "Company with the same ISIN already exists";

/// Rules for a creation payload that already passed field validation.
///
/// The ISIN check is a fast path only; the unique constraint in storage
/// settles concurrent creations.
pub async fn check_create(
    repository: &dyn CompanyRepository,
    payload: &CreateCompany,
) -> Result<ValidationOutcome, StorageError> {
    let mut failures = Vec::new();

    if repository.find_by_isin(&payload.isin).await?.is_some() {
        failures.push(ValidationFailure::new("Isin", DUPLICATE_ISIN_MESSAGE));
    }

    Ok(ValidationOutcome::from_failures(failures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use corpreg_core::Company;
    use corpreg_infra::InMemoryCompanyRepository;

    fn payload(isin: &str) -> CreateCompany {
        CreateCompany {
            name: "Acme".to_string(),
            exchange: "NYSE".to_string(),
            ticker: "ACME".to_string(),
            isin: isin.to_string(),
            website: None,
        }
    }

    #[tokio::test]
    async fn unknown_isin_passes() {
        let repo = InMemoryCompanyRepository::new();
        let outcome = check_create(&repo, &payload("US0000000001")).await.unwrap();
        assert!(outcome.is_valid());
    }

    #[tokio::test]
    async fn existing_isin_fails_under_isin_key() {
        let repo = InMemoryCompanyRepository::new();
        repo.insert(&Company::create(payload("US0000000001"), Utc::now()))
            .await
            .unwrap();

        let map = check_create(&repo, &payload("US0000000001"))
            .await
            .unwrap()
            .into_error_map();

        assert_eq!(map.len(), 1);
        assert_eq!(map["Isin"], vec![DUPLICATE_ISIN_MESSAGE]);
    }
}
