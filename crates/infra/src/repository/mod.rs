//! Company storage boundary.
//!
//! Handlers and services only see [`CompanyRepository`]; the process picks
//! the Postgres implementation when a database is configured and the
//! in-memory one otherwise. Both report ISIN collisions the same way (unique
//! constraint `UQ_Companies_Isin`, code `23505`), so failure classification
//! does not depend on the backend.

pub mod error;
pub mod in_memory;
pub mod postgres;

use corpreg_core::{Company, CompanyChanges, CompanyId};

pub use error::{DATABASE_ERROR_KEY, StorageError, StorageFailureKind};
pub use in_memory::InMemoryCompanyRepository;
pub use postgres::PostgresCompanyRepository;

/// Name of the unique constraint guarding `isin`.
pub const ISIN_UNIQUE_CONSTRAINT: &str = "UQ_Companies_Isin";

#[async_trait::async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn find_by_id(&self, id: CompanyId) -> Result<Option<Company>, StorageError>;

    async fn find_by_isin(&self, isin: &str) -> Result<Option<Company>, StorageError>;

    /// All companies, oldest first.
    async fn list_all(&self) -> Result<Vec<Company>, StorageError>;

    async fn insert(&self, company: &Company) -> Result<(), StorageError>;

    /// Apply `changes` to an existing record, stamping `date_updated`.
    ///
    /// Returns `Ok(None)` when no record has this id.
    async fn update(
        &self,
        id: CompanyId,
        changes: CompanyChanges,
    ) -> Result<Option<Company>, StorageError>;
}
