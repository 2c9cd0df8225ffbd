//! Infrastructure layer: configuration and company storage.

pub mod config;
pub mod repository;

pub use config::{AppConfig, ConfigError};
pub use repository::{
    CompanyRepository, InMemoryCompanyRepository, PostgresCompanyRepository, StorageError,
};
