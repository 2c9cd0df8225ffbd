//! `corpreg-core` — domain foundation for the company registry.
//!
//! This crate contains **pure domain** code: the `Company` record, its
//! payloads, field validation and the result envelope shared by the API and
//! its clients. No I/O lives here.

pub mod company;
pub mod envelope;
pub mod error;
pub mod id;
pub mod validation;

pub use company::{Company, CompanyChanges, CompanyDto, CreateCompany, UpdateCompany};
pub use envelope::{ApiResult, ErrorMap};
pub use error::DomainError;
pub use id::CompanyId;
pub use validation::{ValidationFailure, ValidationOutcome, validate_create, validate_update};
