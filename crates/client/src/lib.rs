//! `corpreg-client` — typed HTTP client for the company registry API.
//!
//! Every call resolves to an [`ApiResult`](corpreg_core::ApiResult), whatever
//! the server answered: envelopes pass through, problem bodies and unexpected
//! payloads are folded into failure envelopes.

pub mod companies;
pub mod config;
pub mod error;
pub mod token;

pub use companies::CompanyClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use token::TokenService;
