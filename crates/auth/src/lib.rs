//! `corpreg-auth` — bearer token issuing and validation.
//!
//! This crate is decoupled from HTTP and storage: it knows how to mint and
//! check HS256 tokens and how to compare presented credentials.

pub mod claims;
pub mod credentials;
pub mod jwt;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use credentials::ApiCredentials;
pub use jwt::{
    Hs256JwtValidator, Hs256TokenIssuer, IssuedToken, JwtSettings, JwtValidator, TokenIssueError,
};
