//! HS256 token issuing and validation.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

/// Signing parameters shared by the issuer and the validator.
#[derive(Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Validates a raw bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

#[derive(Debug, Error)]
pub enum TokenIssueError {
    #[error("token lifetime must be positive")]
    InvalidTtl,

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// A freshly minted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Hs256TokenIssuer {
    settings: JwtSettings,
    key: EncodingKey,
}

impl Hs256TokenIssuer {
    pub fn new(settings: JwtSettings) -> Self {
        let key = EncodingKey::from_secret(settings.secret.as_bytes());
        Self { settings, key }
    }

    pub fn issue(&self, subject: &str, now: DateTime<Utc>) -> Result<IssuedToken, TokenIssueError> {
        if self.settings.ttl <= Duration::zero() {
            return Err(TokenIssueError::InvalidTtl);
        }
        let expires_at = now + self.settings.ttl;
        let claims = JwtClaims::new(
            subject,
            self.settings.issuer.clone(),
            self.settings.audience.clone(),
            now,
            expires_at,
        );
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)?;
        tracing::debug!(sub = %claims.sub, jti = %claims.jti, "issued bearer token");
        Ok(IssuedToken { token, expires_at })
    }
}

#[derive(Clone)]
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(settings: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        // The time window is checked against the caller's clock instead.
        validation.validate_exp = false;

        Self {
            key: DecodingKey::from_secret(settings.secret.as_bytes()),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Rejected(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> JwtSettings {
        JwtSettings {
            secret: "test-secret".to_string(),
            issuer: "corpreg".to_string(),
            audience: "corpreg-api".to_string(),
            ttl: Duration::minutes(60),
        }
    }

    #[test]
    fn issued_token_validates() {
        let settings = settings();
        let now = Utc::now();
        let issued = Hs256TokenIssuer::new(settings.clone()).issue("testuser", now).unwrap();

        let claims = Hs256JwtValidator::new(&settings)
            .validate(&issued.token, now)
            .unwrap();

        assert_eq!(claims.sub, "testuser");
        assert_eq!(claims.iss, "corpreg");
        assert_eq!(issued.expires_at, now + Duration::minutes(60));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = Utc::now();
        let issued = Hs256TokenIssuer::new(settings()).issue("testuser", now).unwrap();

        let other = JwtSettings {
            secret: "another-secret".to_string(),
            ..settings()
        };
        let err = Hs256JwtValidator::new(&other)
            .validate(&issued.token, now)
            .unwrap_err();
        assert!(matches!(err, TokenValidationError::Rejected(_)));
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let now = Utc::now();
        let issued = Hs256TokenIssuer::new(settings()).issue("testuser", now).unwrap();

        let other = JwtSettings {
            audience: "someone-else".to_string(),
            ..settings()
        };
        assert!(Hs256JwtValidator::new(&other).validate(&issued.token, now).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let settings = settings();
        let now = Utc::now();
        let issued = Hs256TokenIssuer::new(settings.clone()).issue("testuser", now).unwrap();

        let later = now + Duration::minutes(61);
        assert_eq!(
            Hs256JwtValidator::new(&settings).validate(&issued.token, later),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn garbage_is_rejected() {
        let err = Hs256JwtValidator::new(&settings())
            .validate("not-a-jwt", Utc::now())
            .unwrap_err();
        assert!(matches!(err, TokenValidationError::Rejected(_)));
    }

    #[test]
    fn non_positive_ttl_cannot_issue() {
        let issuer = Hs256TokenIssuer::new(JwtSettings {
            ttl: Duration::zero(),
            ..settings()
        });
        assert!(matches!(
            issuer.issue("testuser", Utc::now()),
            Err(TokenIssueError::InvalidTtl)
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        assert!(!format!("{:?}", settings()).contains("test-secret"));
    }
}
