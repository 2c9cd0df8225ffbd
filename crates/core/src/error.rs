//! Domain error model.

use thiserror::Error;

/// Domain-level error.
///
/// Field validation does not go through this type; it is reported as a
/// [`crate::ValidationOutcome`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Title shown to API callers.
    pub fn title(&self) -> &str {
        match self {
            Self::InvalidId(_) => "Invalid identifier",
        }
    }

    /// Detail shown to API callers.
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidId(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_id_has_fixed_title() {
        let err = DomainError::invalid_id("CompanyId: bad");
        assert_eq!(err.title(), "Invalid identifier");
        assert_eq!(err.detail(), "CompanyId: bad");
        assert_eq!(err.to_string(), "invalid identifier: CompanyId: bad");
    }
}
