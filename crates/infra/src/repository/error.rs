//! Storage failures and their translation into client-safe messages.
//!
//! ## Classification
//!
//! | Engine code | Kind | Client message |
//! |-------------|------|----------------|
//! | `2601`, `2627`, `23505` | unique violation | `A record with the same value for '<field>' already exists.` |
//! | `547`, `23503` | foreign key violation | `A foreign key constraint prevents this action.` |
//! | anything else | | `A database error occurred.` |
//!
//! The raw engine message is only used to recover the constraint name and
//! never reaches the client.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Error key under which classified storage messages are reported.
pub const DATABASE_ERROR_KEY: &str = "Database";

const UNIQUE_VIOLATION_CODES: [i32; 3] = [2601, 2627, 23505];
const FOREIGN_KEY_VIOLATION_CODES: [i32; 2] = [547, 23503];

static CONSTRAINT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bconstraint\s+['"]?(?P<name>\w+)['"]?"#)
        .unwrap_or_else(|e| panic!("constraint pattern does not compile: {e}"))
});

/// A failure reported by the storage engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("storage error {code}: {message}")]
pub struct StorageError {
    /// Engine error number (SQLSTATE parsed as a number for Postgres, 0 when unknown).
    pub code: i32,
    /// Raw engine text.
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFailureKind {
    UniqueViolation,
    ForeignKeyViolation,
    Other,
}

impl StorageError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Map a sqlx error raised while running `operation`.
    pub fn from_sqlx(operation: &str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err
                    .code()
                    .and_then(|c| c.parse::<i32>().ok())
                    .unwrap_or(0);
                let message = match db_err.constraint() {
                    // Postgres reports the constraint separately; keep it in the text.
                    Some(name) if !db_err.message().contains(name) => {
                        format!("{} (constraint \"{}\")", db_err.message(), name)
                    }
                    _ => db_err.message().to_string(),
                };
                Self::new(code, message)
            }
            sqlx::Error::PoolClosed => {
                Self::new(0, format!("connection pool closed in {operation}"))
            }
            other => Self::new(0, format!("sqlx error in {operation}: {other}")),
        }
    }

    pub fn kind(&self) -> StorageFailureKind {
        if UNIQUE_VIOLATION_CODES.contains(&self.code) {
            StorageFailureKind::UniqueViolation
        } else if FOREIGN_KEY_VIOLATION_CODES.contains(&self.code) {
            StorageFailureKind::ForeignKeyViolation
        } else {
            StorageFailureKind::Other
        }
    }

    /// Client-facing message for this failure.
    pub fn client_message(&self) -> String {
        match self.kind() {
            StorageFailureKind::UniqueViolation => match constraint_name(&self.message) {
                Some(name) => format!(
                    "A record with the same value for '{}' already exists.",
                    field_from_constraint(name)
                ),
                None => "A record with duplicate data already exists.".to_string(),
            },
            StorageFailureKind::ForeignKeyViolation => {
                "A foreign key constraint prevents this action.".to_string()
            }
            StorageFailureKind::Other => "A database error occurred.".to_string(),
        }
    }
}

/// Constraint name mentioned in an engine message, if any.
pub fn constraint_name(message: &str) -> Option<&str> {
    CONSTRAINT_NAME
        .captures(message)
        .and_then(|caps| caps.name("name"))
        .map(|m| m.as_str())
}

/// Best-effort field name: last segment of names like `UQ_Companies_Isin`.
pub fn field_from_constraint(name: &str) -> &str {
    let segments: Vec<&str> = name.split('_').collect();
    if segments.len() >= 3 {
        segments[segments.len() - 1]
    } else {
        name
    }
}
