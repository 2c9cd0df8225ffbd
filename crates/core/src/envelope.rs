//! Uniform success/failure wrapper for every API response.
//!
//! An [`ApiResult`] is built once through one of its factories and is never
//! mutated afterwards: fields are private and only readable through getters.
//! The JSON shape is shared by the server and the client:
//!
//! ```json
//! { "success": false, "message": "Validation failed", "data": null,
//!   "errors": { "Isin": ["ISIN is required."] }, "statusCode": 400 }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Category or field key → ordered messages.
pub type ErrorMap = BTreeMap<String, Vec<String>>;

/// Key used by [`ApiResult::problem`] and [`ApiResult::failure_with_messages`].
pub const GENERIC_ERROR_KEY: &str = "Error";

const DEFAULT_FAILURE_STATUS: u16 = 400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResult<T> {
    success: bool,
    message: String,
    data: Option<T>,
    #[serde(default)]
    errors: ErrorMap,
    #[serde(default)]
    status_code: Option<u16>,
}

impl<T> ApiResult<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: ErrorMap::new(),
            status_code: None,
        }
    }

    /// Failure with a message only.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::failure_with_messages(message, Vec::new())
    }

    /// Failure carrying loose messages, grouped under the generic `"Error"` key.
    pub fn failure_with_messages(message: impl Into<String>, messages: Vec<String>) -> Self {
        let mut errors = ErrorMap::new();
        if !messages.is_empty() {
            errors.insert(GENERIC_ERROR_KEY.to_string(), messages);
        }
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors,
            status_code: None,
        }
    }

    /// Failure carrying a field → messages map; `status` defaults to 400.
    pub fn failure_with_errors(
        message: impl Into<String>,
        errors: ErrorMap,
        status: Option<u16>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors,
            status_code: Some(status.unwrap_or(DEFAULT_FAILURE_STATUS)),
        }
    }

    /// A declared problem: `title` becomes the message, `detail` the only error.
    pub fn problem(title: impl Into<String>, detail: impl Into<String>, status: u16) -> Self {
        let mut errors = ErrorMap::new();
        errors.insert(GENERIC_ERROR_KEY.to_string(), vec![detail.into()]);
        Self {
            success: false,
            message: title.into(),
            data: None,
            errors,
            status_code: Some(status),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }
}
