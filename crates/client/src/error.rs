use thiserror::Error;

/// Failures that prevent a call from producing any envelope at all.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token request rejected with status {0}")]
    TokenRejected(u16),

    #[error("token endpoint returned no usable token")]
    InvalidToken,

    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}
