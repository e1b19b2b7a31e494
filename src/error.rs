use std::fmt;
use std::fmt::{Display, Formatter};

/// Error model shared by the admin and read endpoints. Every variant maps to
/// one HTTP status so callers can tell "feature disabled" (503) apart from
/// "bad key" (401), "bad input" (400), "no such post" (404) and "the remote
/// store misbehaved" (500).
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    NotConfigured(String),
    Unauthorized,
    Validation(String),
    NotFound(String),
    Upstream(String),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::NotConfigured(_) => 503,
            ApiError::Unauthorized => 401,
            ApiError::Validation(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Upstream(_) => 500,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::NotConfigured(message)
            | ApiError::Validation(message)
            | ApiError::NotFound(message)
            | ApiError::Upstream(message) => message.as_str(),
            ApiError::Unauthorized => "Unauthorized",
        }
    }

    /// Annotates a fallback error with the local failure that caused the
    /// fallback in the first place. Local I/O errors are never surfaced
    /// alone, but they must not disappear from the diagnostics either.
    pub fn with_local_failure(self, reason: &str) -> ApiError {
        match self {
            ApiError::Upstream(message) => {
                ApiError::Upstream(format!("{} (after local failure: {})", message, reason))
            }
            other => other,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}
