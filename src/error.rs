//! Error types shared by the session, network, and configuration layers.
//!
//! ERROR HANDLING
//! ==============
//! Storage and normalization never surface errors; they fall back to
//! absence. Only network calls, callback flows, and config parsing produce
//! `AuthError`/`ConfigError` values, and callers pick the recovery policy.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Failures observed while establishing or refreshing a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("network error: {0}")]
    Network(String),
    #[error("identity endpoint rejected the token: {0}")]
    Unauthorized(u16),
    #[error("request failed: {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("response did not include a token")]
    MissingToken,
    #[error("identity payload has no user id")]
    MissingUserId,
    #[error("identity provider returned an error: {0}")]
    Provider(String),
    #[error("no identity provider handles {0}")]
    UnknownProvider(String),
    #[error("please sign in")]
    NotSignedIn,
}

impl AuthError {
    /// Classify a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized(status),
            _ => Self::Status(status),
        }
    }

    /// Whether the server says the token itself is no longer valid.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Invalid build-time configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a path starting with '/': {value}")]
    InvalidPath { var: &'static str, value: String },
    #[error("{var} must not be an entry path: {value}")]
    LandingIsEntry { var: &'static str, value: String },
    #[error("{var} must not be a provider callback path: {value}")]
    LandingIsCallback { var: &'static str, value: String },
    #[error("{var} is not a number: {value}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("unknown refresh policy: {0}")]
    InvalidRefreshPolicy(String),
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}
