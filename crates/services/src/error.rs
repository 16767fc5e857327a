//! Shared error types for the services crate.

use thiserror::Error;

use storage::sqlite::SqliteInitError;

use crate::config::ConfigError;
use crate::sessions::LifecycleState;

/// Discriminant of an [`ApiError`], for callers that only branch on the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    AuthenticationFailed,
    Http,
    Transport,
    InvalidRequest,
    InvalidResponse,
}

/// Errors emitted by the request gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// The backend answered 401. The stored credential has already been cleared.
    #[error("session expired, please sign in again")]
    AuthenticationFailed,
    #[error("{message} (status {status})")]
    Http { status: u16, message: String },
    /// No response was obtained.
    #[error("network request failed: {0}")]
    Transport(String),
    #[error("could not encode request body: {0}")]
    InvalidRequest(String),
    #[error("unexpected response body: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    #[must_use]
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            Self::AuthenticationFailed => ApiErrorKind::AuthenticationFailed,
            Self::Http { .. } => ApiErrorKind::Http,
            Self::Transport(_) => ApiErrorKind::Transport,
            Self::InvalidRequest(_) => ApiErrorKind::InvalidRequest,
            Self::InvalidResponse(_) => ApiErrorKind::InvalidResponse,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed => Some(401),
            Self::Http { status, .. } => Some(*status),
            Self::Transport(_) | Self::InvalidRequest(_) | Self::InvalidResponse(_) => None,
        }
    }
}

/// Errors emitted by the question lifecycle controllers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("request cancelled")]
    Cancelled,
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: LifecycleState,
    },
    #[error("no option labeled {0}")]
    UnknownOption(String),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_statuses_are_discriminated() {
        let http = ApiError::Http {
            status: 503,
            message: "Service unavailable".into(),
        };
        assert_eq!(http.kind(), ApiErrorKind::Http);
        assert_eq!(http.status(), Some(503));
        assert_eq!(http.to_string(), "Service unavailable (status 503)");

        assert_eq!(ApiError::AuthenticationFailed.status(), Some(401));
        assert_eq!(ApiError::Transport("refused".into()).status(), None);
    }
}
