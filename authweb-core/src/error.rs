use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider redirected back with an `error` query parameter.
    #[error("Provider reported error: {error}")]
    ProviderReported {
        error: String,
        description: Option<String>,
    },

    #[error("Provider responded with HTTP {status}: {body}")]
    ProviderStatus { status: StatusCode, body: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Unexpected content type in response: {0}")]
    UnexpectedContentType(String),

    #[error("Failed to decode response body: {0}")]
    Decode(String),

    #[error("No token in session: missing {0}")]
    SessionMissing(&'static str),

    #[error("Malformed session entry {key}: {reason}")]
    SessionMalformed { key: &'static str, reason: String },

    /// The callback carried neither an error nor an authorization code.
    #[error("No authorization code returned by provider")]
    MissingCode,
}

/// Coarse classification used when deciding how a failure is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Provider,
    Transport,
    Protocol,
    Session,
}

impl Error {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Config,
            Self::ProviderReported { .. } | Self::ProviderStatus { .. } | Self::MissingCode => {
                ErrorCategory::Provider
            }
            Self::Transport(_) | Self::Timeout(_) | Self::Cancelled => ErrorCategory::Transport,
            Self::UnexpectedContentType(_) | Self::Decode(_) => ErrorCategory::Protocol,
            Self::SessionMissing(_) | Self::SessionMalformed { .. } => ErrorCategory::Session,
        }
    }

    /// Errors that mean "please sign in again" rather than a provider-side failure.
    #[must_use]
    pub const fn is_session(&self) -> bool {
        matches!(self.category(), ErrorCategory::Session)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(Error::Config("x".into()).category(), ErrorCategory::Config);
        assert_eq!(
            Error::ProviderStatus {
                status: StatusCode::BAD_REQUEST,
                body: String::new(),
            }
            .category(),
            ErrorCategory::Provider
        );
        assert_eq!(
            Error::Timeout(Duration::from_secs(10)).category(),
            ErrorCategory::Transport
        );
        assert_eq!(Error::Cancelled.category(), ErrorCategory::Transport);
        assert_eq!(
            Error::UnexpectedContentType("text/html".into()).category(),
            ErrorCategory::Protocol
        );
        assert!(Error::SessionMissing("oauth2_scope").is_session());
        assert!(!Error::Decode("eof".into()).is_session());
    }

    #[test]
    fn test_provider_status_display_includes_body() {
        let err = Error::ProviderStatus {
            status: StatusCode::BAD_REQUEST,
            body: r#"{"error":"invalid_grant"}"#.to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("invalid_grant"));
    }
}
