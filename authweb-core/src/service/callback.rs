//! Provider callback handling
//!
//! ```text
//! AwaitingCallback ─┬─ error param ──────> ErrorFromProvider ─> Failed
//!                   ├─ no code ──────────> MissingCode ───────> Failed
//!                   └─ code ─> ExchangingToken ─┬─ ok ─> Authenticated
//!                                               └─ err ─> Failed
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::oauth2::{Session, SessionTokenStore, TokenExchange};
use crate::Error;

/// Query parameters the provider appends to the redirect URI
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Callback carrying an authorization code
    #[must_use]
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    /// Callback carrying a provider error
    #[must_use]
    pub fn with_error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackState {
    AwaitingCallback,
    ErrorFromProvider,
    MissingCode,
    ExchangingToken,
    Authenticated,
    Failed,
}

impl CallbackState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingCallback => "awaiting_callback",
            Self::ErrorFromProvider => "error_from_provider",
            Self::MissingCode => "missing_code",
            Self::ExchangingToken => "exchanging_token",
            Self::Authenticated => "authenticated",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Failed)
    }
}

impl fmt::Display for CallbackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of handling one callback
#[derive(Debug)]
pub struct CallbackOutcome {
    /// Always [`CallbackState::Authenticated`] or [`CallbackState::Failed`]
    pub state: CallbackState,
    /// Every state visited, in order, ending with `state`
    pub trail: Vec<CallbackState>,
    /// Why the callback failed; `None` when authenticated
    pub error: Option<Error>,
}

impl CallbackOutcome {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state == CallbackState::Authenticated
    }
}

struct Trail(Vec<CallbackState>);

impl Trail {
    fn new() -> Self {
        Self(vec![CallbackState::AwaitingCallback])
    }

    fn visit(&mut self, state: CallbackState) {
        self.0.push(state);
    }

    fn authenticated(mut self) -> CallbackOutcome {
        self.visit(CallbackState::Authenticated);
        CallbackOutcome {
            state: CallbackState::Authenticated,
            trail: self.0,
            error: None,
        }
    }

    fn failed(mut self, error: Error) -> CallbackOutcome {
        self.visit(CallbackState::Failed);
        CallbackOutcome {
            state: CallbackState::Failed,
            trail: self.0,
            error: Some(error),
        }
    }
}

/// Drives a single provider callback to a terminal state.
///
/// The session is only written after a token has been fully received and
/// decoded; a failed callback leaves it untouched.
#[derive(Clone)]
pub struct CallbackOrchestrator {
    exchanger: Arc<dyn TokenExchange>,
    exchange_timeout: Duration,
}

impl fmt::Debug for CallbackOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackOrchestrator")
            .field("exchange_timeout", &self.exchange_timeout)
            .finish_non_exhaustive()
    }
}

impl CallbackOrchestrator {
    #[must_use]
    pub fn new(exchanger: Arc<dyn TokenExchange>, exchange_timeout: Duration) -> Self {
        Self {
            exchanger,
            exchange_timeout,
        }
    }

    pub async fn handle_callback(
        &self,
        params: &CallbackParams,
        session: &mut Session,
        cancel: &CancellationToken,
    ) -> CallbackOutcome {
        let mut trail = Trail::new();

        if let Some(error) = params.error.as_deref().filter(|e| !e.is_empty()) {
            warn!(
                error = %error,
                description = params.error_description.as_deref().unwrap_or_default(),
                "Provider returned an error to the callback"
            );
            trail.visit(CallbackState::ErrorFromProvider);
            return trail.failed(Error::ProviderReported {
                error: error.to_string(),
                description: params.error_description.clone(),
            });
        }

        let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
            warn!("Callback carried no authorization code");
            trail.visit(CallbackState::MissingCode);
            return trail.failed(Error::MissingCode);
        };

        trail.visit(CallbackState::ExchangingToken);
        match self
            .exchanger
            .exchange_code(code, self.exchange_timeout, cancel)
            .await
        {
            Ok(token) => {
                SessionTokenStore::persist(session, &token);
                info!(token_type = %token.token_type, "User signed in");
                trail.authenticated()
            }
            Err(e) => {
                warn!(error = %e, category = ?e.category(), "Token exchange failed");
                trail.failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth2::{MockTokenExchange, TokenEntity};
    use crate::ErrorCategory;

    fn token() -> TokenEntity {
        serde_json::from_str(
            r#"{"access_token":"abc","token_type":"Bearer","expires_in":3600,"refresh_token":"r","scope":"openid"}"#,
        )
        .unwrap()
    }

    fn orchestrator(mock: MockTokenExchange) -> CallbackOrchestrator {
        CallbackOrchestrator::new(Arc::new(mock), Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_provider_error_skips_exchange() {
        let mut mock = MockTokenExchange::new();
        mock.expect_exchange_code().times(0);

        let mut session = Session::new();
        let params = CallbackParams {
            error: Some("access_denied".to_string()),
            error_description: Some("The user denied access".to_string()),
            ..CallbackParams::default()
        };
        let outcome = orchestrator(mock)
            .handle_callback(&params, &mut session, &CancellationToken::new())
            .await;

        assert_eq!(outcome.state, CallbackState::Failed);
        assert_eq!(
            outcome.trail,
            vec![
                CallbackState::AwaitingCallback,
                CallbackState::ErrorFromProvider,
                CallbackState::Failed
            ]
        );
        assert!(matches!(
            outcome.error,
            Some(Error::ProviderReported { ref error, .. }) if error == "access_denied"
        ));
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn test_error_wins_over_code() {
        let mut mock = MockTokenExchange::new();
        mock.expect_exchange_code().times(0);

        let params = CallbackParams {
            code: Some("abc".to_string()),
            error: Some("server_error".to_string()),
            ..CallbackParams::default()
        };
        let outcome = orchestrator(mock)
            .handle_callback(&params, &mut Session::new(), &CancellationToken::new())
            .await;

        assert_eq!(outcome.trail[1], CallbackState::ErrorFromProvider);
    }

    #[tokio::test]
    async fn test_missing_code() {
        let mut mock = MockTokenExchange::new();
        mock.expect_exchange_code().times(0);
        let orchestrator = orchestrator(mock);

        for params in [CallbackParams::default(), CallbackParams::with_code("")] {
            let outcome = orchestrator
                .handle_callback(&params, &mut Session::new(), &CancellationToken::new())
                .await;

            assert!(!outcome.is_authenticated());
            assert_eq!(
                outcome.trail,
                vec![
                    CallbackState::AwaitingCallback,
                    CallbackState::MissingCode,
                    CallbackState::Failed
                ]
            );
            assert!(matches!(outcome.error, Some(Error::MissingCode)));
        }
    }

    #[tokio::test]
    async fn test_successful_exchange_persists_token() {
        let mut mock = MockTokenExchange::new();
        mock.expect_exchange_code()
            .withf(|code, timeout, _| code.to_string() == "4/0Ad" && *timeout == Duration::from_secs(10))
            .times(1)
            .returning(|_, _, _| Ok(token()));

        let mut session = Session::new();
        let outcome = orchestrator(mock)
            .handle_callback(
                &CallbackParams::with_code("4/0Ad"),
                &mut session,
                &CancellationToken::new(),
            )
            .await;

        assert!(outcome.is_authenticated());
        assert!(outcome.error.is_none());
        assert_eq!(
            outcome.trail,
            vec![
                CallbackState::AwaitingCallback,
                CallbackState::ExchangingToken,
                CallbackState::Authenticated
            ]
        );
        let loaded = SessionTokenStore::load(&session).unwrap();
        assert_eq!(loaded.access_token.secret(), "abc");
    }

    #[tokio::test]
    async fn test_failed_exchange_leaves_session_untouched() {
        let mut mock = MockTokenExchange::new();
        mock.expect_exchange_code()
            .times(1)
            .returning(|_, timeout, _| Err(Error::Timeout(timeout)));

        let mut session = Session::new();
        session.insert("theme", "dark");
        let outcome = orchestrator(mock)
            .handle_callback(
                &CallbackParams::with_code("abc"),
                &mut session,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome.state, CallbackState::Failed);
        assert!(outcome.state.is_terminal());
        assert_eq!(
            outcome.error.as_ref().map(Error::category),
            Some(ErrorCategory::Transport)
        );
        assert!(!SessionTokenStore::has_token(&session));
        assert_eq!(session.len(), 1);
    }
}
