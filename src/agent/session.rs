//! Per-task provider sessions.
//!
//! A [`Session`] binds one task's [`KeySet`] to an HTTP client configured
//! with the run timeout. Sessions are never shared between tasks, even for
//! the same provider.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::credentials::{Credential, KeySet};
use crate::error::{AgentError, SessionError};

/// Credentials, timeout, and HTTP client for a single provider task.
#[derive(Debug)]
pub struct Session {
    keys: KeySet,
    timeout: Duration,
    client: reqwest::Client,
    cancel: CancellationToken,
}

impl Session {
    /// Builds a session from a key set and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTimeout`] for a zero timeout and
    /// [`SessionError::Client`] if the HTTP client cannot be built.
    pub fn new(keys: KeySet, timeout: Duration) -> Result<Self, SessionError> {
        if timeout.is_zero() {
            return Err(SessionError::InvalidTimeout);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fanscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| SessionError::Client { source })?;

        Ok(Self {
            keys,
            timeout,
            client,
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the session's cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Key set bound to this session.
    #[must_use]
    pub const fn keys(&self) -> &KeySet {
        &self.keys
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// HTTP client for provider requests.
    #[must_use]
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Token cancelled when the run is asked to stop.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns this session's credential for `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MissingCredentials`] if the key set has none.
    pub fn credential(&self, provider: &str) -> Result<&Credential, AgentError> {
        self.keys
            .get(provider)
            .ok_or_else(|| AgentError::MissingCredentials {
                provider: provider.to_string(),
            })
    }
}

/// Creates sessions for provider tasks.
pub trait SessionFactory: Send + Sync {
    /// Binds a key set and timeout into a new session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the session cannot be established.
    fn new_session(&self, keys: KeySet, timeout: Duration) -> Result<Session, SessionError>;
}

/// Default factory backed by [`Session::new`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpSessionFactory;

impl SessionFactory for HttpSessionFactory {
    fn new_session(&self, keys: KeySet, timeout: Duration) -> Result<Session, SessionError> {
        Session::new(keys, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_rejects_zero_timeout() {
        let err = Session::new(KeySet::new(), Duration::ZERO).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTimeout));
    }

    #[test]
    fn test_session_credential_lookup() {
        let keys = KeySet::new().with("shodan", Credential::token("k"));
        let session = HttpSessionFactory
            .new_session(keys, Duration::from_secs(5))
            .unwrap_or_else(|e| unreachable!("{e}"));

        assert_eq!(session.timeout(), Duration::from_secs(5));
        assert!(session.credential("shodan").is_ok());
        assert!(matches!(
            session.credential("fofa"),
            Err(AgentError::MissingCredentials { .. })
        ));
    }

    #[test]
    fn test_with_cancellation_shares_token() {
        let parent = CancellationToken::new();
        let session = Session::new(KeySet::new(), Duration::from_secs(1))
            .unwrap_or_else(|e| unreachable!("{e}"))
            .with_cancellation(parent.child_token());
        assert!(!session.cancellation().is_cancelled());
        parent.cancel();
        assert!(session.cancellation().is_cancelled());
    }
}
