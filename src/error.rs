//! Error types for fanscan.
//!
//! Errors are split by how far they propagate: [`RunError`] aborts a whole
//! run before any task starts, [`SessionError`] and [`AgentError`] end a
//! single provider task, and [`OutputError`] is confined to one output
//! destination. [`Error`] aggregates all of them for the CLI layer.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Run-fatal precondition failure.
    #[error(transparent)]
    Run(#[from] RunError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Output destination error.
    #[error(transparent)]
    Output(#[from] OutputError),

    /// I/O error outside any output destination.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Conditions that abort a run before any task is spawned.
///
/// These are the only errors a run ever returns; per-task failures are
/// logged and counted instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunError {
    /// No provider credentials are configured at all.
    #[error("no provider credentials configured")]
    NoCredentials,

    /// A configured provider name has no registered agent.
    #[error("unknown provider: {name}")]
    UnknownProvider {
        /// The rejected provider name.
        name: String,
    },
}

/// Failure to bind credentials into a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A zero timeout would fail every request immediately.
    #[error("session timeout must be greater than zero")]
    InvalidTimeout,

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// Underlying client builder error.
        #[source]
        source: reqwest::Error,
    },
}

/// Errors raised by provider agents.
///
/// Returned from [`Agent::query`](crate::agent::Agent::query) when a query
/// cannot start at all, and carried as text inside a
/// [`HostResult`](crate::core::HostResult) when a page fails mid-stream.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The session has no credential for this provider.
    #[error("no credentials available for {provider}")]
    MissingCredentials {
        /// Provider name.
        provider: String,
    },

    /// The query was rejected before any request was sent.
    #[error("invalid query: {message}")]
    InvalidQuery {
        /// Reason the query was rejected.
        message: String,
    },

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider API answered with an error.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Provider-supplied message.
        message: String,
    },

    /// The provider response could not be decoded.
    #[error("failed to decode response: {message}")]
    Decode {
        /// Decode failure detail.
        message: String,
    },
}

/// A write to one output destination failed.
#[derive(Debug, Error)]
pub enum OutputError {
    /// I/O failure on a named destination.
    #[error("write to {destination} failed: {source}")]
    Io {
        /// Destination label.
        destination: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Configuration and input errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be parsed.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A credential entry does not have the expected shape.
    #[error("invalid {provider} credential entry: expected {expected}")]
    InvalidCredential {
        /// Provider the entry was listed under.
        provider: String,
        /// Expected entry format.
        expected: &'static str,
    },

    /// A run setting is out of range.
    #[error("invalid setting {name}: {message}")]
    InvalidSetting {
        /// Setting name.
        name: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// No queries were supplied.
    #[error("no queries provided (use --query, --list, or stdin)")]
    NoQueries,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_error_display() {
        assert_eq!(
            RunError::NoCredentials.to_string(),
            "no provider credentials configured"
        );
        let err = RunError::UnknownProvider {
            name: "zoomeye".to_string(),
        };
        assert_eq!(err.to_string(), "unknown provider: zoomeye");
    }

    #[test]
    fn test_error_from_run_error() {
        let err: Error = RunError::NoCredentials.into();
        assert!(matches!(err, Error::Run(RunError::NoCredentials)));
    }

    #[test]
    fn test_agent_error_display() {
        let err = AgentError::Api {
            status: 401,
            message: "bad key".to_string(),
        };
        assert_eq!(err.to_string(), "API error (status 401): bad key");
    }
}
