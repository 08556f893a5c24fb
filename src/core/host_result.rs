//! Host result record produced by provider agents.

use serde::{Deserialize, Serialize};

/// One host/port observation returned by a provider.
///
/// Agents create results with `timestamp` left at zero; the runner stamps
/// it exactly once when the record is consumed. A record with `error` set
/// reports a provider-side problem and is never written to output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostResult {
    /// IP address as reported by the provider.
    pub ip: String,
    /// Hostname, empty when the provider has none.
    pub host: String,
    /// Port number.
    pub port: u16,
    /// Unix seconds at which the record was consumed.
    pub timestamp: i64,
    /// Provider-side error for this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HostResult {
    /// Creates a result for an observed host.
    #[must_use]
    pub fn new(ip: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            host: host.into(),
            port,
            timestamp: 0,
            error: None,
        }
    }

    /// Creates a record that only carries a provider error.
    #[must_use]
    pub fn from_error(error: impl std::fmt::Display) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    /// Returns `true` if this record carries a provider error.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
