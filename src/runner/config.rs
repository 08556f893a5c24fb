//! Run configuration with builder pattern.

use std::time::Duration;

use super::pipeline::{DEFAULT_TEMPLATE, OutputMode};
use crate::error::ConfigError;

/// Default provider when none is configured.
pub const DEFAULT_PROVIDER: &str = "shodan";
/// Default maximum results per (query, provider) task.
pub const DEFAULT_LIMIT: usize = 100;
/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for one fan-out run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Provider names, in launch order.
    pub providers: Vec<String>,
    /// Maximum results each provider task streams per query.
    pub limit: usize,
    /// Per-request timeout bound into every session.
    pub timeout: Duration,
    /// Output encoding, fixed for the whole run.
    pub output_mode: OutputMode,
    /// Optional cap on simultaneously running tasks (`None` = unbounded).
    pub max_concurrency: Option<usize>,
}

impl RunConfig {
    /// Creates a new builder for `RunConfig`.
    #[must_use]
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug, Clone, Default)]
pub struct RunConfigBuilder {
    providers: Option<Vec<String>>,
    limit: Option<usize>,
    timeout: Option<Duration>,
    output_mode: Option<OutputMode>,
    max_concurrency: Option<usize>,
}

impl RunConfigBuilder {
    /// Sets the provider names.
    #[must_use]
    pub fn providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.providers = Some(providers.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the per-task result limit.
    #[must_use]
    pub const fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the output mode.
    #[must_use]
    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = Some(mode);
        self
    }

    /// Caps the number of tasks running at once.
    #[must_use]
    pub const fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = Some(n);
        self
    }

    /// Builds the [`RunConfig`].
    ///
    /// Provider names are trimmed and lowercased; duplicates are kept so
    /// the task count stays `queries × providers` as configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] for an empty provider list,
    /// a zero limit, or a zero concurrency cap.
    pub fn build(self) -> Result<RunConfig, ConfigError> {
        let providers: Vec<String> = self
            .providers
            .unwrap_or_else(|| vec![DEFAULT_PROVIDER.to_string()])
            .into_iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        if providers.is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "providers",
                message: "at least one provider is required".to_string(),
            });
        }

        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "limit",
                message: "must be greater than zero".to_string(),
            });
        }

        if self.max_concurrency == Some(0) {
            return Err(ConfigError::InvalidSetting {
                name: "max_concurrency",
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(RunConfig {
            providers,
            limit,
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            output_mode: self
                .output_mode
                .unwrap_or_else(|| OutputMode::Template(DEFAULT_TEMPLATE.to_string())),
            max_concurrency: self.max_concurrency,
        })
    }
}
