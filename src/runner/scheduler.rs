//! Fan-out scheduler.
//!
//! Launches one task per (query, provider) pair, each with its own key set
//! and session, and waits for every task before returning.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::RunConfig;
use super::outcome::{RunSummary, TaskOutcome};
use super::output::OutputWriter;
use super::pipeline::{OutputMode, drain};
use crate::agent::{Agent, AgentRegistry, HttpSessionFactory, SessionFactory};
use crate::core::Query;
use crate::credentials::CredentialPool;
use crate::error::RunError;

/// Runs queries against every configured provider concurrently.
pub struct Runner {
    config: RunConfig,
    pool: Arc<dyn CredentialPool>,
    registry: AgentRegistry,
    sessions: Arc<dyn SessionFactory>,
}

impl Runner {
    /// Creates a runner with the built-in providers and HTTP sessions.
    pub fn new(config: RunConfig, pool: Arc<dyn CredentialPool>) -> Self {
        Self {
            config,
            pool,
            registry: AgentRegistry::builtin(),
            sessions: Arc::new(HttpSessionFactory),
        }
    }

    /// Replaces the provider registry.
    #[must_use]
    pub fn with_registry(mut self, registry: AgentRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the session factory.
    #[must_use]
    pub fn with_session_factory(mut self, sessions: Arc<dyn SessionFactory>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Run configuration.
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs every query against every configured provider.
    ///
    /// Returns only after all spawned tasks have finished. Cancelling
    /// `cancel` asks agents to end their streams early; a task whose agent
    /// ignores it is still awaited.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::NoCredentials`] if the pool holds no keys and
    /// [`RunError::UnknownProvider`] for an unregistered provider name.
    /// Both are checked before any task starts. Failures inside individual
    /// tasks are logged and counted in the [`RunSummary`] instead.
    pub async fn run(
        &self,
        queries: &[String],
        output: Arc<OutputWriter>,
        cancel: CancellationToken,
    ) -> Result<RunSummary, RunError> {
        if !self.pool.has_keys() {
            return Err(RunError::NoCredentials);
        }
        let agents = self.registry.resolve(&self.config.providers)?;

        let start = Instant::now();
        let mode = Arc::new(self.config.output_mode.clone());
        let semaphore = self
            .config
            .max_concurrency
            .map(|n| Arc::new(Semaphore::new(n)));

        info!(
            queries = queries.len(),
            providers = ?self.config.providers,
            "starting enumeration"
        );

        let mut handles = Vec::with_capacity(queries.len() * agents.len());
        for text in queries {
            let query = Arc::new(Query::new(text.clone(), self.config.limit));
            for agent in &agents {
                let task = ProviderTask {
                    agent: Arc::clone(agent),
                    query: Arc::clone(&query),
                    pool: Arc::clone(&self.pool),
                    sessions: Arc::clone(&self.sessions),
                    timeout: self.config.timeout,
                    mode: Arc::clone(&mode),
                    output: Arc::clone(&output),
                    cancel: cancel.child_token(),
                };
                let permits = semaphore.clone();

                let handle = tokio::spawn(async move {
                    let _permit = match &permits {
                        Some(sem) => sem.acquire().await.ok(),
                        None => None,
                    };
                    task.run().await
                });
                handles.push((agent.name(), handle));
            }
        }

        let mut summary = RunSummary {
            tasks_spawned: handles.len(),
            ..RunSummary::default()
        };
        for (provider, handle) in handles {
            let outcome = handle.await.unwrap_or_else(|e| {
                error!(provider, error = %e, "provider task panicked");
                TaskOutcome::Panicked
            });
            summary.record(&outcome);
        }

        info!(
            tasks = summary.tasks_spawned,
            completed = summary.tasks_completed,
            failed = summary.tasks_failed,
            emitted = summary.records_emitted,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "enumeration finished"
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Everything one (query, provider) task owns or shares read-only.
struct ProviderTask {
    agent: Arc<dyn Agent>,
    query: Arc<Query>,
    pool: Arc<dyn CredentialPool>,
    sessions: Arc<dyn SessionFactory>,
    timeout: Duration,
    mode: Arc<OutputMode>,
    output: Arc<OutputWriter>,
    cancel: CancellationToken,
}

impl ProviderTask {
    async fn run(self) -> TaskOutcome {
        let provider = self.agent.name();

        let keys = self.pool.get_keys();
        if keys.is_empty() {
            error!(provider, "empty keys");
            return TaskOutcome::EmptyKeys;
        }

        let session = match self.sessions.new_session(keys, self.timeout) {
            Ok(session) => session.with_cancellation(self.cancel),
            Err(e) => {
                error!(provider, error = %e, "couldn't create new session");
                return TaskOutcome::SessionFailed;
            }
        };

        let stream = match self.agent.query(session, Arc::clone(&self.query)).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(provider, query = self.query.text(), error = %e, "query failed");
                return TaskOutcome::QueryFailed;
            }
        };

        let stats = drain(stream, &self.mode, &self.output, provider).await;
        debug!(
            provider,
            query = self.query.text(),
            emitted = stats.emitted,
            filtered = stats.filtered,
            provider_errors = stats.provider_errors,
            "stream drained"
        );
        TaskOutcome::Drained(stats)
    }
}
