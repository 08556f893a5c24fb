//! Pluggable provider agent trait.
//!
//! Implementations translate a provider-agnostic [`Query`] into
//! provider-specific API calls and normalize whatever comes back into
//! [`HostResult`]s.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::Stream;

use super::session::Session;
use crate::core::{HostResult, Query};
use crate::error::AgentError;

/// Lazy sequence of results produced by one agent query.
///
/// The stream ends when the provider is exhausted, the query limit is
/// reached, or the session is cancelled. Per-page failures are delivered as
/// a result with `error` set rather than by ending the stream silently.
pub type ResultStream = Pin<Box<dyn Stream<Item = HostResult> + Send>>;

/// Trait for provider backends.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Provider name (e.g., `"shodan"`); also the key used for credential lookup.
    fn name(&self) -> &'static str;

    /// Starts a query and returns its result stream.
    ///
    /// The session is owned by the calling task and moves into the agent
    /// for the lifetime of the stream.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the query cannot start at all, e.g. the
    /// session lacks credentials for this provider.
    async fn query(&self, session: Session, query: Arc<Query>) -> Result<ResultStream, AgentError>;
}
