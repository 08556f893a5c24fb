//! Built-in provider agents and their shared plumbing.
//!
//! Every agent pages through its provider's HTTP API inside a spawned
//! producer task. Results flow through a bounded channel, so a producer
//! never runs more than one record ahead of the consumer.

pub mod censys;
pub mod fofa;
pub mod shodan;

pub use censys::CensysAgent;
pub use fofa::FofaAgent;
pub use shodan::ShodanAgent;

use std::future::Future;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::provider::ResultStream;
use crate::core::{HostResult, Query};
use crate::error::AgentError;

/// Largest page requested from any provider.
pub(crate) const MAX_PAGE_SIZE: usize = 100;

/// Longest API error body kept in an error message.
const MAX_ERROR_BODY: usize = 200;

/// Producer half of a [`ResultStream`].
#[derive(Debug)]
pub(crate) struct ResultSender {
    tx: mpsc::Sender<HostResult>,
}

impl ResultSender {
    /// Sends a result, returning `false` once the consumer has gone away.
    pub(crate) async fn send(&self, result: HostResult) -> bool {
        self.tx.send(result).await.is_ok()
    }

    /// Sends a record carrying `error`; the producer should stop afterwards.
    pub(crate) async fn fail(&self, error: AgentError) {
        let _ = self.send(HostResult::from_error(error)).await;
    }
}

/// Runs `produce` on its own task and exposes its output as a stream.
///
/// Cancelling `cancel` drops the producer, which closes the stream.
pub(crate) fn spawn_stream<F, Fut>(cancel: CancellationToken, produce: F) -> ResultStream
where
    F: FnOnce(ResultSender) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    let sender = ResultSender { tx };
    tokio::spawn(async move {
        tokio::select! {
            () = cancel.cancelled() => {}
            () = produce(sender) => {}
        }
    });
    Box::pin(ReceiverStream::new(rx))
}

/// Rejects queries no provider can run.
pub(crate) fn ensure_query(query: &Query) -> Result<(), AgentError> {
    if query.text().trim().is_empty() {
        return Err(AgentError::InvalidQuery {
            message: "query text is empty".to_string(),
        });
    }
    Ok(())
}

/// Page size for a query: the limit, capped at [`MAX_PAGE_SIZE`].
pub(crate) fn page_size(query: &Query) -> usize {
    query.limit().clamp(1, MAX_PAGE_SIZE)
}

/// Sends a request and decodes a JSON body.
///
/// Non-2xx responses become [`AgentError::Api`] carrying the provider's
/// error message when one can be extracted.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, AgentError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(AgentError::Api {
            status: status.as_u16(),
            message: api_message(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| AgentError::Decode {
        message: e.to_string(),
    })
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

fn api_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[test]
    fn test_api_message_prefers_error_field() {
        assert_eq!(api_message(r#"{"error": "Invalid API key"}"#), "Invalid API key");
        assert_eq!(api_message("  upstream down \n"), "upstream down");
    }

    #[test]
    fn test_api_message_truncates_long_bodies() {
        let body = "x".repeat(500);
        let msg = api_message(&body);
        assert_eq!(msg.len(), MAX_ERROR_BODY + 3);
        assert!(msg.ends_with("..."));
    }

    #[test]
    fn test_ensure_query() {
        assert!(ensure_query(&Query::new("nginx", 10)).is_ok());
        assert!(matches!(
            ensure_query(&Query::new("   ", 10)),
            Err(AgentError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_page_size() {
        assert_eq!(page_size(&Query::new("q", 7)), 7);
        assert_eq!(page_size(&Query::new("q", 5000)), MAX_PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_spawn_stream_preserves_order() {
        let stream = spawn_stream(CancellationToken::new(), |tx| async move {
            for port in 1..=5 {
                if !tx.send(HostResult::new("10.0.0.1", "", port)).await {
                    return;
                }
            }
        });
        let ports: Vec<u16> = stream.map(|r| r.port).collect().await;
        assert_eq!(ports, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_spawn_stream_closes_on_cancel() {
        let cancel = CancellationToken::new();
        let mut stream = spawn_stream(cancel.clone(), |tx| async move {
            let _ = tx.send(HostResult::new("10.0.0.1", "", 1)).await;
            std::future::pending::<()>().await;
        });
        assert!(stream.next().await.is_some());
        cancel.cancel();
        assert!(stream.next().await.is_none());
    }
}
