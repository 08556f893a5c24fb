//! Shodan host search.
//!
//! `GET {base}/shodan/host/search?key=…&query=…&page=…`, 100 matches per
//! page.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::{MAX_PAGE_SIZE, ResultSender, ensure_query, get_json, spawn_stream};
use crate::agent::provider::{Agent, ResultStream};
use crate::agent::session::Session;
use crate::core::{HostResult, Query};
use crate::error::AgentError;

const DEFAULT_BASE_URL: &str = "https://api.shodan.io";

/// Shodan provider agent.
#[derive(Debug, Clone)]
pub struct ShodanAgent {
    base_url: String,
}

impl ShodanAgent {
    /// Creates an agent for the public Shodan API.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates an agent against a different API root.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for ShodanAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    matches: Vec<Match>,
    #[serde(default)]
    total: usize,
}

#[derive(Deserialize)]
struct Match {
    ip_str: String,
    port: u16,
    #[serde(default)]
    hostnames: Vec<String>,
}

impl Match {
    fn into_result(self) -> HostResult {
        let host = self.hostnames.into_iter().next().unwrap_or_default();
        HostResult::new(self.ip_str, host, self.port)
    }
}

#[async_trait]
impl Agent for ShodanAgent {
    fn name(&self) -> &'static str {
        "shodan"
    }

    async fn query(&self, session: Session, query: Arc<Query>) -> Result<ResultStream, AgentError> {
        ensure_query(&query)?;
        let key = session.credential(self.name())?.secret.clone();
        let url = format!("{}/shodan/host/search", self.base_url);
        let cancel = session.cancellation().clone();

        Ok(spawn_stream(cancel, move |tx| {
            paginate(session, url, key, query, tx)
        }))
    }
}

async fn paginate(session: Session, url: String, key: String, query: Arc<Query>, tx: ResultSender) {
    let mut emitted = 0usize;
    let mut page = 1usize;

    while emitted < query.limit() {
        let page_param = page.to_string();
        let request = session.client().get(&url).query(&[
            ("key", key.as_str()),
            ("query", query.text()),
            ("page", page_param.as_str()),
        ]);

        let response: SearchResponse = match get_json(request).await {
            Ok(response) => response,
            Err(e) => {
                tx.fail(e).await;
                return;
            }
        };

        if response.matches.is_empty() {
            return;
        }
        for found in response.matches {
            if emitted >= query.limit() {
                return;
            }
            if !tx.send(found.into_result()).await {
                return;
            }
            emitted += 1;
        }

        if page * MAX_PAGE_SIZE >= response.total {
            return;
        }
        page += 1;
    }
}
