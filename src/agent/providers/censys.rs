//! Censys hosts search (v2).
//!
//! `GET {base}/v2/hosts/search?q=…&per_page=…&cursor=…` with HTTP basic
//! auth (API ID + secret). Each hit expands to one result per service port.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ResultSender, ensure_query, get_json, page_size, spawn_stream};
use crate::agent::provider::{Agent, ResultStream};
use crate::agent::session::Session;
use crate::core::{HostResult, Query};
use crate::error::AgentError;

const DEFAULT_BASE_URL: &str = "https://search.censys.io/api";

/// Censys provider agent.
#[derive(Debug, Clone)]
pub struct CensysAgent {
    base_url: String,
}

impl CensysAgent {
    /// Creates an agent for the public Censys search API.
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

impl Default for CensysAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    result: SearchResult,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default)]
    hits: Vec<Hit>,
    #[serde(default)]
    links: Links,
}

#[derive(Default, Deserialize)]
struct Links {
    #[serde(default)]
    next: String,
}

#[derive(Deserialize)]
struct Hit {
    ip: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    services: Vec<Service>,
}

#[derive(Deserialize)]
struct Service {
    port: u16,
}

struct Auth {
    id: String,
    secret: String,
}

#[async_trait]
impl Agent for CensysAgent {
    fn name(&self) -> &'static str {
        "censys"
    }

    async fn query(&self, session: Session, query: Arc<Query>) -> Result<ResultStream, AgentError> {
        ensure_query(&query)?;
        let credential = session.credential(self.name())?;
        let Some(id) = credential.id.clone() else {
            return Err(AgentError::MissingCredentials {
                provider: self.name().to_string(),
            });
        };
        let auth = Auth {
            id,
            secret: credential.secret.clone(),
        };
        let url = format!("{}/v2/hosts/search", self.base_url);
        let cancel = session.cancellation().clone();

        Ok(spawn_stream(cancel, move |tx| {
            paginate(session, url, auth, query, tx)
        }))
    }
}

async fn paginate(session: Session, url: String, auth: Auth, query: Arc<Query>, tx: ResultSender) {
    let per_page = page_size(&query).to_string();
    let mut emitted = 0usize;
    let mut cursor = String::new();

    while emitted < query.limit() {
        let mut params = vec![("q", query.text()), ("per_page", per_page.as_str())];
        if !cursor.is_empty() {
            params.push(("cursor", cursor.as_str()));
        }
        let request = session
            .client()
            .get(&url)
            .basic_auth(&auth.id, Some(&auth.secret))
            .query(&params);

        let response: SearchResponse = match get_json(request).await {
            Ok(response) => response,
            Err(e) => {
                tx.fail(e).await;
                return;
            }
        };

        let SearchResult { hits, links } = response.result;
        if hits.is_empty() {
            return;
        }
        for hit in hits {
            let host = hit.name.unwrap_or_default();
            for service in hit.services {
                if emitted >= query.limit() {
                    return;
                }
                if !tx
                    .send(HostResult::new(hit.ip.clone(), host.clone(), service.port))
                    .await
                {
                    return;
                }
                emitted += 1;
            }
        }

        if links.next.is_empty() {
            return;
        }
        cursor = links.next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{Credential, KeySet};
    use futures_util::StreamExt;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header_exists, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session(credential: Credential) -> Session {
        let keys = KeySet::new().with("censys", credential);
        Session::new(keys, Duration::from_secs(5)).unwrap_or_else(|e| unreachable!("{e}"))
    }

    #[tokio::test]
    async fn test_censys_follows_cursor_and_expands_services() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/hosts/search"))
            .and(header_exists("authorization"))
            .and(query_param_is_missing("cursor"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "hits": [{
                        "ip": "1.1.1.1",
                        "name": "one.example",
                        "services": [{"port": 80}, {"port": 443}]
                    }],
                    "links": {"next": "page2"}
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/hosts/search"))
            .and(query_param("cursor", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "hits": [{"ip": "2.2.2.2", "services": [{"port": 22}]}],
                    "links": {"next": ""}
                }
            })))
            .mount(&server)
            .await;

        let agent = CensysAgent::with_base_url(server.uri());
        let results: Vec<HostResult> = agent
            .query(
                session(Credential::pair("id", "secret")),
                Arc::new(Query::new("services.port: 22", 10)),
            )
            .await
            .unwrap_or_else(|e| unreachable!("{e}"))
            .collect()
            .await;

        assert_eq!(
            results,
            vec![
                HostResult::new("1.1.1.1", "one.example", 80),
                HostResult::new("1.1.1.1", "one.example", 443),
                HostResult::new("2.2.2.2", "", 22),
            ]
        );
    }

    #[tokio::test]
    async fn test_censys_requires_api_id() {
        let result = CensysAgent::new()
            .query(
                session(Credential::token("secret-only")),
                Arc::new(Query::new("q", 10)),
            )
            .await;
        assert!(matches!(result, Err(AgentError::MissingCredentials { .. })));
    }
}
