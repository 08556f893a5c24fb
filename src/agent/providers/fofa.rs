//! Fofa search-all API.
//!
//! `GET {base}/api/v1/search/all?email=…&key=…&qbase64=…&fields=ip,port,host`.
//! Fofa reports failures with HTTP 200 and an `error` flag in the body.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use super::{ResultSender, ensure_query, get_json, page_size, spawn_stream};
use crate::agent::provider::{Agent, ResultStream};
use crate::agent::session::Session;
use crate::core::{HostResult, Query};
use crate::error::AgentError;

const DEFAULT_BASE_URL: &str = "https://fofa.info";
const FIELDS: &str = "ip,port,host";

/// Fofa provider agent.
#[derive(Debug, Clone)]
pub struct FofaAgent {
    base_url: String,
}

impl FofaAgent {
    /// Creates an agent for the public Fofa API.
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

impl Default for FofaAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    errmsg: String,
    #[serde(default)]
    size: usize,
    #[serde(default)]
    results: Vec<Vec<String>>,
}

/// Request parameters fixed for the lifetime of one query.
struct Params {
    email: String,
    key: String,
    qbase64: String,
    size: String,
    page_size: usize,
}

#[async_trait]
impl Agent for FofaAgent {
    fn name(&self) -> &'static str {
        "fofa"
    }

    async fn query(&self, session: Session, query: Arc<Query>) -> Result<ResultStream, AgentError> {
        ensure_query(&query)?;
        let credential = session.credential(self.name())?;
        let Some(email) = credential.id.clone() else {
            return Err(AgentError::MissingCredentials {
                provider: self.name().to_string(),
            });
        };
        let page_size = page_size(&query);
        let params = Params {
            email,
            key: credential.secret.clone(),
            qbase64: STANDARD.encode(query.text()),
            size: page_size.to_string(),
            page_size,
        };
        let url = format!("{}/api/v1/search/all", self.base_url);
        let cancel = session.cancellation().clone();

        Ok(spawn_stream(cancel, move |tx| {
            paginate(session, url, params, query, tx)
        }))
    }
}

async fn paginate(session: Session, url: String, params: Params, query: Arc<Query>, tx: ResultSender) {
    let mut emitted = 0usize;
    let mut page = 1usize;

    while emitted < query.limit() {
        let page_param = page.to_string();
        let request = session.client().get(&url).query(&[
            ("email", params.email.as_str()),
            ("key", params.key.as_str()),
            ("qbase64", params.qbase64.as_str()),
            ("fields", FIELDS),
            ("page", page_param.as_str()),
            ("size", params.size.as_str()),
        ]);

        let response: SearchResponse = match get_json(request).await {
            Ok(response) => response,
            Err(e) => {
                tx.fail(e).await;
                return;
            }
        };
        if response.error {
            tx.fail(AgentError::Api {
                status: 200,
                message: response.errmsg,
            })
            .await;
            return;
        }

        if response.results.is_empty() {
            return;
        }
        for row in response.results {
            if emitted >= query.limit() {
                return;
            }
            let result = parse_row(&row);
            let valid = !result.is_error();
            if !tx.send(result).await {
                return;
            }
            if valid {
                emitted += 1;
            }
        }

        if page * params.page_size >= response.size {
            return;
        }
        page += 1;
    }
}

/// Converts an `[ip, port, host]` row; malformed rows become error records.
fn parse_row(row: &[String]) -> HostResult {
    let [ip, port, rest @ ..] = row else {
        return HostResult::from_error(AgentError::Decode {
            message: format!("expected [ip, port, host] row, got {} fields", row.len()),
        });
    };
    match port.trim().parse::<u16>() {
        Ok(port) => HostResult::new(ip.clone(), rest.first().cloned().unwrap_or_default(), port),
        Err(e) => HostResult::from_error(AgentError::Decode {
            message: format!("invalid port {port:?} for {ip}: {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{Credential, KeySet};
    use futures_util::StreamExt;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session() -> Session {
        let keys = KeySet::new().with("fofa", Credential::pair("me@example.com", "fk"));
        Session::new(keys, Duration::from_secs(5)).unwrap_or_else(|e| unreachable!("{e}"))
    }

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_row() {
        assert_eq!(
            parse_row(&row(&["1.2.3.4", "8080", "a.example"])),
            HostResult::new("1.2.3.4", "a.example", 8080)
        );
        assert_eq!(
            parse_row(&row(&["1.2.3.4", "22"])),
            HostResult::new("1.2.3.4", "", 22)
        );
        assert!(parse_row(&row(&["1.2.3.4", "http"])).is_error());
        assert!(parse_row(&row(&["1.2.3.4"])).is_error());
    }

    #[tokio::test]
    async fn test_fofa_encodes_query_and_streams_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/search/all"))
            .and(query_param("email", "me@example.com"))
            .and(query_param("qbase64", STANDARD.encode("app=\"nginx\"")))
            .and(query_param("fields", FIELDS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": false,
                "size": 3,
                "results": [
                    ["1.2.3.4", "80", "a.example"],
                    ["1.2.3.4", "not-a-port", ""],
                    ["5.6.7.8", "443", ""]
                ]
            })))
            .mount(&server)
            .await;

        let agent = FofaAgent::with_base_url(server.uri());
        let results: Vec<HostResult> = agent
            .query(session(), Arc::new(Query::new("app=\"nginx\"", 10)))
            .await
            .unwrap_or_else(|e| unreachable!("{e}"))
            .collect()
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0], HostResult::new("1.2.3.4", "a.example", 80));
        assert!(results[1].is_error());
        assert_eq!(results[2], HostResult::new("5.6.7.8", "", 443));
    }

    #[tokio::test]
    async fn test_fofa_body_error_flag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": true,
                "errmsg": "[820031] F点余额不足"
            })))
            .mount(&server)
            .await;

        let agent = FofaAgent::with_base_url(server.uri());
        let results: Vec<HostResult> = agent
            .query(session(), Arc::new(Query::new("port=22", 10)))
            .await
            .unwrap_or_else(|e| unreachable!("{e}"))
            .collect()
            .await;

        assert_eq!(results.len(), 1);
        assert!(
            results[0]
                .error
                .as_deref()
                .is_some_and(|e| e.contains("820031"))
        );
    }
}
