//! Hosted query API client.
//!
//! Queries go out as `GET` requests:
//!
//! ```text
//! https://<project>.api.sanity.io/v<api_version>/data/query/<dataset>?query=<GROQ>&$slug="hello"
//! ```
//!
//! Parameters are JSON-encoded and prefixed with `$`. With `use_cdn` the
//! `apicdn.sanity.io` host is used instead. The response envelope is
//! `{"ms": .., "query": .., "result": <value>}`; only `result` is returned.

use super::{ContentRepository, Query, RepositoryError};
use crate::config::RepositoryConfig;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Value,
}

pub struct HttpRepository {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRepository {
    pub fn new(config: &RepositoryConfig) -> Result<Self, RepositoryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("quillpost/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: query_base_url(config),
            token: config.token.clone(),
        })
    }

    /// Full request URL for a query, parameters included.
    pub fn query_url(&self, query: &Query) -> Result<Url, RepositoryError> {
        let mut pairs: Vec<(String, String)> = vec![("query".into(), query.groq().into())];
        for (name, value) in query.params() {
            pairs.push((format!("${name}"), serde_json::to_string(&value)?));
        }
        Url::parse_with_params(&self.base_url, &pairs)
            .map_err(|e| RepositoryError::Url(e.to_string()))
    }
}

/// `https://<project>.<host>/v<version>/data/query/<dataset>`
pub fn query_base_url(config: &RepositoryConfig) -> String {
    let host = if config.use_cdn {
        "apicdn.sanity.io"
    } else {
        "api.sanity.io"
    };
    format!(
        "https://{}.{}/v{}/data/query/{}",
        config.project_id,
        host,
        config.api_version.trim_start_matches('v'),
        config.dataset
    )
}

#[async_trait]
impl ContentRepository for HttpRepository {
    async fn fetch(&self, query: &Query) -> Result<Value, RepositoryError> {
        let url = self.query_url(query)?;
        tracing::debug!(?query, "querying content repository");

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RepositoryError::Status { status, body });
        }

        let envelope: QueryResponse = response.json().await?;
        Ok(envelope.result)
    }
}
