//! Client for hosted key-value services that expose Redis commands over
//! HTTP (`/ping`, `/get/<key>`, `/set/<key>`, `/keys/<pattern>`), answering
//! with a JSON envelope of `{"result": ...}` or `{"error": "..."}`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::KvError;
use crate::storage::traits::KeyValueStore;

#[derive(Debug, Deserialize)]
struct RestEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct RestKeyValueStore {
    client: Client,
    base_url: Url,
    token: String,
}

impl RestKeyValueStore {
    /// `timeout` bounds every request, including the liveness check
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, KvError> {
        let base_url =
            Url::parse(base_url).map_err(|e| KvError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(KvError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            token: token.to_string(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, KvError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| KvError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a command and unwrap the `result` field of the envelope
    async fn execute(&self, request: RequestBuilder) -> Result<Value, KvError> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KvError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: RestEnvelope = response.json().await?;
        if let Some(error) = envelope.error {
            return Err(KvError::Backend(error));
        }
        Ok(envelope.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl KeyValueStore for RestKeyValueStore {
    fn backend_name(&self) -> &'static str {
        "rest"
    }

    async fn ping(&self) -> Result<(), KvError> {
        let url = self.endpoint(&["ping"])?;
        match self.execute(self.client.get(url)).await? {
            Value::String(reply) if reply.eq_ignore_ascii_case("pong") => Ok(()),
            other => Err(KvError::UnexpectedResponse(format!("ping returned {}", other))),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let url = self.endpoint(&["get", key])?;
        let value = match self.execute(self.client.get(url)).await? {
            Value::Null => None,
            Value::String(raw) => Some(raw),
            // some services decode JSON values before replying
            other => Some(other.to_string()),
        };
        debug!("GET {} from rest backend: {} bytes", key, value.as_ref().map_or(0, String::len));
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let url = self.endpoint(&["set", key])?;
        match self.execute(self.client.post(url).body(value.to_string())).await? {
            Value::String(reply) if reply == "OK" => Ok(()),
            other => Err(KvError::UnexpectedResponse(format!("set returned {}", other))),
        }
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        let url = self.endpoint(&["keys", pattern])?;
        match self.execute(self.client.get(url)).await? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(key) => Ok(key),
                    other => Err(KvError::UnexpectedResponse(format!("non-string key {}", other))),
                })
                .collect(),
            other => Err(KvError::UnexpectedResponse(format!("keys returned {}", other))),
        }
    }
}
