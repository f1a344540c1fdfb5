use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::config::WikiConfig;
use crate::error::TransportError;

/// A single query parameter value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryValue {
    Text(String),
    Flag(bool),
    Number(i64),
}

impl QueryValue {
    /// Wire encoding; `None` means the parameter is left out entirely.
    pub fn encode(&self) -> Option<String> {
        match self {
            QueryValue::Text(text) => Some(text.clone()),
            QueryValue::Flag(true) => Some("1".to_string()),
            QueryValue::Flag(false) => None,
            QueryValue::Number(n) => Some(n.to_string()),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// Flat parameter map sent to the remote API.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query(BTreeMap<String, QueryValue>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Copies every parameter of `other` over this query.
    pub fn extend(&mut self, other: Query) {
        self.0.extend(other.0);
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.get(key)
    }

    /// Text form of a parameter, as it would be sent.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(QueryValue::encode)
    }

    /// Encoded key/value pairs, skipping parameters that encode to nothing.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .filter_map(|(key, value)| value.encode().map(|encoded| (key.clone(), encoded)))
            .collect()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .pairs()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        f.write_str(&rendered)
    }
}

/// Authenticated access to the remote document store.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, query: Query) -> Result<Value, TransportError>;
    async fn post(&self, query: Query) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn get(&self, query: Query) -> Result<Value, TransportError> {
        (**self).get(query).await
    }

    async fn post(&self, query: Query) -> Result<Value, TransportError> {
        (**self).post(query).await
    }
}

/// `api.php` transport backed by `reqwest`, keeping session cookies between calls.
pub struct HttpTransport {
    client: reqwest::Client,
    api_url: url::Url,
}

impl HttpTransport {
    pub fn new(config: &WikiConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .cookie_store(true)
            .build()
            .map_err(|err| TransportError::Request(format!("failed to build http client: {err}")))?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    fn wire_pairs(query: &Query) -> Vec<(String, String)> {
        let mut pairs = query.pairs();
        if query.get("format").is_none() {
            pairs.push(("format".to_string(), "json".to_string()));
        }
        pairs
    }

    async fn decode(&self, response: reqwest::Response) -> Result<Value, TransportError> {
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: self.api_url.to_string(),
            });
        }
        let payload: Value = response
            .json()
            .await
            .map_err(|err| TransportError::Decode(err.to_string()))?;
        check_api_error(payload)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, query: Query) -> Result<Value, TransportError> {
        tracing::debug!(url = %self.api_url, %query, "api get");
        let response = self
            .client
            .get(self.api_url.clone())
            .query(&Self::wire_pairs(&query))
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;
        self.decode(response).await
    }

    async fn post(&self, query: Query) -> Result<Value, TransportError> {
        tracing::debug!(url = %self.api_url, action = ?query.get_str("action"), "api post");
        let response = self
            .client
            .post(self.api_url.clone())
            .form(&Self::wire_pairs(&query))
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;
        self.decode(response).await
    }
}

/// Splits MediaWiki's top-level `error` envelope off a decoded reply.
pub fn check_api_error(payload: Value) -> Result<Value, TransportError> {
    let Some(error) = payload.get("error") else {
        return Ok(payload);
    };
    let code = error
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or("unknown_error")
        .to_string();
    let info = error
        .get("info")
        .and_then(Value::as_str)
        .unwrap_or("unknown info")
        .to_string();
    Err(TransportError::Api {
        code,
        info,
        payload,
    })
}

/// HTTP verb of a recorded call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// In-process transport that replays queued replies and records every call.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<Value, TransportError>>>,
    calls: Mutex<Vec<(Method, Query)>>,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every reply, which keeps requests in flight long enough to overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn push_reply(&self, reply: Value) -> &Self {
        self.replies.lock().push_back(check_api_error(reply));
        self
    }

    pub fn push_failure(&self, failure: TransportError) -> &Self {
        self.replies.lock().push_back(Err(failure));
        self
    }

    pub fn calls(&self) -> Vec<(Method, Query)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    async fn respond(&self, method: Method, query: Query) -> Result<Value, TransportError> {
        let label = format!("no scripted reply left for {method:?} {query}");
        self.calls.lock().push((method, query));
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let next = self.replies.lock().pop_front();
        next.unwrap_or(Err(TransportError::Request(label)))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, query: Query) -> Result<Value, TransportError> {
        self.respond(Method::Get, query).await
    }

    async fn post(&self, query: Query) -> Result<Value, TransportError> {
        self.respond(Method::Post, query).await
    }
}
