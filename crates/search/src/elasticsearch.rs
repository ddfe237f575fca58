//! Elasticsearch REST client.
//!
//! Only the handful of endpoints the service needs are wrapped; bodies are
//! plain JSON built by `query` and decoded into small envelope structs.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::errors::StoreError;
use crate::query::SearchRequest;
use crate::store::{DocumentStore, Hit, WriteAck};

/// Visibility of writes to subsequent searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Refresh {
    False,
    True,
    #[default]
    WaitFor,
}

impl Refresh {
    pub fn as_str(&self) -> &'static str {
        match self {
            Refresh::False => "false",
            Refresh::True => "true",
            Refresh::WaitFor => "wait_for",
        }
    }
}

impl FromStr for Refresh {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "false" => Ok(Refresh::False),
            "true" => Ok(Refresh::True),
            "wait_for" => Ok(Refresh::WaitFor),
            other => Err(StoreError::Config(format!("unknown refresh policy `{other}`"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElasticsearchOptions {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
    pub refresh: Refresh,
}

impl ElasticsearchOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
            refresh: Refresh::default(),
        }
    }
}

pub struct ElasticsearchStore {
    client: reqwest::Client,
    base: Url,
    username: Option<String>,
    password: Option<String>,
    refresh: Refresh,
}

#[derive(Deserialize)]
struct WriteBody {
    #[serde(rename = "_id")]
    id: String,
    result: String,
    #[serde(rename = "_version")]
    version: Option<i64>,
}

#[derive(Deserialize)]
struct SearchBody {
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: Value,
}

impl ElasticsearchStore {
    /// Build a client for `opts.url`. No request is sent; use `ping` to check reachability.
    pub fn connect(opts: ElasticsearchOptions) -> Result<Self, StoreError> {
        let base = Url::parse(opts.url.trim()).map_err(|e| StoreError::Config(format!("{}: {e}", opts.url)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(StoreError::Config(format!("unsupported scheme `{}`", base.scheme())));
        }
        let client = reqwest::Client::builder()
            .timeout(opts.timeout)
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base,
            username: opts.username,
            password: opts.password,
            refresh: opts.refresh,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        build_url(&self.base, segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let rb = self.client.request(method, url);
        match &self.username {
            Some(user) => rb.basic_auth(user, self.password.as_deref()),
            None => rb,
        }
    }

    fn with_refresh(&self, mut url: Url) -> Url {
        url.query_pairs_mut().append_pair("refresh", self.refresh.as_str());
        url
    }

    async fn write_ack(resp: Response) -> Result<WriteAck, StoreError> {
        let body: WriteBody = resp.json().await?;
        Ok(WriteAck { id: body.id, result: body.result, version: body.version })
    }
}

/// Append path segments to `base`, percent-encoding each one.
pub(crate) fn build_url(base: &Url, segments: &[&str]) -> Result<Url, StoreError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| StoreError::Config(format!("`{base}` cannot be a base url")))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

/// Error `type` of an Elasticsearch error body, if any.
pub(crate) fn error_type(body: &Value) -> Option<&str> {
    body.pointer("/error/type").and_then(Value::as_str)
}

/// Turn a non-success response body into a `StoreError::Rejected`.
pub(crate) fn rejection(status: StatusCode, body: &Value) -> StoreError {
    let reason = body
        .pointer("/error/reason")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| body.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string());
    StoreError::Rejected { status: status.as_u16(), reason }
}

async fn error_body(resp: Response) -> Value {
    match resp.bytes().await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) => Value::String(e.to_string()),
    }
}

#[async_trait]
impl DocumentStore for ElasticsearchStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let resp = self.request(Method::GET, self.base.clone()).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        Err(rejection(status, &error_body(resp).await))
    }

    #[instrument(skip(self, mappings))]
    async fn create_index(&self, index: &str, mappings: &Value) -> Result<bool, StoreError> {
        let url = self.url(&[index])?;
        let resp = self
            .request(Method::PUT, url)
            .json(&json!({ "mappings": mappings }))
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            debug!(%index, "index created");
            return Ok(true);
        }
        let body = error_body(resp).await;
        if status == StatusCode::BAD_REQUEST && error_type(&body) == Some("resource_already_exists_exception") {
            debug!(%index, "index already exists");
            return Ok(false);
        }
        Err(rejection(status, &body))
    }

    async fn index_document(&self, index: &str, id: &str, doc: &Value) -> Result<WriteAck, StoreError> {
        let url = self.with_refresh(self.url(&[index, "_create", id])?);
        let resp = self.request(Method::PUT, url).json(doc).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Self::write_ack(resp).await;
        }
        if status == StatusCode::CONFLICT {
            return Err(StoreError::Conflict(id.to_string()));
        }
        Err(rejection(status, &error_body(resp).await))
    }

    async fn update_document(&self, index: &str, id: &str, patch: &Value) -> Result<WriteAck, StoreError> {
        let url = self.with_refresh(self.url(&[index, "_update", id])?);
        let resp = self
            .request(Method::POST, url)
            .json(&json!({ "doc": patch }))
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            return Self::write_ack(resp).await;
        }
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Err(rejection(status, &error_body(resp).await))
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<bool, StoreError> {
        let url = self.with_refresh(self.url(&[index, "_doc", id])?);
        let resp = self.request(Method::DELETE, url).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(true);
        }
        // 404 covers both "no such document" and "no such index"
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Err(rejection(status, &error_body(resp).await))
    }

    async fn search(&self, index: &str, request: &SearchRequest) -> Result<Vec<Hit>, StoreError> {
        let url = self.url(&[index, "_search"])?;
        let resp = self
            .request(Method::POST, url)
            .json(&request.to_json())
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(rejection(status, &error_body(resp).await));
        }
        let body: SearchBody = resp.json().await?;
        Ok(body
            .hits
            .hits
            .into_iter()
            .map(|h| Hit { id: h.id, source: h.source })
            .collect())
    }
}
