//! Request transport.
//!
//! Services talk to the backend through [`RequestTransport`] so they can be
//! exercised against an in-memory transport. [`HttpTransport`] is the reqwest
//! implementation used in production.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use log::{debug, error};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Response};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};

/// Body of a streaming response, chunk by chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = ApiResult<Bytes>> + Send>>;

/// Envelope codes that mean success.
const SUCCESS_CODES: &[i64] = &[0, 200];

/// One call against the backend API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API root, e.g. `/agent/sessions`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter when a value is present.
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a query parameter by key.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Abstract request function backing every service call.
#[async_trait]
pub trait RequestTransport: Send + Sync {
    /// Perform a request and return the parsed response data.
    async fn request(&self, request: ApiRequest) -> ApiResult<Value>;

    /// Open a streaming request and return its body.
    ///
    /// Returns `None` when `cancel` fires before the response arrives.
    /// Responses that are not a stream (error status or a JSON body) are
    /// decoded into [`ApiError::Request`] instead.
    async fn open_stream(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> ApiResult<Option<ByteStream>>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
    auth_token: Option<String>,
    request_timeout: std::time::Duration,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            auth_token: config.auth_token.clone(),
            request_timeout: config.request_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn builder(&self, request: &ApiRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }
        if let Some(token) = self.auth_token.as_ref() {
            builder = builder.bearer_auth(token);
        }
        builder
    }
}

#[async_trait]
impl RequestTransport for HttpTransport {
    async fn request(&self, request: ApiRequest) -> ApiResult<Value> {
        debug!("{} {}", request.method, request.path);
        let response = self
            .builder(&request)
            .header(ACCEPT, "application/json")
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| {
                error!("Request {} {} failed: {}", request.method, request.path, e);
                ApiError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(resolve_error_response(response).await);
        }

        let body = response.bytes().await?;
        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| ApiError::Decode(format!("{} {}: {}", request.method, request.path, e)))?;
        unwrap_envelope(value, Some(status.as_u16()))
    }

    async fn open_stream(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> ApiResult<Option<ByteStream>> {
        debug!("{} {} (stream)", request.method, request.path);
        let send = self
            .builder(&request)
            .header(ACCEPT, "text/event-stream")
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(None),
            result = send => result?,
        };

        if !response.status().is_success() || is_json(&response) {
            return Err(resolve_error_response(response).await);
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ApiError::from));
        Ok(Some(Box::pin(stream)))
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"))
}

/// Decode an error response body into [`ApiError::Request`].
async fn resolve_error_response(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let payload = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<Value>(&body).ok(),
        Err(e) => {
            debug!("Failed to read error body: {}", e);
            None
        }
    };
    let err = ApiError::from_payload(payload.as_ref(), Some(status));
    error!("Backend returned {}: {}", status, err);
    err
}

/// Unwrap the `{code, message, data}` envelope when present.
///
/// Bodies without an integral `code` are returned unchanged.
pub fn unwrap_envelope(value: Value, status: Option<u16>) -> ApiResult<Value> {
    let mut fields = match value {
        Value::Object(fields) => fields,
        other => return Ok(other),
    };

    let code = fields.get("code").and_then(Value::as_i64);
    match code {
        Some(code) if SUCCESS_CODES.contains(&code) => {
            Ok(fields.remove("data").unwrap_or(Value::Null))
        }
        Some(_) => Err(ApiError::from_payload(
            Some(&Value::Object(fields)),
            status,
        )),
        None => Ok(Value::Object(fields)),
    }
}
