//! In-memory transport for service tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, ApiResult};
use crate::transport::{ApiRequest, ByteStream, RequestTransport};

/// Replays queued responses and records every request it receives.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<ApiResult<Value>>>,
    streams: Mutex<VecDeque<ApiResult<Vec<&'static str>>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, value: Value) {
        self.responses.lock().unwrap().push_back(Ok(value));
    }

    pub fn fail(&self, err: ApiError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn stream(&self, chunks: Vec<&'static str>) {
        self.streams.lock().unwrap().push_back(Ok(chunks));
    }

    pub fn fail_stream(&self, err: ApiError) {
        self.streams.lock().unwrap().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> ApiRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait]
impl RequestTransport for MockTransport {
    async fn request(&self, request: ApiRequest) -> ApiResult<Value> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }

    async fn open_stream(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> ApiResult<Option<ByteStream>> {
        self.requests.lock().unwrap().push(request);
        if cancel.is_cancelled() {
            return Ok(None);
        }
        let chunks = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Vec::new()))?;
        let items: Vec<ApiResult<Bytes>> = chunks
            .into_iter()
            .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
            .collect();
        Ok(Some(Box::pin(stream::iter(items))))
    }
}
