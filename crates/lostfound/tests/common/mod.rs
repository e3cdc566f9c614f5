//! Test utilities: an in-process fake backend on an ephemeral port.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::Query,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures::{StreamExt, stream};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use lostfound::{ClientConfig, HttpTransport, LostFoundClient};

pub const TEST_TOKEN: &str = "test-token";

/// A running fake backend. The server task stops when this is dropped.
pub struct TestServer {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl TestServer {
    pub fn config(&self, token: Option<&str>) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            auth_token: token.map(str::to_string),
            request_timeout_secs: 5,
            ..ClientConfig::default()
        }
    }

    pub fn client(&self) -> LostFoundClient {
        LostFoundClient::connect(&self.config(Some(TEST_TOKEN))).expect("build client")
    }

    pub fn transport(&self, token: Option<&str>) -> Arc<HttpTransport> {
        Arc::new(HttpTransport::new(&self.config(token)).expect("build transport"))
    }
}

pub async fn spawn_backend() -> TestServer {
    let api = Router::new()
        .route("/agent/sessions", get(sessions))
        .route("/agent/session", post(create_session))
        .route("/agent/history", get(history))
        .route("/agent/stream", post(agent_stream))
        .route("/post/list", get(post_list))
        .route("/post/detail", get(post_detail))
        .route("/system/config", get(system_config));
    let app = Router::new().nest("/api", api);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test backend");
    });

    TestServer {
        base_url: format!("http://{addr}/api"),
        handle,
    }
}

fn ok(data: Value) -> Response {
    Json(json!({"code": 0, "message": "ok", "data": data})).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {TEST_TOKEN}"))
}

async fn sessions(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": 40100, "message": "未登录"})),
        )
            .into_response();
    }
    ok(json!({
        "sessions": [
            {"session_id": "s-1", "title": "找钥匙", "created_at": "2025-03-01T10:00:00Z", "updated_at": "2025-03-01T10:05:00Z"},
            {"title": "no id"},
            {"session_id": 2, "title": null}
        ]
    }))
}

async fn create_session(Json(body): Json<Value>) -> Response {
    let title = body.get("title").and_then(Value::as_str).unwrap_or("");
    ok(json!({"session_id": format!("new-{}", title.chars().count())}))
}

async fn history(Query(params): Query<HashMap<String, String>>) -> Response {
    let session_id = params.get("session_id").cloned().unwrap_or_default();
    ok(json!({
        "messages": [
            {"role": "user", "content": format!("hello from {session_id}"), "created_at": "t1"},
            {"role": "assistant", "content": "   "},
            {"role": "bot", "content": "你好", "images": ["https://cdn/x.png"]}
        ]
    }))
}

/// Streams a canned reply. The session id selects the scenario.
async fn agent_stream(Json(body): Json<Value>) -> Response {
    let session_id = body
        .get("session_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match session_id.as_str() {
        "missing" => Json(json!({"code": 40400, "message": "会话不存在"})).into_response(),
        "broken" => (StatusCode::BAD_GATEWAY, "upstream down").into_response(),
        "hang" => {
            let first = stream::iter(vec![Ok::<_, Infallible>(Bytes::from_static(
                b"data: {\"type\":\"content\",\"content\":\"thinking\"}\n",
            ))]);
            event_stream(Body::from_stream(first.chain(stream::pending())))
        }
        "no-sentinel" => {
            let chunks = vec![Ok::<_, Infallible>(Bytes::from_static(
                b"data: {\"type\":\"content\",\"content\":\"tail\"}",
            ))];
            event_stream(Body::from_stream(stream::iter(chunks)))
        }
        _ => {
            let message = body.get("message").and_then(Value::as_str).unwrap_or("");
            let raw = format!(
                "data: {{\"type\":\"tool_call\",\"data\":{{\"id\":\"c1\",\"name\":\"search_posts\",\"arguments\":\"{{}}\"}}}}\r\n\
                 data: {{\"type\":\"tool_result\",\"data\":{{\"tool_call_id\":\"c1\",\"tool_name\":\"search_posts\",\"result\":\"2 hits\"}}}}\n\
                 : keep-alive\n\
                 data: not json\n\
                 data: {{\"type\":\"content\",\"content\":\"收到：{message}\"}}\n\
                 data: [DONE]\n\
                 data: {{\"type\":\"content\",\"content\":\"after done\"}}\n"
            )
            .into_bytes();
            // Split inside a multi-byte character to exercise decoding.
            let split = raw
                .windows(3)
                .position(|w| w == "收".as_bytes())
                .map(|pos| pos + 1)
                .unwrap_or(raw.len() / 2);
            let chunks: Vec<Result<Bytes, Infallible>> = vec![
                Ok(Bytes::copy_from_slice(&raw[..split])),
                Ok(Bytes::copy_from_slice(&raw[split..])),
            ];
            event_stream(Body::from_stream(stream::iter(chunks)))
        }
    }
}

fn event_stream(body: Body) -> Response {
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

async fn post_list(Query(params): Query<HashMap<String, String>>) -> Response {
    // Echo the received query so tests can check the normalized parameters.
    ok(json!({
        "list": [
            {"id": 1, "publish_type": "FOUND", "status": "APPROVED", "item_name": "校园卡", "location": "图书馆"},
            {"id": 2, "publish_type": "LOST", "status": "CANCELLED", "item_name": "耳机"}
        ],
        "page": params.get("page").cloned().unwrap_or_default(),
        "page_size": params.get("page_size").cloned().unwrap_or_default(),
        "total": 2,
        "echo": params
    }))
}

async fn post_detail(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("id").map(String::as_str) {
        Some("1") => ok(json!({
            "id": 1,
            "publish_type": "FOUND",
            "status": "APPROVED",
            "item_name": "校园卡",
            "location": "图书馆",
            "storage_location": "保卫处",
            "contact_name": "张三",
            "contact_phone": "13800000000",
            "claim_count": 1
        })),
        _ => Json(json!({"code": 40400, "message": "帖子不存在", "data": null})).into_response(),
    }
}

async fn system_config() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>").into_response()
}
