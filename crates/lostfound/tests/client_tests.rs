//! Client integration tests against an in-process backend.

use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use lostfound::agent::{AgentService, HistoryRole, StreamRequest};
use lostfound::posts::{PostQuery, PublishType};
use lostfound::status::{ItemStatus, PostType};
use lostfound::transport::{ApiRequest, RequestTransport};
use lostfound::{ApiError, StreamEvent, StreamOutcome};

mod common;
use common::spawn_backend;

#[tokio::test]
async fn test_list_sessions_with_token() {
    let server = spawn_backend().await;
    let client = server.client();

    let sessions = client.agent.list_sessions().await.unwrap();

    let ids: Vec<_> = sessions.iter().map(|s| s.session_id.as_str()).collect();
    assert_eq!(ids, vec!["s-1", "2"]);
    assert_eq!(sessions[0].title, "找钥匙");
    assert_eq!(sessions[1].title, "");
}

#[tokio::test]
async fn test_error_status_decodes_message_and_code() {
    let server = spawn_backend().await;
    let agent = AgentService::new(server.transport(None));

    let err = agent.list_sessions().await.unwrap_err();

    assert_eq!(err.to_string(), "未登录");
    assert_eq!(err.code(), Some(40100));
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_non_json_error_uses_status_fallback() {
    let server = spawn_backend().await;

    let err = server.client().system.public_config().await.unwrap_err();

    assert_eq!(err.to_string(), "request failed (500)");
    assert_eq!(err.code(), None);
}

#[tokio::test]
async fn test_envelope_error_code() {
    let server = spawn_backend().await;

    let err = server.client().posts.post_detail("999").await.unwrap_err();

    assert_eq!(err.to_string(), "帖子不存在");
    assert_eq!(err.code(), Some(40400));
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn test_create_session_and_history() {
    let server = spawn_backend().await;
    let client = server.client();

    let id = client.agent.create_session(Some(" 丢了雨伞 ")).await.unwrap();
    assert_eq!(id, "new-4");

    let messages = client.agent.history(&id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, HistoryRole::User);
    assert_eq!(messages[0].content, "hello from new-4");
    assert_eq!(messages[1].role, HistoryRole::Assistant);
    assert_eq!(messages[1].images, vec!["https://cdn/x.png"]);
}

#[tokio::test]
async fn test_stream_message_end_to_end() {
    let server = spawn_backend().await;
    let client = server.client();
    let cancel = CancellationToken::new();
    let mut events = Vec::new();
    let mut done = 0;

    let outcome = client
        .agent
        .stream_message(
            &StreamRequest::new("s-1", "我的校园卡"),
            &cancel,
            |event| events.push(event),
            || done += 1,
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        StreamOutcome::Completed {
            events: 3,
            by_sentinel: true
        }
    );
    assert_eq!(done, 1);
    assert_eq!(
        events.iter().map(StreamEvent::kind).collect::<Vec<_>>(),
        vec!["tool_call", "tool_result", "content"]
    );
    match &events[0] {
        StreamEvent::ToolCall { data } => {
            assert_eq!(data.id, "c1");
            assert_eq!(data.name, "search_posts");
            assert_eq!(data.arguments, "{}");
        }
        other => panic!("expected tool call, got {other:?}"),
    }
    assert_eq!(
        events[2],
        StreamEvent::Content {
            text: "收到：我的校园卡".to_string()
        }
    );
}

#[tokio::test]
async fn test_stream_without_sentinel_completes_at_end_of_body() {
    let server = spawn_backend().await;
    let cancel = CancellationToken::new();
    let mut events = Vec::new();
    let mut done = false;

    let outcome = server
        .client()
        .agent
        .stream_message(
            &StreamRequest::new("no-sentinel", "hi"),
            &cancel,
            |event| events.push(event),
            || done = true,
        )
        .await
        .unwrap();

    assert!(done);
    assert_eq!(
        outcome,
        StreamOutcome::Completed {
            events: 1,
            by_sentinel: false
        }
    );
    assert_eq!(
        events,
        vec![StreamEvent::Content {
            text: "tail".to_string()
        }]
    );
}

#[tokio::test]
async fn test_stream_json_response_is_an_error() {
    let server = spawn_backend().await;
    let cancel = CancellationToken::new();

    let err = server
        .client()
        .agent
        .stream_message(&StreamRequest::new("missing", "hi"), &cancel, |_| {}, || {})
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "会话不存在");
    assert_eq!(err.code(), Some(40400));
}

#[tokio::test]
async fn test_stream_error_status_without_json_body() {
    let server = spawn_backend().await;
    let cancel = CancellationToken::new();

    let err = server
        .client()
        .agent
        .stream_message(&StreamRequest::new("broken", "hi"), &cancel, |_| {}, || {})
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Request { .. }));
    assert_eq!(err.to_string(), "request failed (502)");
}

#[tokio::test]
async fn test_stream_cancellation_from_callback() {
    let server = spawn_backend().await;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let mut seen = 0;

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        server.client().agent.stream_message(
            &StreamRequest::new("hang", "hi"),
            &cancel,
            |_| {
                seen += 1;
                trigger.cancel();
            },
            || panic!("completion after cancel"),
        ),
    )
    .await
    .expect("cancellation should end the stream")
    .unwrap();

    assert_eq!(seen, 1);
    assert_eq!(outcome, StreamOutcome::Cancelled { events: 1 });
}

#[tokio::test]
async fn test_stream_cancellation_from_another_task() {
    let server = spawn_backend().await;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        server.client().agent.stream_message(
            &StreamRequest::new("hang", "hi"),
            &cancel,
            |_| {},
            || panic!("completion after cancel"),
        ),
    )
    .await
    .expect("cancellation should end the stream")
    .unwrap();

    assert!(outcome.is_cancelled());
}

#[tokio::test]
async fn test_post_list_normalizes_query_and_records() {
    let server = spawn_backend().await;
    let query = PostQuery {
        publish_type: Some(PublishType::Found),
        item_type: Some(format!(" {} ", "类".repeat(30))),
        page: Some(2),
        page_size: Some(99),
        ..PostQuery::default()
    };

    let page = server.client().posts.list_posts(&query).await.unwrap();

    assert_eq!(page.page, 2);
    assert_eq!(page.page_size, 50);
    assert_eq!(page.total, 2);
    assert_eq!(page.list[0].post_type, PostType::Found);
    assert_eq!(page.list[0].item_status, ItemStatus::AwaitingClaim);
    assert_eq!(page.list[0].storage_location, "图书馆");
    assert_eq!(page.list[1].item_status, ItemStatus::Returned);
}

#[tokio::test]
async fn test_post_list_query_echo() {
    let server = spawn_backend().await;
    let transport = server.transport(Some(common::TEST_TOKEN));

    let data = transport
        .request(
            ApiRequest::get("/post/list")
                .query("item_type", "证件")
                .query("location", "二食堂"),
        )
        .await
        .unwrap();

    assert_eq!(data["echo"], json!({"item_type": "证件", "location": "二食堂"}));
}

#[tokio::test]
async fn test_post_detail_item() {
    let server = spawn_backend().await;

    let item = server.client().posts.post_detail("1").await.unwrap();

    assert_eq!(item.storage_location, "保卫处");
    assert_eq!(item.contact, "张三 13800000000");
    assert_eq!(item.claim_count, 1);
}
