//! Integration tests for the SSE and messages endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use super::session::{EvictionPolicy, SessionRegistry};
use super::{AppState, routes};
use crate::testing::{StaticBackend, dispatcher};

struct TestApp {
    router: Router,
    registry: Arc<SessionRegistry>,
}

fn test_app(backend: StaticBackend) -> TestApp {
    let registry = Arc::new(SessionRegistry::new(EvictionPolicy::Retain));
    let state = AppState::new(
        dispatcher(backend),
        Arc::clone(&registry),
        Duration::from_secs(30),
    );
    TestApp {
        router: routes::create_router(state),
        registry,
    }
}

/// One parsed SSE event: `(event name, data)`.
#[derive(Debug)]
struct SseEvent {
    event: Option<String>,
    data: String,
}

impl SseEvent {
    fn json(&self) -> Value {
        serde_json::from_str(&self.data).unwrap()
    }
}

fn parse_event(raw: &str) -> Option<SseEvent> {
    let mut event = None;
    let mut data = Vec::new();
    for line in raw.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event = Some(name.trim().to_string());
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
    }
    // Comment-only blocks (keep-alives) carry no data.
    (event.is_some() || !data.is_empty()).then(|| SseEvent {
        event,
        data: data.join("\n"),
    })
}

/// Read `count` events from an SSE body, failing after two seconds.
async fn read_events(body: &mut Body, count: usize) -> Vec<SseEvent> {
    let mut buffer = String::new();
    let mut events = Vec::new();

    while events.len() < count {
        let frame = tokio::time::timeout(Duration::from_secs(2), body.frame())
            .await
            .expect("timed out waiting for SSE event")
            .expect("SSE stream ended")
            .unwrap();
        if let Ok(data) = frame.into_data() {
            buffer.push_str(std::str::from_utf8(&data).unwrap());
        }
        while let Some(pos) = buffer.find("\n\n") {
            let raw: String = buffer.drain(..pos + 2).collect();
            if let Some(event) = parse_event(&raw) {
                events.push(event);
            }
        }
    }

    events
}

async fn open_sse(app: &TestApp, session_id: Option<&str>) -> axum::response::Response {
    let uri = match session_id {
        Some(id) => format!("/sse?session_id={id}"),
        None => "/sse".to_string(),
    };
    app.router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_message(app: &TestApp, session_id: Option<&str>, body: Value) -> StatusCode {
    post_raw(app, session_id, body.to_string()).await
}

async fn post_raw(app: &TestApp, session_id: Option<&str>, body: String) -> StatusCode {
    let uri = match session_id {
        Some(id) => format!("/messages?session_id={id}"),
        None => "/messages".to_string(),
    };
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty(), "POST /messages must not carry a payload");
    status
}

/// Poll until `session_id` has `count` queued responses.
async fn wait_for_pending(app: &TestApp, session_id: &str, count: usize) {
    for _ in 0..200 {
        if app
            .registry
            .get(session_id)
            .is_some_and(|s| s.pending_len() >= count)
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {count} pending responses on {session_id}");
}

fn search_call(id: i64, query: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": "perplexica_search", "arguments": {"query": query}}
    })
}

#[tokio::test]
async fn test_health() {
    let app = test_app(StaticBackend::new());

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_sse_new_session_announces_endpoint() {
    let app = test_app(StaticBackend::new());

    let response = open_sse(&app, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let mut body = response.into_body();
    let events = read_events(&mut body, 1).await;

    assert_eq!(events[0].event.as_deref(), Some("endpoint"));
    let session_id = events[0]
        .data
        .strip_prefix("/messages?session_id=")
        .expect("endpoint path");
    let session = app.registry.get(session_id).expect("session registered");
    assert!(session.has_channel());
}

#[tokio::test]
async fn test_post_acknowledges_with_202_and_queues_without_stream() {
    let app = test_app(StaticBackend::new());

    let status = post_message(
        &app,
        Some("abc"),
        json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list", "params": {}}),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    wait_for_pending(&app, "abc", 1).await;

    let pending = app.registry.get("abc").unwrap().pending();
    assert_eq!(pending[0].id, json!(1));
    assert!(pending[0].result.as_ref().unwrap()["tools"].is_array());
}

#[tokio::test]
async fn test_post_without_session_id_creates_orphan_session() {
    let app = test_app(StaticBackend::new());

    let status = post_message(
        &app,
        None,
        json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(app.registry.len(), 1);
}

#[tokio::test]
async fn test_malformed_body_is_delivered_as_error() {
    let app = test_app(StaticBackend::new());

    let status = post_raw(&app, Some("bad"), "{oops".to_string()).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let pending = app.registry.get("bad").unwrap().pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, Value::Null);
    assert_eq!(pending[0].error.as_ref().unwrap().code, -32603);
}

#[tokio::test]
async fn test_notification_produces_no_response() {
    let app = test_app(StaticBackend::new());

    post_message(
        &app,
        Some("n"),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let session = app.registry.get("n").unwrap();
    assert_eq!(session.pending_len(), 0);
    assert_eq!(session.in_flight(), 0);
}

#[tokio::test]
async fn test_round_trip_over_sse() {
    let app = test_app(StaticBackend::new());

    let mut body = open_sse(&app, None).await.into_body();
    let endpoint = read_events(&mut body, 1).await.remove(0);
    let session_id = endpoint
        .data
        .strip_prefix("/messages?session_id=")
        .unwrap()
        .to_string();

    post_message(
        &app,
        Some(&session_id),
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
    )
    .await;
    let init = read_events(&mut body, 1).await.remove(0).json();
    assert_eq!(init["id"], 1);
    assert_eq!(init["result"]["protocolVersion"], "2024-11-05");

    post_message(
        &app,
        Some(&session_id),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list", "params": {}}),
    )
    .await;
    let list = read_events(&mut body, 1).await.remove(0).json();
    assert_eq!(list["result"]["tools"][0]["name"], "perplexica_search");

    post_message(&app, Some(&session_id), search_call(3, "what is rust")).await;
    let call = read_events(&mut body, 1).await.remove(0);
    assert_eq!(call.event.as_deref(), Some("message"));
    let call = call.json();
    assert_eq!(call["id"], 3);
    let text = call["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("ANSWER"));
    assert!(text.contains("\"title\": \"S\""));
}

#[tokio::test]
async fn test_tools_call_failure_arrives_as_error_response() {
    let app = test_app(StaticBackend::new().failing(500, "upstream broke"));

    post_message(&app, Some("f"), search_call(9, "q")).await;
    wait_for_pending(&app, "f", 1).await;

    let pending = app.registry.get("f").unwrap().pending();
    let error = pending[0].error.as_ref().unwrap();
    assert_eq!(pending[0].id, json!(9));
    assert_eq!(error.code, -32603);
    assert!(error.message.contains("500"));
    assert!(error.message.contains("upstream broke"));
}

#[tokio::test]
async fn test_concurrent_requests_are_delivered_in_completion_order() {
    let backend = StaticBackend::new().with_delay(Duration::from_millis(100));
    let app = test_app(backend);

    post_message(&app, Some("c"), search_call(1, "slow")).await;
    post_message(
        &app,
        Some("c"),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
    )
    .await;

    wait_for_pending(&app, "c", 2).await;

    let ids: Vec<Value> = app
        .registry
        .get("c")
        .unwrap()
        .pending()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![json!(2), json!(1)]);
}

#[tokio::test]
async fn test_reconnect_replays_queued_responses_without_endpoint_event() {
    let app = test_app(StaticBackend::new());

    // First stream, then disconnect.
    let response = open_sse(&app, Some("resume")).await;
    drop(response);
    assert!(!app.registry.get("resume").unwrap().has_channel());

    for id in [1, 2] {
        post_message(
            &app,
            Some("resume"),
            json!({"jsonrpc": "2.0", "id": id, "method": "ping"}),
        )
        .await;
        wait_for_pending(&app, "resume", id as usize).await;
    }

    let mut body = open_sse(&app, Some("resume")).await.into_body();
    let events = read_events(&mut body, 2).await;

    assert!(events.iter().all(|e| e.event.as_deref() == Some("message")));
    assert_eq!(events[0].json()["id"], 1);
    assert_eq!(events[1].json()["id"], 2);
    assert_eq!(app.registry.get("resume").unwrap().pending_len(), 0);
}

#[tokio::test]
async fn test_second_stream_replaces_first() {
    let app = test_app(StaticBackend::new());

    let first = open_sse(&app, Some("dup")).await;
    let mut second = open_sse(&app, Some("dup")).await.into_body();

    post_message(
        &app,
        Some("dup"),
        json!({"jsonrpc": "2.0", "id": 5, "method": "ping"}),
    )
    .await;

    let events = read_events(&mut second, 1).await;
    assert_eq!(events[0].json()["id"], 5);

    let mut first = first.into_body();
    let nothing = tokio::time::timeout(Duration::from_millis(100), first.frame()).await;
    assert!(nothing.is_err(), "replaced stream must not receive responses");
    assert_eq!(app.registry.len(), 1);
}

async fn post_tool_search(app: &TestApp, body: &str) -> (StatusCode, Value) {
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/tools/perplexica_search")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_tool_search_returns_answer_and_resolved_models() {
    let backend = StaticBackend::new();
    let app = test_app(backend.clone());

    let (status, body) = post_tool_search(
        &app,
        r#"{"query": "  rust  ", "focusMode": "academicSearch", "history": [["user", "hi"]]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "tool": "perplexica_search",
            "query": "rust",
            "focusMode": "academicSearch",
            "optimizationMode": "balanced",
            "providerId": "p-chat",
            "embedProviderId": "p-embed",
            "llmModel": "gpt-4o-mini",
            "embeddingModel": "text-embedding-3-small",
            "result": {"message": "ANSWER", "sources": [{"title": "S"}]}
        })
    );
    assert_eq!(backend.calls(), 1);
    assert!(app.registry.is_empty(), "REST calls do not create sessions");
}

#[tokio::test]
async fn test_tool_search_blank_query_is_400() {
    let backend = StaticBackend::new();
    let app = test_app(backend.clone());

    for body in [r#"{"query": "   "}"#, r#"{}"#, "not json"] {
        let (status, response) = post_tool_search(&app, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(response, json!({"message": "Missing query"}));
    }
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_tool_search_upstream_failure_is_500() {
    let app = test_app(StaticBackend::new().failing(502, "bad gateway"));

    let (status, body) = post_tool_search(&app, r#"{"query": "q"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "MCP search error");
    assert_eq!(body["error"], "Search failed (502): bad gateway");
}

#[tokio::test]
async fn test_tool_search_without_providers_is_500() {
    let app = test_app(StaticBackend::new().without_providers());

    let (status, body) = post_tool_search(&app, r#"{"query": "q"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"message": "No configured providers found in Perplexica"})
    );
}
