//! End-to-end tests of the HTTP API against an on-disk session store,
//! the offline hash embedder, and a scripted language model.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use docdrift::config::Config;
use docdrift::disk_store::DiskIndexStore;
use docdrift::embedding::HashProvider;
use docdrift::scenarios::ScenarioCatalog;
use docdrift::server::{build_router, AppState};
use docdrift_core::completion::CompletionProvider;
use docdrift_core::models::AuditIssue;

const PRINT_AUDIT_REPLY: &str = r#"```json
[
  {
    "contradiction": true,
    "reason": "print is now a function",
    "fix": "Call print with parentheses",
    "severity": "High",
    "old_quote": "print \"Hello World\"",
    "new_quote": "Use `print(\"Hello\")`."
  }
]
```"#;

/// Answers chat prompts with a fixed line and audit prompts with
/// `audit_reply`, but only when both python documents are in the prompt.
struct ScriptedModel {
    audit_reply: String,
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn new(audit_reply: &str) -> Arc<Self> {
        Arc::new(Self {
            audit_reply: audit_reply.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if prompt.starts_with("Context: ") {
            return Ok("Based on the docs: it changed.".to_string());
        }
        if prompt.contains("Text A: PYTHON 2.7") && prompt.contains("Text B: PYTHON 3.x") {
            Ok(self.audit_reply.clone())
        } else {
            Ok("[]".to_string())
        }
    }
}

fn app_state(root: &Path, llm: Arc<dyn CompletionProvider>) -> AppState {
    let mut config = Config::minimal();
    config.storage.index_root = root.to_path_buf();
    AppState::new(
        config,
        ScenarioCatalog::builtin(),
        Arc::new(DiskIndexStore::new(root)),
        Arc::new(HashProvider::default()),
        llm,
    )
}

fn app(state: AppState) -> Router {
    build_router(state).unwrap()
}

fn post(uri: &str, session: Option<&str>, body: Value) -> Request<Body> {
    let mut req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(s) = session {
        req = req.header("X-Session-ID", s);
    }
    req.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method(Method::GET).uri(uri);
    if let Some(s) = session {
        req = req.header("X-Session-ID", s);
    }
    req.body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn load(app: &Router, session: &str, scenario: &str) -> Value {
    let (status, body) = send(
        app,
        post("/load-scenario", Some(session), json!({ "scenario_id": scenario })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

async fn chat(app: &Router, session: Option<&str>, message: &str) -> String {
    let (status, body) = send(app, post("/chat", session, json!({ "message": message }))).await;
    assert_eq!(status, StatusCode::OK);
    body["response"].as_str().unwrap().to_string()
}

async fn issues(app: &Router, session: Option<&str>) -> Vec<String> {
    let (status, body) = send(app, get("/maintenance", session)).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_value(body["issues"].clone()).unwrap()
}

#[tokio::test]
async fn test_every_scenario_loads_and_answers() {
    let tmp = TempDir::new().unwrap();
    let model = ScriptedModel::new(PRINT_AUDIT_REPLY);
    let state = app_state(tmp.path(), model.clone());
    let ids: Vec<String> = state.catalog.ids().map(str::to_string).collect();
    let app = app(state);

    assert_eq!(ids.len(), 10);
    for id in &ids {
        let session = format!("session-{}", id);
        let body = load(&app, &session, id).await;
        assert_eq!(body["status"], format!("Loaded scenario: {}", id));
        assert!(body["chunks"].as_u64().unwrap() >= 1, "{}", id);

        let reply = chat(&app, Some(session.as_str()), "What changed?").await;
        assert_ne!(reply, "Please load a scenario first.");
    }
}

#[tokio::test]
async fn test_python_audit_surfaces_print_change() {
    let tmp = TempDir::new().unwrap();
    let app = app(app_state(tmp.path(), ScriptedModel::new(PRINT_AUDIT_REPLY)));

    let body = load(&app, "s1", "python").await;
    assert_eq!(body, json!({ "status": "Loaded scenario: python", "chunks": 2 }));

    let found = issues(&app, Some("s1")).await;
    assert_eq!(found.len(), 1);
    let issue: AuditIssue = serde_json::from_str(&found[0]).unwrap();
    assert!(issue.contradiction);
    assert!(issue.old_quote.contains("print \"Hello World\""));
    assert!(issue.new_quote.contains("print(\"Hello\")"));
}

#[tokio::test]
async fn test_missing_session_header() {
    let tmp = TempDir::new().unwrap();
    let app = app(app_state(tmp.path(), ScriptedModel::new("[]")));

    let (status, body) = send(
        &app,
        post("/load-scenario", None, json!({ "scenario_id": "python" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "error": "No Session ID" }));

    let (_, body) = send(
        &app,
        post("/load-scenario", Some(""), json!({ "scenario_id": "python" })),
    )
    .await;
    assert_eq!(body, json!({ "error": "No Session ID" }));

    assert_eq!(chat(&app, None, "hi").await, "Please load a scenario first.");
    assert!(issues(&app, None).await.is_empty());
}

#[tokio::test]
async fn test_fresh_session_gets_sentinels_without_model_calls() {
    let tmp = TempDir::new().unwrap();
    let model = ScriptedModel::new(PRINT_AUDIT_REPLY);
    let app = app(app_state(tmp.path(), model.clone()));

    assert_eq!(
        chat(&app, Some("brand-new"), "hello").await,
        "Please load a scenario first."
    );
    assert!(issues(&app, Some("brand-new")).await.is_empty());
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_unknown_scenario_leaves_sessions_unchanged() {
    let tmp = TempDir::new().unwrap();
    let app = app(app_state(tmp.path(), ScriptedModel::new(PRINT_AUDIT_REPLY)));

    load(&app, "s1", "python").await;
    let body = load(&app, "s1", "cobol").await;
    assert_eq!(body, json!({ "error": "Scenario not found" }));
    assert_eq!(issues(&app, Some("s1")).await.len(), 1);

    let body = load(&app, "s2", "cobol").await;
    assert_eq!(body, json!({ "error": "Scenario not found" }));
    assert!(!tmp.path().join("s2").exists());
    assert_eq!(chat(&app, Some("s2"), "hi").await, "Please load a scenario first.");
}

#[tokio::test]
async fn test_reload_replaces_index() {
    let tmp = TempDir::new().unwrap();
    let state = app_state(tmp.path(), ScriptedModel::new(PRINT_AUDIT_REPLY));
    let app = app(state.clone());

    load(&app, "s1", "python").await;
    assert_eq!(issues(&app, Some("s1")).await.len(), 1);

    let body = load(&app, "s1", "stripe").await;
    let chunks = body["chunks"].as_u64().unwrap() as usize;
    let index = state.sessions.get(Some("s1")).await.unwrap();
    assert_eq!(index.len(), chunks);
    assert!(index.chunks().all(|c| !c.text.contains("PYTHON")));
    assert!(issues(&app, Some("s1")).await.is_empty());
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let tmp = TempDir::new().unwrap();
    let state = app_state(tmp.path(), ScriptedModel::new(PRINT_AUDIT_REPLY));
    let app = app(state.clone());

    load(&app, "alice", "python").await;
    load(&app, "bob", "react").await;

    assert_eq!(issues(&app, Some("alice")).await.len(), 1);
    assert!(issues(&app, Some("bob")).await.is_empty());
    assert_eq!(state.sessions.resident_count(), 2);
}

#[tokio::test]
async fn test_unparseable_audit_reply_is_returned_raw() {
    let tmp = TempDir::new().unwrap();
    let app = app(app_state(
        tmp.path(),
        ScriptedModel::new("I found a few problems, see below."),
    ));

    load(&app, "s1", "python").await;
    assert_eq!(
        issues(&app, Some("s1")).await,
        vec!["I found a few problems, see below.".to_string()]
    );
}

#[tokio::test]
async fn test_restart_reloads_sessions_from_disk() {
    let tmp = TempDir::new().unwrap();
    {
        let app = app(app_state(tmp.path(), ScriptedModel::new(PRINT_AUDIT_REPLY)));
        load(&app, "s1", "python").await;
    }

    let state = app_state(tmp.path(), ScriptedModel::new(PRINT_AUDIT_REPLY));
    assert_eq!(state.sessions.resident_count(), 0);
    let app = app(state.clone());

    assert_eq!(issues(&app, Some("s1")).await.len(), 1);
    assert_ne!(
        chat(&app, Some("s1"), "How do I print?").await,
        "Please load a scenario first."
    );
    assert_eq!(state.sessions.resident_count(), 1);
}

#[tokio::test]
async fn test_corrupt_dump_is_treated_as_absent() {
    let tmp = TempDir::new().unwrap();
    {
        let app = app(app_state(tmp.path(), ScriptedModel::new(PRINT_AUDIT_REPLY)));
        load(&app, "s1", "python").await;
    }
    std::fs::write(tmp.path().join("s1").join("index.json"), "not json").unwrap();

    let app = app(app_state(tmp.path(), ScriptedModel::new(PRINT_AUDIT_REPLY)));
    assert_eq!(chat(&app, Some("s1"), "hi").await, "Please load a scenario first.");
    assert!(issues(&app, Some("s1")).await.is_empty());

    // A fresh load overwrites the corrupt dump.
    load(&app, "s1", "python").await;
    assert_eq!(issues(&app, Some("s1")).await.len(), 1);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let tmp = TempDir::new().unwrap();
    let app = app(app_state(tmp.path(), ScriptedModel::new("[]")));

    let req = Request::builder()
        .method(Method::POST)
        .uri("/chat")
        .header("content-type", "application/json")
        .header("X-Session-ID", "s1")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, body) = send(&app, post("/load-scenario", Some("s1"), json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_failed_completion_on_chat_is_upstream_error() {
    struct Down;

    #[async_trait]
    impl CompletionProvider for Down {
        fn model_name(&self) -> &str {
            "down"
        }
        async fn complete(&self, _prompt: &str) -> Result<String> {
            anyhow::bail!("Completion API error 503")
        }
    }

    let tmp = TempDir::new().unwrap();
    let app = app(app_state(tmp.path(), Arc::new(Down)));
    load(&app, "s1", "python").await;

    let (status, body) = send(&app, post("/chat", Some("s1"), json!({ "message": "hi" }))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "upstream_error");

    assert!(issues(&app, Some("s1")).await.is_empty());
}

#[tokio::test]
async fn test_scenarios_and_health() {
    let tmp = TempDir::new().unwrap();
    let app = app(app_state(tmp.path(), ScriptedModel::new("[]")));

    let (status, body) = send(&app, get("/scenarios", None)).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["scenarios"].as_array().unwrap();
    assert_eq!(list.len(), 10);
    assert_eq!(list[0]["id"], "aws_s3");
    assert_eq!(list[0]["old_source"], "Old_Documentation.txt");
    assert_eq!(list[0]["new_source"], "New_Changelog.txt");

    let (status, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_cors_allows_only_configured_origin() {
    let tmp = TempDir::new().unwrap();
    let app = app(app_state(tmp.path(), ScriptedModel::new("[]")));

    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/chat")
            .header("Origin", origin)
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "content-type,x-session-id")
            .body(Body::empty())
            .unwrap()
    };

    let resp = app
        .clone()
        .oneshot(preflight("http://localhost:3000"))
        .await
        .unwrap();
    let headers = resp.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get("access-control-allow-credentials").unwrap(),
        "true"
    );
    assert_eq!(
        headers.get("access-control-allow-headers").unwrap(),
        "content-type,x-session-id"
    );

    let resp = app
        .clone()
        .oneshot(preflight("http://evil.example"))
        .await
        .unwrap();
    assert!(resp.headers().get("access-control-allow-origin").is_none());
}
