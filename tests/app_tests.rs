//! Dashboard flow tests.
//!
//! Each test drives `App` the way the page script does: navigate, then post
//! submissions, against a stub backend. Assertions cover the reply (alerts,
//! fragments, control state), persisted state and the requests that were
//! (or were not) sent.
use std::rc::Rc;

use codeagent::actions::ControlId;
use codeagent::api::{ApiClient, Method, Payload, StubTransport};
use codeagent::app::{App, Reply, Submission};
use codeagent::store::StateStore;
use codeagent::ui::Page;

const ANALYSIS_WITH_ACTIONS: &str = r#"{
    "summary": "Two problems",
    "detailed_analysis": "Details here",
    "suggested_actions": [
        {"action_type": "edit", "target_file": "a.rs", "description": "fix a"},
        {"action_type": "create_test", "target_file": "b.rs", "description": "test b"}
    ]
}"#;

const HISTORY: &str = r#"[
    {"id": "h1", "type": "code_analysis", "query": "Find the BUG in auth",
     "data": {"summary": "Old summary", "detailed_analysis": "Old details", "suggested_actions": []}},
    {"id": "h2", "type": "audio", "query": "weekly sync",
     "data": {"transcription": "hello team", "action_items": [{"text": "ship it"}]}}
]"#;

fn app() -> (Rc<StubTransport>, App) {
    let stub = Rc::new(StubTransport::new());
    let client = ApiClient::new("http://backend", Rc::clone(&stub));
    (stub, App::new(StateStore::in_memory(), client))
}

fn submit(app: &mut App, action: &str, body: &str) -> Reply {
    app.submit(Submission::from_request(action, body).unwrap())
}

fn json_body(stub: &StubTransport, index: usize) -> serde_json::Value {
    let calls = stub.calls();
    let Payload::Json(bytes) = &calls[index].payload else {
        panic!("expected a JSON payload");
    };
    serde_json::from_slice(bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Busy protocol
// ---------------------------------------------------------------------------

#[test]
fn busy_control_rejects_double_submit_without_a_request() {
    let (stub, mut app) = app();
    app.navigate(Page::CodeAnalysis);
    app.controls_mut().begin(ControlId::Analyze).unwrap();

    let reply = submit(&mut app, "analyze", r#"{"query":"why is it slow?"}"#);
    assert!(!reply.ok);
    assert_eq!(reply.alert, None);
    let control = reply.control.unwrap();
    assert!(!control.enabled);
    assert_eq!(control.label, "Thinking...");
    assert_eq!(stub.call_count("/analyze"), 0);
}

#[test]
fn navigation_resets_busy_controls() {
    let (_, mut app) = app();
    app.controls_mut().begin(ControlId::Ingest).unwrap();

    let rendered = app.navigate(Page::CodeAnalysis);
    assert!(app.controls().is_enabled(ControlId::Ingest));
    assert!(rendered.html.contains(
        r#"id="btn-ingest" data-action="ingest" data-busy="Ingesting...">Ingest Repository</button>"#
    ));
}

// ---------------------------------------------------------------------------
// Code analysis
// ---------------------------------------------------------------------------

#[test]
fn analysis_renders_results_and_caches_them() {
    let (stub, mut app) = app();
    stub.respond(
        Method::Post,
        "/analyze",
        200,
        r#"{"summary":"S","detailed_analysis":"D","suggested_actions":[]}"#,
    );
    app.navigate(Page::CodeAnalysis);

    let reply = submit(
        &mut app,
        "analyze",
        r#"{"query":"explain main","analysis_type":"review","include_codebase":false}"#,
    );
    assert!(reply.ok);
    let html = reply.html_for("results-area").unwrap();
    assert!(html.contains("<p>S</p>"));
    assert!(html.contains(r#"<div class="prewrap">D</div>"#));
    assert!(!html.contains("action-check"));

    let control = reply.control.unwrap();
    assert!(control.enabled);
    assert_eq!(control.label, "Run Analysis");

    let cached = app.state().last_analysis.as_ref().unwrap();
    assert_eq!(cached.query, "explain main");
    assert_eq!(cached.analysis_type.as_str(), "review");

    let body = json_body(&stub, 0);
    assert_eq!(body["include_codebase"], false);
}

#[test]
fn empty_query_is_rejected_before_any_request() {
    let (stub, mut app) = app();
    let reply = submit(&mut app, "analyze", r#"{"query":"   "}"#);

    assert_eq!(reply.alert.as_deref(), Some("Enter query"));
    assert!(reply.html_for("results-area").is_none());
    assert!(reply.control.unwrap().enabled);
    assert!(stub.calls().is_empty());
}

#[test]
fn backend_failure_replaces_results_with_error_card() {
    let (stub, mut app) = app();
    stub.respond(Method::Post, "/analyze", 500, "boom");

    let reply = submit(&mut app, "analyze", r#"{"query":"q"}"#);
    assert!(!reply.ok);
    assert_eq!(reply.alert.as_deref(), Some("HTTP Error 500"));
    assert!(reply
        .html_for("results-area")
        .unwrap()
        .contains("Error: HTTP Error 500"));
    assert!(app.state().last_analysis.is_none());
}

#[test]
fn ingest_requires_a_path_then_records_it() {
    let (stub, mut app) = app();
    let reply = submit(&mut app, "ingest", r#"{"repo_path":""}"#);
    assert_eq!(reply.alert.as_deref(), Some("Please provide path"));
    assert!(stub.calls().is_empty());

    stub.respond(Method::Post, "/ingest/codebase", 200, r#"{"status":"started"}"#);
    let reply = submit(&mut app, "ingest", r#"{"repo_path":" /src/app "}"#);
    assert_eq!(
        reply.alert.as_deref(),
        Some("Ingestion started in background!")
    );
    assert_eq!(reply.navigate.unwrap().page, Page::CodeAnalysis);
    assert!(app.state().repo_ingested);
    assert_eq!(app.state().last_repo_path.as_deref(), Some("/src/app"));

    let body = json_body(&stub, 0);
    assert_eq!(body["repo_path"], "/src/app");
    assert_eq!(body["workspace_id"], "default");
}

// ---------------------------------------------------------------------------
// Actions & fixes
// ---------------------------------------------------------------------------

#[test]
fn applying_selected_actions_sends_only_the_selection() {
    let (stub, mut app) = app();
    stub.respond(Method::Post, "/analyze", 200, ANALYSIS_WITH_ACTIONS);
    stub.respond(Method::Post, "/actions/execute", 200, r#"{"results":[]}"#);

    submit(&mut app, "analyze", r#"{"query":"q"}"#);
    let page = app.navigate(Page::ActionsFixes);
    assert_eq!(page.html.matches(r#"class="action-check""#).count(), 2);

    let reply = submit(&mut app, "apply-actions", r#"{"selected":[1]}"#);
    assert_eq!(
        reply.alert.as_deref(),
        Some("Actions executed successfully!")
    );
    let control = reply.control.unwrap();
    assert!(!control.enabled);
    assert_eq!(control.label, "Applied");

    let body = json_body(&stub, 1);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["target_file"], "b.rs");
    assert_eq!(body[0]["action_type"], "test");

    // Stays applied until the page is rendered again.
    let again = submit(&mut app, "apply-actions", r#"{"selected":[0]}"#);
    assert!(!again.ok);
    assert_eq!(stub.call_count("/actions/execute"), 1);

    app.navigate(Page::ActionsFixes);
    assert!(app.controls().is_enabled(ControlId::ApplyActions));
}

#[test]
fn applying_nothing_is_a_validation_error() {
    let (stub, mut app) = app();
    stub.respond(Method::Post, "/analyze", 200, ANALYSIS_WITH_ACTIONS);
    submit(&mut app, "analyze", r#"{"query":"q"}"#);

    let reply = submit(&mut app, "apply-actions", r#"{"selected":[]}"#);
    assert_eq!(reply.alert.as_deref(), Some("Select at least one action"));
    assert!(reply.control.unwrap().enabled);
    assert_eq!(stub.call_count("/actions/execute"), 0);
}

#[test]
fn failed_execution_restores_the_button() {
    let (stub, mut app) = app();
    stub.respond(Method::Post, "/analyze", 200, ANALYSIS_WITH_ACTIONS);
    stub.respond(Method::Post, "/actions/execute", 502, r#"{"detail":"git push rejected"}"#);
    submit(&mut app, "analyze", r#"{"query":"q"}"#);

    let reply = submit(&mut app, "apply-actions", r#"{"selected":[0,1]}"#);
    assert_eq!(
        reply.alert.as_deref(),
        Some("Execution failed: git push rejected")
    );
    let control = reply.control.unwrap();
    assert!(control.enabled);
    assert_eq!(control.label, "Apply Selected Actions");
}

// ---------------------------------------------------------------------------
// Screenshot and audio
// ---------------------------------------------------------------------------

#[test]
fn screenshot_preview_and_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("login.png");
    std::fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();
    let file = image.display().to_string();

    let (stub, mut app) = app();
    stub.respond(
        Method::Post,
        "/ingest/screenshot",
        200,
        r#"{"analysis":{"vision_analysis":{"extracted_text":"Invalid password"},"detailed_explanation":"Login form"}}"#,
    );
    app.navigate(Page::ScreenshotAnalysis);

    let body = serde_json::json!({ "file": file }).to_string();
    let preview = submit(&mut app, "preview-screenshot", &body);
    assert_eq!(preview.html_for("file-name"), Some("login.png"));
    assert!(preview
        .html_for("ss-preview")
        .unwrap()
        .contains("data:image/png;base64,"));
    assert!(stub.calls().is_empty());

    let body = serde_json::json!({ "file": file, "context": "why?" }).to_string();
    let reply = submit(&mut app, "analyze-screenshot", &body);
    assert!(reply.ok);
    assert!(reply.html_for("ss-preview").unwrap().contains("Invalid password"));
    assert!(app.state().last_screenshot.is_some());
}

#[test]
fn audio_without_a_file_is_rejected() {
    let (stub, mut app) = app();
    let reply = submit(&mut app, "process-audio", r#"{"participants":"Ana, Bo"}"#);
    assert_eq!(reply.alert.as_deref(), Some("Choose audio file"));
    assert_eq!(reply.control.unwrap().label, "Process Audio");
    assert!(stub.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Settings and history
// ---------------------------------------------------------------------------

#[test]
fn saving_settings_repoints_the_client() {
    let (stub, mut app) = app();
    let reply = submit(
        &mut app,
        "save-settings",
        r#"{"backend_url":"http://other:9000/","workspace_id":"w1"}"#,
    );
    assert!(reply.reload);
    assert_eq!(reply.alert.as_deref(), Some("Settings saved! Reloading..."));
    assert_eq!(app.state().settings.workspace_id, "w1");

    stub.respond(Method::Get, "/health", 200, "{}");
    app.check_health(std::time::Instant::now());
    assert_eq!(stub.calls()[0].url, "http://other:9000/health");
}

#[test]
fn blank_backend_url_falls_back_to_the_default() {
    let (stub, mut app) = app();
    let reply = submit(
        &mut app,
        "save-settings",
        r#"{"backend_url":"  ","workspace_id":"w1"}"#,
    );
    assert!(reply.ok);
    assert_eq!(app.state().settings.backend_url, "http://localhost:8000");
    assert_eq!(app.client().base_url(), "http://localhost:8000");

    stub.respond(Method::Get, "/health", 200, "{}");
    app.check_health(std::time::Instant::now());
    assert_eq!(stub.calls()[0].url, "http://localhost:8000/health");
}

#[test]
fn history_filters_and_loads_entries() {
    let (stub, mut app) = app();
    stub.respond(Method::Get, "/history", 200, HISTORY);
    app.navigate(Page::History);

    let reply = submit(&mut app, "filter-history", r#"{"search":"bug","kind":"all"}"#);
    let list = reply.html_for("history-list-container").unwrap();
    assert!(list.contains("Find the BUG in auth"));
    assert!(!list.contains("weekly sync"));

    let reply = submit(&mut app, "filter-history", r#"{"search":"","kind":"audio"}"#);
    let list = reply.html_for("history-list-container").unwrap();
    assert!(list.contains("weekly sync"));
    assert!(!list.contains("Find the BUG"));

    let reply = submit(&mut app, "load-history-entry", r#"{"id":"h1"}"#);
    let rendered = reply.navigate.unwrap();
    assert_eq!(rendered.page, Page::CodeAnalysis);
    assert!(rendered.html.contains("Old summary"));
    assert_eq!(
        app.state().last_analysis.as_ref().unwrap().summary,
        "Old summary"
    );

    let reply = submit(&mut app, "load-history-entry", r#"{"id":"h2"}"#);
    assert_eq!(reply.navigate.unwrap().page, Page::AudioTranscription);
    assert_eq!(
        app.state().last_audio.as_ref().unwrap().transcription.as_deref(),
        Some("hello team")
    );

    let reply = submit(&mut app, "load-history-entry", r#"{"id":"nope"}"#);
    assert_eq!(reply.alert.as_deref(), Some("Entry not found"));
}

#[test]
fn clearing_history_reports_failures() {
    let (stub, mut app) = app();
    stub.respond(Method::Delete, "/history", 500, r#"{"detail":"db locked"}"#);

    let reply = submit(&mut app, "clear-history", "");
    assert_eq!(
        reply.alert.as_deref(),
        Some("Failed to clear history: db locked")
    );
    assert!(!reply.reload);

    stub.respond(Method::Delete, "/history", 200, r#"{"status":"cleared"}"#);
    let reply = submit(&mut app, "clear-history", "");
    assert_eq!(reply.alert.as_deref(), Some("History cleared!"));
    assert!(reply.reload);
}
