//! Router tests against an in-memory `SqliteStore`.

use std::{fs, sync::Arc};

use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Request, StatusCode},
};
use custodian_core::{
  insight::{InsightQuery, RAW_FOSSIL},
  project::NewProject,
  store::FossilStore,
};
use custodian_store_sqlite::SqliteStore;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt as _;

use crate::api_router;

const PAYLOAD: &str = r#"```json
{
  "summary": "Billing service",
  "recent_changes": "Moved invoices to a queue",
  "file_tree": [{"path": "app.py", "line_count": 12}],
  "symbols": [
    {"name": "create_invoice", "file_path": "billing/invoice.py", "line_number": 3,
     "relationships": {"calls": ["send_email"]}},
    {"name": "send_email", "file_path": "mail/send.py", "line_number": 8}
  ]
}
```"#;

struct Harness {
  store:  Arc<SqliteStore>,
  router: Router,
  source: TempDir,
}

async fn harness() -> Harness {
  let source = TempDir::new().unwrap();
  fs::write(
    source.path().join("app.py"),
    "def create_invoice(order):\n    pass\n\ndef refund_invoice(order):\n    pass\n",
  )
  .unwrap();

  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  store
    .register_project(NewProject {
      name:  "billing".into(),
      path:  source.path().to_path_buf(),
      stack: "python".into(),
    })
    .await
    .unwrap();

  let router = api_router(store.clone());
  Harness { store, router, source }
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
  let resp = router.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, bytes.to_vec())
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
  let (status, body) = send(router, Request::get(uri).body(Body::empty()).unwrap()).await;
  (status, serde_json::from_slice(&body).unwrap())
}

async fn post_fossil(router: &Router, project: &str, body: &str) -> (StatusCode, Value) {
  let req = Request::post(format!("/projects/{project}/fossils"))
    .body(Body::from(body.to_owned()))
    .unwrap();
  let (status, body) = send(router, req).await;
  (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn store_then_read_latest_fossil() {
  let h = harness().await;

  let (status, receipt) = post_fossil(&h.router, "billing", PAYLOAD).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(receipt["version"], 1);
  assert_eq!(receipt["symbol_count"], 2);

  let (status, fossil) = get_json(&h.router, "/projects/BILL/fossil?include_symbols=true").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fossil["project"], "billing");
  assert_eq!(fossil["summary"], "Billing service");
  assert!(fossil.get("file_tree").is_none());
  assert_eq!(fossil["symbols"].as_array().unwrap().len(), 2);

  let (_, changes) = get_json(&h.router, "/projects/billing/changes").await;
  assert_eq!(changes["recent_changes"], "Moved invoices to a queue");
}

#[tokio::test]
async fn unknown_project_and_missing_fossil_are_404() {
  let h = harness().await;

  let (status, body) = get_json(&h.router, "/projects/nope/fossil").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "project 'nope' not found");

  let (status, body) = get_json(&h.router, "/projects/billing/history").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "no fossil found for 'billing'");
}

#[tokio::test]
async fn malformed_fossil_is_kept_as_insight() {
  let h = harness().await;

  let (status, body) = post_fossil(&h.router, "billing", "the model rambled").await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["error"].as_str().unwrap().contains("invalid JSON"));

  let project = h.store.list_projects().await.unwrap().remove(0);
  assert_eq!(project.fossil_count, 0);

  let kept = h
    .store
    .list_insights(&InsightQuery {
      project_id: Some(project.project.project_id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(kept.len(), 1);
  assert_eq!(kept[0].insight_type, RAW_FOSSIL);
  assert_eq!(kept[0].content, "the model rambled");
}

#[tokio::test]
async fn symbol_context_and_related_files() {
  let h = harness().await;
  post_fossil(&h.router, "billing", PAYLOAD).await;

  let (status, context) =
    get_json(&h.router, "/projects/billing/symbols/context?symbol=INVOICE").await;
  assert_eq!(status, StatusCode::OK);
  let context = context.as_array().unwrap();
  assert_eq!(context.len(), 1);
  assert_eq!(context[0]["file_path"], "billing/invoice.py");

  let (_, related) = get_json(&h.router, "/projects/billing/related?symbol=create_invoice").await;
  assert_eq!(related["direct"], serde_json::json!(["billing/invoice.py"]));
  assert_eq!(related["related"], serde_json::json!(["mail/send.py"]));
}

#[tokio::test]
async fn live_lookup_reads_current_source() {
  let h = harness().await;

  let (status, found) = get_json(&h.router, "/projects/billing/symbols/lookup?symbol=invoice").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(found["count"], 2);
  assert!(found.get("note").is_none());

  let (_, exact) = get_json(
    &h.router,
    "/projects/billing/symbols/lookup?symbol=create_invoice&exact=true",
  )
  .await;
  assert_eq!(exact["count"], 1);
  assert_eq!(exact["matches"][0]["line"], 1);
  assert_eq!(exact["matches"][0]["signature"], "(order)");
}

#[tokio::test]
async fn live_lookup_is_capped() {
  let h = harness().await;
  let many: String = (0..60).map(|i| format!("def handler_{i}():\n    pass\n")).collect();
  fs::write(h.source.path().join("many.py"), many).unwrap();

  let (_, found) = get_json(&h.router, "/projects/billing/symbols/lookup?symbol=handler").await;
  assert_eq!(found["count"], 50);
  assert!(found["note"].as_str().unwrap().contains("truncated"));
}

#[tokio::test]
async fn every_tool_call_is_logged() {
  let h = harness().await;
  get_json(&h.router, "/projects").await;
  get_json(&h.router, "/projects/billing/fossil").await;
  get_json(&h.router, "/insights").await;

  let recent = h.store.recent_queries(None, 10).await.unwrap();
  let tools: Vec<&str> = recent.iter().map(|q| q.tool_name.as_str()).collect();
  assert_eq!(tools, ["get_detective_insights", "get_project_fossil", "list_projects"]);
  assert_eq!(recent[1].project_name.as_deref(), Some("billing"));
}

#[tokio::test]
async fn analysis_corpus_is_plain_text() {
  let h = harness().await;
  post_fossil(&h.router, "billing", PAYLOAD).await;

  let req = Request::get("/analysis?project=billing").body(Body::empty()).unwrap();
  let (status, body) = send(&h.router, req).await;
  assert_eq!(status, StatusCode::OK);
  let text = String::from_utf8(body).unwrap();
  assert!(text.contains("=== PROJECT: billing ==="));
  assert!(text.contains("store_fossil on billing: 1 calls"));
}

#[tokio::test]
async fn malformed_fossil_for_unknown_project_is_404_and_keeps_nothing() {
  let h = harness().await;

  let (status, body) = post_fossil(&h.router, "ghost", "garbage").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "project 'ghost' not found");

  let project = h.store.list_projects().await.unwrap().remove(0);
  let kept = h
    .store
    .list_insights(&InsightQuery {
      project_id: Some(project.project.project_id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(kept.is_empty());
}

#[tokio::test]
async fn reads_survive_a_failing_query_log() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("custodian.db");
  let store = Arc::new(SqliteStore::open(&path).await.unwrap());
  store
    .register_project(NewProject {
      name:  "billing".into(),
      path:  dir.path().to_path_buf(),
      stack: "python".into(),
    })
    .await
    .unwrap();

  rusqlite::Connection::open(&path)
    .unwrap()
    .execute_batch("DROP TABLE query_log;")
    .unwrap();

  let router = api_router(store.clone());
  let (status, projects) = get_json(&router, "/projects").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(projects[0]["name"], "billing");

  let (status, receipt) = post_fossil(&router, "billing", PAYLOAD).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(receipt["version"], 1);

  assert!(store.recent_queries(None, 10).await.is_err());
}
