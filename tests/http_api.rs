//! End-to-end tests for the analysis API router.

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::Router;
use cx_lab::config::Config;
use cx_lab::error::Result;
use cx_lab::http::{HttpState, router};
use cx_lab::pipeline::{AGENTS, AgentInfo, AnalysisStage, Pipeline, StageContext};
use cx_lab::project::ProjectData;
use cx_lab::sessions::SessionStore;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_config() -> Config {
    let mut config = Config::default();
    config.pipeline.stage_delay_ms = 0;
    config.pipeline.stage_timeout_ms = 5_000;
    config.server.allowed_origins = Vec::new();
    config
}

fn app(config: Config) -> Router {
    router(HttpState::new(config))
}

/// Router whose only stage never finishes within a test
fn stalled_app(config: Config) -> Router {
    struct Stalled;

    #[async_trait]
    impl AnalysisStage for Stalled {
        fn agent(&self) -> &'static AgentInfo {
            &AGENTS[0]
        }

        async fn run(&self, _ctx: &StageContext) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(String::new())
        }
    }

    let store = SessionStore::from_config(&config);
    let pipeline = Pipeline::with_stages(store, &config.pipeline, vec![Arc::new(Stalled)]);
    router(HttpState::with_pipeline(config, pipeline))
}

fn create_body() -> Value {
    let mut data = ProjectData::default();
    data.business_scenario = "Invoice Processing - Finance".into();
    data.process.business_challenge = "Invoices sit in inboxes for days".into();
    serde_json::to_value(data.to_analysis_request()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_session(app: &Router) -> String {
    let (status, body) = send(app, post_json("/api/v1/cx-analysis/create", &create_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "processing");
    body["session_id"].as_str().unwrap().to_string()
}

async fn wait_complete(app: &Router, id: &str) -> Value {
    for _ in 0..200 {
        let (status, body) = send(app, get(&format!("/api/v1/cx-analysis/status/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == "complete" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("analysis {} did not complete", id);
}

#[tokio::test]
async fn test_health_and_agent_info() {
    let app = app(test_config());
    let (status, body) = send(&app, get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["agent_info"]["sub_agents_count"], 6);

    let (status, body) = send(&app, get("/api/v1/agent-info")).await;
    assert_eq!(status, StatusCode::OK);
    let subs = body["sub_agents"].as_array().unwrap();
    assert_eq!(subs.len(), 6);
    assert_eq!(subs[0]["technical_name"], "customer_journey_analyst");
}

#[tokio::test]
async fn test_scenarios_carry_labels() {
    let app = app(test_config());
    let (status, body) = send(&app, get("/api/v1/scenarios")).await;
    assert_eq!(status, StatusCode::OK);
    let first = &body["scenarios"][0];
    assert_eq!(first["label"], "E-commerce Customer Journey - Retail");
    assert_eq!(body["goals"][1], "Calculate ROI and payback period");
    assert_eq!(body["data_sources"].as_array().unwrap().len(), 4);
    assert_eq!(body["cx_tools"].as_array().unwrap().len(), 8);
    assert_eq!(body["books"][2]["title"], "Treasure Island");
    assert_eq!(body["story_settings"][0], "Space Station");
}

#[tokio::test]
async fn test_full_analysis_and_report_download() {
    let app = app(test_config());
    let id = create_session(&app).await;
    let status = wait_complete(&app, &id).await;
    assert_eq!(status["progress_percentage"], 100);
    assert_eq!(status["completed_agents"].as_array().unwrap().len(), 6);
    assert!(status["result"]["project_id"].as_str().unwrap().starts_with("AUTO-"));

    let resp = app
        .clone()
        .oneshot(get(&format!("/api/v1/cx-analysis/report/{}", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"AUTO-"));
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("AUTOMATION BUSINESS CASE"));
}

#[tokio::test]
async fn test_refine_after_completion() {
    let app = app(test_config());
    let id = create_session(&app).await;
    wait_complete(&app, &id).await;

    let uri = format!("/api/v1/cx-analysis/refine/{}", id);
    let (status, body) = send(&app, post_json(&uri, &json!({ "refinement_input": "keep the budget tight" }))).await;
    assert_eq!(status, StatusCode::OK);
    let refined = &body["refined_analysis"];
    assert!(refined["deliverables"]["estimated_roi"].as_str().unwrap().starts_with("385%"));

    let (_, status_body) = send(&app, get(&format!("/api/v1/cx-analysis/status/{}", id))).await;
    assert!(status_body["refined_result"].is_object());
    assert_ne!(status_body["result"], status_body["refined_result"]);
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let app = app(test_config());
    let (status, body) = send(&app, get(&format!("/api/v1/cx-analysis/status/{}", uuid::Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains("not found"));

    let (status, _) = send(&app, get("/api/v1/cx-analysis/status/not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_refine_before_result_is_400() {
    let app = stalled_app(test_config());
    let id = create_session(&app).await;
    let uri = format!("/api/v1/cx-analysis/refine/{}", id);
    let (status, _) = send(&app, post_json(&uri, &json!({ "refinement_input": "budget" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get(&format!("/api/v1/cx-analysis/report/{}", id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_refinement_is_422() {
    let app = app(test_config());
    let id = create_session(&app).await;
    wait_complete(&app, &id).await;
    let uri = format!("/api/v1/cx-analysis/refine/{}", id);
    let (status, _) = send(&app, post_json(&uri, &json!({ "refinement_input": "   " }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_invalid_create_body_is_422() {
    let app = app(test_config());
    let (status, body) = send(&app, post_json("/api/v1/cx-analysis/create", &json!({ "monthly_volume": "lots" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());

    let mut zero = create_body();
    zero["monthly_volume"] = json!(0);
    let (status, _) = send(&app, post_json("/api/v1/cx-analysis/create", &zero)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_too_many_methods_or_personas_is_422() {
    let app = app(test_config());
    let mut body = create_body();
    body["cx_tools"] = json!(["Customer Surveys", "Analytics Review", "Process Mapping", "A/B Testing", "User Interviews"]);
    let (status, detail) = send(&app, post_json("/api/v1/cx-analysis/create", &body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(detail["detail"].as_str().unwrap().contains("analysis methods"));

    let mut body = create_body();
    body["personas"] = json!((1..=5)
        .map(|i| json!({ "id": format!("p{}", i), "name": format!("Persona {}", i), "description": "" }))
        .collect::<Vec<_>>());
    let (status, _) = send(&app, post_json("/api/v1/cx-analysis/create", &body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, metrics) = send(&app, get("/metrics")).await;
    assert_eq!(metrics["analyses_started"], 0);
    assert_eq!(metrics["sessions_processing"], 0);
}

#[tokio::test]
async fn test_cancel_removes_session() {
    let app = stalled_app(test_config());
    let id = create_session(&app).await;
    let req = Request::delete(format!("/api/v1/cx-analysis/{}", id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, _) = send(&app, get(&format!("/api/v1/cx-analysis/status/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bearer_token_guards_api_but_not_health() {
    let mut config = test_config();
    config.runtime.bearer_token = Some("s3cret".into());
    let app = app(config);

    let (status, _) = send(&app, get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/api/v1/scenarios")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["detail"].is_string());

    let req = Request::get("/api/v1/scenarios")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_count_requests() {
    let app = app(test_config());
    send(&app, get("/api/v1/health")).await;
    send(&app, get(&format!("/api/v1/cx-analysis/status/{}", uuid::Uuid::new_v4()))).await;
    let (status, body) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_requests"], 2);
    assert_eq!(body["errors_total"], 1);
}
