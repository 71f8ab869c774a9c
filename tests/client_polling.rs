//! Polling client against a live server on an ephemeral port.

use async_trait::async_trait;
use axum::Router;
use cx_lab::client::AnalysisClient;
use cx_lab::config::Config;
use cx_lab::error::{CxLabError, Result};
use cx_lab::http::{HttpState, router};
use cx_lab::pipeline::{AGENTS, AgentInfo, AnalysisStage, Pipeline, StageContext};
use cx_lab::project::ProjectData;
use cx_lab::sessions::{SessionStatus, SessionStore};
use std::sync::Arc;
use std::time::Duration;

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

struct Broken;

#[async_trait]
impl AnalysisStage for Broken {
    fn agent(&self) -> &'static AgentInfo {
        &AGENTS[0]
    }

    async fn run(&self, _ctx: &StageContext) -> Result<String> {
        Err(CxLabError::validation("no process owner"))
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.pipeline.stage_delay_ms = 0;
    config.server.allowed_origins = Vec::new();
    config
}

fn app_with(config: Config, stages: Option<Vec<Arc<dyn AnalysisStage>>>) -> Router {
    let store = SessionStore::from_config(&config);
    let pipeline = match stages {
        Some(stages) => Pipeline::with_stages(store, &config.pipeline, stages),
        None => Pipeline::new(store, &config.pipeline),
    };
    router(HttpState::with_pipeline(config, pipeline))
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: &str, token: Option<&str>, attempts: u32) -> AnalysisClient {
    AnalysisClient::new(
        base_url,
        token.map(str::to_string),
        Duration::from_millis(10),
        attempts,
        Duration::from_secs(5),
    )
    .unwrap()
}

fn project() -> ProjectData {
    let mut data = ProjectData::default();
    data.business_scenario = "Invoice Processing - Finance".into();
    data
}

#[tokio::test]
async fn test_wait_for_completion_returns_report() {
    let base = serve(app_with(test_config(), None)).await;
    let client = client(&base, None, 500);

    let created = client.create(&project().to_analysis_request()).await.unwrap();
    assert_eq!(created.status, SessionStatus::Processing);

    let mut polls = 0;
    let status = client
        .wait_for_completion(&created.session_id, |_| polls += 1)
        .await
        .unwrap();
    assert!(polls >= 1);
    assert_eq!(status.status, SessionStatus::Complete);
    assert!(status.result.is_some());

    let text = client.report_text(&created.session_id).await.unwrap();
    assert!(text.contains("AUTOMATION BUSINESS CASE"));

    let refined = client
        .refine(&created.session_id, "we need a faster timeline")
        .await
        .unwrap();
    assert!(refined.refinement.is_some());
}

#[tokio::test]
async fn test_polling_gives_up_after_attempt_budget() {
    let base = serve(app_with(test_config(), Some(vec![Arc::new(Stalled)]))).await;
    let client = client(&base, None, 3);

    let created = client.create(&project().to_analysis_request()).await.unwrap();
    let mut polls = 0;
    let err = client
        .wait_for_completion(&created.session_id, |_| polls += 1)
        .await
        .unwrap_err();
    assert_eq!(polls, 3);
    assert!(matches!(err, CxLabError::Timeout { timeout_ms: 30, .. }));
}

#[tokio::test]
async fn test_pipeline_failure_surfaces_once_prefixed() {
    let base = serve(app_with(test_config(), Some(vec![Arc::new(Broken)]))).await;
    let client = client(&base, None, 500);

    let created = client.create(&project().to_analysis_request()).await.unwrap();
    let err = client
        .wait_for_completion(&created.session_id, |_| {})
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Automation analysis failed: "));
    assert_eq!(message.matches("Automation analysis failed").count(), 1);
    assert!(message.contains("no process owner"));
}

#[tokio::test]
async fn test_api_errors_map_to_variants() {
    let mut config = test_config();
    config.runtime.bearer_token = Some("letmein".into());
    let base = serve(app_with(config, Some(vec![Arc::new(Stalled)]))).await;

    let anonymous = client(&base, None, 1);
    assert!(anonymous.health().await.is_ok());
    assert!(matches!(
        anonymous.scenarios().await,
        Err(CxLabError::Unauthorized)
    ));

    let client = client(&base, Some("letmein"), 1);
    let missing = uuid::Uuid::new_v4().to_string();
    assert!(matches!(
        client.status(&missing).await,
        Err(CxLabError::NotFound { .. })
    ));

    let created = client.create(&project().to_analysis_request()).await.unwrap();
    assert!(matches!(
        client.refine(&created.session_id, "budget").await,
        Err(CxLabError::NoResult)
    ));

    let mut bad = project().to_analysis_request();
    bad.monthly_volume = 0;
    let err = client.create(&bad).await.unwrap_err();
    assert!(matches!(err, CxLabError::Validation { .. }));
    let shown = err.to_string();
    assert_eq!(shown.matches("Validation error:").count(), 1, "{}", shown);
    assert!(shown.contains("monthly_volume"));

    let cancelled = client.cancel(&created.session_id).await.unwrap();
    assert_eq!(cancelled.status, SessionStatus::Cancelled);
}
