//! HTTP API for the analysis service
//!
//! Axum router with optional bearer authentication (health stays open),
//! request metrics and CORS. Errors leave as `{"detail": "..."}`.

use crate::catalog::{
    AUDIENCES, BOOKS, CX_TOOLS, DATA_SOURCES, GOALS, SCENARIOS, STORY_SETTINGS, STORY_THEMES,
    TIME_PERIODS,
};
use crate::config::Config;
use crate::error::{CxLabError, Result};
use crate::pipeline::{PIPELINE_NAME, Pipeline};
use crate::project::AnalysisRequest;
use crate::report::{render_text, report_filename};
use crate::sessions::{AnalysisStatus, SessionStatus, SessionStore, parse_session_id};
use axum::{
    Json, Router,
    body::Body,
    extract::{MatchedPath, Path, State, rejection::JsonRejection},
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::{cmp::Ordering, collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
};

pub const HEALTH_PATH: &str = "/api/v1/health";

const LATENCY_WINDOW: usize = 256;
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared state for HTTP server
#[derive(Clone)]
pub struct HttpState {
    pub config: Arc<Config>,
    pub store: SessionStore,
    pub pipeline: Pipeline,
    pub metrics: Arc<Mutex<HttpMetrics>>,
}

impl HttpState {
    pub fn new(config: Config) -> Self {
        let store = SessionStore::from_config(&config);
        let pipeline = Pipeline::new(store.clone(), &config.pipeline);
        Self::with_pipeline(config, pipeline)
    }

    /// Use a prebuilt pipeline (and its session store)
    pub fn with_pipeline(config: Config, pipeline: Pipeline) -> Self {
        Self {
            config: Arc::new(config),
            store: pipeline.store().clone(),
            pipeline,
            metrics: Arc::new(Mutex::new(HttpMetrics::new())),
        }
    }
}

/// Metrics for HTTP server
#[derive(Debug, Clone)]
pub struct HttpMetrics {
    pub total_requests: u64,
    pub last_request_unix: u64,
    pub errors_total: u64,
    pub analyses_started: u64,
    pub latencies: Vec<f64>, // ring buffer for p95
    pub routes_count: HashMap<String, u64>,
}

impl HttpMetrics {
    fn new() -> Self {
        Self {
            total_requests: 0,
            last_request_unix: unix_now(),
            errors_total: 0,
            analyses_started: 0,
            latencies: Vec::with_capacity(LATENCY_WINDOW),
            routes_count: HashMap::new(),
        }
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAnalysisResponse {
    pub session_id: String,
    pub status: SessionStatus,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefineRequest {
    #[serde(default)]
    pub refinement_input: String,
}

/// Health check endpoint
pub async fn health_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let active = state.store.count_by_status(SessionStatus::Processing).await;
    let stored = state.store.len().await;
    Json(json!({
        "status": "healthy",
        "service": "cx-lab analysis API",
        "version": env!("CARGO_PKG_VERSION"),
        "agent_info": {
            "available": true,
            "name": PIPELINE_NAME,
            "sub_agents_count": state.pipeline.stages().count(),
        },
        "sessions": {
            "active": active,
            "stored": stored,
        },
        "endpoints": {
            "create_analysis": "/api/v1/cx-analysis/create",
            "analysis_status": "/api/v1/cx-analysis/status/{session_id}",
            "refine_analysis": "/api/v1/cx-analysis/refine/{session_id}",
            "download_report": "/api/v1/cx-analysis/report/{session_id}",
            "scenarios": "/api/v1/scenarios",
        }
    }))
}

pub async fn agent_info_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let sub_agents: Vec<Value> = state
        .pipeline
        .stages()
        .enumerate()
        .map(|(i, agent)| {
            json!({
                "index": i + 1,
                "name": agent.display_name,
                "technical_name": agent.technical_name,
                "description": agent.description,
                "output_key": agent.output_key,
            })
        })
        .collect();
    Json(json!({
        "agent_name": PIPELINE_NAME,
        "agent_type": "SequentialPipeline",
        "description": "Automation business case analysis pipeline",
        "sub_agents": sub_agents,
    }))
}

pub async fn scenarios_handler() -> impl IntoResponse {
    let scenarios: Vec<Value> = SCENARIOS
        .iter()
        .map(|s| {
            let mut v = json!(s);
            v["label"] = json!(s.label());
            v
        })
        .collect();
    Json(json!({
        "scenarios": scenarios,
        "audiences": AUDIENCES,
        "goals": GOALS,
        "data_sources": DATA_SOURCES,
        "cx_tools": CX_TOOLS,
        "books": BOOKS,
        "story_settings": STORY_SETTINGS,
        "time_periods": TIME_PERIODS,
        "story_themes": STORY_THEMES,
    }))
}

pub async fn create_analysis_handler(
    State(state): State<HttpState>,
    payload: std::result::Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<CreateAnalysisResponse>> {
    let Json(request) = payload.map_err(|e| CxLabError::validation(e.body_text()))?;
    let id = state.pipeline.start(request).await?;
    state.metrics.lock().await.analyses_started += 1;

    Ok(Json(CreateAnalysisResponse {
        session_id: id.to_string(),
        status: SessionStatus::Processing,
        message: format!(
            "Automation business case analysis started. {} specialized agents are collaborating on your analysis.",
            state.pipeline.stages().count()
        ),
    }))
}

pub async fn status_handler(
    State(state): State<HttpState>,
    Path(session_id): Path<String>,
) -> Result<Json<AnalysisStatus>> {
    let id = parse_session_id(&session_id)?;
    Ok(Json(state.store.status(id).await?))
}

pub async fn refine_handler(
    State(state): State<HttpState>,
    Path(session_id): Path<String>,
    payload: std::result::Result<Json<RefineRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let id = parse_session_id(&session_id)?;
    let Json(body) = payload.map_err(|e| CxLabError::validation(e.body_text()))?;
    let refined = state.store.refine(id, &body.refinement_input).await?;
    Ok(Json(json!({
        "session_id": id.to_string(),
        "refined_analysis": refined,
    })))
}

/// Refined report when there is one, else the original, as a text download
pub async fn report_handler(
    State(state): State<HttpState>,
    Path(session_id): Path<String>,
) -> Result<Response> {
    let id = parse_session_id(&session_id)?;
    let session = state.store.get(id).await?;
    let report = session
        .refined_result
        .as_ref()
        .or(session.result.as_ref())
        .ok_or(CxLabError::NoResult)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report_filename(report)),
            ),
        ],
        render_text(report),
    )
        .into_response())
}

pub async fn cancel_handler(
    State(state): State<HttpState>,
    Path(session_id): Path<String>,
) -> Result<Json<AnalysisStatus>> {
    let id = parse_session_id(&session_id)?;
    Ok(Json(state.store.cancel(id).await?))
}

/// Metrics endpoint
pub async fn metrics_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let metrics = state.metrics.lock().await.clone();
    let processing = state.store.count_by_status(SessionStatus::Processing).await;
    let complete = state.store.count_by_status(SessionStatus::Complete).await;
    let failed = state.store.count_by_status(SessionStatus::Error).await;

    let (avg_latency_ms, p95_latency_ms) = if metrics.latencies.is_empty() {
        (None, None)
    } else {
        let sum: f64 = metrics.latencies.iter().sum();
        let avg = sum / metrics.latencies.len() as f64;
        let mut sorted = metrics.latencies.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let p95_idx = ((sorted.len() as f64 * 0.95) as usize).min(sorted.len() - 1);
        (Some(avg), sorted.get(p95_idx).copied())
    };

    let mut routes: Vec<_> = metrics.routes_count.iter().collect();
    routes.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let routes_top_5: Vec<_> = routes
        .into_iter()
        .take(5)
        .map(|(k, v)| json!({ "route": k, "count": v }))
        .collect();

    Json(json!({
        "metrics_version": "1",
        "total_requests": metrics.total_requests,
        "last_request_unix": metrics.last_request_unix,
        "errors_total": metrics.errors_total,
        "analyses_started": metrics.analyses_started,
        "sessions_processing": processing,
        "sessions_complete": complete,
        "sessions_error": failed,
        "avg_latency_ms": avg_latency_ms,
        "p95_latency_ms": p95_latency_ms,
        "routes_top_5": routes_top_5,
    }))
}

async fn track_metrics(
    State(metrics): State<Arc<Mutex<HttpMetrics>>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = std::time::Instant::now();
    let resp = next.run(req).await;
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    let mut m = metrics.lock().await;
    m.latencies.push(latency_ms);
    if m.latencies.len() > LATENCY_WINDOW {
        m.latencies.remove(0);
    }
    if !resp.status().is_success() {
        m.errors_total = m.errors_total.saturating_add(1);
    }
    m.total_requests = m.total_requests.saturating_add(1);
    m.last_request_unix = unix_now();
    *m.routes_count.entry(route).or_insert(0) += 1;
    resp
}

async fn require_bearer(
    State(token): State<Option<String>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = token else {
        return next.run(req).await;
    };
    // Health and CORS preflight stay open
    if req.uri().path() == HEALTH_PATH || req.method() == Method::OPTIONS {
        return next.run(req).await;
    }
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|t| t == expected);
    if !authorized {
        return CxLabError::Unauthorized.into_response();
    }
    next.run(req).await
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

pub fn router(state: HttpState) -> Router {
    let bearer = state.config.runtime.bearer_token.clone();
    let request_timeout = Duration::from_millis(state.config.server.request_timeout_ms);
    let cors = cors_layer(&state.config.server.allowed_origins);

    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .route("/api/v1/agent-info", get(agent_info_handler))
        .route("/api/v1/scenarios", get(scenarios_handler))
        .route("/api/v1/cx-analysis/create", post(create_analysis_handler))
        .route("/api/v1/cx-analysis/status/:session_id", get(status_handler))
        .route("/api/v1/cx-analysis/refine/:session_id", post(refine_handler))
        .route("/api/v1/cx-analysis/report/:session_id", get(report_handler))
        .route("/api/v1/cx-analysis/:session_id", delete(cancel_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn_with_state(bearer, require_bearer))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_metrics,
        ))
        .layer(cors)
        .with_state(state)
}

/// Periodically drop sessions past their TTL
pub fn spawn_session_sweeper(store: SessionStore) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = store.purge_expired().await;
            if purged > 0 {
                tracing::info!("Purged {} expired analysis sessions", purged);
            }
        }
    })
}

/// Start the HTTP server
pub async fn start_http_server(config: Config) -> Result<()> {
    let bind = config.server.bind;
    if config.runtime.bearer_token.is_none() {
        tracing::warn!("CXLAB_BEARER_TOKEN not set; API is open to any caller that can reach {}", bind);
    }

    let state = HttpState::new(config);
    let sweeper = spawn_session_sweeper(state.store.clone());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP listener: {}", e))?;

    tracing::info!("Starting HTTP server on {}", bind);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e));
    sweeper.abort();
    served?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
