//! Polling client for the analysis API.

use crate::config::Config;
use crate::error::{CxLabError, Result};
use crate::http::CreateAnalysisResponse;
use crate::project::AnalysisRequest;
use crate::report::Report;
use crate::sessions::{AnalysisStatus, SessionStatus};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

const FAILURE_PREFIX: &str = "Automation analysis failed: ";
// `CxLabError::Validation` adds this back when displayed
const VALIDATION_PREFIX: &str = "Validation error: ";

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Deserialize)]
struct RefineResponse {
    refined_analysis: Report,
}

pub struct AnalysisClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl AnalysisClient {
    pub fn new(
        base_url: &str,
        bearer_token: Option<String>,
        poll_interval: Duration,
        max_poll_attempts: u32,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| CxLabError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token,
            poll_interval,
            max_poll_attempts: max_poll_attempts.max(1),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.client.base_url,
            config.runtime.bearer_token.clone(),
            Duration::from_millis(config.client.poll_interval_ms),
            config.client.max_poll_attempts,
            Duration::from_millis(config.client.request_timeout_ms),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub async fn health(&self) -> Result<Value> {
        let resp = self.authorized(self.http.get(self.url("/api/v1/health"))).send().await?;
        json_body(resp, None).await
    }

    pub async fn scenarios(&self) -> Result<Value> {
        let resp = self
            .authorized(self.http.get(self.url("/api/v1/scenarios")))
            .send()
            .await?;
        json_body(resp, None).await
    }

    pub async fn create(&self, request: &AnalysisRequest) -> Result<CreateAnalysisResponse> {
        let resp = self
            .authorized(self.http.post(self.url("/api/v1/cx-analysis/create")))
            .json(request)
            .send()
            .await?;
        json_body(resp, None).await
    }

    pub async fn status(&self, session_id: &str) -> Result<AnalysisStatus> {
        let path = format!("/api/v1/cx-analysis/status/{}", session_id);
        let resp = self.authorized(self.http.get(self.url(&path))).send().await?;
        json_body(resp, Some(session_id)).await
    }

    /// Poll until the session finishes or the attempt budget runs out.
    /// `on_progress` sees every snapshot, including the last.
    pub async fn wait_for_completion<F>(
        &self,
        session_id: &str,
        mut on_progress: F,
    ) -> Result<AnalysisStatus>
    where
        F: FnMut(&AnalysisStatus),
    {
        for attempt in 1..=self.max_poll_attempts {
            let status = self.status(session_id).await?;
            debug!(
                session_id,
                attempt,
                progress = status.progress_percentage,
                "polled analysis status"
            );
            on_progress(&status);

            match status.status {
                SessionStatus::Complete => return Ok(status),
                SessionStatus::Error => {
                    let message = status
                        .error
                        .as_deref()
                        .unwrap_or("unknown error")
                        .trim_start_matches(FAILURE_PREFIX)
                        .to_string();
                    return Err(CxLabError::Analysis { message });
                }
                SessionStatus::Cancelled => {
                    return Err(CxLabError::Cancelled {
                        session_id: session_id.to_string(),
                    });
                }
                SessionStatus::Processing => {}
            }

            if attempt < self.max_poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Err(CxLabError::Timeout {
            operation: format!("analysis {}", session_id),
            timeout_ms: self.poll_interval.as_millis() as u64 * u64::from(self.max_poll_attempts),
        })
    }

    pub async fn refine(&self, session_id: &str, input: &str) -> Result<Report> {
        let path = format!("/api/v1/cx-analysis/refine/{}", session_id);
        let resp = self
            .authorized(self.http.post(self.url(&path)))
            .json(&json!({ "refinement_input": input }))
            .send()
            .await?;
        let body: RefineResponse = json_body(resp, Some(session_id)).await?;
        Ok(body.refined_analysis)
    }

    pub async fn report_text(&self, session_id: &str) -> Result<String> {
        let path = format!("/api/v1/cx-analysis/report/{}", session_id);
        let resp = self.authorized(self.http.get(self.url(&path))).send().await?;
        let resp = check_status(resp, Some(session_id)).await?;
        Ok(resp.text().await?)
    }

    pub async fn cancel(&self, session_id: &str) -> Result<AnalysisStatus> {
        let path = format!("/api/v1/cx-analysis/{}", session_id);
        let resp = self.authorized(self.http.delete(self.url(&path))).send().await?;
        json_body(resp, Some(session_id)).await
    }
}

async fn json_body<T: DeserializeOwned>(resp: Response, session_id: Option<&str>) -> Result<T> {
    let resp = check_status(resp, session_id).await?;
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Turn a non-2xx response into the matching error using its `detail` field
async fn check_status(resp: Response, session_id: Option<&str>) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.detail)
        .unwrap_or(text);

    Err(match status {
        StatusCode::NOT_FOUND => match session_id {
            Some(id) => CxLabError::session_not_found(id),
            None => CxLabError::Transport {
                message: format!("API error {}: {}", status, detail),
            },
        },
        StatusCode::BAD_REQUEST => CxLabError::NoResult,
        StatusCode::UNPROCESSABLE_ENTITY => CxLabError::Validation {
            message: detail.trim_start_matches(VALIDATION_PREFIX).to_string(),
        },
        StatusCode::UNAUTHORIZED => CxLabError::Unauthorized,
        _ => CxLabError::Transport {
            message: format!("API error {}: {}", status, detail),
        },
    })
}
