//! In-memory analysis sessions.
//!
//! A bounded LRU keyed by session id. Sessions older than the configured TTL
//! are dropped on access; when the store is full the least recently used
//! session is evicted (and its pipeline aborted).

use crate::config::Config;
use crate::error::{CxLabError, Result};
use crate::pipeline::AGENTS;
use crate::project::AnalysisRequest;
use crate::report::{self, Report};
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use uuid::Uuid;

// ten years
const MAX_TTL_SEC: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Processing,
    Complete,
    Error,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        self != SessionStatus::Processing
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisSession {
    pub id: Uuid,
    pub status: SessionStatus,
    pub request: AnalysisRequest,
    pub current_agent_index: usize,
    pub completed_agents: Vec<String>,
    pub result: Option<Report>,
    pub refined_result: Option<Report>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub processing_time_seconds: Option<f64>,
    task: Option<AbortHandle>,
}

impl AnalysisSession {
    fn new(request: AnalysisRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: SessionStatus::Processing,
            request,
            current_agent_index: 0,
            completed_agents: Vec::new(),
            result: None,
            refined_result: None,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
            processing_time_seconds: None,
            task: None,
        }
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn finish(&mut self, status: SessionStatus) {
        let now = Utc::now();
        self.status = status;
        self.finished_at = Some(now);
        self.processing_time_seconds =
            Some((now - self.started_at).num_milliseconds() as f64 / 1000.0);
        self.task = None;
    }
}

/// Body of `GET /api/v1/cx-analysis/status/:id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStatus {
    pub session_id: String,
    pub status: SessionStatus,
    pub completed_agents: Vec<String>,
    pub current_agent: Option<String>,
    pub progress_percentage: u32,
    pub total_agents: usize,
    pub estimated_completion: String,
    pub result: Option<Report>,
    #[serde(default)]
    pub refined_result: Option<Report>,
    pub error: Option<String>,
    #[serde(default)]
    pub processing_time_seconds: Option<f64>,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<LruCache<Uuid, AnalysisSession>>>,
    ttl: Duration,
    seconds_per_agent: u64,
}

impl SessionStore {
    pub fn new(capacity: usize, ttl_sec: u64, seconds_per_agent: u64) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Arc::new(Mutex::new(LruCache::new(capacity))),
            ttl: Duration::seconds(ttl_sec.min(MAX_TTL_SEC) as i64),
            seconds_per_agent,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.sessions.capacity,
            config.sessions.ttl_sec,
            config.pipeline.seconds_per_agent,
        )
    }

    /// Open a `processing` session for `request` and return its id.
    pub async fn create(&self, request: AnalysisRequest) -> Uuid {
        let session = AnalysisSession::new(request);
        let id = session.id;
        let mut sessions = self.sessions.lock().await;
        if let Some((evicted_id, mut evicted)) = sessions.push(id, session)
            && evicted_id != id
        {
            tracing::warn!(session_id = %evicted_id, "session store full, evicting oldest session");
            evicted.abort_task();
        }
        id
    }

    /// Remember the task running this session's pipeline so it can be aborted.
    pub async fn attach_task(&self, id: Uuid, task: AbortHandle) -> Result<()> {
        self.update(id, |s| {
            if s.status.is_terminal() {
                task.abort();
            } else {
                s.task = Some(task);
            }
        })
        .await
    }

    pub async fn get(&self, id: Uuid) -> Result<AnalysisSession> {
        let mut sessions = self.sessions.lock().await;
        self.live_session(&mut sessions, id).cloned()
    }

    pub async fn status(&self, id: Uuid) -> Result<AnalysisStatus> {
        let session = self.get(id).await?;
        Ok(self.snapshot(&session))
    }

    /// Mutate a live session in place
    pub async fn update<F>(&self, id: Uuid, f: F) -> Result<()>
    where
        F: FnOnce(&mut AnalysisSession),
    {
        let mut sessions = self.sessions.lock().await;
        let session = self.live_session(&mut sessions, id)?;
        f(session);
        Ok(())
    }

    pub async fn mark_stage_started(&self, id: Uuid, index: usize) -> Result<()> {
        self.update_processing(id, |s| s.current_agent_index = index)
            .await
    }

    pub async fn mark_stage_complete(&self, id: Uuid, index: usize, agent: &str) -> Result<()> {
        self.update_processing(id, |s| {
            if !s.completed_agents.iter().any(|a| a == agent) {
                s.completed_agents.push(agent.to_string());
            }
            s.current_agent_index = index + 1;
        })
        .await
    }

    pub async fn mark_complete(&self, id: Uuid, mut report: Report) -> Result<()> {
        self.update_processing(id, |s| {
            s.finish(SessionStatus::Complete);
            report.processing_time_seconds = s.processing_time_seconds.unwrap_or_default();
            s.current_agent_index = AGENTS.len();
            s.result = Some(report);
        })
        .await
    }

    pub async fn mark_failed(&self, id: Uuid, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.update_processing(id, |s| {
            s.finish(SessionStatus::Error);
            s.error = Some(message);
        })
        .await
    }

    /// Apply refinement rules to a finished session's result and keep the copy.
    pub async fn refine(&self, id: Uuid, input: &str) -> Result<Report> {
        let mut sessions = self.sessions.lock().await;
        let session = self.live_session(&mut sessions, id)?;
        let original = session.result.as_ref().ok_or(CxLabError::NoResult)?;
        if input.trim().is_empty() {
            return Err(CxLabError::validation("refinement_input cannot be empty"));
        }
        let refined = report::refine_report(original, input);
        session.refined_result = Some(refined.clone());
        Ok(refined)
    }

    /// Abort a running pipeline and drop the session.
    pub async fn cancel(&self, id: Uuid) -> Result<AnalysisStatus> {
        let mut sessions = self.sessions.lock().await;
        self.live_session(&mut sessions, id)?;
        let mut session = sessions
            .pop(&id)
            .ok_or_else(|| CxLabError::session_not_found(id.to_string()))?;
        if session.status == SessionStatus::Processing {
            session.abort_task();
            session.finish(SessionStatus::Cancelled);
            tracing::info!(session_id = %id, "analysis cancelled");
        }
        Ok(self.snapshot(&session))
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn count_by_status(&self, status: SessionStatus) -> usize {
        self.sessions
            .lock()
            .await
            .iter()
            .filter(|(_, s)| s.status == status)
            .count()
    }

    /// Drop every expired session; returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, s)| self.is_expired(s))
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            if let Some(mut session) = sessions.pop(id) {
                session.abort_task();
            }
        }
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "purged expired sessions");
        }
        expired.len()
    }

    pub fn snapshot(&self, session: &AnalysisSession) -> AnalysisStatus {
        let total = AGENTS.len();
        let done = session.completed_agents.len().min(total);
        let (current_agent, estimated_completion) = if session.status == SessionStatus::Processing
        {
            match AGENTS.get(session.current_agent_index) {
                Some(agent) => (
                    Some(agent.technical_name.to_string()),
                    format!(
                        "{} seconds remaining",
                        (total - done) as u64 * self.seconds_per_agent
                    ),
                ),
                None => (None, "Finalizing analysis...".to_string()),
            }
        } else {
            (None, String::new())
        };

        AnalysisStatus {
            session_id: session.id.to_string(),
            status: session.status,
            completed_agents: session.completed_agents.clone(),
            current_agent,
            progress_percentage: (done * 100 / total) as u32,
            total_agents: total,
            estimated_completion,
            result: session.result.clone(),
            refined_result: session.refined_result.clone(),
            error: session.error.clone(),
            processing_time_seconds: session.processing_time_seconds,
        }
    }

    async fn update_processing<F>(&self, id: Uuid, f: F) -> Result<()>
    where
        F: FnOnce(&mut AnalysisSession),
    {
        let mut sessions = self.sessions.lock().await;
        let session = self.live_session(&mut sessions, id)?;
        match session.status {
            SessionStatus::Processing => {
                f(session);
                Ok(())
            }
            SessionStatus::Cancelled => Err(CxLabError::Cancelled {
                session_id: id.to_string(),
            }),
            other => Err(CxLabError::Internal {
                message: format!("session {} already finished as {:?}", id, other),
            }),
        }
    }

    fn is_expired(&self, session: &AnalysisSession) -> bool {
        Utc::now() - session.started_at > self.ttl
    }

    fn live_session<'a>(
        &self,
        sessions: &'a mut LruCache<Uuid, AnalysisSession>,
        id: Uuid,
    ) -> Result<&'a mut AnalysisSession> {
        let expired = match sessions.peek(&id) {
            None => return Err(CxLabError::session_not_found(id.to_string())),
            Some(s) => self.is_expired(s),
        };
        if expired {
            if let Some(mut stale) = sessions.pop(&id) {
                stale.abort_task();
            }
            tracing::debug!(session_id = %id, "session expired");
            return Err(CxLabError::session_not_found(id.to_string()));
        }
        sessions
            .get_mut(&id)
            .ok_or_else(|| CxLabError::session_not_found(id.to_string()))
    }
}

/// Session ids arrive as path strings; anything that is not a UUID is unknown.
pub fn parse_session_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| CxLabError::session_not_found(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectData;

    fn request() -> AnalysisRequest {
        let mut data = ProjectData::default();
        data.business_scenario = "Invoice Processing - Finance".into();
        data.to_analysis_request()
    }

    #[tokio::test]
    async fn test_new_session_status() {
        let store = SessionStore::new(4, 60, 20);
        let id = store.create(request()).await;
        let status = store.status(id).await.unwrap();
        assert_eq!(status.status, SessionStatus::Processing);
        assert_eq!(status.progress_percentage, 0);
        assert_eq!(status.total_agents, 6);
        assert_eq!(status.current_agent.as_deref(), Some("customer_journey_analyst"));
        assert_eq!(status.estimated_completion, "120 seconds remaining");
    }

    #[tokio::test]
    async fn test_progress_and_finalizing() {
        let store = SessionStore::new(4, 60, 20);
        let id = store.create(request()).await;
        for (i, agent) in AGENTS.iter().enumerate().take(4) {
            store.mark_stage_started(id, i).await.unwrap();
            store.mark_stage_complete(id, i, agent.technical_name).await.unwrap();
        }
        let status = store.status(id).await.unwrap();
        assert_eq!(status.progress_percentage, 66);
        assert_eq!(status.current_agent.as_deref(), Some("implementation_strategist"));
        assert_eq!(status.estimated_completion, "40 seconds remaining");

        for (i, agent) in AGENTS.iter().enumerate().skip(4) {
            store.mark_stage_complete(id, i, agent.technical_name).await.unwrap();
        }
        let status = store.status(id).await.unwrap();
        assert_eq!(status.progress_percentage, 100);
        assert!(status.current_agent.is_none());
        assert_eq!(status.estimated_completion, "Finalizing analysis...");
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids() {
        let store = SessionStore::new(4, 60, 20);
        let err = store.status(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, CxLabError::NotFound { .. }));
        assert!(parse_session_id("not-a-uuid").is_err());
    }

    #[tokio::test]
    async fn test_refine_requires_result() {
        let store = SessionStore::new(4, 60, 20);
        let id = store.create(request()).await;
        assert!(matches!(
            store.refine(id, "budget").await,
            Err(CxLabError::NoResult)
        ));

        let report = report::compile_business_case(&request(), &id.to_string(), "");
        store.mark_complete(id, report).await.unwrap();
        assert!(matches!(
            store.refine(id, "  ").await,
            Err(CxLabError::Validation { .. })
        ));
        let refined = store.refine(id, "budget").await.unwrap();
        let status = store.status(id).await.unwrap();
        assert_eq!(status.status, SessionStatus::Complete);
        assert_eq!(status.refined_result, Some(refined));
        assert!(status.result.unwrap().refinement.is_none());
    }

    #[tokio::test]
    async fn test_lru_evicts_oldest() {
        let store = SessionStore::new(2, 60, 20);
        let first = store.create(request()).await;
        let second = store.create(request()).await;
        store.status(first).await.unwrap();
        let third = store.create(request()).await;
        assert_eq!(store.len().await, 2);
        assert!(store.status(second).await.is_err());
        assert!(store.status(first).await.is_ok());
        assert!(store.status(third).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_dropped() {
        let store = SessionStore::new(4, 60, 20);
        let id = store.create(request()).await;
        store
            .update(id, |s| s.started_at = Utc::now() - Duration::seconds(120))
            .await
            .unwrap();
        assert!(store.status(id).await.is_err());
        assert!(store.is_empty().await);

        let other = store.create(request()).await;
        store
            .update(other, |s| s.started_at = Utc::now() - Duration::seconds(120))
            .await
            .unwrap();
        assert_eq!(store.purge_expired().await, 1);
    }

    #[tokio::test]
    async fn test_task_attached_after_finish_is_aborted() {
        let store = SessionStore::new(4, 60, 20);
        let id = store.create(request()).await;
        store.mark_failed(id, "Automation analysis failed: boom").await.unwrap();
        assert!(SessionStatus::Error.is_terminal());
        assert!(!SessionStatus::Processing.is_terminal());

        let task = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        });
        store.attach_task(id, task.abort_handle()).await.unwrap();
        assert!(task.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_aborts_task_and_drops_session() {
        let store = SessionStore::new(4, 60, 20);
        let id = store.create(request()).await;
        let task = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        });
        store.attach_task(id, task.abort_handle()).await.unwrap();

        let status = store.cancel(id).await.unwrap();
        assert_eq!(status.status, SessionStatus::Cancelled);
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(store.status(id).await.is_err());
        assert!(store.cancel(id).await.is_err());
    }

    #[tokio::test]
    async fn test_finished_session_rejects_stage_updates() {
        let store = SessionStore::new(4, 60, 20);
        let id = store.create(request()).await;
        store.mark_failed(id, "Automation analysis failed: boom").await.unwrap();
        assert!(store.mark_stage_started(id, 1).await.is_err());
        let status = store.status(id).await.unwrap();
        assert_eq!(status.status, SessionStatus::Error);
        assert_eq!(status.estimated_completion, "");
        assert_eq!(status.error.as_deref(), Some("Automation analysis failed: boom"));
    }
}
