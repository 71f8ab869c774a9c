//! Sequential six-stage analysis pipeline.
//!
//! Each stage writes one section of analysis text from the request and the
//! sections before it. Progress is written into the [`SessionStore`] as the
//! stages run; after the last one the financial model compiles the report.

use crate::config::PipelineConfig;
use crate::error::{CxLabError, Result};
use crate::project::AnalysisRequest;
use crate::report::{FinancialProjection, compile_business_case};
use crate::sessions::SessionStore;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub mod stages;

pub const PIPELINE_NAME: &str = "automation_business_case_pipeline";

#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub technical_name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub output_key: &'static str,
}

/// Technical names are what status responses report; display names are for people.
pub static AGENTS: &[AgentInfo] = &[
    AgentInfo {
        technical_name: "customer_journey_analyst",
        display_name: "Process Analysis Specialist",
        description: "Maps the current process and scores automation readiness",
        output_key: "process_analysis",
    },
    AgentInfo {
        technical_name: "data_analytics_specialist",
        display_name: "ROI Calculator",
        description: "Projects savings, implementation cost and payback",
        output_key: "roi_analysis",
    },
    AgentInfo {
        technical_name: "process_improvement_specialist",
        display_name: "Implementation Planner",
        description: "Sequences the rollout into phases with milestones",
        output_key: "implementation_plan",
    },
    AgentInfo {
        technical_name: "solution_designer",
        display_name: "Risk Assessment Specialist",
        description: "Identifies delivery and adoption risks with mitigations",
        output_key: "risk_assessment",
    },
    AgentInfo {
        technical_name: "implementation_strategist",
        display_name: "Technology Integration Specialist",
        description: "Outlines integration architecture and system requirements",
        output_key: "technology_integration",
    },
    AgentInfo {
        technical_name: "success_metrics_specialist",
        display_name: "Business Case Compiler",
        description: "Assembles the executive business case",
        output_key: "business_case",
    },
];

pub fn agent_by_name(technical_name: &str) -> Option<&'static AgentInfo> {
    AGENTS.iter().find(|a| a.technical_name == technical_name)
}

#[derive(Debug, Clone)]
pub struct StageOutput {
    pub agent: &'static str,
    pub heading: &'static str,
    pub text: String,
}

/// What a stage can see: the request, the priced projection and every
/// section written so far.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub session_id: Uuid,
    pub request: AnalysisRequest,
    pub projection: FinancialProjection,
    pub sections: Vec<StageOutput>,
}

impl StageContext {
    pub fn new(session_id: Uuid, request: AnalysisRequest) -> Self {
        let projection = FinancialProjection::from_request(&request);
        Self {
            session_id,
            request,
            projection,
            sections: Vec::new(),
        }
    }

    pub fn section(&self, agent: &str) -> Option<&StageOutput> {
        self.sections.iter().find(|s| s.agent == agent)
    }

    /// All sections joined the way they appear in the compiled report
    pub fn combined(&self) -> String {
        self.sections
            .iter()
            .map(|s| format!("{}: {}", s.heading, s.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[async_trait]
pub trait AnalysisStage: Send + Sync {
    fn agent(&self) -> &'static AgentInfo;

    async fn run(&self, ctx: &StageContext) -> Result<String>;
}

#[derive(Clone)]
pub struct Pipeline {
    stages: Vec<Arc<dyn AnalysisStage>>,
    store: SessionStore,
    stage_delay: Duration,
    stage_timeout: Duration,
}

impl Pipeline {
    pub fn new(store: SessionStore, config: &PipelineConfig) -> Self {
        Self::with_stages(store, config, stages::default_stages())
    }

    pub fn with_stages(
        store: SessionStore,
        config: &PipelineConfig,
        stages: Vec<Arc<dyn AnalysisStage>>,
    ) -> Self {
        Self {
            stages,
            store,
            stage_delay: Duration::from_millis(config.stage_delay_ms),
            stage_timeout: Duration::from_millis(config.stage_timeout_ms),
        }
    }

    pub fn stages(&self) -> impl Iterator<Item = &'static AgentInfo> + '_ {
        self.stages.iter().map(|s| s.agent())
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Open a session for `request` and run the pipeline for it in the background.
    pub async fn start(&self, request: AnalysisRequest) -> Result<Uuid> {
        request.validate()?;
        let id = self.store.create(request.clone()).await;
        self.spawn_attached(id, request).await?;
        tracing::info!(session_id = %id, stages = self.stages.len(), "analysis started");
        Ok(id)
    }

    /// Spawn the run for `id` and hand its abort handle to the store.
    async fn spawn_attached(&self, id: Uuid, request: AnalysisRequest) -> Result<()> {
        let pipeline = self.clone();
        let handle = tokio::spawn(async move { pipeline.run(id, request).await });
        if let Err(e) = self.store.attach_task(id, handle.abort_handle()).await {
            // session evicted before the handle landed; nothing could cancel it later
            handle.abort();
            return Err(e);
        }
        Ok(())
    }

    /// Run every stage for session `id`, recording success or failure in the store.
    pub async fn run(&self, id: Uuid, request: AnalysisRequest) {
        match self.execute(id, request).await {
            Ok(()) => tracing::info!(session_id = %id, "analysis complete"),
            Err(CxLabError::Cancelled { .. }) | Err(CxLabError::NotFound { .. }) => {
                tracing::debug!(session_id = %id, "session gone, stopping pipeline");
            }
            Err(e) => {
                let failure = CxLabError::Analysis {
                    message: e.to_string(),
                };
                tracing::error!(session_id = %id, "{}", failure);
                if let Err(store_err) = self.store.mark_failed(id, failure.to_string()).await {
                    tracing::debug!(session_id = %id, "could not record failure: {}", store_err);
                }
            }
        }
    }

    async fn execute(&self, id: Uuid, request: AnalysisRequest) -> Result<()> {
        let mut ctx = StageContext::new(id, request);

        for (index, stage) in self.stages.iter().enumerate() {
            let agent = stage.agent();
            self.store.mark_stage_started(id, index).await?;
            tracing::debug!(session_id = %id, stage = agent.technical_name, "stage started");

            let text = tokio::time::timeout(self.stage_timeout, stage.run(&ctx))
                .await
                .map_err(|_| CxLabError::Timeout {
                    operation: format!("stage {}", agent.technical_name),
                    timeout_ms: self.stage_timeout.as_millis() as u64,
                })??;

            if !self.stage_delay.is_zero() {
                tokio::time::sleep(self.stage_delay).await;
            }

            ctx.sections.push(StageOutput {
                agent: agent.technical_name,
                heading: agent.display_name,
                text,
            });
            self.store
                .mark_stage_complete(id, index, agent.technical_name)
                .await?;
            tracing::debug!(session_id = %id, stage = agent.technical_name, "stage complete");
        }

        let report = compile_business_case(&ctx.request, &id.to_string(), &ctx.combined());
        self.store.mark_complete(id, report).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectData;
    use crate::sessions::SessionStatus;

    fn request() -> AnalysisRequest {
        let mut data = ProjectData::default();
        data.business_scenario = "Invoice Processing - Finance".into();
        data.process.business_challenge = "Invoices wait days for approval".into();
        data.to_analysis_request()
    }

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            stage_delay_ms: 0,
            stage_timeout_ms: 200,
            seconds_per_agent: 20,
        }
    }

    struct FailingStage;

    #[async_trait]
    impl AnalysisStage for FailingStage {
        fn agent(&self) -> &'static AgentInfo {
            &AGENTS[0]
        }

        async fn run(&self, _ctx: &StageContext) -> Result<String> {
            Err(CxLabError::validation("missing process data"))
        }
    }

    struct SlowStage;

    #[async_trait]
    impl AnalysisStage for SlowStage {
        fn agent(&self) -> &'static AgentInfo {
            &AGENTS[1]
        }

        async fn run(&self, _ctx: &StageContext) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(String::new())
        }
    }

    #[test]
    fn test_agent_lookup_by_technical_name() {
        let agent = agent_by_name("success_metrics_specialist").unwrap();
        assert_eq!(agent.display_name, "Business Case Compiler");
        assert!(agent_by_name("Business Case Compiler").is_none());
    }

    #[tokio::test]
    async fn test_evicted_session_aborts_spawned_run() {
        let store = SessionStore::new(1, 60, 20);
        let pipeline = Pipeline::with_stages(store.clone(), &fast_config(), vec![Arc::new(SlowStage)]);
        let evicted = store.create(request()).await;
        let survivor = store.create(request()).await;

        let err = pipeline.spawn_attached(evicted, request()).await.unwrap_err();
        assert!(matches!(err, CxLabError::NotFound { .. }));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.len().await, 1);
        let status = store.status(survivor).await.unwrap();
        assert_eq!(status.status, SessionStatus::Processing);
        assert!(status.completed_agents.is_empty());
    }

    #[tokio::test]
    async fn test_full_run_completes_session() {
        let store = SessionStore::new(8, 60, 20);
        let pipeline = Pipeline::new(store.clone(), &fast_config());
        let id = store.create(request()).await;
        pipeline.run(id, request()).await;

        let status = store.status(id).await.unwrap();
        assert_eq!(status.status, SessionStatus::Complete);
        assert_eq!(status.progress_percentage, 100);
        let names: Vec<&str> = status.completed_agents.iter().map(String::as_str).collect();
        let expected: Vec<&str> = AGENTS.iter().map(|a| a.technical_name).collect();
        assert_eq!(names, expected);

        let report = status.result.unwrap();
        assert!(report.project_id.starts_with("AUTO-"));
        let insights = report.deliverables.insights.unwrap();
        assert!(insights.contains("Process Analysis Specialist:"));
        assert!(insights.contains("Business Case Compiler:"));
    }

    #[tokio::test]
    async fn test_stage_failure_marks_error() {
        let store = SessionStore::new(8, 60, 20);
        let pipeline = Pipeline::with_stages(
            store.clone(),
            &fast_config(),
            vec![Arc::new(FailingStage)],
        );
        let id = store.create(request()).await;
        pipeline.run(id, request()).await;

        let status = store.status(id).await.unwrap();
        assert_eq!(status.status, SessionStatus::Error);
        let error = status.error.unwrap();
        assert!(error.starts_with("Automation analysis failed: "));
        assert!(error.contains("missing process data"));
        assert!(status.result.is_none());
    }

    #[tokio::test]
    async fn test_stage_timeout_marks_error() {
        let store = SessionStore::new(8, 60, 20);
        let pipeline =
            Pipeline::with_stages(store.clone(), &fast_config(), vec![Arc::new(SlowStage)]);
        let id = store.create(request()).await;
        pipeline.run(id, request()).await;

        let status = store.status(id).await.unwrap();
        assert_eq!(status.status, SessionStatus::Error);
        assert!(status.error.unwrap().contains("timed out after 200ms"));
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_request() {
        let store = SessionStore::new(8, 60, 20);
        let pipeline = Pipeline::new(store.clone(), &fast_config());
        let mut bad = request();
        bad.monthly_volume = 0;
        assert!(matches!(
            pipeline.start(bad).await,
            Err(CxLabError::Validation { .. })
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_cancel_stops_running_pipeline() {
        let store = SessionStore::new(8, 60, 20);
        let pipeline =
            Pipeline::with_stages(store.clone(), &fast_config(), vec![Arc::new(SlowStage)]);
        let id = pipeline.start(request()).await.unwrap();
        let status = store.cancel(id).await.unwrap();
        assert_eq!(status.status, SessionStatus::Cancelled);
        assert!(store.status(id).await.is_err());
    }
}
