//! Report data model shared by the generators, the refinement engine and the API

use crate::catalog::AudienceStyle;
use crate::project::ReportKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod generator;
pub mod refine;
pub mod render;
pub mod roi;
pub mod story;

pub use generator::{generate_report, generate_report_with_id, new_project_id};
pub use refine::refine_report;
pub use render::{render_text, report_filename};
pub use roi::{FinancialProjection, compile_business_case};
pub use story::{STORY_AGENTS, StoryContent, regenerate_story, story_report};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub project_id: String,
    pub kind: ReportKind,
    pub processing_time_seconds: f64,
    pub analysis_complete: bool,
    pub certification: Certification,
    pub deliverables: Deliverables,
    pub analysis_details: AnalysisDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinement: Option<RefinementNote>,
    /// Present on story reports only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<StoryContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub status: String,
    #[serde(default)]
    pub checks: BTreeMap<String, bool>,
}

impl Certification {
    pub fn new(status: &str, checks: &[&str]) -> Self {
        Self {
            status: status.to_string(),
            checks: checks.iter().map(|c| (c.to_string(), true)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deliverables {
    pub executive_summary: String,
    /// Data-source insights (automation) or journey analysis (cx)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<String>,
    /// Automation opportunities or customer pain points
    pub opportunities: Vec<String>,
    pub strategic_recommendations: Vec<String>,
    pub implementation_roadmap: Roadmap,
    pub success_metrics: Vec<SuccessMetric>,
    pub estimated_roi: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payback_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_savings: Option<String>,
    pub risk_assessment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
    pub phase_1: Phase,
    pub phase_2: Phase,
    pub phase_3: Phase,
}

impl Roadmap {
    pub fn phases(&self) -> [&Phase; 3] {
        [&self.phase_1, &self.phase_2, &self.phase_3]
    }

    pub fn phases_mut(&mut self) -> [&mut Phase; 3] {
        [&mut self.phase_1, &mut self.phase_2, &mut self.phase_3]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub title: String,
    pub actions: Vec<String>,
    pub expected_impact: String,
}

impl Phase {
    pub fn new(title: &str, actions: &[&str], expected_impact: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
            expected_impact: expected_impact.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessMetric {
    pub metric: String,
    pub target: String,
    pub timeframe: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement: Option<String>,
}

impl SuccessMetric {
    pub fn new(
        metric: impl Into<String>,
        target: impl Into<String>,
        timeframe: impl Into<String>,
        measurement: Option<&str>,
    ) -> Self {
        Self {
            metric: metric.into(),
            target: target.into(),
            timeframe: timeframe.into(),
            measurement: measurement.map(str::to_string),
        }
    }
}

/// How the report was produced; fields not relevant to a report kind stay empty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDetails {
    pub scenario_analyzed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_focus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_touchpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_persona: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_focus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity_level: Option<String>,
    #[serde(default)]
    pub data_sources_used: Vec<String>,
    pub confidence_score: String,
    pub methodology: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementNote {
    pub user_input_analyzed: String,
    pub refinement_type: String,
    pub audience_considerations: AudienceStyle,
    pub rules_applied: Vec<String>,
    pub modification_summary: String,
}
