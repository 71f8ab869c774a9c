//! The six built-in analysis stages. Each renders a paragraph from the
//! request, the financial projection and the sections already written.

use super::{AGENTS, AgentInfo, AnalysisStage, StageContext};
use crate::error::Result;
use crate::report::roi::format_thousands;
use async_trait::async_trait;
use std::sync::Arc;

type Render = fn(&StageContext) -> String;

pub struct TemplateStage {
    agent: &'static AgentInfo,
    render: Render,
}

impl TemplateStage {
    pub fn new(agent: &'static AgentInfo, render: Render) -> Self {
        Self { agent, render }
    }
}

#[async_trait]
impl AnalysisStage for TemplateStage {
    fn agent(&self) -> &'static AgentInfo {
        self.agent
    }

    async fn run(&self, ctx: &StageContext) -> Result<String> {
        Ok((self.render)(ctx))
    }
}

pub fn default_stages() -> Vec<Arc<dyn AnalysisStage>> {
    let renders: [Render; 6] = [
        process_analysis,
        roi_analysis,
        implementation_plan,
        risk_assessment,
        technology_integration,
        business_case,
    ];
    AGENTS
        .iter()
        .zip(renders)
        .map(|(agent, render)| Arc::new(TemplateStage::new(agent, render)) as Arc<dyn AnalysisStage>)
        .collect()
}

fn or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value.trim()
    }
}

fn process_analysis(ctx: &StageContext) -> String {
    let r = &ctx.request;
    let readiness = if r.manual_percentage > 60 && r.monthly_volume > 100 {
        "high"
    } else if r.manual_percentage > 30 {
        "moderate"
    } else {
        "limited"
    };
    format!(
        "{} runs {} with {} transactions a month handled by {} people, {}% of it manual. Current state: {}. Core challenge: {}. Automation readiness is {} and the process classifies as {}.",
        or(&r.business_scenario, "The process"),
        or(&r.process_frequency, "on demand").to_lowercase(),
        format_thousands(f64::from(r.monthly_volume)),
        r.people_involved,
        r.manual_percentage,
        or(&r.current_state, "largely manual hand-offs between teams"),
        or(&r.business_challenge, "slow and error-prone manual processing"),
        readiness,
        ctx.projection.complexity.replace('_', " ")
    )
}

fn roi_analysis(ctx: &StageContext) -> String {
    let p = &ctx.projection;
    format!(
        "Projected savings of ${} per month (${} per year) against an implementation cost of ${} give an ROI of {:.0}% with payback in {:.1} months.",
        format_thousands(p.monthly_savings),
        format_thousands(p.annual_savings),
        format_thousands(p.implementation_cost),
        p.roi_percentage,
        p.payback_months
    )
}

fn implementation_plan(ctx: &StageContext) -> String {
    let departments = if ctx.request.affected_departments.is_empty() {
        "the owning team".to_string()
    } else {
        ctx.request.affected_departments.join(", ")
    };
    let pilot_months = match ctx.projection.complexity {
        "enterprise_automation" => 3,
        "process_automation" => 2,
        _ => 1,
    };
    format!(
        "Start with a {}-month pilot in {}, then configure and integrate workflows over months 3-5 and roll out in phases through month 8. Success is defined as: {}.",
        pilot_months,
        departments,
        or(&ctx.request.success_definition, "measurably shorter cycle times")
    )
}

fn risk_assessment(ctx: &StageContext) -> String {
    let r = &ctx.request;
    let adoption_risk = if r.people_involved > 10 {
        "high"
    } else if r.people_involved > 5 {
        "medium"
    } else {
        "low"
    };
    let sponsors = if r.decision_makers.is_empty() {
        "an executive sponsor".to_string()
    } else {
        r.decision_makers.join(", ")
    };
    format!(
        "Adoption risk is {} with {} staff affected; integration risk grows with {} complexity. Mitigate through phased rollout, rollback plans and sign-off from {}.",
        adoption_risk,
        r.people_involved,
        ctx.projection.complexity.replace('_', " "),
        sponsors
    )
}

fn technology_integration(ctx: &StageContext) -> String {
    let tools = if ctx.request.cx_tools.is_empty() {
        "existing systems of record".to_string()
    } else {
        ctx.request.cx_tools.join(", ")
    };
    format!(
        "Integrate the automation platform with {} through APIs, add validation at data capture and route exceptions to a monitored queue. Capacity should cover {} transactions a month with headroom for 3x growth.",
        tools,
        format_thousands(f64::from(ctx.request.monthly_volume))
    )
}

fn business_case(ctx: &StageContext) -> String {
    let summary = match ctx.section("data_analytics_specialist") {
        Some(roi) => roi.text.as_str(),
        None => "Financial projections are pending.",
    };
    format!(
        "Recommendation: proceed with automation of {}. {} Objective: {}.",
        or(&ctx.request.business_scenario, "the process"),
        summary,
        or(&ctx.request.cx_objective, "reduce manual effort and cost")
    )
}
