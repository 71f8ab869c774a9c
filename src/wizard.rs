//! Four-step wizard: scenario, team/setup, analysis, report.
//!
//! Story projects walk the same steps with a book in place of the scenario
//! and a setting plus characters in place of the setup.
//!
//! Forward navigation is gated on the previous step being complete. The
//! analysis lifecycle methods mirror what a front end does while it polls the
//! backend: begin, record each finished agent, then finish or fail.

use crate::error::{CxLabError, Result};
use crate::pipeline::AGENTS;
use crate::project::{ProjectData, ReportKind};
use crate::report::{self, Report, STORY_AGENTS};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Scenario = 0,
    Setup = 1,
    Analysis = 2,
    Report = 3,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::Scenario,
        WizardStep::Setup,
        WizardStep::Analysis,
        WizardStep::Report,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Scenario => "Choose Scenario",
            WizardStep::Setup => "Set Up Analysis",
            WizardStep::Analysis => "Run Analysis",
            WizardStep::Report => "Review Report",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Wizard {
    pub current_step: WizardStep,
    pub project: ProjectData,
    pub report: Option<Report>,
    pub refined: Option<Report>,
    pub agent_workflow: Vec<String>,
    pub current_agent: Option<String>,
    pub error: Option<String>,
    pub loading: bool,
    /// Show explanatory copy alongside each step; survives `reset`
    pub guided_mode: bool,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new(ReportKind::default())
    }
}

impl Wizard {
    pub fn new(kind: ReportKind) -> Self {
        Self {
            current_step: WizardStep::Scenario,
            project: ProjectData::new(kind),
            report: None,
            refined: None,
            agent_workflow: Vec::new(),
            current_agent: None,
            error: None,
            loading: false,
            guided_mode: false,
        }
    }

    pub fn is_step_complete(&self, step: WizardStep) -> bool {
        let p = &self.project;
        match step {
            WizardStep::Scenario => match p.kind {
                ReportKind::Story => p.has_book(),
                _ => p.has_scenario(),
            },
            WizardStep::Setup => match p.kind {
                ReportKind::Automation => {
                    is_set(&p.report_audience) && is_set(&p.report_goal) && is_set(&p.target_kpi)
                }
                ReportKind::Cx => is_set(&p.touchpoint) && p.named_personas().next().is_some(),
                ReportKind::Story => {
                    is_set(&p.story.setting) && p.named_personas().next().is_some()
                }
            },
            WizardStep::Analysis => {
                self.is_step_complete(WizardStep::Scenario)
                    && self.is_step_complete(WizardStep::Setup)
            }
            WizardStep::Report => self.report.is_some(),
        }
    }

    pub fn can_navigate_to(&self, step: WizardStep) -> bool {
        match step.index().checked_sub(1).and_then(WizardStep::from_index) {
            None => true,
            Some(prev) => self.is_step_complete(prev),
        }
    }

    /// Move to `step`, refusing when the step before it is incomplete.
    pub fn navigate(&mut self, step: WizardStep) -> Result<()> {
        if !self.can_navigate_to(step) {
            return Err(CxLabError::StepLocked {
                requested: step.index(),
                blocking: step.index().saturating_sub(1),
            });
        }
        self.current_step = step;
        Ok(())
    }

    pub fn advance(&mut self) -> Result<WizardStep> {
        let next = WizardStep::from_index(self.current_step.index() + 1).ok_or_else(|| {
            CxLabError::validation("already at the final step")
        })?;
        self.navigate(next)?;
        Ok(next)
    }

    pub fn back(&mut self) -> WizardStep {
        if let Some(prev) = self
            .current_step
            .index()
            .checked_sub(1)
            .and_then(WizardStep::from_index)
        {
            self.current_step = prev;
        }
        self.current_step
    }

    /// Clear any previous run and enter the loading state.
    pub fn begin_analysis(&mut self) -> Result<()> {
        if !self.is_step_complete(WizardStep::Analysis) {
            return Err(CxLabError::StepLocked {
                requested: WizardStep::Analysis.index(),
                blocking: WizardStep::Setup.index(),
            });
        }
        self.current_step = WizardStep::Analysis;
        self.report = None;
        self.refined = None;
        self.agent_workflow.clear();
        self.current_agent = None;
        self.error = None;
        self.loading = true;
        Ok(())
    }

    pub fn record_agent_complete(&mut self, agent: &str) {
        if !self.agent_workflow.iter().any(|a| a == agent) {
            self.agent_workflow.push(agent.to_string());
        }
        self.current_agent = Some(agent.to_string());
    }

    pub fn finish_analysis(&mut self, report: Report) {
        self.report = Some(report);
        self.refined = None;
        self.loading = false;
        self.current_agent = None;
        self.error = None;
        self.current_step = WizardStep::Report;
    }

    pub fn fail_analysis(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("analysis failed: {}", message);
        self.error = Some(message);
        self.loading = false;
        self.current_agent = None;
    }

    /// Generate locally from the form data, without a backend.
    pub fn run_local_analysis(&mut self) -> Result<&Report> {
        self.begin_analysis()?;
        let team: Vec<&str> = match self.project.kind {
            ReportKind::Story => STORY_AGENTS.to_vec(),
            _ => AGENTS.iter().map(|a| a.technical_name).collect(),
        };
        for agent in team {
            self.record_agent_complete(agent);
        }
        let report = report::generate_report(&self.project);
        self.finish_analysis(report);
        self.report
            .as_ref()
            .ok_or_else(|| CxLabError::Internal {
                message: "report missing after analysis".into(),
            })
    }

    /// Refine the original report; the original stays as it was.
    pub fn refine(&mut self, input: &str) -> Result<&Report> {
        if input.trim().is_empty() {
            return Err(CxLabError::validation("refinement input cannot be empty"));
        }
        let original = self.report.as_ref().ok_or(CxLabError::NoResult)?;
        if original.kind == ReportKind::Story {
            return Err(CxLabError::validation(
                "story reports are revised by regenerating the story",
            ));
        }
        self.refined = Some(report::refine_report(original, input));
        self.refined.as_ref().ok_or(CxLabError::NoResult)
    }

    /// Replace the story with its next revision from the current choices.
    pub fn regenerate_story(&mut self) -> Result<&Report> {
        let current = self.report.as_ref().ok_or(CxLabError::NoResult)?;
        let next = report::regenerate_story(current, &self.project)?;
        tracing::debug!(project_id = %next.project_id, "story regenerated");
        self.refined = None;
        let next: &Report = self.report.insert(next);
        Ok(next)
    }

    /// Refined report when present, else the original
    pub fn active_report(&self) -> Option<&Report> {
        self.refined.as_ref().or(self.report.as_ref())
    }

    /// Start over with a blank project of the same kind.
    pub fn reset(&mut self) {
        let guided_mode = self.guided_mode;
        let education_mode = self.project.story.ai_education_mode;
        *self = Self::new(self.project.kind);
        self.guided_mode = guided_mode;
        self.project.story.ai_education_mode = education_mode;
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn automation_ready() -> Wizard {
        let mut wizard = Wizard::new(ReportKind::Automation);
        wizard.project.business_scenario = "Invoice Processing - Finance".into();
        wizard.project.report_audience = Some("Finance department".into());
        wizard.project.report_goal = Some("Calculate ROI and payback period".into());
        wizard.project.target_kpi = Some("Processing Time".into());
        wizard
    }

    #[test]
    fn test_forward_navigation_is_gated() {
        let mut wizard = Wizard::new(ReportKind::Automation);
        assert!(wizard.navigate(WizardStep::Scenario).is_ok());
        let err = wizard.navigate(WizardStep::Setup).unwrap_err();
        assert!(matches!(err, CxLabError::StepLocked { .. }));
        assert_eq!(wizard.current_step, WizardStep::Scenario);

        wizard.project.business_scenario = "Invoice Processing - Finance".into();
        assert_eq!(wizard.advance().unwrap(), WizardStep::Setup);
        assert!(wizard.advance().is_err());
        assert_eq!(wizard.current_step, WizardStep::Setup);
    }

    #[test]
    fn test_every_step_requires_previous_completion() {
        let wizard = automation_ready();
        for step in WizardStep::ALL {
            let expected = match step.index() {
                0 => true,
                n => wizard.is_step_complete(WizardStep::from_index(n - 1).unwrap()),
            };
            assert_eq!(wizard.can_navigate_to(step), expected);
        }
        assert!(wizard.can_navigate_to(WizardStep::Report));

        let mut unfinished = automation_ready();
        unfinished.project.target_kpi = None;
        assert!(!unfinished.can_navigate_to(WizardStep::Report));
        assert!(matches!(
            unfinished.navigate(WizardStep::Report),
            Err(CxLabError::StepLocked { requested: 3, blocking: 2 })
        ));
    }

    #[test]
    fn test_story_steps_need_book_setting_and_character() {
        let mut wizard = Wizard::new(ReportKind::Story);
        wizard.project.business_scenario = "Invoice Processing - Finance".into();
        assert!(!wizard.is_step_complete(WizardStep::Scenario));
        wizard.project.story.book_title = "The Secret Garden".into();
        assert!(wizard.is_step_complete(WizardStep::Scenario));

        wizard.project.story.setting = Some("Steampunk World".into());
        assert!(!wizard.is_step_complete(WizardStep::Setup));
        wizard.project.personas[0].name = "Mary".into();
        assert!(wizard.is_step_complete(WizardStep::Setup));

        let report = wizard.run_local_analysis().unwrap();
        assert!(report.story.is_some());
        assert_eq!(wizard.agent_workflow, STORY_AGENTS.to_vec());
        assert!(matches!(wizard.refine("shorter"), Err(CxLabError::Validation { .. })));

        let id = wizard.report.as_ref().unwrap().project_id.clone();
        let next = wizard.regenerate_story().unwrap();
        assert_eq!(next.project_id, id);
        assert_eq!(next.story.as_ref().unwrap().revision, 2);
    }

    #[test]
    fn test_regenerate_needs_story_report() {
        let mut wizard = automation_ready();
        assert!(matches!(wizard.regenerate_story(), Err(CxLabError::NoResult)));
        wizard.run_local_analysis().unwrap();
        assert!(matches!(wizard.regenerate_story(), Err(CxLabError::Validation { .. })));
        assert_eq!(wizard.agent_workflow.len(), AGENTS.len());
    }

    #[test]
    fn test_cx_setup_needs_named_persona() {
        let mut wizard = Wizard::new(ReportKind::Cx);
        wizard.project.business_scenario = "Restaurant Service Experience - Hospitality".into();
        wizard.project.touchpoint = Some("Website".into());
        assert!(!wizard.is_step_complete(WizardStep::Setup));
        wizard.project.personas[0].name = "   ".into();
        assert!(!wizard.is_step_complete(WizardStep::Setup));
        wizard.project.personas[0].name = "Date Night Couple".into();
        assert!(wizard.is_step_complete(WizardStep::Setup));
        assert!(wizard.is_step_complete(WizardStep::Analysis));
    }

    #[test]
    fn test_back_stops_at_first_step() {
        let mut wizard = automation_ready();
        wizard.advance().unwrap();
        assert_eq!(wizard.back(), WizardStep::Scenario);
        assert_eq!(wizard.back(), WizardStep::Scenario);
    }

    #[test]
    fn test_analysis_lifecycle() {
        let mut wizard = automation_ready();
        wizard.begin_analysis().unwrap();
        assert!(wizard.loading);
        assert_eq!(wizard.current_step, WizardStep::Analysis);

        wizard.record_agent_complete("customer_journey_analyst");
        wizard.record_agent_complete("customer_journey_analyst");
        assert_eq!(wizard.agent_workflow.len(), 1);

        wizard.fail_analysis("Automation analysis failed: boom");
        assert!(!wizard.loading);
        assert_eq!(wizard.error.as_deref(), Some("Automation analysis failed: boom"));

        wizard.begin_analysis().unwrap();
        assert!(wizard.error.is_none());
        assert!(wizard.agent_workflow.is_empty());

        let report = report::generate_report(&wizard.project);
        wizard.finish_analysis(report);
        assert_eq!(wizard.current_step, WizardStep::Report);
        assert!(wizard.is_step_complete(WizardStep::Report));
    }

    #[test]
    fn test_begin_analysis_requires_setup() {
        let mut wizard = Wizard::new(ReportKind::Automation);
        wizard.project.business_scenario = "Invoice Processing - Finance".into();
        assert!(wizard.begin_analysis().is_err());
        assert!(!wizard.loading);
    }

    #[test]
    fn test_refine_keeps_original() {
        let mut wizard = automation_ready();
        assert!(matches!(wizard.refine("budget"), Err(CxLabError::NoResult)));
        wizard.run_local_analysis().unwrap();
        assert!(matches!(wizard.refine("   "), Err(CxLabError::Validation { .. })));

        let original = wizard.report.clone().unwrap();
        wizard.refine("tight budget").unwrap();
        assert_eq!(wizard.report.as_ref(), Some(&original));
        assert!(wizard.active_report().unwrap().refinement.is_some());
    }

    #[test]
    fn test_reset_restores_initial_state_but_keeps_guided_mode() {
        let mut wizard = automation_ready();
        wizard.guided_mode = true;
        wizard.run_local_analysis().unwrap();
        wizard.refine("faster").unwrap();
        wizard.reset();

        let fresh = Wizard::new(ReportKind::Automation);
        assert_eq!(wizard.current_step, fresh.current_step);
        assert!(wizard.report.is_none());
        assert!(wizard.refined.is_none());
        assert!(wizard.agent_workflow.is_empty());
        assert!(wizard.error.is_none());
        assert!(!wizard.loading);
        assert!(!wizard.project.has_scenario());
        assert_eq!(wizard.project.personas.len(), 1);
        assert!(wizard.guided_mode);

        let mut story = Wizard::new(ReportKind::Story);
        story.project.story.ai_education_mode = true;
        story.project.story.book_title = "Treasure Island".into();
        story.reset();
        assert!(story.project.story.ai_education_mode);
        assert!(!story.project.has_book());
    }
}
