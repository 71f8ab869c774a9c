//! Wizard form data and the backend request derived from it

use crate::catalog;
use crate::error::{CxLabError, Result};
use serde::{Deserialize, Serialize};

pub const MAX_PERSONAS: usize = 4;
pub const MAX_CX_TOOLS: usize = 4;

/// Which report family a project produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    #[default]
    Automation,
    Cx,
    /// Build-a-Story: rewrite a classic book in a new setting
    Story,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Persona {
    pub fn blank() -> Self {
        Self {
            id: new_persona_id(),
            name: String::new(),
            description: String::new(),
        }
    }

    pub fn is_named(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

fn new_persona_id() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("char_{}", &raw[..9])
}

/// Process metrics collected for the financial model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessProfile {
    #[serde(default)]
    pub business_challenge: String,
    #[serde(default)]
    pub current_state: String,
    #[serde(default)]
    pub process_frequency: String,
    #[serde(default)]
    pub monthly_volume: u32,
    #[serde(default)]
    pub people_involved: u32,
    #[serde(default)]
    pub manual_percentage: u8,
    #[serde(default)]
    pub decision_makers: Vec<String>,
    #[serde(default)]
    pub affected_departments: Vec<String>,
}

impl Default for ProcessProfile {
    fn default() -> Self {
        Self {
            business_challenge: String::new(),
            current_state: String::new(),
            process_frequency: "Daily".to_string(),
            monthly_volume: 500,
            people_involved: 3,
            manual_percentage: 70,
            decision_makers: Vec::new(),
            affected_departments: Vec::new(),
        }
    }
}

/// Everything the user has entered in the wizard so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    #[serde(default)]
    pub kind: ReportKind,
    #[serde(default)]
    pub business_scenario: String,
    #[serde(default)]
    pub report_audience: Option<String>,
    #[serde(default)]
    pub report_goal: Option<String>,
    #[serde(default)]
    pub target_kpi: Option<String>,
    #[serde(default)]
    pub success_definition: Option<String>,
    #[serde(default)]
    pub customer_segment: Option<String>,
    #[serde(default, alias = "dataSourcesList")]
    pub data_sources: Vec<String>,
    /// Personas for cx projects, characters for story projects
    #[serde(default = "default_personas", alias = "personasList", alias = "charactersList")]
    pub personas: Vec<Persona>,
    #[serde(default)]
    pub touchpoint: Option<String>,
    #[serde(default)]
    pub business_context: String,
    #[serde(default)]
    pub cx_objective: Option<String>,
    #[serde(default, alias = "cxToolsList")]
    pub cx_tools: Vec<String>,
    #[serde(default)]
    pub process: ProcessProfile,
    #[serde(flatten)]
    pub story: StoryPlan,
}

/// Story choices; the characters live in `ProjectData::personas`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryPlan {
    #[serde(default)]
    pub book_title: String,
    #[serde(default)]
    pub setting: Option<String>,
    #[serde(default)]
    pub time_period: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default, alias = "specialElementsList")]
    pub special_elements: Vec<String>,
    /// Attach the AI collaboration lessons to the finished story
    #[serde(default, alias = "enable_ai_education_mode")]
    pub ai_education_mode: bool,
}

fn default_personas() -> Vec<Persona> {
    vec![Persona::blank()]
}

impl Default for ProjectData {
    fn default() -> Self {
        Self::new(ReportKind::default())
    }
}

impl ProjectData {
    /// Fresh form: empty fields and one blank persona row
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            business_scenario: String::new(),
            report_audience: None,
            report_goal: None,
            target_kpi: None,
            success_definition: None,
            customer_segment: None,
            data_sources: Vec::new(),
            personas: default_personas(),
            touchpoint: None,
            business_context: String::new(),
            cx_objective: None,
            cx_tools: Vec::new(),
            process: ProcessProfile::default(),
            story: StoryPlan::default(),
        }
    }

    /// `"E-commerce Customer Journey - Retail"` -> `"E-commerce Customer Journey"`
    pub fn scenario_title(&self) -> &str {
        catalog::scenario_title(&self.business_scenario)
    }

    pub fn has_scenario(&self) -> bool {
        !self.business_scenario.trim().is_empty()
    }

    pub fn has_book(&self) -> bool {
        !self.story.book_title.trim().is_empty()
    }

    /// Enforce the persona and tool limits on data that bypassed the setters
    pub fn validate(&self) -> Result<()> {
        check_limits(self.personas.len(), self.cx_tools.len())
    }

    pub fn named_personas(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter().filter(|p| p.is_named())
    }

    pub fn add_persona(&mut self) -> Result<&mut Persona> {
        if self.personas.len() >= MAX_PERSONAS {
            return Err(CxLabError::validation(format!(
                "at most {} personas can be added",
                MAX_PERSONAS
            )));
        }
        self.personas.push(Persona::blank());
        let last = self.personas.len() - 1;
        Ok(&mut self.personas[last])
    }

    pub fn remove_persona(&mut self, id: &str) -> Result<()> {
        let before = self.personas.len();
        self.personas.retain(|p| p.id != id);
        if self.personas.len() == before {
            return Err(CxLabError::NotFound {
                resource: "Persona".into(),
                id: id.to_string(),
            });
        }
        if self.personas.is_empty() {
            self.personas.push(Persona::blank());
        }
        Ok(())
    }

    /// Check or uncheck an analysis tool; at most four may be checked
    pub fn set_cx_tool(&mut self, tool: &str, checked: bool) -> Result<()> {
        let present = self.cx_tools.iter().any(|t| t == tool);
        match (checked, present) {
            (true, false) => {
                if self.cx_tools.len() >= MAX_CX_TOOLS {
                    return Err(CxLabError::validation(format!(
                        "choose up to {} analysis methods",
                        MAX_CX_TOOLS
                    )));
                }
                self.cx_tools.push(tool.to_string());
            }
            (false, true) => self.cx_tools.retain(|t| t != tool),
            _ => {}
        }
        Ok(())
    }

    pub fn set_data_source(&mut self, source: &str, checked: bool) {
        let present = self.data_sources.iter().any(|s| s == source);
        if checked && !present {
            self.data_sources.push(source.to_string());
        } else if !checked && present {
            self.data_sources.retain(|s| s != source);
        }
    }

    /// `"Alex: curious pilot; Mira: engineer"`, blank names skipped
    pub fn personas_summary(&self) -> String {
        self.named_personas()
            .map(|p| format!("{}: {}", p.name.trim(), p.description.trim()))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Flatten the form into the body the analysis API accepts
    pub fn to_analysis_request(&self) -> AnalysisRequest {
        AnalysisRequest {
            business_challenge: non_empty_or(
                &self.process.business_challenge,
                &self.business_context,
            ),
            current_state: self.process.current_state.clone(),
            success_definition: self.success_definition.clone().unwrap_or_default(),
            process_frequency: self.process.process_frequency.clone(),
            monthly_volume: self.process.monthly_volume,
            people_involved: self.process.people_involved,
            manual_percentage: self.process.manual_percentage,
            business_scenario: self.business_scenario.clone(),
            decision_makers: self.process.decision_makers.clone(),
            affected_departments: self.process.affected_departments.clone(),
            business_context: self.business_context.clone(),
            cx_objective: self.cx_objective.clone().unwrap_or_default(),
            personas: self.named_personas().cloned().collect(),
            cx_tools: self.cx_tools.clone(),
        }
    }
}

fn non_empty_or(primary: &str, fallback: &str) -> String {
    if primary.trim().is_empty() {
        fallback.to_string()
    } else {
        primary.to_string()
    }
}

/// Body of `POST /api/v1/cx-analysis/create`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub business_challenge: String,
    pub current_state: String,
    pub success_definition: String,
    pub process_frequency: String,
    pub monthly_volume: u32,
    pub people_involved: u32,
    pub manual_percentage: u8,
    pub business_scenario: String,
    #[serde(default)]
    pub decision_makers: Vec<String>,
    #[serde(default)]
    pub affected_departments: Vec<String>,
    #[serde(default)]
    pub business_context: String,
    #[serde(default)]
    pub cx_objective: String,
    #[serde(default, alias = "personasList")]
    pub personas: Vec<Persona>,
    #[serde(default, alias = "cxToolsList")]
    pub cx_tools: Vec<String>,
}

impl AnalysisRequest {
    /// Reject requests the financial model cannot price
    pub fn validate(&self) -> Result<()> {
        if self.business_scenario.trim().is_empty() {
            return Err(CxLabError::validation("business_scenario is required"));
        }
        if self.monthly_volume == 0 {
            return Err(CxLabError::validation(
                "monthly_volume must be at least 1",
            ));
        }
        if self.manual_percentage > 100 {
            return Err(CxLabError::validation(format!(
                "manual_percentage must be between 0 and 100, got {}",
                self.manual_percentage
            )));
        }
        check_limits(self.personas.len(), self.cx_tools.len())
    }
}

fn check_limits(personas: usize, cx_tools: usize) -> Result<()> {
    if personas > MAX_PERSONAS {
        return Err(CxLabError::validation(format!(
            "at most {} personas can be added, got {}",
            MAX_PERSONAS, personas
        )));
    }
    if cx_tools > MAX_CX_TOOLS {
        return Err(CxLabError::validation(format!(
            "choose up to {} analysis methods, got {}",
            MAX_CX_TOOLS, cx_tools
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_project_has_one_blank_persona() {
        let project = ProjectData::new(ReportKind::Cx);
        assert_eq!(project.personas.len(), 1);
        assert!(project.personas[0].id.starts_with("char_"));
        assert!(!project.personas[0].is_named());
        assert_eq!(project.named_personas().count(), 0);
    }

    #[test]
    fn test_persona_limit() {
        let mut project = ProjectData::default();
        for _ in 0..3 {
            project.add_persona().unwrap();
        }
        assert_eq!(project.personas.len(), MAX_PERSONAS);
        assert!(project.add_persona().is_err());
    }

    #[test]
    fn test_removing_last_persona_leaves_blank_row() {
        let mut project = ProjectData::default();
        let id = project.personas[0].id.clone();
        project.remove_persona(&id).unwrap();
        assert_eq!(project.personas.len(), 1);
        assert_ne!(project.personas[0].id, id);
        assert!(project.remove_persona("char_missing").is_err());
    }

    #[test]
    fn test_cx_tool_limit() {
        let mut project = ProjectData::default();
        for tool in &catalog::CX_TOOLS[..4] {
            project.set_cx_tool(tool, true).unwrap();
        }
        assert!(project.set_cx_tool(catalog::CX_TOOLS[4], true).is_err());
        // re-checking an already checked tool is not an addition
        project.set_cx_tool(catalog::CX_TOOLS[0], true).unwrap();
        project.set_cx_tool(catalog::CX_TOOLS[0], false).unwrap();
        assert_eq!(project.cx_tools.len(), 3);
    }

    #[test]
    fn test_analysis_request_skips_unnamed_personas() {
        let mut project = ProjectData::default();
        project.business_scenario = "Invoice Processing - Finance".into();
        project.personas[0].name = "Dana".into();
        project.personas[0].description = "AP lead".into();
        project.add_persona().unwrap();
        project.business_context = "Quarter-end backlog".into();

        let request = project.to_analysis_request();
        assert_eq!(request.personas.len(), 1);
        assert_eq!(request.business_challenge, "Quarter-end backlog");
        assert_eq!(project.personas_summary(), "Dana: AP lead");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_accepts_legacy_field_names() {
        let request: AnalysisRequest = serde_json::from_value(serde_json::json!({
            "business_challenge": "slow approvals",
            "current_state": "email",
            "success_definition": "half the cycle time",
            "process_frequency": "Daily",
            "monthly_volume": 800,
            "people_involved": 4,
            "manual_percentage": 85,
            "business_scenario": "Invoice Processing - Finance",
            "personasList": [{"id": "char_1", "name": "Dana", "description": ""}],
            "cxToolsList": ["Process Mapping"]
        }))
        .unwrap();
        assert_eq!(request.personas[0].name, "Dana");
        assert_eq!(request.cx_tools, vec!["Process Mapping".to_string()]);
    }

    #[test]
    fn test_request_validation() {
        let mut request = ProjectData::default().to_analysis_request();
        assert!(request.validate().is_err());
        request.business_scenario = "Invoice Processing - Finance".into();
        request.monthly_volume = 0;
        assert!(request.validate().is_err());
        request.monthly_volume = 10;
        request.manual_percentage = 101;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_limits_apply_to_deserialized_data() {
        let mut request = ProjectData::default().to_analysis_request();
        request.business_scenario = "Invoice Processing - Finance".into();
        request.cx_tools = catalog::CX_TOOLS[..5].iter().map(|t| t.to_string()).collect();
        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("up to 4 analysis methods"));

        request.cx_tools.truncate(4);
        request.personas = (0..5)
            .map(|i| Persona {
                id: format!("char_{}", i),
                name: format!("Persona {}", i),
                description: String::new(),
            })
            .collect();
        assert!(matches!(request.validate(), Err(CxLabError::Validation { .. })));

        let project: ProjectData = serde_json::from_value(serde_json::json!({
            "kind": "cx",
            "cxToolsList": ["A", "B", "C", "D", "E"]
        }))
        .unwrap();
        assert_eq!(project.cx_tools.len(), 5);
        assert!(project.validate().is_err());
    }

    #[test]
    fn test_story_fields_accept_frontend_names() {
        let project: ProjectData = serde_json::from_value(serde_json::json!({
            "kind": "story",
            "book_title": "Treasure Island",
            "setting": "Space Station",
            "charactersList": [{"id": "char_1", "name": "Alex", "description": "cadet"}],
            "specialElementsList": ["a talking robot"]
        }))
        .unwrap();
        assert_eq!(project.kind, ReportKind::Story);
        assert!(project.has_book());
        assert_eq!(project.story.setting.as_deref(), Some("Space Station"));
        assert_eq!(project.personas[0].name, "Alex");
        assert_eq!(project.story.special_elements, vec!["a talking robot".to_string()]);
        assert!(project.validate().is_ok());
    }
}
