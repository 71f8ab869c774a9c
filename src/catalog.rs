//! Static lookup tables the report generator reads from.
//!
//! Every lookup has a default so a report can always be produced: unknown
//! audiences read as cross-functional, unknown goals as investment
//! justification, unknown KPIs as processing time.

use crate::error::{CxLabError, Result};
use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

/// A selectable business scenario. Selected in the wizard as `"<title> - <industry>"`.
#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    pub title: &'static str,
    pub industry: &'static str,
    pub description: &'static str,
    pub complexity: &'static str,
    pub common_touchpoints: &'static [&'static str],
    pub typical_personas: &'static [&'static str],
    pub key_metrics: &'static [&'static str],
}

impl Scenario {
    pub fn label(&self) -> String {
        format!("{} - {}", self.title, self.industry)
    }
}

pub static SCENARIOS: &[Scenario] = &[
    Scenario {
        title: "E-commerce Customer Journey",
        industry: "Retail",
        description: "Online shopping experience from product discovery to delivery",
        complexity: "Medium",
        common_touchpoints: &["Website", "Mobile App", "Email", "Customer Service"],
        typical_personas: &["Busy Parent", "Price-Conscious Shopper", "Tech-Savvy Millennial"],
        key_metrics: &["Conversion Rate", "Cart Abandonment", "Customer Satisfaction"],
    },
    Scenario {
        title: "SaaS Customer Onboarding",
        industry: "Technology",
        description: "Software-as-a-Service user activation and feature adoption",
        complexity: "High",
        common_touchpoints: &["Web App", "Email", "In-App Messages", "Support Chat"],
        typical_personas: &["Business Professional", "Team Leader", "Individual Contributor"],
        key_metrics: &["Time to Value", "Feature Adoption", "Activation Rate"],
    },
    Scenario {
        title: "Restaurant Service Experience",
        industry: "Hospitality",
        description: "Dining experience from reservation to payment",
        complexity: "Medium",
        common_touchpoints: &["Phone", "Website", "In-Person", "Mobile App"],
        typical_personas: &["Date Night Couple", "Business Lunch", "Family Celebration"],
        key_metrics: &["Wait Time", "Service Quality", "Repeat Visits"],
    },
    Scenario {
        title: "Healthcare Patient Journey",
        industry: "Healthcare",
        description: "Patient experience from appointment booking to follow-up care",
        complexity: "High",
        common_touchpoints: &["Phone", "Patient Portal", "In-Person", "Email"],
        typical_personas: &["Senior Patient", "Busy Professional", "Concerned Parent"],
        key_metrics: &["Patient Satisfaction", "Wait Time", "Treatment Adherence"],
    },
    Scenario {
        title: "Invoice Processing",
        industry: "Finance",
        description: "Accounts payable from invoice receipt to payment approval",
        complexity: "Medium",
        common_touchpoints: &["Email Inbox", "ERP System", "Approval Portal"],
        typical_personas: &["AP Clerk", "Finance Controller", "Vendor"],
        key_metrics: &["Processing Time", "Error Rate", "Cost per Transaction"],
    },
    Scenario {
        title: "Employee Onboarding",
        industry: "Human Resources",
        description: "New hire paperwork, provisioning and orientation",
        complexity: "Medium",
        common_touchpoints: &["HR Portal", "Email", "IT Service Desk"],
        typical_personas: &["New Hire", "Hiring Manager", "HR Coordinator"],
        key_metrics: &["Time to Productivity", "Processing Time", "Employee Satisfaction"],
    },
];

pub const AUDIENCES: &[&str] = &[
    "Executive leadership (C-Suite)",
    "Operations team",
    "IT department",
    "Finance department",
    "Cross-functional stakeholders",
];

pub const DEFAULT_AUDIENCE: &str = "Cross-functional stakeholders";

pub const GOALS: &[&str] = &[
    "Justify automation investment to leadership",
    "Calculate ROI and payback period",
    "Compare automation vendors/solutions",
    "Plan automation implementation roadmap",
    "Demonstrate automation potential (demo/test)",
];

pub const DEFAULT_GOAL: &str = "Justify automation investment to leadership";

pub const DATA_SOURCES: &[&str] = &[
    "Process Volume & Timing Data",
    "Cost & Resource Data",
    "Error & Quality Data",
    "Employee Feedback",
];

pub const CX_TOOLS: &[&str] = &[
    "Customer Surveys",
    "Analytics Review",
    "Process Mapping",
    "A/B Testing",
    "User Interviews",
    "Journey Mapping",
    "Sentiment Analysis",
    "Behavioral Tracking",
];

/// A public-domain classic offered for a story rewrite
#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub title: &'static str,
    pub author: &'static str,
    pub genre: &'static str,
    pub theme: &'static str,
    pub period: &'static str,
}

pub const BOOKS: &[Book] = &[
    Book {
        title: "Alice's Adventures in Wonderland",
        author: "Lewis Carroll",
        genre: "Fantasy/Children's Literature",
        theme: "Curiosity and adventure",
        period: "Victorian",
    },
    Book {
        title: "The Secret Garden",
        author: "Frances Hodgson Burnett",
        genre: "Children's Literature",
        theme: "Transformation and healing",
        period: "Edwardian",
    },
    Book {
        title: "Treasure Island",
        author: "Robert Louis Stevenson",
        genre: "Adventure",
        theme: "Coming of age through adventure",
        period: "Georgian",
    },
];

pub const STORY_SETTINGS: &[&str] = &[
    "Space Station",
    "Modern City",
    "Underwater World",
    "Fantasy Realm",
    "Steampunk World",
];

pub const TIME_PERIODS: &[&str] = &[
    "Present Day",
    "Near Future",
    "Far Future",
    "Ancient Times",
    "Medieval Era",
];

pub const STORY_THEMES: &[&str] = &[
    "Courage and bravery",
    "Friendship and loyalty",
    "Curiosity and exploration",
    "Kindness and empathy",
];

/// Book by title, case-insensitively. Free-text titles are allowed in a
/// story project, so a miss is not an error.
pub fn find_book(title: &str) -> Option<&'static Book> {
    let wanted = title.trim();
    BOOKS.iter().find(|b| b.title.eq_ignore_ascii_case(wanted))
}

/// Look up a scenario by its title, case-insensitively
pub fn find_scenario(title: &str) -> Option<&'static Scenario> {
    let wanted = title.trim();
    SCENARIOS
        .iter()
        .find(|s| s.title.eq_ignore_ascii_case(wanted))
}

/// Resolve either a bare title or a `"<title> - <industry>"` label.
/// Unknown names fail with the closest known title as a suggestion.
pub fn resolve_scenario(input: &str) -> Result<&'static Scenario> {
    let title = scenario_title(input);
    if title.is_empty() {
        return Err(CxLabError::validation("business scenario cannot be empty"));
    }
    if let Some(found) = find_scenario(title) {
        return Ok(found);
    }

    let mut msg = format!("Unknown business scenario: '{}'", title);
    if let Some(closest) = closest_title(title) {
        msg.push_str(&format!(". Did you mean '{}'?", closest));
    }
    Err(CxLabError::Validation { message: msg })
}

/// Title part of a `"<title> - <industry>"` label
pub fn scenario_title(label: &str) -> &str {
    label.split(" - ").next().unwrap_or("").trim()
}

fn closest_title(input: &str) -> Option<&'static str> {
    let input_lower = input.to_lowercase();
    SCENARIOS
        .iter()
        .map(|s| (s.title, jaro_winkler(&input_lower, &s.title.to_lowercase())))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(title, _)| title)
}

/// Writing register chosen from the report audience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Strategic,
    Operational,
    Technical,
    Financial,
    Collaborative,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Strategic => "strategic",
            Tone::Operational => "operational",
            Tone::Technical => "technical",
            Tone::Financial => "financial",
            Tone::Collaborative => "collaborative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudienceStyle {
    pub tone: Tone,
    pub focus: String,
    pub detail_level: String,
    pub metrics_emphasis: String,
}

impl AudienceStyle {
    fn new(tone: Tone, focus: &str, detail_level: &str, metrics_emphasis: &str) -> Self {
        Self {
            tone,
            focus: focus.to_string(),
            detail_level: detail_level.to_string(),
            metrics_emphasis: metrics_emphasis.to_string(),
        }
    }

    pub fn emphasizes_financial_returns(&self) -> bool {
        self.metrics_emphasis == "financial_returns"
    }
}

pub fn audience_style(audience: Option<&str>) -> AudienceStyle {
    match audience.map(str::trim).unwrap_or(DEFAULT_AUDIENCE) {
        "Executive leadership (C-Suite)" => AudienceStyle::new(
            Tone::Strategic,
            "roi_impact",
            "executive_summary",
            "financial_returns",
        ),
        "Operations team" => AudienceStyle::new(
            Tone::Operational,
            "process_improvement",
            "detailed_analysis",
            "efficiency_gains",
        ),
        "IT department" => AudienceStyle::new(
            Tone::Technical,
            "implementation_feasibility",
            "technical_specifications",
            "system_integration",
        ),
        "Finance department" => AudienceStyle::new(
            Tone::Financial,
            "cost_benefit_analysis",
            "financial_modeling",
            "payback_period",
        ),
        _ => AudienceStyle::new(
            Tone::Collaborative,
            "holistic_automation",
            "balanced_view",
            "comprehensive_roi",
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalApproach {
    InvestmentJustification,
    FinancialModeling,
    VendorEvaluation,
    ImplementationPlanning,
    ProofOfConcept,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalStrategy {
    pub approach: GoalApproach,
    pub primary_deliverable: &'static str,
    pub success_metric: &'static str,
}

pub fn goal_strategy(goal: Option<&str>) -> GoalStrategy {
    let (approach, primary_deliverable, success_metric) =
        match goal.map(str::trim).unwrap_or(DEFAULT_GOAL) {
            "Calculate ROI and payback period" => (
                GoalApproach::FinancialModeling,
                "roi_analysis",
                "payback_timeline",
            ),
            "Compare automation vendors/solutions" => (
                GoalApproach::VendorEvaluation,
                "solution_comparison",
                "vendor_selection",
            ),
            "Plan automation implementation roadmap" => (
                GoalApproach::ImplementationPlanning,
                "deployment_roadmap",
                "milestone_achievement",
            ),
            "Demonstrate automation potential (demo/test)" => (
                GoalApproach::ProofOfConcept,
                "automation_demonstration",
                "stakeholder_buy_in",
            ),
            _ => (
                GoalApproach::InvestmentJustification,
                "executive_business_case",
                "roi_achievement",
            ),
        };
    GoalStrategy {
        approach,
        primary_deliverable,
        success_metric,
    }
}

/// Benchmark figures quoted in reports for one KPI
#[derive(Debug, Clone, Serialize)]
pub struct MetricInsight {
    pub key: &'static str,
    pub improvement_potential: &'static str,
    pub investment_range: &'static str,
    pub payback_period: &'static str,
    pub roi_percentage: &'static str,
    pub annual_savings: &'static str,
    pub net_present_value: &'static str,
    pub key_processes: [&'static str; 3],
    pub automation_solutions: [&'static str; 4],
    pub phase1_improvement: &'static str,
    pub phase2_improvement: &'static str,
    pub ongoing_savings: &'static str,
    pub quick_wins: &'static str,
    pub core_improvement: &'static str,
    pub annual_value: &'static str,
    pub current_performance: &'static str,
    pub industry_benchmark: &'static str,
    pub manual_hours: &'static str,
    pub integration_potential: &'static str,
    pub error_reduction: &'static str,
    pub efficiency_gain: &'static str,
}

pub const DEFAULT_METRIC_KEY: &str = "processing_time";

pub static METRIC_INSIGHTS: &[MetricInsight] = &[
    MetricInsight {
        key: "processing_time",
        improvement_potential: "70%",
        investment_range: "75K-150K",
        payback_period: "8-12 months",
        roi_percentage: "285%",
        annual_savings: "$420K",
        net_present_value: "$1.2M",
        key_processes: ["data entry and validation", "approval routing", "exception handling"],
        automation_solutions: [
            "Implement intelligent document processing automation",
            "Deploy workflow automation for approval processes",
            "Integrate AI-powered data validation and quality control",
            "Establish automated reporting and dashboard systems",
        ],
        phase1_improvement: "25%",
        phase2_improvement: "60%",
        ongoing_savings: "$50K monthly",
        quick_wins: "30%",
        core_improvement: "70%",
        annual_value: "$500K annual value",
        current_performance: "averaging 45 minutes per transaction",
        industry_benchmark: "85% automated",
        manual_hours: "40+ hours weekly",
        integration_potential: "cross-system data flows",
        error_reduction: "90% of manual errors",
        efficiency_gain: "300%",
    },
    MetricInsight {
        key: "conversion_rate",
        improvement_potential: "35%",
        investment_range: "60K-120K",
        payback_period: "6-9 months",
        roi_percentage: "320%",
        annual_savings: "$510K",
        net_present_value: "$1.4M",
        key_processes: ["cart recovery outreach", "product data syndication", "checkout verification"],
        automation_solutions: [
            "Implement automated abandoned-cart recovery journeys",
            "Deploy real-time personalization for product recommendations",
            "Integrate inventory and pricing feeds across channels",
            "Establish automated A/B test reporting",
        ],
        phase1_improvement: "10%",
        phase2_improvement: "50%",
        ongoing_savings: "$42K monthly",
        quick_wins: "12%",
        core_improvement: "65%",
        annual_value: "$610K annual value",
        current_performance: "at 2.1% of sessions",
        industry_benchmark: "3.5% conversion",
        manual_hours: "30+ hours weekly",
        integration_potential: "catalog and order data",
        error_reduction: "80% of listing errors",
        efficiency_gain: "240%",
    },
    MetricInsight {
        key: "error_rate",
        improvement_potential: "90%",
        investment_range: "50K-110K",
        payback_period: "7-10 months",
        roi_percentage: "260%",
        annual_savings: "$310K",
        net_present_value: "$900K",
        key_processes: ["manual re-keying", "reconciliation", "quality review"],
        automation_solutions: [
            "Implement rule-based validation at the point of capture",
            "Deploy automated reconciliation between source systems",
            "Integrate exception queues with guided resolution",
            "Establish automated quality scorecards",
        ],
        phase1_improvement: "40%",
        phase2_improvement: "75%",
        ongoing_savings: "$26K monthly",
        quick_wins: "45%",
        core_improvement: "80%",
        annual_value: "$350K annual value",
        current_performance: "at 12% of transactions",
        industry_benchmark: "under 1% errors",
        manual_hours: "25+ hours weekly",
        integration_potential: "master data synchronization",
        error_reduction: "95% of manual errors",
        efficiency_gain: "280%",
    },
    MetricInsight {
        key: "cost_per_transaction",
        improvement_potential: "60%",
        investment_range: "90K-180K",
        payback_period: "9-14 months",
        roi_percentage: "240%",
        annual_savings: "$380K",
        net_present_value: "$1.0M",
        key_processes: ["manual data handling", "multi-step approvals", "status follow-ups"],
        automation_solutions: [
            "Implement straight-through processing for standard cases",
            "Deploy self-service status tracking",
            "Integrate automated approvals under policy thresholds",
            "Establish cost-to-serve analytics",
        ],
        phase1_improvement: "20%",
        phase2_improvement: "55%",
        ongoing_savings: "$32K monthly",
        quick_wins: "25%",
        core_improvement: "60%",
        annual_value: "$420K annual value",
        current_performance: "at $14.20 per transaction",
        industry_benchmark: "$4.50 per transaction",
        manual_hours: "50+ hours weekly",
        integration_potential: "finance and operations systems",
        error_reduction: "85% of manual errors",
        efficiency_gain: "260%",
    },
    MetricInsight {
        key: "customer_satisfaction",
        improvement_potential: "25%",
        investment_range: "70K-140K",
        payback_period: "10-14 months",
        roi_percentage: "210%",
        annual_savings: "$290K",
        net_present_value: "$800K",
        key_processes: ["response routing", "status communication", "feedback collection"],
        automation_solutions: [
            "Implement intelligent ticket routing and prioritization",
            "Deploy proactive status notifications",
            "Integrate feedback surveys into every closed interaction",
            "Establish sentiment dashboards for frontline teams",
        ],
        phase1_improvement: "8%",
        phase2_improvement: "45%",
        ongoing_savings: "$24K monthly",
        quick_wins: "10%",
        core_improvement: "55%",
        annual_value: "$330K annual value",
        current_performance: "at 72% CSAT",
        industry_benchmark: "85% CSAT",
        manual_hours: "35+ hours weekly",
        integration_potential: "CRM and support platforms",
        error_reduction: "70% of routing errors",
        efficiency_gain: "220%",
    },
];

/// `"Conversion Rate"` -> `"conversion_rate"`
pub fn metric_key(kpi: &str) -> String {
    kpi.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

pub fn metric_insight(kpi: Option<&str>) -> &'static MetricInsight {
    let key = kpi
        .map(metric_key)
        .unwrap_or_else(|| DEFAULT_METRIC_KEY.to_string());
    METRIC_INSIGHTS
        .iter()
        .find(|m| m.key == key)
        .or_else(|| METRIC_INSIGHTS.iter().find(|m| m.key == DEFAULT_METRIC_KEY))
        .unwrap_or(&METRIC_INSIGHTS[0])
}

/// Observed process volume and cost figures for a scenario
#[derive(Debug, Clone, Serialize)]
pub struct ProcessBaseline {
    pub scenario: &'static str,
    pub monthly_volume: &'static str,
    pub avg_processing_time: &'static str,
    pub manual_effort_hours: &'static str,
    pub annual_cost: &'static str,
    pub labor_cost: &'static str,
    pub error_cost: &'static str,
    pub error_rate: &'static str,
}

pub static DEFAULT_BASELINE: ProcessBaseline = ProcessBaseline {
    scenario: "",
    monthly_volume: "2,500",
    avg_processing_time: "45 minutes",
    manual_effort_hours: "120 FTE hours",
    annual_cost: "$280K",
    labor_cost: "$180K",
    error_cost: "$45K",
    error_rate: "12%",
};

pub static PROCESS_BASELINES: &[ProcessBaseline] = &[
    ProcessBaseline {
        scenario: "E-commerce Customer Journey",
        monthly_volume: "18,000",
        avg_processing_time: "12 minutes",
        manual_effort_hours: "90 FTE hours",
        annual_cost: "$340K",
        labor_cost: "$210K",
        error_cost: "$60K",
        error_rate: "7%",
    },
    ProcessBaseline {
        scenario: "Invoice Processing",
        monthly_volume: "4,200",
        avg_processing_time: "38 minutes",
        manual_effort_hours: "160 FTE hours",
        annual_cost: "$410K",
        labor_cost: "$290K",
        error_cost: "$70K",
        error_rate: "14%",
    },
    ProcessBaseline {
        scenario: "Employee Onboarding",
        monthly_volume: "120",
        avg_processing_time: "6 hours",
        manual_effort_hours: "110 FTE hours",
        annual_cost: "$230K",
        labor_cost: "$170K",
        error_cost: "$25K",
        error_rate: "9%",
    },
];

pub fn process_baseline(scenario_title: &str) -> &'static ProcessBaseline {
    PROCESS_BASELINES
        .iter()
        .find(|b| b.scenario.eq_ignore_ascii_case(scenario_title.trim()))
        .unwrap_or(&DEFAULT_BASELINE)
}
