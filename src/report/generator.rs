//! Template report generation from wizard form data.
//!
//! Pure string interpolation against the tables in [`crate::catalog`]; story
//! projects go to [`super::story`]. Two
//! calls with the same project produce the same report apart from the
//! random suffix of the project id.

use super::story::story_report;
use super::{
    AnalysisDetails, Certification, Deliverables, Phase, Report, Roadmap, SuccessMetric,
};
use crate::catalog::{self, AudienceStyle, GoalApproach, MetricInsight, Tone};
use crate::project::{ProjectData, ReportKind};
use chrono::Utc;

/// `AUTO-20250612-3f9a1c` / `CX-20250612-3f9a1c` / `STY-20250612-3f9a1c`
pub fn new_project_id(kind: ReportKind) -> String {
    let prefix = match kind {
        ReportKind::Automation => "AUTO",
        ReportKind::Cx => "CX",
        ReportKind::Story => "STY",
    };
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, Utc::now().format("%Y%m%d"), &suffix[..6])
}

pub fn generate_report(data: &ProjectData) -> Report {
    generate_report_with_id(data, new_project_id(data.kind))
}

pub fn generate_report_with_id(data: &ProjectData, project_id: String) -> Report {
    match data.kind {
        ReportKind::Automation => automation_report(data, project_id),
        ReportKind::Cx => cx_report(data, project_id),
        ReportKind::Story => story_report(data, project_id, 1),
    }
}

fn or_default<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

fn automation_report(data: &ProjectData, project_id: String) -> Report {
    let scenario = match data.scenario_title() {
        "" => "the automation process",
        title => title,
    };
    let audience = audience_of(data);
    let style = catalog::audience_style(audience.as_deref());
    let goal = catalog::goal_strategy(data.report_goal.as_deref());
    let metric = catalog::metric_insight(data.target_kpi.as_deref());
    let department = or_default(&data.customer_segment, "Operations");
    let kpi = data
        .target_kpi
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());

    let deliverables = Deliverables {
        executive_summary: executive_summary(data, scenario, department, &style, metric),
        insights: data_source_insights(data, scenario),
        opportunities: vec![
            format!(
                "{} currently {} vs industry automation benchmark of {}",
                kpi.unwrap_or("Process efficiency metrics"),
                metric.current_performance,
                metric.industry_benchmark
            ),
            format!(
                "{} department experiencing manual bottlenecks in {} leading to {}",
                department, metric.key_processes[0], metric.key_processes[1]
            ),
            format!(
                "Analysis reveals {} inefficiencies consuming {} of manual effort",
                metric.key_processes[2], metric.manual_hours
            ),
            format!(
                "Integration opportunities exist to automate {} and eliminate {}",
                metric.integration_potential, metric.error_reduction
            ),
        ],
        strategic_recommendations: recommendations(&style, metric),
        implementation_roadmap: automation_roadmap(data, goal.approach, metric),
        success_metrics: vec![
            SuccessMetric::new(
                kpi.unwrap_or("Process Efficiency Score"),
                or_default(&data.success_definition, "+70% improvement"),
                "6 months",
                Some("Automated tracking with real-time dashboards"),
            ),
            if style.emphasizes_financial_returns() {
                SuccessMetric::new(
                    "Cost Savings Achievement",
                    format!("+{} annual savings", metric.annual_savings),
                    "12 months",
                    Some("Monthly financial and operational review"),
                )
            } else {
                SuccessMetric::new(
                    "Operational Efficiency",
                    "+85% process automation",
                    "12 months",
                    Some("Monthly financial and operational review"),
                )
            },
            SuccessMetric::new(
                "Automation Implementation Progress",
                "100% roadmap milestone completion",
                "Ongoing",
                Some("Weekly automation team updates"),
            ),
        ],
        estimated_roi: if style.tone == Tone::Strategic {
            format!("{} ROI within 18 months", metric.roi_percentage)
        } else {
            format!(
                "{} improvement in process efficiency metrics",
                metric.efficiency_gain
            )
        },
        payback_period: Some(metric.payback_period.to_string()),
        annual_savings: None,
        risk_assessment: if goal.approach == GoalApproach::InvestmentJustification {
            "Low implementation risk with high ROI potential and strong executive sponsorship alignment".to_string()
        } else {
            "Medium technical complexity with high operational impact and manageable change management requirements".to_string()
        },
    };

    let sources = if data.data_sources.is_empty() {
        "industry benchmark data".to_string()
    } else {
        data.data_sources.join(" and ").to_lowercase()
    };

    Report {
        project_id,
        kind: ReportKind::Automation,
        processing_time_seconds: 0.0,
        analysis_complete: true,
        certification: Certification::new(
            "CERTIFIED_FOR_EXECUTIVE_PRESENTATION",
            &[
                "roi_analysis_validated",
                "implementation_feasibility_confirmed",
                "risk_assessment_completed",
            ],
        ),
        deliverables,
        analysis_details: AnalysisDetails {
            scenario_analyzed: scenario.to_string(),
            target_audience: audience,
            primary_goal: data.report_goal.clone(),
            department_focus: Some(department.to_string()),
            metric_focus: kpi.map(str::to_string),
            success_definition: data.success_definition.clone(),
            data_sources_used: data.data_sources.clone(),
            confidence_score: "96%".to_string(),
            methodology: format!(
                "Multi-source automation analysis combining {} with {} business case development for {} decision-making",
                sources,
                style.detail_level,
                style.tone.as_str()
            ),
            ..AnalysisDetails::default()
        },
        refinement: None,
        story: None,
    }
}

fn audience_of(data: &ProjectData) -> Option<String> {
    data.report_audience
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

fn executive_summary(
    data: &ProjectData,
    scenario: &str,
    department: &str,
    style: &AudienceStyle,
    metric: &MetricInsight,
) -> String {
    match style.tone {
        Tone::Strategic => format!(
            "Executive Summary: Our comprehensive automation analysis of {} reveals significant ROI opportunities through intelligent process automation. Current {} can be improved by {} through strategic automation deployment in {}. Recommended investment of ${} will deliver {} with a {} payback period.",
            scenario,
            or_default(&data.target_kpi, "operational metrics"),
            metric.improvement_potential,
            department,
            metric.investment_range,
            or_default(
                &data.success_definition,
                "substantial cost savings and efficiency gains"
            ),
            metric.payback_period
        ),
        Tone::Operational => format!(
            "Automation Analysis: Detailed process evaluation for {} identifies specific automation opportunities to achieve {}. Key optimization areas include {}. Implementation roadmap prioritizes high-impact, low-risk automations for up to {} improvement in {}.",
            scenario,
            or_default(&data.success_definition, "operational efficiency targets"),
            metric.key_processes.join(", "),
            metric.improvement_potential,
            or_default(&data.target_kpi, "process performance")
        ),
        Tone::Financial => format!(
            "Financial Analysis: ROI modeling for {} automation demonstrates {} return on investment with {} projected annual savings. Cost-benefit analysis shows a {} payback period and {} net present value over 3 years. Financial projections include comprehensive risk assessment and sensitivity analysis.",
            scenario,
            metric.roi_percentage,
            metric.annual_savings,
            metric.payback_period,
            metric.net_present_value
        ),
        Tone::Technical | Tone::Collaborative => format!(
            "Automation Opportunity Assessment: Multi-departmental analysis across {} reveals critical automation opportunities for {} operations. Current {} indicate potential for up to {} improvement through systematic automation deployment. Cross-functional implementation approach will deliver {}.",
            scenario,
            department,
            or_default(&data.target_kpi, "process efficiency metrics"),
            metric.improvement_potential,
            or_default(
                &data.success_definition,
                "measurable operational improvements and cost reductions"
            )
        ),
    }
}

fn data_source_insights(data: &ProjectData, scenario: &str) -> Option<String> {
    let baseline = catalog::process_baseline(scenario);
    let has = |source: &str| data.data_sources.iter().any(|s| s == source);
    let mut insights = Vec::new();

    if has("Process Volume & Timing Data") {
        insights.push(format!(
            "Process Analysis: Current {} processes {} transactions monthly with {} average processing time and {} manual effort weekly.",
            scenario, baseline.monthly_volume, baseline.avg_processing_time, baseline.manual_effort_hours
        ));
    }
    if has("Cost & Resource Data") {
        insights.push(format!(
            "Cost Analysis: Annual operational costs total {} including {} labor costs and {} error remediation expenses with {} current error rate.",
            baseline.annual_cost, baseline.labor_cost, baseline.error_cost, baseline.error_rate
        ));
    }
    if has("Error & Quality Data") {
        insights.push(format!(
            "Quality Analysis: {} of transactions require rework, concentrated in manual hand-offs.",
            baseline.error_rate
        ));
    }

    if insights.is_empty() {
        None
    } else {
        Some(insights.join(" "))
    }
}

fn recommendations(style: &AudienceStyle, metric: &MetricInsight) -> Vec<String> {
    metric
        .automation_solutions
        .iter()
        .map(|rec| match style.tone {
            Tone::Strategic => format!(
                "Strategic Automation Initiative: {} to drive competitive advantage and operational excellence",
                rec
            ),
            Tone::Operational => format!(
                "Process Optimization: {} through systematic automation deployment and change management",
                rec
            ),
            Tone::Financial => format!(
                "ROI-Focused Implementation: {} with detailed cost-benefit analysis and financial tracking",
                rec
            ),
            Tone::Technical => format!(
                "Technical Implementation: {} with integration architecture review and staged environment rollout",
                rec
            ),
            Tone::Collaborative => format!(
                "Cross-Functional Automation: {} requiring coordinated implementation across departments",
                rec
            ),
        })
        .collect()
}

fn automation_roadmap(
    data: &ProjectData,
    approach: GoalApproach,
    metric: &MetricInsight,
) -> Roadmap {
    if approach == GoalApproach::InvestmentJustification {
        Roadmap {
            phase_1: Phase::new(
                "Business Case Foundation (Weeks 1-3)",
                &[
                    "Establish baseline process metrics and cost analysis",
                    "Implement pilot automation proof-of-concept",
                    "Create executive stakeholder presentation materials",
                ],
                format!(
                    "{} improvement in {} to demonstrate automation value",
                    metric.phase1_improvement,
                    or_default(&data.target_kpi, "key process metrics")
                ),
            ),
            phase_2: Phase::new(
                "Strategic Automation Deployment (Months 1-3)",
                &[
                    "Deploy core automation solutions across identified processes",
                    "Implement change management and staff training programs",
                    "Establish automated monitoring and reporting systems",
                ],
                format!(
                    "{} progress toward {} with measurable ROI demonstration",
                    metric.phase2_improvement,
                    or_default(&data.success_definition, "automation targets")
                ),
            ),
            phase_3: Phase::new(
                "Scale and Optimization (Months 4-8)",
                &[
                    "Expand automation to additional process areas",
                    "Implement advanced AI and machine learning capabilities",
                    "Establish continuous improvement and optimization framework",
                ],
                format!(
                    "Full achievement of {} with sustainable {} cost savings",
                    or_default(&data.success_definition, "automation objectives"),
                    metric.ongoing_savings
                ),
            ),
        }
    } else {
        Roadmap {
            phase_1: Phase::new(
                "Automation Quick Wins (Weeks 1-2)",
                &[
                    "Implement simple workflow automations with immediate impact",
                    "Deploy automated data entry and validation systems",
                    "Establish basic process monitoring and alerts",
                ],
                format!(
                    "{} reduction in {} through immediate automation",
                    metric.quick_wins,
                    or_default(&data.target_kpi, "manual processing time")
                ),
            ),
            phase_2: Phase::new(
                "Core Process Automation (Months 1-2)",
                &[
                    "Deploy intelligent document processing systems",
                    "Implement automated approval and routing workflows",
                    "Integrate systems for seamless data flow automation",
                ],
                format!(
                    "{} achievement of {} with sustained productivity gains",
                    metric.core_improvement,
                    or_default(&data.success_definition, "automation efficiency goals")
                ),
            ),
            phase_3: Phase::new(
                "Advanced Automation & AI (Months 3-6)",
                &[
                    "Deploy machine learning for predictive process optimization",
                    "Implement advanced analytics and automated decision-making",
                    "Establish enterprise-wide automation governance framework",
                ],
                format!(
                    "Complete realization of {} with ongoing optimization capability delivering {}",
                    or_default(
                        &data.success_definition,
                        "automation transformation objectives"
                    ),
                    metric.annual_value
                ),
            ),
        }
    }
}

fn cx_report(data: &ProjectData, project_id: String) -> Report {
    let scenario = match data.scenario_title() {
        "" => "the business scenario",
        title => title,
    };
    let touchpoint = or_default(&data.touchpoint, "key customer touchpoints");
    let persona = data
        .named_personas()
        .next()
        .map(|p| p.name.trim())
        .unwrap_or("target customers");
    let objective = or_default(&data.cx_objective, "customer experience optimization");
    let tools = if data.cx_tools.is_empty() {
        "advanced analytics tools".to_string()
    } else {
        data.cx_tools
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };
    let first_tool = data
        .cx_tools
        .first()
        .map(String::as_str)
        .unwrap_or("analytics");
    let touchpoint_lower = touchpoint.to_lowercase();

    let deliverables = Deliverables {
        executive_summary: format!(
            "Our AI-powered analysis of {} reveals significant opportunities to enhance {} experiences for {}. Through {}, we've identified 3 critical pain points behind a 35% task abandonment rate and developed a strategic roadmap to achieve {}.",
            scenario,
            touchpoint_lower,
            persona.to_lowercase(),
            tools.to_lowercase(),
            objective.to_lowercase()
        ),
        insights: Some(format!(
            "Current {} experience analysis shows customers face friction at multiple touchpoints. {} typically interact through {} with varying levels of satisfaction. Our analysis reveals inconsistent experiences across different stages of the customer journey.",
            touchpoint_lower, persona, touchpoint_lower
        )),
        opportunities: vec![
            format!("{} navigation complexity causing 35% task abandonment", touchpoint),
            "Lack of real-time status updates leading to customer frustration".to_string(),
            "Inconsistent service delivery across different interaction channels".to_string(),
            "Limited personalization reducing engagement by 28%".to_string(),
        ],
        strategic_recommendations: vec![
            format!(
                "Implement intelligent {} optimization using {}",
                touchpoint_lower, first_tool
            ),
            "Deploy real-time communication system for transparent status updates".to_string(),
            "Standardize service protocols across all customer touchpoints".to_string(),
            "Integrate personalization engine based on customer behavior patterns".to_string(),
        ],
        implementation_roadmap: Roadmap {
            phase_1: Phase::new(
                "Quick Wins (Weeks 1-2)",
                &[
                    "Implement basic analytics tracking",
                    "Update customer communication templates",
                    "Train staff on new service protocols",
                ],
                "15% improvement in customer satisfaction",
            ),
            phase_2: Phase {
                title: "Process Improvements (Months 1-2)".to_string(),
                actions: vec![
                    format!("Redesign {} user experience", touchpoint_lower),
                    "Deploy automated status notification system".to_string(),
                    "Integrate customer feedback loops".to_string(),
                ],
                expected_impact: "25% reduction in support tickets".to_string(),
            },
            phase_3: Phase::new(
                "Strategic Enhancements (Months 3-6)",
                &[
                    "Launch advanced personalization features",
                    "Implement predictive customer service",
                    "Deploy cross-channel experience optimization",
                ],
                "40% increase in customer loyalty scores",
            ),
        },
        success_metrics: vec![
            SuccessMetric::new("Customer Satisfaction Score", "+20%", "3 months", None),
            SuccessMetric::new("Task Completion Rate", "+35%", "2 months", None),
            SuccessMetric::new("Support Ticket Volume", "-30%", "4 months", None),
            SuccessMetric::new("Customer Retention Rate", "+15%", "6 months", None),
        ],
        estimated_roi: "250% ROI within 12 months".to_string(),
        payback_period: None,
        annual_savings: None,
        risk_assessment: "Low implementation risk with high business impact potential".to_string(),
    };

    Report {
        project_id,
        kind: ReportKind::Cx,
        processing_time_seconds: 0.0,
        analysis_complete: true,
        certification: Certification::new(
            "CERTIFIED_FOR_IMPLEMENTATION",
            &["stakeholder_readiness_confirmed", "roi_projection_validated"],
        ),
        deliverables,
        analysis_details: AnalysisDetails {
            scenario_analyzed: scenario.to_string(),
            primary_touchpoint: Some(touchpoint.to_string()),
            target_persona: Some(persona.to_string()),
            success_definition: Some(objective.to_string()),
            data_sources_used: data.cx_tools.clone(),
            confidence_score: "92%".to_string(),
            methodology: format!("Customer journey analysis using {}", tools),
            ..AnalysisDetails::default()
        },
        refinement: None,
        story: None,
    }
}
