use super::{Report, StoryContent};
use crate::project::ReportKind;
use std::fmt::Write;

pub fn report_filename(report: &Report) -> String {
    format!("{}.txt", report.project_id)
}

/// Plain-text rendering offered as a download
pub fn render_text(report: &Report) -> String {
    let d = &report.deliverables;
    let details = &report.analysis_details;
    let mut out = String::new();

    let heading = match report.kind {
        ReportKind::Automation => "AUTOMATION BUSINESS CASE",
        ReportKind::Cx => "CUSTOMER EXPERIENCE ANALYSIS",
        ReportKind::Story => "STORY REWRITE",
    };
    // writeln! into a String cannot fail
    let _ = writeln!(out, "{}", heading);
    let _ = writeln!(out, "{}", "=".repeat(heading.len()));
    let _ = writeln!(out, "Project: {}", report.project_id);
    let _ = writeln!(out, "Scenario: {}", details.scenario_analyzed);
    let _ = writeln!(out, "Certification: {}", report.certification.status);
    if let Some(audience) = &details.target_audience {
        let _ = writeln!(out, "Audience: {}", audience);
    }
    if let Some(complexity) = &details.complexity_level {
        let _ = writeln!(out, "Complexity: {}", complexity);
    }

    section(&mut out, "Executive Summary");
    let _ = writeln!(out, "{}", d.executive_summary);

    if let Some(story) = &report.story {
        render_story(&mut out, story);
    }

    if let Some(insights) = &d.insights {
        section(&mut out, "Key Insights");
        let _ = writeln!(out, "{}", insights);
    }

    section(
        &mut out,
        match report.kind {
            ReportKind::Automation => "Automation Opportunities",
            ReportKind::Cx => "Pain Points",
            ReportKind::Story => "Story Elements",
        },
    );
    for item in &d.opportunities {
        let _ = writeln!(out, "- {}", item);
    }

    section(&mut out, "Strategic Recommendations");
    for (i, rec) in d.strategic_recommendations.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, rec);
    }

    section(&mut out, "Implementation Roadmap");
    for phase in d.implementation_roadmap.phases() {
        let _ = writeln!(out, "{}", phase.title);
        for action in &phase.actions {
            let _ = writeln!(out, "  - {}", action);
        }
        let _ = writeln!(out, "  Expected impact: {}", phase.expected_impact);
    }

    section(&mut out, "Success Metrics");
    for m in &d.success_metrics {
        let _ = write!(out, "- {}: {} ({})", m.metric, m.target, m.timeframe);
        if let Some(how) = &m.measurement {
            let _ = write!(out, " - {}", how);
        }
        out.push('\n');
    }

    if report.kind != ReportKind::Story {
        section(&mut out, "Financials");
        let _ = writeln!(out, "Estimated ROI: {}", d.estimated_roi);
        if let Some(payback) = &d.payback_period {
            let _ = writeln!(out, "Payback period: {}", payback);
        }
        if let Some(savings) = &d.annual_savings {
            let _ = writeln!(out, "Annual savings: {}", savings);
        }

        section(&mut out, "Risk Assessment");
        let _ = writeln!(out, "{}", d.risk_assessment);
    }

    if let Some(note) = &report.refinement {
        section(&mut out, "Refinement");
        let _ = writeln!(out, "Request: {}", note.user_input_analyzed);
        let _ = writeln!(out, "Type: {}", note.refinement_type);
        if !note.rules_applied.is_empty() {
            let _ = writeln!(out, "Adjusted for: {}", note.rules_applied.join(", "));
        }
    }

    section(&mut out, "Methodology");
    let _ = writeln!(out, "{}", details.methodology);
    let _ = writeln!(out, "Confidence: {}", details.confidence_score);
    out
}

fn render_story(out: &mut String, story: &StoryContent) {
    section(out, "Story");
    let _ = writeln!(out, "{}", story.narrative_text);
    let _ = writeln!(
        out,
        "\n{} words, {} reading level, revision {}",
        story.word_count, story.reading_level, story.revision
    );
    if let Some(insights) = &story.collaboration {
        section(out, "AI Collaboration");
        for lesson in &insights.ai_literacy_lessons {
            let _ = writeln!(out, "- {}", lesson);
        }
        let _ = writeln!(out, "Think about:");
        for point in &insights.critical_thinking_points {
            let _ = writeln!(out, "- {}", point);
        }
    }
}

fn section(out: &mut String, title: &str) {
    let _ = write!(out, "\n{}\n{}\n", title, "-".repeat(title.len()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectData;
    use crate::report::{generate_report_with_id, refine_report};

    #[test]
    fn test_render_includes_every_section() {
        let mut data = ProjectData::new(ReportKind::Automation);
        data.business_scenario = "Invoice Processing - Finance".into();
        let report = generate_report_with_id(&data, "AUTO-20250101-abcdef".into());
        let text = render_text(&report);

        assert!(text.starts_with("AUTOMATION BUSINESS CASE\n"));
        assert!(text.contains("Project: AUTO-20250101-abcdef"));
        for heading in [
            "Executive Summary",
            "Strategic Recommendations",
            "Implementation Roadmap",
            "Success Metrics",
            "Risk Assessment",
        ] {
            assert!(text.contains(heading), "missing {}", heading);
        }
        assert!(!text.contains("Refinement\n"));
        assert_eq!(report_filename(&report), "AUTO-20250101-abcdef.txt");
    }

    #[test]
    fn test_render_story_skips_financials() {
        let mut data = ProjectData::new(ReportKind::Story);
        data.story.book_title = "Treasure Island".into();
        data.story.setting = Some("Modern City".into());
        data.story.ai_education_mode = true;
        let report = generate_report_with_id(&data, "STY-20250612-demo12".into());
        let text = render_text(&report);

        assert!(text.starts_with("STORY REWRITE\n"));
        assert!(text.contains("In the modern city,"));
        assert!(text.contains("reading level, revision 1"));
        assert!(text.contains("AI Collaboration"));
        assert!(text.contains("Story Elements"));
        assert!(!text.contains("Financials"));
        assert!(!text.contains("Risk Assessment"));
        assert_eq!(report_filename(&report), "STY-20250612-demo12.txt");
    }

    #[test]
    fn test_render_refined_report_lists_rules() {
        let data = ProjectData::new(ReportKind::Cx);
        let report = generate_report_with_id(&data, "CX-1".into());
        let refined = refine_report(&report, "budget and metrics");
        let text = render_text(&refined);
        assert!(text.starts_with("CUSTOMER EXPERIENCE ANALYSIS"));
        assert!(text.contains("Pain Points"));
        assert!(text.contains("Adjusted for: budget, metrics"));
    }
}
