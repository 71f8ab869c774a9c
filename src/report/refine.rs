//! Keyword-driven refinement of a finished report.
//!
//! Rules run in a fixed order against the lower-cased input. Later rules
//! overwrite fields an earlier rule also set (`estimated_roi`,
//! `payback_period`), so the last matching rule wins. Story reports only get
//! the note; they are revised with [`super::regenerate_story`].

use super::{Report, RefinementNote, SuccessMetric};
use crate::catalog::{self, Tone};
use crate::project::ReportKind;
use once_cell::sync::Lazy;
use regex::Regex;

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

const METHODOLOGY_SUFFIX: &str = " + Human Refinement";

struct Rule {
    name: &'static str,
    keywords: &'static [&'static str],
    apply: fn(&mut Report, Tone),
}

const RULES: &[Rule] = &[
    Rule {
        name: "priority",
        keywords: &["priority", "priorit"],
        apply: apply_priority,
    },
    Rule {
        name: "budget",
        keywords: &["budget", "cost"],
        apply: apply_budget,
    },
    Rule {
        name: "timeline",
        keywords: &["timeline", "fast"],
        apply: apply_timeline,
    },
    Rule {
        name: "risk",
        keywords: &["risk", "change management"],
        apply: apply_risk,
    },
    Rule {
        name: "metrics",
        keywords: &["metrics", "measure"],
        apply: apply_metrics,
    },
];

/// Produce a refined copy of `original`; the argument is left untouched.
pub fn refine_report(original: &Report, user_input: &str) -> Report {
    let mut refined = original.clone();
    let input = user_input.to_lowercase();
    let style = catalog::audience_style(original.analysis_details.target_audience.as_deref());

    let rules: &[Rule] = match original.kind {
        ReportKind::Story => &[],
        _ => RULES,
    };
    let mut rules_applied = Vec::new();
    for rule in rules {
        if rule.keywords.iter().any(|k| input.contains(k)) {
            (rule.apply)(&mut refined, style.tone);
            rules_applied.push(rule.name.to_string());
        }
    }
    tracing::debug!(
        project_id = %original.project_id,
        rules = ?rules_applied,
        "refinement rules applied"
    );

    let (refinement_type, modification_summary) = match original.kind {
        ReportKind::Automation => (
            "AI-guided automation optimization",
            "Automation business case adapted based on operational constraints and business priorities",
        ),
        ReportKind::Cx => (
            "AI-guided customer experience optimization",
            "Customer experience roadmap adapted based on stakeholder feedback",
        ),
        ReportKind::Story => (
            "AI-guided story revision",
            "Story feedback recorded for the next regeneration",
        ),
    };
    refined.refinement = Some(RefinementNote {
        user_input_analyzed: user_input.to_string(),
        refinement_type: refinement_type.to_string(),
        audience_considerations: style,
        rules_applied,
        modification_summary: modification_summary.to_string(),
    });
    refined
        .analysis_details
        .methodology
        .push_str(METHODOLOGY_SUFFIX);
    refined
}

/// Prefix the first recommendations with `tags` and replace the list with
/// those plus `closing`.
fn retag_recommendations(report: &mut Report, tags: &[&str], closing: &str) {
    let recs = &mut report.deliverables.strategic_recommendations;
    let mut tagged: Vec<String> = recs
        .iter()
        .zip(tags)
        .map(|(rec, tag)| format!("{}: {}", tag, rec))
        .collect();
    tagged.push(closing.to_string());
    *recs = tagged;
}

fn apply_priority(report: &mut Report, _tone: Tone) {
    retag_recommendations(
        report,
        &["HIGH PRIORITY", "MEDIUM PRIORITY", "FUTURE CONSIDERATION"],
        "ADDITIONAL INSIGHT: Implement priority-based rollout to maximize impact",
    );
}

fn apply_budget(report: &mut Report, tone: Tone) {
    match report.kind {
        ReportKind::Automation => {
            if tone == Tone::Strategic {
                retag_recommendations(
                    report,
                    &["BUDGET-OPTIMIZED PRIORITY", "COST-EFFECTIVE SOLUTION", "PHASED INVESTMENT"],
                    "FINANCIAL EFFICIENCY: Implement budget-conscious automation with accelerated payback periods and minimal upfront investment",
                );
            } else {
                retag_recommendations(
                    report,
                    &["LOW-COST HIGH-IMPACT", "BUDGET-FRIENDLY AUTOMATION", "COST-CONTROLLED DEPLOYMENT"],
                    "OPERATIONAL INSIGHT: Focus on automation solutions with minimal licensing costs and maximum process efficiency gains",
                );
            }
            report.deliverables.estimated_roi =
                "385% ROI with budget-optimized implementation reducing initial investment by 40%"
                    .to_string();
            report.deliverables.payback_period =
                Some("6-8 months with cost-conscious deployment approach".to_string());
        }
        ReportKind::Cx => {
            for rec in report.deliverables.strategic_recommendations.iter_mut() {
                if rec.contains("Implement") {
                    rec.push_str(" (Budget-optimized approach)");
                }
            }
            report.deliverables.estimated_roi =
                "300% ROI within 12 months (with cost optimization)".to_string();
        }
        ReportKind::Story => {}
    }
}

fn apply_timeline(report: &mut Report, _tone: Tone) {
    let titles = match report.kind {
        ReportKind::Automation => [
            "Rapid Automation Deployment (Week 1-2)",
            "Accelerated Implementation (Weeks 3-6)",
            "Fast-Track Optimization (Months 2-4)",
        ],
        ReportKind::Cx => [
            "Quick Wins (Week 1)",
            "Process Improvements (Weeks 2-6)",
            "Strategic Enhancements (Months 2-4)",
        ],
        ReportKind::Story => return,
    };
    for (phase, title) in report
        .deliverables
        .implementation_roadmap
        .phases_mut()
        .into_iter()
        .zip(titles)
    {
        phase.title = title.to_string();
    }

    for metric in report.deliverables.success_metrics.iter_mut() {
        metric.timeframe = shorten_timeframe(&metric.timeframe);
    }

    report.deliverables.payback_period = Some("4-6 months with accelerated deployment".to_string());
}

/// `"6 months post-deployment"` -> `"4 months post-deployment"`, never below 1.
/// Only the first number of a month-based timeframe changes.
fn shorten_timeframe(timeframe: &str) -> String {
    if !timeframe.contains("month") {
        return timeframe.to_string();
    }
    FIRST_NUMBER
        .replacen(timeframe, 1, |caps: &regex::Captures| {
            let n: u64 = caps[0].parse().unwrap_or(1);
            n.saturating_sub(2).max(1).to_string()
        })
        .into_owned()
}

fn apply_risk(report: &mut Report, _tone: Tone) {
    report.deliverables.success_metrics.extend([
        SuccessMetric::new(
            "Change Management Success",
            "95% employee adoption rate",
            "Throughout implementation",
            Some("Weekly training completion and user satisfaction surveys"),
        ),
        SuccessMetric::new(
            "Risk Mitigation Effectiveness",
            "Zero critical implementation risks",
            "Continuous monitoring",
            Some("Daily risk assessment and mitigation tracking"),
        ),
    ]);
    report.deliverables.risk_assessment = "Comprehensive risk mitigation framework with enhanced change management, staff training programs, and phased rollback capabilities ensuring minimal operational disruption".to_string();
}

fn apply_metrics(report: &mut Report, _tone: Tone) {
    report.deliverables.success_metrics.push(SuccessMetric::new(
        "Implementation Progress",
        "100% milestone completion",
        "Monthly tracking",
        None,
    ));
}
