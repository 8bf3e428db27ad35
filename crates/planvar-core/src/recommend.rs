//! Rule-based recommendation engine
//!
//! Three independent rule groups are evaluated for every stage:
//!
//! | Group | Input | Branches |
//! |-------|-------|----------|
//! | Schedule | ΔT | `> major` delay (major), `(0, major]` delay (minor), `< 0` lead, `0` nothing |
//! | Budget | ΔC | `> major` overrun (major), `(0, major]` overrun (minor), `< 0` saving, `0` nothing |
//! | Efficiency | E | `< -band` low, `> band` high, otherwise normal |
//!
//! Comparisons are made on the rounded metric values, so a stage showing
//! exactly `10.00 %` is a minor delay and one showing `-0.10` is normal.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::Thresholds;
use crate::metrics::DisplayedMetrics;
use crate::{AnalysisError, Category, MetricsRecord, RecommendationRecord, Severity};

/// Build recommendations for every stage, in stage order.
///
/// Within a stage the order is schedule, budget, efficiency. An undefined
/// metric makes its group emit nothing.
pub fn build_recommendations(
    metrics: &[MetricsRecord],
    thresholds: &Thresholds,
) -> Vec<RecommendationRecord> {
    let mut out = Vec::with_capacity(metrics.len() * 2);
    for m in metrics {
        evaluate_stage(
            &m.stage_name,
            m.schedule_deviation_pct,
            m.budget_deviation_pct,
            m.resource_efficiency,
            thresholds,
            &mut out,
        );
    }
    debug!(count = out.len(), "built recommendations");
    out
}

/// Build recommendations from metrics in displayed form.
///
/// Fails with `AnalysisError::Format` if a value is not numeric once its
/// `%` suffix is stripped.
pub fn build_recommendations_from_table(
    rows: &[DisplayedMetrics],
    thresholds: &Thresholds,
) -> Result<Vec<RecommendationRecord>, AnalysisError> {
    let parsed = rows
        .iter()
        .map(|row| row.parse().map(|values| (row.stage_name.as_str(), values)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(parsed.len() * 2);
    for (stage, (delta_t, delta_c, efficiency)) in parsed {
        evaluate_stage(stage, delta_t, delta_c, efficiency, thresholds, &mut out);
    }
    Ok(out)
}

fn evaluate_stage(
    stage: &str,
    delta_t: Option<Decimal>,
    delta_c: Option<Decimal>,
    efficiency: Option<Decimal>,
    thresholds: &Thresholds,
    out: &mut Vec<RecommendationRecord>,
) {
    match delta_t {
        Some(d) => out.extend(schedule_rule(stage, d, thresholds)),
        None => warn!(stage, "ΔT undefined, schedule rules skipped"),
    }
    match delta_c {
        Some(c) => out.extend(budget_rule(stage, c, thresholds)),
        None => warn!(stage, "ΔC undefined, budget rules skipped"),
    }
    match efficiency {
        Some(e) => out.push(efficiency_rule(stage, e, thresholds)),
        None => warn!(stage, "E undefined, efficiency rules skipped"),
    }
}

fn record(
    stage: &str,
    category: Category,
    severity: Severity,
    problem: String,
    cause: &str,
    action: &str,
    effect: String,
) -> RecommendationRecord {
    RecommendationRecord {
        stage_name: stage.to_string(),
        category,
        severity,
        problem_summary: problem,
        cause_hypothesis: cause.to_string(),
        recommended_action: action.to_string(),
        expected_effect: effect,
    }
}

fn schedule_rule(stage: &str, d: Decimal, t: &Thresholds) -> Option<RecommendationRecord> {
    let projected = d * t.projection_factor;
    if d > t.major_pct {
        Some(record(
            stage,
            Category::ScheduleDelay,
            Severity::Major,
            format!("Schedule delay: {:.2}% over plan", d),
            "Significant overrun of the stage duration. Possible causes: resource shortage, \
             supply delays, planning errors.",
            "Analyse the causes of the delay: check that all required resources are available, \
             review supplier performance and revise the schedule. Consider adding staff or \
             redistributing tasks between team members.",
            format!("Expected delay reduction: from {:.2}% to {:.2}%", d, projected),
        ))
    } else if d > Decimal::ZERO {
        Some(record(
            stage,
            Category::ScheduleDelay,
            Severity::Minor,
            format!("Minor delay: {:.2}% over plan", d),
            "Slight overrun of the stage duration. Possible causes: minor organisational \
             disruptions, weather, inefficient task allocation.",
            "Hold a short team meeting, adjust priorities and, if needed, temporarily extend \
             working hours or bring in extra resources.",
            format!("Expected delay reduction: from {:.2}% to {:.2}%", d, projected),
        ))
    } else if d < Decimal::ZERO {
        Some(record(
            stage,
            Category::ScheduleLead,
            Severity::None,
            format!("Ahead of schedule: finished {:.2}% faster", -d),
            "Work completed ahead of schedule. Possible causes: high team motivation, \
             process optimisation.",
            "Record the practices that worked, reward the team and consider moving the freed \
             resources to other stages or projects.",
            format!("Acceleration potential for other stages: up to {:.2}%", -d),
        ))
    } else {
        None
    }
}

fn budget_rule(stage: &str, c: Decimal, t: &Thresholds) -> Option<RecommendationRecord> {
    let projected = c * t.projection_factor;
    if c > t.major_pct {
        Some(record(
            stage,
            Category::BudgetOverrun,
            Severity::Major,
            format!("Budget overrun: {:.2}% over plan", c),
            "Substantial budget overrun. Possible causes: price increases, additional work, \
             estimate errors.",
            "Run a detailed cost analysis, identify the overspent items and agree a budget \
             correction with management. Review supplier contracts and consider alternative \
             procurement options.",
            format!("Expected overrun reduction: from {:.2}% to {:.2}%", c, projected),
        ))
    } else if c > Decimal::ZERO {
        Some(record(
            stage,
            Category::BudgetOverrun,
            Severity::Minor,
            format!("Moderate budget overrun: {:.2}% over plan", c),
            "Moderate budget overrun. Possible causes: small additional expenses, adjustments \
             during execution.",
            "Reconcile the estimate, optimise purchasing, revisit contract terms and keep \
             spending under control in the following stages.",
            format!("Expected overrun reduction: from {:.2}% to {:.2}%", c, projected),
        ))
    } else if c < Decimal::ZERO {
        Some(record(
            stage,
            Category::BudgetSaving,
            Severity::None,
            format!("Budget saving: costs {:.2}% below plan", -c),
            "Budget saving. Possible causes: discounts, optimised purchasing, effective \
             management.",
            "Record the decisions that worked and consider reallocating the savings to other \
             stages or projects.",
            format!("Savings potential: {:.2}%", -c),
        ))
    } else {
        None
    }
}

fn efficiency_rule(stage: &str, e: Decimal, t: &Thresholds) -> RecommendationRecord {
    if e < -t.efficiency_band {
        record(
            stage,
            Category::EfficiencyLow,
            Severity::None,
            format!("Low resource efficiency: {:.2} (below normal)", e),
            "Low resource utilisation. Possible causes: idle equipment, uneven staff workload.",
            "Audit resource loading, find and remove bottlenecks, and rework the schedule to \
             spread the load evenly.",
            "Expected efficiency growth: back to normal".to_string(),
        )
    } else if e > t.efficiency_band {
        record(
            stage,
            Category::EfficiencyHigh,
            Severity::None,
            format!("High resource efficiency: {:.2} (above normal)", e),
            "High resource utilisation. Possible causes: sound planning, process automation.",
            "Apply the effective approaches to other stages, reward the team and adopt the \
             best practices in future projects.",
            "Opportunity to replicate successful practices".to_string(),
        )
    } else {
        record(
            stage,
            Category::EfficiencyNormal,
            Severity::None,
            format!("Resource efficiency within normal range: {:.2}", e),
            "Resource efficiency is within the normal range.",
            "No action required. Continue according to the current plan.",
            "Stable progress, no changes required".to_string(),
        )
    }
}
