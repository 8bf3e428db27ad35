//! Metrics engine
//!
//! Derives per-stage schedule, budget and efficiency metrics from a plan.
//!
//! | Metric | Formula | Undefined when |
//! |--------|---------|----------------|
//! | ΔT | `(actual_days - planned_days) / planned_days * 100` | `planned_days == 0` |
//! | ΔC | `(actual_budget - planned_budget) / planned_budget * 100` | `planned_budget == 0` |
//! | E  | `1 - planned_days / actual_days` | `actual_days == 0` |
//!
//! All three are computed in decimal arithmetic and rounded to two places,
//! half away from zero. Undefined ratios follow the configured
//! [`ZeroDivisionPolicy`].

use rayon::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{EngineConfig, ZeroDivisionPolicy};
use crate::{AnalysisError, Metric, MetricsRecord, StageName, StageRecord};

/// Decimal places kept for every ratio metric
pub const METRIC_SCALE: u32 = 2;

/// Text used for an undefined metric in displayed tables
pub const UNDEFINED: &str = "n/a";

/// Compute metrics for every stage, in input order.
///
/// Fails atomically: on error no metrics are returned.
pub fn compute_metrics(
    stages: &[StageRecord],
    config: &EngineConfig,
) -> Result<Vec<MetricsRecord>, AnalysisError> {
    for stage in stages {
        stage.validate()?;
    }

    let metrics = stages
        .iter()
        .map(|stage| stage_metrics(stage, config.division_policy))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(stages = metrics.len(), "computed stage metrics");
    Ok(metrics)
}

/// Compute metrics for several independent projects in parallel.
///
/// Each project succeeds or fails on its own; results are in input order.
pub fn compute_metrics_batch(
    projects: &[Vec<StageRecord>],
    config: &EngineConfig,
) -> Vec<Result<Vec<MetricsRecord>, AnalysisError>> {
    projects
        .par_iter()
        .map(|stages| compute_metrics(stages, config))
        .collect()
}

fn stage_metrics(
    stage: &StageRecord,
    policy: ZeroDivisionPolicy,
) -> Result<MetricsRecord, AnalysisError> {
    let planned_days = stage.planned_days();
    let actual_days = stage.actual_days();
    let planned = Decimal::from(planned_days);
    let actual = Decimal::from(actual_days);

    let schedule_deviation_pct = guard(
        stage,
        Metric::ScheduleDeviation,
        policy,
        planned,
        percent_change(planned, actual),
    )?;
    let budget_deviation_pct = guard(
        stage,
        Metric::BudgetDeviation,
        policy,
        stage.planned_budget,
        percent_change(stage.planned_budget, stage.actual_budget),
    )?;
    let resource_efficiency = guard(
        stage,
        Metric::ResourceEfficiency,
        policy,
        actual,
        planned
            .checked_div(actual)
            .and_then(|ratio| Decimal::ONE.checked_sub(ratio))
            .map(round),
    )?;
    let budget_deviation = stage
        .actual_budget
        .checked_sub(stage.planned_budget)
        .ok_or_else(|| out_of_range(stage, Metric::BudgetDeviation))?;

    debug!(
        stage = %stage.name,
        planned_days,
        actual_days,
        delta_t = ?schedule_deviation_pct,
        delta_c = ?budget_deviation_pct,
        efficiency = ?resource_efficiency,
        "stage metrics"
    );

    Ok(MetricsRecord {
        stage_name: stage.name.clone(),
        planned_duration_days: planned_days,
        actual_duration_days: actual_days,
        schedule_deviation_days: actual_days - planned_days,
        schedule_deviation_pct,
        budget_deviation,
        budget_deviation_pct,
        resource_efficiency,
    })
}

/// `(actual - planned) / planned * 100`, rounded.
///
/// `None` if `planned` is zero or the result leaves the decimal range.
fn percent_change(planned: Decimal, actual: Decimal) -> Option<Decimal> {
    actual
        .checked_sub(planned)?
        .checked_mul(Decimal::ONE_HUNDRED)?
        .checked_div(planned)
        .map(round)
}

/// Resolve a computed ratio against its denominator.
///
/// Only a zero denominator goes through the division policy; any other
/// missing value is an arithmetic overflow.
fn guard(
    stage: &StageRecord,
    metric: Metric,
    policy: ZeroDivisionPolicy,
    denominator: Decimal,
    value: Option<Decimal>,
) -> Result<Option<Decimal>, AnalysisError> {
    if !denominator.is_zero() {
        return value
            .map(Some)
            .ok_or_else(|| out_of_range(stage, metric));
    }
    match policy {
        ZeroDivisionPolicy::Reject => Err(AnalysisError::DivisionByZero {
            stage: stage.name.clone(),
            metric,
        }),
        ZeroDivisionPolicy::Sentinel => {
            warn!(stage = %stage.name, %metric, "zero denominator, metric left undefined");
            Ok(None)
        }
    }
}

fn out_of_range(stage: &StageRecord, metric: Metric) -> AnalysisError {
    AnalysisError::Validation {
        stage: stage.name.clone(),
        message: format!("amount out of range computing {metric}"),
    }
}

/// Round to [`METRIC_SCALE`] places, half away from zero
pub fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(METRIC_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

// ============================================================================
// Displayed form
// ============================================================================

/// Metrics as shown in tables: percentages carry a `" %"` suffix.
///
/// This is the form the metrics table is exported in, and the form the
/// recommendation engine accepts at the presentation boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayedMetrics {
    pub stage_name: StageName,
    pub schedule_deviation: String,
    pub budget_deviation: String,
    pub resource_efficiency: String,
}

impl From<&MetricsRecord> for DisplayedMetrics {
    fn from(m: &MetricsRecord) -> Self {
        Self {
            stage_name: m.stage_name.clone(),
            schedule_deviation: display_percent(m.schedule_deviation_pct),
            budget_deviation: display_percent(m.budget_deviation_pct),
            resource_efficiency: display_ratio(m.resource_efficiency),
        }
    }
}

impl DisplayedMetrics {
    /// Parse the displayed values back into numbers.
    ///
    /// Returns `(ΔT, ΔC, E)`; the undefined marker parses to `None`.
    pub fn parse(
        &self,
    ) -> Result<(Option<Decimal>, Option<Decimal>, Option<Decimal>), AnalysisError> {
        Ok((
            parse_displayed(&self.stage_name, "ΔT", &self.schedule_deviation)?,
            parse_displayed(&self.stage_name, "ΔC", &self.budget_deviation)?,
            parse_displayed(&self.stage_name, "E", &self.resource_efficiency)?,
        ))
    }
}

/// Format a percentage metric for display (`"50.00 %"`)
pub fn display_percent(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{:.2} %", v),
        None => UNDEFINED.to_string(),
    }
}

/// Format a plain ratio metric for display (`"0.33"`)
pub fn display_ratio(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => UNDEFINED.to_string(),
    }
}

/// Parse one displayed metric value. A trailing `%` is accepted.
pub fn parse_displayed(
    stage: &str,
    field: &str,
    text: &str,
) -> Result<Option<Decimal>, AnalysisError> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case(UNDEFINED) {
        return Ok(None);
    }
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    number
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(number))
        .map(|v| Some(round(v)))
        .map_err(|_| AnalysisError::Format {
            stage: stage.to_string(),
            field: field.to_string(),
            value: text.to_string(),
        })
}
