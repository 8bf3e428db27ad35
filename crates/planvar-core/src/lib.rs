//! # planvar-core
//!
//! Core domain model and engines for planvar, a project plan variance analyzer.
//!
//! This crate provides:
//! - Domain types: `StageRecord`, `MetricsRecord`, `RecommendationRecord`
//! - The metrics engine (`metrics::compute_metrics`)
//! - The rule-based recommendation engine (`recommend::build_recommendations`)
//! - Stage status classification and project summaries (`status`)
//! - Engine configuration (`config`)
//! - The `Renderer` trait implemented by output backends
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use planvar_core::{StageRecord, AnalysisSnapshot, config::EngineConfig};
//! use rust_decimal::Decimal;
//!
//! let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
//! let stages = vec![
//!     StageRecord::new("Foundation")
//!         .owner("Petrov")
//!         .planned(d(1, 1), d(1, 11))
//!         .actual(d(1, 1), d(1, 16))
//!         .budget(Decimal::from(1000), Decimal::from(1200))
//!         .resources(3.0),
//! ];
//!
//! let snapshot = AnalysisSnapshot::analyze("House", stages, d(2, 1), &EngineConfig::default()).unwrap();
//! assert_eq!(snapshot.metrics[0].schedule_deviation_pct, Some(Decimal::from(50)));
//! assert_eq!(snapshot.recommendations.len(), 3);
//! ```

pub mod config;
pub mod metrics;
pub mod recommend;
pub mod status;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::{Config, EngineConfig, Thresholds, ZeroDivisionPolicy};
pub use metrics::{compute_metrics, compute_metrics_batch, DisplayedMetrics};
pub use recommend::{build_recommendations, build_recommendations_from_table};
pub use status::{ProjectSummary, StageStatus};

// ============================================================================
// Type Aliases
// ============================================================================

/// Stage identifier (the stage name, unique within a project)
pub type StageName = String;

// ============================================================================
// Stage
// ============================================================================

/// One row of a project plan
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name, unique within a project
    pub name: StageName,
    /// Responsible person or team
    pub owner: String,
    /// Planned start date
    pub planned_start: NaiveDate,
    /// Planned end date
    pub planned_end: NaiveDate,
    /// Actual start date
    pub actual_start: NaiveDate,
    /// Actual end date
    pub actual_end: NaiveDate,
    /// Planned budget (currency-agnostic)
    pub planned_budget: Decimal,
    /// Actual spend
    pub actual_budget: Decimal,
    /// Allocated resource share
    pub resource_units: f64,
}

impl StageRecord {
    /// Create a stage with the given name.
    ///
    /// All dates default to 2024-01-01 and all amounts to zero; use the builder
    /// methods to fill them in.
    pub fn new(name: impl Into<String>) -> Self {
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        Self {
            name: name.into(),
            owner: String::new(),
            planned_start: epoch,
            planned_end: epoch,
            actual_start: epoch,
            actual_end: epoch,
            planned_budget: Decimal::ZERO,
            actual_budget: Decimal::ZERO,
            resource_units: 0.0,
        }
    }

    /// Set the owner
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Set the planned date range
    pub fn planned(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.planned_start = start;
        self.planned_end = end;
        self
    }

    /// Set the actual date range
    pub fn actual(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.actual_start = start;
        self.actual_end = end;
        self
    }

    /// Set planned and actual budget
    pub fn budget(mut self, planned: Decimal, actual: Decimal) -> Self {
        self.planned_budget = planned;
        self.actual_budget = actual;
        self
    }

    /// Set allocated resource units
    pub fn resources(mut self, units: f64) -> Self {
        self.resource_units = units;
        self
    }

    /// Planned duration in whole calendar days
    pub fn planned_days(&self) -> i64 {
        (self.planned_end - self.planned_start).num_days()
    }

    /// Actual duration in whole calendar days
    pub fn actual_days(&self) -> i64 {
        (self.actual_end - self.actual_start).num_days()
    }

    /// Check the date-range invariants.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.planned_end < self.planned_start {
            return Err(AnalysisError::Validation {
                stage: self.name.clone(),
                message: format!(
                    "invalid dates: planned end {} precedes planned start {}",
                    self.planned_end, self.planned_start
                ),
            });
        }
        if self.actual_end < self.actual_start {
            return Err(AnalysisError::Validation {
                stage: self.name.clone(),
                message: format!(
                    "invalid dates: actual end {} precedes actual start {}",
                    self.actual_end, self.actual_start
                ),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Metrics
// ============================================================================

/// Derived per-stage metrics
///
/// The three ratio metrics are `None` only when the engine runs with
/// [`ZeroDivisionPolicy::Sentinel`] and the denominator was zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Stage this record was derived from
    pub stage_name: StageName,
    /// Planned duration (days)
    pub planned_duration_days: i64,
    /// Actual duration (days)
    pub actual_duration_days: i64,
    /// Actual minus planned duration (days, positive = late)
    pub schedule_deviation_days: i64,
    /// ΔT, percent, 2 decimals
    pub schedule_deviation_pct: Option<Decimal>,
    /// Actual minus planned budget
    pub budget_deviation: Decimal,
    /// ΔC, percent, 2 decimals
    pub budget_deviation_pct: Option<Decimal>,
    /// E = 1 - planned / actual duration, 2 decimals
    pub resource_efficiency: Option<Decimal>,
}

/// Which ratio a metric value refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    ScheduleDeviation,
    BudgetDeviation,
    ResourceEfficiency,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::ScheduleDeviation => "schedule deviation (ΔT)",
            Metric::BudgetDeviation => "budget deviation (ΔC)",
            Metric::ResourceEfficiency => "resource efficiency (E)",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Recommendations
// ============================================================================

/// Recommendation category
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    ScheduleDelay,
    ScheduleLead,
    BudgetOverrun,
    BudgetSaving,
    EfficiencyLow,
    EfficiencyHigh,
    EfficiencyNormal,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::ScheduleDelay,
        Category::ScheduleLead,
        Category::BudgetOverrun,
        Category::BudgetSaving,
        Category::EfficiencyLow,
        Category::EfficiencyHigh,
        Category::EfficiencyNormal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ScheduleDelay => "schedule-delay",
            Category::ScheduleLead => "schedule-lead",
            Category::BudgetOverrun => "budget-overrun",
            Category::BudgetSaving => "budget-saving",
            Category::EfficiencyLow => "efficiency-low",
            Category::EfficiencyHigh => "efficiency-high",
            Category::EfficiencyNormal => "efficiency-normal",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How far past the threshold a deviation is
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Above the major threshold
    Major,
    /// Positive but within the major threshold
    Minor,
    /// Not a problem (leads, savings, efficiency findings)
    #[default]
    None,
}

/// One advisory produced by the recommendation engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub stage_name: StageName,
    pub category: Category,
    #[serde(default)]
    pub severity: Severity,
    pub problem_summary: String,
    pub cause_hypothesis: String,
    pub recommended_action: String,
    pub expected_effect: String,
}

// ============================================================================
// Analysis Snapshot
// ============================================================================

/// Everything an output backend needs: the plan plus the derived results.
///
/// A snapshot is produced in one go and never updated in place; recomputing
/// means building a new snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub project_name: String,
    /// Date stage status is evaluated against
    pub as_of: NaiveDate,
    pub stages: Vec<StageRecord>,
    pub metrics: Vec<MetricsRecord>,
    pub recommendations: Vec<RecommendationRecord>,
}

impl AnalysisSnapshot {
    /// Run both engines over `stages`.
    ///
    /// Also checks that the project totals are representable, so a snapshot
    /// returned here always has a summary.
    pub fn analyze(
        project_name: impl Into<String>,
        stages: Vec<StageRecord>,
        as_of: NaiveDate,
        config: &EngineConfig,
    ) -> Result<Self, AnalysisError> {
        let metrics = compute_metrics(&stages, config)?;
        let recommendations = build_recommendations(&metrics, &config.thresholds);
        let snapshot = Self {
            project_name: project_name.into(),
            as_of,
            stages,
            metrics,
            recommendations,
        };
        snapshot.summary()?;
        Ok(snapshot)
    }

    /// Aggregate summary of this snapshot
    pub fn summary(&self) -> Result<ProjectSummary, AnalysisError> {
        ProjectSummary::from_results(&self.stages, &self.metrics, &self.recommendations)
    }

    /// Status of each stage at the snapshot's as-of date, in stage order
    pub fn statuses(&self) -> Vec<StageStatus> {
        self.stages
            .iter()
            .map(|s| StageStatus::classify(s, self.as_of))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output backend for an analysis snapshot
pub trait Renderer {
    type Output;

    fn render(&self, snapshot: &AnalysisSnapshot) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Failure of the metrics or recommendation engine.
///
/// Every variant is fatal to the current run; no partial results exist.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Validation error in stage '{stage}': {message}")]
    Validation { stage: StageName, message: String },

    #[error("Division by zero in stage '{stage}': {metric} is undefined")]
    DivisionByZero { stage: StageName, metric: Metric },

    #[error("Format error in stage '{stage}': {field} value '{value}' is not numeric")]
    Format {
        stage: StageName,
        field: String,
        value: String,
    },

    #[error("Amount out of range: {0}")]
    OutOfRange(String),
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn stage_builder() {
        let stage = StageRecord::new("Walls")
            .owner("Sidorov")
            .planned(date(2024, 3, 1), date(2024, 3, 21))
            .actual(date(2024, 3, 4), date(2024, 3, 30))
            .budget(dec!(5000), dec!(4800))
            .resources(2.5);

        assert_eq!(stage.name, "Walls");
        assert_eq!(stage.owner, "Sidorov");
        assert_eq!(stage.planned_days(), 20);
        assert_eq!(stage.actual_days(), 26);
        assert_eq!(stage.planned_budget, dec!(5000));
        assert_eq!(stage.actual_budget, dec!(4800));
        assert_eq!(stage.resource_units, 2.5);
    }

    #[test]
    fn stage_validate_rejects_reversed_planned_range() {
        let stage = StageRecord::new("Roof").planned(date(2024, 3, 10), date(2024, 3, 1));
        let err = stage.validate().unwrap_err();
        assert!(matches!(err, AnalysisError::Validation { ref stage, .. } if stage == "Roof"));
        assert!(err.to_string().contains("invalid dates"));
    }

    #[test]
    fn stage_validate_rejects_reversed_actual_range() {
        let stage = StageRecord::new("Roof")
            .planned(date(2024, 3, 1), date(2024, 3, 10))
            .actual(date(2024, 3, 10), date(2024, 3, 9));
        assert!(stage.validate().is_err());
    }

    #[test]
    fn stage_validate_accepts_same_day_ranges() {
        let stage = StageRecord::new("Kickoff");
        assert!(stage.validate().is_ok());
    }

    #[test]
    fn category_display_is_kebab_case() {
        assert_eq!(Category::ScheduleDelay.to_string(), "schedule-delay");
        assert_eq!(Category::EfficiencyNormal.to_string(), "efficiency-normal");
        assert_eq!(Category::ALL.len(), 7);
    }

    #[test]
    fn analysis_error_messages() {
        let err = AnalysisError::DivisionByZero {
            stage: "Design".into(),
            metric: Metric::BudgetDeviation,
        };
        let msg = err.to_string();
        assert!(msg.contains("Design"));
        assert!(msg.contains("ΔC"));

        let err = AnalysisError::Format {
            stage: "Design".into(),
            field: "ΔT".into(),
            value: "abc %".into(),
        };
        assert!(err.to_string().contains("abc %"));
    }

    #[test]
    fn snapshot_analyze_runs_both_engines() {
        let stages = vec![StageRecord::new("Design")
            .planned(date(2024, 1, 1), date(2024, 1, 11))
            .actual(date(2024, 1, 1), date(2024, 1, 11))
            .budget(dec!(100), dec!(100))];

        let snapshot =
            AnalysisSnapshot::analyze("Demo", stages, date(2024, 2, 1), &EngineConfig::default())
                .unwrap();

        assert_eq!(snapshot.project_name, "Demo");
        assert_eq!(snapshot.metrics.len(), 1);
        assert_eq!(snapshot.recommendations.len(), 1);
        assert_eq!(snapshot.recommendations[0].category, Category::EfficiencyNormal);
        assert_eq!(snapshot.statuses(), vec![StageStatus::Completed]);
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn snapshot_analyze_propagates_engine_errors() {
        let stages = vec![StageRecord::new("Design")
            .planned(date(2024, 1, 1), date(2024, 1, 1))
            .actual(date(2024, 1, 1), date(2024, 1, 5))
            .budget(dec!(100), dec!(100))];

        let result =
            AnalysisSnapshot::analyze("Demo", stages, date(2024, 2, 1), &EngineConfig::default());
        assert!(matches!(result, Err(AnalysisError::DivisionByZero { .. })));
    }

    #[test]
    fn snapshot_analyze_rejects_unrepresentable_totals() {
        let half = Decimal::from_i128_with_scale(5 * 10_i128.pow(28), 0);
        let stage = |name: &str| {
            StageRecord::new(name)
                .planned(date(2024, 1, 1), date(2024, 1, 11))
                .actual(date(2024, 1, 1), date(2024, 1, 11))
                .budget(half, half)
        };

        let result = AnalysisSnapshot::analyze(
            "Demo",
            vec![stage("A"), stage("B")],
            date(2024, 2, 1),
            &EngineConfig::default(),
        );
        assert!(matches!(result, Err(AnalysisError::OutOfRange(_))));
    }
}
