//! Stage status and project summary
//!
//! Status answers "where is each stage right now?" relative to an as-of date.
//! The summary aggregates a whole analysis into a handful of headline figures.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use planvar_core::{StageRecord, StageStatus};
//!
//! let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
//! let stage = StageRecord::new("Roof")
//!     .planned(d(3, 1), d(3, 10))
//!     .actual(d(3, 2), d(3, 20));
//!
//! assert_eq!(StageStatus::classify(&stage, d(2, 20)), StageStatus::NotStarted);
//! assert_eq!(StageStatus::classify(&stage, d(3, 5)), StageStatus::InProgress);
//! assert_eq!(StageStatus::classify(&stage, d(3, 15)), StageStatus::Overdue);
//! assert_eq!(StageStatus::classify(&stage, d(3, 25)), StageStatus::Completed);
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::metrics::round;
use crate::{AnalysisError, Category, MetricsRecord, RecommendationRecord, StageRecord};

// ============================================================================
// Stage Status
// ============================================================================

/// Where a stage stands on a given date
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    NotStarted,
    InProgress,
    Completed,
    /// Past its planned end and not yet finished
    Overdue,
}

impl StageStatus {
    pub const ALL: [StageStatus; 4] = [
        StageStatus::NotStarted,
        StageStatus::InProgress,
        StageStatus::Completed,
        StageStatus::Overdue,
    ];

    /// Classify a stage against `as_of`.
    ///
    /// A stage whose actual end is still ahead of `as_of` is treated as
    /// running; it is overdue once its planned end has passed and the actual
    /// end lies beyond it.
    pub fn classify(stage: &StageRecord, as_of: NaiveDate) -> Self {
        if stage.actual_start > as_of {
            StageStatus::NotStarted
        } else if stage.actual_end <= as_of {
            StageStatus::Completed
        } else if stage.planned_end < as_of && stage.actual_end > stage.planned_end {
            StageStatus::Overdue
        } else {
            StageStatus::InProgress
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::NotStarted => "Not Started",
            StageStatus::InProgress => "In Progress",
            StageStatus::Completed => "Completed",
            StageStatus::Overdue => "Overdue",
        }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Project Summary
// ============================================================================

/// Headline figures for a whole project
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub stage_count: usize,
    pub total_planned_budget: Decimal,
    pub total_actual_budget: Decimal,
    /// Overall ΔC; `None` when the planned total is zero
    pub budget_deviation_pct: Option<Decimal>,
    pub total_planned_days: i64,
    pub total_actual_days: i64,
    /// Stages that took longer than planned
    pub delayed_stages: usize,
    /// Stages that took less time than planned
    pub ahead_stages: usize,
    pub on_time_stages: usize,
    pub total_resource_units: f64,
    pub recommendations_by_category: BTreeMap<Category, usize>,
}

impl ProjectSummary {
    /// Aggregate a project's results.
    ///
    /// Fails with `AnalysisError::OutOfRange` when a budget total leaves the
    /// decimal range.
    pub fn from_results(
        stages: &[StageRecord],
        metrics: &[MetricsRecord],
        recommendations: &[RecommendationRecord],
    ) -> Result<Self, AnalysisError> {
        let total_planned_budget =
            checked_total(stages, |s| s.planned_budget, "total planned budget")?;
        let total_actual_budget =
            checked_total(stages, |s| s.actual_budget, "total actual budget")?;
        let budget_deviation_pct = if total_planned_budget.is_zero() {
            None
        } else {
            let pct = total_actual_budget
                .checked_sub(total_planned_budget)
                .and_then(|d| d.checked_mul(Decimal::ONE_HUNDRED))
                .and_then(|d| d.checked_div(total_planned_budget))
                .ok_or_else(|| AnalysisError::OutOfRange("total budget deviation".into()))?;
            Some(round(pct))
        };

        let mut recommendations_by_category = BTreeMap::new();
        for rec in recommendations {
            *recommendations_by_category.entry(rec.category).or_insert(0) += 1;
        }

        Ok(Self {
            stage_count: stages.len(),
            total_planned_budget,
            total_actual_budget,
            budget_deviation_pct,
            total_planned_days: metrics.iter().map(|m| m.planned_duration_days).sum(),
            total_actual_days: metrics.iter().map(|m| m.actual_duration_days).sum(),
            delayed_stages: metrics.iter().filter(|m| m.schedule_deviation_days > 0).count(),
            ahead_stages: metrics.iter().filter(|m| m.schedule_deviation_days < 0).count(),
            on_time_stages: metrics.iter().filter(|m| m.schedule_deviation_days == 0).count(),
            total_resource_units: stages.iter().map(|s| s.resource_units).sum(),
            recommendations_by_category,
        })
    }

    /// Count of recommendations in one category
    pub fn recommendations_in(&self, category: Category) -> usize {
        self.recommendations_by_category
            .get(&category)
            .copied()
            .unwrap_or(0)
    }

    /// Total number of recommendations
    pub fn recommendation_count(&self) -> usize {
        self.recommendations_by_category.values().sum()
    }
}

fn checked_total(
    stages: &[StageRecord],
    amount: impl Fn(&StageRecord) -> Decimal,
    what: &str,
) -> Result<Decimal, AnalysisError> {
    stages
        .iter()
        .try_fold(Decimal::ZERO, |acc, s| acc.checked_add(amount(s)))
        .ok_or_else(|| AnalysisError::OutOfRange(what.to_string()))
}
