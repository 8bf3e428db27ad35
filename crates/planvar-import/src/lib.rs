//! # planvar-import
//!
//! Loads project plans into `StageRecord`s.
//!
//! This crate provides:
//! - CSV import (comma or semicolon separated)
//! - JSON import (array of row objects, or column-oriented objects)
//! - Required-column validation with Russian and English header names
//! - Displayed metrics tables (`ΔT`, `ΔC`, `E`) for the recommendation boundary
//!
//! ## Example
//!
//! ```rust
//! use planvar_import::parse_csv;
//!
//! let input = "\
//! stage,owner,planned_start,planned_end,actual_start,actual_end,planned_budget,actual_budget,resources
//! Design,Ivanova,2024-01-01,2024-01-11,2024-01-01,2024-01-16,1000,1200,2
//! ";
//!
//! let stages = parse_csv(input).unwrap();
//! assert_eq!(stages[0].name, "Design");
//! assert_eq!(stages[0].planned_days(), 10);
//! ```

pub mod columns;
pub mod table;
pub mod values;

use std::path::Path;

use planvar_core::{DisplayedMetrics, StageRecord};
use thiserror::Error;
use tracing::{debug, info};

use crate::columns::{Column, MetricsColumn};
use crate::table::RawTable;

/// Import error
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid number in column '{column}' (row {row}): '{value}'")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Duplicate stage name: {0}")]
    DuplicateStage(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected JSON layout: {0}")]
    JsonLayout(String),
}

/// Supported plan file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
}

/// Detect file format from extension
pub fn detect_format(path: &Path) -> Result<FileFormat, ImportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") => Ok(FileFormat::Csv),
        Some("json") => Ok(FileFormat::Json),
        Some(other) => Err(ImportError::UnsupportedFormat(format!(".{other}"))),
        None => Err(ImportError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Load a plan file (format detected from the extension)
pub fn load_plan(path: &Path) -> Result<Vec<StageRecord>, ImportError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let stages = match format {
        FileFormat::Csv => parse_csv(&content)?,
        FileFormat::Json => parse_json(&content)?,
    };
    info!(path = %path.display(), stages = stages.len(), "loaded plan");
    Ok(stages)
}

/// Parse a plan from CSV text
pub fn parse_csv(input: &str) -> Result<Vec<StageRecord>, ImportError> {
    stages_from_table(&RawTable::from_csv(input)?)
}

/// Parse a plan from JSON text
pub fn parse_json(input: &str) -> Result<Vec<StageRecord>, ImportError> {
    stages_from_table(&RawTable::from_json(input)?)
}

/// Convert a raw table to stages.
///
/// Fails as a whole: a single unparseable date, reversed date range, bad
/// number or duplicate name rejects the entire plan.
pub fn stages_from_table(table: &RawTable) -> Result<Vec<StageRecord>, ImportError> {
    let index = table.resolve(&Column::ALL)?;
    let col = |c: Column| index[c as usize];

    let mut stages = Vec::with_capacity(table.rows.len());
    let mut bad_dates = Vec::new();

    for (i, row) in table.rows.iter().enumerate() {
        let row_no = i + 1;
        let name = row[col(Column::Stage)].trim().to_string();
        if name.is_empty() {
            return Err(ImportError::Validation(format!(
                "empty stage name in row {row_no}"
            )));
        }

        let dates = [
            Column::PlannedStart,
            Column::PlannedEnd,
            Column::ActualStart,
            Column::ActualEnd,
        ]
        .map(|c| values::parse_date(&row[col(c)]));

        let [Some(planned_start), Some(planned_end), Some(actual_start), Some(actual_end)] = dates
        else {
            bad_dates.push(name);
            continue;
        };

        let number = |c: Column| {
            let raw = &row[col(c)];
            values::parse_decimal(raw).ok_or_else(|| ImportError::InvalidNumber {
                column: table.headers[col(c)].clone(),
                row: row_no,
                value: raw.clone(),
            })
        };
        let planned_budget = number(Column::PlannedBudget)?;
        let actual_budget = number(Column::ActualBudget)?;
        let resources_raw = &row[col(Column::Resources)];
        let resource_units =
            values::parse_f64(resources_raw).ok_or_else(|| ImportError::InvalidNumber {
                column: table.headers[col(Column::Resources)].clone(),
                row: row_no,
                value: resources_raw.clone(),
            })?;

        stages.push(StageRecord {
            name,
            owner: row[col(Column::Owner)].trim().to_string(),
            planned_start,
            planned_end,
            actual_start,
            actual_end,
            planned_budget,
            actual_budget,
            resource_units,
        });
    }

    if !bad_dates.is_empty() {
        return Err(ImportError::Validation(format!(
            "invalid dates in stages: {}",
            bad_dates.join(", ")
        )));
    }

    for stage in &stages {
        stage
            .validate()
            .map_err(|e| ImportError::Validation(e.to_string()))?;
        if stage.planned_budget.is_sign_negative() || stage.actual_budget.is_sign_negative() {
            return Err(ImportError::Validation(format!(
                "negative budget in stage '{}'",
                stage.name
            )));
        }
        if stage.resource_units < 0.0 {
            return Err(ImportError::Validation(format!(
                "negative resource units in stage '{}'",
                stage.name
            )));
        }
    }

    let mut seen = std::collections::HashSet::new();
    for stage in &stages {
        if !seen.insert(stage.name.as_str()) {
            return Err(ImportError::DuplicateStage(stage.name.clone()));
        }
    }

    debug!(stages = stages.len(), "converted plan table");
    Ok(stages)
}

/// Parse a displayed metrics table (`stage, ΔT, ΔC, E`) from CSV text.
///
/// Values are kept as text; numeric checks happen in the recommendation
/// engine.
pub fn parse_metrics_table(input: &str) -> Result<Vec<DisplayedMetrics>, ImportError> {
    let table = RawTable::from_csv(input)?;
    let index = table.resolve(&MetricsColumn::ALL)?;
    let col = |c: MetricsColumn| index[c as usize];

    Ok(table
        .rows
        .iter()
        .map(|row| DisplayedMetrics {
            stage_name: row[col(MetricsColumn::Stage)].trim().to_string(),
            schedule_deviation: row[col(MetricsColumn::ScheduleDeviation)].clone(),
            budget_deviation: row[col(MetricsColumn::BudgetDeviation)].clone(),
            resource_efficiency: row[col(MetricsColumn::ResourceEfficiency)].clone(),
        })
        .collect())
}

/// Load a displayed metrics CSV file
pub fn load_metrics_table(path: &Path) -> Result<Vec<DisplayedMetrics>, ImportError> {
    let content = std::fs::read_to_string(path)?;
    parse_metrics_table(&content)
}
