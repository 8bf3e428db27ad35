//! CSV and JSON exports
//!
//! The metrics CSV carries the displayed values (`50.00 %`, `n/a`) under the
//! `stage, ΔT, ΔC, E` headers, so it can be fed back into
//! `build_recommendations_from_table`.

use chrono::NaiveDate;
use planvar_core::{
    AnalysisSnapshot, DisplayedMetrics, MetricsRecord, ProjectSummary, RecommendationRecord,
    RenderError, Renderer, StageRecord,
};
use serde::Serialize;

use crate::summary_of;

const METRICS_HEADERS: [&str; 4] = ["stage", "ΔT", "ΔC", "E"];

const RECOMMENDATION_HEADERS: [&str; 7] = [
    "stage",
    "category",
    "severity",
    "problem",
    "cause",
    "action",
    "expected_effect",
];

const PLAN_HEADERS: [&str; 9] = [
    "stage",
    "owner",
    "planned_start",
    "planned_end",
    "actual_start",
    "actual_end",
    "planned_budget",
    "actual_budget",
    "resources",
];

fn csv_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Format(format!("Failed to write CSV: {e}"))
}

/// Write headers and rows into a CSV string
fn write_csv<I, R>(headers: &[&str], rows: I) -> Result<String, RenderError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(headers).map_err(csv_error)?;
    for row in rows {
        writer.write_record(row).map_err(csv_error)?;
    }
    let bytes = writer.into_inner().map_err(csv_error)?;
    String::from_utf8(bytes).map_err(|e| RenderError::Format(format!("Invalid UTF-8: {e}")))
}

fn metrics_row(m: &MetricsRecord) -> [String; 4] {
    let d = DisplayedMetrics::from(m);
    [
        d.stage_name,
        d.schedule_deviation,
        d.budget_deviation,
        d.resource_efficiency,
    ]
}

/// Metrics table in displayed form
pub fn metrics_csv(metrics: &[MetricsRecord]) -> Result<String, RenderError> {
    write_csv(&METRICS_HEADERS, metrics.iter().map(metrics_row))
}

/// Metrics of several projects in one table, with a leading `project` column
pub fn metrics_csv_batch(projects: &[(&str, &[MetricsRecord])]) -> Result<String, RenderError> {
    let mut headers = vec!["project"];
    headers.extend(METRICS_HEADERS);
    let rows = projects.iter().flat_map(|(project, metrics)| {
        metrics.iter().map(move |m| {
            let mut row = vec![(*project).to_string()];
            row.extend(metrics_row(m));
            row
        })
    });
    write_csv(&headers, rows)
}

/// Recommendations table
pub fn recommendations_csv(
    recommendations: &[RecommendationRecord],
) -> Result<String, RenderError> {
    write_csv(
        &RECOMMENDATION_HEADERS,
        recommendations.iter().map(|r| {
            [
                r.stage_name.as_str(),
                r.category.as_str(),
                severity_str(r),
                r.problem_summary.as_str(),
                r.cause_hypothesis.as_str(),
                r.recommended_action.as_str(),
                r.expected_effect.as_str(),
            ]
        }),
    )
}

/// Plan table with the English column names the importer accepts
pub fn plan_csv(stages: &[StageRecord]) -> Result<String, RenderError> {
    write_csv(
        &PLAN_HEADERS,
        stages.iter().map(|s| {
            [
                s.name.clone(),
                s.owner.clone(),
                s.planned_start.to_string(),
                s.planned_end.to_string(),
                s.actual_start.to_string(),
                s.actual_end.to_string(),
                s.planned_budget.to_string(),
                s.actual_budget.to_string(),
                s.resource_units.to_string(),
            ]
        }),
    )
}

fn severity_str(r: &RecommendationRecord) -> &'static str {
    match r.severity {
        planvar_core::Severity::Major => "major",
        planvar_core::Severity::Minor => "minor",
        planvar_core::Severity::None => "",
    }
}

/// Serialize any value as pretty JSON
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, RenderError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| RenderError::Format(format!("Failed to write JSON: {e}")))
}

// ============================================================================
// Renderers
// ============================================================================

/// Which table a [`CsvExporter`] writes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CsvTable {
    Plan,
    #[default]
    Metrics,
    Recommendations,
}

/// CSV export of one snapshot table
#[derive(Clone, Debug, Default)]
pub struct CsvExporter {
    pub table: CsvTable,
}

impl CsvExporter {
    pub fn new(table: CsvTable) -> Self {
        Self { table }
    }
}

impl Renderer for CsvExporter {
    type Output = String;

    fn render(&self, snapshot: &AnalysisSnapshot) -> Result<String, RenderError> {
        match self.table {
            CsvTable::Plan => plan_csv(&snapshot.stages),
            CsvTable::Metrics => metrics_csv(&snapshot.metrics),
            CsvTable::Recommendations => recommendations_csv(&snapshot.recommendations),
        }
    }
}

#[derive(Serialize)]
struct SnapshotDocument<'a> {
    project: &'a str,
    as_of: NaiveDate,
    stages: &'a [StageRecord],
    metrics: &'a [MetricsRecord],
    recommendations: &'a [RecommendationRecord],
    summary: ProjectSummary,
}

/// Full snapshot as JSON, including the project summary
#[derive(Clone, Debug, Default)]
pub struct JsonExporter;

impl Renderer for JsonExporter {
    type Output = String;

    fn render(&self, snapshot: &AnalysisSnapshot) -> Result<String, RenderError> {
        to_json(&SnapshotDocument {
            project: &snapshot.project_name,
            as_of: snapshot.as_of,
            stages: &snapshot.stages,
            metrics: &snapshot.metrics,
            recommendations: &snapshot.recommendations,
            summary: summary_of(snapshot)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use planvar_core::config::EngineConfig;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn snapshot() -> AnalysisSnapshot {
        let stages = vec![StageRecord::new("Foundation, east")
            .owner("Petrov")
            .planned(date(1, 1), date(1, 11))
            .actual(date(1, 1), date(1, 16))
            .budget(dec!(1000), dec!(1200))
            .resources(3.0)];
        AnalysisSnapshot::analyze("House", stages, date(3, 1), &EngineConfig::default()).unwrap()
    }

    #[test]
    fn metrics_csv_uses_displayed_values() {
        let csv = metrics_csv(&snapshot().metrics).unwrap();
        assert_eq!(
            csv,
            "stage,ΔT,ΔC,E\n\"Foundation, east\",50.00 %,20.00 %,0.33\n"
        );
    }

    #[test]
    fn sentinel_values_export_as_undefined() {
        let stages = vec![StageRecord::new("Instant")
            .planned(date(1, 1), date(1, 1))
            .actual(date(1, 1), date(1, 3))
            .budget(dec!(0), dec!(5))];
        let snap =
            AnalysisSnapshot::analyze("P", stages, date(3, 1), &EngineConfig::sentinel()).unwrap();
        let csv = metrics_csv(&snap.metrics).unwrap();
        assert_eq!(csv.lines().nth(1), Some("Instant,n/a,n/a,1.00"));
    }

    #[test]
    fn batch_csv_prefixes_project() {
        let snap = snapshot();
        let csv = metrics_csv_batch(&[("A", &snap.metrics), ("B", &snap.metrics)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "project,stage,ΔT,ΔC,E");
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("B,"));
    }

    #[test]
    fn recommendations_csv_columns() {
        let csv = CsvExporter::new(CsvTable::Recommendations)
            .render(&snapshot())
            .unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("stage,category,severity,problem,cause,action,expected_effect")
        );
        assert!(lines.next().unwrap().contains("schedule-delay,major"));
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn plan_csv_headers() {
        let csv = CsvExporter::new(CsvTable::Plan).render(&snapshot()).unwrap();
        assert!(csv.starts_with("stage,owner,planned_start,"));
        assert!(csv.contains("2024-01-16,1000,1200,3"));
    }

    #[test]
    fn json_document_has_summary() {
        let json = JsonExporter.render(&snapshot()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["project"], "House");
        assert_eq!(value["as_of"], "2024-03-01");
        assert_eq!(value["metrics"][0]["schedule_deviation_days"], 5);
        assert_eq!(value["recommendations"][0]["category"], "schedule-delay");
        assert_eq!(value["summary"]["stage_count"], 1);
    }
}
