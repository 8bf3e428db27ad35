//! Console output: aligned tables and the project outline tree
//!
//! ```text
//! Project: House (as of 2024-03-01)
//!
//! Calculated metrics
//! Stage       Planned, d  Actual, d  ΔT       ΔC       E
//! ----------  ----------  ---------  -------  -------  ----
//! Foundation          10         15  50.00 %  20.00 %  0.33
//! ```

use std::fmt::{self, Write};

use planvar_core::metrics::{display_percent, display_ratio};
use planvar_core::{
    AnalysisSnapshot, MetricsRecord, ProjectSummary, RecommendationRecord, RenderError, Renderer,
    Severity, StageRecord, StageStatus,
};

use crate::{fmt_error, format_amount, summary_of};

// ============================================================================
// Table layout
// ============================================================================

struct Table {
    headers: Vec<&'static str>,
    /// Right-aligned columns
    numeric: Vec<bool>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(columns: &[(&'static str, bool)]) -> Self {
        Self {
            headers: columns.iter().map(|(h, _)| *h).collect(),
            numeric: columns.iter().map(|(_, n)| *n).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let header: Vec<String> = self.headers.iter().map(|h| (*h).to_string()).collect();
        self.write_line(&mut out, &header, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        self.write_line(&mut out, &rule, &widths);
        for row in &self.rows {
            self.write_line(&mut out, row, &widths);
        }
        out
    }

    fn write_line(&self, out: &mut String, cells: &[String], widths: &[usize]) {
        let mut line = String::new();
        for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
            if i > 0 {
                line.push_str("  ");
            }
            let pad = " ".repeat(width.saturating_sub(cell.chars().count()));
            if self.numeric[i] {
                line.push_str(&pad);
                line.push_str(cell);
            } else {
                line.push_str(cell);
                line.push_str(&pad);
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Plan table: one row per stage with dates, budgets and resources
pub fn plan_table(stages: &[StageRecord]) -> String {
    if stages.is_empty() {
        return "No project data available.\n".into();
    }
    let mut table = Table::new(&[
        ("Stage", false),
        ("Owner", false),
        ("Planned", false),
        ("Actual", false),
        ("Planned budget", true),
        ("Actual budget", true),
        ("Resources", true),
    ]);
    for s in stages {
        table.push(vec![
            s.name.clone(),
            s.owner.clone(),
            format!("{} – {}", s.planned_start, s.planned_end),
            format!("{} – {}", s.actual_start, s.actual_end),
            format_amount(s.planned_budget),
            format_amount(s.actual_budget),
            format!("{}", s.resource_units),
        ]);
    }
    table.render()
}

/// Metrics table with the displayed forms of ΔT, ΔC and E
pub fn metrics_table(metrics: &[MetricsRecord]) -> String {
    if metrics.is_empty() {
        return "No metrics available.\n".into();
    }
    let mut table = Table::new(&[
        ("Stage", false),
        ("Planned, d", true),
        ("Actual, d", true),
        ("ΔT", true),
        ("ΔC", true),
        ("E", true),
    ]);
    for m in metrics {
        table.push(vec![
            m.stage_name.clone(),
            m.planned_duration_days.to_string(),
            m.actual_duration_days.to_string(),
            display_percent(m.schedule_deviation_pct),
            display_percent(m.budget_deviation_pct),
            display_ratio(m.resource_efficiency),
        ]);
    }
    table.render()
}

/// Recommendations as indented blocks, one per record
pub fn recommendations_text(
    recommendations: &[RecommendationRecord],
) -> Result<String, RenderError> {
    if recommendations.is_empty() {
        return Ok("No recommendations available.\n".into());
    }
    let mut out = String::new();
    write_recommendations(&mut out, recommendations).map_err(fmt_error)?;
    Ok(out)
}

fn write_recommendations(
    out: &mut String,
    recommendations: &[RecommendationRecord],
) -> fmt::Result {
    for r in recommendations {
        let marker = match r.severity {
            Severity::Major => "!!",
            Severity::Minor => "! ",
            Severity::None => "  ",
        };
        writeln!(out, "{marker} [{}] {}: {}", r.category, r.stage_name, r.problem_summary)?;
        writeln!(out, "     Cause:  {}", r.cause_hypothesis)?;
        writeln!(out, "     Action: {}", r.recommended_action)?;
        writeln!(out, "     Effect: {}", r.expected_effect)?;
    }
    Ok(())
}

/// Headline figures
pub fn summary_text(summary: &ProjectSummary, currency: &str) -> Result<String, RenderError> {
    let mut out = String::new();
    write_summary(&mut out, summary, currency).map_err(fmt_error)?;
    Ok(out)
}

fn write_summary(out: &mut String, summary: &ProjectSummary, currency: &str) -> fmt::Result {
    writeln!(out, "Stages:             {}", summary.stage_count)?;
    writeln!(
        out,
        "Planned budget:     {} {currency}",
        format_amount(summary.total_planned_budget)
    )?;
    writeln!(
        out,
        "Actual budget:      {} {currency}",
        format_amount(summary.total_actual_budget)
    )?;
    writeln!(
        out,
        "Budget deviation:   {}",
        display_percent(summary.budget_deviation_pct)
    )?;
    writeln!(
        out,
        "Duration, days:     {} planned / {} actual",
        summary.total_planned_days, summary.total_actual_days
    )?;
    writeln!(
        out,
        "Stages late/early/on time: {} / {} / {}",
        summary.delayed_stages, summary.ahead_stages, summary.on_time_stages
    )?;
    writeln!(out, "Recommendations:    {}", summary.recommendation_count())
}

/// Stage count per status, every status listed
pub fn status_line(statuses: &[StageStatus]) -> String {
    let counts: Vec<String> = StageStatus::ALL
        .iter()
        .map(|status| {
            let n = statuses.iter().filter(|s| *s == status).count();
            format!("{} {n}", status.as_str())
        })
        .collect();
    format!("Stage status:       {}\n", counts.join(", "))
}

// ============================================================================
// Text Renderer
// ============================================================================

/// Plain text renderer for console output
#[derive(Clone, Debug)]
pub struct TextRenderer {
    pub show_plan: bool,
    pub show_metrics: bool,
    pub show_recommendations: bool,
    pub show_summary: bool,
    /// Currency label for budget totals
    pub currency: String,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            show_plan: true,
            show_metrics: true,
            show_recommendations: true,
            show_summary: true,
            currency: "RUB".into(),
        }
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set currency label
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, snapshot: &AnalysisSnapshot) -> Result<String, RenderError> {
        let mut out = format!(
            "Project: {} (as of {})\n",
            snapshot.project_name, snapshot.as_of
        );

        let sections = [
            (self.show_plan, "Project data", plan_table(&snapshot.stages)),
            (
                self.show_metrics,
                "Calculated metrics",
                metrics_table(&snapshot.metrics),
            ),
            (
                self.show_recommendations,
                "Recommendations",
                recommendations_text(&snapshot.recommendations)?,
            ),
            (
                self.show_summary,
                "Summary",
                summary_text(&summary_of(snapshot)?, &self.currency)?
                    + &status_line(&snapshot.statuses()),
            ),
        ];
        for (enabled, heading, body) in sections {
            if enabled {
                write!(out, "\n{heading}\n{body}").map_err(fmt_error)?;
            }
        }
        Ok(out)
    }
}

// ============================================================================
// Outline Renderer
// ============================================================================

/// Project tree: each stage with its owner, planned period and budget
#[derive(Clone, Debug)]
pub struct OutlineRenderer {
    pub currency: String,
}

impl Default for OutlineRenderer {
    fn default() -> Self {
        Self {
            currency: "RUB".into(),
        }
    }
}

impl OutlineRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set currency label
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

impl OutlineRenderer {
    fn write_stage(
        &self,
        out: &mut String,
        stage: &StageRecord,
        branch: &str,
        indent: &str,
    ) -> fmt::Result {
        writeln!(out, "{branch}{}", stage.name)?;
        writeln!(out, "{indent}├── Owner: {}", stage.owner)?;
        writeln!(
            out,
            "{indent}├── Period: {} – {}",
            stage.planned_start, stage.planned_end
        )?;
        writeln!(
            out,
            "{indent}└── Budget: {} {}",
            format_amount(stage.planned_budget),
            self.currency
        )
    }
}

impl Renderer for OutlineRenderer {
    type Output = String;

    fn render(&self, snapshot: &AnalysisSnapshot) -> Result<String, RenderError> {
        let mut out = format!("{}\n", snapshot.project_name);
        if snapshot.is_empty() {
            out.push_str("└── (no stages)\n");
            return Ok(out);
        }

        let last = snapshot.stages.len() - 1;
        for (i, stage) in snapshot.stages.iter().enumerate() {
            let (branch, indent) = if i == last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            self.write_stage(&mut out, stage, branch, indent)
                .map_err(fmt_error)?;
        }
        Ok(out)
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
        let stages = vec![
            StageRecord::new("Foundation")
                .owner("Petrov")
                .planned(date(1, 1), date(1, 11))
                .actual(date(1, 1), date(1, 16))
                .budget(dec!(1000), dec!(1200))
                .resources(3.0),
            StageRecord::new("Roof")
                .owner("Ivanova")
                .planned(date(2, 1), date(2, 11))
                .actual(date(2, 1), date(2, 11))
                .budget(dec!(800), dec!(800))
                .resources(1.0),
        ];
        AnalysisSnapshot::analyze("House", stages, date(3, 1), &EngineConfig::default()).unwrap()
    }

    #[test]
    fn table_aligns_columns() {
        let mut table = Table::new(&[("Name", false), ("N", true)]);
        table.push(vec!["a".into(), "1".into()]);
        table.push(vec!["long".into(), "100".into()]);
        assert_eq!(table.render(), "Name    N\n----  ---\na       1\nlong  100\n");
    }

    #[test]
    fn metrics_table_shows_displayed_values() {
        let text = metrics_table(&snapshot().metrics);
        let row = text.lines().nth(2).unwrap();
        assert!(row.starts_with("Foundation"));
        assert!(row.contains("50.00 %"));
        assert!(row.contains("20.00 %"));
        assert!(row.ends_with("0.33"));
    }

    #[test]
    fn empty_sections_say_so() {
        assert_eq!(metrics_table(&[]), "No metrics available.\n");
        assert_eq!(recommendations_text(&[]).unwrap(), "No recommendations available.\n");
        assert_eq!(plan_table(&[]), "No project data available.\n");
    }

    #[test]
    fn full_text_has_all_sections() {
        let text = TextRenderer::new().render(&snapshot()).unwrap();
        assert!(text.starts_with("Project: House (as of 2024-03-01)"));
        for heading in ["Project data", "Calculated metrics", "Recommendations", "Summary"] {
            assert!(text.contains(heading), "missing {heading}");
        }
        assert!(text.contains("!! [schedule-delay] Foundation"));
        assert!(text.contains("2 000.00 RUB"));
    }

    #[test]
    fn status_line_lists_every_status() {
        let line = status_line(&[StageStatus::Completed, StageStatus::Completed]);
        assert_eq!(
            line,
            "Stage status:       Not Started 0, In Progress 0, Completed 2, Overdue 0\n"
        );
        assert!(TextRenderer::new()
            .render(&snapshot())
            .unwrap()
            .contains("Completed 2"));
    }

    #[test]
    fn disabled_sections_are_skipped() {
        let renderer = TextRenderer {
            show_plan: false,
            show_recommendations: false,
            show_summary: false,
            ..TextRenderer::default()
        };
        let text = renderer.render(&snapshot()).unwrap();
        assert!(text.contains("Calculated metrics"));
        assert!(!text.contains("Recommendations"));
        assert!(!text.contains("Summary"));
    }

    #[test]
    fn outline_tree() {
        let text = OutlineRenderer::new()
            .currency("EUR")
            .render(&snapshot())
            .unwrap();
        let expected = "\
House
├── Foundation
│   ├── Owner: Petrov
│   ├── Period: 2024-01-01 – 2024-01-11
│   └── Budget: 1 000.00 EUR
└── Roof
    ├── Owner: Ivanova
    ├── Period: 2024-02-01 – 2024-02-11
    └── Budget: 800.00 EUR
";
        assert_eq!(text, expected);
    }
}
