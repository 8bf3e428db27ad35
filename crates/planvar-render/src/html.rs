//! Self-contained HTML analysis report
//!
//! One page with four numbered sections: project data, calculated metrics,
//! recommendations and inline SVG charts. No external assets.

use std::fmt::Write as _;

use planvar_core::{AnalysisSnapshot, DisplayedMetrics, RenderError, Renderer};
use tracing::debug;

use crate::charts::{ChartKind, SvgChartRenderer};
use crate::{fmt_error, format_amount, html_escape};

/// HTML report renderer
#[derive(Clone, Debug)]
pub struct HtmlReportRenderer {
    /// Report heading; defaults to "Project Analysis Report: <project>"
    pub title: Option<String>,
    pub currency: String,
    /// Whether section 4 embeds the SVG charts
    pub include_charts: bool,
    /// Width of each embedded chart
    pub chart_width: u32,
}

impl Default for HtmlReportRenderer {
    fn default() -> Self {
        Self {
            title: None,
            currency: "RUB".into(),
            include_charts: true,
            chart_width: 800,
        }
    }
}

impl HtmlReportRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Omit the charts section body
    pub fn without_charts(mut self) -> Self {
        self.include_charts = false;
        self
    }

    pub fn chart_width(mut self, width: u32) -> Self {
        self.chart_width = width;
        self
    }

    fn heading(&self, snapshot: &AnalysisSnapshot) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("Project Analysis Report: {}", snapshot.project_name))
    }

    fn project_section(&self, snapshot: &AnalysisSnapshot) -> Result<String, RenderError> {
        if snapshot.is_empty() {
            return Ok(empty("No project data available."));
        }

        let mut rows = String::new();
        for (stage, status) in snapshot.stages.iter().zip(snapshot.statuses()) {
            writeln!(
                rows,
                "<tr><td>{}</td><td>{}</td><td>{} – {}</td><td>{} – {}</td>\
                 <td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td>\
                 <td class=\"status {}\">{}</td></tr>",
                html_escape(&stage.name),
                html_escape(&stage.owner),
                stage.planned_start,
                stage.planned_end,
                stage.actual_start,
                stage.actual_end,
                format_amount(stage.planned_budget),
                format_amount(stage.actual_budget),
                stage.resource_units,
                status_class(status.as_str()),
                status.as_str(),
            )
            .map_err(fmt_error)?;
        }

        Ok(format!(
            "<table>\n<thead><tr><th>Stage</th><th>Owner</th><th>Planned</th><th>Actual</th>\
             <th>Planned budget, {cur}</th><th>Actual budget, {cur}</th><th>Resources</th>\
             <th>Status</th></tr></thead>\n<tbody>\n{rows}</tbody>\n</table>",
            cur = html_escape(&self.currency),
        ))
    }

    fn metrics_section(snapshot: &AnalysisSnapshot) -> Result<String, RenderError> {
        if snapshot.metrics.is_empty() {
            return Ok(empty("No metrics available."));
        }

        let mut rows = String::new();
        for m in &snapshot.metrics {
            let shown = DisplayedMetrics::from(m);
            writeln!(
                rows,
                "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td>\
                 <td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
                html_escape(&shown.stage_name),
                m.planned_duration_days,
                m.actual_duration_days,
                shown.schedule_deviation,
                shown.budget_deviation,
                shown.resource_efficiency,
            )
            .map_err(fmt_error)?;
        }

        Ok(format!(
            "<table>\n<thead><tr><th>Stage</th><th>Planned, d</th><th>Actual, d</th>\
             <th>ΔT</th><th>ΔC</th><th>E</th></tr></thead>\n<tbody>\n{rows}</tbody>\n</table>"
        ))
    }

    fn recommendations_section(snapshot: &AnalysisSnapshot) -> Result<String, RenderError> {
        if snapshot.recommendations.is_empty() {
            return Ok(empty("No recommendations available."));
        }

        let mut rows = String::new();
        for r in &snapshot.recommendations {
            writeln!(
                rows,
                "<tr class=\"{}\"><td>{}</td><td>{}<div class=\"cause\">{}</div></td>\
                 <td>{}<div class=\"effect\">{}</div></td></tr>",
                r.category.as_str(),
                html_escape(&r.stage_name),
                html_escape(&r.problem_summary),
                html_escape(&r.cause_hypothesis),
                html_escape(&r.recommended_action),
                html_escape(&r.expected_effect),
            )
            .map_err(fmt_error)?;
        }

        Ok(format!(
            "<table>\n<thead><tr><th>Stage</th><th>Problem</th><th>Recommendation</th></tr></thead>\n\
             <tbody>\n{rows}</tbody>\n</table>"
        ))
    }

    fn charts_section(&self, snapshot: &AnalysisSnapshot) -> Result<String, RenderError> {
        if !self.include_charts {
            return Ok(empty("No charts available."));
        }

        let mut figures = String::new();
        for kind in ChartKind::ALL {
            match SvgChartRenderer::new(kind)
                .chart_width(self.chart_width)
                .render(snapshot)
            {
                Ok(svg) => {
                    writeln!(
                        figures,
                        "<figure id=\"chart-{}\">\n{}\n<figcaption>{}</figcaption>\n</figure>",
                        kind.as_str(),
                        strip_xml_prolog(&svg),
                        kind.title(),
                    )
                    .map_err(fmt_error)?;
                }
                Err(e) => debug!(chart = kind.as_str(), error = %e, "chart skipped in report"),
            }
        }

        if figures.is_empty() {
            Ok(empty("No charts available."))
        } else {
            Ok(figures)
        }
    }

    fn generate_css() -> &'static str {
        r#"        :root {
            --header-bg: #2c3e50;
            --accent: #1abc9c;
            --delay: #ef5350;
            --ahead: #66bb6a;
            --progress: #42a5f5;
            --neutral: #b0bec5;
        }
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: system-ui, -apple-system, sans-serif;
            color: #263238;
            padding: 20px;
            max-width: 1100px;
            margin: 0 auto;
        }
        h1 { font-size: 1.6rem; margin-bottom: 4px; }
        .as-of { color: #607d8b; margin-bottom: 24px; }
        h2 {
            font-size: 1.2rem;
            margin: 28px 0 12px;
            border-bottom: 2px solid var(--accent);
            padding-bottom: 4px;
        }
        table { border-collapse: collapse; width: 100%; font-size: 14px; }
        th {
            background: var(--header-bg);
            color: #fff;
            text-align: left;
            padding: 6px 8px;
        }
        td { border: 1px solid #cfd8dc; padding: 6px 8px; vertical-align: top; }
        td.num { text-align: right; white-space: nowrap; }
        .status.overdue { color: var(--delay); font-weight: 600; }
        .status.completed { color: var(--ahead); }
        .status.in-progress { color: var(--progress); }
        .status.not-started { color: var(--neutral); }
        .cause, .effect { color: #607d8b; font-size: 12px; margin-top: 4px; }
        tr.schedule-delay td:first-child, tr.budget-overrun td:first-child {
            border-left: 4px solid var(--delay);
        }
        tr.schedule-lead td:first-child, tr.budget-saving td:first-child {
            border-left: 4px solid var(--ahead);
        }
        figure { margin: 16px 0 32px; }
        figcaption { color: #607d8b; font-size: 13px; text-align: center; }
        .empty { color: #90a4ae; font-style: italic; }"#
    }

    fn generate_html(&self, snapshot: &AnalysisSnapshot) -> Result<String, RenderError> {
        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
{css}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <p class="as-of">As of {as_of}</p>
    <section id="project-data">
        <h2>1. Project Data</h2>
{project}
    </section>
    <section id="metrics">
        <h2>2. Calculated Metrics</h2>
{metrics}
    </section>
    <section id="recommendations">
        <h2>3. Recommendations</h2>
{recommendations}
    </section>
    <section id="charts">
        <h2>4. Charts</h2>
{charts}
    </section>
</body>
</html>
"#,
            title = html_escape(&self.heading(snapshot)),
            css = Self::generate_css(),
            as_of = snapshot.as_of,
            project = self.project_section(snapshot)?,
            metrics = Self::metrics_section(snapshot)?,
            recommendations = Self::recommendations_section(snapshot)?,
            charts = self.charts_section(snapshot)?,
        ))
    }
}

fn empty(message: &str) -> String {
    format!("<p class=\"empty\">{message}</p>")
}

/// CSS class for a status label ("In Progress" -> "in-progress")
fn status_class(label: &str) -> String {
    label.to_lowercase().replace(' ', "-")
}

/// Drop the `<?xml ...?>` line so the SVG can be inlined
fn strip_xml_prolog(svg: &str) -> &str {
    if svg.starts_with("<?xml") {
        svg.find("?>").map_or(svg, |end| svg[end + 2..].trim_start())
    } else {
        svg
    }
}

impl Renderer for HtmlReportRenderer {
    type Output = String;

    fn render(&self, snapshot: &AnalysisSnapshot) -> Result<String, RenderError> {
        self.generate_html(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use planvar_core::config::EngineConfig;
    use planvar_core::StageRecord;
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn snapshot() -> AnalysisSnapshot {
        let stages = vec![
            StageRecord::new("Foundation")
                .owner("Petrov & Sons")
                .planned(date(1, 1), date(1, 11))
                .actual(date(1, 1), date(1, 16))
                .budget(dec!(1000), dec!(1200))
                .resources(3.0),
            StageRecord::new("Walls")
                .owner("Sidorov")
                .planned(date(1, 12), date(2, 1))
                .actual(date(1, 17), date(2, 3))
                .budget(dec!(2500), dec!(2400))
                .resources(2.0),
        ];
        AnalysisSnapshot::analyze("House", stages, date(3, 1), &EngineConfig::default()).unwrap()
    }

    #[test]
    fn report_has_numbered_sections() {
        let html = HtmlReportRenderer::new().render(&snapshot()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Project Analysis Report: House</title>"));
        for section in [
            "1. Project Data",
            "2. Calculated Metrics",
            "3. Recommendations",
            "4. Charts",
        ] {
            assert!(html.contains(section), "missing {section}");
        }
    }

    #[test]
    fn report_escapes_and_formats_values() {
        let html = HtmlReportRenderer::new().render(&snapshot()).unwrap();
        assert!(html.contains("Petrov &amp; Sons"));
        assert!(html.contains("2 500.00"));
        assert!(html.contains("50.00 %"));
        assert!(html.contains("class=\"status completed\""));
    }

    #[test]
    fn charts_are_inlined_without_prolog() {
        let html = HtmlReportRenderer::new().render(&snapshot()).unwrap();
        assert!(!html.contains("<?xml"));
        for kind in ChartKind::ALL {
            assert!(html.contains(&format!("id=\"chart-{}\"", kind.as_str())));
        }
    }

    #[test]
    fn custom_title_and_no_charts() {
        let html = HtmlReportRenderer::new()
            .title("Q1 <review>")
            .without_charts()
            .render(&snapshot())
            .unwrap();
        assert!(html.contains("<h1>Q1 &lt;review&gt;</h1>"));
        assert!(html.contains("No charts available."));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn empty_snapshot_prints_placeholders() {
        let snap =
            AnalysisSnapshot::analyze("Empty", vec![], date(1, 1), &EngineConfig::default())
                .unwrap();
        let html = HtmlReportRenderer::new().render(&snap).unwrap();
        assert!(html.contains("No project data available."));
        assert!(html.contains("No metrics available."));
        assert!(html.contains("No recommendations available."));
        assert!(html.contains("No charts available."));
    }

    #[test]
    fn status_class_names() {
        assert_eq!(status_class("In Progress"), "in-progress");
        assert_eq!(status_class("Overdue"), "overdue");
    }
}
