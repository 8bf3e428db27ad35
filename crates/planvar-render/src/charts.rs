//! SVG analysis charts
//!
//! One renderer, five chart kinds:
//!
//! | Kind | Shows |
//! |------|-------|
//! | `Gantt` | planned and actual bars per stage, outlined by stage status |
//! | `Budget` | planned vs actual budget, grouped bars |
//! | `Resources` | share of resource units per stage (pie) |
//! | `Deviation` | schedule deviation in days per stage |
//! | `BudgetDynamics` | planned and actual budget ordered by planned end date |

use std::str::FromStr;

use chrono::NaiveDate;
use svg::node::element::{Circle, Group, Line, Path, Polygon, Polyline, Rectangle, Text};
use svg::Document;
use tracing::debug;

use planvar_core::{AnalysisSnapshot, RenderError, Renderer, StageStatus};

use crate::{to_f64, truncate};

/// Slice colors for the resource pie
const PALETTE: [&str; 12] = [
    "#a6cee3", "#1f78b4", "#b2df8a", "#33a02c", "#fb9a99", "#e31a1c", "#fdbf6f", "#ff7f00",
    "#cab2d6", "#6a3d9a", "#ffff99", "#b15928",
];

// ============================================================================
// Chart Kind
// ============================================================================

/// Which chart to draw
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Gantt,
    Budget,
    Resources,
    Deviation,
    BudgetDynamics,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Gantt,
        ChartKind::Budget,
        ChartKind::Resources,
        ChartKind::Deviation,
        ChartKind::BudgetDynamics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Gantt => "gantt",
            ChartKind::Budget => "budget",
            ChartKind::Resources => "resources",
            ChartKind::Deviation => "deviation",
            ChartKind::BudgetDynamics => "budget-dynamics",
        }
    }

    /// Chart heading
    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Gantt => "Project Gantt chart",
            ChartKind::Budget => "Budget comparison (plan vs actual)",
            ChartKind::Resources => "Resource distribution",
            ChartKind::Deviation => "Schedule deviation by stage",
            ChartKind::BudgetDynamics => "Budget dynamics over time",
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RenderError::InvalidData(format!("unknown chart kind '{s}'")))
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// SVG chart renderer configuration
#[derive(Clone, Debug)]
pub struct SvgChartRenderer {
    pub kind: ChartKind,
    /// Width of the plot area in pixels
    pub chart_width: u32,
    /// Height of the plot area for value charts
    pub chart_height: u32,
    /// Height per stage row (Gantt)
    pub row_height: u32,
    /// Width of the label column (Gantt) or value axis
    pub label_width: u32,
    /// Padding around the chart
    pub padding: u32,
    pub plan_color: String,
    pub actual_color: String,
    /// Actual budget line in the dynamics chart
    pub actual_line_color: String,
    pub delay_color: String,
    pub ahead_color: String,
    pub neutral_color: String,
    pub in_progress_color: String,
    pub overrun_fill: String,
    pub saving_fill: String,
    pub background_color: String,
    pub grid_color: String,
    pub text_color: String,
    pub font_family: String,
    pub font_size: u32,
}

impl Default for SvgChartRenderer {
    fn default() -> Self {
        Self {
            kind: ChartKind::Gantt,
            chart_width: 800,
            chart_height: 320,
            row_height: 36,
            label_width: 180,
            padding: 20,
            plan_color: "#2c3e50".into(),
            actual_color: "#1abc9c".into(),
            actual_line_color: "#e74c3c".into(),
            delay_color: "#ef5350".into(),
            ahead_color: "#66bb6a".into(),
            neutral_color: "#b0bec5".into(),
            in_progress_color: "#42a5f5".into(),
            overrun_fill: "#ffcccc".into(),
            saving_fill: "#c8e6c9".into(),
            background_color: "#ffffff".into(),
            grid_color: "#ecf0f1".into(),
            text_color: "#2c3e50".into(),
            font_family: "system-ui, -apple-system, sans-serif".into(),
            font_size: 12,
        }
    }
}

/// Header band holding the chart title
const TITLE_HEIGHT: u32 = 40;
/// Space below value charts for stage labels
const AXIS_LABEL_HEIGHT: u32 = 70;
/// Space for a one-line legend
const LEGEND_HEIGHT: u32 = 30;

impl SvgChartRenderer {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Configure plot width
    pub fn chart_width(mut self, width: u32) -> Self {
        self.chart_width = width;
        self
    }

    /// Configure plot height for value charts
    pub fn chart_height(mut self, height: u32) -> Self {
        self.chart_height = height;
        self
    }

    /// Configure Gantt row height
    pub fn row_height(mut self, height: u32) -> Self {
        self.row_height = height;
        self
    }

    fn total_width(&self) -> u32 {
        self.padding * 2 + self.label_width + self.chart_width
    }

    fn plot_left(&self) -> f64 {
        f64::from(self.padding + self.label_width)
    }

    fn plot_top(&self) -> f64 {
        f64::from(self.padding + TITLE_HEIGHT)
    }

    fn value_chart_height(&self) -> u32 {
        self.padding * 2 + TITLE_HEIGHT + self.chart_height + AXIS_LABEL_HEIGHT + LEGEND_HEIGHT
    }

    fn document(&self, width: u32, height: u32, project: &str) -> Document {
        let background = Rectangle::new()
            .set("width", "100%")
            .set("height", "100%")
            .set("fill", self.background_color.as_str());

        let title = self
            .text(
                format!("{}: {}", self.kind.title(), project),
                f64::from(self.padding),
                f64::from(self.padding + 18),
            )
            .set("font-size", self.font_size + 4)
            .set("font-weight", "bold");

        Document::new()
            .set("width", width)
            .set("height", height)
            .set("viewBox", (0, 0, width, height))
            .set("xmlns", "http://www.w3.org/2000/svg")
            .add(background)
            .add(title)
    }

    fn text(&self, content: impl Into<String>, x: f64, y: f64) -> Text {
        Text::new(content.into())
            .set("x", x)
            .set("y", y)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size)
            .set("fill", self.text_color.as_str())
    }

    fn status_color(&self, status: StageStatus) -> &str {
        match status {
            StageStatus::NotStarted => self.neutral_color.as_str(),
            StageStatus::InProgress => self.in_progress_color.as_str(),
            StageStatus::Completed => self.ahead_color.as_str(),
            StageStatus::Overdue => self.delay_color.as_str(),
        }
    }

    /// Legend row of colored boxes
    fn legend(&self, entries: &[(&str, &str)], y: f64) -> Group {
        let mut group = Group::new().set("class", "legend");
        let box_size = 12.0;
        let mut x = f64::from(self.padding);
        for (label, color) in entries {
            group = group
                .add(
                    Rectangle::new()
                        .set("x", x)
                        .set("y", y - box_size + 2.0)
                        .set("width", box_size)
                        .set("height", box_size)
                        .set("rx", 2)
                        .set("fill", *color),
                )
                .add(
                    self.text(*label, x + box_size + 5.0, y)
                        .set("font-size", self.font_size - 1),
                );
            x += box_size + 15.0 + 7.0 * label.chars().count() as f64;
        }
        group
    }

    /// Horizontal grid lines and value labels for a value axis
    fn value_axis(&self, min: f64, max: f64) -> Group {
        let mut group = Group::new().set("class", "axis");
        let left = self.plot_left();
        let right = left + f64::from(self.chart_width);
        for i in 0..=4 {
            let value = min + (max - min) * f64::from(i) / 4.0;
            let y = self.value_to_y(value, min, max);
            group = group
                .add(
                    Line::new()
                        .set("x1", left)
                        .set("y1", y)
                        .set("x2", right)
                        .set("y2", y)
                        .set("stroke", self.grid_color.as_str())
                        .set("stroke-width", 1),
                )
                .add(
                    self.text(axis_label(value), left - 8.0, y + 4.0)
                        .set("text-anchor", "end")
                        .set("font-size", self.font_size - 1),
                );
        }
        group
    }

    fn value_to_y(&self, value: f64, min: f64, max: f64) -> f64 {
        let span = if max > min { max - min } else { 1.0 };
        self.plot_top() + f64::from(self.chart_height) * (max - value) / span
    }

    /// Rotated category label under the plot area
    fn category_label(&self, label: &str, x: f64) -> Text {
        let y = self.plot_top() + f64::from(self.chart_height) + 16.0;
        self.text(truncate(label, 18), x, y)
            .set("text-anchor", "end")
            .set("transform", format!("rotate(-30 {x} {y})"))
    }

    fn finish(document: &Document) -> Result<String, RenderError> {
        let mut output = Vec::new();
        svg::write(&mut output, document)
            .map_err(|e| RenderError::Format(format!("Failed to write SVG: {e}")))?;
        String::from_utf8(output).map_err(|e| RenderError::Format(format!("Invalid UTF-8: {e}")))
    }

    // ------------------------------------------------------------------------
    // Gantt
    // ------------------------------------------------------------------------

    fn render_gantt(&self, snapshot: &AnalysisSnapshot) -> Document {
        let stages = &snapshot.stages;
        let statuses = snapshot.statuses();

        let start = stages
            .iter()
            .map(|s| s.planned_start.min(s.actual_start))
            .min()
            .unwrap_or(snapshot.as_of)
            - chrono::Duration::days(1);
        let end = stages
            .iter()
            .map(|s| s.planned_end.max(s.actual_end))
            .max()
            .unwrap_or(snapshot.as_of)
            + chrono::Duration::days(1);
        let days = (end - start).num_days().max(1) as f64;
        let px_per_day = f64::from(self.chart_width) / days;
        let date_to_x = |d: NaiveDate| self.plot_left() + (d - start).num_days() as f64 * px_per_day;

        let rows = stages.len() as u32;
        let chart_bottom = self.plot_top() + f64::from(rows * self.row_height);
        let height = self.padding * 2 + TITLE_HEIGHT + rows * self.row_height + 20 + LEGEND_HEIGHT;
        let mut document = self.document(self.total_width(), height, &snapshot.project_name);

        // Date grid
        let interval = match (end - start).num_days() {
            0..=14 => 1,
            15..=60 => 7,
            61..=180 => 14,
            _ => 30,
        };
        let mut grid = Group::new().set("class", "grid");
        let mut current = start;
        while current <= end {
            let x = date_to_x(current);
            grid = grid
                .add(
                    Line::new()
                        .set("x1", x)
                        .set("y1", self.plot_top())
                        .set("x2", x)
                        .set("y2", chart_bottom)
                        .set("stroke", self.grid_color.as_str())
                        .set("stroke-width", 1),
                )
                .add(
                    self.text(current.format("%d.%m").to_string(), x, self.plot_top() - 6.0)
                        .set("font-size", self.font_size - 2)
                        .set("text-anchor", "middle"),
                );
            current += chrono::Duration::days(interval);
        }
        document = document.add(grid);

        if (start..=end).contains(&snapshot.as_of) {
            let x = date_to_x(snapshot.as_of);
            document = document.add(
                Line::new()
                    .set("class", "as-of")
                    .set("x1", x)
                    .set("y1", self.plot_top())
                    .set("x2", x)
                    .set("y2", chart_bottom)
                    .set("stroke", self.delay_color.as_str())
                    .set("stroke-dasharray", "4 3")
                    .set("stroke-width", 1),
            );
        }

        let bar_height = f64::from(self.row_height) * 0.3;
        for (row, (stage, status)) in stages.iter().zip(&statuses).enumerate() {
            let y = self.plot_top() + f64::from(row as u32 * self.row_height);
            let edge = self.status_color(*status);
            let mut group = Group::new()
                .set("class", "stage")
                .add(self.text(
                    truncate(&stage.name, 22),
                    f64::from(self.padding + 8),
                    y + f64::from(self.row_height) / 2.0 + 4.0,
                ));

            let bars = [
                (stage.planned_start, stage.planned_end, self.plan_color.as_str(), y + 4.0),
                (stage.actual_start, stage.actual_end, self.actual_color.as_str(), y + 6.0 + bar_height),
            ];
            for (from, to, fill, bar_y) in bars {
                let x = date_to_x(from);
                let width = (date_to_x(to) - x).max(4.0);
                group = group.add(
                    Rectangle::new()
                        .set("x", x)
                        .set("y", bar_y)
                        .set("width", width)
                        .set("height", bar_height)
                        .set("rx", 2)
                        .set("fill", fill)
                        .set("stroke", edge)
                        .set("stroke-width", 2),
                );
            }
            document = document.add(group);
        }

        document.add(self.legend(
            &[
                ("Plan", self.plan_color.as_str()),
                ("Actual", self.actual_color.as_str()),
                (StageStatus::NotStarted.as_str(), self.neutral_color.as_str()),
                (StageStatus::InProgress.as_str(), self.in_progress_color.as_str()),
                (StageStatus::Completed.as_str(), self.ahead_color.as_str()),
                (StageStatus::Overdue.as_str(), self.delay_color.as_str()),
            ],
            chart_bottom + 30.0,
        ))
    }

    // ------------------------------------------------------------------------
    // Budget comparison
    // ------------------------------------------------------------------------

    fn render_budget(&self, snapshot: &AnalysisSnapshot) -> Document {
        let stages = &snapshot.stages;
        let max = stages
            .iter()
            .map(|s| to_f64(s.planned_budget).max(to_f64(s.actual_budget)))
            .fold(0.0, f64::max);
        let max = if max > 0.0 { max * 1.1 } else { 1.0 };

        let mut document = self
            .document(self.total_width(), self.value_chart_height(), &snapshot.project_name)
            .add(self.value_axis(0.0, max));

        let group_width = f64::from(self.chart_width) / stages.len() as f64;
        let bar_width = group_width * 0.35;
        let baseline = self.value_to_y(0.0, 0.0, max);

        for (i, stage) in stages.iter().enumerate() {
            let group_x = self.plot_left() + group_width * i as f64 + group_width * 0.15;
            let mut group = Group::new().set("class", "stage");
            for (j, (value, fill)) in [
                (to_f64(stage.planned_budget), self.plan_color.as_str()),
                (to_f64(stage.actual_budget), self.actual_color.as_str()),
            ]
            .into_iter()
            .enumerate()
            {
                let top = self.value_to_y(value, 0.0, max);
                group = group.add(
                    Rectangle::new()
                        .set("x", group_x + bar_width * j as f64)
                        .set("y", top)
                        .set("width", bar_width)
                        .set("height", (baseline - top).max(0.0))
                        .set("fill", fill),
                );
            }
            group = group.add(self.category_label(&stage.name, group_x + bar_width));
            document = document.add(group);
        }

        let legend_y = baseline + f64::from(AXIS_LABEL_HEIGHT) + 15.0;
        document.add(self.legend(
            &[
                ("Plan", self.plan_color.as_str()),
                ("Actual", self.actual_color.as_str()),
            ],
            legend_y,
        ))
    }

    // ------------------------------------------------------------------------
    // Resource distribution
    // ------------------------------------------------------------------------

    fn render_resources(&self, snapshot: &AnalysisSnapshot) -> Result<Document, RenderError> {
        let total: f64 = snapshot.stages.iter().map(|s| s.resource_units).sum();
        if total <= 0.0 {
            return Err(RenderError::InvalidData(
                "No resource units to chart".into(),
            ));
        }

        let radius = f64::from(self.chart_height) / 2.0;
        let cx = f64::from(self.padding) + radius + 10.0;
        let cy = self.plot_top() + radius;
        let height = self.padding * 2 + TITLE_HEIGHT + self.chart_height + 20;
        let mut document = self.document(self.total_width(), height, &snapshot.project_name);

        let mut angle = -std::f64::consts::FRAC_PI_2;
        let legend_x = cx + radius + 40.0;
        for (i, stage) in snapshot.stages.iter().enumerate() {
            let share = stage.resource_units / total;
            let color = PALETTE[i % PALETTE.len()];
            let mut group = Group::new().set("class", "slice");

            if share >= 1.0 {
                group = group.add(
                    Circle::new()
                        .set("cx", cx)
                        .set("cy", cy)
                        .set("r", radius)
                        .set("fill", color),
                );
            } else if share > 0.0 {
                let sweep = share * std::f64::consts::TAU;
                let (x0, y0) = (cx + radius * angle.cos(), cy + radius * angle.sin());
                let end = angle + sweep;
                let (x1, y1) = (cx + radius * end.cos(), cy + radius * end.sin());
                let large_arc = i32::from(sweep > std::f64::consts::PI);
                let data = format!(
                    "M {cx:.2} {cy:.2} L {x0:.2} {y0:.2} A {radius:.2} {radius:.2} 0 {large_arc} 1 {x1:.2} {y1:.2} Z"
                );
                group = group.add(
                    Path::new()
                        .set("d", data)
                        .set("fill", color)
                        .set("stroke", self.background_color.as_str())
                        .set("stroke-width", 1),
                );
            }

            if share > 0.0 {
                let mid = angle + share * std::f64::consts::PI;
                group = group.add(
                    self.text(
                        format!("{:.1}%", share * 100.0),
                        cx + radius * 0.65 * mid.cos(),
                        cy + radius * 0.65 * mid.sin() + 4.0,
                    )
                    .set("text-anchor", "middle"),
                );
            }
            angle += share * std::f64::consts::TAU;

            let ly = self.plot_top() + 20.0 * i as f64;
            group = group
                .add(
                    Rectangle::new()
                        .set("x", legend_x)
                        .set("y", ly)
                        .set("width", 12)
                        .set("height", 12)
                        .set("fill", color),
                )
                .add(self.text(truncate(&stage.name, 40), legend_x + 18.0, ly + 10.0));
            document = document.add(group);
        }
        Ok(document)
    }

    // ------------------------------------------------------------------------
    // Schedule deviation
    // ------------------------------------------------------------------------

    fn render_deviation(&self, snapshot: &AnalysisSnapshot) -> Document {
        let metrics = &snapshot.metrics;
        let max_abs = metrics
            .iter()
            .map(|m| m.schedule_deviation_days.unsigned_abs())
            .max()
            .unwrap_or(0)
            .max(1) as f64
            * 1.25;

        let mut document = self
            .document(self.total_width(), self.value_chart_height(), &snapshot.project_name)
            .add(self.value_axis(-max_abs, max_abs));

        let zero_y = self.value_to_y(0.0, -max_abs, max_abs);
        document = document.add(
            Line::new()
                .set("x1", self.plot_left())
                .set("y1", zero_y)
                .set("x2", self.plot_left() + f64::from(self.chart_width))
                .set("y2", zero_y)
                .set("stroke", "gray")
                .set("stroke-dasharray", "6 4"),
        );

        let step = f64::from(self.chart_width) / metrics.len() as f64;
        let points: Vec<(f64, f64)> = metrics
            .iter()
            .enumerate()
            .map(|(i, m)| {
                (
                    self.plot_left() + step * (i as f64 + 0.5),
                    self.value_to_y(m.schedule_deviation_days as f64, -max_abs, max_abs),
                )
            })
            .collect();

        document = document.add(
            Polyline::new()
                .set("points", points_attr(&points))
                .set("fill", "none")
                .set("stroke", "#e67e22")
                .set("stroke-opacity", 0.5)
                .set("stroke-width", 2),
        );

        for (m, (x, y)) in metrics.iter().zip(&points) {
            let days = m.schedule_deviation_days;
            let (color, label) = match days.signum() {
                1 => (self.delay_color.as_str(), format!("+{days} d (delay)")),
                -1 => (self.ahead_color.as_str(), format!("{days} d (ahead)")),
                _ => (self.neutral_color.as_str(), "0 d (on time)".to_string()),
            };
            document = document.add(
                Group::new()
                    .set("class", "stage")
                    .add(
                        Circle::new()
                            .set("cx", *x)
                            .set("cy", *y)
                            .set("r", 6)
                            .set("fill", color),
                    )
                    .add(
                        self.text(label, *x, y - 10.0)
                            .set("text-anchor", "middle")
                            .set("fill", color),
                    )
                    .add(self.category_label(&m.stage_name, *x)),
            );
        }

        let legend_y = self.plot_top()
            + f64::from(self.chart_height)
            + f64::from(AXIS_LABEL_HEIGHT)
            + 15.0;
        document.add(self.legend(
            &[
                ("Delay", self.delay_color.as_str()),
                ("Ahead", self.ahead_color.as_str()),
                ("On time", self.neutral_color.as_str()),
            ],
            legend_y,
        ))
    }

    // ------------------------------------------------------------------------
    // Budget dynamics
    // ------------------------------------------------------------------------

    fn render_budget_dynamics(&self, snapshot: &AnalysisSnapshot) -> Document {
        let mut stages: Vec<_> = snapshot.stages.iter().collect();
        stages.sort_by_key(|s| s.planned_end);

        let planned: Vec<f64> = stages.iter().map(|s| to_f64(s.planned_budget)).collect();
        let actual: Vec<f64> = stages.iter().map(|s| to_f64(s.actual_budget)).collect();
        let max = planned.iter().chain(&actual).copied().fold(0.0, f64::max);
        let max = if max > 0.0 { max * 1.15 } else { 1.0 };

        let mut document = self
            .document(self.total_width(), self.value_chart_height(), &snapshot.project_name)
            .add(self.value_axis(0.0, max));

        let step = f64::from(self.chart_width) / stages.len() as f64;
        let xs: Vec<f64> = (0..stages.len())
            .map(|i| self.plot_left() + step * (i as f64 + 0.5))
            .collect();
        let y = |v: f64| self.value_to_y(v, 0.0, max);

        // Shade between the lines, split where they cross
        let mut fills = Group::new().set("class", "fill");
        for i in 1..xs.len() {
            let (x0, x1) = (xs[i - 1], xs[i]);
            let (d0, d1) = (actual[i - 1] - planned[i - 1], actual[i] - planned[i]);
            let segments = if d0 * d1 < 0.0 {
                let t = d0 / (d0 - d1);
                let xc = x0 + (x1 - x0) * t;
                let yc = y(planned[i - 1] + (planned[i] - planned[i - 1]) * t);
                vec![
                    (d0, vec![(x0, y(planned[i - 1])), (xc, yc), (x0, y(actual[i - 1]))]),
                    (d1, vec![(xc, yc), (x1, y(planned[i])), (x1, y(actual[i]))]),
                ]
            } else {
                vec![(
                    d0 + d1,
                    vec![
                        (x0, y(planned[i - 1])),
                        (x1, y(planned[i])),
                        (x1, y(actual[i])),
                        (x0, y(actual[i - 1])),
                    ],
                )]
            };
            for (sign, polygon) in segments {
                let color = if sign > 0.0 {
                    self.overrun_fill.as_str()
                } else if sign < 0.0 {
                    self.saving_fill.as_str()
                } else {
                    continue;
                };
                fills = fills.add(
                    Polygon::new()
                        .set("points", points_attr(&polygon))
                        .set("fill", color)
                        .set("fill-opacity", 0.5),
                );
            }
        }
        document = document.add(fills);

        for (values, color, label_dy) in [
            (&planned, self.plan_color.as_str(), -8.0),
            (&actual, self.actual_line_color.as_str(), 16.0),
        ] {
            let points: Vec<(f64, f64)> =
                xs.iter().zip(values.iter()).map(|(x, v)| (*x, y(*v))).collect();
            let mut line = Group::new()
                .set("class", "series")
                .add(
                    Polyline::new()
                        .set("points", points_attr(&points))
                        .set("fill", "none")
                        .set("stroke", color)
                        .set("stroke-width", 2),
                );
            for ((x, py), v) in points.iter().zip(values.iter()) {
                line = line
                    .add(
                        Circle::new()
                            .set("cx", *x)
                            .set("cy", *py)
                            .set("r", 4)
                            .set("fill", color),
                    )
                    .add(
                        self.text(format!("{v:.0}"), *x, py + label_dy)
                            .set("text-anchor", "middle")
                            .set("font-size", self.font_size - 3)
                            .set("fill", color),
                    );
            }
            document = document.add(line);
        }

        for (stage, x) in stages.iter().zip(&xs) {
            document = document.add(self.category_label(&stage.planned_end.to_string(), *x));
        }

        let legend_y = self.plot_top()
            + f64::from(self.chart_height)
            + f64::from(AXIS_LABEL_HEIGHT)
            + 15.0;
        document.add(self.legend(
            &[
                ("Planned budget", self.plan_color.as_str()),
                ("Actual budget", self.actual_line_color.as_str()),
                ("Overrun", self.overrun_fill.as_str()),
                ("Saving", self.saving_fill.as_str()),
            ],
            legend_y,
        ))
    }
}

impl Renderer for SvgChartRenderer {
    type Output = String;

    fn render(&self, snapshot: &AnalysisSnapshot) -> Result<String, RenderError> {
        if snapshot.is_empty() {
            return Err(RenderError::InvalidData("No stages to chart".into()));
        }
        debug!(kind = %self.kind, stages = snapshot.stages.len(), "rendering chart");

        let document = match self.kind {
            ChartKind::Gantt => self.render_gantt(snapshot),
            ChartKind::Budget => self.render_budget(snapshot),
            ChartKind::Resources => self.render_resources(snapshot)?,
            ChartKind::Deviation => self.render_deviation(snapshot),
            ChartKind::BudgetDynamics => self.render_budget_dynamics(snapshot),
        };
        Self::finish(&document)
    }
}

/// `x,y x,y ...` for polyline and polygon elements
fn points_attr(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{x:.1},{y:.1}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Short axis label: `950`, `12.5k`, `1.2M`
fn axis_label(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}k", value / 1_000.0)
    } else {
        format!("{value:.0}")
    }
}
