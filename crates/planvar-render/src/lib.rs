//! # planvar-render
//!
//! Output backends for planvar analysis snapshots.
//!
//! This crate provides:
//! - Console text tables and the project outline tree
//! - CSV and JSON exports of metrics and recommendations
//! - SVG charts (Gantt, budget comparison, resource share, deviation, budget dynamics)
//! - Excel workbooks
//! - A self-contained HTML analysis report with inline charts
//!
//! ## Example
//!
//! ```rust,ignore
//! use planvar_core::{AnalysisSnapshot, Renderer};
//! use planvar_render::{ChartKind, ExcelRenderer, HtmlReportRenderer, SvgChartRenderer, TextRenderer};
//!
//! let text = TextRenderer::new().render(&snapshot)?;
//! let gantt = SvgChartRenderer::new(ChartKind::Gantt).render(&snapshot)?;
//! let html = HtmlReportRenderer::new().title("Quarterly review").render(&snapshot)?;
//! let xlsx = ExcelRenderer::new().currency("RUB").render(&snapshot)?;
//! std::fs::write("analysis.xlsx", xlsx)?;
//! ```

pub mod charts;
pub mod excel;
pub mod export;
pub mod html;
pub mod text;

pub use charts::{ChartKind, SvgChartRenderer};
pub use excel::ExcelRenderer;
pub use export::{CsvExporter, CsvTable, JsonExporter};
pub use html::HtmlReportRenderer;
pub use text::{OutlineRenderer, TextRenderer};

use planvar_core::{AnalysisSnapshot, ProjectSummary, RenderError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// HTML/XML-escape a string
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Truncate a string with ellipsis
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!(
            "{}…",
            s.chars().take(max.saturating_sub(1)).collect::<String>()
        )
    }
}

/// Amount with space-grouped thousands and two decimals (`1 250 000.50`)
pub(crate) fn format_amount(value: Decimal) -> String {
    let rounded = value
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let fixed = format!("{rounded:.2}");
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*c);
    }

    let sign = if value.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}

/// Map a text formatting failure into a render error
pub(crate) fn fmt_error(e: std::fmt::Error) -> RenderError {
    RenderError::Format(format!("Failed to write text: {e}"))
}

/// Project summary of a snapshot whose totals may not be representable
pub(crate) fn summary_of(snapshot: &AnalysisSnapshot) -> Result<ProjectSummary, RenderError> {
    snapshot
        .summary()
        .map_err(|e| RenderError::InvalidData(e.to_string()))
}

/// Lossy conversion for chart geometry
pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
