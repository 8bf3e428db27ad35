//! Excel analysis workbook renderer
//!
//! Generates an XLSX file with four sheets:
//! - Project Data: the plan with stage status and budget totals
//! - Metrics: durations, deviations and efficiency per stage
//! - Recommendations: one row per advisory, tinted by severity
//! - Summary: headline figures and recommendation counts
//!
//! ## Example Output Structure
//!
//! ```text
//! Sheet: Metrics
//! | Stage      | Planned, d | Actual, d | ΔT, d | ΔT      | ΔC, RUB | ΔC      | E    |
//! |------------|------------|-----------|-------|---------|---------|---------|------|
//! | Foundation | 10         | 15        | 5     | 50.00 % | 200.00  | 20.00 % | 0.33 |
//! ```
//!
//! Undefined ratios (zero denominators under the sentinel policy) are written
//! as the text `n/a`.

use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use planvar_core::metrics::UNDEFINED;
use planvar_core::{
    AnalysisSnapshot, Category, RenderError, Renderer, Severity, StageRecord,
};

use crate::{summary_of, to_f64};

/// Excel analysis workbook renderer
#[derive(Clone, Debug)]
pub struct ExcelRenderer {
    /// Currency label used in headers and number formats
    pub currency: String,
    /// Whether to include the Summary sheet
    pub include_summary: bool,
    /// Whether totals are SUM formulas (vs static values)
    pub use_formulas: bool,
}

impl Default for ExcelRenderer {
    fn default() -> Self {
        Self {
            currency: "RUB".into(),
            include_summary: true,
            use_formulas: true,
        }
    }
}

struct ExcelFormats {
    header: Format,
    text: Format,
    wrap: Format,
    currency: Format,
    number: Format,
    integer: Format,
    percent: Format,
    ratio: Format,
    total_row: Format,
    total_currency: Format,
    major: Format,
    minor: Format,
}

fn xlsx_error(e: XlsxError) -> RenderError {
    RenderError::Format(e.to_string())
}

impl ExcelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set currency label
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Disable Summary sheet
    pub fn no_summary(mut self) -> Self {
        self.include_summary = false;
        self
    }

    /// Use static values instead of formulas
    pub fn static_values(mut self) -> Self {
        self.use_formulas = false;
        self
    }

    /// Generate Excel workbook bytes
    pub fn render_to_bytes(&self, snapshot: &AnalysisSnapshot) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let formats = self.create_formats();

        self.add_project_sheet(&mut workbook, snapshot, &formats)?;
        Self::add_metrics_sheet(&mut workbook, snapshot, &formats, &self.currency)?;
        Self::add_recommendations_sheet(&mut workbook, snapshot, &formats)?;
        if self.include_summary {
            self.add_summary_sheet(&mut workbook, snapshot, &formats)?;
        }

        workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
    }

    fn create_formats(&self) -> ExcelFormats {
        let money = format!("#,##0.00 \"{}\"", self.currency);

        ExcelFormats {
            header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(0x2C3E50)
                .set_font_color(0xFFFFFF)
                .set_border(FormatBorder::Thin),
            text: Format::new().set_border(FormatBorder::Thin),
            wrap: Format::new()
                .set_text_wrap()
                .set_align(FormatAlign::Top)
                .set_border(FormatBorder::Thin),
            currency: Format::new()
                .set_num_format(&money)
                .set_border(FormatBorder::Thin),
            number: Format::new()
                .set_num_format("#,##0.0")
                .set_border(FormatBorder::Thin),
            integer: Format::new()
                .set_num_format("#,##0")
                .set_border(FormatBorder::Thin),
            percent: Format::new()
                .set_num_format("0.00\" %\"")
                .set_border(FormatBorder::Thin),
            ratio: Format::new()
                .set_num_format("0.00")
                .set_border(FormatBorder::Thin),
            total_row: Format::new()
                .set_bold()
                .set_background_color(0xE2EFDA)
                .set_border(FormatBorder::Thin),
            total_currency: Format::new()
                .set_bold()
                .set_num_format(&money)
                .set_background_color(0xE2EFDA)
                .set_border(FormatBorder::Thin),
            major: Format::new()
                .set_text_wrap()
                .set_align(FormatAlign::Top)
                .set_background_color(0xFFC7CE)
                .set_border(FormatBorder::Thin),
            minor: Format::new()
                .set_text_wrap()
                .set_align(FormatAlign::Top)
                .set_background_color(0xFFEB9C)
                .set_border(FormatBorder::Thin),
        }
    }

    fn write_headers(
        sheet: &mut Worksheet,
        headers: &[&str],
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, *header, &formats.header)
                .map_err(xlsx_error)?;
        }
        sheet.set_freeze_panes(1, 0).ok();
        Ok(())
    }

    /// Write an optional decimal, or the undefined marker
    fn write_optional(
        sheet: &mut Worksheet,
        row: u32,
        col: u16,
        value: Option<Decimal>,
        format: &Format,
    ) -> Result<(), RenderError> {
        match value {
            Some(v) => sheet.write_with_format(row, col, to_f64(v), format),
            None => sheet.write_with_format(row, col, UNDEFINED, format),
        }
        .map_err(xlsx_error)?;
        Ok(())
    }

    /// Add Project Data sheet
    fn add_project_sheet(
        &self,
        workbook: &mut Workbook,
        snapshot: &AnalysisSnapshot,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Project Data").map_err(xlsx_error)?;

        let planned_header = format!("Planned budget, {}", self.currency);
        let actual_header = format!("Actual budget, {}", self.currency);
        Self::write_headers(
            sheet,
            &[
                "Stage",
                "Owner",
                "Planned start",
                "Planned end",
                "Actual start",
                "Actual end",
                planned_header.as_str(),
                actual_header.as_str(),
                "Resources",
                "Status",
            ],
            formats,
        )?;
        for (col, width) in [25, 20, 12, 12, 12, 12, 18, 18, 10, 12].into_iter().enumerate() {
            sheet.set_column_width(col as u16, width).ok();
        }

        if snapshot.is_empty() {
            sheet
                .write_with_format(1, 0, "No project data available.", &formats.text)
                .map_err(xlsx_error)?;
            return Ok(());
        }

        let statuses = snapshot.statuses();
        let mut row = 1u32;
        for (stage, status) in snapshot.stages.iter().zip(&statuses) {
            Self::write_stage_row(sheet, row, stage, formats)?;
            sheet
                .write_with_format(row, 9, status.as_str(), &formats.text)
                .map_err(xlsx_error)?;
            row += 1;
        }

        // Total row
        sheet
            .write_with_format(row, 0, "TOTAL", &formats.total_row)
            .map_err(xlsx_error)?;
        for col in [1, 2, 3, 4, 5, 9] {
            sheet
                .write_with_format(row, col, "", &formats.total_row)
                .map_err(xlsx_error)?;
        }

        if self.use_formulas {
            for (col, letter) in [(6u16, 'G'), (7, 'H')] {
                let formula = format!("=SUM({letter}2:{letter}{row})");
                sheet
                    .write_formula_with_format(row, col, formula.as_str(), &formats.total_currency)
                    .map_err(xlsx_error)?;
            }
            let formula = format!("=SUM(I2:I{row})");
            sheet
                .write_formula_with_format(row, 8, formula.as_str(), &formats.total_row)
                .map_err(xlsx_error)?;
        } else {
            let summary = summary_of(snapshot)?;
            sheet
                .write_with_format(row, 6, to_f64(summary.total_planned_budget), &formats.total_currency)
                .map_err(xlsx_error)?;
            sheet
                .write_with_format(row, 7, to_f64(summary.total_actual_budget), &formats.total_currency)
                .map_err(xlsx_error)?;
            sheet
                .write_with_format(row, 8, summary.total_resource_units, &formats.total_row)
                .map_err(xlsx_error)?;
        }

        Ok(())
    }

    fn write_stage_row(
        sheet: &mut Worksheet,
        row: u32,
        stage: &StageRecord,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        sheet
            .write_with_format(row, 0, &stage.name, &formats.text)
            .map_err(xlsx_error)?;
        sheet
            .write_with_format(row, 1, &stage.owner, &formats.text)
            .map_err(xlsx_error)?;
        let dates = [
            stage.planned_start,
            stage.planned_end,
            stage.actual_start,
            stage.actual_end,
        ];
        for (offset, date) in dates.iter().enumerate() {
            sheet
                .write_with_format(
                    row,
                    2 + offset as u16,
                    date.format("%Y-%m-%d").to_string(),
                    &formats.text,
                )
                .map_err(xlsx_error)?;
        }
        sheet
            .write_with_format(row, 6, to_f64(stage.planned_budget), &formats.currency)
            .map_err(xlsx_error)?;
        sheet
            .write_with_format(row, 7, to_f64(stage.actual_budget), &formats.currency)
            .map_err(xlsx_error)?;
        sheet
            .write_with_format(row, 8, stage.resource_units, &formats.number)
            .map_err(xlsx_error)?;
        Ok(())
    }

    /// Add Metrics sheet
    fn add_metrics_sheet(
        workbook: &mut Workbook,
        snapshot: &AnalysisSnapshot,
        formats: &ExcelFormats,
        currency: &str,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Metrics").map_err(xlsx_error)?;

        let budget_header = format!("ΔC, {currency}");
        Self::write_headers(
            sheet,
            &[
                "Stage",
                "Planned, d",
                "Actual, d",
                "ΔT, d",
                "ΔT",
                budget_header.as_str(),
                "ΔC",
                "E",
            ],
            formats,
        )?;
        sheet.set_column_width(0, 25).ok();
        for col in 1..8 {
            sheet.set_column_width(col, 12).ok();
        }

        if snapshot.metrics.is_empty() {
            sheet
                .write_with_format(1, 0, "No metrics available.", &formats.text)
                .map_err(xlsx_error)?;
            return Ok(());
        }

        for (i, m) in snapshot.metrics.iter().enumerate() {
            let row = i as u32 + 1;
            sheet
                .write_with_format(row, 0, &m.stage_name, &formats.text)
                .map_err(xlsx_error)?;
            for (col, days) in [
                (1u16, m.planned_duration_days),
                (2, m.actual_duration_days),
                (3, m.schedule_deviation_days),
            ] {
                sheet
                    .write_with_format(row, col, days as f64, &formats.integer)
                    .map_err(xlsx_error)?;
            }
            Self::write_optional(sheet, row, 4, m.schedule_deviation_pct, &formats.percent)?;
            sheet
                .write_with_format(row, 5, to_f64(m.budget_deviation), &formats.currency)
                .map_err(xlsx_error)?;
            Self::write_optional(sheet, row, 6, m.budget_deviation_pct, &formats.percent)?;
            Self::write_optional(sheet, row, 7, m.resource_efficiency, &formats.ratio)?;
        }
        Ok(())
    }

    /// Add Recommendations sheet
    fn add_recommendations_sheet(
        workbook: &mut Workbook,
        snapshot: &AnalysisSnapshot,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Recommendations").map_err(xlsx_error)?;

        Self::write_headers(
            sheet,
            &[
                "Stage",
                "Category",
                "Severity",
                "Problem",
                "Cause",
                "Recommendation",
                "Expected effect",
            ],
            formats,
        )?;
        for (col, width) in [25, 18, 10, 40, 40, 50, 40].into_iter().enumerate() {
            sheet.set_column_width(col as u16, width).ok();
        }

        if snapshot.recommendations.is_empty() {
            sheet
                .write_with_format(1, 0, "No recommendations available.", &formats.text)
                .map_err(xlsx_error)?;
            return Ok(());
        }

        for (i, r) in snapshot.recommendations.iter().enumerate() {
            let row = i as u32 + 1;
            let (format, severity) = match r.severity {
                Severity::Major => (&formats.major, "major"),
                Severity::Minor => (&formats.minor, "minor"),
                Severity::None => (&formats.wrap, ""),
            };
            let cells = [
                r.stage_name.as_str(),
                r.category.as_str(),
                severity,
                r.problem_summary.as_str(),
                r.cause_hypothesis.as_str(),
                r.recommended_action.as_str(),
                r.expected_effect.as_str(),
            ];
            for (col, cell) in cells.into_iter().enumerate() {
                sheet
                    .write_with_format(row, col as u16, cell, format)
                    .map_err(xlsx_error)?;
            }
        }
        Ok(())
    }

    /// Add Summary sheet
    fn add_summary_sheet(
        &self,
        workbook: &mut Workbook,
        snapshot: &AnalysisSnapshot,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let summary = summary_of(snapshot)?;
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary").map_err(xlsx_error)?;

        sheet
            .merge_range(0, 0, 0, 1, "PROJECT SUMMARY", &formats.header)
            .map_err(xlsx_error)?;

        let text_rows = [
            (2, "Project:", snapshot.project_name.clone()),
            (3, "As of:", snapshot.as_of.format("%Y-%m-%d").to_string()),
        ];
        for (row, label, value) in text_rows {
            sheet
                .write_with_format(row, 0, label, &formats.text)
                .map_err(xlsx_error)?;
            sheet
                .write_with_format(row, 1, value, &formats.text)
                .map_err(xlsx_error)?;
        }

        let planned_label = format!("Planned budget ({}):", self.currency);
        let actual_label = format!("Actual budget ({}):", self.currency);
        let number_rows: [(u32, &str, f64, &Format); 9] = [
            (4, "Stages:", summary.stage_count as f64, &formats.integer),
            (5, planned_label.as_str(), to_f64(summary.total_planned_budget), &formats.currency),
            (6, actual_label.as_str(), to_f64(summary.total_actual_budget), &formats.currency),
            (8, "Planned days (sum):", summary.total_planned_days as f64, &formats.integer),
            (9, "Actual days (sum):", summary.total_actual_days as f64, &formats.integer),
            (10, "Stages late:", summary.delayed_stages as f64, &formats.integer),
            (11, "Stages early:", summary.ahead_stages as f64, &formats.integer),
            (12, "Stages on time:", summary.on_time_stages as f64, &formats.integer),
            (13, "Resource units:", summary.total_resource_units, &formats.number),
        ];
        for (row, label, value, format) in number_rows {
            sheet
                .write_with_format(row, 0, label, &formats.text)
                .map_err(xlsx_error)?;
            sheet
                .write_with_format(row, 1, value, format)
                .map_err(xlsx_error)?;
        }
        sheet
            .write_with_format(7, 0, "Budget deviation:", &formats.text)
            .map_err(xlsx_error)?;
        Self::write_optional(sheet, 7, 1, summary.budget_deviation_pct, &formats.percent)?;

        sheet
            .merge_range(15, 0, 15, 1, "RECOMMENDATIONS", &formats.header)
            .map_err(xlsx_error)?;
        let mut row = 16u32;
        for category in Category::ALL {
            sheet
                .write_with_format(row, 0, category.as_str(), &formats.text)
                .map_err(xlsx_error)?;
            sheet
                .write_with_format(row, 1, summary.recommendations_in(category) as f64, &formats.integer)
                .map_err(xlsx_error)?;
            row += 1;
        }
        sheet
            .write_with_format(row, 0, "TOTAL", &formats.total_row)
            .map_err(xlsx_error)?;
        sheet
            .write_with_format(row, 1, summary.recommendation_count() as f64, &formats.total_row)
            .map_err(xlsx_error)?;

        sheet.set_column_width(0, 28).ok();
        sheet.set_column_width(1, 22).ok();
        Ok(())
    }
}

impl Renderer for ExcelRenderer {
    type Output = Vec<u8>;

    fn render(&self, snapshot: &AnalysisSnapshot) -> Result<Vec<u8>, RenderError> {
        self.render_to_bytes(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use planvar_core::config::EngineConfig;
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn snapshot(config: &EngineConfig) -> AnalysisSnapshot {
        let stages = vec![
            StageRecord::new("Foundation")
                .owner("Petrov")
                .planned(date(1, 1), date(1, 11))
                .actual(date(1, 1), date(1, 16))
                .budget(dec!(1000), dec!(1200))
                .resources(3.0),
            StageRecord::new("Kickoff")
                .owner("Ivanova")
                .planned(date(1, 1), date(1, 1))
                .actual(date(1, 1), date(1, 2))
                .budget(dec!(0), dec!(50))
                .resources(1.0),
        ];
        AnalysisSnapshot::analyze("House", stages, date(2, 1), config).unwrap()
    }

    #[test]
    fn renderer_builder() {
        let renderer = ExcelRenderer::new().currency("EUR").no_summary().static_values();
        assert_eq!(renderer.currency, "EUR");
        assert!(!renderer.include_summary);
        assert!(!renderer.use_formulas);
    }

    #[test]
    fn produces_xlsx_bytes() {
        let xlsx = ExcelRenderer::new()
            .render(&snapshot(&EngineConfig::sentinel()))
            .unwrap();
        assert!(xlsx.len() > 100);
        assert_eq!(&xlsx[0..2], b"PK");
    }

    #[test]
    fn static_values_and_no_summary() {
        let xlsx = ExcelRenderer::new()
            .static_values()
            .no_summary()
            .render(&snapshot(&EngineConfig::sentinel()))
            .unwrap();
        assert_eq!(&xlsx[0..2], b"PK");
    }

    #[test]
    fn empty_snapshot_still_renders() {
        let snap = AnalysisSnapshot::analyze("Empty", vec![], date(1, 1), &EngineConfig::default())
            .unwrap();
        let xlsx = ExcelRenderer::new().render(&snap).unwrap();
        assert_eq!(&xlsx[0..2], b"PK");
    }

    #[test]
    fn unrepresentable_totals_are_an_error() {
        let half = Decimal::from_i128_with_scale(5 * 10_i128.pow(28), 0);
        let stage = |name: &str| {
            StageRecord::new(name)
                .planned(date(1, 1), date(1, 11))
                .actual(date(1, 1), date(1, 11))
                .budget(half, half)
        };
        let snap = AnalysisSnapshot {
            project_name: "Huge".into(),
            as_of: date(2, 1),
            stages: vec![stage("A"), stage("B")],
            metrics: vec![],
            recommendations: vec![],
        };

        let result = ExcelRenderer::new().render(&snap);
        assert!(matches!(result, Err(RenderError::InvalidData(_))));
        let result = ExcelRenderer::new().static_values().no_summary().render(&snap);
        assert!(matches!(result, Err(RenderError::InvalidData(_))));
    }
}
