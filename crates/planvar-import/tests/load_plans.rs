//! File-level import tests
//!
//! The same three-stage plan is stored in four layouts; all of them must load
//! to identical stages.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use planvar_core::StageRecord;
use planvar_import::{load_metrics_table, load_plan, ImportError};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn names(stages: &[StageRecord]) -> Vec<&str> {
    stages.iter().map(|s| s.name.as_str()).collect()
}

#[test]
fn russian_csv() {
    let stages = load_plan(&fixture("house_ru.csv")).unwrap();
    assert_eq!(names(&stages), vec!["Фундамент", "Стены", "Кровля"]);

    let walls = &stages[1];
    assert_eq!(walls.owner, "Сидоров");
    assert_eq!(walls.planned_start, date(1, 12));
    assert_eq!(walls.actual_end, date(2, 3));
    assert_eq!(walls.planned_budget, dec!(2500.50));
    assert_eq!(walls.resource_units, 2.0);
}

#[test]
fn english_semicolon_csv_matches_russian() {
    let ru = load_plan(&fixture("house_ru.csv")).unwrap();
    let en = load_plan(&fixture("house_en_semicolon.csv")).unwrap();
    assert_eq!(en.len(), ru.len());
    for (a, b) in en.iter().zip(&ru) {
        assert_eq!(a.planned_start, b.planned_start);
        assert_eq!(a.planned_end, b.planned_end);
        assert_eq!(a.actual_start, b.actual_start);
        assert_eq!(a.actual_end, b.actual_end);
        assert_eq!(a.planned_budget, b.planned_budget);
        assert_eq!(a.actual_budget, b.actual_budget);
    }
}

#[test]
fn json_layouts_agree() {
    let records = load_plan(&fixture("house_records.json")).unwrap();
    let columns = load_plan(&fixture("house_columns.json")).unwrap();
    let csv = load_plan(&fixture("house_ru.csv")).unwrap();

    // Same stages as the CSV, with Russian names in the records layout
    assert_eq!(records, csv);

    assert_eq!(names(&columns), vec!["Foundation", "Walls", "Roof"]);
    for (a, b) in columns.iter().zip(&csv) {
        assert_eq!(a.planned_days(), b.planned_days());
        assert_eq!(a.actual_days(), b.actual_days());
        assert_eq!(a.planned_start, b.planned_start);
        assert_eq!(a.actual_budget, b.actual_budget);
    }
}

#[test]
fn unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plan.xlsx");
    fs::write(&path, b"PK").unwrap();
    let err = load_plan(&path).unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat(ref ext) if ext == ".xlsx"));
    assert_eq!(err.to_string(), "Unsupported file format: .xlsx");
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_plan(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, ImportError::Io(_)));
}

#[test]
fn missing_columns_message_lists_names() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.csv");
    fs::write(&path, "stage,owner\nA,B\n").unwrap();
    let err = load_plan(&path).unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("Missing columns: "));
    assert!(msg.contains("Дата начала"));
    assert!(msg.contains("Ресурсы"));
    assert!(!msg.contains("Этап"));
}

#[test]
fn invalid_date_anywhere_fails_the_load() {
    let original = fs::read_to_string(fixture("house_ru.csv")).unwrap();
    let broken = original.replace("2024-02-12,2024-02-04", "2024-02-31,2024-02-04");
    assert_ne!(original, broken);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.csv");
    fs::write(&path, broken).unwrap();
    let err = load_plan(&path).unwrap_err();
    assert!(
        matches!(err, ImportError::Validation(ref m) if m.contains("invalid dates") && m.contains("Кровля"))
    );
}

#[test]
fn metrics_table_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metrics.csv");
    fs::write(&path, "stage,ΔT,ΔC,E\nFoundation,50.00 %,20.00 %,0.33\n").unwrap();
    let rows = load_metrics_table(&path).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].budget_deviation, "20.00 %");
}
