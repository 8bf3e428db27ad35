//! End-to-end tests for the planvar binary
//!
//! ## Exit Code Contract
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success |
//! | 1 | Any error, reported once on stderr |
//!
//! Every command runs inside a fresh temporary directory so a stray
//! `planvar.toml` cannot leak into the results.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn planvar_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("target/debug/planvar")
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(planvar_binary())
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("PLANVAR_CONFIG")
        .args(["--as-of", "2024-03-01"])
        .args(args)
        .output()
        .expect("failed to execute planvar")
}

fn run(args: &[&str]) -> Output {
    let dir = TempDir::new().unwrap();
    run_in(dir.path(), args)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

// =============================================================================
// check / outline
// =============================================================================

#[test]
fn check_valid_plan() {
    let house = fixture("house.csv");
    let output = run(&["check", path_str(&house)]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("3 stages"));
}

#[test]
fn check_russian_headers() {
    let house = fixture("house_ru.csv");
    let output = run(&["check", path_str(&house)]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
}

#[test]
fn check_missing_columns_fails_once() {
    let dir = TempDir::new().unwrap();
    let plan = dir.path().join("partial.csv");
    fs::write(&plan, "stage,owner\nFoundation,Petrov\n").unwrap();

    let output = run_in(dir.path(), &["check", path_str(&plan)]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Missing columns"));
    assert_eq!(err.matches("error:").count(), 1);
}

#[test]
fn check_missing_file() {
    let output = run(&["check", "/nonexistent/plan.csv"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn invalid_as_of_is_a_failure() {
    let house = fixture("house.csv");
    let output = Command::new(planvar_binary())
        .args(["--as-of", "someday", "check", path_str(&house)])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn outline_lists_stages() {
    let house = fixture("house.csv");
    let output = run(&["outline", path_str(&house)]);
    assert_eq!(output.status.code(), Some(0));
    let tree = stdout(&output);
    assert!(tree.contains("Foundation"));
    assert!(tree.contains("Owner: Sidorov"));
    assert!(tree.contains("RUB"));
}

#[test]
fn summary_prints_full_console_report() {
    let house = fixture("house.csv");
    let output = run(&["summary", path_str(&house)]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("Project: house (as of 2024-03-01)"));
    for heading in ["Project data", "Calculated metrics", "Recommendations", "Summary"] {
        assert!(text.contains(heading), "missing {heading}");
    }
    assert!(text.contains("Not Started 0, In Progress 0, Completed 3, Overdue 0"));
}

#[test]
fn unrepresentable_totals_fail_cleanly() {
    let dir = TempDir::new().unwrap();
    let plan = fixture("huge_budgets.csv");
    let xlsx = dir.path().join("report.xlsx");
    let output = run_in(dir.path(), &["report", path_str(&plan), "-o", path_str(&xlsx)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Amount out of range: total planned budget"));
    assert!(!stderr(&output).contains("panicked"));
    assert!(!xlsx.exists());
}

// =============================================================================
// metrics
// =============================================================================

#[test]
fn metrics_csv_shows_displayed_values() {
    let house = fixture("house.csv");
    let output = run(&["metrics", path_str(&house), "--format", "csv"]);
    assert_eq!(output.status.code(), Some(0));
    let csv = stdout(&output);
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("stage,ΔT,ΔC,E"));
    assert_eq!(lines.next(), Some("Foundation,50.00 %,20.00 %,0.33"));
}

#[test]
fn metrics_for_several_files_in_json() {
    let house = fixture("house.csv");
    let house_ru = fixture("house_ru.csv");
    let output = run(&[
        "metrics",
        path_str(&house),
        path_str(&house_ru),
        "--format",
        "json",
    ]);
    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value[0]["project"], "house");
    assert_eq!(value[1]["project"], "house_ru");
    assert_eq!(value[1]["metrics"][0]["stage_name"], "Фундамент");
}

#[test]
fn metrics_batch_csv_to_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("metrics.csv");
    let house = fixture("house.csv");
    let house_ru = fixture("house_ru.csv");
    let output = run_in(
        dir.path(),
        &[
            "metrics",
            path_str(&house),
            path_str(&house_ru),
            "--format",
            "csv",
            "-o",
            path_str(&out),
        ],
    );
    assert_eq!(output.status.code(), Some(0));
    let csv = fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("project,stage,ΔT,ΔC,E\n"));
    assert_eq!(csv.lines().count(), 7);
}

#[test]
fn zero_planned_duration_rejected_by_default() {
    let plan = fixture("kickoff_zero_days.csv");
    let output = run(&["metrics", path_str(&plan)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Division by zero in stage 'Kickoff'"));
}

#[test]
fn sentinel_policy_from_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("planvar.toml"),
        "[engine]\ndivision_policy = \"sentinel\"\n",
    )
    .unwrap();
    let plan = fixture("kickoff_zero_days.csv");

    let output = run_in(dir.path(), &["metrics", path_str(&plan), "--format", "csv"]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stdout(&output).contains("Kickoff,n/a,0.00 %,"));
}

#[test]
fn explicit_config_must_exist() {
    let house = fixture("house.csv");
    let output = run(&["--config", "/nonexistent/planvar.toml", "check", path_str(&house)]);
    assert_eq!(output.status.code(), Some(1));
}

// =============================================================================
// recommend
// =============================================================================

#[test]
fn recommend_text() {
    let house = fixture("house.csv");
    let output = run(&["recommend", path_str(&house)]);
    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("[schedule-delay] Foundation"));
    assert!(text.contains("[budget-overrun] Foundation"));
}

#[test]
fn recommend_from_displayed_metrics() {
    let metrics = fixture("metrics_displayed.csv");
    let output = run(&[
        "recommend",
        path_str(&metrics),
        "--from-metrics",
        "--format",
        "csv",
    ]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let csv = stdout(&output);
    assert!(csv.contains("Foundation,schedule-delay,major"));
    assert!(csv.contains("Walls,efficiency-normal"));
}

#[test]
fn recommend_from_non_numeric_metrics_fails() {
    let metrics = fixture("metrics_broken.csv");
    let output = run(&["recommend", path_str(&metrics), "--from-metrics"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("'abc %' is not numeric"));
}

// =============================================================================
// chart / report
// =============================================================================

#[test]
fn chart_single_kind() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("gantt.svg");
    let house = fixture("house.csv");
    let output = run_in(
        dir.path(),
        &["chart", path_str(&house), "--kind", "gantt", "-o", path_str(&out)],
    );
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(fs::read_to_string(&out).unwrap().contains("<svg"));
}

#[test]
fn chart_all_kinds_into_directory() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("charts");
    let house = fixture("house.csv");
    let output = run_in(
        dir.path(),
        &["chart", path_str(&house), "--kind", "all", "-o", path_str(&out)],
    );
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    for kind in ["gantt", "budget", "resources", "deviation", "budget-dynamics"] {
        assert!(out.join(format!("house-{kind}.svg")).is_file(), "missing {kind}");
    }
}

#[test]
fn chart_all_skips_kinds_without_data() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("charts");
    let plan = fixture("no_resources.csv");
    let output = run_in(
        dir.path(),
        &["chart", path_str(&plan), "--kind", "all", "-o", path_str(&out)],
    );
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stderr(&output).contains("chart skipped"));
    assert!(!out.join("no_resources-resources.svg").exists());
    for kind in ["gantt", "budget", "deviation", "budget-dynamics"] {
        assert!(out.join(format!("no_resources-{kind}.svg")).is_file(), "missing {kind}");
    }
}

#[test]
fn chart_single_kind_without_data_fails() {
    let dir = TempDir::new().unwrap();
    let plan = fixture("no_resources.csv");
    let svg = dir.path().join("resources.svg");
    let output = run_in(
        dir.path(),
        &["chart", path_str(&plan), "--kind", "resources", "-o", path_str(&svg)],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(!svg.exists());
}

#[test]
fn report_by_extension() {
    let dir = TempDir::new().unwrap();
    let house = fixture("house.csv");

    let html = dir.path().join("report.html");
    let output = run_in(dir.path(), &["report", path_str(&house), "-o", path_str(&html)]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(fs::read_to_string(&html)
        .unwrap()
        .contains("Project Analysis Report: house"));

    let xlsx = dir.path().join("report.xlsx");
    let output = run_in(dir.path(), &["report", path_str(&house), "-o", path_str(&xlsx)]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(&fs::read(&xlsx).unwrap()[0..2], b"PK");

    let json = dir.path().join("report.json");
    let output = run_in(dir.path(), &["report", path_str(&house), "-o", path_str(&json)]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(value["summary"]["stage_count"], 3);
}

#[test]
fn report_title_from_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("planvar.toml"),
        "[report]\ntitle = \"Cottage build\"\ncurrency = \"EUR\"\n",
    )
    .unwrap();
    let house = fixture("house.csv");
    let html = dir.path().join("report.html");

    let output = run_in(dir.path(), &["report", path_str(&house), "-o", path_str(&html)]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let content = fs::read_to_string(&html).unwrap();
    assert!(content.contains("<h1>Cottage build</h1>"));
    assert!(content.contains("Planned budget, EUR"));
}

#[test]
fn report_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let house = fixture("house.csv");
    let docx = dir.path().join("report.docx");
    let output = run_in(dir.path(), &["report", path_str(&house), "-o", path_str(&docx)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Unsupported report format: .docx"));
    assert!(!docx.exists());
}
