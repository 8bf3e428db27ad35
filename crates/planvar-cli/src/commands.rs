//! Subcommand implementations

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use planvar_core::{
    build_recommendations_from_table, AnalysisSnapshot, Config, MetricsRecord,
    RecommendationRecord, Renderer,
};
use planvar_import::{load_metrics_table, load_plan};
use planvar_render::export::{
    metrics_csv, metrics_csv_batch, recommendations_csv, to_json,
};
use planvar_render::text::{metrics_table, recommendations_text};
use planvar_render::{
    ChartKind, ExcelRenderer, HtmlReportRenderer, JsonExporter, OutlineRenderer,
    SvgChartRenderer, TextRenderer,
};

use crate::{ChartChoice, Commands, OutputFormat};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG: &str = "planvar.toml";

/// Settings shared by every subcommand
pub struct Session {
    config: Config,
    as_of: NaiveDate,
}

impl Session {
    pub fn open(config_path: Option<&Path>, as_of: Option<NaiveDate>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load(path)?,
            None if Path::new(DEFAULT_CONFIG).is_file() => Config::load(Path::new(DEFAULT_CONFIG))?,
            None => Config::default(),
        };
        Ok(Self {
            config,
            as_of: as_of.unwrap_or_else(|| chrono::Local::now().date_naive()),
        })
    }

    pub fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Check { file } => self.check(&file),
            Commands::Outline { file } => self.outline(&file),
            Commands::Summary { file } => self.summary(&file),
            Commands::Metrics {
                files,
                format,
                output,
            } => self.metrics(&files, format, output.as_deref()),
            Commands::Recommend {
                file,
                from_metrics,
                format,
                output,
            } => self.recommend(&file, from_metrics, format, output.as_deref()),
            Commands::Chart { file, kind, output } => self.chart(&file, kind, &output),
            Commands::Report { file, output } => self.report(&file, &output),
        }
    }

    /// Load a plan and run both engines over it
    fn analyze(&self, file: &Path) -> Result<AnalysisSnapshot> {
        let stages =
            load_plan(file).with_context(|| format!("failed to load {}", file.display()))?;
        let snapshot =
            AnalysisSnapshot::analyze(project_name(file), stages, self.as_of, &self.config.engine())
                .with_context(|| format!("failed to analyze {}", file.display()))?;
        info!(
            project = %snapshot.project_name,
            stages = snapshot.stages.len(),
            recommendations = snapshot.recommendations.len(),
            "analyzed plan"
        );
        Ok(snapshot)
    }

    fn check(&self, file: &Path) -> Result<()> {
        let snapshot = self.analyze(file)?;
        println!(
            "OK: {} ({} stages, {} recommendations)",
            file.display(),
            snapshot.stages.len(),
            snapshot.recommendations.len()
        );
        Ok(())
    }

    fn outline(&self, file: &Path) -> Result<()> {
        let snapshot = self.analyze(file)?;
        let tree = OutlineRenderer::new()
            .currency(&self.config.report.currency)
            .render(&snapshot)?;
        print!("{tree}");
        Ok(())
    }

    fn summary(&self, file: &Path) -> Result<()> {
        let snapshot = self.analyze(file)?;
        let text = TextRenderer::new()
            .currency(&self.config.report.currency)
            .render(&snapshot)?;
        print!("{text}");
        Ok(())
    }

    fn metrics(&self, files: &[PathBuf], format: OutputFormat, output: Option<&Path>) -> Result<()> {
        info!(files = files.len(), ?format, "computing metrics");
        let snapshots = files
            .par_iter()
            .map(|file| self.analyze(file))
            .collect::<Result<Vec<_>>>()?;

        let content = match (format, snapshots.as_slice()) {
            (OutputFormat::Text, [single]) => metrics_table(&single.metrics),
            (OutputFormat::Text, many) => many
                .iter()
                .map(|s| format!("== {} ==\n{}", s.project_name, metrics_table(&s.metrics)))
                .collect::<Vec<_>>()
                .join("\n"),
            (OutputFormat::Csv, [single]) => metrics_csv(&single.metrics)?,
            (OutputFormat::Csv, many) => {
                let batch: Vec<(&str, &[MetricsRecord])> = many
                    .iter()
                    .map(|s| (s.project_name.as_str(), s.metrics.as_slice()))
                    .collect();
                metrics_csv_batch(&batch)?
            }
            (OutputFormat::Json, [single]) => to_json(&single.metrics)?,
            (OutputFormat::Json, many) => {
                let projects: Vec<ProjectMetrics<'_>> = many
                    .iter()
                    .map(|s| ProjectMetrics {
                        project: &s.project_name,
                        metrics: &s.metrics,
                    })
                    .collect();
                to_json(&projects)?
            }
        };
        emit(output, &content)
    }

    fn recommend(
        &self,
        file: &Path,
        from_metrics: bool,
        format: OutputFormat,
        output: Option<&Path>,
    ) -> Result<()> {
        let recommendations: Vec<RecommendationRecord> = if from_metrics {
            info!(file = %file.display(), "building recommendations from displayed metrics");
            let rows = load_metrics_table(file)
                .with_context(|| format!("failed to load {}", file.display()))?;
            build_recommendations_from_table(&rows, &self.config.thresholds)?
        } else {
            self.analyze(file)?.recommendations
        };

        let content = match format {
            OutputFormat::Text => recommendations_text(&recommendations)?,
            OutputFormat::Json => to_json(&recommendations)?,
            OutputFormat::Csv => recommendations_csv(&recommendations)?,
        };
        emit(output, &content)
    }

    fn chart(&self, file: &Path, choice: ChartChoice, output: &Path) -> Result<()> {
        let snapshot = self.analyze(file)?;

        let Some(kind) = chart_kind(choice) else {
            fs::create_dir_all(output)
                .with_context(|| format!("failed to create {}", output.display()))?;
            for kind in ChartKind::ALL {
                // A chart with nothing to draw is skipped, the rest are still written
                let svg = match SvgChartRenderer::new(kind).render(&snapshot) {
                    Ok(svg) => svg,
                    Err(e) => {
                        warn!(chart = kind.as_str(), error = %e, "chart skipped");
                        continue;
                    }
                };
                let path = output.join(format!("{}-{}.svg", snapshot.project_name, kind.as_str()));
                write_chart(&svg, kind, &path)?;
            }
            return Ok(());
        };
        let svg = SvgChartRenderer::new(kind)
            .render(&snapshot)
            .with_context(|| format!("failed to render {kind} chart"))?;
        write_chart(&svg, kind, output)
    }

    fn report(&self, file: &Path, output: &Path) -> Result<()> {
        let snapshot = self.analyze(file)?;
        let extension = output
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let currency = &self.config.report.currency;

        let bytes = match extension.as_str() {
            "html" | "htm" => {
                let mut renderer = HtmlReportRenderer::new().currency(currency);
                if let Some(title) = &self.config.report.title {
                    renderer = renderer.title(title);
                }
                renderer.render(&snapshot)?.into_bytes()
            }
            "xlsx" => ExcelRenderer::new().currency(currency).render(&snapshot)?,
            "json" => JsonExporter.render(&snapshot)?.into_bytes(),
            other => bail!("Unsupported report format: .{other} (expected .html, .xlsx or .json)"),
        };

        fs::write(output, bytes).with_context(|| format!("failed to write {}", output.display()))?;
        info!(path = %output.display(), "report written");
        println!("Report written to {}", output.display());
        Ok(())
    }
}

#[derive(Serialize)]
struct ProjectMetrics<'a> {
    project: &'a str,
    metrics: &'a [MetricsRecord],
}

/// Project name shown in outputs: the plan file stem
fn project_name(file: &Path) -> String {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".into())
}

fn chart_kind(choice: ChartChoice) -> Option<ChartKind> {
    match choice {
        ChartChoice::Gantt => Some(ChartKind::Gantt),
        ChartChoice::Budget => Some(ChartKind::Budget),
        ChartChoice::Resources => Some(ChartKind::Resources),
        ChartChoice::Deviation => Some(ChartKind::Deviation),
        ChartChoice::BudgetDynamics => Some(ChartKind::BudgetDynamics),
        ChartChoice::All => None,
    }
}

fn write_chart(svg: &str, kind: ChartKind, path: &Path) -> Result<()> {
    fs::write(path, svg).with_context(|| format!("failed to write {}", path.display()))?;
    info!(%kind, path = %path.display(), "chart written");
    println!("Chart written to {}", path.display());
    Ok(())
}

/// Write to a file, or stdout when no path is given
fn emit(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "output written");
        }
        None => print!("{content}"),
    }
    Ok(())
}
