//! End-to-end analysis run.
//!
//! [`run_analysis`] is the deterministic counterpart of an agent-driven
//! session: it calls the same operations the tool registry exposes, in the
//! fixed order load, classify, statistics, charts and report.

use crate::charts::{ChartPlanner, ChartRenderer};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::loader::Table;
use crate::profiler::{ColumnClassifier, columns_of_kind};
use crate::reporting::ReportWriter;
use crate::stats::StatisticsEngine;
use crate::types::{
    AnalysisSummary, ChartOutcome, ColumnKind, CorrelationMatrix, OutlierReport, SkippedChart,
    TableOverview,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outlier share above which a column is called out in the key findings.
const OUTLIER_FINDING_PCT: f64 = 5.0;

/// Everything produced by one run.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub summary: AnalysisSummary,
    pub report_path: PathBuf,
    pub json_path: PathBuf,
}

/// Analyze a CSV file and write charts and reports into `output_dir`.
pub fn run_analysis(
    path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisRun> {
    let start_time = Instant::now();
    let path = path.as_ref();
    let output_dir = output_dir.as_ref();
    config.validate()?;

    info!("Starting analysis of {}", path.display());

    info!("Step 1: Loading table...");
    let table = Table::load(path, config)?;
    let overview = table.overview()?;

    info!("Step 2: Classifying columns...");
    let profiles = ColumnClassifier::classify(&table, None, config)?;

    info!("Step 3: Computing statistics...");
    let descriptive = StatisticsEngine::describe_all(&table)?;
    let numeric = StatisticsEngine::numeric_columns(&table)?;
    let mut outliers = Vec::with_capacity(numeric.len());
    for column in &numeric {
        outliers.push(StatisticsEngine::outliers(&table, column, config)?);
    }
    let mut frequencies = Vec::new();
    for column in columns_of_kind(&profiles, ColumnKind::Categorical) {
        frequencies.push(StatisticsEngine::value_counts(&table, &column, config.top_n)?);
    }
    let correlation = StatisticsEngine::correlation(&table, None)?;

    info!("Step 4: Rendering charts...");
    let plan = ChartPlanner::new(config).plan(&profiles, &correlation);
    let renderer = ChartRenderer::new(config, output_dir);
    let mut charts = Vec::new();
    let mut skipped_charts = plan.skipped;
    for request in &plan.requests {
        match renderer.render(&table, request) {
            Ok(ChartOutcome::Rendered(artifact)) => charts.push(artifact),
            Ok(ChartOutcome::NotApplicable { kind, reason }) => {
                skipped_charts.push(SkippedChart {
                    kind,
                    columns: request.columns(),
                    reason,
                });
            }
            Err(e) if e.is_input_error() => {
                warn!("Skipping {} chart: {}", request.kind(), e);
                skipped_charts.push(SkippedChart {
                    kind: request.kind(),
                    columns: request.columns(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }
    debug!(
        "{} charts rendered, {} skipped",
        charts.len(),
        skipped_charts.len()
    );

    info!("Step 5: Writing summary...");
    let key_findings = key_findings(&overview, &outliers, &correlation);
    let summary = AnalysisSummary {
        source: path.display().to_string(),
        generated_at: Some(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
        overview,
        profiles,
        descriptive,
        outliers,
        frequencies,
        correlation,
        charts,
        skipped_charts,
        key_findings,
    };

    let writer = ReportWriter::new(output_dir);
    let report_path = writer.write_summary(&summary)?;
    let json_path = writer.write_summary_json(&summary)?;

    info!(
        "Analysis completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(AnalysisRun {
        summary,
        report_path,
        json_path,
    })
}

/// Headline observations: strongest correlation, outlier-heavy columns and
/// the column with the most missing values.
pub fn key_findings(
    overview: &TableOverview,
    outliers: &[OutlierReport],
    correlation: &CorrelationMatrix,
) -> Vec<String> {
    let mut findings = Vec::new();

    if let Some(pair) = correlation.strongest_pair() {
        findings.push(format!(
            "Strongest correlation: {} and {} (r = {:.2})",
            pair.a, pair.b, pair.r
        ));
    }

    for report in outliers {
        if report.outlier_pct > OUTLIER_FINDING_PCT {
            findings.push(format!(
                "{} has {} outliers ({:.2}% of values)",
                report.column, report.outlier_count, report.outlier_pct
            ));
        }
    }

    // first column wins ties
    let most_missing = overview
        .columns
        .iter()
        .filter_map(|c| {
            let count = overview.missing_counts.get(&c.name).copied()?;
            (count > 0).then_some((c.name.as_str(), count))
        })
        .fold(None, |best: Option<(&str, usize)>, (name, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((name, count)),
        });
    if let Some((name, count)) = most_missing {
        let pct = overview.missing_pct.get(name).copied().unwrap_or_default();
        findings.push(format!(
            "{} has the most missing values: {} ({:.2}%)",
            name, count, pct
        ));
    }

    findings
}
