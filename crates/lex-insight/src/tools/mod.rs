//! Tool surface for an external driver.
//!
//! [`Toolkit`] exposes each analysis operation as a self-contained call:
//! it takes a file path and column names, re-loads the table, and writes
//! only inside the output directory it is given. [`ToolRegistry`] wraps the
//! toolkit in a fixed name-to-function table with JSON arguments.

mod registry;

pub use registry::{ObservationError, ToolDefinition, ToolObservation, ToolRegistry};

use crate::charts::{Aggregation, ChartRenderer, ChartRequest, Resample};
use crate::config::AnalysisConfig;
use crate::error::{InsightError, Result};
use crate::loader::Table;
use crate::profiler::ColumnClassifier;
use crate::reporting::ReportWriter;
use crate::stats::StatisticsEngine;
use crate::types::{
    AnalysisSummary, ChartOutcome, ColumnProfile, CorrelationMatrix, DescriptiveStats,
    FrequencyTable, OutlierReport, TableOverview,
};
use crate::utils::is_numeric_dtype;
use std::path::{Path, PathBuf};

/// Stateless analysis operations sharing one configuration.
#[derive(Debug, Clone, Default)]
pub struct Toolkit {
    config: AnalysisConfig,
}

impl Toolkit {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn table(&self, path: impl AsRef<Path>) -> Result<Table> {
        Table::load(path, &self.config)
    }

    /// Fail with the column's classified kind when it is not numeric.
    fn require_numeric(&self, table: &Table, column: &str) -> Result<()> {
        if is_numeric_dtype(table.dtype(column)?) || table.is_all_missing(column)? {
            return Ok(());
        }
        let profile = ColumnClassifier::classify_column(table, column, &self.config)?;
        Err(InsightError::invalid_kind(column, "numeric", profile.kind.as_str()))
    }

    pub fn load_table(&self, path: impl AsRef<Path>) -> Result<TableOverview> {
        self.table(path)?.overview()
    }

    pub fn classify_columns(
        &self,
        path: impl AsRef<Path>,
        columns: Option<&[String]>,
    ) -> Result<Vec<ColumnProfile>> {
        let table = self.table(path)?;
        ColumnClassifier::classify(&table, columns, &self.config)
    }

    pub fn compute_descriptive_stats(
        &self,
        path: impl AsRef<Path>,
        column: &str,
    ) -> Result<DescriptiveStats> {
        let table = self.table(path)?;
        self.require_numeric(&table, column)?;
        StatisticsEngine::describe(&table, column)
    }

    /// Statistics for every numeric column, in table order.
    pub fn compute_descriptive_stats_all(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Vec<DescriptiveStats>> {
        StatisticsEngine::describe_all(&self.table(path)?)
    }

    pub fn detect_outliers(&self, path: impl AsRef<Path>, column: &str) -> Result<OutlierReport> {
        let table = self.table(path)?;
        self.require_numeric(&table, column)?;
        StatisticsEngine::outliers(&table, column, &self.config)
    }

    /// Frequency table; `top_n` defaults to the configured value.
    pub fn compute_value_counts(
        &self,
        path: impl AsRef<Path>,
        column: &str,
        top_n: Option<usize>,
    ) -> Result<FrequencyTable> {
        let table = self.table(path)?;
        StatisticsEngine::value_counts(&table, column, top_n.unwrap_or(self.config.top_n))
    }

    pub fn compute_correlation(
        &self,
        path: impl AsRef<Path>,
        columns: Option<&[String]>,
    ) -> Result<CorrelationMatrix> {
        let table = self.table(path)?;
        for column in columns.unwrap_or_default() {
            self.require_numeric(&table, column)?;
        }
        StatisticsEngine::correlation(&table, columns)
    }

    /// Render any chart request into `output_dir`.
    pub fn render(
        &self,
        path: impl AsRef<Path>,
        request: &ChartRequest,
        output_dir: impl AsRef<Path>,
    ) -> Result<ChartOutcome> {
        let table = self.table(path)?;
        ChartRenderer::new(&self.config, output_dir.as_ref()).render(&table, request)
    }

    pub fn render_histogram(
        &self,
        path: impl AsRef<Path>,
        column: &str,
        output_dir: impl AsRef<Path>,
    ) -> Result<ChartOutcome> {
        let request = ChartRequest::Histogram {
            column: column.to_string(),
        };
        self.render(path, &request, output_dir)
    }

    pub fn render_heatmap(
        &self,
        path: impl AsRef<Path>,
        columns: Option<&[String]>,
        output_dir: impl AsRef<Path>,
    ) -> Result<ChartOutcome> {
        let request = ChartRequest::Heatmap {
            columns: columns.map(<[String]>::to_vec),
        };
        self.render(path, &request, output_dir)
    }

    pub fn render_bar(
        &self,
        path: impl AsRef<Path>,
        column: &str,
        output_dir: impl AsRef<Path>,
    ) -> Result<ChartOutcome> {
        let request = ChartRequest::Bar {
            column: column.to_string(),
        };
        self.render(path, &request, output_dir)
    }

    pub fn render_missing(
        &self,
        path: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> Result<ChartOutcome> {
        self.render(path, &ChartRequest::MissingValues, output_dir)
    }

    pub fn render_pie(
        &self,
        path: impl AsRef<Path>,
        column: &str,
        output_dir: impl AsRef<Path>,
    ) -> Result<ChartOutcome> {
        let request = ChartRequest::Pie {
            column: column.to_string(),
        };
        self.render(path, &request, output_dir)
    }

    pub fn render_box(
        &self,
        path: impl AsRef<Path>,
        column: &str,
        group: Option<&str>,
        output_dir: impl AsRef<Path>,
    ) -> Result<ChartOutcome> {
        let request = ChartRequest::Box {
            column: column.to_string(),
            group: group.map(str::to_string),
        };
        self.render(path, &request, output_dir)
    }

    pub fn render_stacked_bar(
        &self,
        path: impl AsRef<Path>,
        group_col: &str,
        stack_col: &str,
        value_col: Option<&str>,
        aggregation: Aggregation,
        output_dir: impl AsRef<Path>,
    ) -> Result<ChartOutcome> {
        let request = ChartRequest::StackedBar {
            group_col: group_col.to_string(),
            stack_col: stack_col.to_string(),
            value_col: value_col.map(str::to_string),
            aggregation,
        };
        self.render(path, &request, output_dir)
    }

    pub fn render_timeseries(
        &self,
        path: impl AsRef<Path>,
        value_col: &str,
        date_col: Option<&str>,
        resample: Resample,
        output_dir: impl AsRef<Path>,
    ) -> Result<ChartOutcome> {
        let request = ChartRequest::TimeSeries {
            value_col: value_col.to_string(),
            date_col: date_col.map(str::to_string),
            resample,
        };
        self.render(path, &request, output_dir)
    }

    pub fn render_scatter(
        &self,
        path: impl AsRef<Path>,
        x: &str,
        y: &str,
        output_dir: impl AsRef<Path>,
    ) -> Result<ChartOutcome> {
        let request = ChartRequest::Scatter {
            x: x.to_string(),
            y: y.to_string(),
        };
        self.render(path, &request, output_dir)
    }

    pub fn write_summary(
        &self,
        output_dir: impl Into<PathBuf>,
        summary: &AnalysisSummary,
    ) -> Result<PathBuf> {
        ReportWriter::new(output_dir).write_summary(summary)
    }

    /// Write report text composed by the driver itself.
    pub fn write_summary_text(&self, output_dir: impl Into<PathBuf>, text: &str) -> Result<PathBuf> {
        ReportWriter::new(output_dir).write_text(text)
    }
}
