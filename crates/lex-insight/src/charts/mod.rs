//! Chart rendering.
//!
//! Every render call is independent: it re-reads the columns it needs,
//! draws one SVG file under the renderer's output directory and returns a
//! [`ChartOutcome`]. Empty or degenerate data produces a placeholder chart
//! instead of an error; charts that make no sense for the table (no
//! datetime column, too many categories) come back as `NotApplicable`.

mod categorical;
mod distribution;
pub mod planner;
mod relational;
mod style;

pub use planner::{ChartPlan, ChartPlanner};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::loader::Table;
use crate::types::{ChartArtifact, ChartKind, ChartOutcome};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// How stacked-bar segments aggregate their rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Count,
    Sum,
    Mean,
}

/// Time bucket for time-series charts; buckets are averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resample {
    #[default]
    None,
    Day,
    Week,
    Month,
}

/// One chart to draw, with the columns it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartRequest {
    Histogram {
        column: String,
    },
    Heatmap {
        #[serde(default)]
        columns: Option<Vec<String>>,
    },
    Bar {
        column: String,
    },
    MissingValues,
    Pie {
        column: String,
    },
    Box {
        column: String,
        #[serde(default)]
        group: Option<String>,
    },
    StackedBar {
        group_col: String,
        stack_col: String,
        #[serde(default)]
        value_col: Option<String>,
        #[serde(default)]
        aggregation: Aggregation,
    },
    TimeSeries {
        value_col: String,
        #[serde(default)]
        date_col: Option<String>,
        #[serde(default)]
        resample: Resample,
    },
    Scatter {
        x: String,
        y: String,
    },
}

impl ChartRequest {
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartRequest::Histogram { .. } => ChartKind::Histogram,
            ChartRequest::Heatmap { .. } => ChartKind::Heatmap,
            ChartRequest::Bar { .. } => ChartKind::Bar,
            ChartRequest::MissingValues => ChartKind::MissingValues,
            ChartRequest::Pie { .. } => ChartKind::Pie,
            ChartRequest::Box { .. } => ChartKind::Box,
            ChartRequest::StackedBar { .. } => ChartKind::StackedBar,
            ChartRequest::TimeSeries { .. } => ChartKind::TimeSeries,
            ChartRequest::Scatter { .. } => ChartKind::Scatter,
        }
    }

    /// Columns named by the request, in argument order.
    pub fn columns(&self) -> Vec<String> {
        match self {
            ChartRequest::Histogram { column }
            | ChartRequest::Bar { column }
            | ChartRequest::Pie { column } => vec![column.clone()],
            ChartRequest::Heatmap { columns } => columns.clone().unwrap_or_default(),
            ChartRequest::MissingValues => Vec::new(),
            ChartRequest::Box { column, group } => {
                std::iter::once(column.clone()).chain(group.clone()).collect()
            }
            ChartRequest::StackedBar {
                group_col,
                stack_col,
                value_col,
                ..
            } => [group_col.clone(), stack_col.clone()]
                .into_iter()
                .chain(value_col.clone())
                .collect(),
            ChartRequest::TimeSeries {
                value_col,
                date_col,
                ..
            } => std::iter::once(value_col.clone())
                .chain(date_col.clone())
                .collect(),
            ChartRequest::Scatter { x, y } => vec![x.clone(), y.clone()],
        }
    }
}

/// Draws charts for a table into one output directory.
pub struct ChartRenderer<'a> {
    config: &'a AnalysisConfig,
    output_dir: &'a Path,
}

impl<'a> ChartRenderer<'a> {
    pub fn new(config: &'a AnalysisConfig, output_dir: &'a Path) -> Self {
        Self { config, output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        self.output_dir
    }

    /// Render any request.
    pub fn render(&self, table: &Table, request: &ChartRequest) -> Result<ChartOutcome> {
        match request {
            ChartRequest::Histogram { column } => self.histogram(table, column),
            ChartRequest::Heatmap { columns } => self.heatmap(table, columns.as_deref()),
            ChartRequest::Bar { column } => self.bar(table, column),
            ChartRequest::MissingValues => self.missing_values(table),
            ChartRequest::Pie { column } => self.pie(table, column),
            ChartRequest::Box { column, group } => self.box_plot(table, column, group.as_deref()),
            ChartRequest::StackedBar {
                group_col,
                stack_col,
                value_col,
                aggregation,
            } => self.stacked_bar(
                table,
                group_col,
                stack_col,
                value_col.as_deref(),
                *aggregation,
            ),
            ChartRequest::TimeSeries {
                value_col,
                date_col,
                resample,
            } => self.time_series(table, value_col, date_col.as_deref(), *resample),
            ChartRequest::Scatter { x, y } => self.scatter(table, x, y),
        }
    }

    fn size(&self) -> (u32, u32) {
        (self.config.chart_width, self.config.chart_height)
    }

    fn chart_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{}.svg", stem))
    }

    fn rendered(
        &self,
        kind: ChartKind,
        columns: Vec<String>,
        path: PathBuf,
        note: Option<String>,
    ) -> ChartOutcome {
        info!("Wrote {} chart to {}", kind, path.display());
        ChartOutcome::Rendered(ChartArtifact {
            kind,
            columns,
            path,
            placeholder: false,
            note,
        })
    }

    /// Write a placeholder chart and report it as such.
    fn placeholder(
        &self,
        kind: ChartKind,
        columns: Vec<String>,
        path: PathBuf,
        title: &str,
        note: &str,
    ) -> Result<ChartOutcome> {
        warn!("{} chart for {:?} is a placeholder: {}", kind, columns, note);
        style::render_svg(&path, self.size(), |root| {
            style::draw_placeholder(root, title, note)
        })?;
        Ok(ChartOutcome::Rendered(ChartArtifact {
            kind,
            columns,
            path,
            placeholder: true,
            note: Some(note.to_string()),
        }))
    }

    fn not_applicable(&self, kind: ChartKind, reason: impl Into<String>) -> ChartOutcome {
        let reason = reason.into();
        info!("Skipping {} chart: {}", kind, reason);
        ChartOutcome::not_applicable(kind, reason)
    }
}
