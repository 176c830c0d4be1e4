//! Tabular Dataset Analysis Toolset
//!
//! Deterministic operations an external driver (a person, a script or an
//! LLM agent) calls to characterize a CSV file and render it visually.
//!
//! # Overview
//!
//! - **Loader**: reads a delimited file into a polars frame and reports its shape
//! - **Classifier**: assigns each column a semantic kind (numeric, categorical, datetime, text)
//! - **Statistics**: descriptive statistics, IQR outliers, frequency tables, Pearson correlation
//! - **Charts**: nine SVG chart kinds plus a planner that picks charts for a table
//! - **Reports**: a sectioned text summary and a JSON copy
//! - **Tools**: a fixed registry mapping tool names to JSON-argument functions
//!
//! Data flows forward only: loader, classifier, statistics and charts, report.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_insight::{AnalysisConfig, Toolkit, run_analysis};
//!
//! // One-shot analysis with the default chart selection
//! let run = run_analysis("sales.csv", "out", &AnalysisConfig::default())?;
//! println!("Report: {}", run.report_path.display());
//!
//! // Individual operations, as an agent would call them
//! let toolkit = Toolkit::new(AnalysisConfig::default());
//! let stats = toolkit.compute_descriptive_stats("sales.csv", "revenue")?;
//! let outliers = toolkit.detect_outliers("sales.csv", "revenue")?;
//! ```
//!
//! # Tool Registry
//!
//! [`ToolRegistry`] exposes the toolkit to a tool-calling driver:
//!
//! ```rust,ignore
//! use lex_insight::ToolRegistry;
//! use serde_json::json;
//!
//! let registry = ToolRegistry::default();
//! let definitions = registry.definitions();
//!
//! let observation = registry.observe(
//!     "compute_value_counts",
//!     &json!({ "path": "sales.csv", "column": "region", "top_n": 5 }),
//! );
//! if !observation.success {
//!     // hand the error code and message back to the driver
//! }
//! ```

pub mod charts;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod stats;
pub mod tools;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use charts::{Aggregation, ChartPlan, ChartPlanner, ChartRenderer, ChartRequest, Resample};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ConfigValidationError};
pub use error::{InsightError, Result, ResultExt};
pub use loader::Table;
pub use pipeline::{AnalysisRun, run_analysis};
pub use profiler::{ColumnClassifier, columns_of_kind};
pub use reporting::{ReportWriter, SUMMARY_JSON_FILE, SUMMARY_TEXT_FILE};
pub use stats::StatisticsEngine;
pub use tools::{ObservationError, ToolDefinition, ToolObservation, ToolRegistry, Toolkit};
pub use types::{
    AnalysisSummary, ChartArtifact, ChartKind, ChartOutcome, ColumnInfo, ColumnKind,
    ColumnProfile, CorrelationMatrix, CorrelationPair, DescriptiveStats, FrequencyEntry,
    FrequencyTable, OutlierReport, SkippedChart, TableOverview,
};

static_assertions::assert_impl_all!(Toolkit: Send, Sync, Clone);
static_assertions::assert_impl_all!(ToolRegistry: Send, Sync);
static_assertions::assert_impl_all!(InsightError: Send, Sync, std::error::Error);
