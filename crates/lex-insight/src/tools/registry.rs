//! Name-to-function table for the external driver.
//!
//! Every tool takes a JSON object of arguments and returns a JSON value.
//! Failures can be turned into observations carrying the error code and
//! message, which is how the driver learns to correct its next call.

use super::Toolkit;
use crate::charts::ChartRequest;
use crate::error::{InsightError, Result};
use crate::types::{AnalysisSummary, ChartKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use tracing::debug;

/// Render tools and the chart kind each one draws.
const RENDER_TOOLS: [(&str, ChartKind); 9] = [
    ("render_histogram", ChartKind::Histogram),
    ("render_heatmap", ChartKind::Heatmap),
    ("render_bar", ChartKind::Bar),
    ("render_missing", ChartKind::MissingValues),
    ("render_pie", ChartKind::Pie),
    ("render_box", ChartKind::Box),
    ("render_stacked_bar", ChartKind::StackedBar),
    ("render_timeseries", ChartKind::TimeSeries),
    ("render_scatter", ChartKind::Scatter),
];

/// Tool definition handed to the driver.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the argument object.
    pub parameters: Value,
}

/// Error half of an observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationError {
    pub code: String,
    pub message: String,
}

/// Result of a tool call as reported back to the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolObservation {
    pub success: bool,
    pub output: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ObservationError>,
}

impl ToolObservation {
    pub fn success(output: Value) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn error(err: &InsightError) -> Self {
        Self {
            success: false,
            output: Value::Null,
            error: Some(ObservationError {
                code: err.error_code().to_string(),
                message: err.to_string(),
            }),
        }
    }
}

#[derive(Deserialize)]
struct PathArgs {
    path: PathBuf,
}

#[derive(Deserialize)]
struct ColumnArgs {
    path: PathBuf,
    column: String,
}

#[derive(Deserialize)]
struct ColumnsArgs {
    path: PathBuf,
    #[serde(default)]
    columns: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct ValueCountsArgs {
    path: PathBuf,
    column: String,
    #[serde(default)]
    top_n: Option<usize>,
}

#[derive(Deserialize)]
struct RenderArgs {
    path: PathBuf,
    output_dir: PathBuf,
}

#[derive(Deserialize)]
struct SummaryArgs {
    output_dir: PathBuf,
    #[serde(default)]
    summary: Option<AnalysisSummary>,
    #[serde(default)]
    summary_text: Option<String>,
}

/// Fixed registry of analysis tools backed by a [`Toolkit`].
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    toolkit: Toolkit,
}

impl ToolRegistry {
    pub fn new(toolkit: Toolkit) -> Self {
        Self { toolkit }
    }

    pub fn toolkit(&self) -> &Toolkit {
        &self.toolkit
    }

    /// Names of every registered tool, in definition order.
    pub fn names(&self) -> Vec<String> {
        self.definitions().into_iter().map(|d| d.name).collect()
    }

    /// Invoke a tool by name and report the outcome as an observation.
    pub fn observe(&self, name: &str, args: &Value) -> ToolObservation {
        match self.invoke(name, args) {
            Ok(output) => ToolObservation::success(output),
            Err(err) => {
                debug!("Tool '{}' failed: {}", name, err);
                ToolObservation::error(&err)
            }
        }
    }

    /// Invoke a tool by name.
    pub fn invoke(&self, name: &str, args: &Value) -> Result<Value> {
        debug!("Executing tool: {} with args: {}", name, args);

        let toolkit = &self.toolkit;
        match name {
            "load_table" => {
                let a: PathArgs = parse(name, args)?;
                to_output(toolkit.load_table(&a.path)?)
            }
            "classify_columns" => {
                let a: ColumnsArgs = parse(name, args)?;
                to_output(toolkit.classify_columns(&a.path, a.columns.as_deref())?)
            }
            "compute_descriptive_stats" => {
                let a: ColumnArgs = parse(name, args)?;
                to_output(toolkit.compute_descriptive_stats(&a.path, &a.column)?)
            }
            "compute_descriptive_stats_all" => {
                let a: PathArgs = parse(name, args)?;
                to_output(toolkit.compute_descriptive_stats_all(&a.path)?)
            }
            "detect_outliers" => {
                let a: ColumnArgs = parse(name, args)?;
                to_output(toolkit.detect_outliers(&a.path, &a.column)?)
            }
            "compute_value_counts" => {
                let a: ValueCountsArgs = parse(name, args)?;
                to_output(toolkit.compute_value_counts(&a.path, &a.column, a.top_n)?)
            }
            "compute_correlation" => {
                let a: ColumnsArgs = parse(name, args)?;
                to_output(toolkit.compute_correlation(&a.path, a.columns.as_deref())?)
            }
            "write_summary" => {
                let a: SummaryArgs = parse(name, args)?;
                let path = match (a.summary, a.summary_text) {
                    (Some(summary), _) => toolkit.write_summary(a.output_dir, &summary)?,
                    (None, Some(text)) => toolkit.write_summary_text(a.output_dir, &text)?,
                    (None, None) => {
                        return Err(InsightError::InvalidArguments(
                            "write_summary needs either 'summary' or 'summary_text'".to_string(),
                        ));
                    }
                };
                Ok(json!({ "path": path }))
            }
            _ => {
                let Some((_, kind)) = RENDER_TOOLS.iter().find(|(tool, _)| *tool == name) else {
                    return Err(InsightError::UnknownTool(name.to_string()));
                };
                let a: RenderArgs = parse(name, args)?;
                let request = chart_request(name, *kind, args)?;
                to_output(toolkit.render(&a.path, &request, &a.output_dir)?)
            }
        }
    }

    /// Definitions of every tool with the JSON schema of its arguments.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let path = json!({ "type": "string", "description": "Path to the CSV file" });
        let column = json!({ "type": "string", "description": "Column name" });
        let columns = json!({
            "type": "array",
            "items": { "type": "string" },
            "description": "Column names; omit to use every numeric column"
        });
        let output_dir = json!({
            "type": "string",
            "description": "Directory the output file is written to"
        });

        vec![
            define(
                "load_table",
                "Load a CSV file and report its shape, columns, dtypes, missing values and first rows.",
                json!({ "path": path }),
                &["path"],
            ),
            define(
                "classify_columns",
                "Classify columns as numeric, categorical, datetime or text.",
                json!({
                    "path": path,
                    "columns": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Columns to classify; omit for all columns"
                    }
                }),
                &["path"],
            ),
            define(
                "compute_descriptive_stats",
                "Count, mean, std, min, quartiles, max, skewness and kurtosis of a numeric column.",
                json!({ "path": path, "column": column }),
                &["path", "column"],
            ),
            define(
                "compute_descriptive_stats_all",
                "Descriptive statistics for every numeric column.",
                json!({ "path": path }),
                &["path"],
            ),
            define(
                "detect_outliers",
                "Detect outliers in a numeric column with the 1.5 x IQR rule.",
                json!({ "path": path, "column": column }),
                &["path", "column"],
            ),
            define(
                "compute_value_counts",
                "Most frequent values of a column with counts and percentages.",
                json!({
                    "path": path,
                    "column": column,
                    "top_n": { "type": "integer", "minimum": 1, "description": "Number of values to keep" }
                }),
                &["path", "column"],
            ),
            define(
                "compute_correlation",
                "Pearson correlation matrix of numeric columns.",
                json!({ "path": path, "columns": columns }),
                &["path"],
            ),
            define(
                "render_histogram",
                "Histogram with a density curve for a numeric column.",
                json!({ "path": path, "column": column, "output_dir": output_dir }),
                &["path", "column", "output_dir"],
            ),
            define(
                "render_heatmap",
                "Annotated correlation heatmap of numeric columns.",
                json!({ "path": path, "columns": columns, "output_dir": output_dir }),
                &["path", "output_dir"],
            ),
            define(
                "render_bar",
                "Bar chart of the most frequent values of a categorical column.",
                json!({ "path": path, "column": column, "output_dir": output_dir }),
                &["path", "column", "output_dir"],
            ),
            define(
                "render_missing",
                "Bar chart of missing values per column.",
                json!({ "path": path, "output_dir": output_dir }),
                &["path", "output_dir"],
            ),
            define(
                "render_pie",
                "Donut chart of a categorical column with few categories.",
                json!({ "path": path, "column": column, "output_dir": output_dir }),
                &["path", "column", "output_dir"],
            ),
            define(
                "render_box",
                "Box plot of a numeric column, optionally grouped by a categorical column.",
                json!({
                    "path": path,
                    "column": column,
                    "group": { "type": "string", "description": "Categorical column to group by" },
                    "output_dir": output_dir
                }),
                &["path", "column", "output_dir"],
            ),
            define(
                "render_stacked_bar",
                "Stacked bar chart of one categorical column broken down by another.",
                json!({
                    "path": path,
                    "group_col": { "type": "string", "description": "Column on the x axis" },
                    "stack_col": { "type": "string", "description": "Column forming the stacks" },
                    "value_col": { "type": "string", "description": "Numeric column for sum or mean" },
                    "aggregation": { "type": "string", "enum": ["count", "sum", "mean"] },
                    "output_dir": output_dir
                }),
                &["path", "group_col", "stack_col", "output_dir"],
            ),
            define(
                "render_timeseries",
                "Line chart of a numeric column over a datetime column.",
                json!({
                    "path": path,
                    "value_col": { "type": "string", "description": "Numeric column to plot" },
                    "date_col": { "type": "string", "description": "Datetime column; omit to use the first one" },
                    "resample": { "type": "string", "enum": ["none", "day", "week", "month"] },
                    "output_dir": output_dir
                }),
                &["path", "value_col", "output_dir"],
            ),
            define(
                "render_scatter",
                "Scatter plot of two numeric columns with a regression line.",
                json!({
                    "path": path,
                    "x": { "type": "string", "description": "Column on the x axis" },
                    "y": { "type": "string", "description": "Column on the y axis" },
                    "output_dir": output_dir
                }),
                &["path", "x", "y", "output_dir"],
            ),
            define(
                "write_summary",
                "Write the analysis summary report. Pass 'summary' (structured findings) or 'summary_text'.",
                json!({
                    "output_dir": output_dir,
                    "summary": { "type": "object", "description": "Structured analysis findings" },
                    "summary_text": { "type": "string", "description": "Report text written verbatim" }
                }),
                &["output_dir"],
            ),
        ]
    }
}

fn define(name: &str, description: &str, properties: Value, required: &[&str]) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        parameters: json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    }
}

fn parse<T: DeserializeOwned>(tool: &str, args: &Value) -> Result<T> {
    T::deserialize(args).map_err(|e| InsightError::InvalidArguments(format!("{}: {}", tool, e)))
}

fn to_output<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Build a chart request from the tool arguments plus the tool's kind tag.
fn chart_request(tool: &str, kind: ChartKind, args: &Value) -> Result<ChartRequest> {
    let mut object = match args {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        _ => {
            return Err(InsightError::InvalidArguments(format!(
                "{}: arguments must be an object",
                tool
            )));
        }
    };
    object.insert("kind".to_string(), Value::String(kind.as_str().to_string()));
    parse(tool, &Value::Object(object))
}
