//! Dataset loading.
//!
//! Reads a delimited file into a polars [`DataFrame`] wrapped in a [`Table`],
//! validating the record structure first so ragged rows are reported as parse
//! errors instead of being silently padded.

use crate::config::AnalysisConfig;
use crate::error::{InsightError, Result, ResultExt};
use crate::types::{ColumnInfo, TableOverview};
use crate::utils::{is_numeric_dtype, parse_datetime, percentage, round2};
use chrono::NaiveDateTime;
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions, NullValues};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Number of rows echoed back in [`TableOverview::head`].
const HEAD_ROWS: usize = 5;

/// An in-memory table. Columns have equal length and row order is stable.
#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
    frame: DataFrame,
}

impl Table {
    /// Load a delimited file from disk.
    pub fn load(path: impl AsRef<Path>, config: &AnalysisConfig) -> Result<Self> {
        let path = path.as_ref();
        let frame = read_frame(path, config)?;
        info!(
            "Loaded {}: {} rows x {} columns",
            path.display(),
            frame.height(),
            frame.width()
        );
        Ok(Self {
            path: path.to_path_buf(),
            frame,
        })
    }

    /// Wrap an existing frame (used by tests and embedding callers).
    pub fn from_frame(path: impl Into<PathBuf>, frame: DataFrame) -> Self {
        Self {
            path: path.into(),
            frame,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame
            .get_column_names()
            .iter()
            .any(|c| c.as_str() == name)
    }

    pub(crate) fn series(&self, name: &str) -> Result<&Series> {
        self.frame
            .column(name)
            .map(|c| c.as_materialized_series())
            .map_err(|_| InsightError::ColumnNotFound(name.to_string()))
    }

    /// Declared (parser-level) type of a column.
    pub fn dtype(&self, name: &str) -> Result<&DataType> {
        Ok(self.series(name)?.dtype())
    }

    pub fn missing_count(&self, name: &str) -> Result<usize> {
        Ok(self.series(name)?.null_count())
    }

    /// Whether every value of the column is missing.
    pub fn is_all_missing(&self, name: &str) -> Result<bool> {
        let series = self.series(name)?;
        Ok(series.null_count() == series.len())
    }

    /// Values of a numeric column as `f64`, with missing values (and NaN) as `None`.
    ///
    /// An all-missing column of any declared type yields all `None`.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let series = self.series(name)?;
        if series.null_count() == series.len() {
            return Ok(vec![None; series.len()]);
        }
        if !is_numeric_dtype(series.dtype()) {
            return Err(InsightError::invalid_kind(
                name,
                "numeric",
                format!("{} dtype", series.dtype()),
            ));
        }

        let floats = series.cast(&DataType::Float64)?;
        let values = floats
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        Ok(values)
    }

    /// Values of any column in their string form.
    pub fn string_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let series = self.series(name)?;
        let strings = series.cast(&DataType::String)?;
        let values = strings
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect();
        Ok(values)
    }

    /// Values of a column parsed as timestamps; unparseable cells become `None`.
    pub fn datetime_values(&self, name: &str) -> Result<Vec<Option<NaiveDateTime>>> {
        Ok(self
            .string_values(name)?
            .into_iter()
            .map(|v| v.as_deref().and_then(parse_datetime))
            .collect())
    }

    /// Shape, declared types, missing counts and the first rows.
    pub fn overview(&self) -> Result<TableOverview> {
        let rows = self.height();
        let mut columns = Vec::with_capacity(self.width());
        let mut missing_counts = BTreeMap::new();
        let mut missing_pct = BTreeMap::new();

        for column in self.frame.get_columns() {
            let name = column.name().to_string();
            let missing = column.null_count();
            missing_counts.insert(name.clone(), missing);
            missing_pct.insert(name.clone(), round2(percentage(missing, rows)));
            columns.push(ColumnInfo {
                name,
                dtype: column.dtype().to_string(),
            });
        }

        Ok(TableOverview {
            path: self.path.display().to_string(),
            shape: (rows, self.width()),
            columns,
            missing_counts,
            missing_pct,
            head: self.head_records(HEAD_ROWS)?,
        })
    }

    fn head_records(&self, limit: usize) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
        let rows = limit.min(self.height());
        let mut records = vec![serde_json::Map::new(); rows];

        for column in self.frame.get_columns() {
            let series = column.as_materialized_series();
            for (row, record) in records.iter_mut().enumerate() {
                let value = any_value_to_json(&series.get(row)?);
                record.insert(column.name().to_string(), value);
            }
        }

        Ok(records)
    }
}

/// Convert a polars cell to JSON without going through its quoted `Display`.
fn any_value_to_json(value: &AnyValue<'_>) -> serde_json::Value {
    use serde_json::Value;

    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::Int8(v) => Value::from(*v),
        AnyValue::Int16(v) => Value::from(*v),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::UInt8(v) => Value::from(*v),
        AnyValue::UInt16(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(*v),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Float32(v) => serde_json::Number::from_f64(f64::from(*v))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::Float64(v) => serde_json::Number::from_f64(*v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        other => Value::String(other.to_string()),
    }
}

fn read_frame(path: &Path, config: &AnalysisConfig) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(InsightError::FileNotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)?;
    let content = std::str::from_utf8(&bytes)
        .map_err(|e| InsightError::Parse(format!("file is not valid UTF-8: {}", e)))?;
    if content.trim().is_empty() {
        return Err(InsightError::Parse("file is empty".to_string()));
    }
    let width = validate_record_widths(content, config.delimiter)?;
    debug!("Validated record structure: {} fields per record", width);

    let null_values = NullValues::AllColumns(
        config
            .null_markers
            .iter()
            .map(|m| PlSmallStr::from(m.as_str()))
            .collect(),
    );
    let parse_options = CsvParseOptions::default()
        .with_separator(config.delimiter)
        .with_quote_char(Some(b'"'))
        .with_null_values(Some(null_values));

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(config.infer_schema_length)
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| InsightError::Parse(e.to_string()))
        .context(format!("reading {}", path.display()))
}

/// Check that every record has the header's field count.
///
/// Quoted fields may contain delimiters, doubled quotes and line breaks.
/// Blank lines are ignored. Returns the header width.
fn validate_record_widths(content: &str, delimiter: u8) -> Result<usize> {
    let bytes = content.as_bytes();
    let mut expected: Option<usize> = None;
    let mut fields = 1;
    let mut in_quotes = false;
    let mut record_is_blank = true;
    let mut line = 1;
    let mut record_line = 1;
    let mut i = 0;

    let mut finish_record = |fields: usize, record_line: usize| -> Result<()> {
        match expected {
            None => {
                expected = Some(fields);
                Ok(())
            }
            Some(width) if width == fields => Ok(()),
            Some(width) => Err(InsightError::Parse(format!(
                "line {} has {} fields, expected {}",
                record_line, fields, width
            ))),
        }
    };

    while i < bytes.len() {
        let b = bytes[i];
        if in_quotes {
            match b {
                b'"' if bytes.get(i + 1) == Some(&b'"') => i += 1,
                b'"' => in_quotes = false,
                b'\n' => line += 1,
                _ => {}
            }
        } else if b == b'"' {
            in_quotes = true;
            record_is_blank = false;
        } else if b == delimiter {
            fields += 1;
            record_is_blank = false;
        } else if b == b'\n' || b == b'\r' {
            if b == b'\r' && bytes.get(i + 1) == Some(&b'\n') {
                i += 1;
            }
            if !record_is_blank {
                finish_record(fields, record_line)?;
            }
            line += 1;
            record_line = line;
            fields = 1;
            record_is_blank = true;
        } else {
            record_is_blank = false;
        }
        i += 1;
    }

    if in_quotes {
        return Err(InsightError::Parse(format!(
            "unterminated quoted field starting on line {}",
            record_line
        )));
    }
    if !record_is_blank {
        finish_record(fields, record_line)?;
    }

    expected.ok_or_else(|| InsightError::Parse("file has no header row".to_string()))
}
