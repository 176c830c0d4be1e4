//! Statistics engine.
//!
//! Table-level entry points over the pure functions in the submodules:
//! descriptive statistics, IQR outliers, frequency tables and Pearson
//! correlation. Missing values are always excluded, never zero-filled.

pub mod correlation;
pub mod descriptive;
pub mod frequency;
pub mod outliers;

use crate::config::AnalysisConfig;
use crate::error::{InsightError, Result};
use crate::loader::Table;
use crate::types::{CorrelationMatrix, DescriptiveStats, FrequencyTable, OutlierReport};
use crate::utils::is_numeric_dtype;
use tracing::debug;

/// Statistics over the columns of a [`Table`].
pub struct StatisticsEngine;

impl StatisticsEngine {
    /// Descriptive statistics for one numeric column.
    ///
    /// An all-missing column yields an empty record instead of an error.
    pub fn describe(table: &Table, column: &str) -> Result<DescriptiveStats> {
        let values = table.numeric_values(column)?;
        Ok(descriptive::summarize(column, &values))
    }

    /// Descriptive statistics for every numeric column, in table order.
    pub fn describe_all(table: &Table) -> Result<Vec<DescriptiveStats>> {
        Self::numeric_columns(table)?
            .iter()
            .map(|name| Self::describe(table, name))
            .collect()
    }

    pub fn outliers(table: &Table, column: &str, config: &AnalysisConfig) -> Result<OutlierReport> {
        let values = table.numeric_values(column)?;
        let report = outliers::iqr_outliers(
            column,
            &values,
            config.iqr_multiplier,
            config.outlier_sample_size,
        );
        debug!(
            "Column '{}': {} outliers ({}%)",
            column, report.outlier_count, report.outlier_pct
        );
        Ok(report)
    }

    /// Frequency table of any column, compared by string form.
    pub fn value_counts(table: &Table, column: &str, top_n: usize) -> Result<FrequencyTable> {
        if top_n == 0 {
            return Err(InsightError::InvalidArguments(
                "top_n must be at least 1".to_string(),
            ));
        }
        let values = table.string_values(column)?;
        Ok(frequency::value_counts(column, &values, top_n))
    }

    /// Correlation matrix over the named columns, or all numeric columns.
    ///
    /// Columns with fewer than two non-missing values are left out.
    pub fn correlation(table: &Table, columns: Option<&[String]>) -> Result<CorrelationMatrix> {
        let names = match columns {
            Some(requested) => requested.to_vec(),
            None => Self::numeric_columns(table)?,
        };

        let mut data = Vec::with_capacity(names.len());
        for name in names {
            let values = table.numeric_values(&name)?;
            let present = values.iter().filter(|v| v.is_some()).count();
            if present < 2 {
                debug!("Dropping '{}' from correlation: {} values", name, present);
                continue;
            }
            data.push((name, values));
        }

        Ok(correlation::correlation_matrix(&data))
    }

    /// Numeric columns with at least one value, in table order.
    pub fn numeric_columns(table: &Table) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for name in table.column_names() {
            if is_numeric_dtype(table.dtype(&name)?) && !table.is_all_missing(&name)? {
                names.push(name);
            }
        }
        Ok(names)
    }
}
