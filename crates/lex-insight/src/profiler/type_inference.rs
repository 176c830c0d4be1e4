//! Kind inference for a single column.

use crate::config::AnalysisConfig;
use crate::types::ColumnKind;
use crate::utils::{is_datetime_dtype, is_datetime_string, is_numeric_dtype};
use polars::prelude::*;

/// Assign a semantic kind from the declared type and the string form of the values.
///
/// Rules are applied in order and the first match wins:
/// all missing is text, numeric dtype is numeric, temporal dtype or
/// date-shaped strings is datetime, low cardinality is categorical,
/// everything else is text.
pub(crate) fn infer_column_kind(
    dtype: &DataType,
    values: &[Option<String>],
    distinct: usize,
    config: &AnalysisConfig,
) -> ColumnKind {
    let non_missing = values.iter().filter(|v| v.is_some()).count();
    if non_missing == 0 {
        return ColumnKind::Text;
    }

    if is_numeric_dtype(dtype) {
        return ColumnKind::Numeric;
    }

    if is_datetime_dtype(dtype)
        || (dtype == &DataType::String
            && looks_like_datetime(
                values,
                config.datetime_sample_size,
                config.datetime_match_ratio,
            ))
    {
        return ColumnKind::Datetime;
    }

    if distinct <= categorical_cap(values.len(), config) {
        ColumnKind::Categorical
    } else {
        ColumnKind::Text
    }
}

/// Largest distinct count still treated as categorical for a table of `rows` rows.
pub(crate) fn categorical_cap(rows: usize, config: &AnalysisConfig) -> usize {
    let by_ratio = (rows as f64 * config.categorical_unique_ratio).floor() as usize;
    config.categorical_max_unique.max(by_ratio)
}

/// Whether more than `ratio` of the first `sample_size` non-missing values parse as dates.
pub(crate) fn looks_like_datetime(values: &[Option<String>], sample_size: usize, ratio: f64) -> bool {
    let sample: Vec<&str> = values
        .iter()
        .filter_map(|v| v.as_deref())
        .take(sample_size)
        .collect();
    if sample.is_empty() {
        return false;
    }

    let parsed = sample.iter().filter(|s| is_datetime_string(s)).count();
    parsed as f64 / sample.len() as f64 > ratio
}
