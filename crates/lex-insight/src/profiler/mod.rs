//! Column classification.
//!
//! Assigns every column one [`ColumnKind`] from its declared type and a
//! look at its values. Classification is deterministic: the same table and
//! configuration always produce the same profiles.

mod type_inference;

use crate::config::AnalysisConfig;
use crate::error::{InsightError, Result};
use crate::loader::Table;
use crate::types::{ColumnKind, ColumnProfile};
use std::collections::HashSet;
use tracing::debug;

use type_inference::infer_column_kind;

/// Number of example values kept per column.
const SAMPLE_VALUES: usize = 5;

/// Classifier for table columns.
pub struct ColumnClassifier;

impl ColumnClassifier {
    /// Classify the requested columns, or every column when `columns` is `None`.
    ///
    /// Profiles follow the caller's order for an explicit list and table
    /// order otherwise. Unknown names fail with `ColumnNotFound`.
    pub fn classify(
        table: &Table,
        columns: Option<&[String]>,
        config: &AnalysisConfig,
    ) -> Result<Vec<ColumnProfile>> {
        let names = match columns {
            Some(requested) => {
                if let Some(missing) = requested.iter().find(|c| !table.has_column(c)) {
                    return Err(InsightError::ColumnNotFound(missing.clone()));
                }
                requested.to_vec()
            }
            None => table.column_names(),
        };

        names
            .iter()
            .map(|name| Self::classify_column(table, name, config))
            .collect()
    }

    /// Classify a single column.
    pub fn classify_column(
        table: &Table,
        name: &str,
        config: &AnalysisConfig,
    ) -> Result<ColumnProfile> {
        let dtype = table.dtype(name)?.clone();
        let values = table.string_values(name)?;
        let missing_count = values.iter().filter(|v| v.is_none()).count();

        let mut seen = HashSet::new();
        let mut sample_values = Vec::new();
        for value in values.iter().flatten() {
            if seen.insert(value.as_str()) && sample_values.len() < SAMPLE_VALUES {
                sample_values.push(value.clone());
            }
        }
        let unique_count = seen.len();

        let kind = infer_column_kind(&dtype, &values, unique_count, config);
        debug!(
            "Column '{}' ({}) classified as {} with {} distinct values",
            name, dtype, kind, unique_count
        );

        Ok(ColumnProfile {
            name: name.to_string(),
            dtype: dtype.to_string(),
            kind,
            missing_count,
            unique_count,
            sample_values,
        })
    }
}

/// Names of the profiled columns with the given kind, in profile order.
pub fn columns_of_kind(profiles: &[ColumnProfile], kind: ColumnKind) -> Vec<String> {
    profiles
        .iter()
        .filter(|p| p.kind == kind)
        .map(|p| p.name.clone())
        .collect()
}
