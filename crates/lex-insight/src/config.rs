//! Configuration types for the analysis toolset.
//!
//! All thresholds that steer classification, statistics and chart selection
//! live here. They are handed explicitly to a [`crate::Toolkit`]; there is no
//! global configuration.

use serde::{Deserialize, Serialize};

/// Default markers treated as missing in addition to empty fields.
pub const DEFAULT_NULL_MARKERS: [&str; 8] =
    ["NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A"];

/// Configuration for loading, classifying, analyzing and charting a table.
///
/// Use [`AnalysisConfig::builder()`] to create a validated configuration
/// with a fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use lex_insight::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .top_n(5)
///     .scatter_correlation_threshold(0.5)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Field delimiter of the input file.
    /// Default: b','
    pub delimiter: u8,

    /// Cell values treated as missing (in addition to empty fields).
    pub null_markers: Vec<String>,

    /// Number of rows used for polars schema inference. `None` scans all rows.
    /// Default: None
    pub infer_schema_length: Option<usize>,

    /// Absolute cap on distinct values for a categorical column.
    /// Default: 20
    pub categorical_max_unique: usize,

    /// Distinct-to-row ratio that may raise the categorical cap on large tables.
    /// A column is categorical if distinct <= max(cap, floor(rows * ratio)).
    /// Default: 0.05
    pub categorical_unique_ratio: f64,

    /// Number of leading non-missing values checked for date formats.
    /// Default: 20
    pub datetime_sample_size: usize,

    /// Proportion of sampled values that must parse as dates (exclusive).
    /// Default: 0.8
    pub datetime_match_ratio: f64,

    /// Default number of categories kept in a frequency table.
    /// Default: 10
    pub top_n: usize,

    /// Number of outlier values echoed back for inspection.
    /// Default: 10
    pub outlier_sample_size: usize,

    /// IQR multiplier for the outlier fences.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Number of histogram bins.
    /// Default: 30
    pub histogram_bins: usize,

    /// Maximum distinct categories for a pie/donut chart.
    /// Default: 6
    pub pie_max_categories: usize,

    /// Minimum distinct categories for a box-plot grouping column.
    /// Default: 3
    pub box_group_min_categories: usize,

    /// Maximum distinct categories for a box-plot grouping column.
    /// Default: 8
    pub box_group_max_categories: usize,

    /// Maximum distinct categories on either axis of a stacked bar chart.
    /// Default: 12
    pub stacked_max_categories: usize,

    /// Minimum |r| for a numeric pair to get a scatter chart.
    /// Default: 0.3
    pub scatter_correlation_threshold: f64,

    /// Chart width in pixels.
    /// Default: 960
    pub chart_width: u32,

    /// Chart height in pixels.
    /// Default: 600
    pub chart_height: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
            infer_schema_length: None,
            categorical_max_unique: 20,
            categorical_unique_ratio: 0.05,
            datetime_sample_size: 20,
            datetime_match_ratio: 0.8,
            top_n: 10,
            outlier_sample_size: 10,
            iqr_multiplier: 1.5,
            histogram_bins: 30,
            pie_max_categories: 6,
            box_group_min_categories: 3,
            box_group_max_categories: 8,
            stacked_max_categories: 12,
            scatter_correlation_threshold: 0.3,
            chart_width: 960,
            chart_height: 600,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("categorical_unique_ratio", self.categorical_unique_ratio),
            ("datetime_match_ratio", self.datetime_match_ratio),
            (
                "scatter_correlation_threshold",
                self.scatter_correlation_threshold,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::InvalidThreshold {
                    field: field.to_string(),
                    value,
                });
            }
        }

        for (field, value) in [
            ("top_n", self.top_n),
            ("datetime_sample_size", self.datetime_sample_size),
            ("histogram_bins", self.histogram_bins),
            ("pie_max_categories", self.pie_max_categories),
            ("stacked_max_categories", self.stacked_max_categories),
        ] {
            if value == 0 {
                return Err(ConfigValidationError::ZeroCount(field.to_string()));
            }
        }

        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier <= 0.0 {
            return Err(ConfigValidationError::InvalidMultiplier(self.iqr_multiplier));
        }

        if self.box_group_min_categories > self.box_group_max_categories {
            return Err(ConfigValidationError::InvalidRange {
                min: self.box_group_min_categories,
                max: self.box_group_max_categories,
            });
        }

        if self.chart_width < 200 || self.chart_height < 150 {
            return Err(ConfigValidationError::ChartTooSmall {
                width: self.chart_width,
                height: self.chart_height,
            });
        }

        if self.delimiter == b'"' || self.delimiter == b'\n' || self.delimiter == b'\r' {
            return Err(ConfigValidationError::InvalidDelimiter(self.delimiter as char));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("'{0}' must be at least 1")]
    ZeroCount(String),

    #[error("Invalid IQR multiplier: {0} (must be a positive number)")]
    InvalidMultiplier(f64),

    #[error("Invalid box-plot group range: min {min} exceeds max {max}")]
    InvalidRange { min: usize, max: usize },

    #[error("Chart size {width}x{height} is too small (minimum 200x150)")]
    ChartTooSmall { width: u32, height: u32 },

    #[error("Invalid delimiter: {0:?}")]
    InvalidDelimiter(char),
}

impl From<ConfigValidationError> for crate::error::InsightError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::InsightError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    delimiter: Option<u8>,
    null_markers: Option<Vec<String>>,
    infer_schema_length: Option<Option<usize>>,
    categorical_max_unique: Option<usize>,
    categorical_unique_ratio: Option<f64>,
    datetime_sample_size: Option<usize>,
    datetime_match_ratio: Option<f64>,
    top_n: Option<usize>,
    outlier_sample_size: Option<usize>,
    iqr_multiplier: Option<f64>,
    histogram_bins: Option<usize>,
    pie_max_categories: Option<usize>,
    box_group_min_categories: Option<usize>,
    box_group_max_categories: Option<usize>,
    stacked_max_categories: Option<usize>,
    scatter_correlation_threshold: Option<f64>,
    chart_width: Option<u32>,
    chart_height: Option<u32>,
}

impl AnalysisConfigBuilder {
    /// Set the field delimiter (e.g. `b';'` or `b'\t'`).
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Replace the list of missing-value markers.
    pub fn null_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_markers = Some(markers.into_iter().map(Into::into).collect());
        self
    }

    /// Limit schema inference to the first `rows` rows (`None` = all rows).
    pub fn infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Set the absolute distinct-value cap for categorical columns.
    pub fn categorical_max_unique(mut self, cap: usize) -> Self {
        self.categorical_max_unique = Some(cap);
        self
    }

    /// Set the distinct-to-row ratio used for categorical columns.
    ///
    /// # Arguments
    /// * `ratio` - Value between 0.0 and 1.0
    pub fn categorical_unique_ratio(mut self, ratio: f64) -> Self {
        self.categorical_unique_ratio = Some(ratio);
        self
    }

    /// Set how many values are sampled when checking for dates.
    pub fn datetime_sample_size(mut self, size: usize) -> Self {
        self.datetime_sample_size = Some(size);
        self
    }

    /// Set the proportion of sampled values that must parse as dates.
    pub fn datetime_match_ratio(mut self, ratio: f64) -> Self {
        self.datetime_match_ratio = Some(ratio);
        self
    }

    /// Set the default number of categories in frequency tables and bar charts.
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    /// Set how many outlier values are reported per column.
    pub fn outlier_sample_size(mut self, size: usize) -> Self {
        self.outlier_sample_size = Some(size);
        self
    }

    /// Set the IQR fence multiplier.
    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = Some(multiplier);
        self
    }

    /// Set the number of histogram bins.
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Set the low-cardinality cutoff for pie charts.
    pub fn pie_max_categories(mut self, max: usize) -> Self {
        self.pie_max_categories = Some(max);
        self
    }

    /// Set the accepted distinct-count range for box-plot group columns.
    pub fn box_group_categories(mut self, min: usize, max: usize) -> Self {
        self.box_group_min_categories = Some(min);
        self.box_group_max_categories = Some(max);
        self
    }

    /// Set the distinct-count cap for stacked bar axes.
    pub fn stacked_max_categories(mut self, max: usize) -> Self {
        self.stacked_max_categories = Some(max);
        self
    }

    /// Set the minimum |r| for scatter chart selection.
    pub fn scatter_correlation_threshold(mut self, threshold: f64) -> Self {
        self.scatter_correlation_threshold = Some(threshold);
        self
    }

    /// Set the chart size in pixels.
    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart_width = Some(width);
        self.chart_height = Some(height);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let defaults = AnalysisConfig::default();
        let config = AnalysisConfig {
            delimiter: self.delimiter.unwrap_or(defaults.delimiter),
            null_markers: self.null_markers.unwrap_or(defaults.null_markers),
            infer_schema_length: self
                .infer_schema_length
                .unwrap_or(defaults.infer_schema_length),
            categorical_max_unique: self
                .categorical_max_unique
                .unwrap_or(defaults.categorical_max_unique),
            categorical_unique_ratio: self
                .categorical_unique_ratio
                .unwrap_or(defaults.categorical_unique_ratio),
            datetime_sample_size: self
                .datetime_sample_size
                .unwrap_or(defaults.datetime_sample_size),
            datetime_match_ratio: self
                .datetime_match_ratio
                .unwrap_or(defaults.datetime_match_ratio),
            top_n: self.top_n.unwrap_or(defaults.top_n),
            outlier_sample_size: self
                .outlier_sample_size
                .unwrap_or(defaults.outlier_sample_size),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            histogram_bins: self.histogram_bins.unwrap_or(defaults.histogram_bins),
            pie_max_categories: self
                .pie_max_categories
                .unwrap_or(defaults.pie_max_categories),
            box_group_min_categories: self
                .box_group_min_categories
                .unwrap_or(defaults.box_group_min_categories),
            box_group_max_categories: self
                .box_group_max_categories
                .unwrap_or(defaults.box_group_max_categories),
            stacked_max_categories: self
                .stacked_max_categories
                .unwrap_or(defaults.stacked_max_categories),
            scatter_correlation_threshold: self
                .scatter_correlation_threshold
                .unwrap_or(defaults.scatter_correlation_threshold),
            chart_width: self.chart_width.unwrap_or(defaults.chart_width),
            chart_height: self.chart_height.unwrap_or(defaults.chart_height),
        };

        config.validate()?;
        Ok(config)
    }
}
