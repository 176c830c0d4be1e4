use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Loader & classifier types
// ============================================================================

/// Semantic kind assigned to a column by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Datetime,
    Text,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Datetime => "datetime",
            ColumnKind::Text => "text",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and declared (parser-level) type of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
}

/// Result of loading a table: shape, declared types and missing-value counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableOverview {
    pub path: String,
    /// (rows, columns)
    pub shape: (usize, usize),
    pub columns: Vec<ColumnInfo>,
    pub missing_counts: BTreeMap<String, usize>,
    /// Missing percentage per column, rounded to 2 decimals.
    pub missing_pct: BTreeMap<String, f64>,
    /// First rows as JSON objects keyed by column name.
    #[serde(default)]
    pub head: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl TableOverview {
    pub fn row_count(&self) -> usize {
        self.shape.0
    }

    pub fn column_count(&self) -> usize {
        self.shape.1
    }

    /// Total number of missing cells across all columns.
    pub fn total_missing(&self) -> usize {
        self.missing_counts.values().sum()
    }
}

/// Classification result for a single column. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub kind: ColumnKind,
    pub missing_count: usize,
    pub unique_count: usize,
    pub sample_values: Vec<String>,
}

// ============================================================================
// Statistics types
// ============================================================================

/// Descriptive statistics for a numeric column.
///
/// Missing values are excluded from every statistic; `missing` reports how
/// many were excluded. Statistics that are undefined for the available data
/// (e.g. all values missing) are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub column: String,
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

impl DescriptiveStats {
    /// Null record for a column without any usable value.
    pub fn empty(column: impl Into<String>, missing: usize) -> Self {
        Self {
            column: column.into(),
            count: 0,
            missing,
            mean: None,
            std: None,
            min: None,
            q1: None,
            median: None,
            q3: None,
            max: None,
            skewness: None,
            kurtosis: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// IQR-based outlier findings for a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub column: String,
    pub non_missing: usize,
    pub q1: Option<f64>,
    pub q3: Option<f64>,
    pub iqr: Option<f64>,
    pub lower_fence: Option<f64>,
    pub upper_fence: Option<f64>,
    pub outlier_count: usize,
    /// Percentage of non-missing values, rounded to 2 decimals.
    pub outlier_pct: f64,
    /// First outliers in row order.
    pub outlier_sample: Vec<f64>,
}

/// One row of a frequency table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
    /// Percentage of non-missing rows.
    pub pct: f64,
}

/// Category counts ordered by descending count (ties by first appearance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyTable {
    pub column: String,
    pub total_non_missing: usize,
    pub distinct_count: usize,
    pub entries: Vec<FrequencyEntry>,
}

impl FrequencyTable {
    /// Whether categories were dropped by the top-N cut.
    pub fn is_truncated(&self) -> bool {
        self.entries.len() < self.distinct_count
    }
}

/// Two columns and their Pearson coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub a: String,
    pub b: String,
    pub r: f64,
}

/// Symmetric Pearson correlation matrix over numeric columns.
///
/// `values[i][j]` is `None` when the coefficient is undefined (zero variance
/// or fewer than two paired observations).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Coefficient between two columns, if both are present and it is defined.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        self.values.get(i)?.get(j).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Off-diagonal pairs with |r| >= `threshold`, strongest first.
    pub fn pairs_above(&self, threshold: f64) -> Vec<CorrelationPair> {
        let mut pairs = Vec::new();
        for i in 0..self.columns.len() {
            for j in (i + 1)..self.columns.len() {
                if let Some(r) = self.values[i][j]
                    && r.abs() >= threshold
                {
                    pairs.push(CorrelationPair {
                        a: self.columns[i].clone(),
                        b: self.columns[j].clone(),
                        r,
                    });
                }
            }
        }
        // stable sort keeps column order for equal magnitudes
        pairs.sort_by(|x, y| y.r.abs().total_cmp(&x.r.abs()));
        pairs
    }

    /// The defined off-diagonal pair with the largest |r|.
    pub fn strongest_pair(&self) -> Option<CorrelationPair> {
        self.pairs_above(0.0).into_iter().next()
    }
}

// ============================================================================
// Chart types
// ============================================================================

/// Kind of chart produced by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Histogram,
    Heatmap,
    Bar,
    MissingValues,
    Pie,
    Box,
    StackedBar,
    TimeSeries,
    Scatter,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Histogram => "histogram",
            ChartKind::Heatmap => "heatmap",
            ChartKind::Bar => "bar",
            ChartKind::MissingValues => "missing_values",
            ChartKind::Pie => "pie",
            ChartKind::Box => "box",
            ChartKind::StackedBar => "stacked_bar",
            ChartKind::TimeSeries => "time_series",
            ChartKind::Scatter => "scatter",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chart written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartArtifact {
    pub kind: ChartKind,
    pub columns: Vec<String>,
    pub path: PathBuf,
    /// True when the slice was empty or degenerate and a placeholder was drawn.
    #[serde(default)]
    pub placeholder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Result of a render call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartOutcome {
    Rendered(ChartArtifact),
    NotApplicable { kind: ChartKind, reason: String },
}

impl ChartOutcome {
    pub(crate) fn not_applicable(kind: ChartKind, reason: impl Into<String>) -> Self {
        ChartOutcome::NotApplicable {
            kind,
            reason: reason.into(),
        }
    }

    pub fn artifact(&self) -> Option<&ChartArtifact> {
        match self {
            ChartOutcome::Rendered(artifact) => Some(artifact),
            ChartOutcome::NotApplicable { .. } => None,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, ChartOutcome::Rendered(_))
    }
}

/// A chart the selection policy or renderer declined to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedChart {
    pub kind: ChartKind,
    pub columns: Vec<String>,
    pub reason: String,
}

// ============================================================================
// Summary
// ============================================================================

/// Every finding of one analysis run, as consumed by the report writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    pub overview: TableOverview,
    #[serde(default)]
    pub profiles: Vec<ColumnProfile>,
    #[serde(default)]
    pub descriptive: Vec<DescriptiveStats>,
    #[serde(default)]
    pub outliers: Vec<OutlierReport>,
    #[serde(default)]
    pub frequencies: Vec<FrequencyTable>,
    #[serde(default)]
    pub correlation: CorrelationMatrix,
    #[serde(default)]
    pub charts: Vec<ChartArtifact>,
    #[serde(default)]
    pub skipped_charts: Vec<SkippedChart>,
    #[serde(default)]
    pub key_findings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> CorrelationMatrix {
        CorrelationMatrix {
            columns: vec!["a".into(), "b".into(), "c".into()],
            values: vec![
                vec![Some(1.0), Some(0.2), Some(-0.9)],
                vec![Some(0.2), Some(1.0), None],
                vec![Some(-0.9), None, Some(1.0)],
            ],
        }
    }

    #[test]
    fn test_matrix_get() {
        let m = sample_matrix();
        assert_eq!(m.get("a", "c"), Some(-0.9));
        assert_eq!(m.get("c", "a"), Some(-0.9));
        assert_eq!(m.get("b", "c"), None);
        assert_eq!(m.get("a", "zzz"), None);
    }

    #[test]
    fn test_pairs_above_sorted_by_magnitude() {
        let m = sample_matrix();
        let pairs = m.pairs_above(0.1);
        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].a.as_str(), pairs[0].b.as_str()), ("a", "c"));
        assert_eq!(pairs[1].r, 0.2);

        assert_eq!(m.pairs_above(0.3).len(), 1);
        assert_eq!(m.strongest_pair().unwrap().r, -0.9);
    }

    #[test]
    fn test_chart_outcome_serialization() {
        let outcome = ChartOutcome::not_applicable(ChartKind::TimeSeries, "no datetime column");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "not_applicable");
        assert_eq!(json["kind"], "time_series");

        let rendered = ChartOutcome::Rendered(ChartArtifact {
            kind: ChartKind::Bar,
            columns: vec!["region".into()],
            path: PathBuf::from("out/bar_region.svg"),
            placeholder: false,
            note: None,
        });
        let json = serde_json::to_value(&rendered).unwrap();
        assert_eq!(json["status"], "rendered");
        assert_eq!(json["path"], "out/bar_region.svg");
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_frequency_table_truncation() {
        let table = FrequencyTable {
            column: "c".into(),
            total_non_missing: 3,
            distinct_count: 2,
            entries: vec![FrequencyEntry {
                value: "x".into(),
                count: 2,
                pct: 66.7,
            }],
        };
        assert!(table.is_truncated());
    }

    #[test]
    fn test_column_kind_serde() {
        assert_eq!(
            serde_json::to_string(&ColumnKind::Categorical).unwrap(),
            "\"categorical\""
        );
        assert_eq!(ColumnKind::Datetime.to_string(), "datetime");
    }
}
