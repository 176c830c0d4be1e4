//! Text and JSON report writing for an analysis summary.

use crate::error::Result;
use crate::types::AnalysisSummary;
use crate::utils::{format_opt, truncate_label};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const SUMMARY_TEXT_FILE: &str = "analysis_summary.txt";
pub const SUMMARY_JSON_FILE: &str = "analysis_summary.json";

/// Correlation pairs listed in the text report.
const MAX_CORRELATION_PAIRS: usize = 10;

pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the text report and return its path.
    pub fn write_summary(&self, summary: &AnalysisSummary) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(SUMMARY_TEXT_FILE);
        fs::write(&path, Self::render_summary(summary))?;
        info!("Summary saved: {}", path.display());
        Ok(path)
    }

    /// Write caller-composed report text verbatim.
    pub fn write_text(&self, text: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(SUMMARY_TEXT_FILE);
        fs::write(&path, text)?;
        info!("Summary saved: {}", path.display());
        Ok(path)
    }

    /// Write the summary as pretty JSON and return its path.
    pub fn write_summary_json(&self, summary: &AnalysisSummary) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(SUMMARY_JSON_FILE);
        fs::write(&path, serde_json::to_string_pretty(summary)?)?;
        info!("Summary JSON saved: {}", path.display());
        Ok(path)
    }

    /// Format the full text report.
    pub fn render_summary(summary: &AnalysisSummary) -> String {
        let mut out = Vec::new();
        out.push("=".repeat(60));
        out.push("DATA ANALYSIS SUMMARY".to_string());
        out.push("=".repeat(60));
        out.push(format!("Source: {}", summary.source));
        if let Some(ts) = &summary.generated_at {
            out.push(format!("Generated: {}", ts));
        }

        Self::overview_section(summary, &mut out);
        Self::classification_section(summary, &mut out);
        Self::numeric_section(summary, &mut out);
        Self::outlier_section(summary, &mut out);
        Self::categorical_section(summary, &mut out);
        Self::correlation_section(summary, &mut out);
        Self::missing_section(summary, &mut out);
        Self::findings_section(summary, &mut out);
        Self::chart_section(summary, &mut out);

        let mut text = out.join("\n");
        text.push('\n');
        text
    }

    fn heading(out: &mut Vec<String>, title: &str) {
        out.push(String::new());
        out.push(format!("## {}", title));
        out.push("-".repeat(title.len() + 3));
    }

    fn overview_section(summary: &AnalysisSummary, out: &mut Vec<String>) {
        Self::heading(out, "Dataset Overview");
        let overview = &summary.overview;
        out.push(format!("Rows: {}", overview.row_count()));
        out.push(format!("Columns: {}", overview.column_count()));
        out.push(format!("Missing cells: {}", overview.total_missing()));
        for column in &overview.columns {
            out.push(format!("  {} ({})", column.name, column.dtype));
        }
    }

    fn classification_section(summary: &AnalysisSummary, out: &mut Vec<String>) {
        Self::heading(out, "Column Classification");
        if summary.profiles.is_empty() {
            out.push("No columns classified.".to_string());
        }
        for p in &summary.profiles {
            out.push(format!(
                "  {:<24} {:<12} unique={} missing={}",
                truncate_label(&p.name, 24),
                p.kind.as_str(),
                p.unique_count,
                p.missing_count
            ));
        }
    }

    fn numeric_section(summary: &AnalysisSummary, out: &mut Vec<String>) {
        Self::heading(out, "Numeric Analysis");
        if summary.descriptive.is_empty() {
            out.push("No numeric columns.".to_string());
        }
        for s in &summary.descriptive {
            out.push(format!("  {} (n={}, missing={})", s.column, s.count, s.missing));
            out.push(format!(
                "    mean={} std={} min={} max={}",
                format_opt(s.mean),
                format_opt(s.std),
                format_opt(s.min),
                format_opt(s.max)
            ));
            out.push(format!(
                "    q1={} median={} q3={} skewness={} kurtosis={}",
                format_opt(s.q1),
                format_opt(s.median),
                format_opt(s.q3),
                format_opt(s.skewness),
                format_opt(s.kurtosis)
            ));
        }
    }

    fn outlier_section(summary: &AnalysisSummary, out: &mut Vec<String>) {
        Self::heading(out, "Outliers");
        if summary.outliers.is_empty() {
            out.push("No numeric columns checked.".to_string());
        }
        for r in &summary.outliers {
            out.push(format!(
                "  {}: {} outliers ({:.2}%) outside [{}, {}]",
                r.column,
                r.outlier_count,
                r.outlier_pct,
                format_opt(r.lower_fence),
                format_opt(r.upper_fence)
            ));
            if !r.outlier_sample.is_empty() {
                let sample: Vec<String> = r.outlier_sample.iter().map(|v| format!("{}", v)).collect();
                out.push(format!("    sample: {}", sample.join(", ")));
            }
        }
    }

    fn categorical_section(summary: &AnalysisSummary, out: &mut Vec<String>) {
        Self::heading(out, "Categorical Analysis");
        if summary.frequencies.is_empty() {
            out.push("No categorical columns.".to_string());
        }
        for table in &summary.frequencies {
            let shown = if table.is_truncated() {
                format!(", top {} shown", table.entries.len())
            } else {
                String::new()
            };
            out.push(format!(
                "  {} ({} distinct{})",
                table.column, table.distinct_count, shown
            ));
            for e in &table.entries {
                out.push(format!(
                    "    {:<24} {:>8} {:>7.1}%",
                    truncate_label(&e.value, 24),
                    e.count,
                    e.pct
                ));
            }
        }
    }

    fn correlation_section(summary: &AnalysisSummary, out: &mut Vec<String>) {
        Self::heading(out, "Correlations");
        let pairs = summary.correlation.pairs_above(0.0);
        if pairs.is_empty() {
            out.push("No defined correlations.".to_string());
        }
        for pair in pairs.iter().take(MAX_CORRELATION_PAIRS) {
            out.push(format!(
                "  {} ~ {}: r={:.3} ({})",
                pair.a,
                pair.b,
                pair.r,
                strength(pair.r)
            ));
        }
    }

    fn missing_section(summary: &AnalysisSummary, out: &mut Vec<String>) {
        Self::heading(out, "Missing Data");
        let overview = &summary.overview;
        let mut any = false;
        for column in &overview.columns {
            let count = overview.missing_counts.get(&column.name).copied().unwrap_or(0);
            if count == 0 {
                continue;
            }
            any = true;
            let pct = overview.missing_pct.get(&column.name).copied().unwrap_or(0.0);
            out.push(format!("  {}: {} ({:.2}%)", column.name, count, pct));
        }
        if !any {
            out.push("No missing values.".to_string());
        }
    }

    fn findings_section(summary: &AnalysisSummary, out: &mut Vec<String>) {
        Self::heading(out, "Key Findings");
        if summary.key_findings.is_empty() {
            out.push("None.".to_string());
        }
        for finding in &summary.key_findings {
            out.push(format!("  - {}", finding));
        }
    }

    fn chart_section(summary: &AnalysisSummary, out: &mut Vec<String>) {
        Self::heading(out, "Chart Paths");
        if summary.charts.is_empty() {
            out.push("No charts generated.".to_string());
        }
        for chart in &summary.charts {
            let mut line = format!("  [{}] {}", chart.kind, chart.path.display());
            if chart.placeholder {
                line.push_str(" (placeholder)");
            }
            if let Some(note) = &chart.note {
                line.push_str(&format!(" - {}", note));
            }
            out.push(line);
        }
        for skipped in &summary.skipped_charts {
            out.push(format!("  skipped {}: {}", skipped.kind, skipped.reason));
        }
    }
}

fn strength(r: f64) -> &'static str {
    let direction = r >= 0.0;
    match (r.abs(), direction) {
        (a, true) if a >= 0.7 => "strong positive",
        (a, false) if a >= 0.7 => "strong negative",
        (a, true) if a >= 0.3 => "moderate positive",
        (a, false) if a >= 0.3 => "moderate negative",
        _ => "weak",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ChartArtifact, ChartKind, ColumnInfo, ColumnKind, ColumnProfile, CorrelationMatrix,
        FrequencyEntry, FrequencyTable, TableOverview,
    };
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn summary() -> AnalysisSummary {
        let mut missing_counts = BTreeMap::new();
        missing_counts.insert("price".to_string(), 2);
        missing_counts.insert("region".to_string(), 0);
        let mut missing_pct = BTreeMap::new();
        missing_pct.insert("price".to_string(), 20.0);
        missing_pct.insert("region".to_string(), 0.0);

        AnalysisSummary {
            source: "sales.csv".to_string(),
            generated_at: None,
            overview: TableOverview {
                path: "sales.csv".to_string(),
                shape: (10, 2),
                columns: vec![
                    ColumnInfo {
                        name: "price".into(),
                        dtype: "f64".into(),
                    },
                    ColumnInfo {
                        name: "region".into(),
                        dtype: "str".into(),
                    },
                ],
                missing_counts,
                missing_pct,
                head: Vec::new(),
            },
            profiles: vec![ColumnProfile {
                name: "region".into(),
                dtype: "str".into(),
                kind: ColumnKind::Categorical,
                missing_count: 0,
                unique_count: 2,
                sample_values: vec!["north".into(), "south".into()],
            }],
            descriptive: Vec::new(),
            outliers: Vec::new(),
            frequencies: vec![FrequencyTable {
                column: "region".into(),
                total_non_missing: 10,
                distinct_count: 2,
                entries: vec![FrequencyEntry {
                    value: "north".into(),
                    count: 6,
                    pct: 60.0,
                }],
            }],
            correlation: CorrelationMatrix::default(),
            charts: vec![ChartArtifact {
                kind: ChartKind::Bar,
                columns: vec!["region".into()],
                path: PathBuf::from("out/bar_region.svg"),
                placeholder: false,
                note: None,
            }],
            skipped_charts: Vec::new(),
            key_findings: vec!["'price' has the most missing values (20.00%)".into()],
        }
    }

    #[test]
    fn test_render_contains_every_section() {
        let text = ReportWriter::render_summary(&summary());
        for section in [
            "Dataset Overview",
            "Column Classification",
            "Numeric Analysis",
            "Outliers",
            "Categorical Analysis",
            "Correlations",
            "Missing Data",
            "Key Findings",
            "Chart Paths",
        ] {
            assert!(text.contains(&format!("## {}", section)), "missing {}", section);
        }
        assert!(text.contains("Rows: 10"));
        assert!(text.contains("price: 2 (20.00%)"));
        assert!(text.contains("out/bar_region.svg"));
        assert!(text.contains("top 1 shown"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let s = summary();
        assert_eq!(ReportWriter::render_summary(&s), ReportWriter::render_summary(&s));
    }

    #[test]
    fn test_write_summary_files() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path().join("report"));
        let text_path = writer.write_summary(&summary()).unwrap();
        let json_path = writer.write_summary_json(&summary()).unwrap();

        assert!(text_path.ends_with(SUMMARY_TEXT_FILE));
        assert!(fs::read_to_string(&text_path).unwrap().contains("DATA ANALYSIS SUMMARY"));
        let parsed: AnalysisSummary =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed, summary());
    }

    #[test]
    fn test_write_text_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = ReportWriter::new(dir.path()).write_text("Sales grew.\n").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "Sales grew.\n");
    }

    #[test]
    fn test_strength_labels() {
        assert_eq!(strength(0.95), "strong positive");
        assert_eq!(strength(-0.4), "moderate negative");
        assert_eq!(strength(0.1), "weak");
    }
}
