//! Integration tests for the analysis toolset.
//!
//! These tests drive the public toolkit, registry and pipeline against the
//! CSV fixtures in `tests/fixtures`.

use lex_insight::{
    AnalysisConfig, ChartKind, ChartOutcome, ChartPlanner, ChartRequest, ColumnKind,
    InsightError, Resample, SUMMARY_TEXT_FILE, ToolRegistry, Toolkit, run_analysis,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixture(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(filename)
}

fn toolkit() -> Toolkit {
    Toolkit::new(AnalysisConfig::default())
}

fn data_rows(filename: &str) -> usize {
    let content = fs::read_to_string(fixture(filename)).unwrap();
    content.lines().skip(1).filter(|l| !l.trim().is_empty()).count()
}

// ============================================================================
// Loader
// ============================================================================

#[test]
fn test_load_table_shape_matches_file() {
    let toolkit = toolkit();
    for name in ["sales.csv", "outliers.csv", "letters.csv", "measurements.csv"] {
        let overview = toolkit.load_table(fixture(name)).unwrap();
        let content = fs::read_to_string(fixture(name)).unwrap();
        let header_fields = content.lines().next().unwrap().split(',').count();

        assert_eq!(overview.row_count(), data_rows(name), "{}", name);
        assert_eq!(overview.column_count(), header_fields, "{}", name);
        assert_eq!(overview.columns.len(), header_fields, "{}", name);
    }
}

#[test]
fn test_load_table_missing_values() {
    let overview = toolkit().load_table(fixture("sales.csv")).unwrap();

    assert_eq!(overview.missing_counts["discount"], 3);
    assert_eq!(overview.missing_counts["units"], 1);
    assert_eq!(overview.missing_counts["revenue"], 1);
    assert_eq!(overview.missing_counts["region"], 0);
    assert_eq!(overview.missing_pct["discount"], 12.5);
    assert_eq!(overview.head.len(), 5);
    assert_eq!(overview.head[0]["region"], "North");
}

#[test]
fn test_ragged_file_is_a_parse_error() {
    let err = toolkit().load_table(fixture("ragged.csv")).unwrap_err();
    assert!(matches!(err, InsightError::Parse(_)));
    assert!(err.to_string().contains("line 4"), "{}", err);
}

#[test]
fn test_missing_file() {
    let err = toolkit().load_table(fixture("nope.csv")).unwrap_err();
    assert!(matches!(err, InsightError::FileNotFound(_)));
    assert_eq!(err.error_code(), "FILE_NOT_FOUND");
}

// ============================================================================
// Classifier
// ============================================================================

#[test]
fn test_classify_sales_columns() {
    let profiles = toolkit().classify_columns(fixture("sales.csv"), None).unwrap();
    let kinds: Vec<(&str, ColumnKind)> = profiles
        .iter()
        .map(|p| (p.name.as_str(), p.kind))
        .collect();

    assert_eq!(
        kinds,
        vec![
            ("date", ColumnKind::Datetime),
            ("order_id", ColumnKind::Text),
            ("region", ColumnKind::Categorical),
            ("category", ColumnKind::Categorical),
            ("units", ColumnKind::Numeric),
            ("price", ColumnKind::Numeric),
            ("revenue", ColumnKind::Numeric),
            ("discount", ColumnKind::Numeric),
        ]
    );
}

#[test]
fn test_classify_subset_keeps_requested_order() {
    let columns = vec!["revenue".to_string(), "region".to_string()];
    let profiles = toolkit()
        .classify_columns(fixture("sales.csv"), Some(&columns))
        .unwrap();
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0].name, "revenue");
    assert_eq!(profiles[1].name, "region");
    assert_eq!(profiles[1].unique_count, 4);

    let unknown = vec!["profit".to_string()];
    let err = toolkit()
        .classify_columns(fixture("sales.csv"), Some(&unknown))
        .unwrap_err();
    assert!(matches!(err, InsightError::ColumnNotFound(ref c) if c == "profit"));
}

// ============================================================================
// Statistics
// ============================================================================

#[test]
fn test_quartiles_are_ordered_for_every_numeric_column() {
    let all = toolkit()
        .compute_descriptive_stats_all(fixture("sales.csv"))
        .unwrap();
    assert_eq!(all.len(), 4);

    for stats in all {
        let (min, q1, median, q3, max) = (
            stats.min.unwrap(),
            stats.q1.unwrap(),
            stats.median.unwrap(),
            stats.q3.unwrap(),
            stats.max.unwrap(),
        );
        assert!(min <= q1, "{}", stats.column);
        assert!(q1 <= median, "{}", stats.column);
        assert!(median <= q3, "{}", stats.column);
        assert!(q3 <= max, "{}", stats.column);
    }
}

#[test]
fn test_descriptive_stats_excludes_missing() {
    let stats = toolkit()
        .compute_descriptive_stats(fixture("sales.csv"), "discount")
        .unwrap();
    assert_eq!(stats.count, 21);
    assert_eq!(stats.missing, 3);
    assert_eq!(stats.min, Some(0.0));
    assert_eq!(stats.max, Some(0.2));
}

#[test]
fn test_descriptive_stats_on_categorical_column() {
    let err = toolkit()
        .compute_descriptive_stats(fixture("sales.csv"), "region")
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_COLUMN_KIND");
    assert_eq!(
        err.to_string(),
        "Column 'region' is categorical, expected numeric"
    );
}

#[test]
fn test_outliers_with_extreme_value() {
    let report = toolkit()
        .detect_outliers(fixture("outliers.csv"), "reading")
        .unwrap();

    assert_eq!(report.non_missing, 10);
    assert_eq!(report.q1, Some(3.25));
    assert_eq!(report.q3, Some(7.75));
    assert_eq!(report.iqr, Some(4.5));
    assert_eq!(report.lower_fence, Some(-3.5));
    assert_eq!(report.upper_fence, Some(14.5));
    assert_eq!(report.outlier_count, 1);
    assert_eq!(report.outlier_pct, 10.0);
    assert_eq!(report.outlier_sample, vec![1000.0]);
}

#[test]
fn test_constant_column_has_no_outliers() {
    let report = toolkit()
        .detect_outliers(fixture("outliers.csv"), "constant")
        .unwrap();
    assert_eq!(report.iqr, Some(0.0));
    assert_eq!(report.outlier_count, 0);
    assert!(report.outlier_sample.is_empty());

    let stats = toolkit()
        .compute_descriptive_stats(fixture("outliers.csv"), "constant")
        .unwrap();
    assert_eq!(stats.std, Some(0.0));
    assert_eq!(stats.skewness, Some(0.0));
    assert_eq!(stats.kurtosis, Some(0.0));
}

#[test]
fn test_value_counts_top_two() {
    let freq = toolkit()
        .compute_value_counts(fixture("letters.csv"), "letter", Some(2))
        .unwrap();

    assert_eq!(freq.total_non_missing, 6);
    assert_eq!(freq.distinct_count, 3);
    assert!(freq.is_truncated());
    assert_eq!(freq.entries.len(), 2);
    assert_eq!(freq.entries[0].value, "A");
    assert_eq!(freq.entries[0].count, 3);
    assert_eq!(freq.entries[0].pct, 50.0);
    assert_eq!(freq.entries[1].value, "B");
    assert_eq!(freq.entries[1].count, 2);
    assert!((freq.entries[1].pct - 33.333).abs() < 0.01);
}

#[test]
fn test_value_counts_totals() {
    let freq = toolkit()
        .compute_value_counts(fixture("sales.csv"), "region", None)
        .unwrap();
    let counts: usize = freq.entries.iter().map(|e| e.count).sum();
    let pct: f64 = freq.entries.iter().map(|e| e.pct).sum();

    assert!(!freq.is_truncated());
    assert_eq!(counts, 24);
    assert!((pct - 100.0).abs() < 1e-9);

    let truncated = toolkit()
        .compute_value_counts(fixture("sales.csv"), "region", Some(3))
        .unwrap();
    let pct: f64 = truncated.entries.iter().map(|e| e.pct).sum();
    assert!(pct < 100.0);
}

#[test]
fn test_correlation_is_symmetric() {
    let matrix = toolkit()
        .compute_correlation(fixture("sales.csv"), None)
        .unwrap();
    assert_eq!(matrix.columns, vec!["units", "price", "revenue", "discount"]);

    for a in &matrix.columns {
        assert_eq!(matrix.get(a, a), Some(1.0), "{}", a);
        for b in &matrix.columns {
            assert_eq!(matrix.get(a, b), matrix.get(b, a), "{} {}", a, b);
        }
    }
}

#[test]
fn test_correlation_rejects_non_numeric_column() {
    let columns = vec!["units".to_string(), "category".to_string()];
    let err = toolkit()
        .compute_correlation(fixture("sales.csv"), Some(&columns))
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_COLUMN_KIND");
}

#[test]
fn test_read_only_tools_are_idempotent() {
    let toolkit = toolkit();
    let path = fixture("sales.csv");

    assert_eq!(
        toolkit.load_table(&path).unwrap(),
        toolkit.load_table(&path).unwrap()
    );
    assert_eq!(
        toolkit.classify_columns(&path, None).unwrap(),
        toolkit.classify_columns(&path, None).unwrap()
    );
    assert_eq!(
        toolkit.compute_descriptive_stats_all(&path).unwrap(),
        toolkit.compute_descriptive_stats_all(&path).unwrap()
    );
    assert_eq!(
        toolkit.compute_value_counts(&path, "category", None).unwrap(),
        toolkit.compute_value_counts(&path, "category", None).unwrap()
    );
    assert_eq!(
        toolkit.compute_correlation(&path, None).unwrap(),
        toolkit.compute_correlation(&path, None).unwrap()
    );
}

// ============================================================================
// Charts
// ============================================================================

#[test]
fn test_timeseries_without_datetime_column() {
    let out = TempDir::new().unwrap();
    let outcome = toolkit()
        .render_timeseries(fixture("measurements.csv"), "y", None, Resample::None, out.path())
        .unwrap();

    assert!(matches!(
        outcome,
        ChartOutcome::NotApplicable {
            kind: ChartKind::TimeSeries,
            ..
        }
    ));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_planner_skips_timeseries_without_datetime() {
    let toolkit = toolkit();
    let path = fixture("measurements.csv");
    let profiles = toolkit.classify_columns(&path, None).unwrap();
    let correlation = toolkit.compute_correlation(&path, None).unwrap();

    let plan = ChartPlanner::new(toolkit.config()).plan(&profiles, &correlation);
    assert_eq!(plan.of_kind(ChartKind::TimeSeries).count(), 0);
}

#[test]
fn test_strong_correlation_selects_scatter() {
    let toolkit = toolkit();
    let path = fixture("measurements.csv");
    let profiles = toolkit.classify_columns(&path, None).unwrap();
    let correlation = toolkit.compute_correlation(&path, None).unwrap();
    assert!(correlation.get("x", "y").unwrap() > 0.9);

    let plan = ChartPlanner::new(toolkit.config()).plan(&profiles, &correlation);
    let scatters: Vec<&ChartRequest> = plan.of_kind(ChartKind::Scatter).collect();
    assert_eq!(
        scatters,
        vec![&ChartRequest::Scatter {
            x: "x".to_string(),
            y: "y".to_string(),
        }]
    );
}

#[test]
fn test_render_every_chart_kind() {
    let out = TempDir::new().unwrap();
    let toolkit = toolkit();
    let path = fixture("sales.csv");

    let outcomes = vec![
        toolkit.render_histogram(&path, "revenue", out.path()).unwrap(),
        toolkit.render_heatmap(&path, None, out.path()).unwrap(),
        toolkit.render_bar(&path, "category", out.path()).unwrap(),
        toolkit.render_missing(&path, out.path()).unwrap(),
        toolkit.render_pie(&path, "region", out.path()).unwrap(),
        toolkit
            .render_box(&path, "revenue", Some("region"), out.path())
            .unwrap(),
        toolkit
            .render_stacked_bar(
                &path,
                "region",
                "category",
                Some("revenue"),
                lex_insight::Aggregation::Sum,
                out.path(),
            )
            .unwrap(),
        toolkit
            .render_timeseries(&path, "revenue", Some("date"), Resample::Month, out.path())
            .unwrap(),
        toolkit.render_scatter(&path, "units", "revenue", out.path()).unwrap(),
    ];

    let expected = [
        "hist_revenue.svg",
        "correlation_heatmap.svg",
        "bar_category.svg",
        "missing_values.svg",
        "pie_region.svg",
        "box_revenue_by_region.svg",
        "stacked_region_by_category.svg",
        "timeseries_revenue.svg",
        "scatter_units_vs_revenue.svg",
    ];
    for (outcome, file) in outcomes.iter().zip(expected) {
        let artifact = outcome.artifact().unwrap();
        assert_eq!(artifact.path, out.path().join(file));
        assert!(!artifact.placeholder, "{}", file);
        let svg = fs::read_to_string(&artifact.path).unwrap();
        assert!(svg.contains("<svg"), "{}", file);
    }
}

#[test]
fn test_render_on_missing_column() {
    let out = TempDir::new().unwrap();
    let err = toolkit()
        .render_histogram(fixture("sales.csv"), "profit", out.path())
        .unwrap_err();
    assert!(matches!(err, InsightError::ColumnNotFound(_)));
}

fn assert_placeholder(outcome: &ChartOutcome, kind: ChartKind, file: &str, out: &TempDir) {
    let artifact = outcome.artifact().unwrap();
    assert_eq!(artifact.kind, kind);
    assert_eq!(artifact.path, out.path().join(file));
    assert!(artifact.placeholder, "{}", file);
    assert!(artifact.note.is_some(), "{}", file);
    let svg = fs::read_to_string(&artifact.path).unwrap();
    assert!(svg.contains("<svg"), "{}", file);
}

#[test]
fn test_all_missing_column_renders_placeholders() {
    let out = TempDir::new().unwrap();
    let toolkit = toolkit();
    let path = fixture("sparse.csv");

    let hist = toolkit.render_histogram(&path, "empty", out.path()).unwrap();
    assert_placeholder(&hist, ChartKind::Histogram, "hist_empty.svg", &out);

    let boxed = toolkit.render_box(&path, "empty", None, out.path()).unwrap();
    assert_placeholder(&boxed, ChartKind::Box, "box_empty.svg", &out);

    let bar = toolkit.render_bar(&path, "empty", out.path()).unwrap();
    assert_placeholder(&bar, ChartKind::Bar, "bar_empty.svg", &out);
}

#[test]
fn test_scatter_with_one_complete_pair_is_placeholder() {
    let out = TempDir::new().unwrap();
    let outcome = toolkit()
        .render_scatter(fixture("sparse.csv"), "x", "y", out.path())
        .unwrap();
    assert_placeholder(&outcome, ChartKind::Scatter, "scatter_x_vs_y.svg", &out);
}

#[test]
fn test_timeseries_without_complete_rows_is_placeholder() {
    let out = TempDir::new().unwrap();
    let outcome = toolkit()
        .render_timeseries(
            fixture("sparse.csv"),
            "empty",
            Some("date"),
            Resample::None,
            out.path(),
        )
        .unwrap();
    assert_placeholder(&outcome, ChartKind::TimeSeries, "timeseries_empty.svg", &out);
}

#[test]
fn test_similar_column_names_get_distinct_chart_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("names.csv");
    fs::write(&path, "unit price,unit_price\n1,10\n2,20\n3,30\n4,40\n").unwrap();
    let out = dir.path().join("charts");
    let toolkit = toolkit();

    let spaced = toolkit.render_histogram(&path, "unit price", &out).unwrap();
    let underscored = toolkit.render_histogram(&path, "unit_price", &out).unwrap();
    let spaced = spaced.artifact().unwrap();
    let underscored = underscored.artifact().unwrap();

    assert_ne!(spaced.path, underscored.path);
    assert!(spaced.path.exists());
    assert!(underscored.path.exists());
    let svg = fs::read_to_string(&spaced.path).unwrap();
    assert!(svg.contains("unit price"));
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn test_registry_reports_errors_as_observations() {
    let registry = ToolRegistry::new(toolkit());
    let path = fixture("sales.csv");

    let observation = registry.observe(
        "compute_descriptive_stats",
        &json!({ "path": path, "column": "region" }),
    );
    assert!(!observation.success);
    let error = observation.error.unwrap();
    assert_eq!(error.code, "INVALID_COLUMN_KIND");
    assert!(error.message.contains("categorical"));

    let observation = registry.observe(
        "compute_descriptive_stats",
        &json!({ "path": path, "column": "revenue" }),
    );
    assert!(observation.success);
    assert_eq!(observation.output["count"], 23);
}

#[test]
fn test_registry_render_and_summary() {
    let out = TempDir::new().unwrap();
    let registry = ToolRegistry::default();
    let path = fixture("sales.csv");

    let output = registry
        .invoke(
            "render_box",
            &json!({ "path": path, "column": "units", "output_dir": out.path() }),
        )
        .unwrap();
    assert_eq!(output["status"], "rendered");
    assert_eq!(output["kind"], "box");

    let output = registry
        .invoke(
            "write_summary",
            &json!({ "output_dir": out.path(), "summary_text": "Revenue is driven by units." }),
        )
        .unwrap();
    assert_eq!(
        PathBuf::from(output["path"].as_str().unwrap()),
        out.path().join(SUMMARY_TEXT_FILE)
    );
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn test_run_analysis_end_to_end() {
    let out = TempDir::new().unwrap();
    let run = run_analysis(fixture("sales.csv"), out.path(), &AnalysisConfig::default()).unwrap();

    assert!(run.report_path.exists());
    assert!(run.json_path.exists());

    let summary = &run.summary;
    assert_eq!(summary.overview.row_count(), 24);
    assert_eq!(summary.descriptive.len(), 4);
    assert_eq!(summary.outliers.len(), 4);
    assert_eq!(summary.frequencies.len(), 2);
    assert!(summary.generated_at.is_some());
    assert!(!summary.key_findings.is_empty());

    for artifact in &summary.charts {
        assert!(artifact.path.starts_with(out.path()));
        assert!(artifact.path.exists(), "{}", artifact.path.display());
    }
    let kinds: Vec<ChartKind> = summary.charts.iter().map(|c| c.kind).collect();
    for kind in [
        ChartKind::Histogram,
        ChartKind::Heatmap,
        ChartKind::Bar,
        ChartKind::MissingValues,
        ChartKind::Pie,
        ChartKind::Box,
        ChartKind::StackedBar,
        ChartKind::TimeSeries,
        ChartKind::Scatter,
    ] {
        assert!(kinds.contains(&kind), "no {} chart", kind);
    }

    let report = fs::read_to_string(&run.report_path).unwrap();
    assert!(report.contains("## Dataset Overview"));
    assert!(report.contains("## Chart Paths"));
    assert!(report.contains("hist_revenue.svg"));
}

#[test]
fn test_run_analysis_without_datetime_records_skips() {
    let out = TempDir::new().unwrap();
    let run = run_analysis(
        fixture("measurements.csv"),
        out.path(),
        &AnalysisConfig::default(),
    )
    .unwrap();

    assert!(
        run.summary
            .charts
            .iter()
            .all(|c| c.kind != ChartKind::TimeSeries)
    );
    assert!(
        run.summary
            .charts
            .iter()
            .any(|c| c.kind == ChartKind::Scatter)
    );
}

#[test]
fn test_run_analysis_rejects_invalid_config() {
    let out = TempDir::new().unwrap();
    let config = AnalysisConfig {
        top_n: 0,
        ..AnalysisConfig::default()
    };
    let err = run_analysis(fixture("sales.csv"), out.path(), &config).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_CONFIG");
}
