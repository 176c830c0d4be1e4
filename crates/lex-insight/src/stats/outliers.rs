//! IQR fence outlier detection.

use super::descriptive::quantile;
use crate::types::OutlierReport;
use crate::utils::{percentage, round2};

/// Find values outside `[Q1 - k*IQR, Q3 + k*IQR]`.
///
/// Values strictly outside the fences are outliers, so a constant column has
/// none while a zero IQR still flags values away from the bulk. The sample
/// keeps the first `sample_size` outliers in row order.
pub fn iqr_outliers(
    column: &str,
    values: &[Option<f64>],
    multiplier: f64,
    sample_size: usize,
) -> OutlierReport {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let mut sorted = present.clone();
    sorted.sort_by(f64::total_cmp);

    let mut report = OutlierReport {
        column: column.to_string(),
        non_missing: present.len(),
        q1: None,
        q3: None,
        iqr: None,
        lower_fence: None,
        upper_fence: None,
        outlier_count: 0,
        outlier_pct: 0.0,
        outlier_sample: Vec::new(),
    };

    let (Some(q1), Some(q3)) = (quantile(&sorted, 0.25), quantile(&sorted, 0.75)) else {
        return report;
    };
    let iqr = q3 - q1;
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;

    report.q1 = Some(q1);
    report.q3 = Some(q3);
    report.iqr = Some(iqr);
    report.lower_fence = Some(lower);
    report.upper_fence = Some(upper);

    let outliers: Vec<f64> = present
        .iter()
        .copied()
        .filter(|v| *v < lower || *v > upper)
        .collect();
    report.outlier_count = outliers.len();
    report.outlier_pct = round2(percentage(outliers.len(), present.len()));
    report.outlier_sample = outliers.into_iter().take(sample_size).collect();
    report
}
