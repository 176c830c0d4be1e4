//! Moment- and order-based statistics over the non-missing values of a column.

use crate::types::DescriptiveStats;

/// Linear-interpolation quantile of an ascending slice (h = (n-1)p).
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * p;
    let lower = h.floor() as usize;
    let upper = h.ceil() as usize;
    Some(sorted[lower] + (h - lower as f64) * (sorted[upper] - sorted[lower]))
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n-1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Central moments m2, m3, m4 (population form).
fn central_moments(values: &[f64]) -> Option<(f64, f64, f64)> {
    let m = mean(values)?;
    let n = values.len() as f64;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    Some((m2 / n, m3 / n, m4 / n))
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Adjusted Fisher-Pearson skewness. Needs n >= 3.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    if is_constant(values) {
        return Some(0.0);
    }
    let (m2, m3, _) = central_moments(values)?;
    let g1 = m3 / m2.powf(1.5);
    let n = n as f64;
    Some(g1 * (n * (n - 1.0)).sqrt() / (n - 2.0))
}

/// Bias-corrected excess kurtosis. Needs n >= 4.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    if is_constant(values) {
        return Some(0.0);
    }
    let (m2, _, m4) = central_moments(values)?;
    let g2 = m4 / (m2 * m2) - 3.0;
    let n = n as f64;
    Some(((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0)))
}

/// Summarize a column; missing entries are excluded and counted.
pub fn summarize(column: &str, values: &[Option<f64>]) -> DescriptiveStats {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    let missing = values.len() - present.len();
    if present.is_empty() {
        return DescriptiveStats::empty(column, missing);
    }

    let mean_value = mean(&present);
    let std = sample_std(&present);
    let skew = skewness(&present);
    let kurt = kurtosis(&present);

    present.sort_by(f64::total_cmp);

    DescriptiveStats {
        column: column.to_string(),
        count: present.len(),
        missing,
        mean: mean_value,
        std,
        min: present.first().copied(),
        q1: quantile(&present, 0.25),
        median: quantile(&present, 0.5),
        q3: quantile(&present, 0.75),
        max: present.last().copied(),
        skewness: skew,
        kurtosis: kurt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted: Vec<f64> = (1..=10).map(f64::from).collect();
        assert!(approx(quantile(&sorted, 0.25).unwrap(), 3.25));
        assert!(approx(quantile(&sorted, 0.5).unwrap(), 5.5));
        assert!(approx(quantile(&sorted, 0.75).unwrap(), 7.75));
        assert_eq!(quantile(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile(&sorted, 1.0), Some(10.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_summarize_excludes_missing() {
        let values = vec![Some(2.0), None, Some(4.0), Some(4.0), None, Some(6.0)];
        let stats = summarize("x", &values);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.missing, 2);
        assert_eq!(stats.mean, Some(4.0));
        assert_eq!(stats.min, Some(2.0));
        assert_eq!(stats.max, Some(6.0));
        assert!(approx(stats.std.unwrap(), (8.0f64 / 3.0).sqrt()));
        assert_eq!(stats.skewness, Some(0.0));
    }

    #[test]
    fn test_summarize_all_missing_is_empty_record() {
        let stats = summarize("x", &[None, None]);
        assert!(stats.is_empty());
        assert_eq!(stats.missing, 2);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.median, None);
    }

    #[test]
    fn test_single_value_has_no_spread() {
        let stats = summarize("x", &[Some(5.0)]);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.median, Some(5.0));
        assert_eq!(stats.std, None);
        assert_eq!(stats.skewness, None);
        assert_eq!(stats.kurtosis, None);
    }

    #[test]
    fn test_constant_column_moments_are_zero() {
        let values = vec![Some(0.1); 6];
        let stats = summarize("c", &values);
        assert_eq!(stats.skewness, Some(0.0));
        assert_eq!(stats.kurtosis, Some(0.0));
    }

    #[test]
    fn test_skew_and_kurtosis_match_reference_values() {
        // reference values from the bias-corrected estimators
        let values = [1.0, 2.0, 3.0, 4.0, 10.0];
        assert!((skewness(&values).unwrap() - 1.697056).abs() < 1e-5);
        assert!((kurtosis(&values).unwrap() - 3.152).abs() < 1e-5);
    }

    #[test]
    fn test_quartile_ordering() {
        let values: Vec<Option<f64>> = [9.0, -3.0, 4.5, 4.5, 100.0, 0.0, 7.0]
            .into_iter()
            .map(Some)
            .collect();
        let stats = summarize("x", &values);
        let (min, q1, median, q3, max) = (
            stats.min.unwrap(),
            stats.q1.unwrap(),
            stats.median.unwrap(),
            stats.q3.unwrap(),
            stats.max.unwrap(),
        );
        assert!(min <= q1 && q1 <= median && median <= q3 && q3 <= max);
    }
}
