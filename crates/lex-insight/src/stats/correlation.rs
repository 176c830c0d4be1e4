//! Pairwise Pearson correlation.

use crate::types::CorrelationMatrix;

/// Pearson coefficient over rows where both values are present.
///
/// `None` for fewer than two complete pairs or zero variance on either side.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }

    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Symmetric matrix over the given columns, in the given order.
pub fn correlation_matrix(columns: &[(String, Vec<Option<f64>>)]) -> CorrelationMatrix {
    let n = columns.len();
    let mut values = vec![vec![None; n]; n];

    for i in 0..n {
        for j in i..n {
            let r = pearson(&columns[i].1, &columns[j].1);
            let r = if i == j { r.map(|_| 1.0) } else { r };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: columns.iter().map(|(name, _)| name.clone()).collect(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, values: &[Option<f64>]) -> (String, Vec<Option<f64>>) {
        (name.to_string(), values.to_vec())
    }

    #[test]
    fn test_perfect_linear() {
        let x = [Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let y = [Some(2.0), Some(4.0), Some(6.0), Some(8.0)];
        let z = [Some(8.0), Some(6.0), Some(4.0), Some(2.0)];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &z).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pairwise_exclusion() {
        // row 2 is dropped only for this pair
        let x = [Some(1.0), Some(2.0), None, Some(4.0)];
        let y = [Some(1.0), Some(2.0), Some(100.0), Some(4.0)];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_is_undefined() {
        let x = [Some(1.0), Some(2.0), Some(3.0)];
        let c = [Some(5.0), Some(5.0), Some(5.0)];
        assert_eq!(pearson(&x, &c), None);
        assert_eq!(pearson(&[Some(1.0)], &[Some(2.0)]), None);
    }

    #[test]
    fn test_matrix_symmetric_with_unit_diagonal() {
        let columns = vec![
            col("a", &[Some(1.0), Some(2.0), Some(3.0), Some(5.0)]),
            col("b", &[Some(2.0), Some(1.0), Some(4.0), Some(3.0)]),
            col("c", &[Some(7.0), Some(7.0), Some(7.0), Some(7.0)]),
        ];
        let m = correlation_matrix(&columns);
        assert_eq!(m.columns, vec!["a", "b", "c"]);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(m.values[i][j], m.values[j][i]);
            }
        }
        assert_eq!(m.get("a", "a"), Some(1.0));
        assert_eq!(m.get("b", "b"), Some(1.0));
        assert_eq!(m.get("c", "c"), None);
        assert_eq!(m.get("a", "c"), None);
        assert!(m.get("a", "b").is_some());
    }
}
