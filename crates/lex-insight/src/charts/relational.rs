//! Charts relating columns: correlation heatmap, scatter with regression, time series.

use super::style::{
    FONT, category_labels, category_upper, centered, diverging, padded_range, render_svg,
    series_color,
};
use super::{ChartRenderer, Resample};
use crate::error::{InsightError, Result};
use crate::loader::Table;
use crate::profiler::ColumnClassifier;
use crate::stats::StatisticsEngine;
use crate::types::{ChartKind, ChartOutcome, ColumnKind};
use crate::utils::{sanitize_file_component, truncate_label};
use chrono::{DateTime, Datelike, Days, NaiveDateTime, NaiveTime};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::iter::once;

/// Least-squares line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    pub r_squared: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// `None` when x has no spread.
pub(crate) fn linear_fit(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in points {
        sxy += (x - mean_x) * (y - mean_y);
        sxx += (x - mean_x).powi(2);
        syy += (y - mean_y).powi(2);
    }
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    // a flat y is fitted exactly by the flat line
    let r_squared = if syy == 0.0 { 1.0 } else { sxy * sxy / (sxx * syy) };
    Some(LinearFit {
        intercept: mean_y - slope * mean_x,
        slope,
        r_squared,
    })
}

/// Start of the bucket containing `ts`.
pub(crate) fn bucket_start(ts: NaiveDateTime, resample: Resample) -> NaiveDateTime {
    let date = ts.date();
    match resample {
        Resample::None => ts,
        Resample::Day => date.and_time(NaiveTime::MIN),
        Resample::Week => {
            let back = u64::from(date.weekday().num_days_from_monday());
            (date - Days::new(back)).and_time(NaiveTime::MIN)
        }
        Resample::Month => date.with_day(1).unwrap_or(date).and_time(NaiveTime::MIN),
    }
}

/// Complete (time, value) pairs in ascending time order, averaged per bucket when resampling.
pub(crate) fn time_points(
    dates: &[Option<NaiveDateTime>],
    values: &[Option<f64>],
    resample: Resample,
) -> Vec<(NaiveDateTime, f64)> {
    let pairs = dates
        .iter()
        .zip(values)
        .filter_map(|(d, v)| Some(((*d)?, (*v)?)));

    if resample == Resample::None {
        let mut points: Vec<_> = pairs.collect();
        points.sort_by_key(|(t, _)| *t);
        return points;
    }

    let mut buckets: BTreeMap<NaiveDateTime, (f64, usize)> = BTreeMap::new();
    for (t, v) in pairs {
        let entry = buckets.entry(bucket_start(t, resample)).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(t, (sum, n))| (t, sum / n as f64))
        .collect()
}

impl ChartRenderer<'_> {
    /// Annotated correlation heatmap over the numeric columns.
    pub fn heatmap(&self, table: &Table, columns: Option<&[String]>) -> Result<ChartOutcome> {
        let matrix = StatisticsEngine::correlation(table, columns)?;
        let n = matrix.len();
        if n < 2 {
            return Ok(self.not_applicable(
                ChartKind::Heatmap,
                format!("needs at least two numeric columns, found {}", n),
            ));
        }

        let path = self.chart_path("correlation_heatmap");
        let names: Vec<String> = matrix.columns.iter().map(|c| truncate_label(c, 14)).collect();
        let y_names: Vec<String> = names.iter().rev().cloned().collect();

        render_svg(&path, self.size(), |root| {
            let x_labels = category_labels(&names);
            let y_labels = category_labels(&y_names);
            let upper = category_upper(n);
            let mut chart = ChartBuilder::on(root)
                .caption("Correlation matrix", (FONT, 24))
                .margin(16)
                .x_label_area_size(48)
                .y_label_area_size(110)
                .build_cartesian_2d(
                    (0u32..upper).into_segmented(),
                    (0u32..upper).into_segmented(),
                )?;
            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(n + 1)
                .y_labels(n + 1)
                .x_label_formatter(&x_labels)
                .y_label_formatter(&y_labels)
                .draw()?;

            for (i, row) in matrix.values.iter().enumerate() {
                let y = (n - 1 - i) as u32;
                for (j, r) in row.iter().enumerate() {
                    let x = j as u32;
                    let fill = r.map_or(RGBColor(225, 225, 225), diverging);
                    chart.draw_series(once(Rectangle::new(
                        [
                            (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                            (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                        ],
                        fill.filled(),
                    )))?;

                    let text = r.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v));
                    let style = if r.is_some_and(|v| v.abs() > 0.6) {
                        centered(13).color(&WHITE)
                    } else {
                        centered(13)
                    };
                    chart.draw_series(once(Text::new(
                        text,
                        (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
                        style,
                    )))?;
                }
            }
            Ok(())
        })?;

        Ok(self.rendered(ChartKind::Heatmap, matrix.columns.clone(), path, None))
    }

    /// Scatter plot with a least-squares line and R² in the caption.
    pub fn scatter(&self, table: &Table, x: &str, y: &str) -> Result<ChartOutcome> {
        let xs = table.numeric_values(x)?;
        let ys = table.numeric_values(y)?;
        let points: Vec<(f64, f64)> = xs
            .iter()
            .zip(&ys)
            .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
            .collect();

        let path = self.chart_path(&format!(
            "scatter_{}_vs_{}",
            sanitize_file_component(x),
            sanitize_file_component(y)
        ));
        let columns = vec![x.to_string(), y.to_string()];
        let fit = linear_fit(&points);
        let title = match fit {
            Some(f) => format!("{} vs {} (R² = {:.3})", y, x, f.r_squared),
            None => format!("{} vs {}", y, x),
        };

        if points.len() < 2 {
            return self.placeholder(
                ChartKind::Scatter,
                columns,
                path,
                &title,
                "fewer than two complete pairs",
            );
        }

        let note = match fit {
            Some(f) => format!(
                "y = {:.4} + {:.4}x, R² = {:.4}",
                f.intercept, f.slope, f.r_squared
            ),
            None => format!("'{}' has zero variance; regression omitted", x),
        };
        let fold = |acc: (f64, f64), v: f64| (acc.0.min(v), acc.1.max(v));
        let start = (f64::INFINITY, f64::NEG_INFINITY);
        let (x_min, x_max) = points.iter().map(|p| p.0).fold(start, fold);
        let (y_min, y_max) = points.iter().map(|p| p.1).fold(start, fold);
        let (x_lo, x_hi) = padded_range(x_min, x_max);
        let (y_lo, y_hi) = padded_range(y_min, y_max);

        render_svg(&path, self.size(), |root| {
            let mut chart = ChartBuilder::on(root)
                .caption(&title, (FONT, 24))
                .margin(16)
                .x_label_area_size(40)
                .y_label_area_size(56)
                .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;
            chart.configure_mesh().x_desc(x).y_desc(y).draw()?;

            chart.draw_series(
                points
                    .iter()
                    .map(|p| Circle::new(*p, 3, series_color(0).mix(0.6).filled())),
            )?;
            if let Some(f) = fit {
                chart.draw_series(LineSeries::new(
                    [(x_lo, f.predict(x_lo)), (x_hi, f.predict(x_hi))],
                    series_color(3).stroke_width(2),
                ))?;
            }
            Ok(())
        })?;

        Ok(self.rendered(ChartKind::Scatter, columns, path, Some(note)))
    }

    /// Line chart of a numeric column against a datetime column, sorted by time.
    ///
    /// Without `date_col` the first datetime column of the table is used.
    pub fn time_series(
        &self,
        table: &Table,
        value_col: &str,
        date_col: Option<&str>,
        resample: Resample,
    ) -> Result<ChartOutcome> {
        let values = table.numeric_values(value_col)?;
        let date_col = match date_col {
            Some(d) => {
                let profile = ColumnClassifier::classify_column(table, d, self.config)?;
                if profile.kind != ColumnKind::Datetime {
                    return Err(InsightError::invalid_kind(d, "datetime", profile.kind.as_str()));
                }
                d.to_string()
            }
            None => match self.first_datetime_column(table)? {
                Some(d) => d,
                None => {
                    return Ok(self.not_applicable(ChartKind::TimeSeries, "no datetime column"));
                }
            },
        };

        let dates = table.datetime_values(&date_col)?;
        let points = time_points(&dates, &values, resample);
        let path = self.chart_path(&format!("timeseries_{}", sanitize_file_component(value_col)));
        let title = match resample {
            Resample::None => format!("{} over {}", value_col, date_col),
            Resample::Day => format!("Daily mean of {}", value_col),
            Resample::Week => format!("Weekly mean of {}", value_col),
            Resample::Month => format!("Monthly mean of {}", value_col),
        };
        let columns = vec![value_col.to_string(), date_col.clone()];

        if points.is_empty() {
            return self.placeholder(
                ChartKind::TimeSeries,
                columns,
                path,
                &title,
                "no rows with both a timestamp and a value",
            );
        }

        let series: Vec<(f64, f64)> = points
            .iter()
            .map(|(t, v)| (t.and_utc().timestamp() as f64, *v))
            .collect();
        let first = series.first().map_or(0.0, |p| p.0);
        let last = series.last().map_or(0.0, |p| p.0);
        let (x_lo, x_hi) = if first == last {
            (first - 86_400.0, last + 86_400.0)
        } else {
            (first, last)
        };
        let fold = |acc: (f64, f64), v: f64| (acc.0.min(v), acc.1.max(v));
        let (y_min, y_max) = series
            .iter()
            .map(|p| p.1)
            .fold((f64::INFINITY, f64::NEG_INFINITY), fold);
        let (y_lo, y_hi) = padded_range(y_min, y_max);

        render_svg(&path, self.size(), |root| {
            let date_label = |v: &f64| {
                DateTime::from_timestamp(*v as i64, 0)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            };
            let mut chart = ChartBuilder::on(root)
                .caption(&title, (FONT, 24))
                .margin(16)
                .x_label_area_size(40)
                .y_label_area_size(56)
                .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;
            chart
                .configure_mesh()
                .x_labels(8)
                .x_label_formatter(&date_label)
                .x_desc(date_col.as_str())
                .y_desc(value_col)
                .draw()?;

            let color = series_color(0);
            chart.draw_series(LineSeries::new(series.iter().copied(), color.stroke_width(2)))?;
            chart.draw_series(series.iter().map(|p| Circle::new(*p, 2, color.filled())))?;
            Ok(())
        })?;

        Ok(self.rendered(ChartKind::TimeSeries, columns, path, None))
    }

    fn first_datetime_column(&self, table: &Table) -> Result<Option<String>> {
        for name in table.column_names() {
            if ColumnClassifier::classify_column(table, &name, self.config)?.kind
                == ColumnKind::Datetime
            {
                return Ok(Some(name));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(13, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_linear_fit_exact_line() {
        let points = [(0.0, 1.0), (1.0, 3.0), (2.0, 5.0), (3.0, 7.0)];
        let fit = linear_fit(&points).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert!(linear_fit(&[(1.0, 2.0), (1.0, 3.0)]).is_none());
    }

    #[test]
    fn test_bucket_start() {
        // 2024-03-14 is a Thursday
        let ts = at(2024, 3, 14);
        assert_eq!(bucket_start(ts, Resample::None), ts);
        assert_eq!(bucket_start(ts, Resample::Day), at(2024, 3, 14).date().and_time(NaiveTime::MIN));
        assert_eq!(bucket_start(ts, Resample::Week), at(2024, 3, 11).date().and_time(NaiveTime::MIN));
        assert_eq!(bucket_start(ts, Resample::Month), at(2024, 3, 1).date().and_time(NaiveTime::MIN));
    }

    #[test]
    fn test_time_points_sorted_and_resampled() {
        let dates = vec![Some(at(2024, 2, 3)), Some(at(2024, 1, 5)), None, Some(at(2024, 1, 20))];
        let values = vec![Some(30.0), Some(10.0), Some(99.0), Some(20.0)];

        let raw = time_points(&dates, &values, Resample::None);
        let ordered: Vec<f64> = raw.iter().map(|p| p.1).collect();
        assert_eq!(ordered, vec![10.0, 20.0, 30.0]);

        let monthly = time_points(&dates, &values, Resample::Month);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].1, 15.0);
        assert_eq!(monthly[1].1, 30.0);
    }
}
