//! Histogram with density overlay, and box plots.

use super::ChartRenderer;
use super::style::{
    FONT, category_labels, category_upper, padded_range, render_svg, series_color,
};
use crate::error::Result;
use crate::loader::Table;
use crate::stats::descriptive::{quantile, sample_std};
use crate::types::{ChartKind, ChartOutcome};
use crate::utils::{sanitize_file_component, truncate_label};
use plotters::prelude::*;
use std::f64::consts::PI;

const KDE_POINTS: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins over `[min, max]`; the last bin is closed.
pub(crate) fn histogram_bins(values: &[f64], bins: usize) -> Vec<Bin> {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);
    if min == max {
        return vec![Bin {
            start: min - 0.5,
            end: max + 0.5,
            count: values.len(),
        }];
    }

    let bins = bins.max(1);
    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count,
        })
        .collect()
}

/// Gaussian KDE with bandwidth `std * n^-0.2`, scaled by `scale`.
///
/// `None` for fewer than two values or zero spread.
pub(crate) fn kde_curve(values: &[f64], lo: f64, hi: f64, scale: f64) -> Option<Vec<(f64, f64)>> {
    let std = sample_std(values)?;
    if std == 0.0 {
        return None;
    }
    let n = values.len() as f64;
    let bandwidth = std * n.powf(-0.2);
    let norm = 1.0 / (n * bandwidth * (2.0 * PI).sqrt());
    let step = (hi - lo) / (KDE_POINTS - 1) as f64;

    let curve = (0..KDE_POINTS)
        .map(|i| {
            let x = lo + step * i as f64;
            let density: f64 = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm;
            (x, density * scale)
        })
        .collect();
    Some(curve)
}

/// Five-number summary for one box.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// Box statistics; whiskers stop at the last values inside the IQR fences.
pub(crate) fn box_summary(values: &[f64], multiplier: f64) -> Option<BoxSummary> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q1 = quantile(&sorted, 0.25)?;
    let median = quantile(&sorted, 0.5)?;
    let q3 = quantile(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;

    let inside = || sorted.iter().copied().filter(|v| *v >= lower && *v <= upper);
    Some(BoxSummary {
        q1,
        median,
        q3,
        whisker_low: inside().next().unwrap_or(q1),
        whisker_high: inside().last().unwrap_or(q3),
        outliers: values
            .iter()
            .copied()
            .filter(|v| *v < lower || *v > upper)
            .collect(),
    })
}

impl ChartRenderer<'_> {
    /// Histogram of a numeric column with a KDE overlay.
    pub fn histogram(&self, table: &Table, column: &str) -> Result<ChartOutcome> {
        let values: Vec<f64> = table.numeric_values(column)?.into_iter().flatten().collect();
        let path = self.chart_path(&format!("hist_{}", sanitize_file_component(column)));
        let title = format!("Distribution of {}", column);
        let columns = vec![column.to_string()];

        if values.len() < 2 {
            return self.placeholder(
                ChartKind::Histogram,
                columns,
                path,
                &title,
                "fewer than two non-missing values",
            );
        }

        let bins = histogram_bins(&values, self.config.histogram_bins);
        let lo = bins.first().map_or(0.0, |b| b.start);
        let hi = bins.last().map_or(1.0, |b| b.end);
        let bin_width = bins.first().map_or(1.0, |b| b.end - b.start);
        let curve = kde_curve(&values, lo, hi, values.len() as f64 * bin_width);
        let note = curve
            .is_none()
            .then(|| "zero variance; density curve omitted".to_string());

        let peak = bins.iter().map(|b| b.count as f64).fold(0.0, f64::max);
        let curve_peak = curve
            .iter()
            .flatten()
            .map(|(_, y)| *y)
            .fold(0.0, f64::max);
        let y_max = peak.max(curve_peak) * 1.1;

        render_svg(&path, self.size(), |root| {
            let mut chart = ChartBuilder::on(root)
                .caption(&title, (FONT, 24))
                .margin(16)
                .x_label_area_size(40)
                .y_label_area_size(56)
                .build_cartesian_2d(lo..hi, 0f64..y_max)?;
            chart
                .configure_mesh()
                .x_desc(column)
                .y_desc("Count")
                .draw()?;

            let fill = series_color(0).mix(0.6).filled();
            chart.draw_series(
                bins.iter()
                    .map(|b| Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], fill)),
            )?;
            if let Some(curve) = &curve {
                chart.draw_series(LineSeries::new(
                    curve.iter().copied(),
                    series_color(3).stroke_width(2),
                ))?;
            }
            Ok(())
        })?;

        Ok(self.rendered(ChartKind::Histogram, columns, path, note))
    }

    /// Box plot of a numeric column, optionally one box per group value.
    pub fn box_plot(&self, table: &Table, column: &str, group: Option<&str>) -> Result<ChartOutcome> {
        let values = table.numeric_values(column)?;
        let (stem, title, columns) = match group {
            Some(g) => (
                format!(
                    "box_{}_by_{}",
                    sanitize_file_component(column),
                    sanitize_file_component(g)
                ),
                format!("{} by {}", column, g),
                vec![column.to_string(), g.to_string()],
            ),
            None => (
                format!("box_{}", sanitize_file_component(column)),
                format!("Box plot of {}", column),
                vec![column.to_string()],
            ),
        };
        let path = self.chart_path(&stem);

        let groups: Vec<(String, Vec<f64>)> = match group {
            Some(g) => {
                let labels = table.string_values(g)?;
                let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
                for (label, value) in labels.into_iter().zip(values) {
                    let (Some(label), Some(value)) = (label, value) else {
                        continue;
                    };
                    match groups.iter_mut().find(|(name, _)| *name == label) {
                        Some((_, bucket)) => bucket.push(value),
                        None => groups.push((label, vec![value])),
                    }
                }
                groups
            }
            None => vec![(column.to_string(), values.into_iter().flatten().collect())],
        };

        if let Some(g) = group
            && groups.len() > self.config.stacked_max_categories
        {
            return Ok(self.not_applicable(
                ChartKind::Box,
                format!(
                    "group column '{}' has {} categories (max {})",
                    g,
                    groups.len(),
                    self.config.stacked_max_categories
                ),
            ));
        }

        let summaries: Vec<(String, BoxSummary)> = groups
            .iter()
            .filter_map(|(name, vals)| {
                box_summary(vals, self.config.iqr_multiplier).map(|s| (truncate_label(name, 18), s))
            })
            .collect();
        if summaries.is_empty() {
            return self.placeholder(ChartKind::Box, columns, path, &title, "no non-missing values");
        }

        let all = groups.iter().flat_map(|(_, v)| v.iter().copied());
        let (min, max) = all.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let (y_lo, y_hi) = padded_range(min, max);
        let names: Vec<String> = summaries.iter().map(|(n, _)| n.clone()).collect();
        let upper = category_upper(names.len());

        render_svg(&path, self.size(), |root| {
            let labels = category_labels(&names);
            let mut chart = ChartBuilder::on(root)
                .caption(&title, (FONT, 24))
                .margin(16)
                .x_label_area_size(48)
                .y_label_area_size(56)
                .build_cartesian_2d((0u32..upper).into_segmented(), y_lo..y_hi)?;
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(names.len() + 1)
                .x_label_formatter(&labels)
                .y_desc(column)
                .draw()?;

            let (plot_width, _) = chart.plotting_area().dim_in_pixel();
            let inset = (plot_width / (names.len() as u32 + 1) / 5).max(2);

            for (i, (_, s)) in summaries.iter().enumerate() {
                let idx = i as u32;
                let color = series_color(i);
                let left = |y: f64| (SegmentValue::Exact(idx), y);
                let right = |y: f64| (SegmentValue::Exact(idx + 1), y);
                let center = |y: f64| (SegmentValue::CenterOf(idx), y);

                let mut body = Rectangle::new([left(s.q1), right(s.q3)], color.mix(0.35).filled());
                body.set_margin(0, 0, inset, inset);
                let mut outline = Rectangle::new([left(s.q1), right(s.q3)], color.stroke_width(2));
                outline.set_margin(0, 0, inset, inset);
                let mut median = Rectangle::new([left(s.median), right(s.median)], BLACK.stroke_width(2));
                median.set_margin(0, 0, inset, inset);
                chart.draw_series([body, outline, median])?;

                chart.draw_series([
                    PathElement::new(vec![center(s.q3), center(s.whisker_high)], color),
                    PathElement::new(vec![center(s.q1), center(s.whisker_low)], color),
                ])?;

                let cap_inset = inset * 2;
                let mut caps = [
                    Rectangle::new([left(s.whisker_high), right(s.whisker_high)], color),
                    Rectangle::new([left(s.whisker_low), right(s.whisker_low)], color),
                ];
                for cap in &mut caps {
                    cap.set_margin(0, 0, cap_inset, cap_inset);
                }
                chart.draw_series(caps)?;

                chart.draw_series(
                    s.outliers
                        .iter()
                        .map(|v| Circle::new(center(*v), 3, color.filled())),
                )?;
            }
            Ok(())
        })?;

        Ok(self.rendered(ChartKind::Box, columns, path, None))
    }
}
