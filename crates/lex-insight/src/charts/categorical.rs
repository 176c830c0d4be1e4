//! Bar, missing-value, donut and stacked-bar charts.

use super::style::{
    FONT, category_labels, category_upper, centered, render_svg, series_color,
};
use super::{Aggregation, ChartRenderer};
use crate::error::{InsightError, Result};
use crate::loader::Table;
use crate::stats::frequency::value_counts;
use crate::types::{ChartKind, ChartOutcome};
use crate::utils::{percentage, sanitize_file_component, truncate_label};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::PI;

/// Cross-tabulated values: `cells[g][s]` for group `g` and stack `s`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CrossTab {
    pub groups: Vec<String>,
    pub stacks: Vec<String>,
    pub cells: Vec<Vec<f64>>,
}

/// Aggregate rows by (group, stack) in first-seen order.
///
/// Rows missing either key, or the value when one is needed, are skipped.
pub(crate) fn cross_tabulate(
    groups: &[Option<String>],
    stacks: &[Option<String>],
    values: Option<&[Option<f64>]>,
    aggregation: Aggregation,
) -> CrossTab {
    let mut group_names: Vec<String> = Vec::new();
    let mut stack_names: Vec<String> = Vec::new();
    let mut sums: Vec<Vec<(f64, usize)>> = Vec::new();

    for (row, (g, s)) in groups.iter().zip(stacks).enumerate() {
        let (Some(g), Some(s)) = (g, s) else {
            continue;
        };
        let value = match (aggregation, values) {
            (Aggregation::Count, _) => 1.0,
            (_, Some(values)) => match values.get(row).copied().flatten() {
                Some(v) => v,
                None => continue,
            },
            (_, None) => continue,
        };

        let gi = match group_names.iter().position(|n| n == g) {
            Some(i) => i,
            None => {
                group_names.push(g.clone());
                sums.push(vec![(0.0, 0); stack_names.len()]);
                group_names.len() - 1
            }
        };
        let si = match stack_names.iter().position(|n| n == s) {
            Some(i) => i,
            None => {
                stack_names.push(s.clone());
                for cells in &mut sums {
                    cells.push((0.0, 0));
                }
                stack_names.len() - 1
            }
        };
        let cell = &mut sums[gi][si];
        cell.0 += value;
        cell.1 += 1;
    }

    let cells = sums
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(sum, n)| match aggregation {
                    Aggregation::Mean if n > 0 => sum / n as f64,
                    Aggregation::Mean => 0.0,
                    _ => sum,
                })
                .collect()
        })
        .collect();

    CrossTab {
        groups: group_names,
        stacks: stack_names,
        cells,
    }
}

/// Outline of a donut wedge between two angles (radians, clockwise from 12 o'clock).
pub(crate) fn wedge_points(
    center: (i32, i32),
    outer: f64,
    inner: f64,
    start: f64,
    end: f64,
) -> Vec<(i32, i32)> {
    let steps = (((end - start) / (PI / 90.0)).ceil() as usize).max(1);
    let point = |radius: f64, angle: f64| {
        (
            center.0 + (radius * angle.sin()).round() as i32,
            center.1 - (radius * angle.cos()).round() as i32,
        )
    };
    let arc = |radius: f64| {
        (0..=steps).map(move |i| start + (end - start) * i as f64 / steps as f64)
            .map(move |a| point(radius, a))
    };

    let mut points: Vec<(i32, i32)> = arc(outer).collect();
    let mut back: Vec<(i32, i32)> = arc(inner).collect();
    back.reverse();
    points.extend(back);
    points
}

impl ChartRenderer<'_> {
    /// Bar chart of the top-N values of a column.
    pub fn bar(&self, table: &Table, column: &str) -> Result<ChartOutcome> {
        let freq = value_counts(column, &table.string_values(column)?, self.config.top_n);
        let path = self.chart_path(&format!("bar_{}", sanitize_file_component(column)));
        let title = format!("Top {} values of {}", freq.entries.len(), column);
        let columns = vec![column.to_string()];

        if freq.entries.is_empty() {
            return self.placeholder(ChartKind::Bar, columns, path, &title, "no non-missing values");
        }

        let names: Vec<String> = freq
            .entries
            .iter()
            .map(|e| truncate_label(&e.value, 14))
            .collect();
        let counts: Vec<f64> = freq.entries.iter().map(|e| e.count as f64).collect();
        let y_max = counts.iter().copied().fold(0.0, f64::max) * 1.15;
        let note = freq.is_truncated().then(|| {
            format!(
                "showing {} of {} distinct values",
                freq.entries.len(),
                freq.distinct_count
            )
        });

        render_svg(&path, self.size(), |root| {
            let labels = category_labels(&names);
            let mut chart = ChartBuilder::on(root)
                .caption(&title, (FONT, 24))
                .margin(16)
                .x_label_area_size(48)
                .y_label_area_size(56)
                .build_cartesian_2d(
                    (0u32..category_upper(names.len())).into_segmented(),
                    0f64..y_max,
                )?;
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(names.len() + 1)
                .x_label_formatter(&labels)
                .x_desc(column)
                .y_desc("Count")
                .draw()?;

            let label_style = TextStyle::from((FONT, 12).into_font())
                .pos(Pos::new(HPos::Center, VPos::Bottom));
            for (i, count) in counts.iter().enumerate() {
                let idx = i as u32;
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(idx), 0.0), (SegmentValue::Exact(idx + 1), *count)],
                    series_color(0).filled(),
                );
                bar.set_margin(0, 0, 6, 6);
                chart.draw_series(std::iter::once(bar))?;
                chart.draw_series(std::iter::once(Text::new(
                    format!("{}", *count as usize),
                    (SegmentValue::CenterOf(idx), *count),
                    label_style.clone(),
                )))?;
            }
            Ok(())
        })?;

        Ok(self.rendered(ChartKind::Bar, columns, path, note))
    }

    /// Missing-value percentage per column, zero-missing columns included.
    pub fn missing_values(&self, table: &Table) -> Result<ChartOutcome> {
        let path = self.chart_path("missing_values");
        let title = "Missing values per column".to_string();
        let rows = table.height();

        let mut names = Vec::with_capacity(table.width());
        let mut pcts = Vec::with_capacity(table.width());
        for name in table.column_names() {
            pcts.push(percentage(table.missing_count(&name)?, rows));
            names.push(truncate_label(&name, 14));
        }
        if names.is_empty() {
            return self.placeholder(ChartKind::MissingValues, Vec::new(), path, &title, "table has no columns");
        }
        let note = pcts
            .iter()
            .all(|p| *p == 0.0)
            .then(|| "no missing values".to_string());

        render_svg(&path, self.size(), |root| {
            let labels = category_labels(&names);
            let mut chart = ChartBuilder::on(root)
                .caption(&title, (FONT, 24))
                .margin(16)
                .x_label_area_size(48)
                .y_label_area_size(56)
                .build_cartesian_2d(
                    (0u32..category_upper(names.len())).into_segmented(),
                    0f64..100f64,
                )?;
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(names.len() + 1)
                .x_label_formatter(&labels)
                .y_desc("Missing (%)")
                .draw()?;

            for (i, pct) in pcts.iter().enumerate() {
                let idx = i as u32;
                let color = if *pct > 0.0 { series_color(3) } else { series_color(7) };
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(idx), 0.0), (SegmentValue::Exact(idx + 1), *pct)],
                    color.filled(),
                );
                bar.set_margin(0, 0, 6, 6);
                chart.draw_series(std::iter::once(bar))?;
            }
            Ok(())
        })?;

        Ok(self.rendered(ChartKind::MissingValues, table.column_names(), path, note))
    }

    /// Donut chart for a low-cardinality column.
    pub fn pie(&self, table: &Table, column: &str) -> Result<ChartOutcome> {
        let values = table.string_values(column)?;
        let freq = value_counts(column, &values, usize::MAX);
        if freq.distinct_count > self.config.pie_max_categories {
            return Ok(self.not_applicable(
                ChartKind::Pie,
                format!(
                    "'{}' has {} categories (max {})",
                    column, freq.distinct_count, self.config.pie_max_categories
                ),
            ));
        }

        let path = self.chart_path(&format!("pie_{}", sanitize_file_component(column)));
        let title = format!("Share of {}", column);
        let columns = vec![column.to_string()];
        if freq.entries.is_empty() {
            return self.placeholder(ChartKind::Pie, columns, path, &title, "no non-missing values");
        }

        render_svg(&path, self.size(), |root| {
            let (width, height) = root.dim_in_pixel();
            root.draw(&Text::new(title.clone(), (width as i32 / 2, 32), centered(24)))?;

            let center = ((width as f64 * 0.38) as i32, (height as f64 * 0.55) as i32);
            let outer = width.min(height) as f64 * 0.36;
            let inner = outer * 0.55;
            let total = freq.total_non_missing as f64;

            let mut start = 0.0;
            for (i, entry) in freq.entries.iter().enumerate() {
                let sweep = entry.count as f64 / total * 2.0 * PI;
                let color = series_color(i);
                root.draw(&Polygon::new(
                    wedge_points(center, outer, inner, start, start + sweep),
                    color.filled(),
                ))?;

                let mid = start + sweep / 2.0;
                let r = (outer + inner) / 2.0;
                let anchor = (
                    center.0 + (r * mid.sin()).round() as i32,
                    center.1 - (r * mid.cos()).round() as i32,
                );
                root.draw(&Text::new(format!("{:.1}%", entry.pct), anchor, centered(13)))?;

                let y = 90 + i as i32 * 28;
                let x = (width as f64 * 0.72) as i32;
                root.draw(&Rectangle::new([(x, y - 8), (x + 16, y + 8)], color.filled()))?;
                root.draw(&Text::new(
                    format!("{} ({})", truncate_label(&entry.value, 20), entry.count),
                    (x + 24, y),
                    TextStyle::from((FONT, 14).into_font()).pos(Pos::new(HPos::Left, VPos::Center)),
                ))?;
                start += sweep;
            }
            Ok(())
        })?;

        Ok(self.rendered(ChartKind::Pie, columns, path, None))
    }

    /// Stacked bars of `stack_col` within each `group_col` category.
    pub fn stacked_bar(
        &self,
        table: &Table,
        group_col: &str,
        stack_col: &str,
        value_col: Option<&str>,
        aggregation: Aggregation,
    ) -> Result<ChartOutcome> {
        let groups = table.string_values(group_col)?;
        let stacks = table.string_values(stack_col)?;
        let values = match (aggregation, value_col) {
            (_, Some(v)) => Some(table.numeric_values(v)?),
            (Aggregation::Count, None) => None,
            (agg, None) => {
                return Err(InsightError::InvalidArguments(format!(
                    "aggregation {:?} needs a value column",
                    agg
                )));
            }
        };

        let tab = cross_tabulate(&groups, &stacks, values.as_deref(), aggregation);
        let max = self.config.stacked_max_categories;
        for (name, n) in [(group_col, tab.groups.len()), (stack_col, tab.stacks.len())] {
            if n > max {
                return Ok(self.not_applicable(
                    ChartKind::StackedBar,
                    format!("'{}' has {} categories (max {})", name, n, max),
                ));
            }
        }

        let path = self.chart_path(&format!(
            "stacked_{}_by_{}",
            sanitize_file_component(group_col),
            sanitize_file_component(stack_col)
        ));
        let measure = match (aggregation, value_col) {
            (Aggregation::Count, _) | (_, None) => "Count".to_string(),
            (Aggregation::Sum, Some(v)) => format!("Sum of {}", v),
            (Aggregation::Mean, Some(v)) => format!("Mean of {}", v),
        };
        let title = format!("{} by {} and {}", measure, group_col, stack_col);
        let columns: Vec<String> = [group_col, stack_col]
            .into_iter()
            .chain(value_col)
            .map(str::to_string)
            .collect();

        if tab.groups.is_empty() {
            return self.placeholder(ChartKind::StackedBar, columns, path, &title, "no complete rows");
        }

        let (mut lo, mut hi) = (0.0f64, 0.0f64);
        for row in &tab.cells {
            let mut running = 0.0;
            for v in row {
                running += v;
                lo = lo.min(running);
                hi = hi.max(running);
            }
        }
        if hi == lo {
            hi = lo + 1.0;
        }
        let names: Vec<String> = tab.groups.iter().map(|g| truncate_label(g, 14)).collect();

        render_svg(&path, self.size(), |root| {
            let labels = category_labels(&names);
            let mut chart = ChartBuilder::on(root)
                .caption(&title, (FONT, 24))
                .margin(16)
                .x_label_area_size(48)
                .y_label_area_size(56)
                .build_cartesian_2d(
                    (0u32..category_upper(names.len())).into_segmented(),
                    lo..hi * 1.1,
                )?;
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(names.len() + 1)
                .x_label_formatter(&labels)
                .x_desc(group_col)
                .y_desc(measure.as_str())
                .draw()?;

            let mut base = vec![0.0; tab.groups.len()];
            for (si, stack) in tab.stacks.iter().enumerate() {
                let color = series_color(si);
                let bars: Vec<_> = tab
                    .cells
                    .iter()
                    .enumerate()
                    .map(|(gi, row)| {
                        let idx = gi as u32;
                        let bottom = base[gi];
                        let top = bottom + row[si];
                        let mut rect = Rectangle::new(
                            [(SegmentValue::Exact(idx), bottom), (SegmentValue::Exact(idx + 1), top)],
                            color.filled(),
                        );
                        rect.set_margin(0, 0, 8, 8);
                        rect
                    })
                    .collect();
                for (gi, row) in tab.cells.iter().enumerate() {
                    base[gi] += row[si];
                }
                chart
                    .draw_series(bars)?
                    .label(truncate_label(stack, 16))
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
            }

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.85))
                .border_style(BLACK)
                .position(SeriesLabelPosition::UpperRight)
                .draw()?;
            Ok(())
        })?;

        Ok(self.rendered(ChartKind::StackedBar, columns, path, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(values: &[&str]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
            .collect()
    }

    #[test]
    fn test_cross_tabulate_counts() {
        let groups = strings(&["n", "s", "n", "n", ""]);
        let stacks = strings(&["x", "y", "y", "x", "x"]);
        let tab = cross_tabulate(&groups, &stacks, None, Aggregation::Count);
        assert_eq!(tab.groups, vec!["n", "s"]);
        assert_eq!(tab.stacks, vec!["x", "y"]);
        assert_eq!(tab.cells, vec![vec![2.0, 1.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_cross_tabulate_sum_and_mean() {
        let groups = strings(&["a", "a", "b", "a"]);
        let stacks = strings(&["x", "x", "x", "y"]);
        let values = vec![Some(2.0), Some(4.0), None, Some(10.0)];

        let sum = cross_tabulate(&groups, &stacks, Some(&values), Aggregation::Sum);
        assert_eq!(sum.groups, vec!["a"]);
        assert_eq!(sum.cells, vec![vec![6.0, 10.0]]);

        let mean = cross_tabulate(&groups, &stacks, Some(&values), Aggregation::Mean);
        assert_eq!(mean.cells, vec![vec![3.0, 10.0]]);
    }

    #[test]
    fn test_wedge_points_closed_ring() {
        let points = wedge_points((100, 100), 50.0, 25.0, 0.0, PI / 2.0);
        assert_eq!(points.first(), Some(&(100, 50)));
        assert!(points.contains(&(150, 100)));
        assert!(points.contains(&(125, 100)));
        assert_eq!(points.last(), Some(&(100, 75)));
    }
}
