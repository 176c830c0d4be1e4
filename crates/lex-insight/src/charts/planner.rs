//! Chart selection policy.

use super::{Aggregation, ChartRequest, Resample};
use crate::config::AnalysisConfig;
use crate::profiler::columns_of_kind;
use crate::types::{ChartKind, ColumnKind, ColumnProfile, CorrelationMatrix, SkippedChart};
use serde::{Deserialize, Serialize};

/// Charts chosen for a table, plus the ones ruled out and why.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartPlan {
    pub requests: Vec<ChartRequest>,
    pub skipped: Vec<SkippedChart>,
}

/// Turns column profiles and correlations into chart requests.
pub struct ChartPlanner<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> ChartPlanner<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Build the plan in a fixed order: histograms, heatmap, bars,
    /// missing values, pies, box plots, stacked bar, time series, scatters.
    pub fn plan(&self, profiles: &[ColumnProfile], correlation: &CorrelationMatrix) -> ChartPlan {
        let numeric = columns_of_kind(profiles, ColumnKind::Numeric);
        let categorical: Vec<&ColumnProfile> = profiles
            .iter()
            .filter(|p| p.kind == ColumnKind::Categorical)
            .collect();
        let datetime = columns_of_kind(profiles, ColumnKind::Datetime);

        let mut plan = ChartPlan::default();

        for column in &numeric {
            plan.requests.push(ChartRequest::Histogram {
                column: column.clone(),
            });
        }

        if correlation.len() >= 2 {
            plan.requests.push(ChartRequest::Heatmap { columns: None });
        } else {
            plan.skip(
                ChartKind::Heatmap,
                numeric.clone(),
                "fewer than two numeric columns",
            );
        }

        for profile in &categorical {
            plan.requests.push(ChartRequest::Bar {
                column: profile.name.clone(),
            });
        }

        plan.requests.push(ChartRequest::MissingValues);

        for profile in &categorical {
            if profile.unique_count <= self.config.pie_max_categories {
                plan.requests.push(ChartRequest::Pie {
                    column: profile.name.clone(),
                });
            } else {
                plan.skip(
                    ChartKind::Pie,
                    vec![profile.name.clone()],
                    format!(
                        "{} categories exceed the pie limit of {}",
                        profile.unique_count, self.config.pie_max_categories
                    ),
                );
            }
        }

        let group = self.box_group(&categorical);
        for column in &numeric {
            plan.requests.push(ChartRequest::Box {
                column: column.clone(),
                group: group.clone(),
            });
        }

        let stackable: Vec<&&ColumnProfile> = categorical
            .iter()
            .filter(|p| p.unique_count <= self.config.stacked_max_categories)
            .collect();
        match stackable.as_slice() {
            [first, second, ..] => plan.requests.push(ChartRequest::StackedBar {
                group_col: first.name.clone(),
                stack_col: second.name.clone(),
                value_col: None,
                aggregation: Aggregation::Count,
            }),
            _ => plan.skip(
                ChartKind::StackedBar,
                categorical.iter().map(|p| p.name.clone()).collect(),
                "needs two categorical columns",
            ),
        }

        match datetime.first() {
            Some(date_col) => {
                for column in &numeric {
                    plan.requests.push(ChartRequest::TimeSeries {
                        value_col: column.clone(),
                        date_col: Some(date_col.clone()),
                        resample: Resample::None,
                    });
                }
            }
            None => plan.skip(ChartKind::TimeSeries, Vec::new(), "no datetime column"),
        }

        let pairs = correlation.pairs_above(self.config.scatter_correlation_threshold);
        if pairs.is_empty() {
            plan.skip(
                ChartKind::Scatter,
                Vec::new(),
                format!(
                    "no numeric pair with |r| >= {}",
                    self.config.scatter_correlation_threshold
                ),
            );
        }
        for pair in pairs {
            plan.requests.push(ChartRequest::Scatter { x: pair.a, y: pair.b });
        }

        plan
    }

    /// First categorical column with a box-friendly number of categories.
    fn box_group(&self, categorical: &[&ColumnProfile]) -> Option<String> {
        let range = self.config.box_group_min_categories..=self.config.box_group_max_categories;
        categorical
            .iter()
            .find(|p| range.contains(&p.unique_count))
            .map(|p| p.name.clone())
    }
}

impl ChartPlan {
    fn skip(&mut self, kind: ChartKind, columns: Vec<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedChart {
            kind,
            columns,
            reason: reason.into(),
        });
    }

    /// Requests of one kind.
    pub fn of_kind(&self, kind: ChartKind) -> impl Iterator<Item = &ChartRequest> {
        self.requests.iter().filter(move |r| r.kind() == kind)
    }
}
