//! Report writing.
//!
//! [`ReportWriter`] turns an [`AnalysisSummary`](crate::types::AnalysisSummary)
//! into a sectioned plain-text report (`analysis_summary.txt`) and a JSON
//! copy (`analysis_summary.json`). Formatting is pure: the same summary
//! always renders to the same text.

mod generator;

pub use generator::{ReportWriter, SUMMARY_JSON_FILE, SUMMARY_TEXT_FILE};
