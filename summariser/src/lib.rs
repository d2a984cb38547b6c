//! Compare the results of two environments.
//!
//! Every valid result found for an environment is reduced to an [EnvironmentSummary]. Two
//! summaries make a [ComparisonReport], which is written as JSON and printed as a table.

mod analyze;
mod error;
mod model;
mod table;

pub use analyze::{compare, run_analysis, summarize, summarize_environment, write_report};
pub use error::AnalysisError;
pub use model::{diff_percent, ComparisonReport, EnvironmentInput, EnvironmentSummary};
pub use table::format_report;
