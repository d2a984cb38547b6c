use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// An environment to analyse and the directory its results are stored in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentInput {
    pub label: String,
    pub dir: PathBuf,
}

impl EnvironmentInput {
    pub fn new<P: Into<PathBuf>>(label: &str, dir: P) -> Self {
        Self {
            label: label.to_string(),
            dir: dir.into(),
        }
    }
}

/// Mean figures over every valid result of one environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSummary {
    pub label: String,
    /// The number of results the averages were computed from
    pub run_count: usize,
    pub average_fps: f64,
    pub average_cpu: f64,
    pub average_memory: f64,
}

/// How environment A compares to environment B.
///
/// Each diff is `(a - b) / b * 100`, rounded to two decimal places. A diff against a zero `b` is
/// reported as `0`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub environment_a: EnvironmentSummary,
    pub environment_b: EnvironmentSummary,
    pub fps_diff_percent: f64,
    pub cpu_diff_percent: f64,
    pub memory_diff_percent: f64,
}

impl ComparisonReport {
    pub fn new(environment_a: EnvironmentSummary, environment_b: EnvironmentSummary) -> Self {
        Self {
            fps_diff_percent: diff_percent(environment_a.average_fps, environment_b.average_fps),
            cpu_diff_percent: diff_percent(environment_a.average_cpu, environment_b.average_cpu),
            memory_diff_percent: diff_percent(
                environment_a.average_memory,
                environment_b.average_memory,
            ),
            environment_a,
            environment_b,
        }
    }
}

/// Percentage difference of `a` relative to `b`, `0` when `b` is zero.
pub fn diff_percent(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return 0.0;
    }

    ((a - b) / b * 100.0 * 100.0).round() / 100.0
}
