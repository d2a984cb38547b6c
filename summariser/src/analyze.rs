use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use envbench_summary_model::{ResultStore, RunResult};

use crate::error::AnalysisError;
use crate::model::{ComparisonReport, EnvironmentInput, EnvironmentSummary};

/// Reduce the results of one environment to their mean figures.
///
/// The frame rate of each result is recomputed from its values when it has any. An empty set of
/// results summarises to zeros.
pub fn summarize(label: &str, results: &[RunResult]) -> EnvironmentSummary {
    let mean = |value: fn(&RunResult) -> f64| {
        if results.is_empty() {
            0.0
        } else {
            results.iter().map(value).sum::<f64>() / results.len() as f64
        }
    };

    EnvironmentSummary {
        label: label.to_string(),
        run_count: results.len(),
        average_fps: mean(|r| r.record().frame_rate_stats.effective_average()),
        average_cpu: mean(|r| r.record().resource_stats.cpu_usage_percent),
        average_memory: mean(|r| r.record().resource_stats.memory_usage_percent),
    }
}

/// Load every valid result of an environment and summarise it.
pub fn summarize_environment(
    input: &EnvironmentInput,
) -> Result<EnvironmentSummary, AnalysisError> {
    let results = ResultStore::new(&input.dir)
        .load_all()
        .map_err(|source| AnalysisError::InsufficientData {
            label: input.label.clone(),
            dir: input.dir.clone(),
            source,
        })?;

    log::info!(
        "Loaded {} results for '{}' from {}",
        results.len(),
        input.label,
        input.dir.display()
    );

    Ok(summarize(&input.label, &results))
}

/// Compare environment A against environment B.
///
/// Fails with [AnalysisError::InsufficientData] when either directory is missing or holds no
/// valid results.
pub fn compare(
    environment_a: &EnvironmentInput,
    environment_b: &EnvironmentInput,
) -> Result<ComparisonReport, AnalysisError> {
    let summary_a = summarize_environment(environment_a)?;
    let summary_b = summarize_environment(environment_b)?;

    Ok(ComparisonReport::new(summary_a, summary_b))
}

/// Write the report as pretty printed JSON, replacing any previous report at `path`.
pub fn write_report(report: &ComparisonReport, path: &Path) -> Result<(), AnalysisError> {
    let to_write_error = |source| AnalysisError::WriteReport {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(to_write_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush().map_err(to_write_error)?;

    log::info!("Wrote comparison report to {}", path.display());

    Ok(())
}

/// Compare two environments and persist the report.
pub fn run_analysis(
    environment_a: &EnvironmentInput,
    environment_b: &EnvironmentInput,
    report_path: &Path,
) -> Result<ComparisonReport, AnalysisError> {
    let report = compare(environment_a, environment_b)?;
    write_report(&report, report_path)?;

    Ok(report)
}
