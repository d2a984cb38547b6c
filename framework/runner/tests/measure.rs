use clap::Parser;
use envbench_runner::prelude::*;
use envbench_summary_model::{ResultStore, RunResult};
use tempfile::TempDir;

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    measure: MeasureArgs,
}

fn measure_args(output_dir: &TempDir, extra: &[&str]) -> MeasureArgs {
    let mut args = vec![
        "envbench".to_string(),
        "vm".to_string(),
        "--output-dir".to_string(),
        output_dir.path().display().to_string(),
        "--no-progress".to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));

    TestCli::parse_from(args).measure
}

#[test]
fn test_should_save_host_only_result() -> anyhow::Result<()> {
    let output_dir = TempDir::new()?;

    let path = measure(measure_args(
        &output_dir,
        &[
            "--host-only",
            "--test-duration",
            "200",
            "--tick-interval-ms",
            "100",
            "--snapshot-cadence",
            "end-of-run",
        ],
    ))?;

    assert!(path.starts_with(output_dir.path()));
    let file_name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("vm-"), "{file_name}");
    assert!(file_name.ends_with(".json"), "{file_name}");

    // The placeholder written for the empty directory is ignored on load
    assert!(output_dir.path().join("vm-initial.json").exists());
    let results = ResultStore::new(output_dir.path()).load_all()?;
    assert_eq!(results.len(), 1);

    let RunResult::Host(host) = &results[0] else {
        panic!("Expected a host result, got {}", results[0].kind());
    };
    assert_eq!(host.run.environment_label, "vm");
    assert_eq!(host.run.samples.len(), 2);
    assert_eq!(host.run.test_duration_ms, 200);
    assert_eq!(host.run.tick_interval_ms, 100);
    assert!(!host.run.cancelled);
    assert!(!host.run.run_id.is_empty());
    Ok(())
}

#[test]
fn test_should_fail_without_usable_container_runtime() -> anyhow::Result<()> {
    let output_dir = TempDir::new()?;

    let result = measure(measure_args(
        &output_dir,
        &["web-1", "--container-runtime", "/non/existent/docker"],
    ));

    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_should_save_phase_rules_with_result() -> anyhow::Result<()> {
    let output_dir = TempDir::new()?;

    // One tick at 100ms then 50ms ticks fill the rest of the 300ms
    measure(measure_args(
        &output_dir,
        &[
            "--host-only",
            "--test-duration",
            "300",
            "--tick-interval-ms",
            "100",
            "--phase",
            "1:50",
            "--snapshot-cadence",
            "end-of-run",
        ],
    ))?;

    let results = ResultStore::new(output_dir.path()).load_all()?;
    let record = results[0].record();
    assert!(!record.cancelled);
    assert_eq!(record.samples.len(), 5);
    assert_eq!(record.planned_ticks(), 5);
    assert_eq!(record.tick_interval_ms, 100);
    assert_eq!(record.tick_phases.len(), 1);
    assert_eq!(record.tick_phases[0].after_ticks, 1);
    assert_eq!(record.tick_phases[0].interval_ms, 50);
    Ok(())
}

#[cfg(not(feature = "chrome"))]
#[test]
fn test_should_explain_missing_browser_support() -> anyhow::Result<()> {
    let output_dir = TempDir::new()?;

    let err = measure(measure_args(
        &output_dir,
        &["--app-url", "http://localhost:3000"],
    ))
    .expect_err("Page runs need browser support");

    let message = format!("{err:#}");
    assert!(message.contains("`chrome` feature"), "{message}");
    assert!(message.contains("--host-only"), "{message}");
    Ok(())
}
