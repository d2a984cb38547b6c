use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use envbench_probes::{detect_host_probe, ContainerProbe};
use envbench_summary_model::{build_result, ResultStore, RunMetadata};

use crate::browser::BrowserSession;
use crate::cli::MeasureArgs;
use crate::config::{MeasureConfig, Target};
use crate::monitor::start_monitor;
use crate::progress::start_progress;
use crate::sampler::Sampler;
use crate::{executor::Executor, shutdown::start_shutdown_listener};

/// Measure one environment and persist the result.
///
/// Returns the path of the result file. A run stopped with Ctrl-C is saved with the ticks that
/// completed and marked as cancelled.
pub fn measure(args: MeasureArgs) -> anyhow::Result<PathBuf> {
    let config = MeasureConfig::try_from(args)?;

    log::info!(
        "Measuring environment '{}' for {}ms",
        config.environment_label,
        config.duration_ms
    );

    let store = ResultStore::new(&config.output_dir);
    store
        .ensure_environment_dir(&config.environment_label)
        .context("Failed to prepare output directory")?;

    let sampler = Sampler::new(config.sampler_config(), detect_host_probe());
    let mut sampler = match &config.target {
        Target::Container {
            runtime,
            container_id,
        } => sampler.with_container_probe(ContainerProbe::new(runtime, container_id)?),
        Target::Page(url) => sampler.with_browser(open_browser(url)?),
        Target::Host => sampler,
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = start_shutdown_listener(&runtime)?;
    let executor = Executor::new(runtime, shutdown_handle.clone());

    if !config.no_progress {
        start_progress(
            Duration::from_millis(config.duration_ms),
            shutdown_handle.new_listener(),
        );
    }

    // Report high usage by envbench itself, which would inflate the host readings
    start_monitor(shutdown_handle.new_listener());

    let output = sampler.run(&executor, shutdown_handle.new_listener());

    // Stop the progress bar and monitor whether or not the run succeeded
    shutdown_handle.shutdown();
    let output = output?;

    if output.cancelled {
        log::warn!(
            "Run was cancelled after {} of {} ticks, saving a partial result",
            output.readings.samples.len(),
            output.planned_ticks
        );
    }

    let result = build_result(
        RunMetadata {
            run_id: nanoid::nanoid!(),
            environment_label: config.environment_label.clone(),
            created_at: chrono::Utc::now(),
            target_url: config.target_url(),
            test_duration_ms: config.duration_ms,
            tick_interval_ms: config.schedule.base_interval_ms(),
            tick_phases: config.schedule.tick_phases(),
            planned_ticks: output.planned_ticks,
            cancelled: output.cancelled,
        },
        output.readings,
    );
    log::debug!("Built {} result {}", result.kind(), result.record().run_id);

    Ok(store.save(&result)?)
}

#[cfg(feature = "chrome")]
fn open_browser(url: &url::Url) -> anyhow::Result<Box<dyn BrowserSession>> {
    Ok(Box::new(crate::chrome::ChromeSession::open(url)?))
}

#[cfg(not(feature = "chrome"))]
fn open_browser(url: &url::Url) -> anyhow::Result<Box<dyn BrowserSession>> {
    anyhow::bail!(
        "Measuring {url} needs a build with the `chrome` feature, use --host-only to measure the host alone"
    )
}
