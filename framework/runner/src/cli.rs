use std::path::PathBuf;

use clap::{Args, ValueEnum};
use envbench_probes::DEFAULT_CONTAINER_RUNTIME;
use envbench_summary_model::DEFAULT_TICK_INTERVAL_MS;

use crate::sampler::SnapshotCadence;
use crate::schedule::PhaseRule;

/// The deployment environments envbench compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Docker,
    Vm,
}

impl Environment {
    pub fn label(&self) -> &'static str {
        match self {
            Environment::Docker => "docker",
            Environment::Vm => "vm",
        }
    }

    /// Where results for this environment are written unless told otherwise.
    pub fn default_output_dir(&self) -> PathBuf {
        PathBuf::from(format!("./{}-actions", self.label()))
    }
}

#[derive(Debug, Clone, Args)]
pub struct MeasureArgs {
    /// The environment being measured
    #[arg(value_enum)]
    pub environment: Environment,

    /// Measure this container through the container runtime instead of a web page
    pub container_id: Option<String>,

    /// The page to measure.
    ///
    /// Opening the page needs a build with the `chrome` feature. Without it, use --host-only or
    /// give a container id.
    #[arg(long, env = "APP_URL", default_value = "http://localhost:3000")]
    pub app_url: String,

    /// Label stored with the result, defaults to the environment name
    #[arg(long, env = "ENVIRONMENT")]
    pub environment_label: Option<String>,

    /// Directory the result is written to, defaults to `./<environment>-actions`
    #[arg(long, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// How long to measure for, in milliseconds
    #[arg(long, env = "TEST_DURATION", default_value_t = 30_000)]
    pub test_duration: u64,

    /// The time between ticks, in milliseconds
    #[arg(long, env = "TICK_INTERVAL_MS", default_value_t = DEFAULT_TICK_INTERVAL_MS)]
    pub tick_interval_ms: u64,

    /// Change the tick interval after a number of ticks, in the format `after_ticks:interval_ms`.
    /// For example `--phase=10:250` samples every 250ms once 10 ticks have completed.
    ///
    /// You can specify multiple phases by using the flag multiple times.
    #[arg(long = "phase", env = "PHASE", value_delimiter = ',')]
    pub phases: Vec<PhaseRule>,

    /// When to read host CPU and memory usage
    #[arg(long, value_enum, default_value_t = SnapshotCadence::EveryTick)]
    pub snapshot_cadence: SnapshotCadence,

    /// The container runtime binary, looked up on the `PATH`
    #[arg(long, env = "CONTAINER_RUNTIME", default_value = DEFAULT_CONTAINER_RUNTIME)]
    pub container_runtime: String,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    /// Only measure the host, without opening the page.
    ///
    /// Required to measure without a container id when envbench was built without the `chrome`
    /// feature.
    #[arg(long, default_value_t = false)]
    pub host_only: bool,
}
