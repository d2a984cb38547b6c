use std::path::PathBuf;

use anyhow::{bail, Context};
use url::Url;

use crate::cli::MeasureArgs;
use crate::sampler::{SamplerConfig, SnapshotCadence};
use crate::schedule::TickSchedule;

/// What a run measures besides the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Page(Url),
    Container {
        runtime: String,
        container_id: String,
    },
    Host,
}

/// Validated settings for one `measure` invocation.
#[derive(Debug, Clone)]
pub struct MeasureConfig {
    pub environment_label: String,
    pub output_dir: PathBuf,
    pub target: Target,
    pub duration_ms: u64,
    pub schedule: TickSchedule,
    pub cadence: SnapshotCadence,
    pub no_progress: bool,
}

impl MeasureConfig {
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            duration_ms: self.duration_ms,
            schedule: self.schedule.clone(),
            cadence: self.cadence,
        }
    }

    /// The URL stored with the result, empty unless a page is measured.
    pub fn target_url(&self) -> String {
        match &self.target {
            Target::Page(url) => url.to_string(),
            _ => String::new(),
        }
    }
}

impl TryFrom<MeasureArgs> for MeasureConfig {
    type Error = anyhow::Error;

    fn try_from(args: MeasureArgs) -> Result<Self, Self::Error> {
        let schedule = TickSchedule::new(args.tick_interval_ms, args.phases)?;

        // Container runs read the container and the host, never the page
        let target = match args.container_id {
            Some(container_id) => Target::Container {
                runtime: args.container_runtime,
                container_id,
            },
            None if args.host_only => Target::Host,
            None => {
                let url = Url::parse(&args.app_url)
                    .with_context(|| format!("Invalid app URL: {}", args.app_url))?;
                if !matches!(url.scheme(), "http" | "https") {
                    bail!("App URL must use http or https, got {}", url.scheme());
                }
                Target::Page(url)
            }
        };

        let environment_label = args
            .environment_label
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| args.environment.label().to_string());

        Ok(Self {
            environment_label,
            output_dir: args
                .output_dir
                .unwrap_or_else(|| args.environment.default_output_dir()),
            target,
            duration_ms: args.test_duration,
            schedule,
            cadence: args.snapshot_cadence,
            no_progress: args.no_progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        measure: MeasureArgs,
    }

    fn config(args: &[&str]) -> anyhow::Result<MeasureConfig> {
        let cli = TestCli::try_parse_from(std::iter::once("envbench").chain(args.iter().copied()))?;
        MeasureConfig::try_from(cli.measure)
    }

    #[test]
    fn test_should_default_to_page_target() -> anyhow::Result<()> {
        let config = config(&["docker", "--app-url", "http://localhost:3000"])?;

        assert_eq!(config.environment_label, "docker");
        assert_eq!(config.output_dir, PathBuf::from("./docker-actions"));
        assert_eq!(
            config.target,
            Target::Page(Url::parse("http://localhost:3000")?)
        );
        assert_eq!(config.target_url(), "http://localhost:3000/");
        assert_eq!(config.schedule, TickSchedule::fixed(1000)?);
        Ok(())
    }

    #[test]
    fn test_should_target_container_when_id_given() -> anyhow::Result<()> {
        let config = config(&["vm", "web-1", "--container-runtime", "podman"])?;

        assert_eq!(config.output_dir, PathBuf::from("./vm-actions"));
        assert_eq!(
            config.target,
            Target::Container {
                runtime: "podman".to_string(),
                container_id: "web-1".to_string(),
            }
        );
        assert_eq!(config.target_url(), "");
        Ok(())
    }

    #[test]
    fn test_should_skip_page_when_host_only() -> anyhow::Result<()> {
        let config = config(&["vm", "--host-only", "--app-url", "not a url"])?;
        assert_eq!(config.target, Target::Host);
        Ok(())
    }

    #[test]
    fn test_should_reject_invalid_app_url() {
        assert!(config(&["docker", "--app-url", "not a url"]).is_err());
        assert!(config(&["docker", "--app-url", "ftp://localhost/"]).is_err());
    }

    #[test]
    fn test_should_reject_zero_tick_interval() {
        assert!(config(&["docker", "--host-only", "--tick-interval-ms", "0"]).is_err());
    }

    #[test]
    fn test_should_parse_phases_and_overrides() -> anyhow::Result<()> {
        let config = config(&[
            "docker",
            "--host-only",
            "--environment-label",
            "docker-arm",
            "--output-dir",
            "/tmp/results",
            "--test-duration",
            "5000",
            "--phase",
            "2:500",
            "--phase",
            "4:250",
            "--snapshot-cadence",
            "end-of-run",
        ])?;

        assert_eq!(config.environment_label, "docker-arm");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/results"));
        assert_eq!(config.duration_ms, 5000);
        assert_eq!(config.cadence, SnapshotCadence::EndOfRun);
        assert_eq!(config.schedule.interval_ms_for_tick(3), 500);
        assert_eq!(config.schedule.interval_ms_for_tick(4), 250);
        Ok(())
    }

    #[test]
    fn test_should_document_chrome_feature_for_page_runs() {
        use clap::CommandFactory;

        let command = TestCli::command();
        for id in ["app_url", "host_only"] {
            let help = command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_long_help().or(arg.get_help()))
                .map(|help| help.to_string())
                .unwrap_or_default();
            assert!(help.contains("`chrome` feature"), "{id}: {help}");
        }
    }

    #[test]
    fn test_should_reject_unknown_environment() {
        assert!(config(&["kubernetes"]).is_err());
    }
}
