use std::path::PathBuf;
use std::process::Command;

use envbench_summary_model::ContainerSnapshot;

use crate::error::ProbeError;

/// Default container runtime binary.
pub const DEFAULT_CONTAINER_RUNTIME: &str = "docker";

/// Go template passed to `<runtime> stats --format`, one `CPU%,MEM%` line.
const STATS_FORMAT: &str = "{{.CPUPerc}},{{.MemPerc}}";

/// Reads CPU and memory usage of one container through the container runtime's `stats` command.
///
/// Invocation problems (empty id, missing runtime, unknown container, unreachable daemon) are
/// returned as [ProbeError]. Output that can't be parsed is logged and reported as zeros.
#[derive(Debug, Clone)]
pub struct ContainerProbe {
    runtime: PathBuf,
    container_id: String,
}

impl ContainerProbe {
    /// Create a probe for `container_id`, resolving `runtime` from the `PATH` when it isn't a path.
    pub fn new(runtime: &str, container_id: &str) -> Result<Self, ProbeError> {
        let container_id = container_id.trim();
        if container_id.is_empty() {
            return Err(ProbeError::EmptyContainerId);
        }

        let runtime = which::which(runtime).map_err(|source| ProbeError::RuntimeUnavailable {
            runtime: runtime.to_string(),
            source,
        })?;
        log::debug!("Using container runtime at {}", runtime.display());

        Ok(Self {
            runtime,
            container_id: container_id.to_string(),
        })
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Take one non-streaming reading.
    pub fn sample(&self) -> Result<ContainerSnapshot, ProbeError> {
        let output = Command::new(&self.runtime)
            .arg("stats")
            .arg(&self.container_id)
            .arg("--no-stream")
            .arg("--format")
            .arg(STATS_FORMAT)
            .output()
            .map_err(|source| ProbeError::Spawn {
                runtime: self.runtime.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                container_id: self.container_id.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_stats_line(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse a `CPU%,MEM%` line, e.g. `23.5%,61.2%`.
///
/// A line without exactly two fields is logged and reported as zeros. A field that isn't a number
/// after stripping `%` and whitespace is reported as zero.
pub fn parse_stats_line(output: &str) -> ContainerSnapshot {
    let fields = output.trim().split(',').collect::<Vec<_>>();
    let [cpu, memory] = fields.as_slice() else {
        log::warn!("Invalid container stats output format: {:?}", output.trim());
        return ContainerSnapshot::UNAVAILABLE;
    };

    ContainerSnapshot::new(parse_percentage(cpu), parse_percentage(memory))
}

fn parse_percentage(value: &str) -> f64 {
    let clean = value.replace('%', "");
    match clean.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            log::warn!("Invalid percentage in container stats: {value:?}");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_stats_line() {
        assert_eq!(
            parse_stats_line("23.5%,61.2%"),
            ContainerSnapshot::new(23.5, 61.2)
        );
        assert_eq!(
            parse_stats_line(" 0.07% , 1.25% \n"),
            ContainerSnapshot::new(0.07, 1.25)
        );
    }

    #[test]
    fn test_should_report_zero_for_malformed_output() {
        assert_eq!(parse_stats_line(""), ContainerSnapshot::UNAVAILABLE);
        assert_eq!(parse_stats_line("23.5%"), ContainerSnapshot::UNAVAILABLE);
        assert_eq!(
            parse_stats_line("1%,2%,3%"),
            ContainerSnapshot::UNAVAILABLE
        );
    }

    #[test]
    fn test_should_default_unparsable_field_to_zero() {
        assert_eq!(
            parse_stats_line("--,61.2%"),
            ContainerSnapshot::new(0.0, 61.2)
        );
    }

    #[test]
    fn test_should_reject_empty_container_id() {
        assert!(matches!(
            ContainerProbe::new(DEFAULT_CONTAINER_RUNTIME, "  "),
            Err(ProbeError::EmptyContainerId)
        ));
    }

    #[test]
    fn test_should_reject_missing_runtime() {
        assert!(matches!(
            ContainerProbe::new("/non/existent/docker", "web"),
            Err(ProbeError::RuntimeUnavailable { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_should_surface_failed_stats_command() {
        // `false` exits non-zero, like the runtime does for an unknown container
        let Ok(probe) = ContainerProbe::new("false", "unknown") else {
            return;
        };
        assert!(matches!(
            probe.sample(),
            Err(ProbeError::CommandFailed { .. })
        ));
    }
}
