/// Errors from invoking a probe that make the run unusable.
///
/// Parse problems are not errors, they are reported as zero readings.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("A container id is required")]
    EmptyContainerId,
    #[error("Container runtime '{runtime}' not found: {source}")]
    RuntimeUnavailable {
        runtime: String,
        #[source]
        source: which::Error,
    },
    #[error("Failed to run container runtime '{runtime}': {source}")]
    Spawn {
        runtime: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Stats for container '{container_id}' failed with status {status}: {stderr}")]
    CommandFailed {
        container_id: String,
        status: String,
        stderr: String,
    },
}
