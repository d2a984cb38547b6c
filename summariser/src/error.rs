use std::path::PathBuf;

use envbench_summary_model::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The directory of an environment is missing or has no valid results.
    #[error("Insufficient data for environment '{label}' in {}", dir.display())]
    InsufficientData {
        label: String,
        dir: PathBuf,
        #[source]
        source: StoreError,
    },
    #[error("Failed to write report to {}", path.display())]
    WriteReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize report")]
    Serialize(#[from] serde_json::Error),
}
