use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::model::RunResult;

/// JSON field that marks a placeholder record.
pub const PLACEHOLDER_MARKER: &str = "isInitialFile";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Result directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("No valid results found in {}", .0.display())]
    NoData(PathBuf),
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Written into an otherwise empty environment directory so that it is never empty.
///
/// Placeholders are recognised by the [PLACEHOLDER_MARKER] field, never by their file name, and
/// are skipped by [ResultStore::load_all].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderRecord {
    pub environment_label: String,
    pub created_at: DateTime<Utc>,
    pub is_initial_file: bool,
    pub note: String,
}

impl PlaceholderRecord {
    pub fn new(environment_label: &str) -> Self {
        Self {
            environment_label: environment_label.to_string(),
            created_at: Utc::now(),
            is_initial_file: true,
            note: "Placeholder so the directory is not empty, ignored by analysis".to_string(),
        }
    }
}

/// Result files for one environment, kept in a single directory.
///
/// Files are write-once. The file name is `<environmentLabel>-<epochMillis>.json`, so two runs of
/// the same environment created in the same millisecond collide and the second save fails rather
/// than overwriting the first.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new<P>(dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file name a result is stored under.
    pub fn file_name(environment_label: &str, created_at: DateTime<Utc>) -> String {
        format!("{}-{}.json", environment_label, created_at.timestamp_millis())
    }

    /// Create the directory if needed and write a placeholder into it when it holds no files.
    ///
    /// Returns the path of the placeholder if one was written.
    pub fn ensure_environment_dir(
        &self,
        environment_label: &str,
    ) -> Result<Option<PathBuf>, StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let has_files = std::fs::read_dir(&self.dir)
            .map_err(|source| StoreError::Write {
                path: self.dir.clone(),
                source,
            })?
            .filter_map(Result::ok)
            .any(|entry| entry.path().is_file());
        if has_files {
            return Ok(None);
        }

        let path = self.dir.join(format!("{environment_label}-initial.json"));
        log::debug!("Writing placeholder record to {}", path.display());
        self.write_new(&path, &PlaceholderRecord::new(environment_label))?;

        Ok(Some(path))
    }

    /// Persist a result and return the path it was written to.
    pub fn save(&self, result: &RunResult) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(Self::file_name(
            result.environment_label(),
            result.created_at(),
        ));
        self.write_new(&path, result)?;

        log::info!("Saved {} result to {}", result.kind(), path.display());

        Ok(path)
    }

    /// Load every valid result in the directory.
    ///
    /// Placeholder records are skipped. Files that can't be read or parsed are logged and skipped.
    /// If nothing valid is left then [StoreError::NoData] is returned instead of an empty list.
    pub fn load_all(&self) -> Result<Vec<RunResult>, StoreError> {
        if !self.dir.is_dir() {
            return Err(StoreError::MissingDirectory(self.dir.clone()));
        }

        let mut results = Vec::new();
        let entries = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable entry in {}: {e}", self.dir.display());
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
            .sorted_by(|a, b| a.file_name().cmp(b.file_name()));

        for entry in entries {
            match load_result_file(entry.path()) {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {
                    log::debug!("Skipping placeholder {}", entry.path().display());
                }
                Err(e) => {
                    log::warn!("Error loading file {}: {e:#}", entry.path().display());
                }
            }
        }

        if results.is_empty() {
            return Err(StoreError::NoData(self.dir.clone()));
        }

        log::debug!("Loaded {} results from {}", results.len(), self.dir.display());

        Ok(results)
    }

    fn write_new<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let to_store_error = |source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create_new(path).map_err(to_store_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush().map_err(to_store_error)?;

        Ok(())
    }
}

/// Check whether a parsed JSON document is a placeholder record.
pub fn is_placeholder(value: &serde_json::Value) -> bool {
    value
        .get(PLACEHOLDER_MARKER)
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

/// Load one result file, returning `None` for a placeholder.
fn load_result_file(path: &Path) -> anyhow::Result<Option<RunResult>> {
    let reader = BufReader::new(File::open(path)?);
    let value: serde_json::Value = serde_json::from_reader(reader).context("Invalid JSON")?;
    if is_placeholder(&value) {
        return Ok(None);
    }

    let result = serde_json::from_value(value).context("Not a run result")?;
    Ok(Some(result))
}
