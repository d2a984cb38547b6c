//! Run results for envbench.
//!
//! A [RunResult] is built once at the end of a measurement run with [build_result] and written
//! once by a [ResultStore]. Nothing in this crate mutates a stored result afterwards.

mod builder;
mod model;
mod store;

pub use builder::{build_result, ContainerSeries, RunMetadata, RunReadings};
pub use model::{
    BrowserResult, ContainerResult, ContainerSnapshot, ContainerStats, FrameRateStats,
    HostResult, RangeStats, ResourceSnapshot, RunRecord, RunResult, Sample, TickPhase,
    DEFAULT_TICK_INTERVAL_MS,
};
pub use store::{is_placeholder, PlaceholderRecord, ResultStore, StoreError, PLACEHOLDER_MARKER};
