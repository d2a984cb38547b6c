use chrono::{DateTime, Utc};
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};

/// Default tick interval of the sampling loop, in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// A point-in-time CPU and memory reading.
///
/// A value of `0` means the reading was unavailable. Probes never leave a field missing, they
/// normalise failures to zero instead.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    /// CPU utilisation in the range `[0, 100]`
    pub cpu_usage_percent: f64,
    /// Memory utilisation in the range `[0, 100]`
    pub memory_usage_percent: f64,
}

/// A container reading has the same shape as a host reading.
pub type ContainerSnapshot = ResourceSnapshot;

impl ResourceSnapshot {
    /// The snapshot reported when a probe could not read anything.
    pub const UNAVAILABLE: ResourceSnapshot = ResourceSnapshot {
        cpu_usage_percent: 0.0,
        memory_usage_percent: 0.0,
    };

    pub fn new(cpu_usage_percent: f64, memory_usage_percent: f64) -> Self {
        Self {
            cpu_usage_percent,
            memory_usage_percent,
        }
    }

    /// Average a set of snapshots field by field.
    ///
    /// An empty set averages to [ResourceSnapshot::UNAVAILABLE].
    pub fn average(snapshots: &[ResourceSnapshot]) -> ResourceSnapshot {
        if snapshots.is_empty() {
            return ResourceSnapshot::UNAVAILABLE;
        }

        let count = snapshots.len() as f64;
        ResourceSnapshot {
            cpu_usage_percent: snapshots.iter().map(|s| s.cpu_usage_percent).sum::<f64>() / count,
            memory_usage_percent: snapshots
                .iter()
                .map(|s| s.memory_usage_percent)
                .sum::<f64>()
                / count,
        }
    }
}

/// One tick of the sampling loop.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Milliseconds since the run started
    pub tick_timestamp_ms: u64,
    /// Script execution time reported by the browser, `0` if unavailable
    #[serde(default)]
    pub script_duration_ms: f64,
    /// Used JS heap reported by the browser, `0` if unavailable
    #[serde(default)]
    pub heap_used_bytes: u64,
}

/// Average, minimum and maximum of a series.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RangeStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl RangeStats {
    /// Compute the stats for a series. All three values are zero for an empty series.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let average = values.iter().sum::<f64>() / values.len() as f64;
        let (min, max) = match values.iter().copied().minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => (0.0, 0.0),
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::MinMax(min, max) => (min, max),
        };

        Self { average, min, max }
    }
}

/// Frame rate readings collected by the browser over the whole run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FrameRateStats {
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default)]
    pub average: f64,
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: f64,
}

impl FrameRateStats {
    pub fn from_values(values: Vec<f64>) -> Self {
        let RangeStats { average, min, max } = RangeStats::from_values(&values);
        Self {
            values,
            average,
            min,
            max,
        }
    }

    /// The average to use for analysis.
    ///
    /// Recomputed from [FrameRateStats::values] when there are any, otherwise the stored average.
    pub fn effective_average(&self) -> f64 {
        if self.values.is_empty() {
            self.average
        } else {
            self.values.iter().sum::<f64>() / self.values.len() as f64
        }
    }
}

/// Container resource usage over a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStats {
    pub container_id: String,
    pub cpu: RangeStats,
    pub memory: RangeStats,
}

impl ContainerStats {
    pub fn from_snapshots(container_id: String, snapshots: &[ContainerSnapshot]) -> Self {
        let cpu = snapshots
            .iter()
            .map(|s| s.cpu_usage_percent)
            .collect::<Vec<_>>();
        let memory = snapshots
            .iter()
            .map(|s| s.memory_usage_percent)
            .collect::<Vec<_>>();

        Self {
            container_id,
            cpu: RangeStats::from_values(&cpu),
            memory: RangeStats::from_values(&memory),
        }
    }
}

/// Fields shared by every kind of run result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    /// The unique run id
    ///
    /// Chosen by the runner. Unique for each run.
    pub run_id: String,
    /// The environment that was measured, e.g. `docker` or `vm`
    pub environment_label: String,
    /// The time the run finished and the result was built
    pub created_at: DateTime<Utc>,
    /// The duration that the run was configured with, in milliseconds
    pub test_duration_ms: u64,
    /// The base tick interval of the sampling loop, in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Changes to the tick interval after a number of ticks, empty for a fixed interval
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tick_phases: Vec<TickPhase>,
    /// The number of ticks the schedule fitted into the test duration
    ///
    /// Missing from records written before phases existed, see [RunRecord::planned_ticks].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_ticks: Option<u64>,
    /// Set when the run was stopped before all planned ticks completed
    ///
    /// In that case [RunRecord::samples] only holds the ticks that did complete.
    #[serde(default)]
    pub cancelled: bool,
    pub samples: Vec<Sample>,
    pub frame_rate_stats: FrameRateStats,
    /// Run level average of the host resource snapshots
    pub resource_stats: ResourceSnapshot,
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

impl RunRecord {
    /// The number of samples a completed run holds.
    ///
    /// Records without a stored count used a fixed interval, so the count is
    /// `test_duration_ms / tick_interval_ms` rounded down.
    pub fn planned_ticks(&self) -> u64 {
        self.planned_ticks.unwrap_or_else(|| {
            self.test_duration_ms
                .checked_div(self.tick_interval_ms)
                .unwrap_or(0)
        })
    }
}

/// The tick interval in use from `after_ticks` completed ticks onwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TickPhase {
    pub after_ticks: u64,
    pub interval_ms: u64,
}

/// A run that only sampled the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostResult {
    #[serde(flatten)]
    pub run: RunRecord,
}

/// A run that drove a web page through the browser collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrowserResult {
    #[serde(flatten)]
    pub run: RunRecord,
    pub target_url: String,
}

/// A run that sampled a container through the container runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerResult {
    #[serde(flatten)]
    pub run: RunRecord,
    pub container_stats: ContainerStats,
}

/// The persisted unit, one per measurement run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RunResult {
    Host(HostResult),
    Browser(BrowserResult),
    Container(ContainerResult),
}

impl RunResult {
    pub fn record(&self) -> &RunRecord {
        match self {
            RunResult::Host(r) => &r.run,
            RunResult::Browser(r) => &r.run,
            RunResult::Container(r) => &r.run,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RunResult::Host(_) => "host",
            RunResult::Browser(_) => "browser",
            RunResult::Container(_) => "container",
        }
    }

    /// The page that was measured, empty for runs that did not use the browser.
    pub fn target_url(&self) -> &str {
        match self {
            RunResult::Browser(r) => &r.target_url,
            _ => "",
        }
    }

    pub fn container_stats(&self) -> Option<&ContainerStats> {
        match self {
            RunResult::Container(r) => Some(&r.container_stats),
            _ => None,
        }
    }

    pub fn environment_label(&self) -> &str {
        &self.record().environment_label
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.record().created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_report_zero_stats_for_empty_frame_rates() {
        let stats = FrameRateStats::from_values(vec![]);
        assert_eq!(stats.average, 0.0);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 0.0);
        assert_eq!(stats.effective_average(), 0.0);
    }

    #[test]
    fn test_should_compute_frame_rate_stats() {
        let stats = FrameRateStats::from_values(vec![60.0, 30.0, 45.0]);
        assert_eq!(stats.average, 45.0);
        assert_eq!(stats.min, 30.0);
        assert_eq!(stats.max, 60.0);
    }

    #[test]
    fn test_should_prefer_values_over_stored_average() {
        let stats = FrameRateStats {
            values: vec![50.0, 70.0],
            average: 1.0,
            min: 50.0,
            max: 70.0,
        };
        assert_eq!(stats.effective_average(), 60.0);

        let stats = FrameRateStats {
            values: vec![],
            average: 42.0,
            min: 0.0,
            max: 0.0,
        };
        assert_eq!(stats.effective_average(), 42.0);
    }

    #[test]
    fn test_should_average_resource_snapshots() {
        let avg = ResourceSnapshot::average(&[
            ResourceSnapshot::new(40.0, 20.0),
            ResourceSnapshot::new(60.0, 30.0),
        ]);
        assert_eq!(avg, ResourceSnapshot::new(50.0, 25.0));
        assert_eq!(
            ResourceSnapshot::average(&[]),
            ResourceSnapshot::UNAVAILABLE
        );
    }

    #[test]
    fn test_should_compute_container_ranges() {
        let stats = ContainerStats::from_snapshots(
            "abc".to_string(),
            &[
                ResourceSnapshot::new(10.0, 50.0),
                ResourceSnapshot::new(30.0, 70.0),
            ],
        );
        assert_eq!(stats.container_id, "abc");
        assert_eq!(stats.cpu.average, 20.0);
        assert_eq!(stats.cpu.min, 10.0);
        assert_eq!(stats.cpu.max, 30.0);
        assert_eq!(stats.memory.average, 60.0);
    }

    #[test]
    fn test_should_tag_result_kind_in_json() {
        let result = RunResult::Host(HostResult {
            run: RunRecord {
                run_id: "run".to_string(),
                environment_label: "vm".to_string(),
                created_at: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
                test_duration_ms: 2000,
                tick_interval_ms: 1000,
                tick_phases: Vec::new(),
                planned_ticks: None,
                cancelled: false,
                samples: vec![],
                frame_rate_stats: FrameRateStats::default(),
                resource_stats: ResourceSnapshot::UNAVAILABLE,
            },
        });

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["kind"], "host");
        assert_eq!(value["environmentLabel"], "vm");
        assert_eq!(value["resourceStats"]["cpuUsagePercent"], 0.0);
        // Fixed interval records without a stored count keep the old shape
        assert!(value.get("tickPhases").is_none());
        assert!(value.get("plannedTicks").is_none());
        assert_eq!(result.record().planned_ticks(), 2);
    }
}
