use chrono::{DateTime, Utc};

use crate::model::{
    BrowserResult, ContainerResult, ContainerSnapshot, ContainerStats, FrameRateStats,
    HostResult, ResourceSnapshot, RunRecord, RunResult, Sample, TickPhase,
};

/// Descriptive fields for a run that are known before sampling produces any data.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetadata {
    pub run_id: String,
    pub environment_label: String,
    pub created_at: DateTime<Utc>,
    /// Empty for runs that did not target a web page
    pub target_url: String,
    pub test_duration_ms: u64,
    pub tick_interval_ms: u64,
    pub tick_phases: Vec<TickPhase>,
    pub planned_ticks: u64,
    pub cancelled: bool,
}

/// Readings taken from a single container over the run.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSeries {
    pub container_id: String,
    pub snapshots: Vec<ContainerSnapshot>,
}

/// Everything the sampler collected for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReadings {
    pub samples: Vec<Sample>,
    pub frame_rates: Vec<f64>,
    /// One snapshot per tick, or a single run level snapshot
    pub resource_snapshots: Vec<ResourceSnapshot>,
    pub container: Option<ContainerSeries>,
}

/// Reduce the readings of a run into its immutable [RunResult].
///
/// The kind of result follows from the inputs: a container series makes a
/// [RunResult::Container], otherwise a non-empty target URL makes a [RunResult::Browser] and
/// anything else is a [RunResult::Host].
pub fn build_result(metadata: RunMetadata, readings: RunReadings) -> RunResult {
    let RunReadings {
        samples,
        frame_rates,
        resource_snapshots,
        container,
    } = readings;

    let run = RunRecord {
        run_id: metadata.run_id,
        environment_label: metadata.environment_label,
        created_at: metadata.created_at,
        test_duration_ms: metadata.test_duration_ms,
        tick_interval_ms: metadata.tick_interval_ms,
        tick_phases: metadata.tick_phases,
        planned_ticks: Some(metadata.planned_ticks),
        cancelled: metadata.cancelled,
        samples,
        frame_rate_stats: FrameRateStats::from_values(frame_rates),
        resource_stats: ResourceSnapshot::average(&resource_snapshots),
    };

    match container {
        Some(series) => RunResult::Container(ContainerResult {
            run,
            container_stats: ContainerStats::from_snapshots(series.container_id, &series.snapshots),
        }),
        None if !metadata.target_url.is_empty() => RunResult::Browser(BrowserResult {
            run,
            target_url: metadata.target_url,
        }),
        None => RunResult::Host(HostResult { run }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(target_url: &str) -> RunMetadata {
        RunMetadata {
            run_id: "test-run".to_string(),
            environment_label: "docker".to_string(),
            created_at: DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
            target_url: target_url.to_string(),
            test_duration_ms: 3000,
            tick_interval_ms: 1000,
            tick_phases: Vec::new(),
            planned_ticks: 3,
            cancelled: false,
        }
    }

    fn samples(n: u64) -> Vec<Sample> {
        (0..n)
            .map(|i| Sample {
                tick_timestamp_ms: i * 1000,
                script_duration_ms: 1.5,
                heap_used_bytes: 1024,
            })
            .collect()
    }

    #[test]
    fn test_should_build_host_result_without_url() {
        let result = build_result(
            metadata(""),
            RunReadings {
                samples: samples(3),
                resource_snapshots: vec![
                    ResourceSnapshot::new(10.0, 40.0),
                    ResourceSnapshot::new(20.0, 50.0),
                    ResourceSnapshot::new(30.0, 60.0),
                ],
                ..Default::default()
            },
        );

        let RunResult::Host(host) = &result else {
            panic!("Expected a host result, got {}", result.kind());
        };
        assert_eq!(host.run.samples.len(), 3);
        assert_eq!(host.run.resource_stats, ResourceSnapshot::new(20.0, 50.0));
        assert_eq!(host.run.frame_rate_stats, FrameRateStats::default());
        assert_eq!(result.target_url(), "");
    }

    #[test]
    fn test_should_build_browser_result_with_frame_rates() {
        let result = build_result(
            metadata("http://localhost:3000"),
            RunReadings {
                samples: samples(3),
                frame_rates: vec![58.0, 60.0, 62.0],
                resource_snapshots: vec![ResourceSnapshot::new(35.5, 70.25)],
                container: None,
            },
        );

        let RunResult::Browser(browser) = &result else {
            panic!("Expected a browser result, got {}", result.kind());
        };
        assert_eq!(browser.target_url, "http://localhost:3000");
        assert_eq!(browser.run.frame_rate_stats.average, 60.0);
        assert_eq!(browser.run.frame_rate_stats.min, 58.0);
        assert_eq!(browser.run.frame_rate_stats.max, 62.0);
        // A single run level snapshot is used as is
        assert_eq!(browser.run.resource_stats, ResourceSnapshot::new(35.5, 70.25));
    }

    #[test]
    fn test_should_build_container_result_even_with_url() {
        let result = build_result(
            metadata("http://localhost:3000"),
            RunReadings {
                samples: samples(2),
                container: Some(ContainerSeries {
                    container_id: "web".to_string(),
                    snapshots: vec![
                        ResourceSnapshot::new(23.5, 61.2),
                        ResourceSnapshot::new(0.0, 0.0),
                    ],
                }),
                ..Default::default()
            },
        );

        let stats = result.container_stats().expect("Expected container stats");
        assert_eq!(stats.container_id, "web");
        assert_eq!(stats.cpu.max, 23.5);
        assert_eq!(stats.cpu.min, 0.0);
        assert_eq!(stats.memory.average, 30.6);
        assert_eq!(result.target_url(), "");
    }

    #[test]
    fn test_should_build_zeroed_result_from_empty_readings() {
        let result = build_result(metadata(""), RunReadings::default());

        let record = result.record();
        assert!(record.samples.is_empty());
        assert_eq!(record.frame_rate_stats.average, 0.0);
        assert_eq!(record.resource_stats, ResourceSnapshot::UNAVAILABLE);
    }

    #[test]
    fn test_should_record_phases_and_planned_ticks() {
        // 2 ticks at 1000ms then 250ms ticks for the remaining 1000ms
        let result = build_result(
            RunMetadata {
                tick_phases: vec![TickPhase {
                    after_ticks: 2,
                    interval_ms: 250,
                }],
                planned_ticks: 6,
                ..metadata("")
            },
            RunReadings {
                samples: samples(6),
                ..Default::default()
            },
        );

        let record = result.record();
        assert_eq!(record.samples.len() as u64, record.planned_ticks());
        assert_eq!(record.planned_ticks, Some(6));
        assert_eq!(
            record.tick_phases,
            vec![TickPhase {
                after_ticks: 2,
                interval_ms: 250,
            }]
        );
    }
}
