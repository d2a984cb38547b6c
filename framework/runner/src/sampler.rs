use std::time::Instant;

use anyhow::{bail, Context};
use envbench_core::prelude::{DelegatedShutdownListener, ShutdownSignalError};
use envbench_probes::{ContainerProbe, ResourceProbe};
use envbench_summary_model::{ContainerSeries, ContainerSnapshot, RunReadings, Sample};

use crate::browser::{retain_plausible_frame_rates, BrowserSession, TickMetrics};
use crate::executor::Executor;
use crate::schedule::TickSchedule;

/// When the host probe is read during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SnapshotCadence {
    /// One host snapshot per tick, averaged into the run level figure
    #[default]
    EveryTick,
    /// A single host snapshot after the last tick
    EndOfRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Running,
    Completed,
}

#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub duration_ms: u64,
    pub schedule: TickSchedule,
    pub cadence: SnapshotCadence,
}

/// What a finished run produced.
#[derive(Debug)]
pub struct SamplerOutput {
    pub readings: RunReadings,
    pub planned_ticks: u64,
    /// The run was stopped before all planned ticks completed
    pub cancelled: bool,
}

/// Drives the tick loop of a single run.
///
/// Ticks run strictly one after another on the calling thread. The number of ticks is fixed when
/// the run starts and the wait after each tick is not shortened by the time the tick took.
pub struct Sampler {
    config: SamplerConfig,
    state: SamplerState,
    host_probe: Box<dyn ResourceProbe>,
    container_probe: Option<ContainerProbe>,
    browser: Option<Box<dyn BrowserSession>>,
}

impl Sampler {
    pub fn new(config: SamplerConfig, host_probe: Box<dyn ResourceProbe>) -> Self {
        Self {
            config,
            state: SamplerState::Idle,
            host_probe,
            container_probe: None,
            browser: None,
        }
    }

    pub fn with_container_probe(mut self, container_probe: ContainerProbe) -> Self {
        self.container_probe = Some(container_probe);
        self
    }

    pub fn with_browser(mut self, browser: Box<dyn BrowserSession>) -> Self {
        self.browser = Some(browser);
        self
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn planned_ticks(&self) -> u64 {
        self.config.schedule.planned_ticks(self.config.duration_ms)
    }

    /// Run every planned tick, or stop early at a tick boundary when shutdown is requested.
    ///
    /// A stopped run still returns the readings of the ticks that completed.
    pub fn run(
        &mut self,
        executor: &Executor,
        mut shutdown_listener: DelegatedShutdownListener,
    ) -> anyhow::Result<SamplerOutput> {
        if self.state != SamplerState::Idle {
            bail!("Sampler has already been run, state is {:?}", self.state);
        }

        let mut container = match &self.container_probe {
            Some(probe) => {
                probe.sample().with_context(|| {
                    format!("Container {} is not measurable", probe.container_id())
                })?;
                Some(ContainerSeries {
                    container_id: probe.container_id().to_string(),
                    snapshots: Vec::new(),
                })
            }
            None => None,
        };

        let planned_ticks = self.planned_ticks();
        log::info!(
            "Sampling {planned_ticks} ticks over {}ms with the {} host probe",
            self.config.duration_ms,
            self.host_probe.name()
        );
        self.state = SamplerState::Running;

        let mut readings = RunReadings::default();
        let start = Instant::now();
        for tick in 0..planned_ticks {
            if shutdown_listener.should_shutdown() {
                log::info!("Stopping after {tick} of {planned_ticks} ticks");
                break;
            }

            let tick_timestamp_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            let metrics = self.browser_tick_metrics();
            readings.samples.push(Sample {
                tick_timestamp_ms,
                script_duration_ms: metrics.script_duration_ms,
                heap_used_bytes: metrics.heap_used_bytes,
            });

            if self.config.cadence == SnapshotCadence::EveryTick {
                readings.resource_snapshots.push(self.host_probe.sample());
            }

            if let (Some(probe), Some(series)) = (&self.container_probe, container.as_mut()) {
                series.snapshots.push(probe.sample().unwrap_or_else(|e| {
                    log::warn!("Error getting container stats: {e}");
                    ContainerSnapshot::UNAVAILABLE
                }));
            }

            log::trace!("Completed tick {tick} at {tick_timestamp_ms}ms");

            // Races the run's own listener so a signal sent during this tick ends the wait
            match executor.sleep(
                self.config.schedule.interval_for_tick(tick),
                &mut shutdown_listener,
            ) {
                Ok(()) => {}
                Err(e) if e.is::<ShutdownSignalError>() => {
                    log::info!("Stopping after {} of {planned_ticks} ticks", tick + 1);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        if self.config.cadence == SnapshotCadence::EndOfRun {
            readings.resource_snapshots.push(self.host_probe.sample());
        }

        if let Some(browser) = self.browser.as_mut() {
            readings.frame_rates = match browser.frame_rates() {
                Ok(values) => retain_plausible_frame_rates(values),
                Err(e) => {
                    log::warn!("Error collecting frame rates: {e:#}");
                    Vec::new()
                }
            };
        }
        readings.container = container;

        let cancelled = (readings.samples.len() as u64) < planned_ticks;
        self.state = SamplerState::Completed;

        Ok(SamplerOutput {
            readings,
            planned_ticks,
            cancelled,
        })
    }

    fn browser_tick_metrics(&mut self) -> TickMetrics {
        let Some(browser) = self.browser.as_mut() else {
            return TickMetrics::default();
        };

        browser.tick_metrics().unwrap_or_else(|e| {
            log::warn!("Error getting browser metrics: {e:#}");
            TickMetrics::default()
        })
    }
}
