use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};
use envbench_summary_model::TickPhase;

/// Change the tick interval once a number of ticks have completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseRule {
    /// Number of ticks after which the rule applies
    pub after_ticks: u64,
    /// The new interval, in milliseconds
    pub interval_ms: u64,
}

impl FromStr for PhaseRule {
    type Err = anyhow::Error;

    /// Parse `after_ticks:interval_ms`, for example `10:250`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (after_ticks, interval_ms) = s
            .split_once(':')
            .context("Expected a phase in the format `after_ticks:interval_ms`")?;

        Ok(Self {
            after_ticks: after_ticks
                .trim()
                .parse()
                .with_context(|| format!("Invalid tick count in phase `{s}`"))?,
            interval_ms: interval_ms
                .trim()
                .parse()
                .with_context(|| format!("Invalid interval in phase `{s}`"))?,
        })
    }
}

/// The interval between ticks, optionally changing after a number of ticks.
///
/// The number of ticks in a run is fixed up front by [TickSchedule::planned_ticks]. Time spent
/// inside a tick is not subtracted from the wait that follows it, so a run drifts by the total
/// processing time of its ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSchedule {
    base_interval_ms: u64,
    /// Sorted by [PhaseRule::after_ticks]
    phases: Vec<PhaseRule>,
}

impl TickSchedule {
    pub fn new(base_interval_ms: u64, mut phases: Vec<PhaseRule>) -> anyhow::Result<Self> {
        if base_interval_ms == 0 {
            bail!("Tick interval must be greater than zero");
        }
        if let Some(rule) = phases.iter().find(|rule| rule.interval_ms == 0) {
            bail!(
                "Phase after {} ticks must have an interval greater than zero",
                rule.after_ticks
            );
        }
        phases.sort_by_key(|rule| rule.after_ticks);

        Ok(Self {
            base_interval_ms,
            phases,
        })
    }

    pub fn fixed(interval_ms: u64) -> anyhow::Result<Self> {
        Self::new(interval_ms, Vec::new())
    }

    pub fn base_interval_ms(&self) -> u64 {
        self.base_interval_ms
    }

    /// The phase rules in the form they are stored with a result.
    pub fn tick_phases(&self) -> Vec<TickPhase> {
        self.phases
            .iter()
            .map(|rule| TickPhase {
                after_ticks: rule.after_ticks,
                interval_ms: rule.interval_ms,
            })
            .collect()
    }

    /// The wait that follows the zero based `tick`.
    pub fn interval_ms_for_tick(&self, tick: u64) -> u64 {
        self.phases
            .iter()
            .take_while(|rule| rule.after_ticks <= tick)
            .last()
            .map(|rule| rule.interval_ms)
            .unwrap_or(self.base_interval_ms)
    }

    pub fn interval_for_tick(&self, tick: u64) -> Duration {
        Duration::from_millis(self.interval_ms_for_tick(tick))
    }

    /// The number of ticks whose scheduled intervals fit into `duration_ms`.
    ///
    /// Without phase rules this is `duration_ms / base_interval_ms`, rounded down.
    pub fn planned_ticks(&self, duration_ms: u64) -> u64 {
        if self.phases.is_empty() {
            return duration_ms / self.base_interval_ms;
        }

        let mut elapsed = 0u64;
        let mut ticks = 0u64;
        loop {
            elapsed = elapsed.saturating_add(self.interval_ms_for_tick(ticks));
            if elapsed > duration_ms {
                return ticks;
            }
            ticks += 1;
        }
    }
}
