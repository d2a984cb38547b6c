use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{bail, Context};
use envbench_summary_model::ResourceSnapshot;

use super::{round2, ResourceProbe};

/// Time between the two `/proc/stat` reads used to compute CPU usage.
pub const DEFAULT_CPU_WINDOW: Duration = Duration::from_millis(500);

/// Cumulative CPU time counters from the aggregate `cpu` line of `/proc/stat`.
///
/// The counters grow from boot, so usage can only be computed from the difference between two
/// reads with [cpu_usage_between].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuCounters {
    pub idle: u64,
    pub total: u64,
}

/// Parse the aggregate CPU line of `/proc/stat`.
///
/// Format: `cpu user nice system idle iowait irq softirq steal guest guest_nice`. Idle is the
/// fourth value and the total is the sum of every value on the line.
pub fn parse_proc_stat(content: &str) -> anyhow::Result<CpuCounters> {
    let line = content
        .lines()
        .find(|line| line.starts_with("cpu "))
        .context("No aggregate cpu line found in /proc/stat")?;

    let values = line
        .split_whitespace()
        .skip(1)
        .map(|field| {
            field
                .parse::<u64>()
                .with_context(|| format!("Invalid cpu time value: {field}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if values.len() < 4 {
        bail!(
            "cpu line too short: expected at least 4 values, got {}",
            values.len()
        );
    }

    Ok(CpuCounters {
        idle: values[3],
        total: values.iter().sum(),
    })
}

/// CPU usage between two counter reads as `100 * (1 - Δidle / Δtotal)`.
///
/// Returns `0` when no time has passed between the reads.
pub fn cpu_usage_between(prev: CpuCounters, curr: CpuCounters) -> f64 {
    let total_delta = curr.total.saturating_sub(prev.total);
    if total_delta == 0 {
        return 0.0;
    }
    let idle_delta = curr.idle.saturating_sub(prev.idle);

    round2((100.0 * (1.0 - idle_delta as f64 / total_delta as f64)).clamp(0.0, 100.0))
}

/// Memory usage from the output of `free -m`.
///
/// Uses the `total` and `used` columns of the `Mem:` row. Returns `None` if the output isn't in
/// the expected format.
pub fn parse_free_output(output: &str) -> Option<f64> {
    let columns = output
        .lines()
        .find(|line| line.trim_start().starts_with("Mem:"))?
        .split_whitespace()
        .collect::<Vec<_>>();

    let total = columns.get(1)?.parse::<u64>().ok()?;
    let used = columns.get(2)?.parse::<u64>().ok()?;
    if total == 0 {
        return None;
    }

    Some(round2(100.0 * used as f64 / total as f64))
}

/// Memory usage from `/proc/meminfo`, counting buffers and page cache as free.
pub fn parse_meminfo(content: &str) -> Option<f64> {
    let mut total = None;
    let mut free = 0u64;
    let mut buffers = 0u64;
    let mut cached = 0u64;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Ok(value) = value.parse::<u64>() else {
            continue;
        };

        match key {
            "MemTotal:" => total = Some(value),
            "MemFree:" => free = value,
            "Buffers:" => buffers = value,
            "Cached:" => cached = value,
            _ => {}
        }
    }

    let total = total.filter(|total| *total > 0)?;
    let used = total
        .saturating_sub(free)
        .saturating_sub(buffers)
        .saturating_sub(cached);

    Some(round2(100.0 * used as f64 / total as f64))
}

/// Host probe for Linux and other systems exposing a `/proc` file system.
///
/// CPU usage comes from two reads of `/proc/stat`. Memory usage comes from `free -m` and falls
/// back to `/proc/meminfo` when the command is missing or prints something unexpected.
#[derive(Debug, Clone)]
pub struct LinuxProbe {
    proc_root: PathBuf,
    free_command: String,
    cpu_window: Duration,
}

impl Default for LinuxProbe {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            free_command: "free".to_string(),
            cpu_window: DEFAULT_CPU_WINDOW,
        }
    }
}

impl LinuxProbe {
    /// Read `stat` and `meminfo` from another directory instead of `/proc`.
    pub fn with_proc_root<P: Into<PathBuf>>(mut self, proc_root: P) -> Self {
        self.proc_root = proc_root.into();
        self
    }

    /// Use a different command in place of `free`.
    pub fn with_free_command(mut self, free_command: &str) -> Self {
        self.free_command = free_command.to_string();
        self
    }

    pub fn with_cpu_window(mut self, cpu_window: Duration) -> Self {
        self.cpu_window = cpu_window;
        self
    }

    fn read_cpu_counters(&self) -> anyhow::Result<CpuCounters> {
        let path = self.proc_root.join("stat");
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        parse_proc_stat(&content)
    }

    fn cpu_usage(&self) -> anyhow::Result<f64> {
        let first = self.read_cpu_counters()?;
        std::thread::sleep(self.cpu_window);
        let second = self.read_cpu_counters()?;

        Ok(cpu_usage_between(first, second))
    }

    fn memory_from_free(&self) -> anyhow::Result<Option<f64>> {
        let output = Command::new(&self.free_command)
            .arg("-m")
            .output()
            .with_context(|| format!("Failed to run '{} -m'", self.free_command))?;
        if !output.status.success() {
            bail!(
                "'{} -m' failed with status: {}",
                self.free_command,
                output.status
            );
        }

        Ok(parse_free_output(&String::from_utf8_lossy(&output.stdout)))
    }

    fn memory_from_meminfo(&self) -> f64 {
        let path = self.proc_root.join("meminfo");
        match std::fs::read_to_string(&path) {
            Ok(content) => parse_meminfo(&content).unwrap_or_else(|| {
                log::warn!("No usable memory totals in {}", path.display());
                0.0
            }),
            Err(e) => {
                log::warn!("Error reading {}: {e}", path.display());
                0.0
            }
        }
    }

    fn memory_usage(&self) -> f64 {
        match self.memory_from_free() {
            Ok(Some(usage)) => usage,
            Ok(None) => {
                log::debug!(
                    "Unexpected '{}' output, falling back to meminfo",
                    self.free_command
                );
                self.memory_from_meminfo()
            }
            Err(e) => {
                log::warn!("Error getting memory usage: {e:#}");
                self.memory_from_meminfo()
            }
        }
    }
}

impl ResourceProbe for LinuxProbe {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn sample(&self) -> ResourceSnapshot {
        let cpu = match self.cpu_usage() {
            Ok(cpu) => cpu,
            Err(e) => {
                log::warn!("Error getting host CPU usage: {e:#}");
                return ResourceSnapshot::UNAVAILABLE;
            }
        };

        ResourceSnapshot::new(cpu, self.memory_usage())
    }
}
