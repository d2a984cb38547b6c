use std::process::Command;
use std::time::Duration;

use anyhow::{bail, Context};
use envbench_summary_model::ResourceSnapshot;
use sysinfo::System;

use super::{round2, ResourceProbe};

/// Time between the two CPU refreshes used to compute CPU usage.
pub const DEFAULT_CPU_WINDOW: Duration = Duration::from_millis(1000);

/// Memory usage from `wmic OS get FreePhysicalMemory,TotalVisibleMemorySize /Value`.
///
/// The output is a set of `Key=Value` lines in kilobytes. Returns `None` if either value is
/// missing or the total is zero.
pub fn parse_wmic_output(output: &str) -> Option<f64> {
    let mut free = None;
    let mut total = None;

    for line in output.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let Ok(value) = value.trim().parse::<u64>() else {
            continue;
        };

        match key.trim() {
            "FreePhysicalMemory" => free = Some(value),
            "TotalVisibleMemorySize" => total = Some(value),
            _ => {}
        }
    }

    let (free, total) = (free?, total.filter(|total| *total > 0)?);
    Some(round2(100.0 * (1.0 - free as f64 / total as f64)))
}

/// Host probe for Windows.
///
/// CPU usage comes from the native system information API. Memory usage comes from `wmic` and
/// falls back to the native API when the utility is unavailable, which it is on recent Windows
/// releases.
#[derive(Debug, Clone)]
pub struct WindowsProbe {
    wmic_command: String,
    cpu_window: Duration,
}

impl Default for WindowsProbe {
    fn default() -> Self {
        Self {
            wmic_command: "wmic".to_string(),
            cpu_window: DEFAULT_CPU_WINDOW,
        }
    }
}

impl WindowsProbe {
    pub fn with_wmic_command(mut self, wmic_command: &str) -> Self {
        self.wmic_command = wmic_command.to_string();
        self
    }

    pub fn with_cpu_window(mut self, cpu_window: Duration) -> Self {
        self.cpu_window = cpu_window;
        self
    }

    fn cpu_usage(&self) -> f64 {
        let mut sys = System::new();

        sys.refresh_cpu_usage();
        std::thread::sleep(self.cpu_window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        sys.refresh_cpu_usage();

        if sys.cpus().is_empty() {
            log::warn!("No CPUs reported by the system information API");
            return 0.0;
        }

        round2(f64::from(sys.global_cpu_usage()).clamp(0.0, 100.0))
    }

    fn memory_from_wmic(&self) -> anyhow::Result<f64> {
        let output = Command::new(&self.wmic_command)
            .args(["OS", "get", "FreePhysicalMemory,TotalVisibleMemorySize", "/Value"])
            .output()
            .with_context(|| format!("Failed to run '{}'", self.wmic_command))?;
        if !output.status.success() {
            bail!(
                "'{}' failed with status: {}",
                self.wmic_command,
                output.status
            );
        }

        parse_wmic_output(&String::from_utf8_lossy(&output.stdout))
            .context("Unexpected wmic output")
    }

    fn memory_usage(&self) -> f64 {
        match self.memory_from_wmic() {
            Ok(usage) => usage,
            Err(e) => {
                log::debug!("Falling back to native memory status: {e:#}");
                native_memory_usage()
            }
        }
    }
}

fn native_memory_usage() -> f64 {
    let mut sys = System::new();
    sys.refresh_memory();

    let total = sys.total_memory();
    if total == 0 {
        log::warn!("Error getting memory info: total memory reported as zero");
        return 0.0;
    }

    round2(100.0 * sys.used_memory() as f64 / total as f64)
}

impl ResourceProbe for WindowsProbe {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn sample(&self) -> ResourceSnapshot {
        ResourceSnapshot::new(self.cpu_usage(), self.memory_usage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_wmic_output() {
        let output = "\r\n\r\nFreePhysicalMemory=4194304\r\nTotalVisibleMemorySize=16777216\r\n\r\n";
        assert_eq!(parse_wmic_output(output), Some(75.0));
    }

    #[test]
    fn test_should_reject_incomplete_wmic_output() {
        assert_eq!(parse_wmic_output("FreePhysicalMemory=100\r\n"), None);
        assert_eq!(
            parse_wmic_output("FreePhysicalMemory=0\r\nTotalVisibleMemorySize=0\r\n"),
            None
        );
        assert_eq!(parse_wmic_output(""), None);
    }

    #[test]
    fn test_should_fall_back_to_native_memory() {
        let probe = WindowsProbe::default().with_wmic_command("/non/existent/wmic");
        let usage = probe.memory_usage();
        assert!((0.0..=100.0).contains(&usage));
    }
}
