mod linux;
mod windows;

use envbench_summary_model::ResourceSnapshot;

pub use linux::{
    cpu_usage_between, parse_free_output, parse_meminfo, parse_proc_stat, CpuCounters, LinuxProbe,
};
pub use windows::{parse_wmic_output, WindowsProbe};

/// A source of host CPU and memory readings.
///
/// Implementations never fail outwards. Anything that goes wrong is logged and reported as
/// [ResourceSnapshot::UNAVAILABLE] or as a zero field. A call may block the calling thread for
/// the probe's measurement window.
pub trait ResourceProbe: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn sample(&self) -> ResourceSnapshot;
}

/// Host operating system family, detected once at start up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
    Unsupported,
}

impl Platform {
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" | "android" => Platform::Linux,
            "windows" => Platform::Windows,
            _ => Platform::Unsupported,
        }
    }
}

/// Pick the host probe for the platform this process runs on.
pub fn detect_host_probe() -> Box<dyn ResourceProbe> {
    host_probe_for(Platform::detect())
}

pub fn host_probe_for(platform: Platform) -> Box<dyn ResourceProbe> {
    let probe: Box<dyn ResourceProbe> = match platform {
        Platform::Linux => Box::new(LinuxProbe::default()),
        Platform::Windows => Box::new(WindowsProbe::default()),
        Platform::Unsupported => Box::new(UnsupportedProbe),
    };
    log::debug!("Using {} host probe", probe.name());
    probe
}

/// Probe for platforms without a known data source. Always reports zeros.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedProbe;

impl ResourceProbe for UnsupportedProbe {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn sample(&self) -> ResourceSnapshot {
        log::warn!(
            "Host resource probing is not supported on {}",
            std::env::consts::OS
        );
        ResourceSnapshot::UNAVAILABLE
    }
}

/// Percentages are stored with two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
