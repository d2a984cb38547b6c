//! Resource probes for envbench.
//!
//! A host probe is picked once per process with [detect_host_probe] and then sampled every tick.
//! A [ContainerProbe] is created per container id.

mod container;
mod error;
mod host;

pub use container::{parse_stats_line, ContainerProbe, DEFAULT_CONTAINER_RUNTIME};
pub use error::ProbeError;
pub use host::{
    cpu_usage_between, detect_host_probe, host_probe_for, parse_free_output, parse_meminfo,
    parse_proc_stat, parse_wmic_output, CpuCounters, LinuxProbe, Platform, ResourceProbe,
    UnsupportedProbe, WindowsProbe,
};
