//! The measurement side of envbench.
//!
//! [measure](prelude::measure) samples one environment on a fixed tick schedule and writes a
//! single result file. The parts are public so they can be driven without the CLI.

mod browser;
#[cfg(feature = "chrome")]
mod chrome;
mod cli;
mod config;
mod executor;
mod monitor;
mod progress;
mod run;
mod sampler;
mod schedule;
mod shutdown;

pub mod prelude {
    pub use crate::browser::{
        retain_plausible_frame_rates, BrowserSession, TickMetrics, FRAME_RATE_ACCUMULATOR_JS,
        FRAME_RATE_READ_JS, MAX_FRAME_RATE,
    };
    #[cfg(feature = "chrome")]
    pub use crate::chrome::ChromeSession;
    pub use crate::cli::{Environment, MeasureArgs};
    pub use crate::config::{MeasureConfig, Target};
    pub use crate::executor::Executor;
    pub use crate::run::measure;
    pub use crate::sampler::{
        Sampler, SamplerConfig, SamplerOutput, SamplerState, SnapshotCadence,
    };
    pub use crate::schedule::{PhaseRule, TickSchedule};
}
