/// Frame rate readings at or above this value are sampling artifacts, for example two animation
/// frames delivered in the same millisecond.
pub const MAX_FRAME_RATE: f64 = 120.0;

/// Installs an animation frame callback that accumulates instantaneous frame rates on the page.
pub const FRAME_RATE_ACCUMULATOR_JS: &str = r#"
(() => {
    if (window.__envbenchFrameRates) {
        return;
    }
    window.__envbenchFrameRates = [];
    let last = performance.now();
    const onFrame = (now) => {
        const delta = now - last;
        last = now;
        if (delta > 0) {
            const fps = 1000 / delta;
            if (fps < 120) {
                window.__envbenchFrameRates.push(fps);
            }
        }
        requestAnimationFrame(onFrame);
    };
    requestAnimationFrame(onFrame);
})()
"#;

/// Reads the accumulated frame rates as a JSON array string.
pub const FRAME_RATE_READ_JS: &str = "JSON.stringify(window.__envbenchFrameRates || [])";

/// Browser readings for a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickMetrics {
    pub script_duration_ms: f64,
    pub heap_used_bytes: u64,
}

/// A page under measurement.
///
/// The sampler calls [BrowserSession::tick_metrics] once per tick and [BrowserSession::frame_rates]
/// once after the last tick. Errors are logged by the caller and the readings are reported as
/// zeros, a browser hiccup never ends a run.
pub trait BrowserSession: Send {
    fn tick_metrics(&mut self) -> anyhow::Result<TickMetrics>;

    /// Every frame rate reading accumulated since the page was opened.
    fn frame_rates(&mut self) -> anyhow::Result<Vec<f64>>;
}

/// Drop readings that can't be real frame rates.
///
/// The accumulator script already discards fast frames, this guards against sessions that
/// collect readings some other way.
pub fn retain_plausible_frame_rates(mut values: Vec<f64>) -> Vec<f64> {
    values.retain(|fps| fps.is_finite() && *fps >= 0.0 && *fps < MAX_FRAME_RATE);
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_discard_implausible_frame_rates() {
        assert_eq!(
            retain_plausible_frame_rates(vec![59.9, 120.0, 60.1, 240.0, f64::NAN, -1.0, 119.99]),
            vec![59.9, 60.1, 119.99]
        );
    }

    #[test]
    fn test_should_keep_empty_series_empty() {
        assert!(retain_plausible_frame_rates(Vec::new()).is_empty());
    }

    #[test]
    fn test_accumulator_discards_fast_frames() {
        assert!(FRAME_RATE_ACCUMULATOR_JS.contains("fps < 120"));
        assert!(FRAME_RATE_READ_JS.contains("__envbenchFrameRates"));
    }
}
