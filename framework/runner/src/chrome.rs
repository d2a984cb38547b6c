use std::ffi::OsStr;
use std::sync::Arc;

use anyhow::Context;
use headless_chrome::protocol::cdp::Performance;
use headless_chrome::{Browser, LaunchOptions, Tab};
use url::Url;

use crate::browser::{BrowserSession, TickMetrics, FRAME_RATE_ACCUMULATOR_JS, FRAME_RATE_READ_JS};

/// A page opened in headless Chromium.
pub struct ChromeSession {
    // Closing the browser closes the tab, so it is kept alive for the session
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeSession {
    /// Launch Chromium, open `url` and start accumulating frame rates.
    pub fn open(url: &Url) -> anyhow::Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .args(vec![OsStr::new("--disable-gpu")])
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid browser launch options: {e}"))?;

        let browser = Browser::new(options).context("Failed to launch browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;

        log::info!("Opening {url}");
        tab.navigate_to(url.as_str())
            .and_then(|tab| tab.wait_until_navigated())
            .with_context(|| format!("Failed to load {url}"))?;

        tab.call_method(Performance::Enable { time_domain: None })
            .context("Failed to enable performance metrics")?;
        tab.evaluate(FRAME_RATE_ACCUMULATOR_JS, false)
            .context("Failed to install frame rate accumulator")?;

        Ok(Self {
            _browser: browser,
            tab,
        })
    }
}

impl BrowserSession for ChromeSession {
    fn tick_metrics(&mut self) -> anyhow::Result<TickMetrics> {
        let metrics = self
            .tab
            .call_method(Performance::GetMetrics(None))
            .context("Failed to read performance metrics")?
            .metrics;

        let mut tick = TickMetrics::default();
        for metric in metrics {
            match metric.name.as_str() {
                // Reported in seconds
                "ScriptDuration" => tick.script_duration_ms = metric.value * 1000.0,
                "JSHeapUsedSize" => tick.heap_used_bytes = metric.value.max(0.0) as u64,
                _ => {}
            }
        }

        Ok(tick)
    }

    fn frame_rates(&mut self) -> anyhow::Result<Vec<f64>> {
        let value = self
            .tab
            .evaluate(FRAME_RATE_READ_JS, false)
            .context("Failed to read frame rates")?
            .value
            .context("Frame rate script returned nothing")?;

        let json = value
            .as_str()
            .context("Frame rate script did not return a string")?;
        serde_json::from_str(json).context("Frame rates are not a JSON array of numbers")
    }
}
