use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::model::ComparisonReport;

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Environment")]
    environment: String,
    #[tabled(rename = "Runs")]
    runs: usize,
    #[tabled(rename = "FPS", display = "float2")]
    fps: f64,
    #[tabled(rename = "CPU %", display = "float2")]
    cpu: f64,
    #[tabled(rename = "Memory %", display = "float2")]
    memory: f64,
}

fn float2(n: &f64) -> String {
    format!("{:.2}", n)
}

/// Render the report as a fixed width table followed by the diffs.
pub fn format_report(report: &ComparisonReport) -> String {
    let rows = [&report.environment_a, &report.environment_b]
        .into_iter()
        .map(|summary| SummaryRow {
            environment: summary.label.clone(),
            runs: summary.run_count,
            fps: summary.average_fps,
            cpu: summary.average_cpu,
            memory: summary.average_memory,
        })
        .collect::<Vec<_>>();

    let mut table = Table::new(rows);
    table.with(Style::modern());

    let versus = format!(
        "{} vs {}",
        report.environment_a.label, report.environment_b.label
    );
    format!(
        "{table}\nFPS difference ({versus}): {:.2}%\nCPU difference ({versus}): {:.2}%\nMemory difference ({versus}): {:.2}%\n",
        report.fps_diff_percent, report.cpu_diff_percent, report.memory_diff_percent,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EnvironmentSummary;

    #[test]
    fn test_should_format_report() {
        let report = ComparisonReport::new(
            EnvironmentSummary {
                label: "docker".to_string(),
                run_count: 3,
                average_fps: 58.123,
                average_cpu: 12.5,
                average_memory: 40.0,
            },
            EnvironmentSummary {
                label: "vm".to_string(),
                run_count: 2,
                average_fps: 60.0,
                average_cpu: 10.0,
                average_memory: 50.0,
            },
        );

        let output = format_report(&report);

        assert!(output.contains("Environment"));
        assert!(output.contains("Memory %"));
        assert!(output.contains("58.12"));
        assert!(output.contains("│ docker"));
        assert!(output.contains("CPU difference (docker vs vm): 25.00%"));
        assert!(output.contains("Memory difference (docker vs vm): -20.00%"));
        assert!(output.contains("FPS difference (docker vs vm): -3.13%"));
    }
}
