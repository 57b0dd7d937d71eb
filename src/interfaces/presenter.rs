use crate::domain::ml::presentation::{ComparisonChart, Presentation};
use crate::domain::ports::ResultPresenter;
use anyhow::{Context, Result};
use std::fmt::Write;

/// Prints the presentation as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPresenter {
    pub pretty: bool,
}

impl ResultPresenter for JsonPresenter {
    fn render(&self, presentation: &Presentation) -> Result<String> {
        let json = match presentation {
            Presentation::Report(report) if self.pretty => serde_json::to_string_pretty(report),
            Presentation::Report(report) => serde_json::to_string(report),
            Presentation::Chart(chart) if self.pretty => serde_json::to_string_pretty(chart),
            Presentation::Chart(chart) => serde_json::to_string(chart),
        };
        json.context("Failed to serialize forecast")
    }
}

/// Horizontal bar chart for a terminal.
///
/// Forecasts of one instrument sit close together, so bars are scaled over
/// the observed range rather than from zero.
#[derive(Debug, Clone, Copy)]
pub struct TextChartPresenter {
    pub width: usize,
}

impl Default for TextChartPresenter {
    fn default() -> Self {
        Self { width: 40 }
    }
}

impl TextChartPresenter {
    fn chart(&self, chart: &ComparisonChart) -> Result<String> {
        let (min, max) = chart
            .bars
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), bar| {
                (lo.min(bar.value), hi.max(bar.value))
            });
        let span = max - min;
        // Shortest bar keeps a quarter of the width
        let floor = min - span / 3.0;
        let label_width = chart.bars.iter().map(|b| b.label.len()).max().unwrap_or(0);

        let mut out = String::new();
        writeln!(out, "{}", chart.title)?;
        writeln!(out, "({})", chart.y_label)?;
        for bar in &chart.bars {
            let fraction = if span > 0.0 {
                (bar.value - floor) / (max - floor)
            } else {
                1.0
            };
            let len = ((fraction * self.width as f64).round() as usize).clamp(1, self.width);
            writeln!(
                out,
                "{:<label_width$} | {:<width$} {:.5}",
                bar.label,
                "█".repeat(len),
                bar.value,
                label_width = label_width,
                width = self.width
            )?;
        }
        Ok(out)
    }
}

impl ResultPresenter for TextChartPresenter {
    fn render(&self, presentation: &Presentation) -> Result<String> {
        match presentation {
            Presentation::Chart(chart) => self.chart(chart),
            Presentation::Report(report) => {
                let mut out = String::new();
                writeln!(out, "gbt:    {:.5}", report.gbt)?;
                writeln!(out, "stat:   {:.5}", report.stat)?;
                writeln!(out, "decomp: {:.5}", report.decomp)?;
                writeln!(out, "final:  {:.5}", report.final_prediction)?;
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::presentation::ForecastReport;

    fn report() -> ForecastReport {
        ForecastReport {
            gbt: 1.0850,
            stat: 1.0850,
            decomp: 1.0900,
            final_prediction: 1.0867,
        }
    }

    #[test]
    fn test_json_report_keys() {
        let out = JsonPresenter::default()
            .render(&Presentation::Report(report()))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["gbt"], 1.085);
        assert_eq!(value["decomp"], 1.09);
        assert_eq!(value["final"], 1.0867);
    }

    #[test]
    fn test_text_chart_has_four_labeled_bars() {
        let chart = ComparisonChart::from(&report());
        let out = TextChartPresenter::default()
            .render(&Presentation::Chart(chart))
            .unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Forecasted Price by Model");
        assert_eq!(lines[1], "(Predicted Value)");
        assert_eq!(lines.len(), 6);
        assert!(lines[2].starts_with("Gradient Boosted Trees"));
        assert!(lines[5].starts_with("Meta Model"));
    }

    #[test]
    fn test_largest_value_gets_full_width() {
        let chart = ComparisonChart::from(&report());
        let presenter = TextChartPresenter { width: 20 };
        let out = presenter.render(&Presentation::Chart(chart)).unwrap();

        let decomp_line = out.lines().find(|l| l.starts_with("Decomposition")).unwrap();
        assert_eq!(decomp_line.matches('█').count(), 20);
    }

    #[test]
    fn test_equal_values_do_not_divide_by_zero() {
        let flat = ForecastReport {
            gbt: 2.0,
            stat: 2.0,
            decomp: 2.0,
            final_prediction: 2.0,
        };
        let out = TextChartPresenter::default()
            .render(&Presentation::Chart(ComparisonChart::from(&flat)))
            .unwrap();
        assert!(out.contains("2.00000"));
    }
}
