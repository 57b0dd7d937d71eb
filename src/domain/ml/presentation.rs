use super::types::{BasePredictions, FinalPrediction, ModelKind};
use serde::{Deserialize, Serialize};

pub const CHART_TITLE: &str = "Forecasted Price by Model";
pub const CHART_Y_LABEL: &str = "Predicted Value";
pub const META_MODEL_LABEL: &str = "Meta Model";

/// Structured result record handed to a presenter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub gbt: f64,
    pub stat: f64,
    pub decomp: f64,
    #[serde(rename = "final")]
    pub final_prediction: f64,
}

impl ForecastReport {
    pub fn new(predictions: &BasePredictions, final_prediction: FinalPrediction) -> Self {
        Self {
            gbt: predictions.gbt.value(),
            stat: predictions.stat.value(),
            decomp: predictions.decomp.value(),
            final_prediction: final_prediction.value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBar {
    pub label: String,
    pub value: f64,
}

/// Request to render a labeled bar comparison of the four values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonChart {
    pub title: String,
    pub y_label: String,
    pub bars: Vec<ChartBar>,
}

impl From<&ForecastReport> for ComparisonChart {
    fn from(report: &ForecastReport) -> Self {
        let bars = [
            (ModelKind::GradientBoosted.display_label(), report.gbt),
            (ModelKind::Statistical.display_label(), report.stat),
            (ModelKind::Decomposition.display_label(), report.decomp),
            (META_MODEL_LABEL, report.final_prediction),
        ]
        .into_iter()
        .map(|(label, value)| ChartBar {
            label: label.to_string(),
            value,
        })
        .collect();

        Self {
            title: CHART_TITLE.to_string(),
            y_label: CHART_Y_LABEL.to_string(),
            bars,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Presentation {
    Report(ForecastReport),
    Chart(ComparisonChart),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_final_key() {
        let report = ForecastReport {
            gbt: 1.0,
            stat: 2.0,
            decomp: 3.0,
            final_prediction: 2.0,
        };
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["final"], 2.0);
        assert_eq!(json["gbt"], 1.0);
    }

    #[test]
    fn test_chart_bars_in_fixed_order() {
        let report = ForecastReport {
            gbt: 1.0,
            stat: 2.0,
            decomp: 3.0,
            final_prediction: 4.0,
        };
        let chart = ComparisonChart::from(&report);
        let labels: Vec<&str> = chart.bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Gradient Boosted Trees", "Statistical", "Decomposition", "Meta Model"]
        );
        assert_eq!(chart.bars[3].value, 4.0);
    }
}
