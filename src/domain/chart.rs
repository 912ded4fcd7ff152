// Chart description handed to the charting library
use super::sensor::SensorType;
use super::telemetry::{DailyAggregate, TimeSeriesPoint};
use super::theme::Theme;
use super::view::TimeWindow;
use serde::Serialize;

const MIN_BAR_COLOR: &str = "rgba(54, 162, 235, 0.7)";
const MAX_BAR_COLOR: &str = "rgba(255, 99, 132, 0.7)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Minute,
    Hour,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum XAxis {
    Time {
        min_ms: i64,
        max_ms: i64,
        unit: TimeUnit,
        title: Option<String>,
    },
    Category {
        title: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DatasetData {
    Points(Vec<TimeSeriesPoint>),
    Values(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub color: String,
    pub fill: bool,
    pub data: DatasetData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub x_axis: XAxis,
    pub y_title: Option<String>,
    pub show_legend: bool,
    pub grid_color: String,
    pub text_color: String,
}

impl ChartSpec {
    /// Sliding one-hour line chart used by the realtime view
    pub fn realtime(
        sensor_type: SensorType,
        points: &[TimeSeriesPoint],
        window: TimeWindow,
        theme: Theme,
    ) -> Self {
        Self {
            kind: ChartKind::Line,
            labels: Vec::new(),
            datasets: vec![Dataset {
                label: sensor_type.as_str().to_string(),
                color: sensor_type.color().to_string(),
                fill: true,
                data: DatasetData::Points(points.to_vec()),
            }],
            x_axis: XAxis::Time {
                min_ms: window.from_ms,
                max_ms: window.to_ms,
                unit: TimeUnit::Minute,
                title: None,
            },
            y_title: None,
            show_legend: false,
            grid_color: theme.grid_color().to_string(),
            text_color: theme.text_color().to_string(),
        }
    }

    /// Line chart clamped to one calendar day
    pub fn daily(
        sensor_type: SensorType,
        points: &[TimeSeriesPoint],
        day: TimeWindow,
        theme: Theme,
    ) -> Self {
        Self {
            kind: ChartKind::Line,
            labels: Vec::new(),
            datasets: vec![Dataset {
                label: format!("{} ({})", sensor_type, sensor_type.unit()),
                color: sensor_type.color().to_string(),
                fill: true,
                data: DatasetData::Points(points.to_vec()),
            }],
            x_axis: XAxis::Time {
                min_ms: day.from_ms,
                max_ms: day.to_ms,
                unit: TimeUnit::Hour,
                title: Some("Time of Day".to_string()),
            },
            y_title: Some(format!("Value ({})", sensor_type.unit())),
            show_legend: false,
            grid_color: theme.grid_color().to_string(),
            text_color: theme.text_color().to_string(),
        }
    }

    /// Min/max bar chart labelled by day of month
    pub fn monthly(sensor_type: SensorType, aggregate: &DailyAggregate, theme: Theme) -> Self {
        Self {
            kind: ChartKind::Bar,
            labels: aggregate.day_labels(),
            datasets: vec![
                Dataset {
                    label: "Min".to_string(),
                    color: MIN_BAR_COLOR.to_string(),
                    fill: false,
                    data: DatasetData::Values(aggregate.min_values.clone()),
                },
                Dataset {
                    label: "Max".to_string(),
                    color: MAX_BAR_COLOR.to_string(),
                    fill: false,
                    data: DatasetData::Values(aggregate.max_values.clone()),
                },
            ],
            x_axis: XAxis::Category {
                title: "Day of Month".to_string(),
            },
            y_title: Some(format!("Value ({})", sensor_type.unit())),
            show_legend: true,
            grid_color: theme.grid_color().to_string(),
            text_color: theme.text_color().to_string(),
        }
    }

    /// Replace the first dataset's points and slide the time axis
    pub fn slide(&mut self, points: &[TimeSeriesPoint], window: TimeWindow) {
        if let Some(dataset) = self.datasets.first_mut() {
            dataset.data = DatasetData::Points(points.to_vec());
        }
        if let XAxis::Time { min_ms, max_ms, .. } = &mut self.x_axis {
            *min_ms = window.from_ms;
            *max_ms = window.to_ms;
        }
    }

    pub fn time_bounds(&self) -> Option<TimeWindow> {
        match self.x_axis {
            XAxis::Time { min_ms, max_ms, .. } => Some(TimeWindow::new(min_ms, max_ms)),
            XAxis::Category { .. } => None,
        }
    }
}
