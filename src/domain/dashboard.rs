// Dashboard view snapshot
use super::room::Room;
use super::sensor::SensorType;
use super::theme::Theme;
use super::view::{MonthSelection, ViewMode};
use chrono::NaiveDate;
use serde::Serialize;

pub const INIT_ERROR_TITLE: &str = "Error: Could not connect to API.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewStatus {
    #[default]
    Uninitialized,
    Ready,
    /// Initial load failed; the view stays unusable until reload
    Failed,
    Disposed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Loading,
    Ready,
    NoData,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartCard {
    pub sensor_id: String,
    pub sensor_type: SensorType,
    pub title: String,
    pub target: String,
    pub status: CardStatus,
}

impl ChartCard {
    pub fn new(sensor_id: String, sensor_type: SensorType, title: String) -> Self {
        let target = draw_target(&sensor_id);
        Self {
            sensor_id,
            sensor_type,
            title,
            target,
            status: CardStatus::Loading,
        }
    }

    pub fn mark_ready(&mut self) {
        self.status = CardStatus::Ready;
    }

    pub fn mark_error(&mut self) {
        self.status = CardStatus::Error;
        self.title.push_str(" - Error loading data");
    }

    pub fn mark_no_data(&mut self, annotation: &str) {
        self.status = CardStatus::NoData;
        self.title.push_str(annotation);
    }
}

/// Draw target identifier for a sensor's chart surface
pub fn draw_target(sensor_id: &str) -> String {
    format!("chart-{}", sensor_id)
}

/// Latest value per sensor type, independent of the charts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiReadouts {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub light: Option<f64>,
}

impl KpiReadouts {
    pub fn set(&mut self, sensor_type: SensorType, value: f64) {
        match sensor_type {
            SensorType::Temperature => self.temperature = Some(value),
            SensorType::Humidity => self.humidity = Some(value),
            SensorType::Light => self.light = Some(value),
        }
    }

    pub fn get(&self, sensor_type: SensorType) -> Option<f64> {
        match sensor_type {
            SensorType::Temperature => self.temperature,
            SensorType::Humidity => self.humidity,
            SensorType::Light => self.light,
        }
    }

    /// "21.50 C", or "-- C" when no reading is known
    pub fn display(&self, sensor_type: SensorType) -> String {
        match self.get(sensor_type) {
            Some(value) => format!("{:.2} {}", value, sensor_type.kpi_unit()),
            None => format!("-- {}", sensor_type.kpi_unit()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshSettings {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl RefreshSettings {
    pub const DEFAULT_INTERVAL_SECS: u64 = 5;

    /// A zero or missing interval falls back to the default
    pub fn new(enabled: bool, interval_secs: Option<u64>) -> Self {
        let interval_secs = interval_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(Self::DEFAULT_INTERVAL_SECS);
        Self {
            enabled,
            interval_secs,
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self::new(true, None)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KpiDisplay {
    pub temperature: String,
    pub humidity: String,
    pub light: String,
}

impl From<&KpiReadouts> for KpiDisplay {
    fn from(kpis: &KpiReadouts) -> Self {
        Self {
            temperature: kpis.display(SensorType::Temperature),
            humidity: kpis.display(SensorType::Humidity),
            light: kpis.display(SensorType::Light),
        }
    }
}

/// Everything a renderer needs to paint the dashboard at one instant
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub status: ViewStatus,
    pub title: String,
    pub rooms: Vec<Room>,
    pub active_room: Option<String>,
    pub mode: ViewMode,
    pub day: Option<NaiveDate>,
    pub month: Option<MonthSelection>,
    pub cards: Vec<ChartCard>,
    pub kpis: KpiDisplay,
    pub theme: Theme,
    pub refresh: RefreshSettings,
    pub generation: u64,
}
