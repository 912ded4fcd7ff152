// In-memory doubles for the application ports
use crate::application::clock::Clock;
use crate::application::sensor_api::{ApiError, SensorApi, SensorPlacement};
use crate::application::theme_store::ThemeStore;
use crate::domain::sensor::SensorType;
use crate::domain::telemetry::{DailyAggregate, TimeSeriesPoint};
use crate::domain::theme::Theme;
use crate::domain::view::TimeWindow;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Scriptable stand-in for the remote data API
#[derive(Default)]
pub struct FakeApi {
    pub placements: Vec<SensorPlacement>,
    pub rooms: Vec<String>,
    pub fail_init: bool,
    pub history: Mutex<HashMap<String, Vec<TimeSeriesPoint>>>,
    pub latest: Mutex<HashMap<String, TimeSeriesPoint>>,
    pub aggregates: Mutex<HashMap<String, DailyAggregate>>,
    pub failing: Mutex<HashSet<String>>,
    pub history_windows: Mutex<Vec<(String, TimeWindow)>>,
    pub aggregate_windows: Mutex<Vec<(String, TimeWindow)>>,
    pub latest_calls: AtomicUsize,
    /// When set, the next history call waits for this before answering
    pub history_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeApi {
    /// Room 1: temperature(1), humidity(2), light(3). Room 2: temperature(4). Room 3: empty.
    pub fn with_rooms() -> Self {
        let placement = |sensor_id: &str, room_id: &str, sensor_type| SensorPlacement {
            sensor_id: sensor_id.to_string(),
            room_id: room_id.to_string(),
            sensor_type,
        };
        Self {
            placements: vec![
                placement("1", "1", SensorType::Temperature),
                placement("2", "1", SensorType::Humidity),
                placement("3", "1", SensorType::Light),
                placement("4", "2", SensorType::Temperature),
            ],
            rooms: vec!["1".to_string(), "2".to_string(), "3".to_string()],
            ..Self::default()
        }
    }

    pub fn set_history(&self, sensor_id: &str, points: Vec<TimeSeriesPoint>) {
        self.history.lock().unwrap().insert(sensor_id.to_string(), points);
    }

    pub fn set_latest(&self, sensor_id: &str, point: TimeSeriesPoint) {
        self.latest.lock().unwrap().insert(sensor_id.to_string(), point);
    }

    pub fn set_aggregate(&self, sensor_id: &str, aggregate: DailyAggregate) {
        self.aggregates
            .lock()
            .unwrap()
            .insert(sensor_id.to_string(), aggregate);
    }

    pub fn fail(&self, sensor_id: &str) {
        self.failing.lock().unwrap().insert(sensor_id.to_string());
    }

    pub fn history_calls(&self) -> usize {
        self.history_windows.lock().unwrap().len()
    }

    pub fn latest_calls(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }

    fn check(&self, sensor_id: &str) -> Result<(), ApiError> {
        if self.failing.lock().unwrap().contains(sensor_id) {
            return Err(ApiError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SensorApi for FakeApi {
    async fn room_sensor_map(&self) -> Result<Vec<SensorPlacement>, ApiError> {
        if self.fail_init {
            return Err(ApiError::Transport("connection refused".to_string()));
        }
        Ok(self.placements.clone())
    }

    async fn list_rooms(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.rooms.clone())
    }

    async fn history(
        &self,
        sensor_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<TimeSeriesPoint>, ApiError> {
        self.history_windows
            .lock()
            .unwrap()
            .push((sensor_id.to_string(), window));
        let gate = self.history_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check(sensor_id)?;
        Ok(self
            .history
            .lock()
            .unwrap()
            .get(sensor_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn latest(&self, sensor_id: &str) -> Result<Option<TimeSeriesPoint>, ApiError> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        self.check(sensor_id)?;
        Ok(self.latest.lock().unwrap().get(sensor_id).copied())
    }

    async fn daily_aggregate(
        &self,
        sensor_id: &str,
        window: TimeWindow,
    ) -> Result<DailyAggregate, ApiError> {
        self.aggregate_windows
            .lock()
            .unwrap()
            .push((sensor_id.to_string(), window));
        self.check(sensor_id)?;
        Ok(self
            .aggregates
            .lock()
            .unwrap()
            .get(sensor_id)
            .cloned()
            .unwrap_or(DailyAggregate {
                labels: Vec::new(),
                min_values: Vec::new(),
                max_values: Vec::new(),
            }))
    }
}

pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    /// 2024-03-15 12:00:00 UTC
    pub fn new() -> Self {
        Self(Mutex::new(
            Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
        ))
    }

    pub fn now_ms(&self) -> i64 {
        self.0.lock().unwrap().timestamp_millis()
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[derive(Default)]
pub struct MemoryThemes {
    pub saved: Mutex<Vec<Theme>>,
}

impl ThemeStore for MemoryThemes {
    fn load(&self) -> Theme {
        self.saved.lock().unwrap().last().copied().unwrap_or_default()
    }

    fn save(&self, theme: Theme) -> anyhow::Result<()> {
        self.saved.lock().unwrap().push(theme);
        Ok(())
    }
}
