// Remote data API port
use crate::domain::sensor::SensorType;
use crate::domain::telemetry::{DailyAggregate, TimeSeriesPoint};
use crate::domain::view::TimeWindow;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, reset)
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// A response arrived but does not match the expected schema
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// One entry of the sensor-to-room mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorPlacement {
    pub sensor_id: String,
    pub room_id: String,
    pub sensor_type: SensorType,
}

#[async_trait]
pub trait SensorApi: Send + Sync {
    /// Flat mapping of every sensor to its room and type
    async fn room_sensor_map(&self) -> Result<Vec<SensorPlacement>, ApiError>;

    /// List all room identifiers
    async fn list_rooms(&self) -> Result<Vec<String>, ApiError>;

    /// Readings of a sensor inside `window`, ascending by time
    async fn history(
        &self,
        sensor_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<TimeSeriesPoint>, ApiError>;

    /// Most recent reading of a sensor, if it ever reported
    async fn latest(&self, sensor_id: &str) -> Result<Option<TimeSeriesPoint>, ApiError>;

    /// Per-day min/max of a sensor inside `window`
    async fn daily_aggregate(
        &self,
        sensor_id: &str,
        window: TimeWindow,
    ) -> Result<DailyAggregate, ApiError>;
}
