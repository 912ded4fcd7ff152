// Remote data API client
use crate::application::sensor_api::{ApiError, SensorApi, SensorPlacement};
use crate::domain::telemetry::{DailyAggregate, TimeSeriesPoint};
use crate::domain::view::TimeWindow;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpSensorApi {
    client: reqwest::Client,
    base_url: String,
}

/// Room and sensor ids arrive as either JSON strings or integers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Identifier {
    Text(String),
    Number(i64),
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        match id {
            Identifier::Text(text) => text,
            Identifier::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPlacement {
    room_id: Identifier,
    #[serde(rename = "type")]
    sensor_type: String,
}

#[derive(Debug, Deserialize)]
struct RawReading {
    timestamp: f64,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct RawLatest {
    #[serde(default)]
    timestamp: Option<f64>,
    #[serde(default)]
    sensor_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawAggregate {
    labels: Vec<String>,
    min_values: Vec<f64>,
    max_values: Vec<f64>,
}

impl HttpSensorApi {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn sensor_url(&self, sensor_id: &str, endpoint: &str) -> String {
        format!(
            "{}/sensor/{}/{}",
            self.base_url,
            urlencoding::encode(sensor_id),
            endpoint
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ApiError::Malformed(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl SensorApi for HttpSensorApi {
    async fn room_sensor_map(&self) -> Result<Vec<SensorPlacement>, ApiError> {
        let raw: BTreeMap<String, RawPlacement> =
            self.get_json(&format!("{}/room-sensors-map", self.base_url)).await?;
        parse_placements(raw)
    }

    async fn list_rooms(&self) -> Result<Vec<String>, ApiError> {
        let raw: Vec<Identifier> = self.get_json(&format!("{}/rooms", self.base_url)).await?;
        Ok(raw.into_iter().map(String::from).collect())
    }

    async fn history(
        &self,
        sensor_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<TimeSeriesPoint>, ApiError> {
        let url = format!(
            "{}?from={}&to={}",
            self.sensor_url(sensor_id, "history"),
            window.from_secs(),
            window.to_secs()
        );
        let raw: Vec<RawReading> = self.get_json(&url).await?;
        parse_readings(raw)
    }

    async fn latest(&self, sensor_id: &str) -> Result<Option<TimeSeriesPoint>, ApiError> {
        let raw: RawLatest = self.get_json(&self.sensor_url(sensor_id, "latest")).await?;
        parse_latest(raw)
    }

    async fn daily_aggregate(
        &self,
        sensor_id: &str,
        window: TimeWindow,
    ) -> Result<DailyAggregate, ApiError> {
        let url = format!(
            "{}?period=daily&from={}&to={}",
            self.sensor_url(sensor_id, "aggregated"),
            window.from_secs(),
            window.to_secs()
        );
        let raw: RawAggregate = self.get_json(&url).await?;
        parse_aggregate(raw)
    }
}

fn parse_placements(
    raw: BTreeMap<String, RawPlacement>,
) -> Result<Vec<SensorPlacement>, ApiError> {
    raw.into_iter()
        .map(|(sensor_id, placement)| {
            let sensor_type = placement
                .sensor_type
                .parse()
                .map_err(|e| ApiError::Malformed(format!("sensor {}: {}", sensor_id, e)))?;
            Ok(SensorPlacement {
                sensor_id,
                room_id: placement.room_id.into(),
                sensor_type,
            })
        })
        .collect()
}

fn to_point(timestamp_secs: f64, value: f64) -> Result<TimeSeriesPoint, ApiError> {
    if !timestamp_secs.is_finite() || !value.is_finite() {
        return Err(ApiError::Malformed(format!(
            "non-finite reading ({}, {})",
            timestamp_secs, value
        )));
    }
    Ok(TimeSeriesPoint::new(
        (timestamp_secs * 1000.0).round() as i64,
        value,
    ))
}

fn parse_readings(raw: Vec<RawReading>) -> Result<Vec<TimeSeriesPoint>, ApiError> {
    raw.into_iter()
        .map(|reading| to_point(reading.timestamp, reading.value))
        .collect()
}

/// `{}` means the sensor never reported; half a reading is malformed
fn parse_latest(raw: RawLatest) -> Result<Option<TimeSeriesPoint>, ApiError> {
    match (raw.timestamp, raw.sensor_value) {
        (Some(timestamp), Some(value)) => to_point(timestamp, value).map(Some),
        (None, None) => Ok(None),
        _ => Err(ApiError::Malformed(
            "latest reading is missing timestamp or sensor_value".to_string(),
        )),
    }
}

fn parse_aggregate(raw: RawAggregate) -> Result<DailyAggregate, ApiError> {
    if raw.min_values.len() != raw.labels.len() || raw.max_values.len() != raw.labels.len() {
        return Err(ApiError::Malformed(format!(
            "aggregate has {} labels but {} min and {} max values",
            raw.labels.len(),
            raw.min_values.len(),
            raw.max_values.len()
        )));
    }
    Ok(DailyAggregate {
        labels: raw.labels,
        min_values: raw.min_values,
        max_values: raw.max_values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sensor::SensorType;

    #[test]
    fn test_parse_placements_accepts_numeric_room_ids() {
        let raw: BTreeMap<String, RawPlacement> = serde_json::from_str(
            r#"{"1": {"room_id": 1, "type": "temperature"}, "2": {"room_id": "B", "type": "light"}}"#,
        )
        .unwrap();
        let placements = parse_placements(raw).unwrap();
        assert_eq!(
            placements,
            vec![
                SensorPlacement {
                    sensor_id: "1".to_string(),
                    room_id: "1".to_string(),
                    sensor_type: SensorType::Temperature,
                },
                SensorPlacement {
                    sensor_id: "2".to_string(),
                    room_id: "B".to_string(),
                    sensor_type: SensorType::Light,
                },
            ]
        );
    }

    #[test]
    fn test_unknown_sensor_type_is_malformed() {
        let raw: BTreeMap<String, RawPlacement> =
            serde_json::from_str(r#"{"9": {"room_id": 1, "type": "co2"}}"#).unwrap();
        assert!(matches!(parse_placements(raw), Err(ApiError::Malformed(_))));
    }

    #[test]
    fn test_readings_convert_to_millis() {
        let raw: Vec<RawReading> =
            serde_json::from_str(r#"[{"timestamp": 1700000000, "value": 21.5}]"#).unwrap();
        let points = parse_readings(raw).unwrap();
        assert_eq!(points, vec![TimeSeriesPoint::new(1_700_000_000_000, 21.5)]);
    }

    #[test]
    fn test_latest_shapes() {
        let empty: RawLatest = serde_json::from_str("{}").unwrap();
        assert_eq!(parse_latest(empty).unwrap(), None);

        let full: RawLatest =
            serde_json::from_str(r#"{"timestamp": 10, "sensor_value": 3.5}"#).unwrap();
        assert_eq!(parse_latest(full).unwrap(), Some(TimeSeriesPoint::new(10_000, 3.5)));

        let half: RawLatest = serde_json::from_str(r#"{"timestamp": 10}"#).unwrap();
        assert!(matches!(parse_latest(half), Err(ApiError::Malformed(_))));
    }

    #[test]
    fn test_aggregate_length_mismatch_is_malformed() {
        let raw = RawAggregate {
            labels: vec!["2024-02-01".to_string(), "2024-02-02".to_string()],
            min_values: vec![1.0],
            max_values: vec![2.0, 3.0],
        };
        assert!(matches!(parse_aggregate(raw), Err(ApiError::Malformed(_))));
    }

    #[test]
    fn test_sensor_url_encodes_id() {
        let api = HttpSensorApi::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            api.sensor_url("a b", "latest"),
            "http://localhost:5000/sensor/a%20b/latest"
        );
    }
}
