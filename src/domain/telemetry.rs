// Telemetry data domain models
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub time_ms: i64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }
}

/// Timestamp-ordered buffer backing a drawn chart.
///
/// Points are kept ascending by `time_ms` with no duplicate timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesBuffer {
    points: Vec<TimeSeriesPoint>,
}

impl SeriesBuffer {
    pub fn from_points(mut points: Vec<TimeSeriesPoint>) -> Self {
        points.sort_by_key(|p| p.time_ms);
        points.dedup_by_key(|p| p.time_ms);
        Self { points }
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&TimeSeriesPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append `point` only when it is strictly newer than the last buffered point
    pub fn append_if_newer(&mut self, point: TimeSeriesPoint) -> bool {
        match self.points.last() {
            Some(last) if point.time_ms <= last.time_ms => false,
            _ => {
                self.points.push(point);
                true
            }
        }
    }

    /// Drop points older than `cutoff_ms` from the head. Returns how many were evicted.
    pub fn evict_before(&mut self, cutoff_ms: i64) -> usize {
        let keep_from = self.points.partition_point(|p| p.time_ms < cutoff_ms);
        self.points.drain(..keep_from);
        keep_from
    }
}

/// Daily min/max series as returned by the aggregation endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub labels: Vec<String>,
    pub min_values: Vec<f64>,
    pub max_values: Vec<f64>,
}

impl DailyAggregate {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Bar labels: the day-of-month part of each `YYYY-MM-DD` label
    pub fn day_labels(&self) -> Vec<String> {
        self.labels
            .iter()
            .map(|label| match label.split('-').nth(2) {
                Some(day) => day.to_string(),
                None => label.clone(),
            })
            .collect()
    }
}
