// Room domain model
use super::sensor::{SensorDescriptor, SensorType};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    pub id: String,
    pub name: String,
}

impl Room {
    pub fn new(id: String) -> Self {
        let name = format!("Room {}", id);
        Self { id, name }
    }
}

/// Numeric ids sort by value, ahead of any non-numeric ones
fn id_order(id: &str) -> (bool, Option<u64>, &str) {
    let numeric = id.parse::<u64>().ok();
    (numeric.is_none(), numeric, id)
}

/// Rooms keyed by id, each holding its sensors in sensor-id order.
///
/// Built once from the flat sensor map and only ever replaced wholesale.
#[derive(Debug, Clone, Default)]
pub struct RoomIndex {
    rooms: BTreeMap<String, Vec<SensorDescriptor>>,
}

impl RoomIndex {
    pub fn build<I>(mapping: I) -> Self
    where
        I: IntoIterator<Item = (String, String, SensorType)>,
    {
        let mut rooms: BTreeMap<String, Vec<SensorDescriptor>> = BTreeMap::new();
        for (sensor_id, room_id, sensor_type) in mapping {
            rooms
                .entry(room_id.clone())
                .or_default()
                .push(SensorDescriptor::new(sensor_id, room_id, sensor_type));
        }
        for sensors in rooms.values_mut() {
            sensors.sort_by(|a, b| id_order(&a.sensor_id).cmp(&id_order(&b.sensor_id)));
        }
        Self { rooms }
    }

    /// Sensors of a room; unknown rooms have none
    pub fn sensors(&self, room_id: &str) -> &[SensorDescriptor] {
        self.rooms.get(room_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn sensor_count(&self) -> usize {
        self.rooms.values().map(Vec::len).sum()
    }
}
