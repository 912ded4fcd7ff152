// Sensor domain model
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
    Temperature,
    Humidity,
    Light,
}

impl SensorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Temperature => "temperature",
            SensorType::Humidity => "humidity",
            SensorType::Light => "light",
        }
    }

    /// Capitalised name used in card titles ("Temperature", ...)
    pub fn title(&self) -> &'static str {
        match self {
            SensorType::Temperature => "Temperature",
            SensorType::Humidity => "Humidity",
            SensorType::Light => "Light",
        }
    }

    /// Unit shown on chart axes
    pub fn unit(&self) -> &'static str {
        match self {
            SensorType::Temperature => "°C",
            SensorType::Humidity => "%",
            SensorType::Light => "lux",
        }
    }

    /// Unit shown next to the KPI readout
    pub fn kpi_unit(&self) -> &'static str {
        match self {
            SensorType::Temperature => "C",
            SensorType::Humidity => "%",
            SensorType::Light => "lux",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            SensorType::Temperature => "#ff6384",
            SensorType::Humidity => "#36a2eb",
            SensorType::Light => "#ffce56",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sensor type: {0}")]
pub struct UnknownSensorType(pub String);

impl FromStr for SensorType {
    type Err = UnknownSensorType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperature" => Ok(SensorType::Temperature),
            "humidity" => Ok(SensorType::Humidity),
            "light" => Ok(SensorType::Light),
            _ => Err(UnknownSensorType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorDescriptor {
    pub sensor_id: String,
    pub room_id: String,
    pub sensor_type: SensorType,
}

impl SensorDescriptor {
    pub fn new(sensor_id: String, room_id: String, sensor_type: SensorType) -> Self {
        Self {
            sensor_id,
            room_id,
            sensor_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sensor_type() {
        assert_eq!("temperature".parse(), Ok(SensorType::Temperature));
        assert_eq!("Humidity".parse(), Ok(SensorType::Humidity));
        assert_eq!(" light ".parse(), Ok(SensorType::Light));
        assert!("pressure".parse::<SensorType>().is_err());
    }

    #[test]
    fn test_units() {
        assert_eq!(SensorType::Temperature.unit(), "°C");
        assert_eq!(SensorType::Temperature.kpi_unit(), "C");
        assert_eq!(SensorType::Light.kpi_unit(), "lux");
    }
}
