//! Telemetry readings: append-only sensor samples.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum stored length of a sensor name.
pub const SENSOR_NAME_MAX: usize = 64;

/// Validation errors for reading primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadingValidationError {
    #[error("sensor name must not be empty")]
    EmptySensorName,
    #[error("sensor name must be at most {max} characters")]
    SensorNameTooLong { max: usize },
    #[error("unknown reading status: {value}")]
    UnknownStatus { value: String },
}

/// Monotonic reading identifier assigned on insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingId(u64);

impl ReadingId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Sensor (source) name; exact-match filter key, stored without surrounding
/// whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SensorName(String);

impl SensorName {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ReadingValidationError> {
        let name = raw.as_ref().trim();
        if name.is_empty() {
            return Err(ReadingValidationError::EmptySensorName);
        }
        if name.chars().count() > SENSOR_NAME_MAX {
            return Err(ReadingValidationError::SensorNameTooLong {
                max: SENSOR_NAME_MAX,
            });
        }
        Ok(Self(name.to_owned()))
    }
}

impl AsRef<str> for SensorName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SensorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SensorName {
    type Error = ReadingValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SensorName> for String {
    fn from(value: SensorName) -> Self {
        value.0
    }
}

/// Reading health flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ReadingStatus {
    #[default]
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "ERROR")]
    Error,
}

impl ReadingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = ReadingValidationError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OK" => Ok(Self::Ok),
            "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            _ => Err(ReadingValidationError::UnknownStatus {
                value: s.to_owned(),
            }),
        }
    }
}

/// A validated reading that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub timestamp: DateTime<Utc>,
    pub sensor_name: SensorName,
    pub value: f64,
    pub unit: String,
    pub status: ReadingStatus,
}

/// A stored reading. Never updated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub id: ReadingId,
    pub timestamp: DateTime<Utc>,
    pub sensor_name: SensorName,
    pub value: f64,
    pub unit: String,
    pub status: ReadingStatus,
}

impl Reading {
    /// Attach a storage identifier to a pending reading.
    #[must_use]
    pub fn from_new(id: ReadingId, reading: NewReading) -> Self {
        let NewReading {
            timestamp,
            sensor_name,
            value,
            unit,
            status,
        } = reading;
        Self {
            id,
            timestamp,
            sensor_name,
            value,
            unit,
            status,
        }
    }
}
