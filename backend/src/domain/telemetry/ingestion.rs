//! Validation of inbound telemetry records.
//!
//! Ingestion is partial-success: each record is checked on its own and a
//! malformed record is skipped without affecting its neighbours.

use serde_json::Value;

use super::{ReadingStatus, ReadingValidationError, SensorName};

/// Why a single record was skipped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordRejection {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("sensor_name is missing or not a string")]
    MissingSensorName,
    #[error(transparent)]
    InvalidSensorName(ReadingValidationError),
    #[error("value is missing")]
    MissingValue,
    #[error("value is not a finite number")]
    NonNumericValue,
    #[error("unit must be a string")]
    InvalidUnit,
    #[error(transparent)]
    InvalidStatus(ReadingValidationError),
}

/// Payload-level failures; these reject the whole request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestPayloadError {
    #[error("No data provided")]
    Empty,
}

/// A record that passed validation and awaits a timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingDraft {
    pub sensor_name: SensorName,
    pub value: f64,
    pub unit: String,
    pub status: ReadingStatus,
}

/// Split a JSON body into candidate records.
///
/// A single object is a batch of one. Empty objects, empty arrays, `null`
/// and bare scalars carry no data.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use telemetry_backend::domain::telemetry::records_from_payload;
///
/// let records = records_from_payload(json!({"sensor_name": "t1", "value": 1})).expect("records");
/// assert_eq!(records.len(), 1);
/// assert!(records_from_payload(json!([])).is_err());
/// ```
pub fn records_from_payload(payload: Value) -> Result<Vec<Value>, IngestPayloadError> {
    match payload {
        Value::Array(items) if !items.is_empty() => Ok(items),
        Value::Object(map) if !map.is_empty() => Ok(vec![Value::Object(map)]),
        // Scalars are never records.
        _ => Err(IngestPayloadError::Empty),
    }
}

/// Validate one record.
pub fn validate_record(record: &Value) -> Result<ReadingDraft, RecordRejection> {
    let Value::Object(fields) = record else {
        return Err(RecordRejection::NotAnObject);
    };

    let sensor_name = match fields.get("sensor_name") {
        Some(Value::String(name)) => {
            SensorName::new(name).map_err(RecordRejection::InvalidSensorName)?
        }
        _ => return Err(RecordRejection::MissingSensorName),
    };

    let value = match fields.get("value") {
        None | Some(Value::Null) => return Err(RecordRejection::MissingValue),
        Some(raw) => coerce_value(raw)?,
    };

    let unit = match fields.get("unit") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(unit)) => unit.clone(),
        Some(_) => return Err(RecordRejection::InvalidUnit),
    };

    let status = match fields.get("status") {
        None | Some(Value::Null) => ReadingStatus::default(),
        Some(Value::String(raw)) => raw.parse().map_err(RecordRejection::InvalidStatus)?,
        Some(other) => {
            return Err(RecordRejection::InvalidStatus(
                ReadingValidationError::UnknownStatus {
                    value: other.to_string(),
                },
            ));
        }
    };

    Ok(ReadingDraft {
        sensor_name,
        value,
        unit,
        status,
    })
}

fn coerce_value(raw: &Value) -> Result<f64, RecordRejection> {
    let parsed = match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|value| value.is_finite())
        .ok_or(RecordRejection::NonNumericValue)
}
