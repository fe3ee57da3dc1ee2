//! Telemetry readings, their validation and the query vocabulary.

mod ingestion;
mod query;
mod reading;

pub use ingestion::{
    IngestPayloadError, ReadingDraft, RecordRejection, records_from_payload, validate_record,
};
pub use query::{
    DEFAULT_HOURS, DEFAULT_LIMIT, ExportRange, MAX_HOURS, MAX_LIMIT, ReadingWindow,
    TelemetryFilter, TelemetryStats,
};
pub use reading::{
    NewReading, Reading, ReadingId, ReadingStatus, ReadingValidationError, SENSOR_NAME_MAX,
    SensorName,
};
