//! Driving port for reading and exporting telemetry.

use async_trait::async_trait;

use crate::domain::Error;
use crate::domain::telemetry::{
    ExportRange, Reading, ReadingWindow, SensorName, TelemetryStats,
};

/// Parameters for a windowed read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadingQuery {
    pub sensor_name: Option<SensorName>,
    pub window: ReadingWindow,
}

/// A rendered export ready to be sent as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub content_type: &'static str,
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemetryQuery: Send + Sync {
    /// The newest `limit` readings in the window, returned oldest first.
    async fn readings(&self, query: &ReadingQuery) -> Result<Vec<Reading>, Error>;

    /// One reading per sensor, ordered by sensor name.
    async fn latest(&self) -> Result<Vec<Reading>, Error>;

    /// Aggregate over the last `hours` hours.
    async fn stats(&self, hours: i64) -> Result<TelemetryStats, Error>;

    /// Render readings within `range`, newest first.
    async fn export(&self, range: &ExportRange) -> Result<ExportDocument, Error>;
}
