//! Driving port for pushing telemetry into the store.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::Error;
use crate::domain::telemetry::Reading;

/// Result of a partial-success ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    /// Stored readings, in submission order.
    pub created: Vec<Reading>,
    /// Number of malformed records skipped.
    pub skipped: usize,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemetryIngest: Send + Sync {
    /// Validate and store each record independently.
    ///
    /// Only an empty payload or a store failure is an error.
    async fn ingest(&self, payload: Value) -> Result<IngestOutcome, Error>;
}
