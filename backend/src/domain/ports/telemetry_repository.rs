//! Port abstraction over the telemetry store.
//!
//! The store is append-only. Adapters must keep stored timestamps
//! non-decreasing in insertion order.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::telemetry::{NewReading, Reading, TelemetryFilter, TelemetryStats};

use super::define_port_error;

define_port_error! {
    /// Errors raised by telemetry store adapters.
    pub enum TelemetryStoreError {
        /// The store could not be reached.
        Unavailable { message: String } => "telemetry store unavailable: {message}",
        /// Query or insert failed during execution.
        Query { message: String } => "telemetry store query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    /// Append readings in order, returning the stored rows.
    async fn append(&self, readings: Vec<NewReading>) -> Result<Vec<Reading>, TelemetryStoreError>;

    /// Matching readings, newest first, at most `filter.limit` rows.
    async fn query(&self, filter: &TelemetryFilter) -> Result<Vec<Reading>, TelemetryStoreError>;

    /// The most recent reading for each distinct sensor name.
    async fn latest_per_source(&self) -> Result<Vec<Reading>, TelemetryStoreError>;

    /// Aggregate over readings at or after `since`.
    async fn aggregate(&self, since: DateTime<Utc>) -> Result<TelemetryStats, TelemetryStoreError>;
}
