//! Telemetry read, ingest and export use-cases.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::{Error, run_blocking};
use crate::domain::ports::{
    ExportDocument, ExportRenderError, ExportRenderer, IngestOutcome, ReadingQuery,
    TelemetryIngest, TelemetryQuery, TelemetryRepository, TelemetryStoreError,
};
use crate::domain::telemetry::{
    ExportRange, NewReading, Reading, TelemetryFilter, TelemetryStats, records_from_payload,
    validate_record,
};

/// Filename stem used for exports.
pub const EXPORT_FILE_STEM: &str = "sensor_data";

fn map_store_error(error: TelemetryStoreError) -> Error {
    match error {
        TelemetryStoreError::Unavailable { message } => {
            Error::service_unavailable(format!("telemetry store unavailable: {message}"))
        }
        TelemetryStoreError::Query { message } => {
            Error::internal(format!("telemetry store error: {message}"))
        }
    }
}

fn map_render_error(error: ExportRenderError) -> Error {
    Error::internal(error.to_string())
}

/// Telemetry service implementing the read, export and ingest driving ports.
#[derive(Clone)]
pub struct TelemetryService<T, E> {
    store: Arc<T>,
    renderer: Arc<E>,
    clock: Arc<dyn Clock>,
}

impl<T, E> TelemetryService<T, E> {
    pub fn new(store: Arc<T>, renderer: Arc<E>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            renderer,
            clock,
        }
    }
}

#[async_trait]
impl<T, E> TelemetryQuery for TelemetryService<T, E>
where
    T: TelemetryRepository,
    E: ExportRenderer + 'static,
{
    async fn readings(&self, query: &ReadingQuery) -> Result<Vec<Reading>, Error> {
        let filter = TelemetryFilter {
            sensor_name: query.sensor_name.clone(),
            since: Some(query.window.since(self.clock.utc())),
            until: None,
            limit: Some(query.window.limit()),
        };
        // Selection keeps the newest rows; presentation is chronological.
        let mut rows = self.store.query(&filter).await.map_err(map_store_error)?;
        rows.reverse();
        Ok(rows)
    }

    async fn latest(&self) -> Result<Vec<Reading>, Error> {
        let mut rows = self
            .store
            .latest_per_source()
            .await
            .map_err(map_store_error)?;
        rows.sort_by(|a, b| a.sensor_name.cmp(&b.sensor_name));
        Ok(rows)
    }

    async fn stats(&self, hours: i64) -> Result<TelemetryStats, Error> {
        let since = self.clock.utc() - chrono::Duration::hours(hours);
        self.store.aggregate(since).await.map_err(map_store_error)
    }

    async fn export(&self, range: &ExportRange) -> Result<ExportDocument, Error> {
        let rows = self
            .store
            .query(&range.into_filter())
            .await
            .map_err(map_store_error)?;
        let row_count = rows.len();
        let renderer = Arc::clone(&self.renderer);
        let bytes = run_blocking(move || renderer.render(&rows))
            .await?
            .map_err(map_render_error)?;
        let filename = format!(
            "{EXPORT_FILE_STEM}_{}.{}",
            self.clock.utc().format("%Y%m%d_%H%M%S"),
            self.renderer.file_extension()
        );
        info!(rows = row_count, %filename, "export rendered");
        Ok(ExportDocument {
            content_type: self.renderer.content_type(),
            filename,
            bytes,
        })
    }
}

#[async_trait]
impl<T, E> TelemetryIngest for TelemetryService<T, E>
where
    T: TelemetryRepository,
    E: ExportRenderer + 'static,
{
    async fn ingest(&self, payload: Value) -> Result<IngestOutcome, Error> {
        let records =
            records_from_payload(payload).map_err(|err| Error::invalid_request(err.to_string()))?;
        let submitted = records.len();
        let timestamp = self.clock.utc();

        let drafts: Vec<NewReading> = records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| match validate_record(record) {
                Ok(draft) => Some(NewReading {
                    timestamp,
                    sensor_name: draft.sensor_name,
                    value: draft.value,
                    unit: draft.unit,
                    status: draft.status,
                }),
                Err(reason) => {
                    debug!(index, %reason, "skipping malformed telemetry record");
                    None
                }
            })
            .collect();

        let skipped = submitted - drafts.len();
        let created = if drafts.is_empty() {
            Vec::new()
        } else {
            self.store.append(drafts).await.map_err(map_store_error)?
        };
        info!(created = created.len(), skipped, "telemetry ingested");
        Ok(IngestOutcome { created, skipped })
    }
}

#[cfg(test)]
#[path = "telemetry_service_tests.rs"]
mod tests;
