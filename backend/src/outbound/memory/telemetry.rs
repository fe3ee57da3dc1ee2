//! In-process telemetry store.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::ports::{TelemetryRepository, TelemetryStoreError};
use crate::domain::telemetry::{
    NewReading, Reading, ReadingId, SensorName, TelemetryFilter, TelemetryStats,
};

#[derive(Default)]
struct Log {
    /// Sorted by `(timestamp, id)` ascending.
    readings: Vec<Reading>,
    next_id: u64,
}

/// Append-only reading log kept in timestamp order.
#[derive(Default)]
pub struct InMemoryTelemetryRepository {
    log: RwLock<Log>,
}

impl InMemoryTelemetryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TelemetryRepository for InMemoryTelemetryRepository {
    async fn append(&self, readings: Vec<NewReading>) -> Result<Vec<Reading>, TelemetryStoreError> {
        let mut log = self.log.write().await;
        let mut stored = Vec::with_capacity(readings.len());
        for new in readings {
            log.next_id += 1;
            let reading = Reading::from_new(ReadingId::new(log.next_id), new);
            let at = log
                .readings
                .partition_point(|r| (r.timestamp, r.id) <= (reading.timestamp, reading.id));
            log.readings.insert(at, reading.clone());
            stored.push(reading);
        }
        Ok(stored)
    }

    async fn query(&self, filter: &TelemetryFilter) -> Result<Vec<Reading>, TelemetryStoreError> {
        let log = self.log.read().await;
        let matching = log
            .readings
            .iter()
            .rev()
            .filter(|r| filter.matches(&r.sensor_name, r.timestamp));
        let selected = match filter.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        };
        Ok(selected)
    }

    async fn latest_per_source(&self) -> Result<Vec<Reading>, TelemetryStoreError> {
        let log = self.log.read().await;
        let mut latest: BTreeMap<&SensorName, &Reading> = BTreeMap::new();
        for reading in log.readings.iter().rev() {
            latest.entry(&reading.sensor_name).or_insert(reading);
        }
        Ok(latest.into_values().cloned().collect())
    }

    async fn aggregate(&self, since: DateTime<Utc>) -> Result<TelemetryStats, TelemetryStoreError> {
        let log = self.log.read().await;
        let mut stats = TelemetryStats::default();
        let mut sources = HashSet::new();
        let mut total = 0.0;
        for reading in log.readings.iter().filter(|r| r.timestamp >= since) {
            stats.count += 1;
            total += reading.value;
            sources.insert(&reading.sensor_name);
            *stats.status_histogram.entry(reading.status).or_default() += 1;
        }
        stats.distinct_source_count = sources.len();
        if stats.count > 0 {
            #[expect(
                clippy::cast_precision_loss,
                reason = "reading counts stay far below 2^52"
            )]
            let count = stats.count as f64;
            stats.mean_value = total / count;
        }
        Ok(stats)
    }
}
