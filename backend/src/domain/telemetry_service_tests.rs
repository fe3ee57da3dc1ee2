//! Tests for the telemetry service.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{MockExportRenderer, MockTelemetryRepository};
use crate::domain::telemetry::{ReadingId, ReadingStatus, ReadingWindow, SensorName};
use crate::test_support::MutableClock;

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 4, 13, 30, 0)
        .single()
        .expect("fixed time")
}

fn reading(id: u64, at: DateTime<Utc>) -> Reading {
    Reading {
        id: ReadingId::new(id),
        timestamp: at,
        sensor_name: SensorName::new(format!("s{}", id % 3)).expect("sensor"),
        value: id as f64,
        unit: "C".into(),
        status: ReadingStatus::Ok,
    }
}

fn service(
    store: MockTelemetryRepository,
    renderer: MockExportRenderer,
    now: DateTime<Utc>,
) -> TelemetryService<MockTelemetryRepository, MockExportRenderer> {
    TelemetryService::new(
        Arc::new(store),
        Arc::new(renderer),
        Arc::new(MutableClock::new(now)),
    )
}

#[rstest]
#[tokio::test]
async fn readings_select_newest_then_present_chronologically(now: DateTime<Utc>) {
    let mut store = MockTelemetryRepository::new();
    store
        .expect_query()
        .withf(move |filter| {
            filter.limit == Some(50) && filter.since == Some(now - Duration::hours(1))
        })
        .returning(move |_| {
            Ok((0..50)
                .rev()
                .map(|i| reading(150 + i, now - Duration::seconds(50 - i as i64)))
                .collect())
        });
    let service = service(store, MockExportRenderer::new(), now);

    let rows = service
        .readings(&ReadingQuery {
            sensor_name: None,
            window: ReadingWindow::from_raw(None, Some("50")),
        })
        .await
        .expect("rows");

    assert_eq!(rows.len(), 50);
    assert!(rows.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
    assert_eq!(rows.last().map(|row| row.id), Some(ReadingId::new(199)));
}

#[rstest]
#[tokio::test]
async fn ingest_skips_malformed_records_and_keeps_order(now: DateTime<Utc>) {
    let mut store = MockTelemetryRepository::new();
    store.expect_append().times(1).returning(|drafts| {
        Ok(drafts
            .into_iter()
            .enumerate()
            .map(|(i, draft)| Reading::from_new(ReadingId::new(i as u64 + 1), draft))
            .collect())
    });
    let service = service(store, MockExportRenderer::new(), now);

    let outcome = service
        .ingest(json!([
            {"sensor_name": "a", "value": 1},
            {"sensor_name": "", "value": 2},
            {"value": 3},
            {"sensor_name": "b", "value": "4.5", "status": "warning"},
            "junk",
        ]))
        .await
        .expect("ingest");

    assert_eq!(outcome.skipped, 3);
    let names: Vec<_> = outcome
        .created
        .iter()
        .map(|r| r.sensor_name.as_ref().to_owned())
        .collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(outcome.created[1].status, ReadingStatus::Warning);
    assert!(outcome.created.iter().all(|r| r.timestamp == now));
}

#[rstest]
#[tokio::test]
async fn all_malformed_batch_stores_nothing(now: DateTime<Utc>) {
    let mut store = MockTelemetryRepository::new();
    store.expect_append().never();
    let service = service(store, MockExportRenderer::new(), now);

    let outcome = service
        .ingest(json!({"sensor_name": "a"}))
        .await
        .expect("partial success");
    assert!(outcome.created.is_empty());
    assert_eq!(outcome.skipped, 1);
}

#[rstest]
#[tokio::test]
async fn empty_payload_is_invalid_request(now: DateTime<Utc>) {
    let service = service(
        MockTelemetryRepository::new(),
        MockExportRenderer::new(),
        now,
    );
    let err = service.ingest(json!([])).await.expect_err("empty");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn stats_window_is_relative_to_clock(now: DateTime<Utc>) {
    let mut store = MockTelemetryRepository::new();
    store
        .expect_aggregate()
        .withf(move |since| *since == now - Duration::hours(6))
        .returning(|_| Ok(TelemetryStats::default()));
    let service = service(store, MockExportRenderer::new(), now);

    let stats = service.stats(6).await.expect("stats");
    assert_eq!(stats, TelemetryStats::default());
}

#[rstest]
#[tokio::test]
async fn export_names_file_after_clock_and_renders_even_when_empty(now: DateTime<Utc>) {
    let mut store = MockTelemetryRepository::new();
    store
        .expect_query()
        .withf(|filter| filter.limit.is_none())
        .returning(|_| Ok(Vec::new()));
    let mut renderer = MockExportRenderer::new();
    renderer
        .expect_render()
        .withf(|rows| rows.is_empty())
        .returning(|_| Ok(vec![1, 2, 3]));
    renderer.expect_content_type().return_const("application/test");
    renderer.expect_file_extension().return_const("bin");
    let service = service(store, renderer, now);

    let document = service
        .export(&ExportRange::default())
        .await
        .expect("export");
    assert_eq!(document.filename, "sensor_data_20240504_133000.bin");
    assert_eq!(document.content_type, "application/test");
    assert_eq!(document.bytes, vec![1, 2, 3]);
}

#[rstest]
#[tokio::test]
async fn store_outage_maps_to_service_unavailable(now: DateTime<Utc>) {
    let mut store = MockTelemetryRepository::new();
    store
        .expect_latest_per_source()
        .returning(|| Err(TelemetryStoreError::unavailable("gone")));
    let service = service(store, MockExportRenderer::new(), now);

    let err = service.latest().await.expect_err("outage");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}
