//! Tests for the telemetry handlers.

use std::net::SocketAddr;

use actix_web::http::{StatusCode, header};
use actix_web::test;
use rstest::rstest;
use serde_json::{Value, json};

use super::NO_DATA_MESSAGE;
use crate::domain::ports::TelemetryIngest;
use crate::inbound::http::ingest_policy::IngestPolicy;
use crate::inbound::http::test_utils::{login_cookie, status_and_json};
use crate::server::{AdapterPolicies, build_app};
use crate::test_support::TestBackend;

fn ingest_request(body: impl Into<String>) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/ingest")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(body.into())
}

async fn ingest(backend: &TestBackend, payload: Value) {
    backend
        .http
        .ingest
        .ingest(payload)
        .await
        .expect("ingest readings");
}

#[actix_web::test]
async fn ingest_stores_valid_records_and_counts_the_rest() {
    let backend = TestBackend::new().await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;
    let body = json!([
        { "sensor_name": "boiler_temp", "value": 71.2, "unit": "C", "status": "warning" },
        { "sensor_name": "line_speed", "value": "12.5" },
        { "sensor_name": "", "value": 1 },
        { "sensor_name": "pressure", "value": true },
        "not a record"
    ]);

    let res = test::call_service(&app, ingest_request(body.to_string()).to_request()).await;
    let (status, body) = status_and_json(res).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], 2);
    assert_eq!(body["skipped"], 3);
    assert_eq!(body["data"][0]["sensor_name"], "boiler_temp");
    assert_eq!(body["data"][0]["status"], "WARNING");
    assert_eq!(body["data"][1]["unit"], "");
    assert_eq!(body["data"][1]["status"], "OK");
    assert_eq!(body["data"][1]["timestamp"], "2024-03-04T12:00:00Z");
}

#[actix_web::test]
async fn ingest_accepts_a_single_object() {
    let backend = TestBackend::new().await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;
    let body = json!({ "sensor_name": "boiler_temp", "value": 70 });

    let res = test::call_service(&app, ingest_request(body.to_string()).to_request()).await;
    let (status, body) = status_and_json(res).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], 1);
    assert_eq!(body["skipped"], 0);
}

#[rstest]
#[case::blank("  ")]
#[case::empty_array("[]")]
#[case::empty_object("{}")]
#[case::zero("0")]
#[case::number("5")]
#[case::boolean("true")]
#[case::string("\"x\"")]
#[actix_web::test]
async fn ingest_rejects_empty_payloads(#[case] raw: &str) {
    let backend = TestBackend::new().await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;

    let res = test::call_service(&app, ingest_request(raw).to_request()).await;
    let (status, body) = status_and_json(res).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], NO_DATA_MESSAGE);
}

#[actix_web::test]
async fn ingest_rejects_invalid_json() {
    let backend = TestBackend::new().await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;

    let res = test::call_service(&app, ingest_request("[{").to_request()).await;
    let (status, body) = status_and_json(res).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert!(body["details"]["reason"].is_string());
}

#[rstest]
#[case::loopback("127.0.0.1:4000", StatusCode::CREATED)]
#[case::private("10.1.2.3:4000", StatusCode::CREATED)]
#[case::public("203.0.113.9:4000", StatusCode::FORBIDDEN)]
#[actix_web::test]
async fn internal_policy_only_admits_local_peers(#[case] peer: &str, #[case] expected: StatusCode) {
    let backend = TestBackend::with_policies(AdapterPolicies {
        ingest: IngestPolicy::Internal,
        ..AdapterPolicies::default()
    })
    .await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;
    let peer: SocketAddr = peer.parse().expect("socket address");
    let body = json!([{ "sensor_name": "boiler_temp", "value": 70 }]).to_string();

    let res = test::call_service(&app, ingest_request(body).peer_addr(peer).to_request()).await;

    assert_eq!(res.status(), expected);
}

#[actix_web::test]
async fn readings_keep_the_newest_rows_in_chronological_order() {
    let backend = TestBackend::new().await;
    backend.account("ada", "pw", "Investor").await;
    backend.clock.advance_seconds(-3 * 3600);
    ingest(&backend, json!({ "sensor_name": "boiler_temp", "value": 1 })).await;
    backend.clock.advance_seconds(3 * 3600 - 30);
    for value in [2, 3, 4] {
        ingest(&backend, json!({ "sensor_name": "boiler_temp", "value": value })).await;
        backend.clock.advance_seconds(10);
    }
    let app = test::init_service(build_app(backend.app_dependencies())).await;
    let cookie = login_cookie(&app, "ada", "pw").await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/sensor-data?limit=2")
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    let (status, body) = status_and_json(res).await;
    assert_eq!(status, StatusCode::OK);
    let values: Vec<f64> = body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|row| row["value"].as_f64())
        .collect();
    assert_eq!(values, vec![3.0, 4.0]);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/sensor-data?hours=4&limit=junk")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let (_, body) = status_and_json(res).await;
    assert_eq!(body.as_array().map(Vec::len), Some(4));
}

#[rstest]
#[case::known("boiler_temp", 1)]
#[case::padded("%20boiler_temp%20", 1)]
#[case::blank("", 2)]
#[case::unknown("nothing", 0)]
#[actix_web::test]
async fn readings_filter_by_sensor_name(#[case] name: &str, #[case] expected: usize) {
    let backend = TestBackend::new().await;
    backend.account("ada", "pw", "Investor").await;
    ingest(
        &backend,
        json!([
            { "sensor_name": " boiler_temp ", "value": 1 },
            { "sensor_name": "line_speed", "value": 2 }
        ]),
    )
    .await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;
    let cookie = login_cookie(&app, "ada", "pw").await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/sensor-data?sensor_name={name}"))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let (_, body) = status_and_json(res).await;

    assert_eq!(body.as_array().map(Vec::len), Some(expected));
}

#[actix_web::test]
async fn latest_and_stats_summarise_the_store() {
    let backend = TestBackend::new().await;
    backend.account("ada", "pw", "Investor").await;
    ingest(
        &backend,
        json!([
            { "sensor_name": "line_speed", "value": 10, "status": "ERROR" },
            { "sensor_name": "boiler_temp", "value": 20 }
        ]),
    )
    .await;
    backend.clock.advance_seconds(5);
    ingest(&backend, json!({ "sensor_name": "boiler_temp", "value": 31 })).await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;
    let cookie = login_cookie(&app, "ada", "pw").await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/sensor-data/latest")
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    let (_, latest) = status_and_json(res).await;
    assert_eq!(latest[0]["sensor_name"], "boiler_temp");
    assert_eq!(latest[0]["value"], 31.0);
    assert_eq!(latest[1]["sensor_name"], "line_speed");

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/sensor-data/stats?hours=24")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let (status, stats) = status_and_json(res).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_readings"], 3);
    assert_eq!(stats["sensor_count"], 2);
    assert_eq!(stats["avg_value"], 20.33);
    assert_eq!(stats["status_summary"], json!({ "OK": 2, "ERROR": 1 }));
}

#[rstest]
#[actix_web::test]
async fn export_requires_a_login() {
    let backend = TestBackend::new().await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/export").to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[case::investor("Investor", StatusCode::FORBIDDEN)]
#[case::audit("Audit", StatusCode::OK)]
#[actix_web::test]
async fn export_is_gated_on_the_export_capability(
    #[case] role: &str,
    #[case] expected: StatusCode,
) {
    let backend = TestBackend::new().await;
    backend.account("ada", "pw", role).await;
    ingest(&backend, json!({ "sensor_name": "boiler_temp", "value": 1 })).await;
    let app = test::init_service(build_app(backend.app_dependencies())).await;
    let cookie = login_cookie(&app, "ada", "pw").await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/export?start_date=2024-03-01")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), expected);
    if expected == StatusCode::OK {
        let disposition = res
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .expect("content disposition");
        assert!(disposition.starts_with("attachment"));
        assert!(disposition.contains("sensor_data_20240304_120000.xlsx"));
        let body = test::read_body(res).await;
        assert!(body.starts_with(b"PK"));
    }
}
