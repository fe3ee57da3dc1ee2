//! Sensor telemetry HTTP handlers.
//!
//! ```text
//! GET  /api/sensor-data?sensor_name=boiler&hours=6&limit=50
//! GET  /api/sensor-data/latest
//! GET  /api/sensor-data/stats?hours=24
//! GET  /api/export?start_date=2024-03-01&end_date=2024-03-31T23:59
//! POST /api/ingest [{"sensor_name":"boiler","value":71.2,"unit":"C"}]
//! ```
//!
//! Integer parameters are parsed leniently: anything unreadable falls back
//! to its default instead of failing the request.

use std::collections::BTreeMap;

use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::ReadingQuery;
use crate::domain::telemetry::{
    ExportRange, Reading, ReadingWindow, SensorName, TelemetryStats,
};
use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::current_principal;
use crate::inbound::http::authorized::{Authorized, CanExport};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Message returned when the ingest body carries nothing to store.
pub const NO_DATA_MESSAGE: &str = "No data provided";

/// One stored reading on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReadingResponse {
    pub id: u64,
    #[schema(value_type = String, format = DateTime, example = "2024-03-04T05:06:07Z")]
    pub timestamp: DateTime<Utc>,
    #[schema(example = "boiler_temp")]
    pub sensor_name: String,
    #[schema(example = 71.25)]
    pub value: f64,
    #[schema(example = "C")]
    pub unit: String,
    #[schema(example = "OK")]
    pub status: String,
}

impl From<Reading> for ReadingResponse {
    fn from(value: Reading) -> Self {
        Self {
            id: value.id.get(),
            timestamp: value.timestamp,
            sensor_name: value.sensor_name.to_string(),
            value: value.value,
            unit: value.unit,
            status: value.status.as_str().to_owned(),
        }
    }
}

fn readings_body(readings: Vec<Reading>) -> Vec<ReadingResponse> {
    readings.into_iter().map(ReadingResponse::from).collect()
}

/// Aggregate figures for the KPI tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub total_readings: usize,
    pub sensor_count: usize,
    /// Mean value rounded to two decimals; `0` when there are no readings.
    pub avg_value: f64,
    /// Reading count per status. Absent statuses are omitted.
    pub status_summary: BTreeMap<String, usize>,
}

impl From<TelemetryStats> for StatsResponse {
    fn from(value: TelemetryStats) -> Self {
        Self {
            total_readings: value.count,
            sensor_count: value.distinct_source_count,
            avg_value: value.rounded_mean(),
            status_summary: value
                .status_histogram
                .into_iter()
                .map(|(status, count)| (status.as_str().to_owned(), count))
                .collect(),
        }
    }
}

/// Result of an ingest call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IngestResponse {
    /// Number of stored readings.
    pub created: usize,
    /// Number of malformed records that were skipped.
    pub skipped: usize,
    pub data: Vec<ReadingResponse>,
}

/// Documented shape of one ingest record. Values may also be numeric
/// strings; missing `unit` becomes empty and missing `status` becomes `OK`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestRecord {
    #[schema(example = "boiler_temp")]
    pub sensor_name: String,
    #[schema(example = 71.25)]
    pub value: f64,
    #[schema(example = "C")]
    pub unit: Option<String>,
    #[schema(example = "WARNING")]
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReadingsParams {
    /// Exact sensor name to filter on.
    pub sensor_name: Option<String>,
    /// Window size in hours; default 1.
    pub hours: Option<String>,
    /// Maximum number of readings; default 100.
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsParams {
    /// Window size in hours; default 1.
    pub hours: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportParams {
    /// Inclusive lower bound; ISO-8601 date or date-time.
    pub start_date: Option<String>,
    /// Inclusive upper bound; ISO-8601 date or date-time.
    pub end_date: Option<String>,
}

/// Windowed readings, oldest first.
#[utoipa::path(
    get,
    path = "/api/sensor-data",
    params(ReadingsParams),
    responses(
        (status = 200, description = "Readings", body = [ReadingResponse]),
        (status = 401, description = "Not logged in", body = ErrorSchema),
        (status = 503, description = "Telemetry store unavailable", body = ErrorSchema)
    ),
    tags = ["telemetry"],
    operation_id = "listReadings"
)]
#[get("/api/sensor-data")]
pub async fn list_readings(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<ReadingsParams>,
) -> ApiResult<web::Json<Vec<ReadingResponse>>> {
    current_principal(&state, &session).await?;
    let ReadingsParams {
        sensor_name,
        hours,
        limit,
    } = params.into_inner();
    let sensor_name = match sensor_name.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match SensorName::new(raw) {
            Ok(name) => Some(name),
            // No stored reading can carry an invalid name.
            Err(_) => return Ok(web::Json(Vec::new())),
        },
    };
    let query = ReadingQuery {
        sensor_name,
        window: ReadingWindow::from_raw(hours.as_deref(), limit.as_deref()),
    };
    let readings = state.telemetry.readings(&query).await?;
    Ok(web::Json(readings_body(readings)))
}

/// Newest reading per sensor, ordered by sensor name.
#[utoipa::path(
    get,
    path = "/api/sensor-data/latest",
    responses(
        (status = 200, description = "Latest readings", body = [ReadingResponse]),
        (status = 401, description = "Not logged in", body = ErrorSchema),
        (status = 503, description = "Telemetry store unavailable", body = ErrorSchema)
    ),
    tags = ["telemetry"],
    operation_id = "latestReadings"
)]
#[get("/api/sensor-data/latest")]
pub async fn latest_readings(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<ReadingResponse>>> {
    current_principal(&state, &session).await?;
    let readings = state.telemetry.latest().await?;
    Ok(web::Json(readings_body(readings)))
}

/// Aggregate over the last `hours` hours.
#[utoipa::path(
    get,
    path = "/api/sensor-data/stats",
    params(StatsParams),
    responses(
        (status = 200, description = "Aggregate", body = StatsResponse),
        (status = 401, description = "Not logged in", body = ErrorSchema),
        (status = 503, description = "Telemetry store unavailable", body = ErrorSchema)
    ),
    tags = ["telemetry"],
    operation_id = "readingStats"
)]
#[get("/api/sensor-data/stats")]
pub async fn reading_stats(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<StatsParams>,
) -> ApiResult<web::Json<StatsResponse>> {
    current_principal(&state, &session).await?;
    let hours = ReadingWindow::from_raw(params.hours.as_deref(), None).hours();
    let stats = state.telemetry.stats(hours).await?;
    Ok(web::Json(StatsResponse::from(stats)))
}

/// Download readings as a spreadsheet, newest first.
#[utoipa::path(
    get,
    path = "/api/export",
    params(ExportParams),
    responses(
        (status = 200, description = "Spreadsheet download",
            content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            headers(("Content-Disposition" = String, description = "Attachment filename"))),
        (status = 401, description = "Not logged in", body = ErrorSchema),
        (status = 403, description = "Export not permitted", body = ErrorSchema),
        (status = 503, description = "Telemetry store unavailable", body = ErrorSchema)
    ),
    tags = ["telemetry"],
    operation_id = "exportReadings"
)]
#[get("/api/export")]
pub async fn export_readings(
    state: web::Data<HttpState>,
    user: Authorized<CanExport>,
    params: web::Query<ExportParams>,
) -> ApiResult<HttpResponse> {
    let principal = user.into_principal();
    let range = ExportRange::from_raw(params.start_date.as_deref(), params.end_date.as_deref());
    let document = state.telemetry.export(&range).await?;
    info!(
        user_id = %principal.id(),
        filename = %document.filename,
        bytes = document.bytes.len(),
        "export rendered"
    );
    Ok(HttpResponse::Ok()
        .content_type(document.content_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(document.filename)],
        })
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .body(document.bytes))
}

/// Store pushed readings. Malformed records are skipped, not fatal.
#[utoipa::path(
    post,
    path = "/api/ingest",
    request_body(content = [IngestRecord], description = "A reading object or an array of them"),
    responses(
        (status = 201, description = "Readings stored", body = IngestResponse),
        (status = 400, description = "Empty or unparseable body", body = ErrorSchema),
        (status = 403, description = "Peer not allowed to ingest", body = ErrorSchema),
        (status = 503, description = "Telemetry store unavailable", body = ErrorSchema)
    ),
    tags = ["telemetry"],
    operation_id = "ingestReadings",
    security([])
)]
#[post("/api/ingest")]
pub async fn ingest_readings(
    state: web::Data<HttpState>,
    req: HttpRequest,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let peer = req.peer_addr().map(|addr| addr.ip());
    if !state.ingest_policy.permits(peer) {
        warn!(peer = ?peer, policy = %state.ingest_policy, "ingest refused");
        return Err(Error::forbidden("Ingestion is not allowed from this address"));
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::invalid_request(NO_DATA_MESSAGE));
    }
    let payload: Value = serde_json::from_slice(&body).map_err(|err| {
        Error::invalid_request("Request body is not valid JSON")
            .with_details(serde_json::json!({ "reason": err.to_string() }))
    })?;
    let outcome = state.ingest.ingest(payload).await?;
    Ok(HttpResponse::Created().json(IngestResponse {
        created: outcome.created.len(),
        skipped: outcome.skipped,
        data: readings_body(outcome.created),
    }))
}

#[cfg(test)]
#[path = "sensor_data_tests.rs"]
mod tests;
