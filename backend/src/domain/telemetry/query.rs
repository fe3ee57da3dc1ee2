//! Query vocabulary for the telemetry store: filters, windows, aggregates.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use super::{ReadingStatus, SensorName};

/// Default look-back window in hours.
pub const DEFAULT_HOURS: i64 = 1;
/// Default number of rows returned by a query.
pub const DEFAULT_LIMIT: usize = 100;
/// Hard ceiling on rows returned by a single query.
pub const MAX_LIMIT: usize = 10_000;
/// Longest accepted look-back window (one year).
pub const MAX_HOURS: i64 = 24 * 366;

/// Store-level filter.
///
/// Selection is newest-first (so `limit` keeps the most recent rows);
/// presentation order is chosen by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryFilter {
    pub sensor_name: Option<SensorName>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl TelemetryFilter {
    /// Whether a reading with these attributes passes the filter.
    #[must_use]
    pub fn matches(&self, sensor_name: &SensorName, timestamp: DateTime<Utc>) -> bool {
        self.sensor_name
            .as_ref()
            .is_none_or(|wanted| wanted == sensor_name)
            && self.since.is_none_or(|since| timestamp >= since)
            && self.until.is_none_or(|until| timestamp <= until)
    }
}

/// Look-back window and row limit for the read API.
///
/// Raw query-string values are parsed leniently: anything that is missing,
/// not an integer, or out of range falls back to the default.
///
/// # Examples
/// ```
/// use telemetry_backend::domain::telemetry::ReadingWindow;
///
/// let window = ReadingWindow::from_raw(Some("abc"), Some("50"));
/// assert_eq!(window.hours(), 1);
/// assert_eq!(window.limit(), 50);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingWindow {
    hours: i64,
    limit: usize,
}

impl Default for ReadingWindow {
    fn default() -> Self {
        Self {
            hours: DEFAULT_HOURS,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ReadingWindow {
    #[must_use]
    pub fn from_raw(hours: Option<&str>, limit: Option<&str>) -> Self {
        let hours = hours
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|hours| *hours >= 0)
            .map_or(DEFAULT_HOURS, |hours| hours.min(MAX_HOURS));
        let limit = limit
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|limit| *limit > 0)
            .and_then(|limit| usize::try_from(limit).ok())
            .map_or(DEFAULT_LIMIT, |limit| limit.min(MAX_LIMIT));
        Self { hours, limit }
    }

    #[must_use]
    pub const fn hours(&self) -> i64 {
        self.hours
    }

    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Start of the window relative to `now`.
    #[must_use]
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(self.hours)
    }
}

/// Aggregate over a window. Zero-valued when nothing matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryStats {
    pub count: usize,
    pub distinct_source_count: usize,
    pub mean_value: f64,
    pub status_histogram: BTreeMap<ReadingStatus, usize>,
}

impl TelemetryStats {
    /// Mean rounded to two decimal places, as shown on the dashboard.
    #[must_use]
    pub fn rounded_mean(&self) -> f64 {
        (self.mean_value * 100.0).round() / 100.0
    }
}

/// Optional inclusive bounds for an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl ExportRange {
    /// Parse raw bounds; values that cannot be parsed are ignored.
    #[must_use]
    pub fn from_raw(start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            start: start.and_then(parse_bound),
            end: end.and_then(parse_bound),
        }
    }

    #[must_use]
    pub fn into_filter(self) -> TelemetryFilter {
        TelemetryFilter {
            since: self.start,
            until: self.end,
            ..TelemetryFilter::default()
        }
    }
}

/// Accepts RFC 3339, naive ISO-8601 and `datetime-local` forms, plus bare
/// dates. Naive values are taken as UTC.
fn parse_bound(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, 1, 100)]
    #[case(Some("6"), Some("50"), 6, 50)]
    #[case(Some("x"), Some("y"), 1, 100)]
    #[case(Some("-3"), Some("0"), 1, 100)]
    #[case(Some("0"), Some("-5"), 0, 100)]
    #[case(Some("1"), Some("999999"), 1, MAX_LIMIT)]
    fn lenient_window_parsing(
        #[case] hours: Option<&str>,
        #[case] limit: Option<&str>,
        #[case] expected_hours: i64,
        #[case] expected_limit: usize,
    ) {
        let window = ReadingWindow::from_raw(hours, limit);
        assert_eq!(window.hours(), expected_hours);
        assert_eq!(window.limit(), expected_limit);
    }

    #[rstest]
    #[case("2024-03-01T10:30:00Z", Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0))]
    #[case("2024-03-01T12:30:00+02:00", Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0))]
    #[case("2024-03-01T10:30", Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0))]
    #[case("2024-03-01T10:30:15", Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 15))]
    #[case("2024-03-01", Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0))]
    fn export_bounds_accept_common_forms(
        #[case] raw: &str,
        #[case] expected: chrono::LocalResult<DateTime<Utc>>,
    ) {
        let range = ExportRange::from_raw(Some(raw), None);
        assert_eq!(range.start, expected.single());
    }

    #[rstest]
    fn unparseable_export_bounds_are_ignored() {
        let range = ExportRange::from_raw(Some("yesterday"), Some(""));
        assert_eq!(range, ExportRange::default());
    }

    #[rstest]
    fn filter_matches_name_and_bounds() {
        let name = SensorName::new("temp").expect("sensor");
        let other = SensorName::new("humidity").expect("sensor");
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).single().expect("time");
        let filter = TelemetryFilter {
            sensor_name: Some(name.clone()),
            since: Some(at - Duration::hours(1)),
            until: Some(at),
            limit: None,
        };
        assert!(filter.matches(&name, at));
        assert!(!filter.matches(&other, at));
        assert!(!filter.matches(&name, at + Duration::seconds(1)));
        assert!(!filter.matches(&name, at - Duration::hours(2)));
    }

    #[rstest]
    fn mean_rounds_to_two_places() {
        let stats = TelemetryStats {
            count: 3,
            mean_value: 21.666_666,
            ..TelemetryStats::default()
        };
        assert!((stats.rounded_mean() - 21.67).abs() < 1e-9);
    }
}
