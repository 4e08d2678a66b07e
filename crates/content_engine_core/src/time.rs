//! UTC timestamp helpers shared by sources, strategies and reports.

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats `at` as RFC 3339 UTC with millisecond precision (`...T08:00:00.000Z`).
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Returns the current time in `iso_timestamp` form.
pub fn now_iso() -> String {
    iso_timestamp(Utc::now())
}

/// Returns the `YYYY-MM-DD` day prefix of an ISO timestamp.
pub fn ymd_utc(iso: &str) -> &str {
    iso.get(..10).unwrap_or(iso)
}
