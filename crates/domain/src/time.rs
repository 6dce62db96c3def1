//! Time and timestamp helpers.

use chrono::{DateTime, SecondsFormat, Utc};

/// UTC timestamp used for record creation/update times and reading times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Render a timestamp as fixed-width RFC 3339 text, so stored values sort
/// lexicographically in time order.
#[must_use]
pub fn to_stored(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a timestamp previously rendered with [`to_stored`].
///
/// # Errors
///
/// Returns [`chrono::ParseError`] when `text` is not RFC 3339.
pub fn from_stored(text: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|ts| ts.to_utc())
}
