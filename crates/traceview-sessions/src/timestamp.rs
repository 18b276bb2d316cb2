use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an ISO-8601 timestamp to an absolute instant.
///
/// Timestamps without an offset are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    parse_naive(s).map(|naive| naive.and_utc().fixed_offset())
}

/// Parse a timestamp into local wall-clock time.
///
/// An explicit offset is converted to the local zone and dropped; a naive
/// timestamp is returned unchanged.
pub fn parse_local(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    parse_naive(s)
}

/// Seconds from `earlier` to `later`, or `None` if either does not parse.
pub fn seconds_between(earlier: &str, later: &str) -> Option<f64> {
    let start = parse_timestamp(earlier)?;
    let end = parse_timestamp(later)?;
    let delta = end.signed_duration_since(start);
    Some(delta.num_microseconds()? as f64 / 1_000_000.0)
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}
