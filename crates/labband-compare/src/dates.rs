//! Lenient report-date parsing and chronological ordering.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO 8601 date or date-time. Offsets are normalized to UTC.
///
/// Returns `None` for anything else; callers treat that as indeterminate.
pub fn parse_report_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Which of two inputs is older.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chronology {
    /// First input is older, or both dates are equal.
    InOrder,
    /// Second input is older.
    Swapped,
    /// At least one date did not parse; input order is kept.
    Indeterminate,
}

impl Chronology {
    pub fn is_swapped(&self) -> bool {
        matches!(self, Chronology::Swapped)
    }
}

pub fn chronology(first: &str, second: &str) -> Chronology {
    match (parse_report_date(first), parse_report_date(second)) {
        (Some(a), Some(b)) if b < a => Chronology::Swapped,
        (Some(_), Some(_)) => Chronology::InOrder,
        _ => Chronology::Indeterminate,
    }
}
