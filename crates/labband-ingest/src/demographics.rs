//! Patient demographics needed to pick reference ranges.

use chrono::{Datelike, NaiveDate};
use labband_model::Sex;
use serde_json::{Map, Value};

use crate::error::IngestError;

const DOB_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

/// Parse a date of birth written `MM/DD/YYYY` or `YYYY-MM-DD`.
pub fn parse_date_of_birth(value: &str) -> Result<NaiveDate, IngestError> {
    let trimmed = value.trim();
    DOB_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| IngestError::InvalidDateOfBirth {
            value: value.to_string(),
        })
}

/// Completed years between `dob` and `today`; zero for future dates.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}

pub fn chronological_age(dob: &str, today: NaiveDate) -> Result<u32, IngestError> {
    parse_date_of_birth(dob).map(|dob| age_on(dob, today))
}

/// Sex from the `gender` header field, if recognisable.
pub fn sex_from_fields(fields: &Map<String, Value>) -> Option<Sex> {
    fields
        .get("gender")
        .and_then(Value::as_str)
        .and_then(Sex::from_gender)
}

/// Age from the `age` header field, or else from `DOB`.
pub fn age_from_fields(fields: &Map<String, Value>, today: NaiveDate) -> Option<u32> {
    let stated = fields.get("age").and_then(|value| match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    });
    stated.or_else(|| {
        fields
            .get("DOB")
            .and_then(Value::as_str)
            .and_then(|dob| chronological_age(dob, today).ok())
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn age_counts_completed_years() {
        let today = date(2026, 10, 16);
        assert_eq!(chronological_age("10/16/1980", today).ok(), Some(46));
        assert_eq!(chronological_age("10/17/1980", today).ok(), Some(45));
        assert_eq!(chronological_age("1980-10-15", today).ok(), Some(46));
        assert_eq!(chronological_age("2030-01-01", today).ok(), Some(0));
    }

    #[test]
    fn rejects_unknown_dob_shapes() {
        let err = chronological_age("16.10.1980", date(2026, 10, 16)).expect_err("dotted");
        assert_eq!(err.to_string(), "unrecognised date of birth: 16.10.1980");
        assert!(parse_date_of_birth("02/30/1990").is_err());
    }

    #[test]
    fn demographics_from_header_fields() {
        let today = date(2026, 10, 16);
        let Value::Object(fields) = json!({"gender": "Female", "DOB": "03/04/1970"}) else {
            panic!("object fixture");
        };
        assert_eq!(sex_from_fields(&fields), Some(Sex::Female));
        assert_eq!(age_from_fields(&fields, today), Some(56));

        let Value::Object(stated) = json!({"gender": "unknown", "age": " 61 ", "DOB": "1970-03-04"})
        else {
            panic!("object fixture");
        };
        assert_eq!(sex_from_fields(&stated), None);
        assert_eq!(age_from_fields(&stated, today), Some(61));
    }

    proptest! {
        #[test]
        fn age_never_decreases_with_time(
            dob_days in 0i64..40_000,
            gap in 0i64..20_000,
        ) {
            let base = date(1930, 1, 1);
            let dob = base + chrono::Duration::days(dob_days);
            let earlier = dob + chrono::Duration::days(gap);
            let later = earlier + chrono::Duration::days(365);
            prop_assert!(age_on(dob, later) >= age_on(dob, earlier));
            prop_assert_eq!(age_on(dob, dob), 0);
        }
    }
}
