//! Lenient date-time parsing for request bodies.
//!
//! Browsers submit `datetime-local` inputs as `2024-03-01T10:00` (no seconds),
//! scripts tend to send RFC 3339 with an offset, and SQL dumps use a space
//! separator. All of them are accepted and stored as a naive timestamp; values
//! carrying an offset are converted to UTC first.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub fn parse_naive_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    let value = raw.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Ok(with_offset.naive_utc());
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }

    // A bare date means midnight
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }

    Err(format!("invalid date-time '{}', expected YYYY-MM-DDTHH:MM[:SS]", raw))
}

/// `#[serde(deserialize_with = "shared_models::datetime::lenient")]`
pub fn lenient<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_naive_datetime(&raw).map_err(de::Error::custom)
}

/// Optional variant; pair with `#[serde(default)]`. Empty strings count as absent.
pub fn lenient_option<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(value) if !value.trim().is_empty() => {
            parse_naive_datetime(&value).map(Some).map_err(de::Error::custom)
        }
        _ => Ok(None),
    }
}

/// Calendar date; a full date-time is accepted and truncated to its day.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_naive_datetime(raw)
        .map(|value| value.date())
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", raw))
}

pub fn date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(de::Error::custom)
}

pub fn date_option<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(value) if !value.trim().is_empty() => parse_date(&value).map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde::Deserialize;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn test_accepts_browser_format_without_seconds() {
        assert_eq!(parse_naive_datetime("2024-03-01T10:00").unwrap(), at(2024, 3, 1, 10, 0));
    }

    #[test]
    fn test_accepts_seconds_and_space_separator() {
        assert_eq!(parse_naive_datetime("2024-03-01T10:00:00").unwrap(), at(2024, 3, 1, 10, 0));
        assert_eq!(parse_naive_datetime("2024-03-01 10:00").unwrap(), at(2024, 3, 1, 10, 0));
    }

    #[test]
    fn test_offsets_are_normalized_to_utc() {
        assert_eq!(
            parse_naive_datetime("2024-03-01T11:00:00+01:00").unwrap(),
            at(2024, 3, 1, 10, 0)
        );
        assert_eq!(
            parse_naive_datetime("2024-03-01T10:00:00.000Z").unwrap(),
            at(2024, 3, 1, 10, 0)
        );
    }

    #[test]
    fn test_bare_date_is_midnight() {
        assert_eq!(parse_naive_datetime("2024-03-01").unwrap(), at(2024, 3, 1, 0, 0));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_naive_datetime("tomorrow at ten").is_err());
    }

    #[test]
    fn test_date_truncates_time() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_date("2024-03-01").unwrap(), day);
        assert_eq!(parse_date("2024-03-01T18:45").unwrap(), day);
        assert!(parse_date("01/03/2024").is_err());
    }

    #[derive(Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "lenient_option")]
        when: Option<NaiveDateTime>,
    }

    #[test]
    fn test_optional_field_handling() {
        let missing: Body = serde_json::from_str("{}").unwrap();
        assert!(missing.when.is_none());

        let empty: Body = serde_json::from_str(r#"{"when": ""}"#).unwrap();
        assert!(empty.when.is_none());

        let null: Body = serde_json::from_str(r#"{"when": null}"#).unwrap();
        assert!(null.when.is_none());

        let set: Body = serde_json::from_str(r#"{"when": "2024-03-01T10:00"}"#).unwrap();
        assert_eq!(set.when, Some(at(2024, 3, 1, 10, 0)));
    }
}
