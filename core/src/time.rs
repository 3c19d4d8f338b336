//! Time related utils.

use crate::{Error, Result};
use chrono::FixedOffset;
use chrono::NaiveDateTime;
use chrono::Utc;

/// DateTime is the alias of [`chrono::DateTime<Utc>`].
pub type DateTime = chrono::DateTime<Utc>;

/// Return the current UTC time.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format a time as `YYYY-MM-DDTHH:mm:ss.SSSZ` in the given zone.
///
/// The trailing `Z` is a literal, not a zone designator: query-API providers
/// render local wall-clock time with a `Z` suffix regardless of the actual
/// offset, and verify signatures against that exact rendering.
pub fn format_millis_z(t: DateTime, offset: FixedOffset) -> String {
    t.with_timezone(&offset)
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Parse a provider timestamp into UTC.
///
/// Accepts RFC 3339 strings as well as the `YYYY-MM-DDTHH:mm:ss[.SSS]Z`
/// rendering where the `Z` is a literal and the value is taken as UTC.
pub fn parse(s: &str) -> Result<DateTime> {
    if let Ok(t) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    let t = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ")
        .map_err(|e| Error::decode(format!("invalid timestamp {s:?}")).with_source(e))?;
    Ok(t.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_millis_z() {
        let t = Utc.with_ymd_and_hms(2022, 2, 10, 19, 57, 37).unwrap();
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();

        assert_eq!(format_millis_z(t, offset), "2022-02-11T03:57:37.000Z");
    }

    #[test]
    fn test_parse_literal_z() {
        let t = parse("2022-02-11T03:57:37.000Z").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2022, 2, 11, 3, 57, 37).unwrap());

        let t = parse("2022-02-11T03:57:37Z").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2022, 2, 11, 3, 57, 37).unwrap());
    }

    #[test]
    fn test_parse_offset() {
        let t = parse("2022-02-11T03:57:37+08:00").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2022, 2, 10, 19, 57, 37).unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse("not a time").is_err());
    }
}
