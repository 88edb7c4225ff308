use crate::error::RecordError;
use time::format_description::well_known::{Iso8601, Rfc2822, Rfc3339};
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Parse a timestamp in any of the common textual forms.
///
/// Accepts RFC 3339, ISO 8601, RFC 2822, Go's default `Time.String()` layout
/// (`2024-03-01 10:00:00.123 +0100 CET m=+0.5`) and offset-less date-times, which are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, RecordError> {
    let raw = raw.trim();

    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(ts);
    }
    if let Ok(ts) = OffsetDateTime::parse(raw, &Iso8601::PARSING) {
        return Ok(ts);
    }
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc2822) {
        return Ok(ts);
    }

    let with_offset = [
        format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour sign:mandatory][offset_minute]"
        ),
        format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]"
        ),
    ];
    // Go appends a zone abbreviation and a monotonic reading after the offset.
    let head: Vec<&str> = raw.split_whitespace().take(3).collect();
    if head.len() == 3 {
        let head = head.join(" ");
        for format in with_offset {
            if let Ok(ts) = OffsetDateTime::parse(&head, format) {
                return Ok(ts);
            }
        }
    }

    let naive = [
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]/[month]/[day] [hour]:[minute]:[second]"),
    ];
    for format in naive {
        if let Ok(ts) = PrimitiveDateTime::parse(raw, format) {
            return Ok(ts.assume_utc());
        }
    }

    Err(RecordError::BadTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn rfc3339_with_nanos_and_offset() {
        let ts = parse_timestamp("2024-03-01T10:00:00.123456789+01:00").unwrap();
        assert_eq!(ts, datetime!(2024-03-01 09:00:00.123456789 UTC));
    }

    #[test]
    fn go_default_layout() {
        let ts = parse_timestamp("2024-03-01 10:00:00.5 +0100 CET m=+12.000000001").unwrap();
        assert_eq!(ts, datetime!(2024-03-01 09:00:00.5 UTC));
    }

    #[test]
    fn naive_is_utc() {
        assert_eq!(
            parse_timestamp("2024-03-01 10:00:00").unwrap(),
            datetime!(2024-03-01 10:00:00 UTC)
        );
        assert_eq!(
            parse_timestamp("2024-03-01T10:00:00.25").unwrap(),
            datetime!(2024-03-01 10:00:00.25 UTC)
        );
    }

    #[test]
    fn rfc2822() {
        assert_eq!(
            parse_timestamp("Fri, 01 Mar 2024 10:00:00 +0000").unwrap(),
            datetime!(2024-03-01 10:00:00 UTC)
        );
    }

    #[test]
    fn zero_time() {
        assert_eq!(
            parse_timestamp("0001-01-01T00:00:00Z").unwrap(),
            datetime!(0001-01-01 00:00:00 UTC)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            parse_timestamp("yesterday"),
            Err(RecordError::BadTimestamp("yesterday".to_string()))
        );
    }
}
