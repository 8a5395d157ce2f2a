use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn now_utc_rfc3339() -> Result<String, time::error::Format> {
    OffsetDateTime::now_utc().format(&Rfc3339)
}

/// Reads an RFC 3339 timestamp or a millisecond unix epoch.
pub fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(parsed);
    }

    let millis: i64 = value.parse().ok()?;
    if millis == 0 {
        return None;
    }
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}

/// `YYYY-MM-DD HH:MM:SS` in UTC, or `--` when the value is missing or unreadable.
pub fn format_time(value: Option<&str>) -> String {
    match value.and_then(parse_timestamp) {
        Some(at) => {
            let at = at.to_offset(time::UtcOffset::UTC);
            format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                at.year(),
                u8::from(at.month()),
                at.day(),
                at.hour(),
                at.minute(),
                at.second()
            )
        }
        None => "--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_utc_rfc3339_formats_timestamp() {
        let value = now_utc_rfc3339().expect("timestamp");
        assert!(value.ends_with('Z'));
        assert!(value.contains('T'));
    }

    #[test]
    fn format_time_accepts_rfc3339_and_epoch_millis() {
        assert_eq!(
            format_time(Some("2024-03-05T07:08:09Z")),
            "2024-03-05 07:08:09"
        );
        assert_eq!(
            format_time(Some("2024-03-05T09:08:09+02:00")),
            "2024-03-05 07:08:09"
        );
        assert_eq!(format_time(Some("1700000000000")), "2023-11-14 22:13:20");
    }

    #[test]
    fn format_time_marks_missing_values() {
        assert_eq!(format_time(None), "--");
        assert_eq!(format_time(Some("")), "--");
        assert_eq!(format_time(Some("0")), "--");
        assert_eq!(format_time(Some("yesterday")), "--");
    }
}
