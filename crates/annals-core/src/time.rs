use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use thiserror::Error;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

#[derive(Debug, Error)]
pub enum TimeParseError {
    #[error("timestamp cannot be empty")]
    Empty,
    #[error("invalid date")]
    InvalidDate,
    #[error("invalid datetime format: expected YYYY-MM-DD or YYYY-MM-DD HH:MM")]
    InvalidDateTime,
    #[error("invalid date format: expected YYYY-MM-DD")]
    InvalidDateFormat,
    #[error("invalid time format: expected HH:MM")]
    InvalidTimeFormat,
    #[error("invalid crm datetime: {0}")]
    InvalidCrmDateTime(String),
    #[error("ambiguous local time: {0}")]
    AmbiguousLocalTime(String),
}

pub fn now_utc() -> i64 {
    Utc::now().timestamp()
}

pub fn parse_local_timestamp(input: &str) -> Result<i64, TimeParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimeParseError::Empty);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or(TimeParseError::InvalidDate)?;
        return local_to_utc_timestamp(naive);
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return local_to_utc_timestamp(dt);
        }
    }

    Err(TimeParseError::InvalidDateTime)
}

/// Combines the separate date and time inputs of the history form.
pub fn parse_local_date_time(date: &str, time: Option<&str>) -> Result<i64, TimeParseError> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| TimeParseError::InvalidDateFormat)?;
    let time = match time {
        Some(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .map_err(|_| TimeParseError::InvalidTimeFormat)?,
        None => NaiveTime::from_hms_opt(0, 0, 0).ok_or(TimeParseError::InvalidDate)?,
    };

    let naive = date.and_time(time);
    local_to_utc_timestamp(naive)
}

/// CRM date-time fields carry an explicit offset, e.g. `2030-01-15T13:45:00+01:00`.
pub fn format_crm_datetime(ts: i64) -> String {
    to_local(ts).to_rfc3339_opts(SecondsFormat::Secs, false)
}

pub fn parse_crm_datetime(input: &str) -> Result<i64, TimeParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimeParseError::Empty);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.timestamp())
        .map_err(|_| TimeParseError::InvalidCrmDateTime(trimmed.to_string()))
}

pub fn format_timestamp_date(ts: i64) -> String {
    to_local(ts).format("%Y-%m-%d").to_string()
}

pub fn format_timestamp_time(ts: i64) -> String {
    to_local(ts).format("%H:%M").to_string()
}

pub fn format_timestamp_datetime(ts: i64) -> String {
    to_local(ts).format("%Y-%m-%d %H:%M").to_string()
}

/// Date and time columns of the history table.
pub fn split_date_time(ts: i64) -> (String, String) {
    (format_timestamp_date(ts), format_timestamp_time(ts))
}

fn to_local(ts: i64) -> DateTime<Local> {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .unwrap_or_default()
        .with_timezone(&Local)
}

fn local_to_utc_timestamp(naive: NaiveDateTime) -> Result<i64, TimeParseError> {
    let local = Local
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| TimeParseError::AmbiguousLocalTime(naive.to_string()))?;
    Ok(local.with_timezone(&Utc).timestamp())
}

#[cfg(test)]
mod tests {
    use super::{
        format_crm_datetime, format_timestamp_datetime, parse_crm_datetime,
        parse_local_date_time, parse_local_timestamp, split_date_time, TimeParseError,
    };
    use chrono::{Local, TimeZone, Utc};

    #[test]
    fn parse_local_timestamp_accepts_date_only() {
        let ts = parse_local_timestamp("2030-01-15").unwrap();
        let local = Utc.timestamp_opt(ts, 0).unwrap().with_timezone(&Local);
        assert_eq!(local.format("%Y-%m-%d").to_string(), "2030-01-15");
    }

    #[test]
    fn parse_local_timestamp_rejects_empty() {
        let err = parse_local_timestamp("").unwrap_err();
        assert!(matches!(err, TimeParseError::Empty));
    }

    #[test]
    fn parse_local_date_time_accepts_date_and_time() {
        let ts = parse_local_date_time("2030-01-15", Some("13:45")).unwrap();
        assert_eq!(format_timestamp_datetime(ts), "2030-01-15 13:45");
    }

    #[test]
    fn parse_local_date_time_rejects_bad_time() {
        let err = parse_local_date_time("2030-01-15", Some("1pm")).unwrap_err();
        assert!(matches!(err, TimeParseError::InvalidTimeFormat));
    }

    #[test]
    fn crm_datetime_round_trips() {
        let local = Local.with_ymd_and_hms(2030, 1, 15, 13, 45, 0).unwrap();
        let ts = local.with_timezone(&Utc).timestamp();
        let formatted = format_crm_datetime(ts);
        assert!(formatted.starts_with("2030-01-15T13:45:00"));
        assert_eq!(parse_crm_datetime(&formatted).unwrap(), ts);
    }

    #[test]
    fn crm_datetime_with_explicit_offset() {
        let ts = parse_crm_datetime("2030-01-15T13:45:00+02:00").unwrap();
        let utc = Utc.with_ymd_and_hms(2030, 1, 15, 11, 45, 0).unwrap();
        assert_eq!(ts, utc.timestamp());
        assert!(parse_crm_datetime("yesterday").is_err());
    }

    #[test]
    fn split_date_time_matches_local_time() {
        let local = Local.with_ymd_and_hms(2030, 1, 15, 9, 5, 0).unwrap();
        let ts = local.with_timezone(&Utc).timestamp();
        let (date, time) = split_date_time(ts);
        assert_eq!(date, "2030-01-15");
        assert_eq!(time, "09:05");
    }
}
