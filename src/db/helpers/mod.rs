use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::db::models::{SessionStatus, TimerStatus};

pub fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

pub fn to_optional_u64(value: Option<i64>, field: &str) -> Result<Option<u64>> {
    value.map(|raw| to_u64(raw, field)).transpose()
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn parse_session_status(value: &str) -> Result<SessionStatus> {
    match value {
        "Active" => Ok(SessionStatus::Active),
        "Paused" => Ok(SessionStatus::Paused),
        "Completed" => Ok(SessionStatus::Completed),
        "Interrupted" => Ok(SessionStatus::Interrupted),
        other => Err(anyhow!("unknown session status {other}")),
    }
}

pub fn parse_timer_status(value: &str) -> Result<TimerStatus> {
    match value {
        "Stopped" => Ok(TimerStatus::Stopped),
        "Running" => Ok(TimerStatus::Running),
        "Paused" => Ok(TimerStatus::Paused),
        other => Err(anyhow!("unknown timer status {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_minutes() {
        assert!(to_u64(-1, "duration_minutes").is_err());
        assert_eq!(to_u64(0, "duration_minutes").unwrap(), 0);
    }

    #[test]
    fn parses_statuses_roundtrip() {
        for status in [
            SessionStatus::Active,
            SessionStatus::Paused,
            SessionStatus::Completed,
            SessionStatus::Interrupted,
        ] {
            assert_eq!(parse_session_status(status.as_str()).unwrap(), status);
        }
        for status in [
            TimerStatus::Stopped,
            TimerStatus::Running,
            TimerStatus::Paused,
        ] {
            assert_eq!(parse_timer_status(status.as_str()).unwrap(), status);
        }
        assert!(parse_session_status("Cancelled").is_err());
    }
}
