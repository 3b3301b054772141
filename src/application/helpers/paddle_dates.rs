use chrono::{NaiveDate, NaiveDateTime};

use crate::app_error::{AppError, AppResult};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a Paddle `YYYY-MM-DD` date as the start of that day (UTC).
pub fn parse_paddle_date(value: &str) -> AppResult<NaiveDateTime> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map(|date| date.and_time(chrono::NaiveTime::MIN))
        .map_err(|e| AppError::InvalidInput(format!("Invalid Paddle date '{}': {}", value, e)))
}

/// Parse a Paddle `YYYY-MM-DD HH:MM:SS` timestamp (UTC). Plain dates are
/// accepted too since some alerts only carry the day.
pub fn parse_paddle_datetime(value: &str) -> AppResult<NaiveDateTime> {
    let value = value.trim();
    match NaiveDateTime::parse_from_str(value, DATETIME_FORMAT) {
        Ok(datetime) => Ok(datetime),
        Err(_) => parse_paddle_date(value),
    }
}
