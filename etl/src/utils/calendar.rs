use chrono::{DateTime, Datelike, Timelike};
use common::Error;
use std::str::FromStr;

/// Calendar fields stored in the time dimension, named the way `date_part`
/// names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarField {
    Hour,
    Day,
    /// ISO 8601 week number.
    Week,
    Month,
    Year,
    /// 0 = Sunday.
    Weekday,
}

impl FromStr for CalendarField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hour" => Ok(CalendarField::Hour),
            "day" => Ok(CalendarField::Day),
            "week" => Ok(CalendarField::Week),
            "month" => Ok(CalendarField::Month),
            "year" => Ok(CalendarField::Year),
            "dow" | "weekday" => Ok(CalendarField::Weekday),
            other => Err(Error::InvalidInput(format!(
                "unsupported date part: {}",
                other
            ))),
        }
    }
}

/// Extracts `field` from a UTC epoch-milliseconds timestamp. `None` when the
/// timestamp is outside chrono's range.
pub fn date_part(field: CalendarField, epoch_millis: i64) -> Option<i64> {
    let ts = DateTime::from_timestamp_millis(epoch_millis)?;

    let value = match field {
        CalendarField::Hour => ts.hour() as i64,
        CalendarField::Day => ts.day() as i64,
        CalendarField::Week => ts.iso_week().week() as i64,
        CalendarField::Month => ts.month() as i64,
        CalendarField::Year => ts.year() as i64,
        CalendarField::Weekday => ts.weekday().num_days_from_sunday() as i64,
    };

    Some(value)
}
