use thiserror::Error;
use time::{macros::format_description, OffsetDateTime, UtcOffset};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatetimeError {
    #[error("Datetime object does not have a UTC timezone.")]
    NotUtc,
}

/// Returns `dt` unchanged if its offset is UTC.
pub fn ensure_utc(dt: OffsetDateTime) -> Result<OffsetDateTime, DatetimeError> {
    if dt.offset() == UtcOffset::UTC {
        Ok(dt)
    } else {
        Err(DatetimeError::NotUtc)
    }
}

/// ISO 8601 in UTC with an explicit `+00:00` offset, e.g.
/// `1997-02-16T03:04:59.063870+00:00`. Microseconds are left out when zero.
pub fn utc_isoformat(dt: &OffsetDateTime) -> String {
    let dt = dt.to_offset(UtcOffset::UTC);
    let formatted = if dt.microsecond() != 0 {
        dt.format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6][offset_hour sign:mandatory]:[offset_minute]"
        ))
    } else {
        dt.format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
        ))
    };
    formatted.unwrap_or_else(|_| dt.unix_timestamp().to_string())
}
