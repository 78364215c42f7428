//! Display formatting for reservation date and time fields.
//!
//! The backend returns dates as full timestamps (`2023-01-01T00:00:00.000Z`)
//! and times with seconds (`18:30:00`). Listings show `2023-01-01` and
//! `18:30`. Anything that does not parse is passed through as-is.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};
use tracing::debug;

use crate::types::Reservation;

/// Reformats the date and time fields of every reservation in the list.
pub fn format_reservations(mut reservations: Vec<Reservation>) -> Vec<Reservation> {
    for reservation in &mut reservations {
        format_reservation_date(reservation);
        format_reservation_time(reservation);
    }
    reservations
}

pub fn format_reservation_date(reservation: &mut Reservation) {
    match format_date(&reservation.reservation_date) {
        Some(formatted) => reservation.reservation_date = formatted,
        None => debug!(
            value = %reservation.reservation_date,
            "leaving unparseable reservation_date"
        ),
    }
}

pub fn format_reservation_time(reservation: &mut Reservation) {
    match format_time(&reservation.reservation_time) {
        Some(formatted) => reservation.reservation_time = formatted,
        None => debug!(
            value = %reservation.reservation_time,
            "leaving unparseable reservation_time"
        ),
    }
}

/// `YYYY-MM-DD` from either an RFC 3339 timestamp or a plain date. Other
/// values that start with a valid date (`2023-01-01 18:00:00`, a timestamp
/// with an unusual fraction) fall back to that leading date.
pub fn format_date(value: &str) -> Option<String> {
    let date_format = format_description!("[year]-[month]-[day]");
    let date = match OffsetDateTime::parse(value, &Rfc3339) {
        Ok(timestamp) => timestamp.date(),
        Err(_) => Date::parse(value, date_format)
            .or_else(|err| match value.get(..10) {
                Some(prefix) => Date::parse(prefix, date_format),
                None => Err(err),
            })
            .ok()?,
    };
    date.format(date_format).ok()
}

/// `HH:MM` from `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff`. Values that start
/// with a valid `HH:MM` (`18:30:00+00` from a `timetz` column) fall back to
/// that prefix.
pub fn format_time(value: &str) -> Option<String> {
    let hour_minute = format_description!("[hour]:[minute]");
    let time = Time::parse(value, format_description!("[hour]:[minute]:[second].[subsecond]"))
        .or_else(|_| Time::parse(value, format_description!("[hour]:[minute]:[second]")))
        .or_else(|_| Time::parse(value, hour_minute))
        .or_else(|err| match value.get(..5) {
            Some(prefix) => Time::parse(prefix, hour_minute),
            None => Err(err),
        })
        .ok()?;
    time.format(hour_minute).ok()
}
