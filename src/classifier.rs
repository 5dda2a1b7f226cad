//! Deadline status classification.
//!
//! A row's status is a pure function of its deadline cell and a reference date.
//! The reference date is always passed in; nothing here reads the clock.
//!
//! Only calendar dates are compared. A deadline on the reference date itself is
//! still `Urgent`, and a deadline exactly `window` days out is `Urgent` too.

use crate::model::{CellValue, Status};
use time::macros::format_description;
use time::{Date, Duration};

/// Sentinel that marks a row as still open, compared trimmed and case-insensitively.
const OPEN_MARKER: &str = "open";

/// Parse a deadline in the fixed `DD.MM.YYYY` format.
///
/// Day and month may omit the leading zero. Anything else (ISO dates, slashes,
/// trailing time of day, impossible dates such as `31.02.2024`) yields `None`.
pub fn parse_deadline(raw: &str) -> Option<Date> {
    Date::parse(
        raw.trim(),
        format_description!("[day padding:none].[month padding:none].[year]"),
    )
    .ok()
}

/// Render a date the way deadlines are written in the sheet.
pub fn format_deadline(date: Date) -> String {
    format!(
        "{:02}.{:02}.{:04}",
        date.day(),
        u8::from(date.month()),
        date.year()
    )
}

/// Classify one deadline cell against `reference`.
pub fn classify(cell: &CellValue, reference: Date, urgent_window_days: i64) -> Status {
    let deadline = match cell {
        CellValue::Empty => return Status::Unknown,
        CellValue::Text(raw) => {
            if raw.trim().eq_ignore_ascii_case(OPEN_MARKER) {
                return Status::Open;
            }
            match parse_deadline(raw) {
                Some(d) => d,
                None => return Status::Unknown,
            }
        }
        CellValue::Date(d) => *d,
    };
    classify_date(deadline, reference, urgent_window_days)
}

fn classify_date(deadline: Date, reference: Date, urgent_window_days: i64) -> Status {
    if deadline < reference {
        return Status::Closed;
    }
    // A window reaching past the end of the calendar covers every remaining date.
    let window = urgent_window_days.max(0);
    let days_left = i64::from(Date::MAX.to_julian_day()) - i64::from(reference.to_julian_day());
    if window >= days_left {
        return Status::Urgent;
    }
    match reference.checked_add(Duration::days(window)) {
        Some(horizon) if deadline > horizon => Status::Upcoming,
        _ => Status::Urgent,
    }
}
