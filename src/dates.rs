use chrono::{Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

const INPUT_FORMAT: &str = "%m-%d-%Y %H:%M";
const DISPLAY_FORMAT: &str = "%m/%d/%Y %H:%M";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("could not read '{input}' as a date (M-d-yyyy) and time (H:mm)")]
    MalformedInput { input: String },
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Read a deadline typed as a `M-d-yyyy` date and an `H:mm` time, in local
/// time, into epoch milliseconds.
pub fn parse_deadline(date: &str, time: &str) -> Result<i64, DateError> {
    let input = format!("{} {}", date.trim(), time.trim());
    let malformed = || DateError::MalformedInput {
        input: input.clone(),
    };

    let naive = NaiveDateTime::parse_from_str(&input, INPUT_FORMAT).map_err(|_| malformed())?;
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(at) => Ok(at.timestamp_millis()),
        // Falling back from daylight saving: take the earlier instant.
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.timestamp_millis()),
        // Skipped by a daylight saving jump.
        LocalResult::None => Err(malformed()),
    }
}

/// Render epoch milliseconds as `MM/dd/yyyy HH:mm` in local time.
pub fn format_millis(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis) {
        LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => {
            at.format(DISPLAY_FORMAT).to_string()
        }
        LocalResult::None => String::from("-"),
    }
}
