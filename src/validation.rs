use crate::error::{ClinicError, Result};
use chrono::{NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;
use validator::Validate;

lazy_static! {
    static ref DATE_FORMAT: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    static ref TIME_FORMAT: Regex = Regex::new(r"^\d{2}:\d{2}$").unwrap();
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    if !DATE_FORMAT.is_match(raw) {
        return Err(ClinicError::Validation(format!(
            "invalid date '{raw}', expected YYYY-MM-DD"
        )));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ClinicError::Validation(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

pub fn parse_time(raw: &str) -> Result<NaiveTime> {
    if !TIME_FORMAT.is_match(raw) {
        return Err(ClinicError::Validation(format!(
            "invalid time '{raw}', expected HH:MM"
        )));
    }
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| ClinicError::Validation(format!("invalid time '{raw}', expected HH:MM")))
}

/// Runs the derived field rules of a command's arguments and flattens the
/// outcome into a single [`ClinicError::Validation`].
pub fn validate_args<T: Validate>(args: &T) -> Result<()> {
    args.validate().map_err(|errors| {
        let mut parts: Vec<String> = Vec::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                parts.push(format!("{field} {message}"));
            }
        }
        parts.sort();
        ClinicError::Validation(parts.join("; "))
    })
}
