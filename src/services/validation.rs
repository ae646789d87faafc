//! Input validation shared by the services

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::password::{is_long_enough, MIN_PASSWORD_LENGTH};
use super::ServiceError;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("Invalid URL regex"));

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid date regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_url(url: &str) -> bool {
    URL_RE.is_match(url)
}

/// A field that must be present and not blank. The value is returned as given.
pub fn required(value: Option<String>, field: &str) -> Result<String, ServiceError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ServiceError::Validation(format!("{} is required", field))),
    }
}

/// An optional field that, when supplied, must not be blank
pub fn not_blank(value: Option<String>, field: &str) -> Result<Option<String>, ServiceError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ServiceError::Validation(format!(
            "{} must not be empty",
            field
        ))),
        other => Ok(other),
    }
}

/// Trimmed, well-formed email address
pub fn email(value: &str) -> Result<String, ServiceError> {
    let email = value.trim();
    if !is_valid_email(email) {
        return Err(ServiceError::Validation("Invalid email format".to_string()));
    }
    Ok(email.to_string())
}

/// Calendar date in `YYYY-MM-DD` form
pub fn date(value: &str, field: &str) -> Result<NaiveDate, ServiceError> {
    let value = value.trim();
    if !DATE_RE.is_match(value) {
        return Err(ServiceError::Validation(format!(
            "{} must be a date in YYYY-MM-DD format",
            field
        )));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ServiceError::Validation(format!("{} is not a valid date", field)))
}

pub fn link(value: &str) -> Result<(), ServiceError> {
    if !is_valid_url(value.trim()) {
        return Err(ServiceError::Validation(
            "link must be a valid http or https URL".to_string(),
        ));
    }
    Ok(())
}

pub fn password_length(password: &str) -> Result<(), ServiceError> {
    if !is_long_enough(password) {
        return Err(ServiceError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
