use crate::utils::error::{LeaseError, Result};
use regex::Regex;
use std::sync::OnceLock;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| {
        // 允許數字、空白、+、-、括號
        Regex::new(r"^\+?[0-9 ()\-]+$").expect("phone pattern is valid")
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LeaseError::validation(
            field_name,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_phone(field_name: &str, value: &str) -> Result<()> {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if !phone_pattern().is_match(value) {
        return Err(LeaseError::validation(
            field_name,
            format!("'{}' is not a phone number", value),
        ));
    }
    if digits < 6 {
        return Err(LeaseError::validation(
            field_name,
            "Phone number must contain at least 6 digits",
        ));
    }
    Ok(())
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LeaseError::config(field_name, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(LeaseError::config(field_name, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(LeaseError::config(
            field_name,
            format!("Value {} must be between {} and {}", value, min, max),
        ));
    }
    Ok(())
}
