use std::sync::LazyLock;

use regex::Regex;

use crate::error::AppError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// Keep ASCII digits only. Used for matriculas, CPFs and phone numbers.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn require_non_empty(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

pub fn normalize_email(value: &str) -> Result<String, AppError> {
    let email = value.trim().to_lowercase();
    if !is_email(&email) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    Ok(email)
}

/// CPF as 11 digits, punctuation stripped.
pub fn normalize_cpf(value: &str) -> Result<String, AppError> {
    let cpf = digits_only(value);
    if cpf.len() != 11 {
        return Err(AppError::BadRequest("CPF must have 11 digits".to_string()));
    }
    Ok(cpf)
}

/// Brazilian phone with area code: 10 (landline) or 11 (mobile) digits.
pub fn normalize_phone(value: &str) -> Result<String, AppError> {
    let phone = digits_only(value);
    if !(10..=11).contains(&phone.len()) {
        return Err(AppError::BadRequest(
            "Phone must have 10 or 11 digits including area code".to_string(),
        ));
    }
    Ok(phone)
}

/// Treat blank optional strings as absent.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
