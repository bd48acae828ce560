use std::fmt;

use rust_decimal::Decimal;

/// A rejected input field. `field` is the JSON key as the client sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Required free text: must contain at least one non-whitespace character.
pub(crate) fn required_text(
    field: &'static str,
    value: Option<String>,
    message: &str,
) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::new(field, message)),
    }
}

/// Optional free text: an empty string is stored as absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Optional email: empty means absent, anything else must look like an address.
pub(crate) fn optional_email(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<String>, ValidationError> {
    match optional_text(value) {
        None => Ok(None),
        Some(v) if looks_like_email(&v) => Ok(Some(v)),
        Some(_) => Err(ValidationError::new(field, "Invalid email")),
    }
}

fn looks_like_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty() && !host.starts_with('.')
}

pub(crate) fn non_negative(
    field: &'static str,
    value: Decimal,
    message: &str,
) -> Result<Decimal, ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new(field, message));
    }
    Ok(value)
}

pub(crate) fn optional_non_negative(
    field: &'static str,
    value: Option<Decimal>,
    message: &str,
) -> Result<Option<Decimal>, ValidationError> {
    value.map(|v| non_negative(field, v, message)).transpose()
}
