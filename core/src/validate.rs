//! Field-level constraint checks shared by the request and response records.
//!
//! Each check takes the field name so the resulting `ValidationError` points
//! at the offending field. Optional fields are checked only when present.

use url::Url;

use crate::error::ValidationError;

/// Smallest amount, in minor units, the API accepts for orders, captures and refunds.
pub const MIN_AMOUNT: i64 = 100;

/// Longest `reason` accepted on cancel, capture and refund requests.
pub const MAX_REASON_LEN: usize = 255;

/// Longest redirect URL the API accepts.
pub const MAX_URL_LEN: usize = 2083;

/// A record that can check its own field constraints.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub fn min_amount(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < MIN_AMOUNT {
        return Err(ValidationError::new(
            field,
            format!("must be at least {MIN_AMOUNT}, got {value}"),
        ));
    }
    Ok(())
}

pub fn in_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::new(
            field,
            format!("must be within {min}..={max}, got {value}"),
        ));
    }
    Ok(())
}

/// Length is counted in characters, not bytes.
pub fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max} characters, got {len}"),
        ));
    }
    Ok(())
}

pub fn exact_len(field: &'static str, value: &str, len: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual != len {
        return Err(ValidationError::new(
            field,
            format!("must be exactly {len} characters, got {actual}"),
        ));
    }
    Ok(())
}

pub fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

/// Absolute `http`/`https` URL with a host, at most `MAX_URL_LEN` characters.
pub fn http_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    non_empty(field, value)?;
    max_len(field, value, MAX_URL_LEN)?;
    let parsed = Url::parse(value).map_err(|e| ValidationError::new(field, format!("not a valid URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::new(
            field,
            format!("URL scheme must be http or https, got {}", parsed.scheme()),
        ));
    }
    if parsed.host_str().unwrap_or_default().is_empty() {
        return Err(ValidationError::new(field, "URL must have a host"));
    }
    Ok(())
}

/// Runs `check` against an optional field, passing when the field is absent.
pub fn optional<T: ?Sized>(
    value: Option<&T>,
    check: impl FnOnce(&T) -> Result<(), ValidationError>,
) -> Result<(), ValidationError> {
    match value {
        Some(v) => check(v),
        None => Ok(()),
    }
}
