use crate::{Error, Id, MAX_ID_LIMIT, Result};
use serde_json::Value;

/// Coerces an arbitrary JSON value into an [`Id`].
///
/// Accepts JSON numbers and decimal strings (surrounding whitespace is
/// ignored, exponent and fractional notation are allowed as long as the value
/// is integral). Everything else, including booleans and `null`, is rejected.
///
/// # Errors
///
/// Returns [`Error::InvalidIdentifier`] if the value is non-numeric,
/// non-finite, not integral, not positive, or above [`MAX_ID_LIMIT`].
pub fn coerce_id(raw: &Value) -> Result<Id> {
    let id = match raw {
        Value::Number(n) => match n.as_u64() {
            Some(u) => Some(u),
            None => n.as_f64().and_then(integral),
        },
        Value::String(s) => parse_decimal(s),
        _ => None,
    };

    id.filter(|&id| id > 0 && id <= MAX_ID_LIMIT)
        .ok_or_else(|| Error::invalid(raw))
}

/// Parses identifier text typed by a user, with the same rules as
/// [`coerce_id`] applied to a JSON string.
///
/// # Errors
///
/// Returns [`Error::InvalidIdentifier`] if the text does not denote an
/// identifier in `1..=MAX_ID_LIMIT`.
pub fn parse_id(text: &str) -> Result<Id> {
    parse_decimal(text)
        .filter(|&id| id > 0 && id <= MAX_ID_LIMIT)
        .ok_or_else(|| Error::invalid(text))
}

fn parse_decimal(text: &str) -> Option<Id> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match text.parse::<Id>() {
        Ok(id) => Some(id),
        Err(_) => text.parse::<f64>().ok().and_then(integral),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn integral(value: f64) -> Option<Id> {
    if !value.is_finite() || value.fract() != 0.0 || value <= 0.0 {
        return None;
    }
    if value > MAX_ID_LIMIT as f64 {
        return None;
    }
    Some(value as Id)
}
