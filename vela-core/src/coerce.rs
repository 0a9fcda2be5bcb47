use serde_json::Value;

/// Coerce a dynamically typed vendor scalar into an `f64`.
///
/// Vendor payloads encode prices as JSON numbers, integer counters, or
/// decimal strings depending on plan and endpoint. Returns `None` for
/// anything else, for unparsable strings, and for non-finite results; a
/// `None` here means "drop the message", never a fault.
#[must_use]
pub fn lenient_f64(v: &Value) -> Option<f64> {
    let f = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

/// Coerce a millisecond timestamp out of a vendor scalar.
///
/// Accepts integral JSON numbers and numeric strings. Fractional values are
/// truncated toward zero.
#[must_use]
pub fn lenient_ms(v: &Value) -> Option<i64> {
    let f = lenient_f64(v)?;
    if f < i64::MIN as f64 || f > i64::MAX as f64 {
        return None;
    }
    Some(f as i64)
}
