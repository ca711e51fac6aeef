// Parsing helpers for loosely typed client input

use serde_json::Value;

/// Parse the leading integer of a string, ignoring anything after it.
/// `"12.5"` gives 12, `"abc"` gives `None`.
pub fn parse_int_prefix(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Coerce a JSON value to an integer: numbers are truncated, numeric strings
/// parsed, anything else becomes `null`.
pub fn coerce_int(value: &Value) -> Value {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .map_or(Value::Null, Value::from),
        Value::String(s) => parse_int_prefix(s).map_or(Value::Null, Value::from),
        _ => Value::Null,
    }
}
