//! Implicit typing of plain scalars.
//!
//! Follows the YAML 1.1 rules a safe loader applies: `yes`/`no`/`on`/`off`
//! booleans, `~` for null, `0x`/`0o`/`0b` integers and `.inf`/`.nan` floats.

/// A resolved scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// Resolve the text of a plain (unquoted) scalar into a typed value.
pub fn resolve_plain_scalar(value: &str) -> ScalarValue {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => return ScalarValue::Null,
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" => {
            return ScalarValue::Bool(true);
        }
        "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => {
            return ScalarValue::Bool(false);
        }
        _ => {}
    }

    if let Some(i) = parse_integer(value) {
        return ScalarValue::Integer(i);
    }
    if let Some(f) = parse_float(value) {
        return ScalarValue::Float(f);
    }

    ScalarValue::String(value.to_string())
}

fn split_sign(value: &str) -> (bool, &str) {
    if let Some(rest) = value.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = value.strip_prefix('+') {
        (false, rest)
    } else {
        (false, value)
    }
}

fn parse_integer(value: &str) -> Option<i64> {
    let (negative, body) = split_sign(value);
    if body.is_empty() || body.starts_with('_') {
        return None;
    }
    let digits: String = body.chars().filter(|c| *c != '_').collect();

    let magnitude = if let Some(hex) = digits.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = digits.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        // YAML 1.1 octal: leading zero
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else if digits.chars().all(|c| c.is_ascii_digit()) && !digits.is_empty() {
        digits.parse::<i64>().ok()?
    } else {
        return None;
    };

    Some(if negative { -magnitude } else { magnitude })
}

fn parse_float(value: &str) -> Option<f64> {
    let (negative, body) = split_sign(value);
    match body {
        ".inf" | ".Inf" | ".INF" => {
            return Some(if negative {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            });
        }
        ".nan" | ".NaN" | ".NAN" if body.len() == value.len() => return Some(f64::NAN),
        _ => {}
    }

    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '.' | '_' | 'e' | 'E' | '+' | '-');
    if !body.contains('.') || !body.chars().any(|c| c.is_ascii_digit()) || !body.chars().all(allowed)
    {
        return None;
    }
    let cleaned: String = body.chars().filter(|c| *c != '_').collect();
    let parsed = cleaned.parse::<f64>().ok()?;
    Some(if negative { -parsed } else { parsed })
}
