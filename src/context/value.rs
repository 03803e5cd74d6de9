//! Attribute values and their comparison semantics
//!
//! `>` and `<` compare numerically after coercing both sides with
//! [`to_number`]; `=` compares the raw value against the rule's literal text
//! with no coercion at all. A number therefore never equals a rule literal,
//! even when the digits match.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid decimal pattern")
});

/// Value of one attribute in a data context
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    /// Attribute absent from the context
    #[default]
    Missing,
}

impl Value {
    /// Numeric view used by `>` and `<`
    ///
    /// Text goes through [`to_number`]; a missing value is NaN, so every
    /// ordering comparison against it is false.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Text(text) => to_number(text),
            Value::Missing => f64::NAN,
        }
    }

    /// Strict equality against a rule literal: only text with identical
    /// characters matches
    pub fn strictly_equals(&self, literal: &str) -> bool {
        matches!(self, Value::Text(text) if text == literal)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

/// Convert text to a number the way rule literals are read.
///
/// - surrounding whitespace is ignored, and blank text is `0`
/// - decimal notation with optional sign, fraction and exponent (`-1.5e3`)
/// - `0x`, `0o` and `0b` prefixed integers
/// - `Infinity`, `+Infinity`, `-Infinity`
///
/// Anything else is NaN.
pub fn to_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return parse_radix(digits, radix);
        }
    }

    if DECIMAL.is_match(trimmed) {
        trimmed.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

fn parse_radix(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
    })
    .unwrap_or(f64::NAN)
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

/// JSON mapping: numbers and strings carry over; booleans become 1/0 for
/// ordering (and never equal a literal); null, arrays and objects are
/// treated as missing.
///
/// Null deliberately does not read as 0, so `manager > '-1'` and
/// `manager < 5` are both false when `manager` is null.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Missing, Value::Number),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Bool(b) => Value::Number(if b { 1.0 } else { 0.0 }),
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => Value::Missing,
        }
    }
}
