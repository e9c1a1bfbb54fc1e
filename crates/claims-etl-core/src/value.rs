//! Cell values for raw and curated tables
//!
//! Bronze tables arrive with every field stored as text. Cells are carried as
//! a tagged [`Value`] and converted with explicit, total coercions: every
//! conversion either yields the typed value or `None`. Nothing here panics on
//! bad input; the validator turns a `None` into a structured violation.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Layouts accepted for timestamps that carry a UTC offset
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

/// Layouts accepted for naive timestamps
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A single table cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Null, absent, or blank
    #[default]
    Missing,
    /// Free text, including raw values not yet coerced
    Text(String),
    /// Whole number
    Integer(i64),
    /// Fixed-point number (money, costs)
    Number(Decimal),
    /// Date and time without zone; offsets are normalized to UTC on parse
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    /// Create a value from a nullable raw field
    pub fn from_raw(raw: Option<String>) -> Self {
        match raw {
            Some(text) => Value::Text(text),
            None => Value::Missing,
        }
    }

    /// Whether the cell counts as null. Blank text is null, as in the raw exports.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Borrow non-blank text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        }
    }

    /// Coerce to text; typed values are rendered canonically
    pub fn to_text(&self) -> Option<String> {
        if self.is_missing() {
            return None;
        }
        match self {
            Value::Text(text) => Some(text.clone()),
            other => other.render(),
        }
    }

    /// Coerce to a whole number. Integral decimals such as `24.0` are accepted.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Number(d) => integral(*d),
            Value::Text(text) => {
                let trimmed = text.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| parse_decimal(trimmed).and_then(integral))
            }
            Value::Missing | Value::Timestamp(_) => None,
        }
    }

    /// Coerce to a fixed-point number
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Integer(i) => Some(Decimal::from(*i)),
            Value::Number(d) => Some(*d),
            Value::Text(text) => parse_decimal(text),
            Value::Missing | Value::Timestamp(_) => None,
        }
    }

    /// Coerce to a fixed-point number, substituting zero for anything non-numeric
    pub fn to_decimal_or_zero(&self) -> Decimal {
        self.to_decimal().unwrap_or(Decimal::ZERO)
    }

    /// Coerce to a timestamp
    pub fn to_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            Value::Text(text) => parse_timestamp(text),
            _ => None,
        }
    }

    /// Canonical text form used for storage and fingerprints; `None` for null
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            Value::Text(text) => Some(text.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Number(d) => Some(d.normalize().to_string()),
            Value::Timestamp(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        }
    }

    /// Short name of the variant, for messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Some(text) => write!(f, "{}", text),
            None => write!(f, "<missing>"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Number(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Missing)
    }
}

/// Parse plain or scientific decimal notation
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .ok()
        .or_else(|| Decimal::from_scientific(trimmed).ok())
}

/// Parse the timestamp layouts produced by the raw exports and by PostgreSQL
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.naive_utc());
    }

    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(trimmed, format) {
            return Some(ts.naive_utc());
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(ts);
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn integral(value: Decimal) -> Option<i64> {
    if value.fract().is_zero() {
        value.to_i64()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_blank_text_is_missing() {
        assert!(Value::Missing.is_missing());
        assert!(Value::text("   ").is_missing());
        assert!(!Value::text("x").is_missing());
        assert!(!Value::Integer(0).is_missing());
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(Value::text("24").to_integer(), Some(24));
        assert_eq!(Value::text(" 24.0 ").to_integer(), Some(24));
        assert_eq!(Value::text("24.5").to_integer(), None);
        assert_eq!(Value::text("abc").to_integer(), None);
        assert_eq!(Value::Missing.to_integer(), None);
    }

    #[test]
    fn test_decimal_coercion() {
        assert_eq!(
            Value::text("120.50").to_decimal(),
            Some(Decimal::from_str("120.50").unwrap())
        );
        assert_eq!(Value::text("1e2").to_decimal(), Some(Decimal::from(100)));
        assert_eq!(Value::text("n/a").to_decimal_or_zero(), Decimal::ZERO);
        assert_eq!(Value::Integer(7).to_decimal(), Some(Decimal::from(7)));
    }

    #[test]
    fn test_timestamp_layouts() {
        assert_eq!(parse_timestamp("2024-01-10"), Some(ts("2024-01-10 00:00:00")));
        assert_eq!(
            parse_timestamp("2011-02-27T22:37:41Z"),
            Some(ts("2011-02-27 22:37:41"))
        );
        assert_eq!(
            parse_timestamp("2011-02-27 22:37:41+00"),
            Some(ts("2011-02-27 22:37:41"))
        );
        assert_eq!(
            parse_timestamp("2011-02-27T23:37:41+01:00"),
            Some(ts("2011-02-27 22:37:41"))
        );
        assert_eq!(
            parse_timestamp("2011-02-27 22:37:41"),
            Some(ts("2011-02-27 22:37:41"))
        );
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_render_is_canonical() {
        assert_eq!(Value::Number(Decimal::from_str("1.50").unwrap()).render().unwrap(), "1.5");
        assert_eq!(
            Value::Timestamp(ts("2024-01-01 00:00:00")).render().unwrap(),
            "2024-01-01 00:00:00"
        );
        assert_eq!(Value::Missing.render(), None);
        assert_eq!(Value::Missing.to_string(), "<missing>");
    }

    #[test]
    fn test_typed_values_render_to_text() {
        assert_eq!(Value::Integer(5).to_text().as_deref(), Some("5"));
        assert_eq!(Value::text("").to_text(), None);
    }
}
