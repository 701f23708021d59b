//! Typed keyword access: the Rust-side conversions and the textual type tags
//! (`STRING`, `BOOLEAN`, `INT`, `DOUBLE`, `FIXDOUBLE`) used on command lines.

use std::fmt;
use std::str::FromStr;

use crate::value::Value;

/// A header value with its optional comment.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordValue<T> {
    pub value: T,
    pub comment: Option<String>,
}

/// Types a header value can be read as.
pub trait FromValue: Sized {
    /// Article-prefixed type name for diagnostics, e.g. "an integer".
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "an integer";

    fn from_value(value: &Value) -> Option<Self> {
        match *value {
            Value::Integer(n) => Some(n),
            Value::Float(f) | Value::FixedFloat(f)
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 =>
            {
                Some(f as i64)
            }
            _ => None,
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "a number";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "a logical";

    fn from_value(value: &Value) -> Option<Self> {
        match *value {
            Value::Logical(b) => Some(b),
            _ => None,
        }
    }
}

/// Any value reads as its display text.
impl FromValue for String {
    const EXPECTED: &'static str = "a string";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Keyword value type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    String,
    Boolean,
    Int,
    Double,
    /// Double written in fixed notation with six decimals.
    FixDouble,
}

impl KeyType {
    pub const ALL: [KeyType; 5] = [
        KeyType::String,
        KeyType::Boolean,
        KeyType::Int,
        KeyType::Double,
        KeyType::FixDouble,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            KeyType::String => "STRING",
            KeyType::Boolean => "BOOLEAN",
            KeyType::Int => "INT",
            KeyType::Double => "DOUBLE",
            KeyType::FixDouble => "FIXDOUBLE",
        }
    }

    /// Parse command-line text into a header value of this type.
    pub fn parse_value(self, text: &str) -> Result<Value, String> {
        match self {
            KeyType::String => Ok(Value::String(text.to_string())),
            KeyType::Boolean => match text.trim() {
                "TRUE" | "True" | "true" | "T" => Ok(Value::Logical(true)),
                "FALSE" | "False" | "false" | "F" => Ok(Value::Logical(false)),
                other => Err(format!("'{other}' is not a boolean (use TRUE/T or FALSE/F)")),
            },
            KeyType::Int => text
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| format!("'{text}' is not an integer")),
            KeyType::Double | KeyType::FixDouble => {
                let x = text
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|x| x.is_finite())
                    .ok_or_else(|| format!("'{text}' is not a finite number"))?;
                Ok(match self {
                    KeyType::FixDouble => Value::FixedFloat(x),
                    _ => Value::Float(x),
                })
            }
        }
    }

    /// Coerce a stored value to this type, or `None` if it cannot be.
    pub fn coerce(self, value: &Value) -> Option<Value> {
        match self {
            KeyType::String => String::from_value(value).map(Value::String),
            KeyType::Boolean => bool::from_value(value).map(Value::Logical),
            KeyType::Int => i64::from_value(value).map(Value::Integer),
            KeyType::Double => f64::from_value(value).map(Value::Float),
            KeyType::FixDouble => f64::from_value(value).map(Value::FixedFloat),
        }
    }

    pub fn expected(self) -> &'static str {
        match self {
            KeyType::String => String::EXPECTED,
            KeyType::Boolean => bool::EXPECTED,
            KeyType::Int => i64::EXPECTED,
            KeyType::Double | KeyType::FixDouble => f64::EXPECTED,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for KeyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyType::ALL
            .into_iter()
            .find(|t| t.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown keyword type '{s}' (expected STRING, BOOLEAN, INT, DOUBLE or FIXDOUBLE)")
            })
    }
}
