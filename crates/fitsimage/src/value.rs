//! Header value codec for the 70-byte value/comment field of a card.

use std::fmt;
use std::str;

use crate::error::{Error, Result};

/// Width of the value/comment field (card columns 11-80).
pub const VALUE_FIELD_LEN: usize = 70;

/// Fixed-format values are right-justified so they end in card column 30.
const FIXED_FORMAT_WIDTH: usize = 20;

/// Number of decimals written for [`Value::FixedFloat`].
pub const FIXED_DECIMALS: usize = 6;

/// A header keyword value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// FITS logical (`T` / `F`).
    Logical(bool),
    /// FITS integer.
    Integer(i64),
    /// FITS real, written in the shortest form that round-trips.
    Float(f64),
    /// Real written in fixed notation with [`FIXED_DECIMALS`] decimals and no
    /// exponent. Parsing never produces this variant.
    FixedFloat(f64),
    /// Character string, trailing blanks removed.
    String(String),
    /// Complex integer `(re, im)`.
    ComplexInt(i64, i64),
    /// Complex real `(re, im)`.
    ComplexFloat(f64, f64),
}

impl Value {
    /// Short name of the value kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Logical(_) => "a logical",
            Value::Integer(_) => "an integer",
            Value::Float(_) | Value::FixedFloat(_) => "a float",
            Value::String(_) => "a string",
            Value::ComplexInt(..) | Value::ComplexFloat(..) => "a complex number",
        }
    }

    /// The value as `f64` if it is numeric and real.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Integer(n) => Some(n as f64),
            Value::Float(f) | Value::FixedFloat(f) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Logical(b) => write!(f, "{}", if *b { "T" } else { "F" }),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::FixedFloat(x) => write!(f, "{x:.prec$}", prec = FIXED_DECIMALS),
            Value::String(s) => write!(f, "{s}"),
            Value::ComplexInt(re, im) => write!(f, "({re}, {im})"),
            Value::ComplexFloat(re, im) => write!(f, "({re}, {im})"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Logical(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

// ── Parsing ──

/// Parse the value field of a card (bytes 10..80).
///
/// Returns the value and the comment, if any. `None` means the field holds
/// no value (an undefined keyword), though it may still carry a comment,
/// which [`parse_comment_only`] extracts.
pub fn parse_value(field: &[u8]) -> Option<(Value, Option<String>)> {
    let start = field.iter().position(|&b| b != b' ')?;
    let field = &field[start..];

    if field[0] == b'\'' {
        let (text, rest) = parse_quoted(field);
        return Some((Value::String(text), comment_after(rest)));
    }

    let (value_part, rest) = match field.iter().position(|&b| b == b'/') {
        Some(slash) => (&field[..slash], Some(&field[slash..])),
        None => (field, None),
    };
    let text = str::from_utf8(value_part).ok()?.trim();
    let value = parse_unquoted(text)?;
    Some((value, rest.and_then(comment_after)))
}

/// Extract the comment from a value field that carries no value.
pub fn parse_comment_only(field: &[u8]) -> Option<String> {
    let slash = field.iter().position(|&b| b == b'/')?;
    comment_after(&field[slash..])
}

/// Read a quoted string starting at `field[0] == '\''`.
///
/// Returns the unescaped, right-trimmed text and the bytes after the
/// closing quote. An unterminated string takes the rest of the field.
fn parse_quoted(field: &[u8]) -> (String, &[u8]) {
    let mut text = String::new();
    let mut i = 1;
    while i < field.len() {
        if field[i] == b'\'' {
            if field.get(i + 1) == Some(&b'\'') {
                text.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            let trimmed = text.trim_end().to_string();
            return (trimmed, &field[i..]);
        }
        text.push(field[i] as char);
        i += 1;
    }
    (text.trim_end().to_string(), &[])
}

/// Comment text following the first `/` in `rest`, trimmed.
fn comment_after(rest: &[u8]) -> Option<String> {
    let slash = rest.iter().position(|&b| b == b'/')?;
    let text = String::from_utf8_lossy(&rest[slash + 1..]);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn parse_unquoted(text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    match text {
        "T" => return Some(Value::Logical(true)),
        "F" => return Some(Value::Logical(false)),
        _ => {}
    }
    if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        return parse_complex(inner);
    }
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::Integer(n));
    }
    parse_real(text).map(Value::Float)
}

fn parse_complex(inner: &str) -> Option<Value> {
    let (re, im) = inner.split_once(',')?;
    let (re, im) = (re.trim(), im.trim());
    if let (Ok(a), Ok(b)) = (re.parse::<i64>(), im.parse::<i64>()) {
        return Some(Value::ComplexInt(a, b));
    }
    Some(Value::ComplexFloat(parse_real(re)?, parse_real(im)?))
}

/// Parse a real number, accepting the Fortran `D` exponent marker.
fn parse_real(text: &str) -> Option<f64> {
    text.replace(['D', 'd'], "E").parse::<f64>().ok()
}

// ── Formatting ──

/// Check that `text` uses only printable ASCII, as header text must.
pub fn check_text(text: &str) -> Result<()> {
    match text.bytes().find(|b| !(0x20..=0x7e).contains(b)) {
        Some(b) => Err(Error::Write(format!(
            "'{text}' contains byte 0x{b:02X}; header text must be printable ASCII"
        ))),
        None => Ok(()),
    }
}

/// Check that `value` fits a value field and reads back as written.
pub fn check_value(value: &Value) -> Result<()> {
    let finite = match *value {
        Value::String(ref s) => {
            check_text(s)?;
            true
        }
        Value::Float(x) | Value::FixedFloat(x) => x.is_finite(),
        Value::ComplexFloat(re, im) => re.is_finite() && im.is_finite(),
        _ => true,
    };
    if !finite {
        return Err(Error::Write(format!("{value} is not a valid header value")));
    }
    let len = render(value).len();
    if len > VALUE_FIELD_LEN {
        return Err(Error::Write(format!(
            "{} value needs {len} columns but a card has {VALUE_FIELD_LEN}",
            value.kind_name()
        )));
    }
    Ok(())
}

/// Value text as it appears in the card, before justification.
fn render(value: &Value) -> Vec<u8> {
    let text = match value {
        Value::String(s) => return quote_string(s),
        Value::Logical(b) => String::from(if *b { "T" } else { "F" }),
        Value::Integer(n) => n.to_string(),
        Value::Float(x) => format_real(*x),
        Value::FixedFloat(x) => format!("{x:.prec$}", prec = FIXED_DECIMALS),
        Value::ComplexInt(re, im) => format!("({re}, {im})"),
        Value::ComplexFloat(re, im) => format!("({}, {})", format_real(*re), format_real(*im)),
    };
    text.into_bytes()
}

/// Render a value into a 70-byte field (card columns 11-80).
///
/// Numbers and logicals are right-justified to column 30; strings start in
/// column 11 with their opening quote. Values rejected by [`check_value`]
/// are cut at the field end.
pub fn format_value(value: &Value) -> [u8; VALUE_FIELD_LEN] {
    let mut field = [b' '; VALUE_FIELD_LEN];
    let bytes = render(value);
    let len = bytes.len().min(VALUE_FIELD_LEN);
    let start = match value {
        Value::String(_) => 0,
        _ => FIXED_FORMAT_WIDTH.saturating_sub(len),
    };
    field[start..start + len].copy_from_slice(&bytes[..len]);
    field
}

/// Shortest decimal text that round-trips, always with a `.` or exponent.
fn format_real(x: f64) -> String {
    let plain = x.to_string();
    if plain.len() <= FIXED_FORMAT_WIDTH {
        if plain.contains(['.', 'e', 'E']) || !x.is_finite() {
            return plain;
        }
        if plain.len() + 2 <= FIXED_FORMAT_WIDTH {
            return plain + ".0";
        }
    }
    let exp = format!("{x:E}");
    if exp.len() <= FIXED_FORMAT_WIDTH {
        return exp;
    }
    let mut precision = 15;
    loop {
        let s = format!("{x:.precision$E}");
        if s.len() <= FIXED_FORMAT_WIDTH || precision == 0 {
            return s;
        }
        precision -= 1;
    }
}

/// Quote a string value, doubling embedded quotes and padding the content
/// to at least eight characters.
fn quote_string(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() + 10);
    out.push(b'\'');
    for b in s.bytes() {
        out.push(b);
        if b == b'\'' {
            out.push(b'\'');
        }
    }
    while out.len() < 9 {
        out.push(b' ');
    }
    out.push(b'\'');
    out
}
