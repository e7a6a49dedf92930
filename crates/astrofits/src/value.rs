//! Header value grammar: parsing the 70-byte value field of a card, rendering
//! a value back into that field, and converting values to Rust types.

use alloc::format;
use alloc::string::String;
use core::str;

/// A parsed FITS header value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// FITS logical value (`T` or `F`).
    Logical(bool),
    /// FITS integer value.
    Integer(i64),
    /// FITS floating-point value.
    Float(f64),
    /// FITS character string (content between single quotes).
    String(String),
    /// FITS complex integer `(real, imaginary)`.
    ComplexInt(i64, i64),
    /// FITS complex float `(real, imaginary)`.
    ComplexFloat(f64, f64),
    /// Value text matching none of the literal forms, kept verbatim.
    Raw(String),
}

impl Value {
    /// Short description of the variant, used in type-mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Logical(_) => "a logical",
            Value::Integer(_) => "an integer",
            Value::Float(_) => "a float",
            Value::String(_) => "a string",
            Value::ComplexInt(_, _) => "a complex integer",
            Value::ComplexFloat(_, _) => "a complex float",
            Value::Raw(_) => "unparsed text",
        }
    }
}

// ── Parsing ──

/// Text after the first `/`, trimmed, or `None` when empty.
fn comment_text(bytes: &[u8]) -> Option<&str> {
    str::from_utf8(bytes)
        .ok()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Split a non-string value field at the comment separator.
///
/// Writers disagree on whether the slash is surrounded by blanks
/// (`-32 /No. of bits` and `-32/bits` both occur), and no numeric or
/// logical literal contains a slash, so the first `/` is the separator.
fn split_comment(field: &[u8]) -> (&[u8], Option<&str>) {
    match field.iter().position(|&b| b == b'/') {
        Some(i) => (&field[..i], comment_text(&field[i + 1..])),
        None => (field, None),
    }
}

/// Parse a quoted string starting at `field[0] == '\''`.
///
/// Doubled quotes are a literal quote; trailing blanks inside the quotes are
/// not significant. An unterminated string takes everything to the end of
/// the field.
fn parse_string(field: &[u8]) -> (Value, Option<&str>) {
    let mut value = String::new();
    let mut i = 1;
    let len = field.len();

    while i < len {
        if field[i] == b'\'' {
            if i + 1 < len && field[i + 1] == b'\'' {
                value.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            break;
        }
        value.push(field[i] as char);
        i += 1;
    }

    let trimmed_len = value.trim_end().len();
    value.truncate(trimmed_len);

    let rest = &field[i.min(len)..];
    let comment = rest
        .iter()
        .position(|&b| b == b'/')
        .and_then(|p| comment_text(&rest[p + 1..]));

    (Value::String(value), comment)
}

/// Try to parse a complex value `(real, imag)`.
fn parse_complex(text: &str) -> Option<Value> {
    let inner = text.strip_prefix('(')?.strip_suffix(')')?;
    let (left, right) = inner.split_once(',')?;
    let (left, right) = (left.trim(), right.trim());

    if !looks_like_float(left) && !looks_like_float(right) {
        if let (Ok(re), Ok(im)) = (left.parse::<i64>(), right.parse::<i64>()) {
            return Some(Value::ComplexInt(re, im));
        }
    }

    Some(Value::ComplexFloat(
        parse_float_str(left)?,
        parse_float_str(right)?,
    ))
}

fn looks_like_float(s: &str) -> bool {
    s.bytes().any(|b| matches!(b, b'.' | b'E' | b'e' | b'D' | b'd'))
}

/// Parse a float literal, accepting the Fortran `D` exponent marker.
pub fn parse_float_str(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.bytes().any(|b| b == b'D' || b == b'd') {
        let normalized: String = s
            .chars()
            .map(|c| match c {
                'D' => 'E',
                'd' => 'e',
                other => other,
            })
            .collect();
        normalized.parse::<f64>().ok()
    } else {
        s.parse::<f64>().ok()
    }
}

/// Parse a FITS header value from the value field of a card (bytes 10..80).
///
/// Returns the parsed [`Value`] and the comment, if any. `None` means the
/// field holds no value (blank, or only a comment). The caller checks for the
/// `= ` value indicator before calling this.
pub fn parse_value(value_bytes: &[u8]) -> Option<(Value, Option<&str>)> {
    let start = value_bytes.iter().position(|&b| b != b' ')?;
    let field = &value_bytes[start..];

    if field[0] == b'\'' {
        return Some(parse_string(field));
    }

    let (val_part, comment) = split_comment(field);
    let val_text = str::from_utf8(val_part).ok()?.trim();
    if val_text.is_empty() {
        return None;
    }

    let value = match val_text {
        "T" => Value::Logical(true),
        "F" => Value::Logical(false),
        t if t.starts_with('(') => parse_complex(t)?,
        t if !looks_like_float(t) => match t.parse::<i64>() {
            Ok(n) => Value::Integer(n),
            Err(_) => Value::Float(parse_float_str(t)?),
        },
        t => Value::Float(parse_float_str(t)?),
    };
    Some((value, comment))
}

// ── Formatting ──

/// Render a [`Value`] into a 70-byte field for bytes 10..80 of a card.
///
/// Numbers and logicals are right-justified in the first 20 bytes (card
/// columns 11-30). Strings start with a quote in the first byte and are
/// padded to at least 8 characters.
pub fn format_value(value: &Value) -> [u8; 70] {
    let mut buf = [b' '; 70];

    match value {
        Value::Logical(b) => {
            buf[19] = if *b { b'T' } else { b'F' };
        }
        Value::Integer(n) => {
            right_justify(format!("{n}").as_bytes(), &mut buf[..20]);
        }
        Value::Float(f) => {
            let s = format_float(*f, 70);
            right_justify(s.as_bytes(), &mut buf[..s.len().max(20)]);
        }
        Value::String(s) => write_string(s, &mut buf),
        Value::ComplexInt(re, im) => {
            right_justify(format!("({re}, {im})").as_bytes(), &mut buf[..30]);
        }
        Value::ComplexFloat(re, im) => {
            let s = format!("({}, {})", format_float(*re, 32), format_float(*im, 32));
            right_justify(s.as_bytes(), &mut buf[..s.len().max(20)]);
        }
        Value::Raw(text) => {
            let bytes = text.as_bytes();
            right_justify(bytes, &mut buf[..bytes.len().clamp(20, 70)]);
        }
    }

    buf
}

fn right_justify(src: &[u8], dest: &mut [u8]) {
    let len = src.len().min(dest.len());
    let start = dest.len() - len;
    dest[start..].copy_from_slice(&src[..len]);
}

/// Shortest exponent form of `f` that parses back to the same bits, or the
/// highest fixed precision that fits in `max_len` characters.
fn format_float(f: f64, max_len: usize) -> String {
    if f == 0.0 {
        return String::from("0.0");
    }
    let shortest = format!("{f:E}");
    if shortest.len() <= max_len {
        return shortest;
    }
    let mut precision = 15usize;
    loop {
        let s = format!("{:.prec$E}", f, prec = precision);
        if s.len() <= max_len || precision == 0 {
            return s;
        }
        precision -= 1;
    }
}

fn write_string(s: &str, buf: &mut [u8; 70]) {
    buf[0] = b'\'';
    let mut pos = 1;
    for b in s.bytes() {
        // index 69 is reserved for the closing quote
        let needed = if b == b'\'' { 2 } else { 1 };
        if pos + needed > 69 {
            break;
        }
        buf[pos] = b;
        if b == b'\'' {
            buf[pos + 1] = b'\'';
        }
        pos += needed;
    }
    buf[pos.max(9)] = b'\'';
}

// ── Conversion ──

/// Types a header value can be read as.
pub trait FromValue: Sized {
    /// Description used in [`Error::TypeMismatch`](crate::Error::TypeMismatch).
    const EXPECTED: &'static str;

    /// Convert `value`, or `None` if the variant (or its range) does not fit.
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    const EXPECTED: &'static str = "a logical";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Logical(b) => Some(*b),
            _ => None,
        }
    }
}

macro_rules! integer_from_value {
    ($($t:ty),*) => {$(
        impl FromValue for $t {
            const EXPECTED: &'static str = "an integer";

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Integer(n) => <$t>::try_from(*n).ok(),
                    _ => None,
                }
            }
        }
    )*};
}

integer_from_value!(i64, i32, i16, u8, u64, usize);

impl FromValue for f64 {
    const EXPECTED: &'static str = "a number";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    const EXPECTED: &'static str = "a number";

    fn from_value(value: &Value) -> Option<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "a string";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}
