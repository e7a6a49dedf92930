//! ASCII-table TFORM parsing.

use crate::error::Result;

use super::{invalid, parse_count, split_digits};

/// The format code for an ASCII table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsciiType {
    /// `Aw` -- character string.
    Character,
    /// `Iw` -- integer.
    Integer,
    /// `Fw.d` -- fixed-point decimal.
    FloatF,
    /// `Ew.d` -- single-precision exponential.
    FloatE,
    /// `Dw.d` -- double-precision exponential.
    DoubleD,
}

impl AsciiType {
    pub fn code(self) -> char {
        match self {
            AsciiType::Character => 'A',
            AsciiType::Integer => 'I',
            AsciiType::FloatF => 'F',
            AsciiType::FloatE => 'E',
            AsciiType::DoubleD => 'D',
        }
    }
}

/// A parsed ASCII TFORMn value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiFormat {
    pub kind: AsciiType,
    pub width: usize,
    /// Digits after the decimal point, for `F`, `E` and `D`.
    pub decimals: Option<usize>,
}

/// Parse a TFORMn value such as `A20`, `I10`, `F12.4`, `E15.7` or `D25.17`.
pub fn parse(tform: &str) -> Result<AsciiFormat> {
    let s = tform.trim();
    let mut chars = s.chars();
    let kind = match chars.next() {
        Some('A') => AsciiType::Character,
        Some('I') => AsciiType::Integer,
        Some('F') => AsciiType::FloatF,
        Some('E') => AsciiType::FloatE,
        Some('D') => AsciiType::DoubleD,
        _ => return Err(invalid(tform)),
    };

    let (digits, rest) = split_digits(chars.as_str());
    if digits.is_empty() {
        return Err(invalid(tform));
    }
    let width = parse_count(digits, tform)?;

    let decimals = match rest.strip_prefix('.') {
        Some(d) if !matches!(kind, AsciiType::Character | AsciiType::Integer) => {
            Some(parse_count(d, tform)?)
        }
        None if rest.is_empty() => None,
        _ => return Err(invalid(tform)),
    };

    Ok(AsciiFormat {
        kind,
        width,
        decimals,
    })
}

pub fn type_code(tform: &str) -> Result<char> {
    Ok(parse(tform)?.kind.code())
}

/// Field width: the digits between the type code and the first `.`.
pub fn column_size(tform: &str) -> Result<usize> {
    Ok(parse(tform)?.width)
}
