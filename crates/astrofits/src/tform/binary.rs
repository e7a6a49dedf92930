//! Binary-table TFORM parsing.

use crate::error::Result;

use super::{invalid, parse_count, split_digits};

/// The data type of a binary table field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryType {
    /// L -- logical, one byte (`T`/`F`/0).
    Logical,
    /// X -- bit array, packed eight to a byte.
    Bit,
    /// B -- unsigned byte.
    Byte,
    /// I -- 16-bit signed integer.
    Short,
    /// J -- 32-bit signed integer.
    Int,
    /// K -- 64-bit signed integer.
    Long,
    /// A -- ASCII character.
    Ascii,
    /// E -- 32-bit IEEE float.
    Float,
    /// D -- 64-bit IEEE float.
    Double,
    /// C -- pair of 32-bit IEEE floats.
    ComplexFloat,
    /// M -- pair of 64-bit IEEE floats.
    ComplexDouble,
    /// P -- variable-length array descriptor (element count, heap offset).
    Descriptor,
}

impl BinaryType {
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'L' => BinaryType::Logical,
            'X' => BinaryType::Bit,
            'B' => BinaryType::Byte,
            'I' => BinaryType::Short,
            'J' => BinaryType::Int,
            'K' => BinaryType::Long,
            'A' => BinaryType::Ascii,
            'E' => BinaryType::Float,
            'D' => BinaryType::Double,
            'C' => BinaryType::ComplexFloat,
            'M' => BinaryType::ComplexDouble,
            'P' => BinaryType::Descriptor,
            _ => return None,
        })
    }

    pub fn code(self) -> char {
        match self {
            BinaryType::Logical => 'L',
            BinaryType::Bit => 'X',
            BinaryType::Byte => 'B',
            BinaryType::Short => 'I',
            BinaryType::Int => 'J',
            BinaryType::Long => 'K',
            BinaryType::Ascii => 'A',
            BinaryType::Float => 'E',
            BinaryType::Double => 'D',
            BinaryType::ComplexFloat => 'C',
            BinaryType::ComplexDouble => 'M',
            BinaryType::Descriptor => 'P',
        }
    }

    /// Bytes per stored element. A bit array is stored in whole bytes, so
    /// `X` reports 1 here and [`BinaryFormat::width`] packs the bits.
    pub fn size(self) -> usize {
        match self {
            BinaryType::Logical | BinaryType::Bit | BinaryType::Byte | BinaryType::Ascii => 1,
            BinaryType::Short => 2,
            BinaryType::Int | BinaryType::Float => 4,
            BinaryType::Long
            | BinaryType::Double
            | BinaryType::ComplexFloat
            | BinaryType::Descriptor => 8,
            BinaryType::ComplexDouble => 16,
        }
    }
}

/// A parsed binary TFORMn value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryFormat {
    pub repeat: usize,
    pub kind: BinaryType,
    /// Heap element type of a `P` descriptor, e.g. `E` in `1PE(200)`.
    pub element: Option<BinaryType>,
    /// Maximum heap array length of a `P` descriptor, when given.
    pub max_len: Option<usize>,
}

impl BinaryFormat {
    /// Bytes the field occupies in every row.
    pub fn width(&self) -> usize {
        field_width(self.repeat, self.kind).unwrap_or(usize::MAX)
    }
}

fn field_width(repeat: usize, kind: BinaryType) -> Option<usize> {
    match kind {
        BinaryType::Bit => Some(repeat.div_ceil(8)),
        kind => repeat.checked_mul(kind.size()),
    }
}

/// Parse a TFORMn value like `1J`, `10E`, `20A`, `12X` or `1PB(200)`.
pub fn parse(tform: &str) -> Result<BinaryFormat> {
    let s = tform.trim();
    let (digits, rest) = split_digits(s);
    let repeat = if digits.is_empty() {
        1
    } else {
        parse_count(digits, tform)?
    };

    let mut chars = rest.chars();
    let kind = chars
        .next()
        .and_then(BinaryType::from_code)
        .ok_or_else(|| invalid(tform))?;
    if field_width(repeat, kind).is_none() {
        return Err(invalid(tform));
    }

    if kind != BinaryType::Descriptor {
        return Ok(BinaryFormat {
            repeat,
            kind,
            element: None,
            max_len: None,
        });
    }

    let element = chars
        .next()
        .and_then(BinaryType::from_code)
        .filter(|t| *t != BinaryType::Descriptor)
        .ok_or_else(|| invalid(tform))?;
    let tail = chars.as_str().trim();
    let max_len = match tail.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(n) => Some(parse_count(n.trim(), tform)?),
        None => None,
    };

    Ok(BinaryFormat {
        repeat,
        kind,
        element: Some(element),
        max_len,
    })
}

/// Bytes per element of the type named by `code`.
pub fn type_size(code: char) -> Result<usize> {
    BinaryType::from_code(code)
        .map(BinaryType::size)
        .ok_or_else(|| invalid(code.encode_utf8(&mut [0u8; 4])))
}

/// Repeat count of `tform`, 1 when omitted.
pub fn element_count(tform: &str) -> Result<usize> {
    Ok(parse(tform)?.repeat)
}

pub fn type_code(tform: &str) -> Result<char> {
    Ok(parse(tform)?.kind.code())
}

/// Total bytes of a field with format `tform`.
pub fn column_size(tform: &str) -> Result<usize> {
    Ok(parse(tform)?.width())
}
