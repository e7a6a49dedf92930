//! ASCII table HDU reading.
//!
//! Fields are fixed-width text. Numbers are trimmed and parsed; `D`
//! exponents are accepted wherever a float is expected.

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Deref;

use tracing::debug;

use crate::column::{Column, TableKind};
use crate::error::{Error, Result};
use crate::header::Header;
use crate::io::{Read, Seek};
use crate::options::{BlankPolicy, ReadOptions};
use crate::table::{physical_values, ColumnData, TableExtension};
use crate::tform::ascii::{AsciiFormat, AsciiType};
use crate::value::parse_float_str;

/// A `TABLE` extension.
#[derive(Debug, Clone, PartialEq)]
pub struct AsciiTable {
    table: TableExtension,
    blank_fields: BlankPolicy,
}

impl Deref for AsciiTable {
    type Target = TableExtension;

    fn deref(&self) -> &TableExtension {
        &self.table
    }
}

impl AsciiTable {
    /// Read the data unit described by `header` at the stream's current
    /// position.
    pub fn read<R: Read + Seek + ?Sized>(
        reader: &mut R,
        header: &Header,
        options: &ReadOptions,
    ) -> Result<Self> {
        let table = TableExtension::read(reader, header, TableKind::Ascii, options)?;
        Ok(AsciiTable {
            table,
            blank_fields: options.blank_fields,
        })
    }

    /// Decode the column whose TTYPE is `name`.
    ///
    /// `A` gives [`ColumnData::Text`], `I` gives [`ColumnData::Int64`],
    /// `F` and `E` give [`ColumnData::Float32`], `D` gives
    /// [`ColumnData::Float64`].
    pub fn get_column(&self, name: &str) -> Result<ColumnData> {
        self.decode(self.column(name)?)
    }

    /// Decode the column at 0-based position `index`.
    pub fn get_column_at(&self, index: usize) -> Result<ColumnData> {
        self.decode(self.column_at(index)?)
    }

    /// `TSCALn * raw + TZEROn` for a numeric column.
    pub fn get_physical_column(&self, name: &str) -> Result<Vec<f64>> {
        let column = self.column(name)?;
        physical_values(column, &self.decode(column)?)
    }

    fn decode(&self, column: &Column) -> Result<ColumnData> {
        let format: &AsciiFormat = column
            .ascii_format()
            .ok_or_else(|| Error::InvalidColumnFormat(column.tform.clone()))?;
        let fields = self.fields(column).map(|f| String::from_utf8_lossy(f));
        let parser = FieldParser {
            column,
            blank: self.blank_fields,
        };

        let data = match format.kind {
            AsciiType::Character => {
                ColumnData::Text(fields.map(|f| String::from(f.trim())).collect())
            }
            AsciiType::Integer => ColumnData::Int64(
                fields
                    .map(|f| parser.parse(&f, 0, |s| s.parse::<i64>().ok()))
                    .collect::<Result<_>>()?,
            ),
            AsciiType::FloatF | AsciiType::FloatE => ColumnData::Float32(
                fields
                    .map(|f| parser.parse(&f, f32::NAN, |s| parse_float_str(s).map(|v| v as f32)))
                    .collect::<Result<_>>()?,
            ),
            AsciiType::DoubleD => ColumnData::Float64(
                fields
                    .map(|f| parser.parse(&f, f64::NAN, parse_float_str))
                    .collect::<Result<_>>()?,
            ),
        };

        debug!(
            column = %column.label(),
            tform = %column.tform,
            rows = data.len(),
            "decoded ASCII column"
        );
        Ok(data)
    }
}

struct FieldParser<'a> {
    column: &'a Column,
    blank: BlankPolicy,
}

impl FieldParser<'_> {
    fn parse<T>(&self, field: &str, sentinel: T, parse: impl Fn(&str) -> Option<T>) -> Result<T> {
        let text = field.trim();
        if text.is_empty() && self.blank == BlankPolicy::Sentinel {
            return Ok(sentinel);
        }
        parse(text).ok_or_else(|| Error::Parse {
            column: self.column.label(),
            text: String::from(text),
        })
    }
}
