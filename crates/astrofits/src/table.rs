//! Shared fixed-width table reading for ASCII and binary table HDUs.
//!
//! A [`TableExtension`] slurps the whole data unit once; the dialect
//! readers in [`crate::bintable`] and [`crate::asciitable`] slice fields out
//! of it on demand and return [`ColumnData`].

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use tracing::{debug, warn};

use crate::column::{parse_columns, Column, TableKind};
use crate::error::{Error, Result};
use crate::header::Header;
use crate::io::{ensure_remaining, Read, Seek};
use crate::options::ReadOptions;

/// A `P` field: element count and byte offset into the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Descriptor {
    pub count: u32,
    pub offset: u32,
}

/// One decoded column, one entry per row.
///
/// Scalar variants hold fields with a repeat count of 1; `*Array` variants
/// hold one `Vec` per row for every other repeat count.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Bool(Vec<bool>),
    BoolArray(Vec<Vec<bool>>),
    Byte(Vec<u8>),
    ByteArray(Vec<Vec<u8>>),
    Int16(Vec<i16>),
    Int16Array(Vec<Vec<i16>>),
    Int32(Vec<i32>),
    Int32Array(Vec<Vec<i32>>),
    Int64(Vec<i64>),
    Int64Array(Vec<Vec<i64>>),
    Float32(Vec<f32>),
    Float32Array(Vec<Vec<f32>>),
    Float64(Vec<f64>),
    Float64Array(Vec<Vec<f64>>),
    Complex32(Vec<(f32, f32)>),
    Complex32Array(Vec<Vec<(f32, f32)>>),
    Complex64(Vec<(f64, f64)>),
    Complex64Array(Vec<Vec<(f64, f64)>>),
    Descriptor(Vec<Descriptor>),
    DescriptorArray(Vec<Vec<Descriptor>>),
    Text(Vec<String>),
}

macro_rules! each_column {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ColumnData::Bool($v) => $body,
            ColumnData::BoolArray($v) => $body,
            ColumnData::Byte($v) => $body,
            ColumnData::ByteArray($v) => $body,
            ColumnData::Int16($v) => $body,
            ColumnData::Int16Array($v) => $body,
            ColumnData::Int32($v) => $body,
            ColumnData::Int32Array($v) => $body,
            ColumnData::Int64($v) => $body,
            ColumnData::Int64Array($v) => $body,
            ColumnData::Float32($v) => $body,
            ColumnData::Float32Array($v) => $body,
            ColumnData::Float64($v) => $body,
            ColumnData::Float64Array($v) => $body,
            ColumnData::Complex32($v) => $body,
            ColumnData::Complex32Array($v) => $body,
            ColumnData::Complex64($v) => $body,
            ColumnData::Complex64Array($v) => $body,
            ColumnData::Descriptor($v) => $body,
            ColumnData::DescriptorArray($v) => $body,
            ColumnData::Text($v) => $body,
        }
    };
}

impl ColumnData {
    /// Number of rows.
    pub fn len(&self) -> usize {
        each_column!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scalar numeric columns widened to `f64`; `None` for anything else.
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        Some(match self {
            ColumnData::Byte(v) => v.iter().map(|&x| x as f64).collect(),
            ColumnData::Int16(v) => v.iter().map(|&x| x as f64).collect(),
            ColumnData::Int32(v) => v.iter().map(|&x| x as f64).collect(),
            ColumnData::Int64(v) => v.iter().map(|&x| x as f64).collect(),
            ColumnData::Float32(v) => v.iter().map(|&x| x as f64).collect(),
            ColumnData::Float64(v) => v.clone(),
            _ => return None,
        })
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            ColumnData::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_descriptors(&self) -> Option<&[Descriptor]> {
        match self {
            ColumnData::Descriptor(v) => Some(v),
            _ => None,
        }
    }
}

/// `TSCALn * raw + TZEROn` for a scalar numeric column.
pub fn physical_values(column: &Column, data: &ColumnData) -> Result<Vec<f64>> {
    let raw = data.to_f64().ok_or_else(|| Error::TypeMismatch {
        keyword: column.label(),
        expected: "a scalar numeric column",
    })?;
    let (scale, zero) = (column.scale(), column.zero());
    Ok(raw.into_iter().map(|v| scale * v + zero).collect())
}

/// The data unit of a table HDU together with its column layout.
#[derive(Debug, Clone, PartialEq)]
pub struct TableExtension {
    kind: TableKind,
    row_width: usize,
    rows: usize,
    theap: usize,
    columns: Vec<Column>,
    data: Vec<u8>,
}

impl TableExtension {
    /// Read the table data unit at the stream's current position:
    /// `NAXIS1 * NAXIS2` row bytes followed by `PCOUNT` supplemental bytes.
    pub fn read<R: Read + Seek + ?Sized>(
        reader: &mut R,
        header: &Header,
        kind: TableKind,
        options: &ReadOptions,
    ) -> Result<Self> {
        let row_width: usize = header.value_of("NAXIS1")?;
        let rows: usize = header.value_of("NAXIS2")?;
        let pcount: usize = header.value_or("PCOUNT", 0)?;
        let columns = parse_columns(header, kind, options)?;

        let main_len = row_width
            .checked_mul(rows)
            .ok_or(Error::InvalidHeader("table size overflow"))?;
        let total = main_len
            .checked_add(pcount)
            .ok_or(Error::InvalidHeader("table size overflow"))?;

        let theap: usize = header.value_or("THEAP", main_len)?;
        if theap < main_len {
            warn!(theap, main_len, "THEAP points inside the main table");
        }

        ensure_remaining(reader, total as u64)?;
        let mut data = vec![0u8; total];
        reader.read_exact(&mut data)?;

        debug!(
            ?kind,
            rows,
            row_width,
            columns = columns.len(),
            heap = pcount,
            "read table data"
        );

        Ok(TableExtension {
            kind,
            row_width,
            rows,
            theap,
            columns,
            data,
        })
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// NAXIS2.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// NAXIS1.
    pub fn row_width(&self) -> usize {
        self.row_width
    }

    pub fn tfields(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column whose TTYPE is `name`.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name() == Some(name))
            .ok_or_else(|| Error::ColumnNotFound(String::from(name)))
    }

    /// Column by 0-based position.
    pub fn column_at(&self, index: usize) -> Result<&Column> {
        self.columns.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.columns.len(),
        })
    }

    /// Raw bytes of row `index`.
    pub fn row(&self, index: usize) -> Result<&[u8]> {
        if index >= self.rows {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.rows,
            });
        }
        let start = index * self.row_width;
        Ok(&self.data[start..start + self.row_width])
    }

    /// The `NAXIS1 * NAXIS2` row bytes.
    pub fn raw_data(&self) -> &[u8] {
        &self.data[..self.rows * self.row_width]
    }

    /// Bytes from THEAP to the end of the data unit.
    pub fn heap(&self) -> &[u8] {
        self.data.get(self.theap..).unwrap_or(&[])
    }

    /// The bytes of `column` in every row, top to bottom.
    pub(crate) fn fields<'a>(&'a self, column: &Column) -> impl Iterator<Item = &'a [u8]> + 'a {
        let (start, width) = (column.tbcol, column.width);
        self.raw_data()
            .chunks_exact(self.row_width.max(1))
            .take(self.rows)
            .map(move |row| &row[start..start + width])
    }
}
