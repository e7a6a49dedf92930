//! FITS binary table extension reading.

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Deref;

use tracing::{debug, warn};

use crate::column::{Column, TableKind};
use crate::endian::{read_f32_be, read_f64_be, read_i16_be, read_i32_be, read_i64_be, read_u32_be};
use crate::error::{Error, Result};
use crate::header::Header;
use crate::io::{Read, Seek};
use crate::options::ReadOptions;
use crate::table::{physical_values, ColumnData, Descriptor, TableExtension};
use crate::tform::binary::{BinaryFormat, BinaryType};

/// A `BINTABLE` extension.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryTable {
    table: TableExtension,
}

impl Deref for BinaryTable {
    type Target = TableExtension;

    fn deref(&self) -> &TableExtension {
        &self.table
    }
}

impl BinaryTable {
    /// Read the data unit described by `header` at the stream's current
    /// position.
    pub fn read<R: Read + Seek + ?Sized>(
        reader: &mut R,
        header: &Header,
        options: &ReadOptions,
    ) -> Result<Self> {
        let table = TableExtension::read(reader, header, TableKind::Binary, options)?;
        Ok(BinaryTable { table })
    }

    /// Decode the column whose TTYPE is `name`.
    pub fn get_column(&self, name: &str) -> Result<ColumnData> {
        self.decode(self.column(name)?)
    }

    /// Decode the column at 0-based position `index`.
    pub fn get_column_at(&self, index: usize) -> Result<ColumnData> {
        self.decode(self.column_at(index)?)
    }

    /// `TSCALn * raw + TZEROn` for a scalar numeric column.
    pub fn get_physical_column(&self, name: &str) -> Result<Vec<f64>> {
        let column = self.column(name)?;
        physical_values(column, &self.decode(column)?)
    }

    /// Resolve a `P` column against the heap: one entry per row holding the
    /// `count` elements its descriptor points at.
    pub fn get_var_column(&self, name: &str) -> Result<Vec<ColumnData>> {
        let column = self.column(name)?;
        let format = binary_format(column)?;
        let element = match (format.kind, format.element) {
            (BinaryType::Descriptor, Some(element)) if format.repeat == 1 => element,
            _ => return Err(Error::InvalidColumnFormat(column.tform.clone())),
        };

        let heap = self.heap();
        let rows = self
            .fields(column)
            .map(|field| {
                let d = descriptor(field);
                let len = match element {
                    BinaryType::Bit => (d.count as usize).div_ceil(8),
                    other => d.count as usize * other.size(),
                };
                let start = d.offset as usize;
                let bytes = start
                    .checked_add(len)
                    .and_then(|end| heap.get(start..end))
                    .ok_or_else(|| {
                        warn!(
                            column = %column.label(),
                            offset = d.offset,
                            count = d.count,
                            heap_len = heap.len(),
                            "descriptor points outside the heap"
                        );
                        Error::UnexpectedEof
                    })?;
                Ok(decode_run(element, bytes, d.count as usize))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(column = %column.label(), rows = rows.len(), "resolved heap arrays");
        Ok(rows)
    }

    fn decode(&self, column: &Column) -> Result<ColumnData> {
        let format = binary_format(column)?;
        let data = decode_column(&self.table, column, format);
        debug!(
            column = %column.label(),
            tform = %column.tform,
            rows = data.len(),
            "decoded binary column"
        );
        Ok(data)
    }
}

fn binary_format(column: &Column) -> Result<&BinaryFormat> {
    column
        .binary_format()
        .ok_or_else(|| Error::InvalidColumnFormat(column.tform.clone()))
}

// ── Field codecs ──

fn logical(b: &[u8]) -> bool {
    b[0] == b'T'
}

fn byte(b: &[u8]) -> u8 {
    b[0]
}

fn complex32(b: &[u8]) -> (f32, f32) {
    (read_f32_be(b), read_f32_be(&b[4..]))
}

fn complex64(b: &[u8]) -> (f64, f64) {
    (read_f64_be(b), read_f64_be(&b[8..]))
}

/// Element count first, then heap offset.
fn descriptor(b: &[u8]) -> Descriptor {
    Descriptor {
        count: read_u32_be(b),
        offset: read_u32_be(&b[4..]),
    }
}

/// Character data with trailing blanks and NULs removed.
fn text(b: &[u8]) -> String {
    String::from_utf8_lossy(b)
        .trim_end_matches(|c: char| c == ' ' || c == '\0')
        .into()
}

/// The first `count` bits of `b`, most significant bit first.
fn bits(b: &[u8], count: usize) -> Vec<bool> {
    (0..count)
        .map(|i| (b[i / 8] >> (7 - i % 8)) & 1 == 1)
        .collect()
}

fn run<T>(bytes: &[u8], size: usize, decode: fn(&[u8]) -> T) -> Vec<T> {
    bytes.chunks_exact(size).map(decode).collect()
}

fn gather<'a, T>(
    fields: impl Iterator<Item = &'a [u8]>,
    repeat: usize,
    size: usize,
    decode: fn(&[u8]) -> T,
    scalar: fn(Vec<T>) -> ColumnData,
    array: fn(Vec<Vec<T>>) -> ColumnData,
) -> ColumnData {
    if repeat == 1 {
        scalar(fields.map(decode).collect())
    } else {
        array(fields.map(|f| run(f, size, decode)).collect())
    }
}

fn decode_column(table: &TableExtension, column: &Column, format: &BinaryFormat) -> ColumnData {
    let fields = table.fields(column);
    let r = format.repeat;
    let size = format.kind.size();
    match format.kind {
        BinaryType::Ascii => ColumnData::Text(fields.map(text).collect()),
        BinaryType::Bit if r == 1 => ColumnData::Bool(fields.map(|f| f[0] & 0x80 != 0).collect()),
        BinaryType::Bit => ColumnData::BoolArray(fields.map(|f| bits(f, r)).collect()),
        BinaryType::Logical => gather(fields, r, size, logical, ColumnData::Bool, ColumnData::BoolArray),
        BinaryType::Byte => gather(fields, r, size, byte, ColumnData::Byte, ColumnData::ByteArray),
        BinaryType::Short => {
            gather(fields, r, size, read_i16_be, ColumnData::Int16, ColumnData::Int16Array)
        }
        BinaryType::Int => {
            gather(fields, r, size, read_i32_be, ColumnData::Int32, ColumnData::Int32Array)
        }
        BinaryType::Long => {
            gather(fields, r, size, read_i64_be, ColumnData::Int64, ColumnData::Int64Array)
        }
        BinaryType::Float => {
            gather(fields, r, size, read_f32_be, ColumnData::Float32, ColumnData::Float32Array)
        }
        BinaryType::Double => {
            gather(fields, r, size, read_f64_be, ColumnData::Float64, ColumnData::Float64Array)
        }
        BinaryType::ComplexFloat => gather(
            fields,
            r,
            size,
            complex32,
            ColumnData::Complex32,
            ColumnData::Complex32Array,
        ),
        BinaryType::ComplexDouble => gather(
            fields,
            r,
            size,
            complex64,
            ColumnData::Complex64,
            ColumnData::Complex64Array,
        ),
        BinaryType::Descriptor => gather(
            fields,
            r,
            size,
            descriptor,
            ColumnData::Descriptor,
            ColumnData::DescriptorArray,
        ),
    }
}

/// Decode `count` contiguous heap elements of type `kind`.
fn decode_run(kind: BinaryType, bytes: &[u8], count: usize) -> ColumnData {
    let size = kind.size();
    match kind {
        BinaryType::Ascii => ColumnData::Text(alloc::vec![text(bytes)]),
        BinaryType::Bit => ColumnData::Bool(bits(bytes, count)),
        BinaryType::Logical => ColumnData::Bool(run(bytes, size, logical)),
        BinaryType::Byte => ColumnData::Byte(bytes.to_vec()),
        BinaryType::Short => ColumnData::Int16(run(bytes, size, read_i16_be)),
        BinaryType::Int => ColumnData::Int32(run(bytes, size, read_i32_be)),
        BinaryType::Long => ColumnData::Int64(run(bytes, size, read_i64_be)),
        BinaryType::Float => ColumnData::Float32(run(bytes, size, read_f32_be)),
        BinaryType::Double => ColumnData::Float64(run(bytes, size, read_f64_be)),
        BinaryType::ComplexFloat => ColumnData::Complex32(run(bytes, size, complex32)),
        BinaryType::ComplexDouble => ColumnData::Complex64(run(bytes, size, complex64)),
        BinaryType::Descriptor => ColumnData::Descriptor(run(bytes, size, descriptor)),
    }
}
