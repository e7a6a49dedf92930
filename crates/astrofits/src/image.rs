//! Image data reading for FITS HDUs.
//!
//! Pixels are stored big-endian in the data unit. [`read_image`] pulls a
//! `width * height` block off a stream and converts it to native order;
//! [`ImageData`] picks the element type from the header's BITPIX.

use alloc::vec::Vec;
use core::cmp::Ordering;

use bytemuck::{pod_collect_to_vec, Pod};
use tracing::debug;

use crate::error::{Error, Result};
use crate::header::Header;
use crate::io::{ensure_remaining, Read, Seek, SeekFrom};

/// The FITS BITPIX enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitpix {
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl Bitpix {
    pub fn from_value(bitpix: i64) -> Result<Self> {
        match bitpix {
            8 => Ok(Bitpix::U8),
            16 => Ok(Bitpix::I16),
            32 => Ok(Bitpix::I32),
            64 => Ok(Bitpix::I64),
            -32 => Ok(Bitpix::F32),
            -64 => Ok(Bitpix::F64),
            other => Err(Error::InvalidBitpix(other)),
        }
    }

    pub fn value(self) -> i64 {
        match self {
            Bitpix::U8 => 8,
            Bitpix::I16 => 16,
            Bitpix::I32 => 32,
            Bitpix::I64 => 64,
            Bitpix::F32 => -32,
            Bitpix::F64 => -64,
        }
    }

    /// `|BITPIX| / 8`.
    pub fn bytes_per_pixel(self) -> usize {
        (self.value().unsigned_abs() / 8) as usize
    }

    pub fn is_float(self) -> bool {
        matches!(self, Bitpix::F32 | Bitpix::F64)
    }
}

/// An in-memory pixel element type.
pub trait Pixel: Pod + PartialOrd + Default {
    const BITPIX: Bitpix;

    /// Convert one element whose bytes were copied verbatim from disk.
    fn from_be(self) -> Self;

    fn to_f64(self) -> f64;

    fn is_nan(self) -> bool {
        false
    }
}

macro_rules! int_pixel {
    ($t:ty, $bitpix:expr) => {
        impl Pixel for $t {
            const BITPIX: Bitpix = $bitpix;

            #[inline]
            fn from_be(self) -> Self {
                <$t>::from_be(self)
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

int_pixel!(u8, Bitpix::U8);
int_pixel!(i16, Bitpix::I16);
int_pixel!(i32, Bitpix::I32);
int_pixel!(i64, Bitpix::I64);

impl Pixel for f32 {
    const BITPIX: Bitpix = Bitpix::F32;

    #[inline]
    fn from_be(self) -> Self {
        f32::from_bits(u32::from_be(self.to_bits()))
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }
}

impl Pixel for f64 {
    const BITPIX: Bitpix = Bitpix::F64;

    #[inline]
    fn from_be(self) -> Self {
        f64::from_bits(u64::from_be(self.to_bits()))
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }
}

/// Decode a big-endian byte run into native-order pixels.
pub fn decode_pixels<T: Pixel>(raw: &[u8]) -> Vec<T> {
    let mut pixels: Vec<T> = pod_collect_to_vec(raw);
    for v in &mut pixels {
        *v = v.from_be();
    }
    pixels
}

/// A row-major pixel buffer of `width` columns and `height` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T: Pixel> ImageBuffer<T> {
    /// Wrap `data`; fails unless it holds exactly `width * height` pixels.
    pub fn from_vec(data: Vec<T>, width: usize, height: usize) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .ok_or(Error::InvalidHeader("image size overflow"))?;
        if data.len() != expected {
            return Err(Error::StructuralInconsistency {
                expected,
                found: data.len(),
            });
        }
        Ok(ImageBuffer {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Pixel at `row`, `col`.
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        if col >= self.width {
            return Err(Error::IndexOutOfRange {
                index: col,
                len: self.width,
            });
        }
        if row >= self.height {
            return Err(Error::IndexOutOfRange {
                index: row,
                len: self.height,
            });
        }
        Ok(self.data[row * self.width + col])
    }

    pub fn row(&self, row: usize) -> Result<&[T]> {
        if row >= self.height {
            return Err(Error::IndexOutOfRange {
                index: row,
                len: self.height,
            });
        }
        let start = row * self.width;
        Ok(&self.data[start..start + self.width])
    }

    fn non_nan(&self) -> impl Iterator<Item = T> + '_ {
        self.data.iter().copied().filter(|v| !v.is_nan())
    }

    /// Smallest pixel, NaN ignored.
    pub fn min(&self) -> Option<T> {
        self.non_nan()
            .reduce(|a, b| if b.partial_cmp(&a) == Some(Ordering::Less) { b } else { a })
    }

    /// Largest pixel, NaN ignored.
    pub fn max(&self) -> Option<T> {
        self.non_nan()
            .reduce(|a, b| if b.partial_cmp(&a) == Some(Ordering::Greater) { b } else { a })
    }

    /// Arithmetic mean of the non-NaN pixels; 0 when there are none.
    pub fn mean(&self) -> f64 {
        let (sum, n) = self
            .non_nan()
            .fold((0.0, 0usize), |(sum, n), v| (sum + v.to_f64(), n + 1));
        if n == 0 {
            return 0.0;
        }
        sum / n as f64
    }

    /// Sample standard deviation (N - 1 denominator) of the non-NaN pixels;
    /// 0 below two of them.
    pub fn std_dev(&self) -> f64 {
        let n = self.non_nan().count();
        if n < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let ss: f64 = self
            .non_nan()
            .map(|v| {
                let d = v.to_f64() - mean;
                d * d
            })
            .sum();
        libm::sqrt(ss / (n - 1) as f64)
    }

    /// Lower-middle element of the sorted non-NaN pixels.
    ///
    /// For an even count this is index `(n - 1) / 2`, not the average of the
    /// two middle values.
    pub fn median(&self) -> Option<T> {
        let mut values: Vec<T> = self.non_nan().collect();
        if values.is_empty() {
            return None;
        }
        let mid = (values.len() - 1) / 2;
        let (_, m, _) =
            values.select_nth_unstable_by(mid, |a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        Some(*m)
    }

    /// Copy into an `ndarray` of shape `(height, width)`.
    #[cfg(feature = "array")]
    pub fn to_array2(&self) -> ndarray::Array2<T> {
        // from_vec already checked the length, so the shape always fits.
        ndarray::Array2::from_shape_fn((self.height, self.width), |(r, c)| {
            self.data[r * self.width + c]
        })
    }
}

/// Read `width * height` pixels of type `T` starting at `start`, or at the
/// current position when `start` is `None`.
pub fn read_image<T: Pixel, R: Read + Seek + ?Sized>(
    reader: &mut R,
    width: usize,
    height: usize,
    start: Option<u64>,
) -> Result<ImageBuffer<T>> {
    if let Some(offset) = start {
        reader.seek(SeekFrom::Start(offset))?;
    }
    let byte_len = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(T::BITPIX.bytes_per_pixel()))
        .ok_or(Error::InvalidHeader("image size overflow"))?;
    ensure_remaining(reader, byte_len as u64)?;
    let mut raw = alloc::vec![0u8; byte_len];
    reader.read_exact(&mut raw)?;
    ImageBuffer::from_vec(decode_pixels(&raw), width, height)
}

/// Flattened 2-D shape `(width, height)` of an image with axes `naxes`.
pub fn image_shape(naxes: &[usize]) -> (usize, usize) {
    match naxes {
        [] => (0, 0),
        [n1] => (*n1, 1),
        [n1, rest @ ..] => (*n1, rest.iter().product()),
    }
}

/// Image pixels, typed by BITPIX.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    U8(ImageBuffer<u8>),
    I16(ImageBuffer<i16>),
    I32(ImageBuffer<i32>),
    I64(ImageBuffer<i64>),
    F32(ImageBuffer<f32>),
    F64(ImageBuffer<f64>),
}

macro_rules! each_buffer {
    ($data:expr, $b:ident => $body:expr) => {
        match $data {
            ImageData::U8($b) => $body,
            ImageData::I16($b) => $body,
            ImageData::I32($b) => $body,
            ImageData::I64($b) => $body,
            ImageData::F32($b) => $body,
            ImageData::F64($b) => $body,
        }
    };
}

impl ImageData {
    /// Read the data unit described by `header` at the stream's current
    /// position.
    pub fn read<R: Read + Seek + ?Sized>(reader: &mut R, header: &Header) -> Result<Self> {
        let bitpix = header.bitpix()?;
        let (width, height) = image_shape(&header.naxes()?);
        let data = match bitpix {
            Bitpix::U8 => ImageData::U8(read_image(reader, width, height, None)?),
            Bitpix::I16 => ImageData::I16(read_image(reader, width, height, None)?),
            Bitpix::I32 => ImageData::I32(read_image(reader, width, height, None)?),
            Bitpix::I64 => ImageData::I64(read_image(reader, width, height, None)?),
            Bitpix::F32 => ImageData::F32(read_image(reader, width, height, None)?),
            Bitpix::F64 => ImageData::F64(read_image(reader, width, height, None)?),
        };
        debug!(bitpix = bitpix.value(), width, height, "decoded image");
        Ok(data)
    }

    pub fn bitpix(&self) -> Bitpix {
        match self {
            ImageData::U8(_) => Bitpix::U8,
            ImageData::I16(_) => Bitpix::I16,
            ImageData::I32(_) => Bitpix::I32,
            ImageData::I64(_) => Bitpix::I64,
            ImageData::F32(_) => Bitpix::F32,
            ImageData::F64(_) => Bitpix::F64,
        }
    }

    pub fn width(&self) -> usize {
        each_buffer!(self, b => b.width())
    }

    pub fn height(&self) -> usize {
        each_buffer!(self, b => b.height())
    }

    pub fn len(&self) -> usize {
        each_buffer!(self, b => b.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        each_buffer!(self, b => b.get(row, col).map(Pixel::to_f64))
    }

    pub fn min(&self) -> Option<f64> {
        each_buffer!(self, b => b.min().map(Pixel::to_f64))
    }

    pub fn max(&self) -> Option<f64> {
        each_buffer!(self, b => b.max().map(Pixel::to_f64))
    }

    pub fn mean(&self) -> f64 {
        each_buffer!(self, b => b.mean())
    }

    pub fn median(&self) -> Option<f64> {
        each_buffer!(self, b => b.median().map(Pixel::to_f64))
    }

    pub fn std_dev(&self) -> f64 {
        each_buffer!(self, b => b.std_dev())
    }

    /// `bzero + bscale * pixel` for every pixel.
    pub fn to_physical(&self, bscale: f64, bzero: f64) -> Vec<f64> {
        each_buffer!(self, b => b.data().iter().map(|&p| bzero + bscale * p.to_f64()).collect())
    }

    pub fn as_f32(&self) -> Option<&ImageBuffer<f32>> {
        match self {
            ImageData::F32(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&ImageBuffer<f64>> {
        match self {
            ImageData::F64(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<&ImageBuffer<i16>> {
        match self {
            ImageData::I16(b) => Some(b),
            _ => None,
        }
    }
}

/// `(BSCALE, BZERO)` from the header, defaulting to `(1.0, 0.0)`.
pub fn scaling(header: &Header) -> Result<(f64, f64)> {
    Ok((header.value_or("BSCALE", 1.0)?, header.value_or("BZERO", 0.0)?))
}

/// Mark undefined pixels: integer pixels equal to `blank`, or NaN floats.
///
/// Returns `None` when no pixel is undefined.
pub fn blank_mask(data: &ImageData, blank: Option<i64>) -> Option<Vec<bool>> {
    let mask: Vec<bool> = match data {
        ImageData::F32(b) => b.data().iter().map(|p| p.is_nan()).collect(),
        ImageData::F64(b) => b.data().iter().map(|p| p.is_nan()).collect(),
        ImageData::U8(b) => integer_mask(b.data(), blank?),
        ImageData::I16(b) => integer_mask(b.data(), blank?),
        ImageData::I32(b) => integer_mask(b.data(), blank?),
        ImageData::I64(b) => integer_mask(b.data(), blank?),
    };
    mask.iter().any(|&m| m).then_some(mask)
}

fn integer_mask<T: Pixel + TryFrom<i64>>(pixels: &[T], blank: i64) -> Vec<bool> {
    match T::try_from(blank) {
        Ok(bv) => pixels.iter().map(|&p| p == bv).collect(),
        // BLANK outside the pixel range can never match.
        Err(_) => alloc::vec![false; pixels.len()],
    }
}
