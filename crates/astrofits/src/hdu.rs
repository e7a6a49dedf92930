//! Header-data units and sequential reading of a FITS stream.

use alloc::vec::Vec;

use tracing::debug;

use crate::asciitable::AsciiTable;
use crate::bintable::BinaryTable;
use crate::block::BLOCK_SIZE;
use crate::error::{Error, Result};
use crate::header::{read_header, Header, HduType};
use crate::image::ImageData;
use crate::io::{stream_len, Cursor, Read, Seek, SeekFrom};
use crate::options::ReadOptions;
use crate::value::Value;

/// The decoded data unit of an HDU.
#[derive(Debug, Clone, PartialEq)]
pub enum HduBody {
    /// Primary array or IMAGE extension.
    Image(ImageData),
    AsciiTable(AsciiTable),
    BinaryTable(BinaryTable),
}

/// A single Header Data Unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Hdu {
    header: Header,
    kind: HduType,
    body: HduBody,
}

impl Hdu {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn kind(&self) -> HduType {
        self.kind
    }

    pub fn body(&self) -> &HduBody {
        &self.body
    }

    pub fn into_parts(self) -> (Header, HduBody) {
        (self.header, self.body)
    }

    /// EXTNAME, if present.
    pub fn name(&self) -> Option<&str> {
        match self.header.value("EXTNAME") {
            Some(Value::String(s)) => Some(s.trim()),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageData> {
        match &self.body {
            HduBody::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_ascii_table(&self) -> Option<&AsciiTable> {
        match &self.body {
            HduBody::AsciiTable(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_binary_table(&self) -> Option<&BinaryTable> {
        match &self.body {
            HduBody::BinaryTable(table) => Some(table),
            _ => None,
        }
    }
}

/// Read one HDU starting at the current position of `reader`.
///
/// On return the stream sits just past the data bytes, before any block
/// padding; seek to `hdu.header().next_hdu_offset()` to reach the next HDU.
pub fn read_hdu<R: Read + Seek + ?Sized>(reader: &mut R, options: &ReadOptions) -> Result<Hdu> {
    let header = read_header(reader)?;
    let kind = if options.validate_keywords {
        header.validate()?
    } else {
        header.hdu_type()?
    };

    let body = match kind {
        HduType::Primary | HduType::Image => HduBody::Image(ImageData::read(reader, &header)?),
        HduType::AsciiTable => HduBody::AsciiTable(AsciiTable::read(reader, &header, options)?),
        HduType::BinaryTable => {
            HduBody::BinaryTable(BinaryTable::read(reader, &header, options)?)
        }
    };

    debug!(
        ?kind,
        start = header.start(),
        data_start = header.data_start(),
        name = ?header.value("EXTNAME"),
        "read HDU"
    );
    Ok(Hdu { header, kind, body })
}

/// Seek to `offset` and read one HDU there.
pub fn read_hdu_at<R: Read + Seek + ?Sized>(
    reader: &mut R,
    offset: u64,
    options: &ReadOptions,
) -> Result<Hdu> {
    reader.seek(SeekFrom::Start(offset))?;
    read_hdu(reader, options)
}

/// Iterator over the HDUs of a seekable FITS stream.
///
/// The first HDU must be a primary HDU. Iteration ends when fewer than one
/// block remains, or after the first error.
#[derive(Debug)]
pub struct FitsReader<R> {
    reader: R,
    options: ReadOptions,
    offset: u64,
    len: u64,
    index: usize,
    done: bool,
}

impl<R: Read + Seek> FitsReader<R> {
    pub fn new(reader: R) -> Result<Self> {
        Self::with_options(reader, ReadOptions::default())
    }

    pub fn with_options(mut reader: R, options: ReadOptions) -> Result<Self> {
        let len = stream_len(&mut reader)?;
        Ok(FitsReader {
            reader,
            options,
            offset: 0,
            len,
            index: 0,
            done: false,
        })
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Read every remaining HDU, stopping at the first error.
    pub fn read_all(&mut self) -> Result<Vec<Hdu>> {
        self.collect()
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn read_next(&mut self) -> Result<Hdu> {
        let hdu = read_hdu_at(&mut self.reader, self.offset, &self.options)?;
        if self.index == 0 && hdu.kind() != HduType::Primary {
            return Err(Error::InvalidHeader("first HDU must be primary"));
        }
        self.offset = hdu.header().next_hdu_offset()?;
        self.index += 1;
        Ok(hdu)
    }
}

#[cfg(feature = "std")]
impl FitsReader<std::io::BufReader<std::fs::File>> {
    /// Open the FITS file at `path` with default options.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::new(std::io::BufReader::new(file))
    }
}

impl<R: Read + Seek> Iterator for FitsReader<R> {
    type Item = Result<Hdu>;

    fn next(&mut self) -> Option<Result<Hdu>> {
        if self.done {
            return None;
        }
        if self.len.saturating_sub(self.offset) < BLOCK_SIZE as u64 {
            self.done = true;
            return (self.index == 0).then_some(Err(Error::UnexpectedEof));
        }
        let result = self.read_next();
        self.done = result.is_err();
        Some(result)
    }
}

/// Parse every HDU of an in-memory FITS file.
pub fn parse_fits(data: &[u8]) -> Result<Vec<Hdu>> {
    FitsReader::new(Cursor::new(data))?.read_all()
}
