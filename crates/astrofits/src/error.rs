use alloc::string::String;

/// All errors that can occur while reading FITS data.
#[derive(Debug)]
pub enum Error {
    /// Malformed FITS header block.
    InvalidHeader(&'static str),
    /// Premature end of data while reading.
    UnexpectedEof,
    /// Unrecognized BITPIX value.
    InvalidBitpix(i64),
    /// Malformed keyword name in a header card.
    InvalidKeyword,
    /// XTENSION value this reader does not decode.
    UnsupportedExtension(String),
    /// A keyword looked up in a header is not present.
    KeywordNotFound(String),
    /// A keyword is present but its value cannot convert to the requested type.
    TypeMismatch {
        keyword: String,
        expected: &'static str,
    },
    /// A TFORM string could not be parsed.
    InvalidColumnFormat(String),
    /// No table column carries the requested TTYPE.
    ColumnNotFound(String),
    /// A fixed-width ASCII table field is not a valid literal.
    Parse { column: String, text: String },
    /// Column widths do not tile the table row.
    StructuralInconsistency { expected: usize, found: usize },
    /// Row or column index past the end.
    IndexOutOfRange { index: usize, len: usize },
    /// Frame is not a vertex of the conversion graph.
    UnknownFrame(&'static str),
    /// Both frames are in the graph but no chain of edges joins them.
    NoConversionPath {
        from: &'static str,
        to: &'static str,
    },
    /// An I/O error from the standard library.
    #[cfg(feature = "std")]
    Io(std::io::Error),
    /// An I/O error from the `no_std` cursor.
    #[cfg(not(feature = "std"))]
    Io(crate::io::IoError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidHeader(msg) => write!(f, "invalid FITS header: {msg}"),
            Error::UnexpectedEof => write!(f, "unexpected end of file"),
            Error::InvalidBitpix(v) => write!(f, "invalid BITPIX value: {v}"),
            Error::InvalidKeyword => write!(f, "invalid keyword name"),
            Error::UnsupportedExtension(x) => write!(f, "unsupported XTENSION type: {x}"),
            Error::KeywordNotFound(kw) => write!(f, "keyword not found: {kw}"),
            Error::TypeMismatch { keyword, expected } => {
                write!(f, "keyword {keyword} is not {expected}")
            }
            Error::InvalidColumnFormat(tform) => write!(f, "invalid column format: '{tform}'"),
            Error::ColumnNotFound(name) => write!(f, "column not found: {name}"),
            Error::Parse { column, text } => {
                write!(f, "cannot parse '{text}' in column {column}")
            }
            Error::StructuralInconsistency { expected, found } => write!(
                f,
                "column widths sum to {found} bytes but NAXIS1 is {expected}"
            ),
            Error::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Error::UnknownFrame(frame) => write!(f, "frame {frame} is not in the graph"),
            Error::NoConversionPath { from, to } => {
                write!(f, "no conversion path from {from} to {to}")
            }
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof
        } else {
            Error::Io(e)
        }
    }
}

#[cfg(not(feature = "std"))]
impl From<crate::io::IoError> for Error {
    fn from(e: crate::io::IoError) -> Self {
        match e {
            crate::io::IoError::UnexpectedEof => Error::UnexpectedEof,
            other => Error::Io(other),
        }
    }
}
