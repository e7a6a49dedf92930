//! Read and seek abstractions for both `std` and `no_std` builds.
//!
//! With the `std` feature the standard library's traits are re-exported
//! unchanged. Without it, a minimal `Read`/`Seek` pair and a byte-slice
//! `Cursor` stand in, covering only what the FITS reader needs.

#[cfg(feature = "std")]
#[allow(unused_imports)]
pub use std::io::{Cursor, Read, Result, Seek, SeekFrom};

// ── no_std: provide our own implementations ──

#[cfg(not(feature = "std"))]
mod nostd {
    extern crate alloc;

    /// Minimal I/O error type for `no_std` environments.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum IoError {
        /// A read ran past the end of the available data.
        UnexpectedEof,
        /// A seek landed on a negative absolute position.
        InvalidSeek,
    }

    impl core::fmt::Display for IoError {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            match self {
                IoError::UnexpectedEof => write!(f, "unexpected end of file"),
                IoError::InvalidSeek => write!(f, "invalid seek to negative position"),
            }
        }
    }

    pub type Result<T> = core::result::Result<T, IoError>;

    /// Describes a position to seek to within a stream.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SeekFrom {
        Start(u64),
        Current(i64),
        End(i64),
    }

    /// Read bytes from a source.
    pub trait Read {
        /// Pull some bytes into `buf`, returning how many were read.
        fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

        /// Fill `buf` completely or fail with [`IoError::UnexpectedEof`].
        fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
            let mut offset = 0;
            while offset < buf.len() {
                match self.read(&mut buf[offset..])? {
                    0 => return Err(IoError::UnexpectedEof),
                    n => offset += n,
                }
            }
            Ok(())
        }
    }

    /// Seek to a position within a stream.
    pub trait Seek {
        /// Seek to `pos`, returning the new absolute offset.
        fn seek(&mut self, pos: SeekFrom) -> Result<u64>;
    }

    /// A cursor over an in-memory byte buffer.
    #[derive(Debug, Clone)]
    pub struct Cursor<T> {
        inner: T,
        pos: u64,
    }

    impl<T> Cursor<T> {
        pub fn new(inner: T) -> Self {
            Cursor { inner, pos: 0 }
        }

        pub fn position(&self) -> u64 {
            self.pos
        }

        pub fn into_inner(self) -> T {
            self.inner
        }
    }

    impl<T: AsRef<[u8]>> Read for Cursor<T> {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            let inner = self.inner.as_ref();
            let start = self.pos as usize;
            if start >= inner.len() {
                return Ok(0);
            }
            let available = &inner[start..];
            let n = buf.len().min(available.len());
            buf[..n].copy_from_slice(&available[..n]);
            self.pos += n as u64;
            Ok(n)
        }
    }

    impl<T: AsRef<[u8]>> Seek for Cursor<T> {
        fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
            let len = self.inner.as_ref().len() as i64;
            let new_pos = match pos {
                SeekFrom::Start(offset) => offset as i64,
                SeekFrom::Current(offset) => self.pos as i64 + offset,
                SeekFrom::End(offset) => len + offset,
            };
            if new_pos < 0 {
                return Err(IoError::InvalidSeek);
            }
            self.pos = new_pos as u64;
            Ok(self.pos)
        }
    }
}

#[cfg(not(feature = "std"))]
pub use nostd::*;

use crate::error::Error;

/// Current absolute offset of `stream`.
pub fn position<S: Seek + ?Sized>(stream: &mut S) -> Result<u64> {
    stream.seek(SeekFrom::Current(0))
}

/// Total length of `stream` in bytes; the cursor is restored afterwards.
pub fn stream_len<S: Seek + ?Sized>(stream: &mut S) -> Result<u64> {
    let here = position(stream)?;
    let end = stream.seek(SeekFrom::End(0))?;
    if here != end {
        stream.seek(SeekFrom::Start(here))?;
    }
    Ok(end)
}

/// Fail with [`Error::UnexpectedEof`] unless `needed` bytes follow the
/// current position. Called before sizing a buffer from header values.
pub fn ensure_remaining<S: Seek + ?Sized>(stream: &mut S, needed: u64) -> crate::error::Result<()> {
    let here = position(stream)?;
    let len = stream_len(stream)?;
    if len.saturating_sub(here) < needed {
        return Err(Error::UnexpectedEof);
    }
    Ok(())
}

// ── Tests ──
