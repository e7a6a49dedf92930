#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod asciitable;
pub mod bintable;
pub mod block;
pub mod column;
pub mod conversion;
pub mod endian;
pub mod error;
pub mod hdu;
pub mod header;
pub mod image;
pub mod io;
pub mod options;
pub mod table;
pub mod tform;
pub mod value;

#[cfg(test)]
mod testutil;

pub use asciitable::AsciiTable;
pub use bintable::BinaryTable;
pub use block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE};
pub use column::{Column, TableKind};
pub use conversion::{ConversionGraph, Frame};
pub use error::{Error, Result};
pub use hdu::{parse_fits, read_hdu, read_hdu_at, FitsReader, Hdu, HduBody};
pub use header::{Card, Header, HduType};
pub use image::{Bitpix, ImageBuffer, ImageData};
pub use options::{BlankPolicy, ReadOptions};
pub use table::{ColumnData, Descriptor};
pub use value::Value;
