//! TFORMn grammars for the two table dialects.
//!
//! Binary tables use `rTa`: an optional repeat count, a one-letter type code
//! and trailing content that only matters for array descriptors. ASCII
//! tables use `Tw` or `Tw.d`: a type code followed by a field width.

pub mod ascii;
pub mod binary;

use alloc::string::String;

use crate::error::{Error, Result};

pub(crate) fn invalid(tform: &str) -> Error {
    Error::InvalidColumnFormat(String::from(tform.trim()))
}

/// Split a leading run of ASCII digits off `s`.
pub(crate) fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

pub(crate) fn parse_count(digits: &str, tform: &str) -> Result<usize> {
    digits.parse::<usize>().map_err(|_| invalid(tform))
}
