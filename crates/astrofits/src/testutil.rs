//! Builders for synthetic FITS byte streams used across unit tests.

use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::block::{padded_byte_len, CARD_SIZE};

pub fn int(key: &str, n: i64) -> String {
    format!("{key:<8}= {n:>20}")
}

pub fn float(key: &str, f: f64) -> String {
    format!("{key:<8}= {f:>20?}")
}

pub fn logical(key: &str, b: bool) -> String {
    format!("{key:<8}= {:>20}", if b { "T" } else { "F" })
}

pub fn text(key: &str, s: &str) -> String {
    format!("{key:<8}= '{s:<8}'")
}

/// Header unit: the given cards, END, blank padding to a whole block.
pub fn header_bytes<S: AsRef<str>>(cards: &[S]) -> Vec<u8> {
    let mut out = Vec::new();
    for c in cards {
        let mut card = [b' '; CARD_SIZE];
        let bytes = c.as_ref().as_bytes();
        let len = bytes.len().min(CARD_SIZE);
        card[..len].copy_from_slice(&bytes[..len]);
        out.extend_from_slice(&card);
    }
    let mut end = [b' '; CARD_SIZE];
    end[..3].copy_from_slice(b"END");
    out.extend_from_slice(&end);
    let padded = padded_byte_len(out.len() as u64) as usize;
    out.resize(padded, b' ');
    out
}

/// Header unit followed by `data` zero-padded to a whole block.
pub fn hdu_bytes<S: AsRef<str>>(cards: &[S], data: &[u8]) -> Vec<u8> {
    let mut out = header_bytes(cards);
    out.extend_from_slice(data);
    let padded = padded_byte_len(out.len() as u64) as usize;
    out.resize(padded, 0);
    out
}

pub fn primary_cards(bitpix: i64, naxes: &[usize]) -> Vec<String> {
    let mut cards = vec![
        logical("SIMPLE", true),
        int("BITPIX", bitpix),
        int("NAXIS", naxes.len() as i64),
    ];
    for (i, n) in naxes.iter().enumerate() {
        cards.push(int(&format!("NAXIS{}", i + 1), *n as i64));
    }
    cards
}

pub fn empty_primary() -> Vec<u8> {
    hdu_bytes(&primary_cards(8, &[]), &[])
}

/// Mandatory cards of a table extension, up to and including TFIELDS.
pub fn table_cards(
    xtension: &str,
    naxis1: usize,
    naxis2: usize,
    pcount: usize,
    tfields: usize,
) -> Vec<String> {
    vec![
        text("XTENSION", xtension),
        int("BITPIX", 8),
        int("NAXIS", 2),
        int("NAXIS1", naxis1 as i64),
        int("NAXIS2", naxis2 as i64),
        int("PCOUNT", pcount as i64),
        int("GCOUNT", 1),
        int("TFIELDS", tfields as i64),
    ]
}

/// Binary table header with one TFORMn/TTYPEn pair per column.
pub fn bintable_cards(naxis1: usize, naxis2: usize, columns: &[(&str, &str)]) -> Vec<String> {
    let mut cards = table_cards("BINTABLE", naxis1, naxis2, 0, columns.len());
    for (i, (tform, ttype)) in columns.iter().enumerate() {
        cards.push(text(&format!("TFORM{}", i + 1), tform));
        cards.push(text(&format!("TTYPE{}", i + 1), ttype));
    }
    cards
}
