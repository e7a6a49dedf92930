//! Per-column table metadata read from the TFORMn/TTYPEn/TBCOLn family.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use tracing::warn;

use crate::error::{Error, Result};
use crate::header::Header;
use crate::options::ReadOptions;
use crate::tform::{ascii, binary};

/// Which TFORM dialect a table uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Ascii,
    Binary,
}

/// A parsed TFORMn in either dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFormat {
    Ascii(ascii::AsciiFormat),
    Binary(binary::BinaryFormat),
}

/// One table column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// 1-based position, the `n` in TFORMn.
    pub index: usize,
    pub tform: String,
    pub ttype: Option<String>,
    /// Comment of the TTYPEn card.
    pub comment: Option<String>,
    pub tunit: Option<String>,
    pub tscal: Option<f64>,
    pub tzero: Option<f64>,
    /// 0-based byte offset of the field within a row.
    pub tbcol: usize,
    pub tdisp: Option<String>,
    pub tdim: Option<String>,
    pub format: ColumnFormat,
    /// Bytes the field occupies in each row.
    pub width: usize,
}

impl Column {
    pub fn name(&self) -> Option<&str> {
        self.ttype.as_deref()
    }

    /// Display label for errors and logs: TTYPEn, or `column n`.
    pub fn label(&self) -> String {
        match &self.ttype {
            Some(name) => name.clone(),
            None => format!("column {}", self.index),
        }
    }

    /// TSCALn, 1.0 when absent.
    pub fn scale(&self) -> f64 {
        self.tscal.unwrap_or(1.0)
    }

    /// TZEROn, 0.0 when absent.
    pub fn zero(&self) -> f64 {
        self.tzero.unwrap_or(0.0)
    }

    pub fn is_scaled(&self) -> bool {
        self.scale() != 1.0 || self.zero() != 0.0
    }

    /// Axis lengths from TDIMn, e.g. `(4,3)` gives `[4, 3]`.
    pub fn dims(&self) -> Result<Option<Vec<usize>>> {
        let Some(tdim) = &self.tdim else {
            return Ok(None);
        };
        let inner = tdim
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| Error::InvalidColumnFormat(tdim.clone()))?;
        inner
            .split(',')
            .map(|n| {
                n.trim()
                    .parse::<usize>()
                    .map_err(|_| Error::InvalidColumnFormat(tdim.clone()))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    pub fn binary_format(&self) -> Option<&binary::BinaryFormat> {
        match &self.format {
            ColumnFormat::Binary(f) => Some(f),
            ColumnFormat::Ascii(_) => None,
        }
    }

    pub fn ascii_format(&self) -> Option<&ascii::AsciiFormat> {
        match &self.format {
            ColumnFormat::Ascii(f) => Some(f),
            ColumnFormat::Binary(_) => None,
        }
    }
}

fn keyword_string(header: &Header, keyword: &str) -> Result<Option<String>> {
    Ok(header
        .optional::<String>(keyword)?
        .map(|s| String::from(s.trim())))
}

/// Largest TFIELDS a table may declare.
pub const MAX_FIELDS: usize = 999;

/// Build the `TFIELDS` column descriptors of a table header.
///
/// Binary offsets are the running sum of field widths. ASCII offsets come
/// from `TBCOLn - 1`, and every field must end inside the row.
pub fn parse_columns(header: &Header, kind: TableKind, options: &ReadOptions) -> Result<Vec<Column>> {
    let tfields: usize = header.value_of("TFIELDS")?;
    let naxis1: usize = header.value_of("NAXIS1")?;
    if tfields > MAX_FIELDS {
        return Err(Error::InvalidHeader("TFIELDS exceeds 999"));
    }
    let mut columns = Vec::with_capacity(tfields);
    let mut running = 0usize;

    for n in 1..=tfields {
        let tform = header.value_of::<String>(&format!("TFORM{n}"))?;
        let (format, width, tbcol) = match kind {
            TableKind::Binary => {
                let f = binary::parse(&tform)?;
                let width = f.width();
                let tbcol = running;
                running = running
                    .checked_add(width)
                    .ok_or_else(|| Error::InvalidColumnFormat(String::from(tform.trim())))?;
                (ColumnFormat::Binary(f), width, tbcol)
            }
            TableKind::Ascii => {
                let f = ascii::parse(&tform)?;
                let tbcol: usize = header.value_of(&format!("TBCOL{n}"))?;
                if tbcol == 0 {
                    return Err(Error::InvalidHeader("TBCOLn must be at least 1"));
                }
                if !matches!((tbcol - 1).checked_add(f.width), Some(end) if end <= naxis1) {
                    return Err(Error::InvalidHeader("ASCII column extends past NAXIS1"));
                }
                (ColumnFormat::Ascii(f), f.width, tbcol - 1)
            }
        };

        let ttype_key = format!("TTYPE{n}");
        columns.push(Column {
            index: n,
            tform: String::from(tform.trim()),
            ttype: keyword_string(header, &ttype_key)?,
            comment: header.comment_of(&ttype_key).map(String::from),
            tunit: keyword_string(header, &format!("TUNIT{n}"))?,
            tscal: header.optional(&format!("TSCAL{n}"))?,
            tzero: header.optional(&format!("TZERO{n}"))?,
            tbcol,
            tdisp: keyword_string(header, &format!("TDISP{n}"))?,
            tdim: keyword_string(header, &format!("TDIM{n}"))?,
            format,
            width,
        });
    }

    if kind == TableKind::Binary && running != naxis1 {
        // Fields past the row end cannot be sliced, so overflow is always fatal.
        if options.check_row_width || running > naxis1 {
            return Err(Error::StructuralInconsistency {
                expected: naxis1,
                found: running,
            });
        }
        warn!(naxis1, columns_width = running, "binary table row width mismatch");
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::read_header;
    use crate::io::Cursor;
    use crate::testutil::{bintable_cards, float, header_bytes, int, table_cards, text};
    use alloc::vec;

    fn header(cards: &[String]) -> Header {
        read_header(&mut Cursor::new(header_bytes(cards))).unwrap()
    }

    // ---- binary ----

    #[test]
    fn binary_offsets_are_running_sum() {
        let h = header(&bintable_cards(
            23,
            1,
            &[("1J", "ID"), ("2E", "FLUX"), ("12X", "FLAGS"), ("D", "MJD"), ("1A", "Q")],
        ));
        let cols = parse_columns(&h, TableKind::Binary, &ReadOptions::default()).unwrap();
        let offsets: Vec<usize> = cols.iter().map(|c| c.tbcol).collect();
        assert_eq!(offsets, vec![0, 4, 12, 14, 22]);
        assert_eq!(cols[2].width, 2);
        assert_eq!(cols[1].name(), Some("FLUX"));
        assert_eq!(cols[3].index, 4);
    }

    #[test]
    fn binary_width_mismatch() {
        let h = header(&bintable_cards(10, 1, &[("1J", "A"), ("1E", "B")]));
        let err = parse_columns(&h, TableKind::Binary, &ReadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::StructuralInconsistency { expected: 10, found: 8 }
        ));

        let lax = ReadOptions::default().with_check_row_width(false);
        assert_eq!(parse_columns(&h, TableKind::Binary, &lax).unwrap().len(), 2);
    }

    #[test]
    fn optional_metadata() {
        let mut cards = bintable_cards(24, 1, &[("6E", "SPEC")]);
        cards.push(text("TUNIT1", "Jy"));
        cards.push(float("TSCAL1", 0.5));
        cards.push(int("TZERO1", 10));
        cards.push(text("TDIM1", "(3,2)"));
        cards.push(text("TDISP1", "F8.3"));
        let h = header(&cards);
        let col = &parse_columns(&h, TableKind::Binary, &ReadOptions::default()).unwrap()[0];
        assert_eq!(col.tunit.as_deref(), Some("Jy"));
        assert_eq!(col.scale(), 0.5);
        assert_eq!(col.zero(), 10.0);
        assert!(col.is_scaled());
        assert_eq!(col.dims().unwrap(), Some(vec![3, 2]));
        assert_eq!(col.tdisp.as_deref(), Some("F8.3"));
    }

    #[test]
    fn unnamed_column_label() {
        let mut cards = table_cards("BINTABLE", 2, 1, 0, 1);
        cards.push(text("TFORM1", "I"));
        let h = header(&cards);
        let col = &parse_columns(&h, TableKind::Binary, &ReadOptions::default()).unwrap()[0];
        assert_eq!(col.name(), None);
        assert_eq!(col.label(), "column 1");
        assert!(!col.is_scaled());
        assert_eq!(col.dims().unwrap(), None);
    }

    #[test]
    fn missing_tform() {
        let cards = table_cards("BINTABLE", 4, 1, 0, 1);
        let err = parse_columns(&header(&cards), TableKind::Binary, &ReadOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::KeywordNotFound(kw) if kw == "TFORM1"));
    }

    #[test]
    fn bad_tdim() {
        let mut cards = bintable_cards(4, 1, &[("1J", "X")]);
        cards.push(text("TDIM1", "3,2"));
        let h = header(&cards);
        let col = &parse_columns(&h, TableKind::Binary, &ReadOptions::default()).unwrap()[0];
        assert!(matches!(col.dims(), Err(Error::InvalidColumnFormat(_))));
    }

    #[test]
    fn summed_widths_overflow() {
        let h = header(&bintable_cards(
            8,
            1,
            &[("2305843009213693951D", "A"), ("2305843009213693951D", "B")],
        ));
        let err = parse_columns(&h, TableKind::Binary, &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidColumnFormat(s) if s == "2305843009213693951D"));
    }

    #[test]
    fn tfields_above_limit() {
        let h = header(&table_cards("BINTABLE", 4, 1, 0, 1_000_000_000_000_000));
        assert!(matches!(
            parse_columns(&h, TableKind::Binary, &ReadOptions::default()),
            Err(Error::InvalidHeader("TFIELDS exceeds 999"))
        ));
        let h = header(&table_cards("BINTABLE", 4, 1, 0, 1000));
        assert!(matches!(
            parse_columns(&h, TableKind::Binary, &ReadOptions::default()),
            Err(Error::InvalidHeader(_))
        ));
    }

    // ---- ascii ----

    fn ascii_cards(naxis1: usize, fields: &[(&str, usize, &str)]) -> Vec<String> {
        let mut cards = table_cards("TABLE", naxis1, 1, 0, fields.len());
        for (i, (tform, tbcol, ttype)) in fields.iter().enumerate() {
            let n = i + 1;
            cards.push(text(&format!("TFORM{n}"), tform));
            cards.push(int(&format!("TBCOL{n}"), *tbcol as i64));
            cards.push(text(&format!("TTYPE{n}"), ttype));
        }
        cards
    }

    #[test]
    fn ascii_offsets_from_tbcol() {
        let h = header(&ascii_cards(30, &[("A8", 1, "NAME"), ("I5", 11, "N"), ("E12.4", 17, "V")]));
        let cols = parse_columns(&h, TableKind::Ascii, &ReadOptions::default()).unwrap();
        let offsets: Vec<usize> = cols.iter().map(|c| c.tbcol).collect();
        assert_eq!(offsets, vec![0, 10, 16]);
        assert_eq!(cols[2].width, 12);
        assert!(cols[2].ascii_format().is_some());
        assert!(cols[2].binary_format().is_none());
    }

    #[test]
    fn ascii_column_past_row_end() {
        let h = header(&ascii_cards(10, &[("I5", 7, "N")]));
        assert!(matches!(
            parse_columns(&h, TableKind::Ascii, &ReadOptions::default()),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn ascii_huge_tbcol_is_past_row_end() {
        let h = header(&ascii_cards(10, &[("I5", usize::MAX / 2, "N")]));
        assert!(matches!(
            parse_columns(&h, TableKind::Ascii, &ReadOptions::default()),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn ascii_requires_tbcol() {
        let mut cards = table_cards("TABLE", 10, 1, 0, 1);
        cards.push(text("TFORM1", "I5"));
        let err = parse_columns(&header(&cards), TableKind::Ascii, &ReadOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::KeywordNotFound(kw) if kw == "TBCOL1"));
    }
}
