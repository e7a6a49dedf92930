//! FITS header cards and the keyword store built from one header unit.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::str;

use tracing::{debug, warn};

use crate::block::{padded_byte_len, BLOCK_SIZE, CARD_SIZE};
use crate::error::{Error, Result};
use crate::image::Bitpix;
use crate::io::{position, Read, Seek};
use crate::value::{format_value, parse_value, FromValue, Value};

// ── Types ──

/// A parsed FITS header card (one 80-byte keyword record).
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// The 8-byte keyword name, ASCII, left-justified, space-padded.
    pub keyword: [u8; 8],
    /// The parsed value, if this card has a value indicator (`= ` in bytes 8..10).
    pub value: Option<Value>,
    /// An optional comment string.
    pub comment: Option<String>,
}

impl Card {
    /// Return the keyword as a trimmed UTF-8 string.
    pub fn keyword_str(&self) -> &str {
        let end = self
            .keyword
            .iter()
            .rposition(|&b| b != b' ')
            .map(|i| i + 1)
            .unwrap_or(0);
        str::from_utf8(&self.keyword[..end]).unwrap_or("")
    }

    /// Returns `true` if this card is the END keyword.
    pub fn is_end(&self) -> bool {
        &self.keyword == b"END     "
    }

    /// Returns `true` if this is a blank card (keyword is all spaces).
    pub fn is_blank(&self) -> bool {
        self.keyword.iter().all(|&b| b == b' ')
    }

    /// Returns `true` for COMMENT, HISTORY and blank-keyword cards.
    pub fn is_commentary(&self) -> bool {
        is_commentary_keyword(&self.keyword)
    }
}

/// The kind of HDU, which determines its mandatory keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HduType {
    Primary,
    Image,
    AsciiTable,
    BinaryTable,
}

// ── Parsing ──

const COMMENTARY_KEYWORDS: [&[u8; 8]; 3] = [b"COMMENT ", b"HISTORY ", b"        "];

fn is_commentary_keyword(keyword: &[u8; 8]) -> bool {
    COMMENTARY_KEYWORDS.contains(&keyword)
}

fn free_text(bytes: &[u8]) -> Result<Option<String>> {
    let text = str::from_utf8(bytes)
        .map_err(|_| Error::InvalidHeader("card is not ASCII"))?
        .trim_end();
    Ok((!text.is_empty()).then(|| String::from(text)))
}

/// Parse a single 80-byte FITS header card.
pub fn parse_card(card_bytes: &[u8; CARD_SIZE]) -> Result<Card> {
    let mut keyword = [b' '; 8];
    keyword.copy_from_slice(&card_bytes[..8]);

    if !keyword
        .iter()
        .all(|b| matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b' ' | b'-' | b'_'))
    {
        return Err(Error::InvalidKeyword);
    }

    if &keyword == b"END     " {
        return Ok(Card {
            keyword,
            value: None,
            comment: None,
        });
    }

    let has_value = !is_commentary_keyword(&keyword) && &card_bytes[8..10] == b"= ";
    if !has_value {
        return Ok(Card {
            keyword,
            value: None,
            comment: free_text(&card_bytes[8..])?,
        });
    }

    let value_field = &card_bytes[10..];
    if let Some((value, comment)) = parse_value(value_field) {
        return Ok(Card {
            keyword,
            value: Some(value),
            comment: comment.map(String::from),
        });
    }

    // `KEY     =   / note` carries an undefined value. Any other text is kept
    // raw so that only a typed lookup of this keyword fails.
    let field = str::from_utf8(value_field).map_err(|_| Error::InvalidHeader("card is not ASCII"))?;
    let (text, comment) = match field.split_once('/') {
        Some((text, comment)) => (text.trim(), Some(comment.trim())),
        None => (field.trim(), None),
    };
    let comment = comment.filter(|c| !c.is_empty()).map(String::from);
    if text.is_empty() {
        return Ok(Card {
            keyword,
            value: None,
            comment,
        });
    }
    warn!(
        keyword = %String::from_utf8_lossy(&keyword).trim_end(),
        text,
        "header value matches no literal form"
    );
    Ok(Card {
        keyword,
        value: Some(Value::Raw(String::from(text))),
        comment,
    })
}

// ── Formatting ──

/// Render a [`Card`] as an 80-byte card image.
///
/// `parse_card(&format_card(&c))` gives back `c` for every value that fits in
/// the value field.
pub fn format_card(card: &Card) -> [u8; CARD_SIZE] {
    let mut buf = [b' '; CARD_SIZE];
    buf[..8].copy_from_slice(&card.keyword);

    match (&card.value, &card.comment) {
        (Some(value), comment) => {
            buf[8] = b'=';
            buf[9] = b' ';
            let mut field = format_value(value);
            if let Some(comment) = comment {
                insert_comment(&mut field, comment);
            }
            buf[10..].copy_from_slice(&field);
        }
        (None, Some(comment)) if !card.is_end() => {
            let bytes = comment.as_bytes();
            let len = bytes.len().min(CARD_SIZE - 8);
            buf[8..8 + len].copy_from_slice(&bytes[..len]);
        }
        _ => {}
    }

    buf
}

/// Append ` / comment` after the value already written into `field`.
fn insert_comment(field: &mut [u8; 70], comment: &str) {
    let content_end = field
        .iter()
        .rposition(|&b| b != b' ')
        .map(|i| i + 1)
        .unwrap_or(0)
        .max(20);

    let sep = content_end + 1;
    if sep + 3 >= field.len() {
        return;
    }
    field[sep] = b'/';
    let start = sep + 2;
    let bytes = comment.as_bytes();
    let len = bytes.len().min(field.len() - start);
    field[start..start + len].copy_from_slice(&bytes[..len]);
}

// ── Header store ──

/// All cards of one header unit, with keyword lookup and the byte offsets
/// that locate the unit in its stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
    index: BTreeMap<String, usize>,
    start: u64,
    data_start: u64,
}

impl Header {
    /// Build a header from the cards that preceded END. `start` is the byte
    /// offset of the first card; the data unit starts at the next block
    /// boundary after the END card.
    pub fn new(cards: Vec<Card>, start: u64) -> Self {
        let mut index = BTreeMap::new();
        for (i, card) in cards.iter().enumerate() {
            if card.value.is_some() {
                index.entry(String::from(card.keyword_str())).or_insert(i);
            }
        }
        let unit_len = padded_byte_len(((cards.len() + 1) * CARD_SIZE) as u64);
        Header {
            cards,
            index,
            start,
            data_start: start + unit_len,
        }
    }

    /// Every card before END, in file order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Number of cards before END, commentary and blank cards included.
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Byte offset of the first card.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Byte offset of the data unit.
    pub fn data_start(&self) -> u64 {
        self.data_start
    }

    /// Size of the header unit in bytes, always a whole number of blocks.
    pub fn header_len(&self) -> u64 {
        self.data_start - self.start
    }

    /// First valued card with this keyword.
    pub fn get(&self, keyword: &str) -> Option<&Card> {
        self.index.get(keyword.trim()).map(|&i| &self.cards[i])
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.index.contains_key(keyword.trim())
    }

    pub fn value(&self, keyword: &str) -> Option<&Value> {
        self.get(keyword).and_then(|c| c.value.as_ref())
    }

    pub fn comment_of(&self, keyword: &str) -> Option<&str> {
        self.get(keyword).and_then(|c| c.comment.as_deref())
    }

    /// Typed value of `keyword`.
    ///
    /// Fails with [`Error::KeywordNotFound`] when absent and
    /// [`Error::TypeMismatch`] when the stored value does not convert.
    pub fn value_of<T: FromValue>(&self, keyword: &str) -> Result<T> {
        self.optional(keyword)?
            .ok_or_else(|| Error::KeywordNotFound(String::from(keyword.trim())))
    }

    /// Like [`value_of`](Self::value_of) but an absent keyword is `Ok(None)`.
    pub fn optional<T: FromValue>(&self, keyword: &str) -> Result<Option<T>> {
        match self.value(keyword) {
            None => Ok(None),
            Some(v) => T::from_value(v).map(Some).ok_or_else(|| Error::TypeMismatch {
                keyword: String::from(keyword.trim()),
                expected: T::EXPECTED,
            }),
        }
    }

    /// Like [`value_of`](Self::value_of) with a default for absent keywords.
    pub fn value_or<T: FromValue>(&self, keyword: &str, default: T) -> Result<T> {
        Ok(self.optional(keyword)?.unwrap_or(default))
    }

    /// `true` when the first card is SIMPLE.
    pub fn is_primary(&self) -> bool {
        self.cards
            .first()
            .map(|c| c.keyword_str() == "SIMPLE")
            .unwrap_or(false)
    }

    pub fn xtension(&self) -> Option<&str> {
        match self.value("XTENSION") {
            Some(Value::String(s)) => Some(s.trim()),
            _ => None,
        }
    }

    /// HDU kind from SIMPLE / XTENSION.
    pub fn hdu_type(&self) -> Result<HduType> {
        if self.is_primary() {
            return Ok(HduType::Primary);
        }
        match self.xtension() {
            Some("IMAGE") => Ok(HduType::Image),
            Some("TABLE") => Ok(HduType::AsciiTable),
            Some("BINTABLE") => Ok(HduType::BinaryTable),
            Some(other) => Err(Error::UnsupportedExtension(String::from(other))),
            None => Err(Error::KeywordNotFound(String::from("XTENSION"))),
        }
    }

    pub fn bitpix(&self) -> Result<Bitpix> {
        Bitpix::from_value(self.value_of::<i64>("BITPIX")?)
    }

    /// NAXIS1..NAXISn, in order.
    pub fn naxes(&self) -> Result<Vec<usize>> {
        let naxis: usize = self.value_of("NAXIS")?;
        (1..=naxis)
            .map(|i| self.value_of::<usize>(&format!("NAXIS{i}")))
            .collect()
    }

    /// Unpadded data unit size: `|BITPIX|/8 * GCOUNT * (PCOUNT + NAXIS1*...*NAXISn)`.
    pub fn data_len(&self) -> Result<u64> {
        let naxes = self.naxes()?;
        if naxes.is_empty() {
            return Ok(0);
        }
        let bytes_per_value = self.bitpix()?.bytes_per_pixel() as u64;
        let (pcount, gcount) = if self.is_primary() {
            (0u64, 1u64)
        } else {
            (self.value_or("PCOUNT", 0u64)?, self.value_or("GCOUNT", 1u64)?)
        };

        let elements = naxes
            .iter()
            .try_fold(1u64, |acc, &n| acc.checked_mul(n as u64))
            .and_then(|n| n.checked_add(pcount))
            .and_then(|n| n.checked_mul(gcount))
            .and_then(|n| n.checked_mul(bytes_per_value));
        elements.ok_or(Error::InvalidHeader("data size overflow"))
    }

    /// Data unit size rounded up to whole blocks.
    pub fn padded_data_len(&self) -> Result<u64> {
        Ok(padded_byte_len(self.data_len()?))
    }

    /// Offset where the following HDU's header begins.
    pub fn next_hdu_offset(&self) -> Result<u64> {
        Ok(self.data_start + self.padded_data_len()?)
    }

    /// Determine the HDU kind and check its mandatory keywords.
    pub fn validate(&self) -> Result<HduType> {
        let hdu_type = self.hdu_type()?;
        validate_required_keywords(hdu_type, &self.cards)?;
        Ok(hdu_type)
    }
}

/// Read one header unit from the current position of `reader`.
///
/// Consumes whole 2880-byte blocks until the block holding END, so the
/// stream is left on the first byte of the data unit.
pub fn read_header<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<Header> {
    let start = position(reader)?;
    let mut cards = Vec::new();
    let mut block = [0u8; BLOCK_SIZE];

    loop {
        reader.read_exact(&mut block)?;
        for raw in block.chunks_exact(CARD_SIZE) {
            let raw: &[u8; CARD_SIZE] = raw
                .try_into()
                .map_err(|_| Error::InvalidHeader("short card"))?;
            let card = parse_card(raw)?;
            if card.is_end() {
                let header = Header::new(cards, start);
                debug!(
                    start,
                    cards = header.card_count(),
                    data_start = header.data_start(),
                    "parsed header"
                );
                return Ok(header);
            }
            cards.push(card);
        }
    }
}

// ── Validation ──

fn require_keyword_at<'a>(cards: &'a [Card], index: usize, name: &str) -> Result<&'a Card> {
    match cards.get(index) {
        Some(card) if card.keyword_str() == name => Ok(card),
        _ if cards.iter().any(|c| c.keyword_str() == name) => {
            Err(Error::InvalidHeader("mandatory keyword out of order"))
        }
        _ => Err(Error::KeywordNotFound(String::from(name))),
    }
}

fn require_keyword_present(cards: &[Card], name: &str) -> Result<()> {
    if cards.iter().any(|c| c.keyword_str() == name) {
        Ok(())
    } else {
        Err(Error::KeywordNotFound(String::from(name)))
    }
}

fn require_value(card: &Card, expected: &Value, what: &'static str) -> Result<()> {
    match &card.value {
        Some(Value::String(s)) if matches!(expected, Value::String(e) if e == s.trim()) => Ok(()),
        Some(v) if v == expected => Ok(()),
        _ => Err(Error::InvalidHeader(what)),
    }
}

/// Check that the mandatory keywords for `hdu_type` are present and, for the
/// leading ones, in their required positions.
pub fn validate_required_keywords(hdu_type: HduType, cards: &[Card]) -> Result<()> {
    match hdu_type {
        HduType::Primary => {
            let simple = require_keyword_at(cards, 0, "SIMPLE")?;
            require_value(simple, &Value::Logical(true), "SIMPLE must be T")?;
            require_keyword_at(cards, 1, "BITPIX")?;
            require_keyword_at(cards, 2, "NAXIS")?;
            Ok(())
        }
        HduType::Image => {
            validate_extension(cards, "IMAGE")?;
            Ok(())
        }
        HduType::AsciiTable => validate_table(cards, "TABLE"),
        HduType::BinaryTable => validate_table(cards, "BINTABLE"),
    }
}

fn validate_extension(cards: &[Card], xtension: &str) -> Result<()> {
    let card = require_keyword_at(cards, 0, "XTENSION")?;
    require_value(
        card,
        &Value::String(String::from(xtension)),
        "unexpected XTENSION value",
    )?;
    require_keyword_at(cards, 1, "BITPIX")?;
    require_keyword_at(cards, 2, "NAXIS")?;
    require_keyword_present(cards, "PCOUNT")?;
    require_keyword_present(cards, "GCOUNT")?;
    Ok(())
}

fn validate_table(cards: &[Card], xtension: &str) -> Result<()> {
    validate_extension(cards, xtension)?;
    require_value(&cards[1], &Value::Integer(8), "table BITPIX must be 8")?;
    require_value(&cards[2], &Value::Integer(2), "table NAXIS must be 2")?;
    require_keyword_present(cards, "NAXIS1")?;
    require_keyword_present(cards, "NAXIS2")?;
    require_keyword_present(cards, "TFIELDS")?;
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod parse_tests {
    use super::*;

    fn make_card(s: &str) -> [u8; CARD_SIZE] {
        let mut buf = [b' '; CARD_SIZE];
        let bytes = s.as_bytes();
        let len = bytes.len().min(CARD_SIZE);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    #[test]
    fn parse_card_string_value() {
        let c = parse_card(&make_card("AUTHOR  = 'Acker et al.' /Catalog author(s)")).unwrap();
        assert_eq!(c.keyword_str(), "AUTHOR");
        assert_eq!(c.value, Some(Value::String(String::from("Acker et al."))));
        assert_eq!(c.comment.as_deref(), Some("Catalog author(s)"));
    }

    #[test]
    fn parse_card_integer_value() {
        let c = parse_card(&make_card("OPSIZE  =                 2112 /PSIZE of original image"))
            .unwrap();
        assert_eq!(c.value, Some(Value::Integer(2112)));
        assert_eq!(c.comment.as_deref(), Some("PSIZE of original image"));
    }

    #[test]
    fn parse_card_logical_true() {
        let c = parse_card(&make_card("SIMPLE  =                    T /Standard FITS format"))
            .unwrap();
        assert_eq!(c.value, Some(Value::Logical(true)));
    }

    #[test]
    fn parse_card_comment_keyword() {
        let c = parse_card(&make_card("COMMENT = not a value, just text")).unwrap();
        assert_eq!(c.keyword_str(), "COMMENT");
        assert!(c.value.is_none());
        assert_eq!(c.comment.as_deref(), Some("= not a value, just text"));
        assert!(c.is_commentary());
    }

    #[test]
    fn parse_card_without_value_indicator() {
        // `=` in column 9 but no blank in column 10
        let c = parse_card(&make_card("HIERARCH=x")).unwrap();
        assert!(c.value.is_none());
    }

    #[test]
    fn parse_card_blank_keyword_empty() {
        let c = parse_card(&[b' '; CARD_SIZE]).unwrap();
        assert!(c.is_blank());
        assert!(c.comment.is_none());
    }

    #[test]
    fn parse_card_end() {
        assert!(parse_card(&make_card("END")).unwrap().is_end());
    }

    #[test]
    fn parse_card_invalid_keyword_lowercase() {
        let card = make_card("bitpix  =                    16");
        assert!(matches!(parse_card(&card), Err(Error::InvalidKeyword)));
    }

    #[test]
    fn parse_card_undefined_value_with_comment() {
        let c = parse_card(&make_card("BLANK   =                      / undefined value")).unwrap();
        assert!(c.value.is_none());
        assert_eq!(c.comment.as_deref(), Some("undefined value"));
    }

    #[test]
    fn parse_card_unquoted_text_is_kept_raw() {
        let c = parse_card(&make_card("DATE-OBS= 2020-01-01 / start of exposure")).unwrap();
        assert_eq!(c.value, Some(Value::Raw(String::from("2020-01-01"))));
        assert_eq!(c.comment.as_deref(), Some("start of exposure"));

        let c = parse_card(&make_card("NAXIS   =                 2x3")).unwrap();
        assert_eq!(c.value, Some(Value::Raw(String::from("2x3"))));
        assert_eq!(parse_card(&format_card(&c)).unwrap(), c);
    }

    #[test]
    fn parse_card_hyphen_keyword() {
        let c = parse_card(&make_card("DATE-OBS= '2024-01-15'")).unwrap();
        assert_eq!(c.keyword_str(), "DATE-OBS");
    }
}

#[cfg(test)]
mod format_tests {
    use super::*;

    fn make_keyword(name: &str) -> [u8; 8] {
        let mut k = [b' '; 8];
        k[..name.len()].copy_from_slice(name.as_bytes());
        k
    }

    fn card(keyword: &str, value: Option<Value>, comment: Option<&str>) -> Card {
        Card {
            keyword: make_keyword(keyword),
            value,
            comment: comment.map(String::from),
        }
    }

    #[test]
    fn format_card_integer_value() {
        let buf = format_card(&card("NAXIS", Some(Value::Integer(2)), None));
        assert_eq!(&buf[0..10], b"NAXIS   = ");
        assert_eq!(buf[29], b'2');
    }

    #[test]
    fn format_card_with_comment() {
        let buf = format_card(&card(
            "NAXIS",
            Some(Value::Integer(2)),
            Some("number of axes"),
        ));
        let s = core::str::from_utf8(&buf).unwrap();
        assert!(s.contains("2 / number of axes"));
    }

    #[test]
    fn format_then_parse_is_identity() {
        let cards = [
            card("SIMPLE", Some(Value::Logical(true)), Some("Standard FITS format")),
            card("AUTHOR", Some(Value::String("Acker et al.".into())), Some("Catalog author(s)")),
            card("PHOTMODE", Some(Value::String("WFPC2,1,A2D7,LRF#4877.0,,CAL".into())), None),
            card("OPSIZE", Some(Value::Integer(2112)), Some("PSIZE of original image")),
            card("SUNANGLE", Some(Value::Float(141.618347)), Some("angle between sun and V1 axis")),
            card("HISTORY", None, Some("reduced with calwp2")),
            card("QUOTE", Some(Value::String("it's".into())), None),
        ];
        for c in &cards {
            let parsed = parse_card(&format_card(c)).unwrap();
            assert_eq!(&parsed, c);
        }
    }
}

#[cfg(test)]
mod store_tests {
    use super::*;
    use crate::io::{Cursor, SeekFrom};
    use crate::testutil::{float, header_bytes, int, logical, primary_cards, text};
    use alloc::vec;

    fn read(cards: &[String]) -> Header {
        let bytes = header_bytes(cards);
        read_header(&mut Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn raw_value_fails_only_its_own_lookup() {
        let mut cards = primary_cards(16, &[4, 3]);
        cards.push(String::from("DATE-OBS= 2020-01-01"));
        cards.push(int("EXPTIME", 30));
        let header = read(&cards);
        assert!(matches!(
            header.value_of::<String>("DATE-OBS"),
            Err(Error::TypeMismatch { keyword, .. }) if keyword == "DATE-OBS"
        ));
        assert_eq!(header.value_of::<i64>("EXPTIME").unwrap(), 30);
        assert_eq!(header.validate().unwrap(), HduType::Primary);
    }

    #[test]
    fn read_header_stops_on_block_boundary() {
        let mut bytes = header_bytes(&primary_cards(16, &[4, 3]));
        bytes.extend_from_slice(&[0u8; 24]);
        let mut cursor = Cursor::new(bytes);
        let header = read_header(&mut cursor).unwrap();
        assert_eq!(header.card_count(), 5);
        assert_eq!(header.header_len(), BLOCK_SIZE as u64);
        assert_eq!(position(&mut cursor).unwrap(), BLOCK_SIZE as u64);
    }

    #[test]
    fn read_header_spanning_two_blocks() {
        let mut cards = primary_cards(8, &[]);
        for i in 0..40 {
            cards.push(format!("HISTORY step {i}"));
        }
        let header = read(&cards);
        assert_eq!(header.card_count(), 43);
        assert_eq!(header.header_len(), 2 * BLOCK_SIZE as u64);
        assert_eq!(header.data_start(), 5760);
    }

    #[test]
    fn exactly_full_block_needs_second_block_for_end() {
        let mut cards = primary_cards(8, &[]);
        while cards.len() < 36 {
            cards.push(String::from("COMMENT filler"));
        }
        let header = read(&cards);
        assert_eq!(header.header_len(), 2 * BLOCK_SIZE as u64);
    }

    #[test]
    fn read_header_at_offset() {
        let mut bytes = vec![0u8; BLOCK_SIZE];
        bytes.extend(header_bytes(&primary_cards(8, &[])));
        let mut cursor = Cursor::new(bytes);
        cursor.seek(SeekFrom::Start(BLOCK_SIZE as u64)).unwrap();
        let header = read_header(&mut cursor).unwrap();
        assert_eq!(header.start(), 2880);
        assert_eq!(header.data_start(), 5760);
    }

    #[test]
    fn missing_end_is_unexpected_eof() {
        let mut bytes = header_bytes(&primary_cards(8, &[]));
        bytes[240..243].copy_from_slice(b"   ");
        let err = read_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof));
    }

    #[test]
    fn value_of_typed_lookups() {
        let header = read(&[
            logical("SIMPLE", true),
            int("BITPIX", -32),
            int("NAXIS", 0),
            text("OBJECT", "M31"),
            float("EXPTIME", 30.5),
            int("TBCOL5", 20),
        ]);
        assert_eq!(header.value_of::<i32>("TBCOL5").unwrap(), 20);
        assert_eq!(header.value_of::<f64>("EXPTIME").unwrap(), 30.5);
        assert_eq!(header.value_of::<f64>("TBCOL5").unwrap(), 20.0);
        assert_eq!(header.value_of::<String>("OBJECT").unwrap(), "M31");
        assert!(header.value_of::<bool>("SIMPLE").unwrap());
    }

    #[test]
    fn value_of_absent_is_keyword_not_found() {
        let header = read(&primary_cards(8, &[]));
        match header.value_of::<String>("AUTHOR") {
            Err(Error::KeywordNotFound(kw)) => assert_eq!(kw, "AUTHOR"),
            other => panic!("expected KeywordNotFound, got {other:?}"),
        }
    }

    #[test]
    fn value_of_wrong_type_is_mismatch() {
        let header = read(&[
            logical("SIMPLE", true),
            int("BITPIX", 8),
            int("NAXIS", 0),
            text("OBJECT", "M31"),
        ]);
        assert!(matches!(
            header.value_of::<i64>("OBJECT"),
            Err(Error::TypeMismatch { expected: "an integer", .. })
        ));
        assert!(matches!(
            header.value_of::<i64>("SIMPLE"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn optional_and_default() {
        let header = read(&primary_cards(8, &[]));
        assert_eq!(header.optional::<f64>("BSCALE").unwrap(), None);
        assert_eq!(header.value_or("BSCALE", 1.0).unwrap(), 1.0);
        assert_eq!(header.optional::<i64>("BITPIX").unwrap(), Some(8));
    }

    #[test]
    fn first_occurrence_wins() {
        let header = read(&[
            logical("SIMPLE", true),
            int("BITPIX", 8),
            int("NAXIS", 0),
            int("DUP", 1),
            int("DUP", 2),
        ]);
        assert_eq!(header.value_of::<i64>("DUP").unwrap(), 1);
        assert_eq!(header.card_count(), 5);
    }

    #[test]
    fn commentary_cards_are_counted_but_not_indexed() {
        let mut cards = primary_cards(8, &[]);
        cards.push(String::from("COMMENT first"));
        cards.push(String::from("HISTORY second"));
        cards.push(String::new());
        let header = read(&cards);
        assert_eq!(header.card_count(), 6);
        assert!(!header.contains("COMMENT"));
        assert!(!header.contains(""));
    }

    #[test]
    fn data_len_of_image() {
        let header = read(&primary_cards(-32, &[200, 200]));
        assert_eq!(header.naxes().unwrap(), vec![200, 200]);
        assert_eq!(header.data_len().unwrap(), 160_000);
        assert_eq!(header.padded_data_len().unwrap() % BLOCK_SIZE as u64, 0);
        assert_eq!(header.next_hdu_offset().unwrap(), 2880 + 161_280);
    }

    #[test]
    fn data_len_naxis_zero() {
        let header = read(&primary_cards(16, &[]));
        assert_eq!(header.data_len().unwrap(), 0);
        assert_eq!(header.next_hdu_offset().unwrap(), 2880);
    }

    #[test]
    fn data_len_includes_heap() {
        let mut cards = crate::testutil::table_cards("BINTABLE", 8, 10, 100, 0);
        cards.truncate(7);
        let header = read(&cards);
        assert_eq!(header.data_len().unwrap(), 180);
    }

    #[test]
    fn missing_naxisn() {
        let header = read(&[
            logical("SIMPLE", true),
            int("BITPIX", 8),
            int("NAXIS", 2),
            int("NAXIS1", 10),
        ]);
        assert!(matches!(header.naxes(), Err(Error::KeywordNotFound(kw)) if kw == "NAXIS2"));
    }

    // ---- validation ----

    #[test]
    fn validate_primary() {
        let header = read(&primary_cards(8, &[]));
        assert_eq!(header.validate().unwrap(), HduType::Primary);
    }

    #[test]
    fn validate_primary_out_of_order() {
        let header = read(&[
            logical("SIMPLE", true),
            int("NAXIS", 0),
            int("BITPIX", 8),
        ]);
        assert!(matches!(header.validate(), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn validate_table_requires_tfields() {
        let mut cards = crate::testutil::table_cards("BINTABLE", 4, 1, 0, 1);
        cards.pop();
        let header = read(&cards);
        assert!(matches!(header.validate(), Err(Error::KeywordNotFound(kw)) if kw == "TFIELDS"));
    }

    #[test]
    fn unknown_xtension() {
        let mut cards = crate::testutil::table_cards("A3DTABLE", 4, 1, 0, 1);
        cards.truncate(7);
        let header = read(&cards);
        assert!(matches!(header.hdu_type(), Err(Error::UnsupportedExtension(x)) if x == "A3DTABLE"));
    }
}
