//! Big-endian field decoding.
//!
//! FITS stores every binary number most-significant byte first. Integer
//! widths come straight from `from_be_bytes`; floats are first read as the
//! unsigned integer of the same width and then reinterpreted bit-for-bit,
//! so a NaN payload survives unchanged.
//!
//! All readers index the front of `buf` and panic when it is too short;
//! callers slice fields out of a row whose width has already been checked.

#[inline]
pub fn read_i16_be(buf: &[u8]) -> i16 {
    i16::from_be_bytes([buf[0], buf[1]])
}

#[inline]
pub fn read_i32_be(buf: &[u8]) -> i32 {
    i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])
}

#[inline]
pub fn read_u32_be(buf: &[u8]) -> u32 {
    u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])
}

#[inline]
pub fn read_i64_be(buf: &[u8]) -> i64 {
    i64::from_be_bytes([
        buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
    ])
}

#[inline]
pub fn read_u64_be(buf: &[u8]) -> u64 {
    u64::from_be_bytes([
        buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
    ])
}

/// Read a big-endian IEEE 754 single from the first 4 bytes of the slice.
#[inline]
pub fn read_f32_be(buf: &[u8]) -> f32 {
    f32::from_bits(read_u32_be(buf))
}

/// Read a big-endian IEEE 754 double from the first 8 bytes of the slice.
#[inline]
pub fn read_f64_be(buf: &[u8]) -> f64 {
    f64::from_bits(read_u64_be(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Known byte sequence tests ---

    #[test]
    fn known_bytes_i16() {
        assert_eq!(read_i16_be(&[0x01, 0x02]), 0x0102);
        assert_eq!(read_i16_be(&[0xFF, 0xFE]), -2);
    }

    #[test]
    fn known_bytes_i32() {
        assert_eq!(read_i32_be(&[0x00, 0x00, 0x00, 0x01]), 1);
        assert_eq!(read_i32_be(&[0x80, 0x00, 0x00, 0x00]), i32::MIN);
    }

    #[test]
    fn known_bytes_i64() {
        let bytes = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00];
        assert_eq!(read_i64_be(&bytes), 256);
    }

    #[test]
    fn known_bytes_f32() {
        // 1.0f32 = 0x3F800000
        assert_eq!(read_f32_be(&[0x3F, 0x80, 0x00, 0x00]), 1.0);
        // -2.5f32 = 0xC0200000
        assert_eq!(read_f32_be(&[0xC0, 0x20, 0x00, 0x00]), -2.5);
    }

    #[test]
    fn known_bytes_f64() {
        // 1.0f64 = 0x3FF0000000000000
        let bytes = [0x3F, 0xF0, 0, 0, 0, 0, 0, 0];
        assert_eq!(read_f64_be(&bytes), 1.0);
    }

    #[test]
    fn f32_nan_payload_preserved() {
        let bits: u32 = 0x7FC0_0001;
        let v = read_f32_be(&bits.to_be_bytes());
        assert!(v.is_nan());
        assert_eq!(v.to_bits(), bits);
    }

    #[test]
    fn read_at_offset() {
        let buf = [0xAA, 0x00, 0x00, 0x00, 0x2A, 0xBB];
        assert_eq!(read_i32_be(&buf[1..]), 42);
    }
}
