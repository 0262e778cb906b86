//! Conversions between `i32` and DER `INTEGER` contents (big-endian two's complement).

use picky_asn1::wrapper::IntegerAsn1;

/// Reads an `Int32` value, `None` if the encoding does not fit.
pub fn integer_to_i32(integer: &IntegerAsn1) -> Option<i32> {
    let bytes = integer.0.as_slice();

    let first = *bytes.first()?;

    if bytes.len() > 4 {
        return None;
    }

    let initial: i32 = if first & 0x80 != 0 { -1 } else { 0 };

    Some(bytes.iter().fold(initial, |acc, byte| (acc << 8) | i32::from(*byte)))
}

/// Minimal encoding of an `Int32` value.
pub fn i32_to_integer(value: i32) -> IntegerAsn1 {
    let bytes = value.to_be_bytes();

    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant_zero = bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0;
        let redundant_ones = bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0;

        if !(redundant_zero || redundant_ones) {
            break;
        }

        start += 1;
    }

    IntegerAsn1(bytes[start..].to_vec())
}
