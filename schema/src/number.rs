//! The EO positional number encoding.
//!
//! Numbers are written as 1 to 4 base-253 digits, least significant first.
//! A digit `d` is stored as the byte `d + 1`, except that a zero digit is
//! stored as `0xFE`.

use crate::error::WireError;

/// Exclusive upper bound of a 1-byte number.
pub const CHAR_MAX: u32 = 253;
/// Exclusive upper bound of a 2-byte number.
pub const SHORT_MAX: u32 = CHAR_MAX * CHAR_MAX;
/// Exclusive upper bound of a 3-byte number.
pub const THREE_MAX: u32 = CHAR_MAX * CHAR_MAX * CHAR_MAX;
/// Exclusive upper bound of a 4-byte number.
pub const INT_MAX: u32 = CHAR_MAX * CHAR_MAX * CHAR_MAX * CHAR_MAX;

const ZERO_DIGIT: u8 = 0xFE;
const MULTIPLIERS: [u32; 4] = [1, CHAR_MAX, SHORT_MAX, THREE_MAX];

/// The four wire widths of an encoded number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberWidth {
    Char,
    Short,
    Three,
    Int,
}

impl NumberWidth {
    /// Number of bytes on the wire.
    pub fn size(self) -> usize {
        match self {
            NumberWidth::Char  => 1,
            NumberWidth::Short => 2,
            NumberWidth::Three => 3,
            NumberWidth::Int   => 4,
        }
    }

    /// Exclusive upper bound of the values representable at this width.
    pub fn max(self) -> u32 {
        match self {
            NumberWidth::Char  => CHAR_MAX,
            NumberWidth::Short => SHORT_MAX,
            NumberWidth::Three => THREE_MAX,
            NumberWidth::Int   => INT_MAX,
        }
    }

    /// Looks up a width by its schema name (`char`, `short`, `three`, `int`).
    pub fn from_name(name: &str) -> Option<NumberWidth> {
        match name {
            "char"  => Some(NumberWidth::Char),
            "short" => Some(NumberWidth::Short),
            "three" => Some(NumberWidth::Three),
            "int"   => Some(NumberWidth::Int),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NumberWidth::Char  => "char",
            NumberWidth::Short => "short",
            NumberWidth::Three => "three",
            NumberWidth::Int   => "int",
        }
    }
}

/// Encodes `number` as exactly `width.size()` bytes.
///
/// ```
/// use eo_codec_schema::{encode_number, NumberWidth};
/// assert_eq!(encode_number(12345, NumberWidth::Short), Ok(vec![0xCA, 0x31]));
/// assert!(encode_number(253, NumberWidth::Char).is_err());
/// ```
pub fn encode_number(number: u32, width: NumberWidth) -> Result<Vec<u8>, WireError> {
    if number >= width.max() {
        return Err(WireError::NumberOutOfRange {
            value: number as u64,
            max:   width.max() as u64 - 1,
        });
    }

    let mut bytes = Vec::with_capacity(width.size());
    let mut rest = number;
    for _ in 0..width.size() {
        let digit = rest % CHAR_MAX;
        rest /= CHAR_MAX;
        bytes.push(if digit == 0 { ZERO_DIGIT } else { digit as u8 + 1 });
    }
    Ok(bytes)
}

/// Decodes up to four bytes into a number. Never fails.
///
/// A leading `0xFE` makes the whole value zero, whatever follows it; the
/// reference client reads numbers this way and so must we. Bytes past the
/// fourth are ignored and `0x00` is treated like a zero digit.
pub fn decode_number(bytes: &[u8]) -> u32 {
    if bytes.first() == Some(&ZERO_DIGIT) {
        return 0;
    }

    bytes
        .iter()
        .take(MULTIPLIERS.len())
        .zip(MULTIPLIERS.iter())
        .map(|(&byte, &multiplier)| {
            let digit = if byte == ZERO_DIGIT { 0 } else { byte.saturating_sub(1) as u32 };
            digit * multiplier
        })
        .sum()
}

#[cfg(test)]
fn round_trip(number: u32, width: NumberWidth) -> u32 {
    decode_number(&encode_number(number, width).unwrap())
}

#[test]
fn encode_number_bytes() {
    assert_eq!(encode_number(0, NumberWidth::Char), Ok(vec![0xFE]));
    assert_eq!(encode_number(1, NumberWidth::Char), Ok(vec![0x02]));
    assert_eq!(encode_number(123, NumberWidth::Char), Ok(vec![0x7C]));
    assert_eq!(encode_number(252, NumberWidth::Char), Ok(vec![0xFD]));
    assert_eq!(encode_number(0, NumberWidth::Short), Ok(vec![0xFE, 0xFE]));
    assert_eq!(encode_number(253, NumberWidth::Short), Ok(vec![0xFE, 0x02]));
    assert_eq!(encode_number(12345, NumberWidth::Short), Ok(vec![0xCA, 0x31]));
    assert_eq!(encode_number(32004, NumberWidth::Three), Ok(vec![0x7F, 0x7F, 0xFE]));
    assert_eq!(
        encode_number(INT_MAX - 1, NumberWidth::Int),
        Ok(vec![0xFD, 0xFD, 0xFD, 0xFD])
    );
}

#[test]
fn encode_number_out_of_range() {
    assert_eq!(
        encode_number(253, NumberWidth::Char),
        Err(WireError::NumberOutOfRange { value: 253, max: 252 })
    );
    assert!(encode_number(SHORT_MAX, NumberWidth::Short).is_err());
    assert!(encode_number(THREE_MAX, NumberWidth::Three).is_err());
    assert!(encode_number(INT_MAX, NumberWidth::Int).is_err());
    assert!(encode_number(u32::MAX, NumberWidth::Int).is_err());
    assert_eq!(
        [CHAR_MAX, SHORT_MAX, THREE_MAX, INT_MAX],
        [253, 64009, 16194277, 4097152081]
    );
}

#[test]
fn number_round_trip() {
    for width in [NumberWidth::Char, NumberWidth::Short, NumberWidth::Three, NumberWidth::Int] {
        let max = width.max();
        for number in [0, 1, max / 2, max - 2, max - 1] {
            assert_eq!(round_trip(number, width), number, "{} at {:?}", number, width);
        }
    }
}

#[test]
fn decode_number_leading_zero_digit() {
    assert_eq!(decode_number(&[0xFE, 0x80, 0x81, 0x82]), 0);
    assert_eq!(decode_number(&[0x01, 0xFE]), 0);
    assert_eq!(decode_number(&[0xCA, 0x31]), 12345);
}

#[test]
fn decode_number_inner_zero_digit() {
    assert_eq!(decode_number(&[0x7F, 0x7F, 0xFE]), 32004);
    assert_eq!(decode_number(&[0x02, 0xFE, 0x02]), 1 + SHORT_MAX);
}

#[test]
fn decode_number_is_total() {
    assert_eq!(decode_number(&[]), 0);
    assert_eq!(decode_number(&[0x00]), 0);
    assert_eq!(decode_number(&[0xFF]), 254);
    assert_eq!(
        decode_number(&[0xFF, 0xFF, 0xFF, 0xFF]),
        254 * (1 + CHAR_MAX + SHORT_MAX + THREE_MAX)
    );
    assert_eq!(decode_number(&[0x02, 0x02, 0x02, 0x02, 0x02]), 1 + CHAR_MAX + SHORT_MAX + THREE_MAX);
}

#[test]
fn decode_is_lenient_encode_is_canonical() {
    // 0x01 also means "zero digit" to the decoder, but is never emitted.
    let lenient = [0x05, 0x01];
    let number = decode_number(&lenient);
    assert_eq!(number, 4);

    let canonical = encode_number(number, NumberWidth::Short).unwrap();
    assert_eq!(canonical, vec![0x05, 0xFE]);
    assert_eq!(decode_number(&canonical), number);
}
