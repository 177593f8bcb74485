//! String handling for the EO wire format: the Windows-1252 character
//! table and the reversible "encoded string" transform.

/// Byte appended to padded strings, and stripped from them again on read.
pub const PADDING_BYTE: u8 = 0xFF;

/// Code points of bytes `0x80..=0x9F`. The five bytes Windows-1252 leaves
/// unassigned keep their C1 control code point so the table stays a
/// bijection.
const HIGH_CONTROL_RANGE: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

const fn build_windows_1252() -> [char; 256] {
    let mut table = ['\0'; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = i as u8 as char;
        i += 1;
    }
    let mut j = 0;
    while j < HIGH_CONTROL_RANGE.len() {
        table[0x80 + j] = HIGH_CONTROL_RANGE[j];
        j += 1;
    }
    table
}

/// Code point of every Windows-1252 byte.
pub static WINDOWS_1252: [char; 256] = build_windows_1252();

/// Converts `text` to Windows-1252 bytes. Characters outside the code page
/// are written as `?`.
pub fn to_bytes(text: &str) -> Vec<u8> {
    text.chars().map(char_to_byte).collect()
}

/// Converts Windows-1252 bytes to a string. Never fails.
pub fn from_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| WINDOWS_1252[b as usize]).collect()
}

/// Number of bytes `text` occupies on the wire.
pub fn byte_len(text: &str) -> usize {
    text.chars().count()
}

fn char_to_byte(c: char) -> u8 {
    let code = c as u32;
    if code < 0x80 || (0xA0..=0xFF).contains(&code) {
        return code as u8;
    }
    HIGH_CONTROL_RANGE
        .iter()
        .position(|&candidate| candidate == c)
        .map(|index| 0x80 + index as u8)
        .unwrap_or(b'?')
}

/// Applies the encoded-string transform in place.
///
/// ```
/// let mut bytes = b"foo".to_vec();
/// eo_codec_schema::encode_string(&mut bytes);
/// assert_eq!(bytes, b"^0g");
/// ```
pub fn encode_string(bytes: &mut [u8]) {
    invert_characters(bytes);
    bytes.reverse();
}

/// Reverses [`encode_string`] in place.
pub fn decode_string(bytes: &mut [u8]) {
    bytes.reverse();
    invert_characters(bytes);
}

fn invert_characters(bytes: &mut [u8]) {
    let mut flippy = bytes.len() % 2 == 1;

    for byte in bytes.iter_mut() {
        let c = *byte as i32;
        let f = match (flippy, c > 0x50) {
            (false, _)    => 0,
            (true, false) => 0x2E,
            (true, true)  => -0x2E,
        };

        if (0x22..=0x7E).contains(&c) {
            *byte = (0x9F - c - f) as u8;
        }

        flippy = !flippy;
    }
}

/// Pads `bytes` with [`PADDING_BYTE`] up to `length`.
pub fn add_padding(bytes: &mut Vec<u8>, length: usize) {
    if bytes.len() < length {
        bytes.resize(length, PADDING_BYTE);
    }
}

/// Strips a trailing run of [`PADDING_BYTE`].
pub fn remove_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != PADDING_BYTE)
        .map(|i| i + 1)
        .unwrap_or(0);
    &bytes[..end]
}

#[cfg(test)]
fn encoded(text: &str) -> Vec<u8> {
    let mut bytes = to_bytes(text);
    encode_string(&mut bytes);
    bytes
}

#[test]
fn encode_string_vectors() {
    assert_eq!(encoded("foo"), b"^0g");
    assert_eq!(encoded("bar"), b"[>k");
    assert_eq!(encoded(""), b"");
    assert_eq!(encoded("Hello, World!"), b"!;a-^H s^3a:)");
    assert_eq!(from_bytes(&encoded("64² = 4096")), ";fAk b ²=i");

    let mut padded = to_bytes("bar");
    add_padding(&mut padded, 6);
    encode_string(&mut padded);
    assert_eq!(padded, [0xFF, 0xFF, 0xFF, b'-', b'l', b'=']);
}

#[test]
fn encode_string_leaves_bytes_outside_printable_range() {
    let mut bytes = vec![0x00, 0x21, 0x7F, 0xFF];
    encode_string(&mut bytes);
    assert_eq!(bytes, [0xFF, 0x7F, 0x21, 0x00]);
}

#[test]
fn decode_string_inverts_encode() {
    for text in ["", "a", "Hello, World!", "The quick brown fox jumps over the lazy dog.", "64² = 4096"] {
        let mut bytes = encoded(text);
        decode_string(&mut bytes);
        assert_eq!(from_bytes(&bytes), text);
    }
}

#[test]
fn encoded_string_edge_characters_do_not_survive() {
    // The reference client's transform is not a perfect inverse at the edges
    // of the printable range.
    assert_eq!(encoded("~"), b"O");
    let mut bytes = encoded("~");
    decode_string(&mut bytes);
    assert_eq!(bytes, b"\"");
}

#[test]
fn windows_1252_table() {
    assert_eq!(WINDOWS_1252[b'a' as usize], 'a');
    assert_eq!(WINDOWS_1252[0x80], '€');
    assert_eq!(WINDOWS_1252[0x9F], 'Ÿ');
    assert_eq!(WINDOWS_1252[0xFF], 'ÿ');

    let every_byte: Vec<u8> = (0..=255).collect();
    assert_eq!(to_bytes(&from_bytes(&every_byte)), every_byte);
}

#[test]
fn to_bytes_replaces_unmapped_characters() {
    assert_eq!(to_bytes("aÿz"), [b'a', 0xFF, b'z']);
    assert_eq!(to_bytes("€…"), [0x80, 0x85]);
    assert_eq!(to_bytes("a🍕"), [b'a', b'?']);
    assert_eq!(byte_len("a🍕é"), 3);
}

#[test]
fn remove_padding_strips_trailing_run() {
    assert_eq!(remove_padding(&[b'a', 0xFF, b'b', 0xFF, 0xFF]), [b'a', 0xFF, b'b']);
    assert_eq!(remove_padding(&[0xFF, 0xFF]), [] as [u8; 0]);
    assert_eq!(remove_padding(&[b'a']), [b'a']);
}
