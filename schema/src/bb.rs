use std::ops::{Deref, DerefMut};

use crate::error::WireError;
use crate::number::{decode_number, encode_number, NumberWidth};
use crate::string::{
    add_padding, decode_string, encode_string, from_bytes, remove_padding, to_bytes,
};

/// Byte that separates chunks.
pub const BREAK_BYTE: u8 = 0xFF;

/// Byte that replaces [`BREAK_BYTE`] inside strings written in sanitize mode.
pub const SANITIZED_BYTE: u8 = b'y';

/// An EO byte buffer meant for reading.
///
/// Reads never fail: asking for more bytes than remain returns what is
/// left, so a short number read decodes with implicit zero digits.
///
/// In chunked mode, [`remaining`](EoReader::remaining) only reaches up to
/// the next [`BREAK_BYTE`] and [`next_chunk`](EoReader::next_chunk) moves
/// past it. This models how the reference client parses chunked packets,
/// bugs included.
///
/// ```
/// let mut reader = eo_codec_schema::EoReader::new(&[0x7C, 0xFF, 0xCA, 0x31]);
/// reader.set_chunked(true);
/// assert_eq!(reader.get_char(), 123);
/// reader.next_chunk().unwrap();
/// assert_eq!(reader.get_short(), 12345);
/// ```
#[derive(Debug, Clone)]
pub struct EoReader<'a> {
    data:        &'a [u8],
    position:    usize,
    chunked:     bool,
    chunk_start: usize,
    next_break:  Option<usize>,
}

impl<'a> EoReader<'a> {
    /// Create a new EoReader that wraps the provided byte slice.
    pub fn new(data: &'a [u8]) -> EoReader<'a> {
        EoReader {
            data,
            position:    0,
            chunked:     false,
            chunk_start: 0,
            next_break:  None,
        }
    }

    /// Creates an independent reader over `length` bytes starting at
    /// `index`. Both are clamped to this reader's bounds. The new reader
    /// starts at position 0 outside chunked mode.
    pub fn slice(&self, index: usize, length: usize) -> EoReader<'a> {
        let begin = index.min(self.data.len());
        let end = begin + length.min(self.data.len() - begin);
        EoReader::new(&self.data[begin..end])
    }

    /// Creates an independent reader over everything from `index` onwards.
    pub fn slice_from(&self, index: usize) -> EoReader<'a> {
        self.slice(index, self.data.len().saturating_sub(index))
    }

    /// Creates an independent reader over everything from the current
    /// position onwards.
    pub fn slice_rest(&self) -> EoReader<'a> {
        self.slice_from(self.position)
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Total number of bytes, regardless of position or chunking.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Retrieves the current position. This starts off as 0 and ends up as
    /// `self.len()` when everything has been read.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left to read: up to the end of the data, or in chunked mode up
    /// to the next break byte.
    pub fn remaining(&self) -> usize {
        if self.chunked {
            let boundary = self.next_break.unwrap_or(self.data.len());
            boundary - self.position.min(boundary)
        } else {
            self.data.len().saturating_sub(self.position)
        }
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    /// Turns chunked mode on or off.
    ///
    /// The first time chunked mode is enabled the chunk boundary is located
    /// from the start of the current chunk. Later toggles keep the boundary
    /// that was already found.
    pub fn set_chunked(&mut self, chunked: bool) {
        self.chunked = chunked;
        if self.next_break.is_none() {
            self.next_break = Some(self.find_next_break());
        }
    }

    /// Moves past the next break byte (or to the end of the data if there is
    /// none) and locates the boundary of the following chunk. Any unread
    /// bytes of the current chunk are skipped, and bytes already read past
    /// the boundary become readable again.
    pub fn next_chunk(&mut self) -> Result<(), WireError> {
        if !self.chunked {
            return Err(WireError::NotChunked);
        }

        self.position = self.next_break.unwrap_or(self.data.len());
        if self.position < self.data.len() {
            self.position += 1;
        }

        self.chunk_start = self.position;
        self.next_break = Some(self.find_next_break());
        Ok(())
    }

    /// Whether the current chunk is terminated by an actual break byte rather
    /// than by the end of the data.
    pub fn chunk_has_break(&self) -> bool {
        self.chunked && self.next_break.map_or(false, |index| index < self.data.len())
    }

    /// Enters chunked mode until the returned guard is dropped, which restores
    /// the previous mode.
    pub fn chunked(&mut self) -> ChunkedReading<'_, 'a> {
        let previous = self.chunked;
        self.set_chunked(true);
        ChunkedReading { reader: self, previous }
    }

    /// Returns a guard that restores the current chunked mode when dropped,
    /// whatever happens to it in between.
    pub fn scope(&mut self) -> ChunkedReading<'_, 'a> {
        let previous = self.chunked;
        ChunkedReading { reader: self, previous }
    }

    /// Reads a raw byte, or 0 if nothing remains.
    pub fn get_byte(&mut self) -> u8 {
        if self.remaining() > 0 {
            let value = self.data[self.position];
            self.position += 1;
            value
        } else {
            0
        }
    }

    /// Reads up to `len` raw bytes.
    pub fn get_bytes(&mut self, len: usize) -> &'a [u8] {
        let len = len.min(self.remaining());
        let value = &self.data[self.position..self.position + len];
        self.position += len;
        value
    }

    pub fn get_number(&mut self, width: NumberWidth) -> u32 {
        decode_number(self.get_bytes(width.size()))
    }

    /// Reads a 1-byte encoded number.
    pub fn get_char(&mut self) -> u32 {
        self.get_number(NumberWidth::Char)
    }

    /// Reads a 2-byte encoded number.
    pub fn get_short(&mut self) -> u32 {
        self.get_number(NumberWidth::Short)
    }

    /// Reads a 3-byte encoded number.
    pub fn get_three(&mut self) -> u32 {
        self.get_number(NumberWidth::Three)
    }

    /// Reads a 4-byte encoded number.
    pub fn get_int(&mut self) -> u32 {
        self.get_number(NumberWidth::Int)
    }

    /// Reads every remaining byte as a string.
    pub fn get_string(&mut self) -> String {
        let len = self.remaining();
        from_bytes(self.get_bytes(len))
    }

    /// Reads a string of `len` bytes, stripping trailing padding if `padded`.
    pub fn get_fixed_string(&mut self, len: usize, padded: bool) -> String {
        let bytes = self.get_bytes(len);
        if padded {
            from_bytes(remove_padding(bytes))
        } else {
            from_bytes(bytes)
        }
    }

    /// Reads every remaining byte as an encoded string.
    pub fn get_encoded_string(&mut self) -> String {
        let len = self.remaining();
        let mut bytes = self.get_bytes(len).to_vec();
        decode_string(&mut bytes);
        from_bytes(&bytes)
    }

    /// Reads an encoded string of `len` bytes, stripping trailing padding
    /// after decoding if `padded`.
    pub fn get_fixed_encoded_string(&mut self, len: usize, padded: bool) -> String {
        let mut bytes = self.get_bytes(len).to_vec();
        decode_string(&mut bytes);
        if padded {
            from_bytes(remove_padding(&bytes))
        } else {
            from_bytes(&bytes)
        }
    }

    fn find_next_break(&self) -> usize {
        self.data[self.chunk_start.min(self.data.len())..]
            .iter()
            .position(|&b| b == BREAK_BYTE)
            .map(|offset| self.chunk_start + offset)
            .unwrap_or(self.data.len())
    }
}

/// Restores an [`EoReader`]'s chunked mode when dropped.
pub struct ChunkedReading<'r, 'a> {
    reader:   &'r mut EoReader<'a>,
    previous: bool,
}

impl<'r, 'a> Deref for ChunkedReading<'r, 'a> {
    type Target = EoReader<'a>;

    fn deref(&self) -> &EoReader<'a> {
        &*self.reader
    }
}

impl<'r, 'a> DerefMut for ChunkedReading<'r, 'a> {
    fn deref_mut(&mut self) -> &mut EoReader<'a> {
        &mut *self.reader
    }
}

impl<'r, 'a> Drop for ChunkedReading<'r, 'a> {
    fn drop(&mut self) {
        self.reader.set_chunked(self.previous);
    }
}

#[test]
fn get_byte() {
    let mut reader = EoReader::new(&[0x00, 0x01, 0x80, 0xFF]);
    assert_eq!(reader.get_byte(), 0x00);
    assert_eq!(reader.get_byte(), 0x01);
    assert_eq!(reader.get_byte(), 0x80);
    assert_eq!(reader.get_byte(), 0xFF);
    assert_eq!(reader.get_byte(), 0x00);
    assert_eq!(reader.position(), 4);
}

#[test]
fn get_bytes() {
    let mut reader = EoReader::new(&[1, 2, 3, 4, 5]);
    assert_eq!(reader.get_bytes(3), [1, 2, 3]);
    assert_eq!(reader.get_bytes(10), [4, 5]);
    assert_eq!(reader.get_bytes(1), [] as [u8; 0]);
    assert_eq!(reader.remaining(), 0);
}

#[test]
fn get_numbers() {
    let mut reader = EoReader::new(&[
        0x7C, 0xCA, 0x31, 0x7F, 0x7F, 0xFE, 0x02, 0x02, 0x02, 0x02,
    ]);
    assert_eq!(reader.get_char(), 123);
    assert_eq!(reader.get_short(), 12345);
    assert_eq!(reader.get_three(), 32004);
    assert_eq!(reader.get_int(), 1 + 253 + 64009 + 16194277);
    assert_eq!(reader.get_int(), 0);
}

#[test]
fn get_strings() {
    let mut reader = EoReader::new(b"Hello, World!");
    assert_eq!(reader.get_string(), "Hello, World!");

    let mut reader = EoReader::new(b"foobar");
    assert_eq!(reader.get_fixed_string(3, false), "foo");
    assert_eq!(reader.get_fixed_string(10, false), "bar");

    let mut reader = EoReader::new(&[b'a', b'b', 0xFF, 0xFF, b'c']);
    assert_eq!(reader.get_fixed_string(4, true), "ab");
    assert_eq!(reader.get_string(), "c");

    let mut reader = EoReader::new(&[b'a', 0xFF, b'z']);
    assert_eq!(reader.get_string(), "aÿz");
}

#[test]
fn get_encoded_strings() {
    let mut reader = EoReader::new(b"^0g");
    assert_eq!(reader.get_encoded_string(), "foo");

    let mut reader = EoReader::new(b"[>k!;a-^H s^3a:)");
    assert_eq!(reader.get_fixed_encoded_string(3, false), "bar");
    assert_eq!(reader.get_encoded_string(), "Hello, World!");

    let mut reader = EoReader::new(&[0xFF, 0xFF, 0xFF, b'-', b'l', b'=']);
    assert_eq!(reader.get_fixed_encoded_string(6, true), "bar");
}

#[test]
fn chunked_remaining() {
    let mut reader = EoReader::new(&[0x01, 0x02, 0xFF, 0x03, 0x04, 0x05, 0xFF, 0x06]);
    assert_eq!(reader.remaining(), 8);

    reader.set_chunked(true);
    assert_eq!(reader.remaining(), 2);
    assert!(reader.chunk_has_break());

    reader.get_char();
    assert_eq!(reader.remaining(), 1);

    reader.next_chunk().unwrap();
    assert_eq!(reader.position(), 3);
    assert_eq!(reader.remaining(), 3);

    reader.next_chunk().unwrap();
    assert_eq!(reader.position(), 7);
    assert_eq!(reader.remaining(), 1);
    assert!(!reader.chunk_has_break());

    reader.next_chunk().unwrap();
    assert_eq!(reader.position(), 8);
    assert_eq!(reader.remaining(), 0);

    reader.set_chunked(false);
    assert_eq!(reader.remaining(), 0);
}

#[test]
fn next_chunk_outside_chunked_mode() {
    let mut reader = EoReader::new(&[0x01, 0xFF, 0x02]);
    assert_eq!(reader.next_chunk(), Err(WireError::NotChunked));
    assert_eq!(reader.position(), 0);
}

#[test]
fn chunked_under_read() {
    let mut reader = EoReader::new(&[
        0x7C, b'g', b'a', b'r', b'b', b'a', b'g', b'e', 0xFF, 0xCA, 0x31,
    ]);
    reader.set_chunked(true);
    assert_eq!(reader.get_char(), 123);
    reader.next_chunk().unwrap();
    assert_eq!(reader.get_short(), 12345);
}

#[test]
fn chunked_over_read() {
    let mut reader = EoReader::new(&[0xFF, 0x7C]);
    reader.set_chunked(true);
    assert_eq!(reader.get_int(), 0);
    reader.next_chunk().unwrap();
    assert_eq!(reader.get_short(), 123);
}

#[test]
fn chunked_double_read() {
    let mut reader = EoReader::new(&[0xFF, 0x7C, 0xCA, 0x31]);
    assert_eq!(reader.get_int(), 254 + 123 * 253 + 201 * 64009 + 48 * 16194277);
    assert_eq!(reader.position(), 4);

    reader.set_chunked(true);
    reader.next_chunk().unwrap();
    assert_eq!(reader.position(), 1);
    assert_eq!(reader.get_char(), 123);
    assert_eq!(reader.get_short(), 12345);
}

#[test]
fn toggling_chunked_mode_keeps_boundary() {
    let mut reader = EoReader::new(&[0x02, 0xFF, 0x03, 0xFF, 0x04]);
    reader.set_chunked(true);
    reader.next_chunk().unwrap();
    reader.set_chunked(false);
    assert_eq!(reader.remaining(), 3);
    reader.set_chunked(true);
    assert_eq!(reader.remaining(), 1);
    assert_eq!(reader.get_char(), 2);
}

#[test]
fn slices_are_independent() {
    let mut reader = EoReader::new(&[0x01, 0x02, 0x03, 0x04, 0x05]);
    reader.get_byte();

    let mut rest = reader.slice_rest();
    assert_eq!(rest.len(), 4);
    assert_eq!(rest.get_byte(), 0x02);
    assert_eq!(reader.position(), 1);

    assert_eq!(reader.slice(1, 2).data(), [0x02, 0x03]);
    assert_eq!(reader.slice(3, 10).data(), [0x04, 0x05]);
    assert_eq!(reader.slice(10, 1).data(), [] as [u8; 0]);
    assert_eq!(reader.slice_from(4).data(), [0x05]);
}

#[test]
fn chunked_guard_restores_mode() {
    let mut reader = EoReader::new(&[0x02, 0xFF, 0x03]);
    {
        let mut chunked = reader.chunked();
        assert!(chunked.is_chunked());
        chunked.next_chunk().unwrap();
    }
    assert!(!reader.is_chunked());
    assert_eq!(reader.position(), 2);
}

#[test]
fn chunked_guard_restores_mode_on_error_path() {
    fn fails(reader: &mut EoReader) -> Result<(), WireError> {
        let mut scope = reader.scope();
        scope.set_chunked(false);
        scope.next_chunk()
    }

    let mut reader = EoReader::new(&[0x02, 0xFF, 0x03]);
    reader.set_chunked(true);
    assert_eq!(fails(&mut reader), Err(WireError::NotChunked));
    assert!(reader.is_chunked());
}

/// An EO byte buffer meant for writing.
///
/// Example usage:
///
/// ```
/// let mut writer = eo_codec_schema::EoWriter::new();
/// writer.add_short(12345).unwrap();
/// writer.add_encoded_string("foo");
/// assert_eq!(writer.into_bytes(), [0xCA, 0x31, b'^', b'0', b'g']);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EoWriter {
    data:     Vec<u8>,
    sanitize: bool,
}

impl EoWriter {
    /// Creates an empty EoWriter ready for writing.
    pub fn new() -> EoWriter {
        EoWriter::default()
    }

    /// Consumes this buffer and returns the underlying backing store.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_sanitizing(&self) -> bool {
        self.sanitize
    }

    /// While on, every `0xFF` inside written string content becomes `'y'`.
    pub fn set_sanitizing(&mut self, sanitize: bool) {
        self.sanitize = sanitize;
    }

    /// Enters sanitize mode until the returned guard is dropped, which
    /// restores the previous mode.
    pub fn sanitized(&mut self) -> SanitizedWriting<'_> {
        let previous = self.sanitize;
        self.sanitize = true;
        SanitizedWriting { writer: self, previous }
    }

    /// Returns a guard that restores the current sanitize mode when dropped.
    pub fn scope(&mut self) -> SanitizedWriting<'_> {
        let previous = self.sanitize;
        SanitizedWriting { writer: self, previous }
    }

    /// Write a raw byte to the end of the buffer.
    pub fn add_byte(&mut self, value: u8) {
        self.data.push(value);
    }

    /// Write a raw byte slice to the end of the buffer.
    pub fn add_bytes(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
    }

    pub fn add_number(&mut self, value: u32, width: NumberWidth) -> Result<(), WireError> {
        let bytes = encode_number(value, width)?;
        self.data.extend_from_slice(&bytes);
        Ok(())
    }

    /// Write a 1-byte encoded number. Fails unless `value < 253`.
    pub fn add_char(&mut self, value: u32) -> Result<(), WireError> {
        self.add_number(value, NumberWidth::Char)
    }

    /// Write a 2-byte encoded number. Fails unless `value < 64009`.
    pub fn add_short(&mut self, value: u32) -> Result<(), WireError> {
        self.add_number(value, NumberWidth::Short)
    }

    /// Write a 3-byte encoded number. Fails unless `value < 16194277`.
    pub fn add_three(&mut self, value: u32) -> Result<(), WireError> {
        self.add_number(value, NumberWidth::Three)
    }

    /// Write a 4-byte encoded number. Fails unless `value < 4097152081`.
    pub fn add_int(&mut self, value: u32) -> Result<(), WireError> {
        self.add_number(value, NumberWidth::Int)
    }

    /// Write a string with no length prefix or terminator.
    pub fn add_string(&mut self, value: &str) {
        let mut bytes = to_bytes(value);
        self.sanitize_string(&mut bytes);
        self.data.extend_from_slice(&bytes);
    }

    /// Write a string of exactly `len` bytes, or at most `len` bytes padded
    /// with `0xFF` if `padded`.
    pub fn add_fixed_string(&mut self, value: &str, len: usize, padded: bool) -> Result<(), WireError> {
        let mut bytes = to_bytes(value);
        check_string_length(value, &bytes, len, padded)?;
        self.sanitize_string(&mut bytes);
        if padded {
            add_padding(&mut bytes, len);
        }
        self.data.extend_from_slice(&bytes);
        Ok(())
    }

    /// Write an encoded string with no length prefix or terminator.
    pub fn add_encoded_string(&mut self, value: &str) {
        let mut bytes = to_bytes(value);
        self.sanitize_string(&mut bytes);
        encode_string(&mut bytes);
        self.data.extend_from_slice(&bytes);
    }

    /// Write an encoded string of exactly `len` bytes, or at most `len`
    /// bytes if `padded`. Padding is added before encoding.
    pub fn add_fixed_encoded_string(&mut self, value: &str, len: usize, padded: bool) -> Result<(), WireError> {
        let mut bytes = to_bytes(value);
        check_string_length(value, &bytes, len, padded)?;
        self.sanitize_string(&mut bytes);
        if padded {
            add_padding(&mut bytes, len);
        }
        encode_string(&mut bytes);
        self.data.extend_from_slice(&bytes);
        Ok(())
    }

    fn sanitize_string(&self, bytes: &mut [u8]) {
        if self.sanitize {
            for byte in bytes.iter_mut().filter(|b| **b == BREAK_BYTE) {
                *byte = SANITIZED_BYTE;
            }
        }
    }
}

fn check_string_length(value: &str, bytes: &[u8], len: usize, padded: bool) -> Result<(), WireError> {
    if padded {
        if bytes.len() > len {
            return Err(WireError::PaddedStringTooLong {
                string: value.to_owned(),
                max:    len,
            });
        }
    } else if bytes.len() != len {
        return Err(WireError::FixedStringLength {
            string:   value.to_owned(),
            expected: len,
        });
    }
    Ok(())
}

/// Restores an [`EoWriter`]'s sanitize mode when dropped.
pub struct SanitizedWriting<'w> {
    writer:   &'w mut EoWriter,
    previous: bool,
}

impl<'w> Deref for SanitizedWriting<'w> {
    type Target = EoWriter;

    fn deref(&self) -> &EoWriter {
        &*self.writer
    }
}

impl<'w> DerefMut for SanitizedWriting<'w> {
    fn deref_mut(&mut self) -> &mut EoWriter {
        &mut *self.writer
    }
}

impl<'w> Drop for SanitizedWriting<'w> {
    fn drop(&mut self) {
        self.writer.sanitize = self.previous;
    }
}

#[cfg(test)]
fn write_once(cb: fn(&mut EoWriter)) -> Vec<u8> {
    let mut writer = EoWriter::new();
    cb(&mut writer);
    writer.into_bytes()
}

#[test]
fn add_bytes() {
    assert_eq!(write_once(|w| w.add_byte(0xFF)), [0xFF]);
    assert_eq!(write_once(|w| w.add_bytes(&[1, 2, 3])), [1, 2, 3]);
}

#[test]
fn add_numbers() {
    assert_eq!(write_once(|w| w.add_char(123).unwrap()), [0x7C]);
    assert_eq!(write_once(|w| w.add_short(12345).unwrap()), [0xCA, 0x31]);
    assert_eq!(write_once(|w| w.add_three(32004).unwrap()), [0x7F, 0x7F, 0xFE]);
    assert_eq!(write_once(|w| w.add_int(0).unwrap()), [0xFE, 0xFE, 0xFE, 0xFE]);
}

#[test]
fn add_number_out_of_range_writes_nothing() {
    let mut writer = EoWriter::new();
    assert_eq!(
        writer.add_char(253),
        Err(WireError::NumberOutOfRange { value: 253, max: 252 })
    );
    assert!(writer.add_short(64009).is_err());
    assert!(writer.add_three(16194277).is_err());
    assert!(writer.add_int(4097152081).is_err());
    assert!(writer.is_empty());
}

#[test]
fn add_strings() {
    assert_eq!(write_once(|w| w.add_string("foo")), b"foo");
    assert_eq!(write_once(|w| w.add_fixed_string("foo", 3, false).unwrap()), b"foo");
    assert_eq!(
        write_once(|w| w.add_fixed_string("foo", 5, true).unwrap()),
        [b'f', b'o', b'o', 0xFF, 0xFF]
    );
    assert_eq!(write_once(|w| w.add_encoded_string("foo")), b"^0g");
    assert_eq!(write_once(|w| w.add_fixed_encoded_string("bar", 3, false).unwrap()), b"[>k");
    assert_eq!(
        write_once(|w| w.add_fixed_encoded_string("bar", 6, true).unwrap()),
        [0xFF, 0xFF, 0xFF, b'-', b'l', b'=']
    );
}

#[test]
fn add_fixed_string_length_mismatch() {
    let mut writer = EoWriter::new();
    assert_eq!(
        writer.add_fixed_string("foo", 2, false),
        Err(WireError::FixedStringLength { string: "foo".to_owned(), expected: 2 })
    );
    assert_eq!(
        writer.add_fixed_string("foo", 4, false),
        Err(WireError::FixedStringLength { string: "foo".to_owned(), expected: 4 })
    );
    assert_eq!(
        writer.add_fixed_string("foo", 2, true),
        Err(WireError::PaddedStringTooLong { string: "foo".to_owned(), max: 2 })
    );
    assert!(writer.add_fixed_encoded_string("foo", 4, false).is_err());
    assert!(writer.add_fixed_encoded_string("foo", 2, true).is_err());
    assert!(writer.is_empty());
}

#[test]
fn sanitized_strings() {
    let mut writer = EoWriter::new();
    writer.add_string("aÿz");
    writer.set_sanitizing(true);
    writer.add_string("aÿz");
    writer.add_fixed_string("ÿ", 2, true).unwrap();
    writer.add_byte(0xFF);
    assert_eq!(
        writer.into_bytes(),
        [b'a', 0xFF, b'z', b'a', b'y', b'z', b'y', 0xFF, 0xFF]
    );
}

#[test]
fn sanitized_guard_restores_mode() {
    let mut writer = EoWriter::new();
    {
        let mut sanitized = writer.sanitized();
        sanitized.add_string("ÿ");
        {
            let mut scope = sanitized.scope();
            scope.set_sanitizing(false);
            scope.add_string("ÿ");
        }
        sanitized.add_string("ÿ");
    }
    assert!(!writer.is_sanitizing());
    writer.add_string("ÿ");
    assert_eq!(writer.into_bytes(), [b'y', 0xFF, b'y', 0xFF]);
}
