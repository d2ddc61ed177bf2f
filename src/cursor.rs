//! Sequential little-endian reader that never fails on short input.
//!
//! Every read clamps to the bytes that remain. Fixed-width integer reads that run past the end
//! return `0`, consume whatever was left, and flag the cursor as overrun so decoders can tell a
//! clean parse from a degraded one without threading errors through every field.

use byteorder::{ByteOrder, LittleEndian};

/// Text decoding applied to raw string bytes. Both variants are lossy and never fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
  /// UTF-8, with invalid sequences replaced by U+FFFD.
  #[default]
  Utf8,
  /// ISO-8859-1, mapping every byte to the code point of the same value.
  Latin1,
}

impl TextEncoding {
  /// Decode `bytes` into an owned string.
  pub fn decode(self, bytes: &[u8]) -> String {
    match self {
      Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
      Self::Latin1 => bytes.iter().map(|&byte| char::from(byte)).collect(),
    }
  }
}

/// Bounds-tolerant reader over an immutable byte buffer.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
  buffer: &'a [u8],
  offset: usize,
  overrun_at: Option<usize>,
}

impl<'a> ByteCursor<'a> {
  /// Start reading at the beginning of `buffer`.
  pub fn new(buffer: &'a [u8]) -> Self {
    Self {
      buffer,
      offset: 0,
      overrun_at: None,
    }
  }

  /// Current read offset.
  pub fn position(&self) -> usize {
    self.offset
  }

  /// Number of unread bytes.
  pub fn remaining(&self) -> usize {
    self.buffer.len() - self.offset
  }

  /// True once every byte has been consumed.
  pub fn at_end(&self) -> bool {
    self.offset == self.buffer.len()
  }

  /// True if any fixed-width read has hit the end of the buffer.
  pub fn overrun(&self) -> bool {
    self.overrun_at.is_some()
  }

  /// Offset at which the first short fixed-width read started.
  pub fn overrun_at(&self) -> Option<usize> {
    self.overrun_at
  }

  /// Read a single byte, or `0` at end of buffer.
  pub fn read_u8(&mut self) -> u8 {
    self.take_exact(1).map_or(0, |bytes| bytes[0])
  }

  /// Read a little-endian `u16`, or `0` if fewer than two bytes remain.
  pub fn read_u16(&mut self) -> u16 {
    self.take_exact(2).map_or(0, LittleEndian::read_u16)
  }

  /// Read a little-endian `u32`, or `0` if fewer than four bytes remain.
  pub fn read_u32(&mut self) -> u32 {
    self.take_exact(4).map_or(0, LittleEndian::read_u32)
  }

  /// Read up to `len` bytes. Returns fewer when the buffer runs out; never pads.
  pub fn read_bytes(&mut self, len: usize) -> &'a [u8] {
    let end = self.offset.saturating_add(len).min(self.buffer.len());
    let slice = &self.buffer[self.offset..end];
    self.offset = end;
    slice
  }

  /// Advance by up to `len` bytes, returning how many were actually skipped.
  pub fn skip(&mut self, len: usize) -> usize {
    self.read_bytes(len).len()
  }

  /// Decode the next `len` bytes (or fewer, at end of buffer) as text.
  pub fn read_fixed_string(&mut self, len: usize, encoding: TextEncoding) -> String {
    encoding.decode(self.read_bytes(len))
  }

  /// Read until a zero byte, consuming the terminator. A missing terminator reads to the end.
  pub fn read_null_terminated_string(&mut self, encoding: TextEncoding) -> String {
    let rest = &self.buffer[self.offset..];
    match rest.iter().position(|&byte| byte == 0) {
      Some(terminator) => {
        self.offset += terminator + 1;
        encoding.decode(&rest[..terminator])
      }
      None => {
        self.offset = self.buffer.len();
        encoding.decode(rest)
      }
    }
  }

  fn take_exact(&mut self, len: usize) -> Option<&'a [u8]> {
    if self.remaining() < len {
      self.overrun_at.get_or_insert(self.offset);
      self.offset = self.buffer.len();
      return None;
    }

    let slice = &self.buffer[self.offset..self.offset + len];
    self.offset += len;
    Some(slice)
  }
}
