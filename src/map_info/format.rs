/// Shape of a MapInfo payload as stored in the map container.
///
/// Older tooling writes MapInfo as XML. Only the binary form is decoded by this crate; the
/// sniffed format lets callers report XML payloads instead of decoding them as garbage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapInfoFormat {
  /// Binary record, handled by [`crate::map_info::decode`].
  Binary,
  /// XML document.
  Xml,
  /// Zero-length or whitespace-only payload.
  Empty,
}

impl MapInfoFormat {
  /// Classify a payload by its first non-whitespace byte.
  pub fn sniff(payload: &[u8]) -> Self {
    match payload.iter().find(|byte| !byte.is_ascii_whitespace()) {
      None => Self::Empty,
      Some(b'<') => Self::Xml,
      Some(_) => Self::Binary,
    }
  }
}
