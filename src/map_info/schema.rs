//! Version gates for the optional MapInfo fields.
//!
//! Newer record versions insert fields at fixed points in the layout. Instead of nesting
//! conditionals in the decoder, each insertion is a row in [`VERSION_GATES`]: the stage it
//! belongs to, the first version that carries it, and the reads to discard.

use crate::cursor::{ByteCursor, TextEncoding};

/// Point in the record layout where gated fields may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  /// Directly before width and height.
  BeforeDimensions,
  /// After the two preview image entries.
  AfterPreviews,
  /// After the eight layout/flag words, before the player table.
  Trailer,
}

/// A read whose value is not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discard {
  /// A little-endian `u32`.
  U32,
  /// A null-terminated string.
  CString,
  /// A fixed run of raw bytes.
  Bytes(usize),
}

impl Discard {
  /// Consume the field from `cursor`.
  pub fn apply(self, cursor: &mut ByteCursor<'_>) {
    match self {
      Self::U32 => {
        cursor.read_u32();
      }
      Self::CString => {
        cursor.read_null_terminated_string(TextEncoding::Utf8);
      }
      Self::Bytes(len) => {
        cursor.skip(len);
      }
    }
  }
}

/// One row of the version gate table.
#[derive(Debug, Clone, Copy)]
pub struct VersionGate {
  /// Where the fields sit in the layout.
  pub stage: Stage,
  /// First record version that carries them.
  pub min_version: u32,
  /// Reads to perform, in order.
  pub discards: &'static [Discard],
}

/// Gated fields, ordered by stage and then by on-disk order within a stage.
pub const VERSION_GATES: &[VersionGate] = &[
  VersionGate {
    stage: Stage::BeforeDimensions,
    min_version: 0x18,
    discards: &[Discard::U32, Discard::U32],
  },
  VersionGate {
    stage: Stage::AfterPreviews,
    min_version: 0x1f,
    discards: &[Discard::CString, Discard::U32],
  },
  VersionGate {
    stage: Stage::Trailer,
    min_version: 0x19,
    discards: &[Discard::Bytes(8)],
  },
  VersionGate {
    stage: Stage::Trailer,
    min_version: 0x1f,
    discards: &[Discard::Bytes(9)],
  },
  VersionGate {
    stage: Stage::Trailer,
    min_version: 0x20,
    discards: &[Discard::Bytes(4)],
  },
];

/// Discards active for `version` at `stage`, in the order they must be read.
pub fn discards_for(version: u32, stage: Stage) -> impl Iterator<Item = Discard> {
  VERSION_GATES
    .iter()
    .filter(move |gate| gate.stage == stage && version >= gate.min_version)
    .flat_map(|gate| gate.discards.iter().copied())
}

/// Apply every gated discard for `version` at `stage`.
pub fn apply_gates(cursor: &mut ByteCursor<'_>, version: u32, stage: Stage) {
  for discard in discards_for(version, stage) {
    discard.apply(cursor);
  }
}
