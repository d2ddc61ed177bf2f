//! Data structures produced while decoding map metadata and resolving model dependencies.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Decoded MapInfo record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapMetadata {
  /// Record version read from the header.
  pub version: u32,
  /// Map width in cells.
  pub width: u32,
  /// Map height in cells.
  pub height: u32,
  /// Fog of war type identifier.
  pub fog_type: String,
  /// Terrain tile set identifier.
  pub tile_set: String,
  /// Left camera bound.
  pub camera_left: u32,
  /// Bottom camera bound.
  pub camera_bottom: u32,
  /// Right camera bound.
  pub camera_right: u32,
  /// Top camera bound.
  pub camera_top: u32,
  /// Base terrain height, stored on disk as a 20.12 fixed point value.
  pub base_height: f64,
  /// Archive path of the loading screen image.
  pub load_screen_path: String,
  /// Player slots in declaration order.
  pub players: Vec<PlayerSlot>,
  /// Start location indices in declaration order.
  pub start_locations: Vec<u32>,
  /// True once the magic bytes matched.
  pub valid: bool,
}

impl MapMetadata {
  /// Whether the record carries enough information to lay out a map plane.
  pub fn is_renderable(&self) -> bool {
    self.valid && self.width > 0 && self.height > 0
  }
}

/// Player slot declared in the MapInfo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSlot {
  /// Player identifier.
  pub id: u8,
  /// Who controls the slot.
  pub control: PlayerControl,
  /// Team colour index.
  pub color_index: u32,
  /// Race identifier, e.g. `Terr`.
  pub race: String,
  /// Field with no known meaning, preserved as read.
  pub unknown: u32,
  /// Index into the start location list.
  pub start_point_index: u32,
  /// AI difficulty level.
  pub ai_difficulty: u32,
  /// Decal identifier.
  pub decal: String,
}

/// Controller of a player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerControl {
  /// Human player.
  User,
  /// Computer player.
  Computer,
  /// Neutral slot.
  Neutral,
  /// Hostile slot.
  Hostile,
  /// A control value outside the known range, kept verbatim.
  Unknown(u32),
}

impl PlayerControl {
  /// Map the on-disk discriminant to a controller.
  pub fn from_raw(raw: u32) -> Self {
    match raw {
      1 => Self::User,
      2 => Self::Computer,
      3 => Self::Neutral,
      4 => Self::Hostile,
      other => Self::Unknown(other),
    }
  }

  /// The on-disk discriminant.
  pub fn to_raw(self) -> u32 {
    match self {
      Self::User => 1,
      Self::Computer => 2,
      Self::Neutral => 3,
      Self::Hostile => 4,
      Self::Unknown(other) => other,
    }
  }
}

/// Part of the MapInfo record a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordSection {
  /// The player slot table.
  Players,
  /// The start location table.
  StartLocations,
}

/// Non-fatal problem noticed while decoding a MapInfo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DecodeWarning {
  /// The leading four bytes were not a recognised magic.
  InvalidMagic {
    /// Bytes found where the magic was expected.
    found: Vec<u8>,
  },
  /// The buffer ended inside the fields that precede the player table.
  HeaderTruncated {
    /// Offset of the field that could not be read in full.
    offset: usize,
  },
  /// The buffer ended where a table's entry count should be.
  CountMissing {
    /// Table whose count is absent.
    section: RecordSection,
    /// Offset at which the count was expected.
    offset: usize,
  },
  /// The buffer ended before a table held its declared number of entries.
  Truncated {
    /// Table that was cut short.
    section: RecordSection,
    /// Entries the record declared.
    declared: u32,
    /// Entries actually recovered.
    decoded: usize,
  },
  /// A player slot used an unrecognised control value.
  UnknownControl {
    /// Player identifier of the slot.
    player: u8,
    /// Raw control value.
    raw: u32,
  },
}

/// Decoded metadata together with every degradation encountered on the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeOutcome {
  /// The (possibly partial) decoded record.
  pub metadata: MapMetadata,
  /// Warnings in the order they were raised.
  pub warnings: Vec<DecodeWarning>,
}

impl DecodeOutcome {
  /// True when the record decoded without any warnings.
  pub fn is_complete(&self) -> bool {
    self.warnings.is_empty()
  }
}

/// Texture path discovered inside a model payload, using backslash separators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureReference(String);

impl TextureReference {
  /// Wrap a raw token, normalising forward slashes to backslashes.
  pub fn new(raw: impl AsRef<str>) -> Self {
    Self(raw.as_ref().replace('/', "\\"))
  }

  /// Borrow the normalised path.
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for TextureReference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for TextureReference {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

/// Outcome of probing the candidates generated for one reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "path", rename_all = "camelCase")]
pub enum Resolution {
  /// The first candidate accepted by the probe.
  Resolved(String),
  /// No candidate was accepted.
  Unresolved,
}

impl Resolution {
  /// The resolved archive path, if any.
  pub fn path(&self) -> Option<&str> {
    match self {
      Self::Resolved(path) => Some(path),
      Self::Unresolved => None,
    }
  }

  /// True for [`Resolution::Resolved`].
  pub fn is_resolved(&self) -> bool {
    matches!(self, Self::Resolved(_))
  }
}

/// Summary of a dependency extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
  /// References copied out of the archive, with their archive path.
  pub extracted: Vec<(TextureReference, String)>,
  /// References that did not resolve or failed to copy.
  pub missing: Vec<TextureReference>,
}
