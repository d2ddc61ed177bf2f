//! Tolerant decoder for the binary MapInfo record.

use tracing::{debug, warn};

use super::schema::{Stage, apply_gates};
use crate::cursor::{ByteCursor, TextEncoding};
use crate::models::{
  DecodeOutcome, DecodeWarning, MapMetadata, PlayerControl, PlayerSlot, RecordSection,
};

/// Magic as written by the game's own tools.
pub const MAGIC: [u8; 4] = *b"MapI";
/// Byte-swapped magic, also found in shipped maps.
pub const MAGIC_SWAPPED: [u8; 4] = *b"IpaM";

const PREVIEW_WITH_PATH: u32 = 2;
const BASE_HEIGHT_SCALE: f64 = 4096.0;
const LAYOUT_WORDS: usize = 8;

/// Decode a MapInfo payload, discarding warnings.
pub fn decode(buffer: &[u8]) -> MapMetadata {
  decode_with_warnings(buffer).metadata
}

/// Decode a MapInfo payload and report every degradation encountered.
///
/// Only a magic mismatch leaves `valid` unset. Truncation anywhere after the magic yields a
/// partially populated record plus one warning naming where the data ran out:
/// [`DecodeWarning::HeaderTruncated`] inside the header, [`DecodeWarning::CountMissing`] where a
/// table count should be, and [`DecodeWarning::Truncated`] inside a table.
pub fn decode_with_warnings(buffer: &[u8]) -> DecodeOutcome {
  let mut cursor = ByteCursor::new(buffer);
  let mut metadata = MapMetadata::default();
  let mut warnings = Vec::new();

  let magic = cursor.read_bytes(MAGIC.len());
  if magic != MAGIC && magic != MAGIC_SWAPPED {
    warn!(found = ?magic, "MapInfo magic not recognised");
    warnings.push(DecodeWarning::InvalidMagic {
      found: magic.to_vec(),
    });
    return DecodeOutcome { metadata, warnings };
  }
  metadata.valid = true;

  read_header(&mut cursor, &mut metadata);
  if let Some(offset) = cursor.overrun_at() {
    warn!(version = metadata.version, offset, "MapInfo header truncated");
    warnings.push(DecodeWarning::HeaderTruncated { offset });
  }

  read_players(&mut cursor, &mut metadata, &mut warnings);
  read_start_locations(&mut cursor, &mut metadata, &mut warnings);

  debug!(
    version = metadata.version,
    width = metadata.width,
    height = metadata.height,
    players = metadata.players.len(),
    start_locations = metadata.start_locations.len(),
    "decoded MapInfo"
  );

  DecodeOutcome { metadata, warnings }
}

fn read_header(cursor: &mut ByteCursor<'_>, metadata: &mut MapMetadata) {
  let version = cursor.read_u32();
  metadata.version = version;

  apply_gates(cursor, version, Stage::BeforeDimensions);
  metadata.width = cursor.read_u32();
  metadata.height = cursor.read_u32();

  // Small and large preview images.
  for _ in 0..2 {
    if cursor.read_u32() == PREVIEW_WITH_PATH {
      cursor.read_null_terminated_string(TextEncoding::Utf8);
    }
  }

  apply_gates(cursor, version, Stage::AfterPreviews);
  cursor.read_u32();

  metadata.fog_type = cursor.read_null_terminated_string(TextEncoding::Utf8);
  metadata.tile_set = cursor.read_null_terminated_string(TextEncoding::Utf8);

  metadata.camera_left = cursor.read_u32();
  metadata.camera_bottom = cursor.read_u32();
  metadata.camera_right = cursor.read_u32();
  metadata.camera_top = cursor.read_u32();

  metadata.base_height = f64::from(cursor.read_u32()) / BASE_HEIGHT_SCALE;

  // Load screen type; the path follows regardless of its value.
  cursor.read_u32();
  metadata.load_screen_path = cursor.read_null_terminated_string(TextEncoding::Utf8);

  let reserved = usize::from(cursor.read_u16());
  cursor.skip(reserved);
  for _ in 0..LAYOUT_WORDS {
    cursor.read_u32();
  }

  apply_gates(cursor, version, Stage::Trailer);
}

fn read_players(
  cursor: &mut ByteCursor<'_>,
  metadata: &mut MapMetadata,
  warnings: &mut Vec<DecodeWarning>,
) {
  let declared = read_count(cursor, RecordSection::Players, warnings);

  for _ in 0..declared {
    if cursor.at_end() {
      break;
    }

    let slot = read_player(cursor);
    // A slot cut off mid-record is dropped rather than half-filled.
    if cursor.overrun() {
      break;
    }

    if let PlayerControl::Unknown(raw) = slot.control {
      warnings.push(DecodeWarning::UnknownControl {
        player: slot.id,
        raw,
      });
    }
    metadata.players.push(slot);
  }

  if metadata.players.len() < declared as usize {
    warn!(
      declared,
      decoded = metadata.players.len(),
      "MapInfo player table truncated"
    );
    warnings.push(DecodeWarning::Truncated {
      section: RecordSection::Players,
      declared,
      decoded: metadata.players.len(),
    });
  }
}

/// Read a table's entry count. Only the read that first runs off the buffer is reported; a count
/// lost to an earlier truncation is already covered by that warning.
fn read_count(
  cursor: &mut ByteCursor<'_>,
  section: RecordSection,
  warnings: &mut Vec<DecodeWarning>,
) -> u32 {
  let already_overrun = cursor.overrun();
  let count = cursor.read_u32();

  if !already_overrun {
    if let Some(offset) = cursor.overrun_at() {
      warn!(?section, offset, "MapInfo table count missing");
      warnings.push(DecodeWarning::CountMissing { section, offset });
    }
  }
  count
}

fn read_player(cursor: &mut ByteCursor<'_>) -> PlayerSlot {
  PlayerSlot {
    id: cursor.read_u8(),
    control: PlayerControl::from_raw(cursor.read_u32()),
    color_index: cursor.read_u32(),
    race: cursor.read_null_terminated_string(TextEncoding::Utf8),
    unknown: cursor.read_u32(),
    start_point_index: cursor.read_u32(),
    ai_difficulty: cursor.read_u32(),
    decal: cursor.read_null_terminated_string(TextEncoding::Utf8),
  }
}

fn read_start_locations(
  cursor: &mut ByteCursor<'_>,
  metadata: &mut MapMetadata,
  warnings: &mut Vec<DecodeWarning>,
) {
  let declared = read_count(cursor, RecordSection::StartLocations, warnings);

  for _ in 0..declared {
    if cursor.at_end() {
      break;
    }

    let index = cursor.read_u32();
    if cursor.overrun() {
      break;
    }
    metadata.start_locations.push(index);
  }

  if metadata.start_locations.len() < declared as usize {
    warn!(
      declared,
      decoded = metadata.start_locations.len(),
      "MapInfo start location table truncated"
    );
    warnings.push(DecodeWarning::Truncated {
      section: RecordSection::StartLocations,
      declared,
      decoded: metadata.start_locations.len(),
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Writes records in the same layout the decoder reads, for round-trip tests.
  struct Encoder {
    version: u32,
    bytes: Vec<u8>,
  }

  impl Encoder {
    fn new(magic: [u8; 4], version: u32) -> Self {
      let mut encoder = Self {
        version,
        bytes: magic.to_vec(),
      };
      encoder.u32(version);
      encoder
    }

    fn u8(&mut self, value: u8) -> &mut Self {
      self.bytes.push(value);
      self
    }

    fn u16(&mut self, value: u16) -> &mut Self {
      self.bytes.extend_from_slice(&value.to_le_bytes());
      self
    }

    fn u32(&mut self, value: u32) -> &mut Self {
      self.bytes.extend_from_slice(&value.to_le_bytes());
      self
    }

    fn cstr(&mut self, value: &str) -> &mut Self {
      self.bytes.extend_from_slice(value.as_bytes());
      self.bytes.push(0);
      self
    }

    fn raw(&mut self, len: usize, fill: u8) -> &mut Self {
      self.bytes.extend(std::iter::repeat_n(fill, len));
      self
    }

    fn header(&mut self, metadata: &MapMetadata) -> &mut Self {
      let version = self.version;
      if version >= 0x18 {
        self.u32(0xDEAD).u32(0xBEEF);
      }
      self.u32(metadata.width).u32(metadata.height);
      self.u32(2).cstr("Minimap.tga");
      self.u32(1);
      if version >= 0x1f {
        self.cstr("CustomLayout").u32(7);
      }
      self.u32(0x1234);
      self.cstr(&metadata.fog_type).cstr(&metadata.tile_set);
      self
        .u32(metadata.camera_left)
        .u32(metadata.camera_bottom)
        .u32(metadata.camera_right)
        .u32(metadata.camera_top);
      self.u32((metadata.base_height * BASE_HEIGHT_SCALE) as u32);
      self.u32(1).cstr(&metadata.load_screen_path);
      self.u16(3).raw(3, 0xAB);
      for word in 0..8 {
        self.u32(word);
      }
      if version >= 0x19 {
        self.raw(8, 0xCC);
      }
      if version >= 0x1f {
        self.raw(9, 0xDD);
      }
      if version >= 0x20 {
        self.raw(4, 0xEE);
      }
      self
    }

    fn player(&mut self, slot: &PlayerSlot) -> &mut Self {
      self
        .u8(slot.id)
        .u32(slot.control.to_raw())
        .u32(slot.color_index)
        .cstr(&slot.race)
        .u32(slot.unknown)
        .u32(slot.start_point_index)
        .u32(slot.ai_difficulty)
        .cstr(&slot.decal)
    }

    fn record(&mut self, metadata: &MapMetadata) -> &mut Self {
      self.header(metadata);
      self.u32(metadata.players.len() as u32);
      for slot in &metadata.players {
        self.player(slot);
      }
      self.u32(metadata.start_locations.len() as u32);
      for &index in &metadata.start_locations {
        self.u32(index);
      }
      self
    }

    fn finish(&self) -> Vec<u8> {
      self.bytes.clone()
    }
  }

  fn slot(id: u8, control: PlayerControl, race: &str) -> PlayerSlot {
    PlayerSlot {
      id,
      control,
      color_index: u32::from(id) + 1,
      race: race.into(),
      unknown: 0,
      start_point_index: u32::from(id),
      ai_difficulty: 3,
      decal: format!("Decal{id}"),
    }
  }

  fn sample(version: u32) -> MapMetadata {
    MapMetadata {
      version,
      width: 176,
      height: 144,
      fog_type: "Dark".into(),
      tile_set: "Char".into(),
      camera_left: 8,
      camera_bottom: 4,
      camera_right: 168,
      camera_top: 132,
      base_height: 8.0,
      load_screen_path: "LoadingScreens\\Lava.dds".into(),
      players: vec![
        slot(0, PlayerControl::Neutral, ""),
        slot(1, PlayerControl::User, "Terr"),
        slot(2, PlayerControl::Computer, "Zerg"),
        slot(15, PlayerControl::Hostile, ""),
      ],
      start_locations: vec![1, 2],
      valid: true,
    }
  }

  #[test]
  fn round_trips_current_version() {
    let expected = sample(0x20);
    let bytes = Encoder::new(MAGIC, 0x20).record(&expected).finish();

    let outcome = decode_with_warnings(&bytes);

    assert!(outcome.is_complete(), "{:?}", outcome.warnings);
    assert_eq!(outcome.metadata, expected);
  }

  #[test]
  fn round_trips_every_version_band() {
    for version in [0x17, 0x18, 0x19, 0x1f, 0x20] {
      let expected = sample(version);
      let bytes = Encoder::new(MAGIC, version).record(&expected).finish();
      assert_eq!(decode(&bytes), expected, "version {version:#x}");
    }
  }

  #[test]
  fn accepts_swapped_magic() {
    let expected = sample(0x20);
    let bytes = Encoder::new(MAGIC_SWAPPED, 0x20).record(&expected).finish();
    assert_eq!(decode(&bytes), expected);
  }

  #[test]
  fn rejects_unknown_magic() {
    let bytes = Encoder::new(*b"W3I\0", 0x20).record(&sample(0x20)).finish();

    let outcome = decode_with_warnings(&bytes);

    assert!(!outcome.metadata.valid);
    assert_eq!(outcome.metadata.width, 0);
    assert_eq!(outcome.warnings, vec![DecodeWarning::InvalidMagic {
      found: b"W3I\0".to_vec()
    }]);
  }

  #[test]
  fn rejects_buffers_shorter_than_the_magic() {
    let outcome = decode_with_warnings(b"Ma");
    assert!(!outcome.metadata.valid);
    assert_eq!(outcome.warnings.len(), 1);
  }

  #[test]
  fn minimal_record_decodes_dimensions() {
    let empty = MapMetadata {
      version: 0x20,
      width: 128,
      height: 128,
      valid: true,
      ..MapMetadata::default()
    };
    let bytes = Encoder::new(MAGIC, 0x20).record(&empty).finish();

    let metadata = decode(&bytes);

    assert!(metadata.valid);
    assert_eq!(metadata.width, 128);
    assert_eq!(metadata.height, 128);
    assert!(metadata.players.is_empty());
    assert!(metadata.start_locations.is_empty());
    assert!(metadata.is_renderable());
  }

  #[test]
  fn player_count_without_players_is_not_fatal() {
    let mut encoder = Encoder::new(MAGIC, 0x20);
    encoder.header(&sample(0x20)).u32(5);
    let bytes = encoder.finish();

    let outcome = decode_with_warnings(&bytes);

    assert!(outcome.metadata.valid);
    assert!(outcome.metadata.players.is_empty());
    assert!(outcome.metadata.start_locations.is_empty());
    assert_eq!(outcome.warnings, vec![
      DecodeWarning::Truncated {
        section: RecordSection::Players,
        declared: 5,
        decoded: 0,
      },
      DecodeWarning::CountMissing {
        section: RecordSection::StartLocations,
        offset: bytes.len(),
      },
    ]);
  }

  #[test]
  fn header_without_table_counts_reports_the_missing_count() {
    let bytes = Encoder::new(MAGIC, 0x17).header(&sample(0x17)).finish();

    let outcome = decode_with_warnings(&bytes);

    assert!(outcome.metadata.valid);
    assert_eq!(outcome.metadata.width, 176);
    assert!(!outcome.is_complete());
    assert_eq!(outcome.warnings, vec![DecodeWarning::CountMissing {
      section: RecordSection::Players,
      offset: bytes.len(),
    }]);
  }

  #[test]
  fn missing_start_location_count_after_players_is_reported() {
    let metadata = sample(0x20);
    let mut encoder = Encoder::new(MAGIC, 0x20);
    encoder
      .header(&metadata)
      .u32(1)
      .player(&metadata.players[1]);
    let bytes = encoder.finish();

    let outcome = decode_with_warnings(&bytes);

    assert_eq!(outcome.metadata.players, metadata.players[1..2].to_vec());
    assert_eq!(outcome.warnings, vec![DecodeWarning::CountMissing {
      section: RecordSection::StartLocations,
      offset: bytes.len(),
    }]);
  }

  #[test]
  fn keeps_players_read_before_truncation() {
    let metadata = sample(0x20);
    let mut encoder = Encoder::new(MAGIC, 0x20);
    encoder
      .header(&metadata)
      .u32(3)
      .player(&metadata.players[0])
      .player(&metadata.players[1])
      .u8(2)
      .u32(2);

    let outcome = decode_with_warnings(&encoder.finish());

    assert_eq!(outcome.metadata.players, metadata.players[..2].to_vec());
    assert!(outcome.warnings.contains(&DecodeWarning::Truncated {
      section: RecordSection::Players,
      declared: 3,
      decoded: 2,
    }));
  }

  #[test]
  fn keeps_start_locations_read_before_truncation() {
    let metadata = sample(0x20);
    let mut encoder = Encoder::new(MAGIC, 0x20);
    encoder.header(&metadata).u32(0).u32(4).u32(1).u32(2).u16(3);

    let outcome = decode_with_warnings(&encoder.finish());

    assert_eq!(outcome.metadata.start_locations, vec![1, 2]);
    assert_eq!(outcome.warnings, vec![DecodeWarning::Truncated {
      section: RecordSection::StartLocations,
      declared: 4,
      decoded: 2,
    }]);
  }

  #[test]
  fn truncated_header_keeps_fields_read_so_far() {
    let mut bytes = Encoder::new(MAGIC, 0x20).record(&sample(0x20)).finish();
    // magic + version + two gated words + width + height + partial preview type
    bytes.truncate(4 + 4 + 8 + 8 + 2);

    let outcome = decode_with_warnings(&bytes);

    assert!(outcome.metadata.valid);
    assert_eq!(outcome.metadata.width, 176);
    assert_eq!(outcome.metadata.height, 144);
    assert!(outcome.metadata.tile_set.is_empty());
    assert_eq!(outcome.warnings, vec![DecodeWarning::HeaderTruncated {
      offset: 4 + 4 + 8 + 8
    }]);
  }

  #[test]
  fn base_height_keeps_full_fixed_point_precision() {
    let mut encoder = Encoder::new(MAGIC, 0x17);
    encoder.u32(64).u32(64).u32(0).u32(0).u32(0);
    encoder.cstr("Fog").cstr("Tiles");
    encoder.u32(0).u32(0).u32(64).u32(64);
    encoder.u32(16_777_217);

    let metadata = decode(&encoder.finish());

    assert_eq!(metadata.base_height, 4096.000244140625);
  }

  #[test]
  fn reports_unknown_player_control() {
    let mut metadata = sample(0x20);
    metadata.players = vec![slot(4, PlayerControl::Unknown(9), "Prot")];
    let bytes = Encoder::new(MAGIC, 0x20).record(&metadata).finish();

    let outcome = decode_with_warnings(&bytes);

    assert_eq!(outcome.metadata.players, metadata.players);
    assert_eq!(outcome.warnings, vec![DecodeWarning::UnknownControl {
      player: 4,
      raw: 9
    }]);
  }

  #[test]
  fn preview_without_path_reads_no_string() {
    let mut encoder = Encoder::new(MAGIC, 0x17);
    encoder.u32(32).u32(48);
    encoder.u32(0).u32(0);
    encoder.u32(0).cstr("Fog").cstr("Tiles");

    let metadata = decode(&encoder.finish());

    assert_eq!(metadata.width, 32);
    assert_eq!(metadata.height, 48);
    assert_eq!(metadata.fog_type, "Fog");
    assert_eq!(metadata.tile_set, "Tiles");
  }
}
