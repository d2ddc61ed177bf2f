#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod archive;
pub mod asset_paths;
pub mod config;
pub mod cursor;
pub mod map_info;
pub mod models;
pub mod pipeline;

pub use archive::{ArchiveProbe, ArchiveSource, CachedProbe, DirectoryArchive, ProbeCache};
pub use config::{ConfigError, ResolverConfig};
pub use cursor::{ByteCursor, TextEncoding};
pub use models::{
  DecodeOutcome, DecodeWarning, ExtractionReport, MapMetadata, PlayerControl, PlayerSlot,
  RecordSection, Resolution, TextureReference,
};
pub use pipeline::{
  AssetExtraction, AssetResolutionPipeline, Resolutions, decode_map_metadata,
  resolve_model_dependencies,
};
