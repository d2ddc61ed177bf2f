//! Decoding for the MapInfo record embedded in map containers.
//!
//! The record is versioned: newer map editors append fields at fixed points, which the
//! [`schema`] table describes. Decoding never fails. A magic mismatch leaves the record marked
//! invalid, and truncation produces a partial record plus warnings.

mod decoder;
mod format;
pub mod schema;

pub use decoder::{MAGIC, MAGIC_SWAPPED, decode, decode_with_warnings};
pub use format::MapInfoFormat;
