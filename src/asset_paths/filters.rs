use std::path::Path;

use serde::Serialize;

/// Shortest token length that is kept as a texture reference (exclusive bound).
const MIN_REFERENCE_LEN: usize = 4;
/// Longest token length that is kept as a texture reference (exclusive bound).
const MAX_REFERENCE_LEN: usize = 260;

/// Determine whether a scanned token is long enough to be a real path and short enough not to
/// be a run of unrelated strings glued together.
pub fn is_plausible_reference(token: &str) -> bool {
    token.len() > MIN_REFERENCE_LEN && token.len() < MAX_REFERENCE_LEN
}

/// Broad category of an archive entry, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssetKind {
    /// `.m3` model.
    Model,
    /// `.m3a` animation set.
    Animation,
    /// `.dds` or `.tga` image.
    Texture,
    /// `.ogg` or `.wav` sound.
    Audio,
    /// `.txt` text.
    Text,
    /// `.xml` game data.
    Data,
    /// Anything else.
    Unknown,
}

impl AssetKind {
    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Model => "3D Model",
            Self::Animation => "Animation",
            Self::Texture => "Texture/Image",
            Self::Audio => "Audio",
            Self::Text => "Text",
            Self::Data => "Data",
            Self::Unknown => "Unknown",
        }
    }
}

/// Classify an archive path by extension. Both separator styles are accepted.
pub fn classify_asset_kind(path: &str) -> AssetKind {
    let file_name = path.rsplit(['\\', '/']).next().unwrap_or(path);
    let extension = Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("m3") => AssetKind::Model,
        Some("m3a") => AssetKind::Animation,
        Some("dds" | "tga") => AssetKind::Texture,
        Some("ogg" | "wav") => AssetKind::Audio,
        Some("txt") => AssetKind::Text,
        Some("xml") => AssetKind::Data,
        _ => AssetKind::Unknown,
    }
}
