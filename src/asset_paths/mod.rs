//! Helpers for discovering texture references and turning them into archive paths.
//!
//! The responsibilities are split into focused submodules so the scanner, the candidate
//! generator and the local path helpers can be tested independently. The pipeline composes
//! them; callers with their own orchestration can use them directly.

mod bundle;
mod candidates;
mod filters;
mod scanning;

pub use bundle::{make_local_texture_path, strip_namespace_root};
pub use candidates::{
    DEFAULT_TEXTURES_SUBFOLDER, generate_candidates, generate_candidates_with_subfolder,
    resolve_reference, resolve_reference_with_subfolder,
};
pub use filters::{AssetKind, classify_asset_kind, is_plausible_reference};
pub use scanning::scan_texture_references;
