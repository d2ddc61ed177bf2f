//! Resolution orchestrator: scans model payloads, resolves every texture they mention, and
//! optionally copies the results out of the archive.

use std::collections::{BTreeMap, btree_set};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::archive::{ArchiveProbe, ArchiveSource};
use crate::asset_paths::{
  AssetKind, DEFAULT_TEXTURES_SUBFOLDER, classify_asset_kind, generate_candidates_with_subfolder,
  make_local_texture_path, resolve_reference_with_subfolder, scan_texture_references,
  strip_namespace_root,
};
use crate::config::ResolverConfig;
use crate::map_info;
use crate::models::{DecodeOutcome, ExtractionReport, MapMetadata, Resolution, TextureReference};

/// Scan `model_payload` for texture references and resolve each against `roots`.
pub fn resolve_model_dependencies<P>(
  model_payload: &[u8],
  roots: &[String],
  probe: &mut P,
) -> BTreeMap<TextureReference, Resolution>
where
  P: ArchiveProbe + ?Sized,
{
  Resolutions::new(model_payload, roots, DEFAULT_TEXTURES_SUBFOLDER, probe).collect()
}

/// Decode a MapInfo payload.
pub fn decode_map_metadata(map_info_payload: &[u8]) -> MapMetadata {
  map_info::decode(map_info_payload)
}

/// Result of extracting one archive entry.
#[derive(Debug, Clone, Serialize)]
pub struct AssetExtraction {
  /// Where the entry was written.
  pub destination: PathBuf,
  /// Kind derived from the archive path.
  pub kind: AssetKind,
  /// Textures extracted alongside a model. Empty for other kinds.
  pub textures: ExtractionReport,
}

/// Configured entry point for resolution and extraction.
#[derive(Debug, Clone, Default)]
pub struct AssetResolutionPipeline {
  config: ResolverConfig,
}

impl AssetResolutionPipeline {
  /// Create a pipeline searching the roots in `config`.
  pub fn new(config: ResolverConfig) -> Self {
    Self { config }
  }

  /// Active configuration.
  pub fn config(&self) -> &ResolverConfig {
    &self.config
  }

  /// Lazily resolve the references in `model_payload`, one per iteration.
  ///
  /// References are independent of each other, so a caller may stop between items (e.g. on
  /// cancellation) and keep what has been resolved so far.
  pub fn resolutions<'a, P>(&'a self, model_payload: &[u8], probe: &'a mut P) -> Resolutions<'a, P>
  where
    P: ArchiveProbe + ?Sized,
  {
    Resolutions::new(
      model_payload,
      &self.config.roots,
      &self.config.textures_subfolder,
      probe,
    )
  }

  /// Resolve every texture reference in `model_payload`.
  pub fn resolve_model_dependencies<P>(
    &self,
    model_payload: &[u8],
    probe: &mut P,
  ) -> BTreeMap<TextureReference, Resolution>
  where
    P: ArchiveProbe + ?Sized,
  {
    self.resolutions(model_payload, probe).collect()
  }

  /// Decode a MapInfo payload.
  pub fn decode_map_metadata(&self, map_info_payload: &[u8]) -> MapMetadata {
    decode_map_metadata(map_info_payload)
  }

  /// Decode a MapInfo payload, keeping the warnings.
  pub fn decode_map_metadata_with_warnings(&self, map_info_payload: &[u8]) -> DecodeOutcome {
    map_info::decode_with_warnings(map_info_payload)
  }

  /// Resolve the textures of a model and copy them below `model_dir`.
  ///
  /// Each texture keeps the folder structure of its reference, so the model finds it relative to
  /// its own location. Candidates are tried in resolution order; one that the archive lists but
  /// fails to copy is skipped in favour of the next. Textures with no candidate that both exists
  /// and copies are reported as missing.
  pub fn extract_model_dependencies<A>(
    &self,
    model_payload: &[u8],
    archive: &mut A,
    model_dir: &Path,
  ) -> Result<ExtractionReport>
  where
    A: ArchiveSource + ?Sized,
  {
    fs::create_dir_all(model_dir)
      .with_context(|| format!("failed to create {}", model_dir.display()))?;

    let references = scan_texture_references(model_payload);
    debug!(count = references.len(), "found texture dependencies");

    let mut report = ExtractionReport::default();
    for reference in references {
      let destination = make_local_texture_path(model_dir, reference.as_str());
      match self.extract_texture(archive, &reference, &destination) {
        Some(archive_path) => {
          info!(%reference, %archive_path, "extracted texture");
          report.extracted.push((reference, archive_path));
        }
        None => report.missing.push(reference),
      }
    }

    Ok(report)
  }

  fn extract_texture<A>(
    &self,
    archive: &mut A,
    reference: &TextureReference,
    destination: &Path,
  ) -> Option<String>
  where
    A: ArchiveSource + ?Sized,
  {
    let candidates = generate_candidates_with_subfolder(
      reference.as_str(),
      &self.config.roots,
      &self.config.textures_subfolder,
    );

    for candidate in candidates {
      if !archive.exists(&candidate) {
        continue;
      }
      match archive.extract(&candidate, destination) {
        Ok(()) => return Some(candidate),
        Err(err) => warn!(%reference, %candidate, "texture extraction failed: {err}"),
      }
    }

    debug!(%reference, "no candidate could be extracted");
    None
  }

  /// Copy an archive entry below `dest_dir`, pulling in its textures when it is a model.
  ///
  /// The first configured root that prefixes `archive_path` is stripped from the local path.
  pub fn extract_asset<A>(
    &self,
    archive: &mut A,
    archive_path: &str,
    dest_dir: &Path,
  ) -> Result<AssetExtraction>
  where
    A: ArchiveSource + ?Sized,
  {
    let local_relative = self
      .config
      .roots
      .iter()
      .filter(|root| !root.is_empty())
      .map(|root| strip_namespace_root(archive_path, root))
      .find(|stripped| stripped.len() < archive_path.len())
      .unwrap_or(archive_path);
    let destination = make_local_texture_path(dest_dir, local_relative);

    archive
      .extract(archive_path, &destination)
      .with_context(|| format!("failed to extract {archive_path}"))?;
    info!(%archive_path, destination = %destination.display(), "extracted asset");

    let kind = classify_asset_kind(archive_path);
    let textures = if kind == AssetKind::Model {
      let payload = archive
        .fetch(archive_path)
        .with_context(|| format!("failed to read {archive_path}"))?;
      let model_dir = destination.parent().unwrap_or(dest_dir);
      self.extract_model_dependencies(&payload, archive, model_dir)?
    } else {
      ExtractionReport::default()
    };

    Ok(AssetExtraction {
      destination,
      kind,
      textures,
    })
  }
}

/// Iterator over `(reference, resolution)` pairs in reference order.
pub struct Resolutions<'a, P: ?Sized> {
  references: btree_set::IntoIter<TextureReference>,
  roots: &'a [String],
  textures_subfolder: &'a str,
  probe: &'a mut P,
}

impl<'a, P: ArchiveProbe + ?Sized> Resolutions<'a, P> {
  fn new(
    model_payload: &[u8],
    roots: &'a [String],
    textures_subfolder: &'a str,
    probe: &'a mut P,
  ) -> Self {
    Self {
      references: scan_texture_references(model_payload).into_iter(),
      roots,
      textures_subfolder,
      probe,
    }
  }
}

impl<P: ArchiveProbe + ?Sized> Iterator for Resolutions<'_, P> {
  type Item = (TextureReference, Resolution);

  fn next(&mut self) -> Option<Self::Item> {
    let reference = self.references.next()?;
    let resolution = resolve_reference_with_subfolder(
      reference.as_str(),
      self.roots,
      self.textures_subfolder,
      self.probe,
    );
    Some((reference, resolution))
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    self.references.size_hint()
  }
}
