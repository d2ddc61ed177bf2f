//! Collaborator interfaces over the asset archive, plus an on-disk implementation.
//!
//! The resolver only needs to ask whether a path exists and, for extraction, to copy an entry
//! out. Anything that can answer those questions works: the real archive storage, an unpacked
//! copy of it on disk ([`DirectoryArchive`]), or a closure in tests.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use same_file::is_same_file;
use tracing::trace;

/// Existence test against the archive namespace.
///
/// Takes `&mut self` because real archive handles are stateful and must not be shared across
/// concurrent resolutions.
pub trait ArchiveProbe {
  /// Returns `true` when `path` names an entry in the archive.
  fn exists(&mut self, path: &str) -> bool;
}

impl<F> ArchiveProbe for F
where
  F: FnMut(&str) -> bool,
{
  fn exists(&mut self, path: &str) -> bool {
    self(path)
  }
}

/// Archive that can also hand out entry contents.
pub trait ArchiveSource: ArchiveProbe {
  /// Read the full contents of `path`.
  fn fetch(&mut self, path: &str) -> io::Result<Vec<u8>>;

  /// Copy the entry at `path` to `destination`, creating parent directories as needed.
  fn extract(&mut self, path: &str, destination: &Path) -> io::Result<()> {
    let bytes = self.fetch(path)?;
    if let Some(parent) = destination.parent() {
      fs::create_dir_all(parent)?;
    }
    fs::write(destination, bytes)
  }
}

/// An unpacked archive on disk.
///
/// Archive paths use backslashes and the archive namespace ignores case, so lookups split on
/// either separator and fall back to a case-insensitive match per component.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
  root: PathBuf,
}

impl DirectoryArchive {
  /// Use the directory at `root` as the archive.
  pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
    let root = root.into();
    if !root.is_dir() {
      return Err(io::Error::new(
        ErrorKind::NotFound,
        format!("archive directory {} does not exist", root.display()),
      ));
    }
    Ok(Self { root })
  }

  /// Directory backing the archive.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Find the file an archive path refers to.
  pub fn locate(&self, archive_path: &str) -> Option<PathBuf> {
    let mut current = self.root.clone();
    for component in archive_path
      .split(['\\', '/'])
      .filter(|part| !part.is_empty() && *part != "." && *part != "..")
    {
      let exact = current.join(component);
      current = if exact.exists() {
        exact
      } else {
        find_case_insensitive(&current, component)?
      };
    }

    current.is_file().then_some(current)
  }
}

impl ArchiveProbe for DirectoryArchive {
  fn exists(&mut self, path: &str) -> bool {
    self.locate(path).is_some()
  }
}

impl ArchiveSource for DirectoryArchive {
  fn fetch(&mut self, path: &str) -> io::Result<Vec<u8>> {
    match self.locate(path) {
      Some(file) => fs::read(file),
      None => Err(not_in_archive(path)),
    }
  }

  fn extract(&mut self, path: &str, destination: &Path) -> io::Result<()> {
    let source = self.locate(path).ok_or_else(|| not_in_archive(path))?;
    if let Some(parent) = destination.parent() {
      fs::create_dir_all(parent)?;
    }
    let placement = place_entry(&source, destination)?;
    trace!(path, ?placement, "extracted archive entry");
    Ok(())
  }
}

fn not_in_archive(path: &str) -> io::Error {
  io::Error::new(ErrorKind::NotFound, format!("{path} is not in the archive"))
}

fn find_case_insensitive(dir: &Path, name: &str) -> Option<PathBuf> {
  fs::read_dir(dir)
    .ok()?
    .flatten()
    .find(|entry| entry.file_name().to_string_lossy().eq_ignore_ascii_case(name))
    .map(|entry| entry.path())
}

/// How an unpacked entry reached its extraction target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
  /// The target already was this entry.
  AlreadyPresent,
  /// The target is a hard link to the entry.
  Linked,
  /// Linking failed (e.g. across filesystems) and the bytes were copied.
  Copied,
}

/// Place the unpacked archive file `entry` at `destination`.
///
/// Extracting from an unpacked archive should not duplicate large textures, so the entry is
/// hard-linked when possible. A stale file at the target is replaced.
fn place_entry(entry: &Path, destination: &Path) -> io::Result<Placement> {
  match fs::symlink_metadata(destination) {
    Ok(_) => {
      if is_same_file(entry, destination)? {
        return Ok(Placement::AlreadyPresent);
      }
      fs::remove_file(destination)?;
    }
    Err(err) if err.kind() == ErrorKind::NotFound => {}
    Err(err) => return Err(err),
  }

  match fs::hard_link(entry, destination) {
    Ok(()) => Ok(Placement::Linked),
    Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(Placement::AlreadyPresent),
    Err(_) => fs::copy(entry, destination).map(|_| Placement::Copied),
  }
}

/// Caller-owned memo of probe outcomes, keyed by candidate path.
///
/// Texture references repeat across models, and each miss costs a round trip to the archive.
/// Keep one cache per archive handle and pass it to [`CachedProbe`] for every resolution.
#[derive(Debug, Clone, Default)]
pub struct ProbeCache {
  entries: BTreeMap<String, bool>,
}

impl ProbeCache {
  /// Create an empty cache.
  pub fn new() -> Self {
    Self::default()
  }

  /// Cached outcome for `path`, if it has been probed.
  pub fn get(&self, path: &str) -> Option<bool> {
    self.entries.get(path).copied()
  }

  /// Number of cached paths.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// True when nothing has been cached.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Forget every cached outcome.
  pub fn clear(&mut self) {
    self.entries.clear();
  }

  fn record(&mut self, path: &str, exists: bool) {
    self.entries.insert(path.to_string(), exists);
  }
}

/// Probe wrapper that consults a [`ProbeCache`] before asking the archive.
pub struct CachedProbe<'a, P: ?Sized> {
  inner: &'a mut P,
  cache: &'a mut ProbeCache,
}

impl<'a, P: ArchiveProbe + ?Sized> CachedProbe<'a, P> {
  /// Wrap `inner`, reading and filling `cache`.
  pub fn new(inner: &'a mut P, cache: &'a mut ProbeCache) -> Self {
    Self { inner, cache }
  }
}

impl<P: ArchiveProbe + ?Sized> ArchiveProbe for CachedProbe<'_, P> {
  fn exists(&mut self, path: &str) -> bool {
    if let Some(hit) = self.cache.get(path) {
      trace!(path, hit, "probe cache hit");
      return hit;
    }

    let exists = self.inner.exists(path);
    self.cache.record(path, exists);
    exists
  }
}
