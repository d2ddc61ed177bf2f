use tracing::{debug, trace};

use crate::archive::ArchiveProbe;
use crate::models::Resolution;

/// Conventional folder textures live under inside each namespace root.
pub const DEFAULT_TEXTURES_SUBFOLDER: &str = "Assets\\Textures\\";

/// Generate candidate archive paths for a texture reference.
///
/// References found in models are sometimes full archive paths and sometimes bare file names
/// relative to the textures folder. Each root is tried in order; within a root the reference as
/// written comes before the textures-folder guess. References that already name the textures
/// folder only get the first form.
pub fn generate_candidates(reference: &str, roots: &[String]) -> Vec<String> {
    generate_candidates_with_subfolder(reference, roots, DEFAULT_TEXTURES_SUBFOLDER)
}

/// [`generate_candidates`] with a custom textures folder, e.g. `Assets\Textures\`.
pub fn generate_candidates_with_subfolder(
    reference: &str,
    roots: &[String],
    textures_subfolder: &str,
) -> Vec<String> {
    if reference.is_empty() {
        return Vec::new();
    }

    let mut builder = CandidateBuilder::new(reference, textures_subfolder);
    for root in roots {
        builder.add_root(root);
    }
    builder.finish()
}

/// Probe candidates in generation order and return the first one the archive accepts.
///
/// Probing is strictly sequential so the earliest candidate always wins, whatever the probe's
/// latency.
pub fn resolve_reference<P>(reference: &str, roots: &[String], probe: &mut P) -> Resolution
where
    P: ArchiveProbe + ?Sized,
{
    resolve_reference_with_subfolder(reference, roots, DEFAULT_TEXTURES_SUBFOLDER, probe)
}

/// [`resolve_reference`] with a custom textures folder.
pub fn resolve_reference_with_subfolder<P>(
    reference: &str,
    roots: &[String],
    textures_subfolder: &str,
    probe: &mut P,
) -> Resolution
where
    P: ArchiveProbe + ?Sized,
{
    for candidate in generate_candidates_with_subfolder(reference, roots, textures_subfolder) {
        if probe.exists(&candidate) {
            debug!(reference, %candidate, "resolved texture reference");
            return Resolution::Resolved(candidate);
        }
        trace!(reference, %candidate, "candidate not present");
    }

    debug!(reference, "texture reference unresolved");
    Resolution::Unresolved
}

struct CandidateBuilder<'a> {
    reference: String,
    textures_subfolder: &'a str,
    names_textures_folder: bool,
    result: Vec<String>,
}

impl<'a> CandidateBuilder<'a> {
    fn new(reference: &str, textures_subfolder: &'a str) -> Self {
        let reference = reference.replace('/', "\\");
        let folder = textures_subfolder
            .replace('/', "\\")
            .trim_matches('\\')
            .to_ascii_lowercase();
        let names_textures_folder =
            !folder.is_empty() && reference.to_ascii_lowercase().contains(&folder);

        Self {
            reference,
            textures_subfolder,
            names_textures_folder,
            result: Vec::new(),
        }
    }

    fn add_root(&mut self, root: &str) {
        self.push(format!("{root}{}", self.reference));

        if !self.names_textures_folder {
            self.push(format!(
                "{root}{}{}",
                self.textures_subfolder, self.reference
            ));
        }
    }

    fn finish(self) -> Vec<String> {
        self.result
    }

    fn push(&mut self, candidate: String) {
        self.result.push(candidate);
    }
}
