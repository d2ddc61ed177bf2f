use std::path::{Path, PathBuf};

/// Produce the on-disk location for a texture extracted next to its model.
///
/// The reference keeps its own folder structure below `model_dir`, so a model that mentions
/// `Assets\Textures\foo.dds` finds the file at `<model_dir>/Assets/Textures/foo.dds` regardless
/// of the archive root it was resolved from. Both separator styles are split into components;
/// empty, `.` and `..` components are dropped so a reference can never escape `model_dir`.
pub fn make_local_texture_path(model_dir: &Path, reference: &str) -> PathBuf {
    let mut path = model_dir.to_path_buf();
    for component in reference
        .split(['\\', '/'])
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
    {
        path.push(component);
    }
    path
}

/// Strip a namespace root from an archive path, for shorter local extraction paths.
///
/// The comparison ignores ASCII case and separator style. Paths outside `root` are returned
/// unchanged.
pub fn strip_namespace_root<'a>(archive_path: &'a str, root: &str) -> &'a str {
    if root.is_empty() || archive_path.len() < root.len() {
        return archive_path;
    }

    let Some(head) = archive_path.get(..root.len()) else {
        return archive_path;
    };
    let matches = head
        .bytes()
        .zip(root.bytes())
        .all(|(a, b)| normalise_byte(a) == normalise_byte(b));

    if matches {
        &archive_path[root.len()..]
    } else {
        archive_path
    }
}

fn normalise_byte(byte: u8) -> u8 {
    if byte == b'/' {
        b'\\'
    } else {
        byte.to_ascii_lowercase()
    }
}
