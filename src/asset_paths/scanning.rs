//! Heuristic discovery of texture references inside model payloads.

use std::collections::BTreeSet;

use regex::Regex;

use super::filters::is_plausible_reference;
use crate::models::TextureReference;

fn texture_token_pattern() -> &'static Regex {
    use std::sync::OnceLock;

    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9_\\/.-]+\.(?i:dds|tga)").expect("invalid texture token regex")
    })
}

/// Collect texture paths mentioned anywhere in `payload`.
///
/// Model files store their material layers as plain strings somewhere in the blob, so a text
/// scan finds most of them without parsing the reference table. Bytes that are not valid UTF-8
/// are dropped, so the text on either side of them joins up. Path characters are matched as ASCII
/// only. The result can contain coincidental byte runs and can miss references that are only
/// reachable through structural indirection.
pub fn scan_texture_references(payload: &[u8]) -> BTreeSet<TextureReference> {
    let text: String = payload.utf8_chunks().map(|chunk| chunk.valid()).collect();

    texture_token_pattern()
        .find_iter(&text)
        .map(|token| token.as_str())
        .filter(|token| is_plausible_reference(token))
        .map(TextureReference::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn references(payload: &[u8]) -> Vec<String> {
        scan_texture_references(payload)
            .into_iter()
            .map(|reference| reference.to_string())
            .collect()
    }

    #[test]
    fn finds_references_between_binary_noise() {
        let mut payload = vec![0x00, 0xFF, 0x13, 0x01];
        payload.extend_from_slice(b"Assets/Textures/Foo.dds");
        payload.extend_from_slice(&[0x00, 0x80, 0x81, 0x00]);

        assert_eq!(references(&payload), vec!["Assets\\Textures\\Foo.dds"]);
    }

    #[test]
    fn matches_extensions_case_insensitively() {
        let payload = b"\0Marine_Diffuse.DDS\0marine_normal.Tga\0";
        assert_eq!(references(payload), vec![
            "Marine_Diffuse.DDS",
            "marine_normal.Tga",
        ]);
    }

    #[test]
    fn deduplicates_after_normalising_separators() {
        let payload = b"\0a/b/c.dds\0a\\b\\c.dds\0a/b/c.dds\0";
        assert_eq!(references(payload), vec!["a\\b\\c.dds"]);
    }

    #[test]
    fn rejects_tokens_outside_the_length_window() {
        let long_stem = "x".repeat(256);
        let longest_kept = format!("{}.dds", "y".repeat(255));
        let payload = format!("\0.dds\0a.dds\0{long_stem}.tga\0{longest_kept}\0");

        let found = references(payload.as_bytes());

        assert_eq!(found.len(), 2);
        assert!(found.contains(&"a.dds".to_string()));
        assert!(found.contains(&longest_kept));
    }

    #[test]
    fn ignores_other_extensions() {
        assert!(references(b"\0Units/Marine.m3\0sound.ogg\0").is_empty());
    }

    #[test]
    fn invalid_utf8_bytes_are_dropped_from_tokens() {
        let payload = b"\0Textures\\\xC3Marine.dds\0Dir\xFF/Skin.tga\0";
        assert_eq!(references(payload), vec![
            "Dir\\Skin.tga",
            "Textures\\Marine.dds",
        ]);
    }

    #[test]
    fn non_ascii_letters_are_not_path_characters() {
        let payload = "\0\u{212A}\u{017F}x.dds\0".as_bytes();
        assert_eq!(references(payload), vec!["x.dds"]);
    }
}
