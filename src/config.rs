//! Resolver configuration: which archive roots to search and where textures conventionally live.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::asset_paths::DEFAULT_TEXTURES_SUBFOLDER;

/// File names searched for by [`ResolverConfig::discover`], in order.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["sc2_assets.json", "sc2_assets.yaml", "sc2_assets.yml"];

/// Namespace roots of the stock game data, tried in this order.
pub const DEFAULT_ROOTS: &[&str] = &[
    "",
    "mods\\liberty.sc2mod\\base.sc2assets\\",
    "Campaigns\\Liberty.SC2Campaign\\Base.SC2Assets\\",
    "mods\\swarm.sc2mod\\base.sc2assets\\",
    "mods\\void.sc2mod\\base.sc2assets\\",
];

/// Search configuration for texture resolution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Archive path prefixes, earliest first. An empty string means the archive root.
    pub roots: Vec<String>,
    /// Folder inserted between a root and a bare texture file name.
    pub textures_subfolder: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            roots: DEFAULT_ROOTS.iter().map(|root| root.to_string()).collect(),
            textures_subfolder: DEFAULT_TEXTURES_SUBFOLDER.into(),
        }
    }
}

/// Errors that can occur while loading a configuration file.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the file from disk.
    Io {
        /// Path that caused the error.
        path: PathBuf,
        /// Source I/O error.
        source: std::io::Error,
    },
    /// Failed to parse a JSON configuration.
    Json {
        /// Path that caused the error.
        path: PathBuf,
        /// Source parse error.
        source: serde_json::Error,
    },
    /// Failed to parse a YAML configuration.
    Yaml {
        /// Path that caused the error.
        path: PathBuf,
        /// Source parse error.
        source: serde_yaml::Error,
    },
}

impl ResolverConfig {
    /// Look for a configuration file in `dir`, falling back to defaults.
    ///
    /// A file that exists but fails to load is logged and skipped so a broken local override
    /// never stops resolution.
    pub fn discover(dir: &Path) -> Self {
        for name in DEFAULT_CONFIG_FILES {
            let candidate = dir.join(name);
            if !candidate.is_file() {
                continue;
            }
            match Self::load(&candidate) {
                Ok(config) => {
                    debug!(path = %candidate.display(), "loaded resolver configuration");
                    return config;
                }
                Err(err) => warn!("ignoring resolver configuration: {err}"),
            }
        }
        Self::default()
    }

    /// Read configuration from a JSON or YAML file, chosen by extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        if is_yaml {
            serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        } else {
            serde_json::from_str(content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::Json { path, source } => {
                write!(f, "failed to parse {}: {}", path.display(), source)
            }
            Self::Yaml { path, source } => {
                write!(f, "failed to parse {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Yaml { source, .. } => Some(source),
        }
    }
}
