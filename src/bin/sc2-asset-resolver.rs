use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use sc2_asset_resolver::asset_paths::classify_asset_kind;
use sc2_asset_resolver::map_info::{self, MapInfoFormat};
use sc2_asset_resolver::{AssetResolutionPipeline, DirectoryArchive, ResolverConfig};

/// Inspect StarCraft II map metadata and resolve model texture dependencies.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Decode a binary MapInfo file and print it as JSON.
  MapInfo {
    /// MapInfo file extracted from a map container.
    file: PathBuf,
  },
  /// Print the texture references of a model and where they resolve.
  Deps {
    /// Model file on disk.
    model: PathBuf,
    #[command(flatten)]
    archive: ArchiveArgs,
  },
  /// Extract an archive entry, plus its textures when it is a model.
  Extract {
    /// Archive path of the entry, e.g. `mods\liberty.sc2mod\base.sc2assets\Assets\Units\Marine.m3`.
    archive_path: String,
    #[command(flatten)]
    archive: ArchiveArgs,
    /// Destination directory.
    #[arg(long)]
    out: PathBuf,
  },
  /// Print the asset kind of each path.
  Kind {
    /// Archive or local paths.
    #[arg(required = true)]
    paths: Vec<String>,
  },
}

#[derive(Debug, clap::Args)]
struct ArchiveArgs {
  /// Directory holding the unpacked archive.
  #[arg(long)]
  archive: PathBuf,
  /// Resolver configuration (JSON or YAML). Defaults to `sc2_assets.*` in the archive directory.
  #[arg(long)]
  config: Option<PathBuf>,
}

impl ArchiveArgs {
  fn open(&self) -> Result<(AssetResolutionPipeline, DirectoryArchive)> {
    let config = match &self.config {
      Some(path) => ResolverConfig::load(path)?,
      None => ResolverConfig::discover(&self.archive),
    };
    let archive = DirectoryArchive::open(&self.archive)
      .with_context(|| format!("failed to open archive {}", self.archive.display()))?;
    Ok((AssetResolutionPipeline::new(config), archive))
  }
}

#[derive(Serialize)]
struct KindRecord<'a> {
  path: &'a str,
  kind: &'static str,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  match Cli::parse().command {
    Command::MapInfo { file } => map_info_command(&file),
    Command::Deps { model, archive } => deps_command(&model, &archive),
    Command::Extract {
      archive_path,
      archive,
      out,
    } => {
      let (pipeline, mut archive) = archive.open()?;
      let extraction = pipeline.extract_asset(&mut archive, &archive_path, &out)?;
      print_json(&extraction)
    }
    Command::Kind { paths } => {
      let records: Vec<KindRecord> = paths
        .iter()
        .map(|path| KindRecord {
          path: path.as_str(),
          kind: classify_asset_kind(path).label(),
        })
        .collect();
      print_json(&records)
    }
  }
}

fn map_info_command(file: &Path) -> Result<()> {
  let payload = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;

  match MapInfoFormat::sniff(&payload) {
    MapInfoFormat::Binary => print_json(&map_info::decode_with_warnings(&payload)),
    MapInfoFormat::Xml => anyhow::bail!("{} is an XML MapInfo, which is not supported", file.display()),
    MapInfoFormat::Empty => anyhow::bail!("{} is empty", file.display()),
  }
}

fn deps_command(model: &Path, archive: &ArchiveArgs) -> Result<()> {
  let payload = fs::read(model).with_context(|| format!("failed to read {}", model.display()))?;
  let (pipeline, mut archive) = archive.open()?;
  let resolutions = pipeline.resolve_model_dependencies(&payload, &mut archive);
  print_json(&resolutions)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extract_takes_an_archive_path() {
    let cli = Cli::try_parse_from([
      "sc2-asset-resolver",
      "extract",
      "mods\\liberty.sc2mod\\base.sc2assets\\Assets\\Units\\Marine.m3",
      "--archive",
      "unpacked",
      "--out",
      "out",
    ])
    .expect("extract arguments parse");

    let Command::Extract {
      archive_path,
      archive,
      out,
    } = cli.command
    else {
      panic!("expected the extract subcommand");
    };
    assert_eq!(
      archive_path,
      "mods\\liberty.sc2mod\\base.sc2assets\\Assets\\Units\\Marine.m3"
    );
    assert_eq!(archive.archive, PathBuf::from("unpacked"));
    assert!(archive.config.is_none());
    assert_eq!(out, PathBuf::from("out"));
  }
}
