//! Layered runtime configuration.
//!
//! An optional TOML file is read first, then `CANEFIELD__*` environment
//! variables override it (for example `CANEFIELD__DATA_DIR=/srv/cane` or
//! `CANEFIELD__REFERENCE__LIMITS__LOSS_MAX=40`).

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use canefield_core::reference::ReferenceData;
use serde::Deserialize;

/// Location of the optional SQLite mirror.
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorSettings {
  pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// Directory holding `farms.json` and `harvests.json`.
  #[serde(default = "default_data_dir")]
  pub data_dir:   PathBuf,
  /// Where `data backup` writes when no destination is given.
  #[serde(default = "default_backup_dir")]
  pub backup_dir: PathBuf,
  /// Absent means no mirror is configured.
  #[serde(default)]
  pub mirror:     Option<MirrorSettings>,
  #[serde(default)]
  pub reference:  ReferenceData,
}

fn default_data_dir() -> PathBuf { PathBuf::from("data") }

fn default_backup_dir() -> PathBuf { PathBuf::from("backups") }

impl Default for Settings {
  fn default() -> Self {
    Self {
      data_dir:   default_data_dir(),
      backup_dir: default_backup_dir(),
      mirror:     None,
      reference:  ReferenceData::default(),
    }
  }
}

impl Settings {
  /// Read `path` (if it exists) and the environment, then check the
  /// reference tables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings: Settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("CANEFIELD")
          .prefix_separator("__")
          .separator("__"),
      )
      .build()
      .with_context(|| format!("failed to read configuration from {}", path.display()))?
      .try_deserialize()
      .context("failed to deserialise settings")?;

    settings
      .reference
      .validate()
      .context("invalid reference data in configuration")?;
    Ok(settings)
  }
}
