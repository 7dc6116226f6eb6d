//! [`JsonStore`]: the JSON-file implementation of [`LedgerStore`].

use std::{
  fmt, fs, io,
  path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};

use canefield_core::{farm::Farm, harvest::HarvestRecord, store::LedgerStore};

use crate::{Error, Result};

pub const FARMS_FILE: &str = "farms.json";
pub const HARVESTS_FILE: &str = "harvests.json";

// ─── Integrity report ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
  Ok { records: usize },
  Missing,
  Corrupt(String),
}

impl fmt::Display for FileStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FileStatus::Ok { records } => write!(f, "ok ({records} records)"),
      FileStatus::Missing => f.write_str("missing"),
      FileStatus::Corrupt(reason) => write!(f, "corrupt: {reason}"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
  pub farms:    FileStatus,
  pub harvests: FileStatus,
}

impl IntegrityReport {
  pub fn is_healthy(&self) -> bool {
    !matches!(self.farms, FileStatus::Corrupt(_))
      && !matches!(self.harvests, FileStatus::Corrupt(_))
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A ledger store rooted at one data directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
  dir: PathBuf,
}

impl JsonStore {
  /// Open a store at `dir`, creating the directory if needed.
  pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
    let dir = dir.as_ref().to_path_buf();
    fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
    Ok(Self { dir })
  }

  pub fn dir(&self) -> &Path { &self.dir }

  pub fn farms_path(&self) -> PathBuf { self.dir.join(FARMS_FILE) }

  pub fn harvests_path(&self) -> PathBuf { self.dir.join(HARVESTS_FILE) }

  /// Copy the existing data files into `dest` as
  /// `backup_<name>_<stamp>.json`. Returns the files written; a missing
  /// source file is skipped.
  pub fn backup(&self, dest: impl AsRef<Path>, stamp: &str) -> Result<Vec<PathBuf>> {
    let dest = dest.as_ref();
    fs::create_dir_all(dest).map_err(|e| Error::io(dest, e))?;

    let mut written = Vec::new();
    for (name, source) in [("farms", self.farms_path()), ("harvests", self.harvests_path())] {
      if !source.exists() {
        continue;
      }
      let target = dest.join(format!("backup_{name}_{stamp}.json"));
      fs::copy(&source, &target).map_err(|e| Error::io(&source, e))?;
      written.push(target);
    }
    tracing::info!(files = written.len(), dest = %dest.display(), "backup written");
    Ok(written)
  }

  /// Parse both files without loading them into a ledger.
  pub fn check(&self) -> Result<IntegrityReport> {
    Ok(IntegrityReport {
      farms:    status_of::<Farm>(&self.farms_path())?,
      harvests: status_of::<HarvestRecord>(&self.harvests_path())?,
    })
  }
}

fn status_of<T: DeserializeOwned>(path: &Path) -> Result<FileStatus> {
  match read_collection::<T>(path) {
    Ok(Some(items)) => Ok(FileStatus::Ok { records: items.len() }),
    Ok(None) => Ok(FileStatus::Missing),
    Err(Error::Corrupt { source, .. }) => Ok(FileStatus::Corrupt(source.to_string())),
    Err(e) => Err(e),
  }
}

/// `None` when the file does not exist.
fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>> {
  let text = match fs::read_to_string(path) {
    Ok(text) => text,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
    Err(e) => return Err(Error::io(path, e)),
  };
  serde_json::from_str(&text)
    .map(Some)
    .map_err(|source| Error::Corrupt { path: path.to_path_buf(), source })
}

fn write_collection<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
  let text = serde_json::to_string_pretty(items)?;
  let tmp = path.with_extension("json.tmp");
  fs::write(&tmp, text).map_err(|e| Error::io(&tmp, e))?;
  fs::rename(&tmp, path).map_err(|e| Error::io(path, e))?;
  Ok(())
}

impl LedgerStore for JsonStore {
  type Error = Error;

  fn load_farms(&self) -> Result<Vec<Farm>> {
    let farms = read_collection(&self.farms_path())?.unwrap_or_default();
    tracing::debug!(count = farms.len(), "loaded farms");
    Ok(farms)
  }

  fn load_harvests(&self) -> Result<Vec<HarvestRecord>> {
    let harvests = read_collection(&self.harvests_path())?.unwrap_or_default();
    tracing::debug!(count = harvests.len(), "loaded harvests");
    Ok(harvests)
  }

  fn save_farms(&self, farms: &[Farm]) -> Result<()> {
    write_collection(&self.farms_path(), farms)?;
    tracing::info!(count = farms.len(), "saved farms");
    Ok(())
  }

  fn save_harvests(&self, harvests: &[HarvestRecord]) -> Result<()> {
    write_collection(&self.harvests_path(), harvests)?;
    tracing::info!(count = harvests.len(), "saved harvests");
    Ok(())
  }
}
