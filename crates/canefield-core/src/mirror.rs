//! The `Mirror` trait: an optional, best-effort secondary copy of the
//! ledger in another backend.
//!
//! Nothing in this crate depends on a mirror being present. [`NoMirror`]
//! stands in when none is configured.

use std::{convert::Infallible, future::Future};

use serde::Serialize;

use crate::{farm::Farm, harvest::HarvestRecord};

/// Row counts written by [`Mirror::replace_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MirrorReport {
  pub farms:    usize,
  pub plots:    usize,
  pub harvests: usize,
  pub losses:   usize,
}

/// A secondary backend that can be overwritten with, or read back into, the
/// in-memory collections.
///
/// All methods return `Send` futures so a mirror can be driven from a
/// multi-threaded runtime.
pub trait Mirror: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Whether the backend is configured and reachable.
  fn is_available(&self) -> bool;

  /// Replace the mirror's contents with `farms` and `harvests` atomically.
  fn replace_all<'a>(
    &'a self,
    farms: &'a [Farm],
    harvests: &'a [HarvestRecord],
  ) -> impl Future<Output = Result<MirrorReport, Self::Error>> + Send + 'a;

  fn load_farms(&self) -> impl Future<Output = Result<Vec<Farm>, Self::Error>> + Send + '_;

  fn load_harvests(
    &self,
  ) -> impl Future<Output = Result<Vec<HarvestRecord>, Self::Error>> + Send + '_;
}

/// The absent mirror: unavailable, accepts writes as no-ops, loads empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMirror;

impl Mirror for NoMirror {
  type Error = Infallible;

  fn is_available(&self) -> bool { false }

  async fn replace_all<'a>(
    &'a self,
    _farms: &'a [Farm],
    _harvests: &'a [HarvestRecord],
  ) -> Result<MirrorReport, Infallible> {
    Ok(MirrorReport::default())
  }

  async fn load_farms(&self) -> Result<Vec<Farm>, Infallible> { Ok(Vec::new()) }

  async fn load_harvests(&self) -> Result<Vec<HarvestRecord>, Infallible> { Ok(Vec::new()) }
}
