//! Farms and plots: the land-holding entities harvests are recorded against.
//!
//! A farm's total area is never set directly. It is the sum of its plot
//! areas, recomputed whenever a plot is attached and whenever a farm is
//! rebuilt from storage.

use chrono::{DateTime, Datelike, Local, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  Result,
  document::DocumentKind,
  reference::{Limits, MIN_PLANTING_YEAR, Variety},
  validate,
};

// ─── Plot ────────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PlotStatus {
  #[default]
  Active,
  Inactive,
}

/// A subdivision of a farm planted with one variety in one year.
///
/// Identified only by `(farm id, code)`; plots never move between farms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
  /// Upper-cased on construction.
  pub code:          String,
  /// Hectares.
  pub area:          f64,
  pub variety:       Variety,
  pub planting_year: i32,
  #[serde(default)]
  pub status:        PlotStatus,
  /// Placeholder `(latitude, longitude)`; carried through storage, unused.
  #[serde(default)]
  pub coordinates:   (f64, f64),
}

impl Plot {
  /// Validate and build a plot. `current_year` bounds the planting year.
  pub fn new(
    code: &str,
    area: f64,
    variety: &str,
    planting_year: i32,
    limits: &Limits,
    current_year: i32,
  ) -> Result<Self> {
    let code = validate::non_empty_text("plot code", code)?.to_uppercase();
    let area = validate::real_in_range("area", area, limits.area_min, limits.area_max)?;
    let variety = variety
      .trim()
      .parse::<Variety>()
      .map_err(|_| crate::Error::UnknownVariety(variety.to_owned()))?;
    let planting_year = validate::integer_in_range(
      "planting year",
      planting_year.into(),
      MIN_PLANTING_YEAR.into(),
      current_year.into(),
    )? as i32;

    Ok(Self {
      code,
      area,
      variety,
      planting_year,
      status: PlotStatus::Active,
      coordinates: (0.0, 0.0),
    })
  }

  /// Age in whole years as of `year`.
  pub fn age_in(&self, year: i32) -> i32 { year - self.planting_year }

  /// Age in whole years as of today. Computed on every call.
  pub fn age(&self) -> i32 { self.age_in(Local::now().year()) }
}

// ─── Farm ────────────────────────────────────────────────────────────────────

/// Validated input to [`crate::registry::Registry::register_farm`].
#[derive(Debug, Clone)]
pub struct NewFarm {
  pub name:     String,
  pub owner:    String,
  pub document: String,
  pub location: String,
}

/// A registered farm with its plots in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FarmRecord", into = "FarmRecord")]
pub struct Farm {
  pub id:            u32,
  pub name:          String,
  pub owner:         String,
  /// As entered, punctuation included.
  pub document:      String,
  pub document_kind: DocumentKind,
  pub location:      String,
  pub created_at:    DateTime<Utc>,
  plots:             Vec<Plot>,
  total_area:        f64,
}

impl Farm {
  pub(crate) fn new(
    id: u32,
    input: NewFarm,
    document_kind: DocumentKind,
    created_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id,
      name: input.name,
      owner: input.owner,
      document: input.document,
      document_kind,
      location: input.location,
      created_at,
      plots: Vec::new(),
      total_area: 0.0,
    }
  }

  pub fn plots(&self) -> &[Plot] { &self.plots }

  /// Sum of the current plot areas, hectares.
  pub fn total_area(&self) -> f64 { self.total_area }

  pub fn plot(&self, code: &str) -> Option<&Plot> {
    let code = code.trim().to_uppercase();
    self.plots.iter().find(|p| p.code == code)
  }

  pub(crate) fn plot_mut(&mut self, code: &str) -> Option<&mut Plot> {
    let code = code.trim().to_uppercase();
    self.plots.iter_mut().find(|p| p.code == code)
  }

  /// Append a plot and recompute the total area. Uniqueness is the
  /// registry's responsibility.
  pub(crate) fn attach_plot(&mut self, plot: Plot) {
    self.plots.push(plot);
    self.recompute_total_area();
  }

  fn recompute_total_area(&mut self) {
    self.total_area = self.plots.iter().map(|p| p.area).sum();
  }
}

// ─── Storage shape ───────────────────────────────────────────────────────────

/// The flat, storage-facing shape of a [`Farm`].
///
/// `total_area` is written for the benefit of readers of the stored data
/// but ignored on the way back in; converting to a [`Farm`] recomputes it
/// and upper-cases plot codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmRecord {
  pub id:            u32,
  pub name:          String,
  pub owner:         String,
  pub document:      String,
  pub document_kind: DocumentKind,
  pub location:      String,
  pub created_at:    DateTime<Utc>,
  #[serde(default)]
  pub total_area:    f64,
  #[serde(default)]
  pub plots:         Vec<Plot>,
}

impl From<FarmRecord> for Farm {
  fn from(r: FarmRecord) -> Self {
    let plots = r
      .plots
      .into_iter()
      .map(|mut p| {
        p.code = p.code.trim().to_uppercase();
        p
      })
      .collect();
    let mut farm = Farm {
      id:            r.id,
      name:          r.name,
      owner:         r.owner,
      document:      r.document,
      document_kind: r.document_kind,
      location:      r.location,
      created_at:    r.created_at,
      plots,
      total_area:    0.0,
    };
    farm.recompute_total_area();
    farm
  }
}

impl From<Farm> for FarmRecord {
  fn from(f: Farm) -> Self {
    FarmRecord {
      id:            f.id,
      name:          f.name,
      owner:         f.owner,
      document:      f.document,
      document_kind: f.document_kind,
      location:      f.location,
      created_at:    f.created_at,
      total_area:    f.total_area,
      plots:         f.plots,
    }
  }
}
