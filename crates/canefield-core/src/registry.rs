//! The identity registry: owns farms and their plots.

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  document::validate_document,
  farm::{Farm, NewFarm, Plot, PlotStatus},
  validate,
};

/// Farms in registration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
  farms: Vec<Farm>,
}

impl Registry {
  pub fn new() -> Self { Self::default() }

  /// Rehydrate from stored farms, keeping their order and identifiers.
  pub fn from_farms(farms: Vec<Farm>) -> Self { Self { farms } }

  pub fn farms(&self) -> &[Farm] { &self.farms }

  pub fn into_farms(self) -> Vec<Farm> { self.farms }

  /// Next farm id: one past the highest id in use, or 1 when empty.
  fn next_farm_id(&self) -> u32 {
    self.farms.iter().map(|f| f.id).max().map_or(1, |max| max + 1)
  }

  /// Validate the owner's document and register a new farm.
  pub fn register_farm(&mut self, input: NewFarm, now: DateTime<Utc>) -> Result<&Farm> {
    let Some(kind) = validate_document(&input.document) else {
      tracing::debug!(document = %input.document, "rejected farm: invalid document");
      return Err(Error::InvalidDocument(input.document));
    };
    let input = NewFarm {
      name:     validate::non_empty_text("farm name", &input.name)?,
      owner:    validate::non_empty_text("owner", &input.owner)?,
      document: input.document.trim().to_owned(),
      location: validate::non_empty_text("location", &input.location)?,
    };

    let id = self.next_farm_id();
    self.farms.push(Farm::new(id, input, kind, now));
    let farm = &self.farms[self.farms.len() - 1];
    tracing::info!(farm_id = id, name = %farm.name, kind = kind.label(), "registered farm");
    Ok(farm)
  }

  /// Attach `plot` to a farm, rejecting a code already used on that farm.
  pub fn add_plot(&mut self, farm_id: u32, mut plot: Plot) -> Result<&Farm> {
    let farm = self
      .farms
      .iter_mut()
      .find(|f| f.id == farm_id)
      .ok_or(Error::FarmNotFound(farm_id))?;

    plot.code = plot.code.trim().to_uppercase();
    if farm.plot(&plot.code).is_some() {
      tracing::debug!(farm_id, code = %plot.code, "rejected plot: duplicate code");
      return Err(Error::DuplicatePlotCode { farm_id, code: plot.code });
    }

    tracing::info!(farm_id, code = %plot.code, area = plot.area, "attached plot");
    farm.attach_plot(plot);
    Ok(&*farm)
  }

  /// Change the status of an attached plot; the only mutation a plot allows.
  pub fn set_plot_status(&mut self, farm_id: u32, code: &str, status: PlotStatus) -> Result<()> {
    let farm = self
      .farms
      .iter_mut()
      .find(|f| f.id == farm_id)
      .ok_or(Error::FarmNotFound(farm_id))?;
    let plot = farm.plot_mut(code).ok_or_else(|| Error::PlotNotFound {
      farm_id,
      code: code.trim().to_uppercase(),
    })?;
    plot.status = status;
    Ok(())
  }

  pub fn find_farm_by_id(&self, id: u32) -> Option<&Farm> {
    self.farms.iter().find(|f| f.id == id)
  }

  /// Case-insensitive substring match on the farm name, in registry order.
  pub fn find_farms_by_name(&self, text: &str) -> Vec<&Farm> {
    let needle = text.to_lowercase();
    self
      .farms
      .iter()
      .filter(|f| f.name.to_lowercase().contains(&needle))
      .collect()
  }

  /// `(None, None)` if the farm is missing; `(Some, None)` if only the plot is.
  pub fn find_plot(&self, farm_id: u32, code: &str) -> (Option<&Farm>, Option<&Plot>) {
    match self.find_farm_by_id(farm_id) {
      Some(farm) => (Some(farm), farm.plot(code)),
      None => (None, None),
    }
  }
}
