//! Harvest records and the builder that derives their metrics.
//!
//! A record is built whole from raw inputs: every derived field
//! (productivity, lost quantity, severity, sorted loss summary) is computed
//! once here and never recomputed. Inputs that would produce an
//! inconsistent record are rejected instead.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  reference::{HarvestMethod, LossCategory, ReferenceData, Severity, Variety},
  registry::Registry,
  validate,
};

/// Date formats accepted for the harvest date, tried in order.
const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

// ─── Loss summary ────────────────────────────────────────────────────────────

/// Loss categories ordered by percentage, highest first. Ties keep the
/// order in which the categories were entered.
///
/// Built once with the record; there is no mutable access.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LossSummary(Vec<(LossCategory, f64)>);

impl LossSummary {
  fn from_entered(entered: &[(LossCategory, f64)]) -> Self {
    let mut pairs = entered.to_vec();
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
    Self(pairs)
  }

  /// Wrap pairs that are already in summary order, e.g. read back from
  /// storage.
  pub fn from_ordered(pairs: Vec<(LossCategory, f64)>) -> Self { Self(pairs) }

  pub fn as_slice(&self) -> &[(LossCategory, f64)] { &self.0 }

  pub fn iter(&self) -> impl Iterator<Item = &(LossCategory, f64)> { self.0.iter() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One harvest event on one plot. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestRecord {
  pub id:              u32,
  pub farm_id:         u32,
  /// Farm name at the time of registration.
  pub farm_name:       String,
  pub plot_code:       String,
  pub harvest_date:    NaiveDate,
  /// Wall-clock time the record was created.
  pub registered_at:   DateTime<Utc>,
  pub method:          HarvestMethod,
  /// Plot area at the time of registration, hectares.
  pub harvested_area:  f64,
  pub variety:         Variety,
  /// Tonnes delivered.
  pub quantity:        f64,
  /// Tonnes per hectare.
  pub productivity:    f64,
  /// Percent per category, as entered.
  pub losses:          BTreeMap<LossCategory, f64>,
  /// Sum of all entered percentages.
  pub total_loss_pct:  f64,
  /// Tonnes lost relative to the theoretical undamaged harvest.
  pub lost_quantity:   f64,
  pub severity:        Severity,
  pub loss_summary:    LossSummary,
}

impl HarvestRecord {
  /// Entered percentage for `category`; omitted categories are zero.
  pub fn loss(&self, category: LossCategory) -> f64 {
    self.losses.get(&category).copied().unwrap_or(0.0)
  }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Raw inputs for one harvest, as a caller collects them.
#[derive(Debug, Clone)]
pub struct HarvestInput {
  pub farm_id:   u32,
  pub plot_code: String,
  /// `DD/MM/YYYY` or `YYYY-MM-DD`.
  pub date:      String,
  pub method:    String,
  /// Tonnes.
  pub quantity:  f64,
  /// `(category, percent)` pairs in entry order. Omitted categories are
  /// zero.
  pub losses:    Vec<(String, f64)>,
}

/// Everything [`build`] reads besides the input itself.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
  pub registry:      &'a Registry,
  pub reference:     &'a ReferenceData,
  /// Harvest dates after this are rejected.
  pub today:         NaiveDate,
  pub registered_at: DateTime<Utc>,
}

pub(crate) fn round2(value: f64) -> f64 { (value * 100.0).round() / 100.0 }

/// Parse a harvest date and reject dates after `today`.
pub fn parse_harvest_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
  let trimmed = input.trim();
  let date = DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
    .ok_or_else(|| Error::InvalidDate {
      input:  input.to_owned(),
      reason: "expected DD/MM/YYYY or YYYY-MM-DD",
    })?;
  if date > today {
    return Err(Error::InvalidDate {
      input:  input.to_owned(),
      reason: "date is in the future",
    });
  }
  Ok(date)
}

/// Potential-yield loss: `total_loss_pct` is a share of the theoretical
/// undamaged harvest, not of the delivered quantity.
pub fn lost_quantity(quantity: f64, total_loss_pct: f64) -> Result<f64> {
  if total_loss_pct >= 100.0 {
    return Err(Error::ArithmeticInvalid { total_loss: total_loss_pct });
  }
  let potential = quantity / (1.0 - total_loss_pct / 100.0);
  Ok(potential - quantity)
}

fn parse_losses(
  raw: &[(String, f64)],
  reference: &ReferenceData,
) -> Result<Vec<(LossCategory, f64)>> {
  let limits = &reference.limits;
  let mut entered: Vec<(LossCategory, f64)> = Vec::with_capacity(raw.len());
  for (name, pct) in raw {
    let category = name
      .trim()
      .parse::<LossCategory>()
      .map_err(|_| Error::UnknownLossCategory(name.clone()))?;
    if !pct.is_finite() || *pct < limits.loss_min || *pct > limits.loss_max {
      return Err(Error::LossOutOfRange {
        category,
        value: *pct,
        min: limits.loss_min,
        max: limits.loss_max,
      });
    }
    let category = validate::with_check(
      category,
      |c| !entered.iter().any(|(seen, _)| seen == c),
      || Error::DuplicateLossCategory(category),
    )?;
    entered.push((category, *pct));
  }
  Ok(entered)
}

/// Validate `input` and derive a complete record with identifier `id`.
///
/// Checks run in a fixed order, and the first failure is returned: plot
/// lookup, date, method, quantity and productivity, loss entries, then
/// the loss arithmetic.
pub fn build(ctx: BuildContext<'_>, input: &HarvestInput, id: u32) -> Result<HarvestRecord> {
  let (Some(farm), Some(plot)) = ctx.registry.find_plot(input.farm_id, &input.plot_code) else {
    return Err(Error::PlotNotFound {
      farm_id: input.farm_id,
      code:    input.plot_code.trim().to_uppercase(),
    });
  };

  let harvest_date = parse_harvest_date(&input.date, ctx.today)?;

  let method = input
    .method
    .trim()
    .parse::<HarvestMethod>()
    .map_err(|_| Error::InvalidMethod(input.method.clone()))?;

  let limits = &ctx.reference.limits;
  let quantity = validate::positive_real("quantity", input.quantity)?;
  let productivity = quantity / plot.area;
  if productivity < limits.productivity_min || productivity > limits.productivity_max {
    return Err(Error::ProductivityOutOfRange {
      value: productivity,
      min:   limits.productivity_min,
      max:   limits.productivity_max,
    });
  }

  let entered = parse_losses(&input.losses, ctx.reference)?;
  let total_loss: f64 = entered.iter().map(|(_, pct)| pct).sum();
  let lost = lost_quantity(quantity, total_loss)?;

  let severity = ctx.reference.classify(total_loss);

  Ok(HarvestRecord {
    id,
    farm_id: farm.id,
    farm_name: farm.name.clone(),
    plot_code: plot.code.clone(),
    harvest_date,
    registered_at: ctx.registered_at,
    method,
    harvested_area: plot.area,
    variety: plot.variety,
    quantity: round2(quantity),
    productivity: round2(productivity),
    losses: entered.iter().copied().collect(),
    total_loss_pct: round2(total_loss),
    lost_quantity: round2(lost),
    severity,
    loss_summary: LossSummary::from_entered(&entered),
  })
}
