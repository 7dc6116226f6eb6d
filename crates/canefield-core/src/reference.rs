//! Fixed reference data: the closed enumerations and the configurable
//! numeric tables (bounds, severity bands, expected productivity).
//!
//! The enumerations are compiled in. Numeric tables are supplied by
//! configuration and default to the agronomic values the system was
//! calibrated with.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{Error, Result};

/// Earliest accepted planting year.
pub const MIN_PLANTING_YEAR: i32 = 1900;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// How a plot was harvested.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum HarvestMethod {
  Manual,
  Mechanical,
  Mixed,
}

/// A cause of yield loss.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LossCategory {
  /// Cane left behind or shredded by the harvester.
  Mechanical,
  /// Stools pulled up during cutting.
  RootDamage,
  /// Cane carried off with straw and residue.
  Residue,
  Climatic,
  Pest,
}

/// Sugarcane cultivars tracked by the system.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Variety {
  #[serde(rename = "RB867515", alias = "rb867515")]
  #[strum(serialize = "RB867515")]
  Rb867515,
  #[serde(rename = "RB966928", alias = "rb966928")]
  #[strum(serialize = "RB966928")]
  Rb966928,
  #[serde(rename = "SP813250", alias = "sp813250")]
  #[strum(serialize = "SP813250")]
  Sp813250,
  #[serde(rename = "CTC4", alias = "ctc4")]
  #[strum(serialize = "CTC4")]
  Ctc4,
  #[serde(rename = "CTC20", alias = "ctc20")]
  #[strum(serialize = "CTC20")]
  Ctc20,
}

/// Named classification of a total loss percentage.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Severity {
  Low,
  Medium,
  High,
  Critical,
}

// ─── Numeric tables ──────────────────────────────────────────────────────────

/// Inclusive validation bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
  /// Plot area, hectares.
  pub area_min:         f64,
  pub area_max:         f64,
  /// Harvested quantity per hectare, tonnes.
  pub productivity_min: f64,
  pub productivity_max: f64,
  /// Per-category loss, percent.
  pub loss_min:         f64,
  pub loss_max:         f64,
}

impl Default for Limits {
  fn default() -> Self {
    Self {
      area_min:         0.1,
      area_max:         1000.0,
      productivity_min: 10.0,
      productivity_max: 200.0,
      loss_min:         0.0,
      loss_max:         50.0,
    }
  }
}

/// One severity band. `upper_bound` is inclusive; `None` means open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityBand {
  pub severity:    Severity,
  #[serde(default)]
  pub upper_bound: Option<f64>,
}

impl SeverityBand {
  fn contains(&self, total_loss: f64) -> bool {
    self.upper_bound.is_none_or(|bound| total_loss <= bound)
  }
}

/// All configuration-supplied reference data consumed by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
  pub limits:                Limits,
  /// Sorted ascending by bound; the last band is open-ended.
  pub severity_bands:        Vec<SeverityBand>,
  /// Expected tonnes per hectare. A variety absent from the table has no
  /// baseline.
  pub expected_productivity: BTreeMap<Variety, f64>,
}

impl Default for ReferenceData {
  fn default() -> Self {
    let band = |severity, upper_bound| SeverityBand { severity, upper_bound };
    Self {
      limits:                Limits::default(),
      severity_bands:        vec![
        band(Severity::Low, Some(5.0)),
        band(Severity::Medium, Some(10.0)),
        band(Severity::High, Some(15.0)),
        band(Severity::Critical, None),
      ],
      expected_productivity: BTreeMap::from([
        (Variety::Rb867515, 85.0),
        (Variety::Rb966928, 90.0),
        (Variety::Sp813250, 80.0),
        (Variety::Ctc4, 95.0),
        (Variety::Ctc20, 92.0),
      ]),
    }
  }
}

impl ReferenceData {
  /// Classify a total loss percentage: the first band whose inclusive upper
  /// bound is at or above `total_loss`.
  pub fn classify(&self, total_loss: f64) -> Severity {
    self
      .severity_bands
      .iter()
      .find(|band| band.contains(total_loss))
      .map(|band| band.severity)
      .unwrap_or(Severity::Critical)
  }

  pub fn expected_productivity(&self, variety: Variety) -> Option<f64> {
    self.expected_productivity.get(&variety).copied()
  }

  /// Reject tables the builder and classifier cannot work with.
  pub fn validate(&self) -> Result<()> {
    let l = &self.limits;
    for (name, min, max) in [
      ("area", l.area_min, l.area_max),
      ("productivity", l.productivity_min, l.productivity_max),
      ("loss", l.loss_min, l.loss_max),
    ] {
      if !(min.is_finite() && max.is_finite()) || min > max {
        return Err(Error::InvalidReference(format!(
          "{name} bounds {min}..{max} are not an ascending finite range"
        )));
      }
    }
    if l.area_min <= 0.0 {
      return Err(Error::InvalidReference("area_min must be positive".into()));
    }

    let Some((last, rest)) = self.severity_bands.split_last() else {
      return Err(Error::InvalidReference("no severity bands configured".into()));
    };
    if last.upper_bound.is_some() {
      return Err(Error::InvalidReference(
        "the last severity band must be open-ended".into(),
      ));
    }
    let mut previous = f64::NEG_INFINITY;
    for band in rest {
      match band.upper_bound {
        Some(bound) if bound > previous => previous = bound,
        Some(bound) => {
          return Err(Error::InvalidReference(format!(
            "severity band {} bound {bound} is not above the previous band",
            band.severity
          )));
        }
        None => {
          return Err(Error::InvalidReference(format!(
            "only the last severity band may be open-ended, not {}",
            band.severity
          )));
        }
      }
    }

    if let Some((variety, value)) = self
      .expected_productivity
      .iter()
      .find(|(_, v)| !(v.is_finite() && **v > 0.0))
    {
      return Err(Error::InvalidReference(format!(
        "expected productivity for {variety} must be positive, got {value}"
      )));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn default_reference_data_is_valid() {
    ReferenceData::default().validate().unwrap();
  }

  #[test]
  fn band_upper_bound_is_inclusive() {
    let r = ReferenceData::default();
    assert_eq!(r.classify(0.0), Severity::Low);
    assert_eq!(r.classify(5.0), Severity::Low);
    assert_eq!(r.classify(5.01), Severity::Medium);
    assert_eq!(r.classify(10.0), Severity::Medium);
    assert_eq!(r.classify(15.0), Severity::High);
    assert_eq!(r.classify(15.01), Severity::Critical);
    assert_eq!(r.classify(99.0), Severity::Critical);
  }

  #[test]
  fn unsorted_bands_are_rejected() {
    let mut r = ReferenceData::default();
    r.severity_bands.swap(0, 1);
    assert!(matches!(r.validate(), Err(Error::InvalidReference(_))));
  }

  #[test]
  fn closed_last_band_is_rejected() {
    let mut r = ReferenceData::default();
    r.severity_bands.pop();
    assert!(matches!(r.validate(), Err(Error::InvalidReference(_))));
  }

  #[test]
  fn inverted_limits_are_rejected() {
    let mut r = ReferenceData::default();
    r.limits.productivity_min = 300.0;
    assert!(r.validate().is_err());
  }

  #[test]
  fn enumerations_parse_case_insensitively() {
    assert_eq!(HarvestMethod::from_str("Mechanical").unwrap(), HarvestMethod::Mechanical);
    assert_eq!(LossCategory::from_str("ROOT_DAMAGE").unwrap(), LossCategory::RootDamage);
    assert_eq!(Variety::from_str("ctc4").unwrap(), Variety::Ctc4);
    assert!(HarvestMethod::from_str("aerial").is_err());
  }

  #[test]
  fn display_matches_serialised_names() {
    assert_eq!(LossCategory::RootDamage.to_string(), "root_damage");
    assert_eq!(Variety::Rb867515.to_string(), "RB867515");
    assert_eq!(Severity::Critical.to_string(), "critical");
  }
}
