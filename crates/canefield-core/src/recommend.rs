//! Rule-based advisories for a single harvest record.
//!
//! Every rule is evaluated independently and contributes its lines in a
//! fixed order: severity banner, per-category advisories, method advisory,
//! productivity advisory. A record that triggers nothing gets the two
//! generic lines.

use std::fmt;

use serde::Serialize;

use crate::{
  harvest::HarvestRecord,
  reference::{HarvestMethod, LossCategory, ReferenceData},
};

const CRITICAL_TOTAL_LOSS: f64 = 15.0;
const ELEVATED_TOTAL_LOSS: f64 = 10.0;
const EXCELLENT_TOTAL_LOSS: f64 = 5.0;
const METHOD_REVIEW_TOTAL_LOSS: f64 = 10.0;
/// Share of the expected productivity below which the plot is flagged.
const PRODUCTIVITY_FLOOR: f64 = 0.8;

/// Per-category trigger (strictly above) and the lines it contributes.
const CATEGORY_RULES: [(LossCategory, f64, &[&str]); 5] = [
  (LossCategory::Mechanical, 5.0, &[
    "Review harvester settings (ground speed, cutting height).",
    "Check the preventive maintenance schedule of the equipment.",
  ]),
  (LossCategory::RootDamage, 3.0, &[
    "Adjust cutting height to avoid pulling up root systems.",
  ]),
  (LossCategory::Residue, 3.0, &[
    "Optimize the cleaning and straw extraction system.",
  ]),
  (LossCategory::Climatic, 2.0, &[
    "Plan harvests for more favorable weather windows.",
    "Consider a weather monitoring system.",
  ]),
  (LossCategory::Pest, 2.0, &[
    "Implement integrated pest management.",
    "Run a phytosanitary analysis of the plot.",
  ]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  Urgent,
  Warning,
  Info,
}

/// One advisory line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advisory {
  pub priority: Priority,
  pub text:     String,
}

impl Advisory {
  fn new(priority: Priority, text: impl Into<String>) -> Self {
    Self { priority, text: text.into() }
  }
}

impl fmt::Display for Advisory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.text) }
}

/// Advisories for `record`, in rule order.
pub fn recommend(record: &HarvestRecord, reference: &ReferenceData) -> Vec<Advisory> {
  let mut out = Vec::new();
  let total = record.total_loss_pct;

  if total > CRITICAL_TOTAL_LOSS {
    out.push(Advisory::new(Priority::Urgent, "URGENT: critical losses, immediate action required."));
  } else if total > ELEVATED_TOTAL_LOSS {
    out.push(Advisory::new(Priority::Warning, "Losses above average. Review the harvesting process."));
  } else if total <= EXCELLENT_TOTAL_LOSS {
    out.push(Advisory::new(Priority::Info, "Excellent performance. Keep current practices."));
  }

  for (category, threshold, lines) in CATEGORY_RULES {
    if record.loss(category) > threshold {
      out.extend(lines.iter().map(|l| Advisory::new(Priority::Warning, *l)));
    }
  }

  if record.method == HarvestMethod::Mechanical && total > METHOD_REVIEW_TOTAL_LOSS {
    out.push(Advisory::new(Priority::Warning, "Consider manual harvesting on critical plots."));
    out.push(Advisory::new(Priority::Warning, "Compare cost-benefit between harvesting methods."));
  }

  if let Some(expected) = reference.expected_productivity(record.variety)
    && record.productivity < expected * PRODUCTIVITY_FLOOR
  {
    out.push(Advisory::new(
      Priority::Warning,
      format!("Productivity below expected for {}.", record.variety),
    ));
    out.push(Advisory::new(Priority::Warning, "Review plot management (fertilization, irrigation)."));
  }

  if out.is_empty() {
    out.push(Advisory::new(Priority::Info, "Operation within normal parameters."));
    out.push(Advisory::new(Priority::Info, "Continue regular monitoring."));
  }
  out
}
