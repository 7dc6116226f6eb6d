//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings and harvest dates are `YYYY-MM-DD`.
//! Enumerations are stored under their canonical display names.

use std::{collections::BTreeMap, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use canefield_core::{
  document::DocumentKind,
  farm::{Farm, FarmRecord, Plot},
  harvest::{HarvestRecord, LossSummary},
  reference::LossCategory,
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_document_kind(k: DocumentKind) -> &'static str {
  match k {
    DocumentKind::Personal => "personal",
    DocumentKind::Corporate => "corporate",
  }
}

pub fn decode_document_kind(s: &str) -> Result<DocumentKind> {
  match s {
    "personal" => Ok(DocumentKind::Personal),
    "corporate" => Ok(DocumentKind::Corporate),
    other => Err(Error::UnknownValue { field: "document_kind", value: other.to_owned() }),
  }
}

/// Parse any of the strum-backed enumerations.
pub fn decode_enum<T: FromStr>(field: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::UnknownValue { field, value: s.to_owned() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column values of a `farms` row.
pub struct RawFarm {
  pub farm_id:       u32,
  pub name:          String,
  pub owner:         String,
  pub document:      String,
  pub document_kind: String,
  pub location:      String,
  pub created_at:    String,
}

impl RawFarm {
  pub fn from_farm(f: &Farm) -> Self {
    Self {
      farm_id:       f.id,
      name:          f.name.clone(),
      owner:         f.owner.clone(),
      document:      f.document.clone(),
      document_kind: encode_document_kind(f.document_kind).to_owned(),
      location:      f.location.clone(),
      created_at:    encode_dt(f.created_at),
    }
  }

  /// Rebuild the farm; the total area is recomputed from `plots`.
  pub fn into_farm(self, plots: Vec<Plot>) -> Result<Farm> {
    Ok(Farm::from(FarmRecord {
      id:            self.farm_id,
      name:          self.name,
      owner:         self.owner,
      document:      self.document,
      document_kind: decode_document_kind(&self.document_kind)?,
      location:      self.location,
      created_at:    decode_dt(&self.created_at)?,
      total_area:    0.0,
      plots,
    }))
  }
}

/// Column values of a `plots` row.
pub struct RawPlot {
  pub farm_id:       u32,
  pub position:      i64,
  pub code:          String,
  pub area:          f64,
  pub variety:       String,
  pub planting_year: i32,
  pub status:        String,
  pub latitude:      f64,
  pub longitude:     f64,
}

impl RawPlot {
  pub fn from_plot(farm_id: u32, position: usize, p: &Plot) -> Self {
    Self {
      farm_id,
      position: position as i64,
      code: p.code.clone(),
      area: p.area,
      variety: p.variety.to_string(),
      planting_year: p.planting_year,
      status: p.status.to_string(),
      latitude: p.coordinates.0,
      longitude: p.coordinates.1,
    }
  }

  pub fn into_plot(self) -> Result<Plot> {
    Ok(Plot {
      code:          self.code,
      area:          self.area,
      variety:       decode_enum("variety", &self.variety)?,
      planting_year: self.planting_year,
      status:        decode_enum("status", &self.status)?,
      coordinates:   (self.latitude, self.longitude),
    })
  }
}

/// Column values of a `harvests` row.
pub struct RawHarvest {
  pub harvest_id:     u32,
  pub farm_id:        u32,
  pub farm_name:      String,
  pub plot_code:      String,
  pub harvest_date:   String,
  pub registered_at:  String,
  pub method:         String,
  pub harvested_area: f64,
  pub variety:        String,
  pub quantity:       f64,
  pub productivity:   f64,
  pub total_loss_pct: f64,
  pub lost_quantity:  f64,
  pub severity:       String,
}

impl RawHarvest {
  pub fn from_record(h: &HarvestRecord) -> Self {
    Self {
      harvest_id:     h.id,
      farm_id:        h.farm_id,
      farm_name:      h.farm_name.clone(),
      plot_code:      h.plot_code.clone(),
      harvest_date:   encode_date(h.harvest_date),
      registered_at:  encode_dt(h.registered_at),
      method:         h.method.to_string(),
      harvested_area: h.harvested_area,
      variety:        h.variety.to_string(),
      quantity:       h.quantity,
      productivity:   h.productivity,
      total_loss_pct: h.total_loss_pct,
      lost_quantity:  h.lost_quantity,
      severity:       h.severity.to_string(),
    }
  }

  /// Rebuild the record from its row and its loss rows in position order.
  pub fn into_record(self, summary: Vec<(LossCategory, f64)>) -> Result<HarvestRecord> {
    let losses: BTreeMap<LossCategory, f64> = summary.iter().copied().collect();
    Ok(HarvestRecord {
      id: self.harvest_id,
      farm_id: self.farm_id,
      farm_name: self.farm_name,
      plot_code: self.plot_code,
      harvest_date: decode_date(&self.harvest_date)?,
      registered_at: decode_dt(&self.registered_at)?,
      method: decode_enum("method", &self.method)?,
      harvested_area: self.harvested_area,
      variety: decode_enum("variety", &self.variety)?,
      quantity: self.quantity,
      productivity: self.productivity,
      losses,
      total_loss_pct: self.total_loss_pct,
      lost_quantity: self.lost_quantity,
      severity: decode_enum("severity", &self.severity)?,
      loss_summary: LossSummary::from_ordered(summary),
    })
  }
}

/// Column values of a `harvest_losses` row.
pub struct RawLoss {
  pub harvest_id: u32,
  pub position:   i64,
  pub category:   String,
  pub pct:        f64,
}

impl RawLoss {
  pub fn from_record(h: &HarvestRecord) -> Vec<Self> {
    h.loss_summary
      .iter()
      .enumerate()
      .map(|(position, (category, pct))| Self {
        harvest_id: h.id,
        position:   position as i64,
        category:   category.to_string(),
        pct:        *pct,
      })
      .collect()
  }
}
