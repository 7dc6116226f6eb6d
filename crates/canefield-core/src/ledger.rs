//! The in-memory ledger: registry, harvest records, and reference data in
//! one owned value.
//!
//! Callers that need concurrent access wrap a `Ledger` in a single lock;
//! the ledger itself assumes one writer.

use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::{
  Error, Result,
  farm::Farm,
  harvest::{self, BuildContext, HarvestInput, HarvestRecord},
  reference::{HarvestMethod, ReferenceData},
  registry::Registry,
};

#[derive(Debug, Clone, Default)]
pub struct Ledger {
  registry:    Registry,
  harvests:    Vec<HarvestRecord>,
  reference:   ReferenceData,
  /// Highest harvest id handed out by [`Ledger::build_harvest`].
  last_issued: u32,
}

impl Ledger {
  pub fn new(reference: ReferenceData) -> Self {
    Self { reference, ..Default::default() }
  }

  /// Rehydrate from stored collections, keeping their order and ids.
  pub fn from_parts(
    farms: Vec<Farm>,
    harvests: Vec<HarvestRecord>,
    reference: ReferenceData,
  ) -> Self {
    tracing::debug!(farms = farms.len(), harvests = harvests.len(), "ledger rehydrated");
    Self {
      registry: Registry::from_farms(farms),
      harvests,
      reference,
      last_issued: 0,
    }
  }

  pub fn into_parts(self) -> (Vec<Farm>, Vec<HarvestRecord>) {
    (self.registry.into_farms(), self.harvests)
  }

  pub fn registry(&self) -> &Registry { &self.registry }

  pub fn registry_mut(&mut self) -> &mut Registry { &mut self.registry }

  pub fn reference(&self) -> &ReferenceData { &self.reference }

  fn next_harvest_id(&self) -> u32 {
    let existing = self.harvests.iter().map(|h| h.id).max().unwrap_or(0);
    existing.max(self.last_issued) + 1
  }

  /// Build a record against the current registry using the local clock.
  /// The record is not appended.
  pub fn build_harvest(&mut self, input: &HarvestInput) -> Result<HarvestRecord> {
    self.build_harvest_at(input, Local::now().date_naive(), Utc::now())
  }

  /// [`Ledger::build_harvest`] with an explicit clock.
  pub fn build_harvest_at(
    &mut self,
    input: &HarvestInput,
    today: NaiveDate,
    registered_at: DateTime<Utc>,
  ) -> Result<HarvestRecord> {
    let id = self.next_harvest_id();
    let ctx = BuildContext {
      registry: &self.registry,
      reference: &self.reference,
      today,
      registered_at,
    };
    let record = harvest::build(ctx, input, id).inspect_err(|e| {
      tracing::debug!(farm_id = input.farm_id, plot = %input.plot_code, error = %e, "harvest rejected");
    })?;
    self.last_issued = id;
    tracing::info!(
      id,
      farm_id = record.farm_id,
      plot = %record.plot_code,
      total_loss = record.total_loss_pct,
      severity = %record.severity,
      "built harvest record"
    );
    Ok(record)
  }

  /// Append a built record. Records are never modified afterwards.
  pub fn append_harvest(&mut self, record: HarvestRecord) -> Result<&HarvestRecord> {
    if self.harvests.iter().any(|h| h.id == record.id) {
      return Err(Error::DuplicateHarvestId(record.id));
    }
    tracing::info!(id = record.id, "appended harvest record");
    self.harvests.push(record);
    Ok(&self.harvests[self.harvests.len() - 1])
  }

  /// Build and append in one step.
  pub fn record_harvest(&mut self, input: &HarvestInput) -> Result<&HarvestRecord> {
    let record = self.build_harvest(input)?;
    self.append_harvest(record)
  }

  /// All records in append order.
  pub fn harvests(&self) -> &[HarvestRecord] { &self.harvests }

  pub fn harvest_by_id(&self, id: u32) -> Result<&HarvestRecord> {
    self.harvests.iter().find(|h| h.id == id).ok_or(Error::HarvestNotFound(id))
  }

  pub fn harvests_for_farm(&self, farm_id: u32) -> Vec<&HarvestRecord> {
    self.harvests.iter().filter(|h| h.farm_id == farm_id).collect()
  }

  pub fn harvests_for_plot(&self, farm_id: u32, code: &str) -> Vec<&HarvestRecord> {
    let code = code.trim().to_uppercase();
    self
      .harvests
      .iter()
      .filter(|h| h.farm_id == farm_id && h.plot_code == code)
      .collect()
  }

  pub fn harvests_by_method(&self, method: HarvestMethod) -> Vec<&HarvestRecord> {
    self.harvests.iter().filter(|h| h.method == method).collect()
  }

  /// Drop every farm and record. Reference data is kept.
  pub fn clear(&mut self) {
    self.registry = Registry::new();
    self.harvests.clear();
    self.last_issued = 0;
    tracing::info!("ledger cleared");
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::{
    farm::{NewFarm, Plot},
    reference::Limits,
  };

  fn ledger() -> Ledger {
    let mut l = Ledger::new(ReferenceData::default());
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    l.registry_mut()
      .register_farm(
        NewFarm {
          name:     "Santa Rita".into(),
          owner:    "Joao Silva".into(),
          document: "529.982.247-25".into(),
          location: "Ribeirao Preto - SP".into(),
        },
        now,
      )
      .unwrap();
    let plot = Plot::new("T01", 10.0, "CTC4", 2020, &Limits::default(), 2024).unwrap();
    l.registry_mut().add_plot(1, plot).unwrap();
    l
  }

  fn input(method: &str) -> HarvestInput {
    HarvestInput {
      farm_id:   1,
      plot_code: "T01".into(),
      date:      "15/09/2024".into(),
      method:    method.into(),
      quantity:  900.0,
      losses:    vec![("mechanical".into(), 3.0)],
    }
  }

  fn build(l: &mut Ledger, method: &str) -> Result<HarvestRecord> {
    l.build_harvest_at(
      &input(method),
      NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
      Utc.with_ymd_and_hms(2024, 10, 1, 8, 0, 0).unwrap(),
    )
  }

  #[test]
  fn identical_builds_differ_only_by_id() {
    let mut l = ledger();
    let a = build(&mut l, "manual").unwrap();
    let b = build(&mut l, "manual").unwrap();
    assert_eq!((a.id, b.id), (1, 2));
    assert_eq!(HarvestRecord { id: 1, ..b }, a);
  }

  #[test]
  fn failed_build_does_not_consume_an_id() {
    let mut l = ledger();
    assert!(build(&mut l, "by hand").is_err());
    assert_eq!(build(&mut l, "manual").unwrap().id, 1);
  }

  #[test]
  fn ids_continue_after_rehydration() {
    let mut l = ledger();
    let r = build(&mut l, "manual").unwrap();
    l.append_harvest(r).unwrap();
    let (farms, harvests) = l.into_parts();
    let mut l = Ledger::from_parts(farms, harvests, ReferenceData::default());
    assert_eq!(build(&mut l, "manual").unwrap().id, 2);
  }

  #[test]
  fn duplicate_append_is_rejected() {
    let mut l = ledger();
    let r = build(&mut l, "manual").unwrap();
    l.append_harvest(r.clone()).unwrap();
    assert!(matches!(l.append_harvest(r), Err(Error::DuplicateHarvestId(1))));
    assert_eq!(l.harvests().len(), 1);
  }

  #[test]
  fn queries_filter_by_farm_plot_and_method() {
    let mut l = ledger();
    for method in ["manual", "mechanical", "mechanical"] {
      let r = build(&mut l, method).unwrap();
      l.append_harvest(r).unwrap();
    }
    assert_eq!(l.harvests_for_farm(1).len(), 3);
    assert!(l.harvests_for_farm(2).is_empty());
    assert_eq!(l.harvests_for_plot(1, "t01").len(), 3);
    assert_eq!(l.harvests_by_method(HarvestMethod::Mechanical).len(), 2);
    assert_eq!(l.harvest_by_id(2).unwrap().method, HarvestMethod::Mechanical);
    assert!(matches!(l.harvest_by_id(9), Err(Error::HarvestNotFound(9))));
  }

  #[test]
  fn clear_empties_everything() {
    let mut l = ledger();
    let r = build(&mut l, "manual").unwrap();
    l.append_harvest(r).unwrap();
    l.clear();
    assert!(l.harvests().is_empty());
    assert!(l.registry().farms().is_empty());
    assert_eq!(build(&mut l, "manual").unwrap_err().kind(), crate::ErrorKind::NotFound);
  }
}
