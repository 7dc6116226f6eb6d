//! The `LedgerStore` trait: primary persistence for farms and harvests.
//!
//! Implemented by `canefield-store-json`. The core never calls a store;
//! the presentation layer loads a [`Ledger`] at startup and saves it after
//! every mutation.

use crate::{farm::Farm, harvest::HarvestRecord, ledger::Ledger, reference::ReferenceData};

/// Whole-collection persistence. Loss summaries must come back in the order
/// they were saved.
pub trait LedgerStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Farms in stored order. An absent collection loads as empty.
  fn load_farms(&self) -> Result<Vec<Farm>, Self::Error>;

  /// Harvest records in stored order. An absent collection loads as empty.
  fn load_harvests(&self) -> Result<Vec<HarvestRecord>, Self::Error>;

  fn save_farms(&self, farms: &[Farm]) -> Result<(), Self::Error>;

  fn save_harvests(&self, harvests: &[HarvestRecord]) -> Result<(), Self::Error>;

  fn load_ledger(&self, reference: ReferenceData) -> Result<Ledger, Self::Error> {
    let farms = self.load_farms()?;
    let harvests = self.load_harvests()?;
    Ok(Ledger::from_parts(farms, harvests, reference))
  }

  fn save_ledger(&self, ledger: &Ledger) -> Result<(), Self::Error> {
    self.save_farms(ledger.registry().farms())?;
    self.save_harvests(ledger.harvests())
  }
}
