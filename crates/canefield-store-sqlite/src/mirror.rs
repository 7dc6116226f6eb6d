//! [`SqliteMirror`]: the SQLite implementation of [`Mirror`].

use std::{collections::BTreeMap, path::Path};

use canefield_core::{
  farm::{Farm, Plot},
  harvest::HarvestRecord,
  mirror::{Mirror, MirrorReport},
  reference::LossCategory,
};

use crate::{
  Error, Result,
  encode::{RawFarm, RawHarvest, RawLoss, RawPlot, decode_enum},
  schema::SCHEMA,
};

/// A ledger mirror backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteMirror {
  conn: tokio_rusqlite::Connection,
}

impl SqliteMirror {
  /// Open (or create) a mirror at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let mirror = Self { conn };
    mirror.init_schema().await?;
    Ok(mirror)
  }

  /// Open an in-memory mirror, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let mirror = Self { conn };
    mirror.init_schema().await?;
    Ok(mirror)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn read_farm_rows(&self) -> Result<(Vec<RawFarm>, Vec<RawPlot>)> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT farm_id, name, owner, document, document_kind, location, created_at
           FROM farms ORDER BY farm_id",
        )?;
        let farms = stmt
          .query_map([], |row| {
            Ok(RawFarm {
              farm_id:       row.get(0)?,
              name:          row.get(1)?,
              owner:         row.get(2)?,
              document:      row.get(3)?,
              document_kind: row.get(4)?,
              location:      row.get(5)?,
              created_at:    row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT farm_id, position, code, area, variety, planting_year, status,
                  latitude, longitude
           FROM plots ORDER BY farm_id, position",
        )?;
        let plots = stmt
          .query_map([], |row| {
            Ok(RawPlot {
              farm_id:       row.get(0)?,
              position:      row.get(1)?,
              code:          row.get(2)?,
              area:          row.get(3)?,
              variety:       row.get(4)?,
              planting_year: row.get(5)?,
              status:        row.get(6)?,
              latitude:      row.get(7)?,
              longitude:     row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((farms, plots))
      })
      .await?;
    Ok(rows)
  }

  async fn read_harvest_rows(&self) -> Result<(Vec<RawHarvest>, Vec<RawLoss>)> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT harvest_id, farm_id, farm_name, plot_code, harvest_date, registered_at,
                  method, harvested_area, variety, quantity, productivity,
                  total_loss_pct, lost_quantity, severity
           FROM harvests ORDER BY harvest_id",
        )?;
        let harvests = stmt
          .query_map([], |row| {
            Ok(RawHarvest {
              harvest_id:     row.get(0)?,
              farm_id:        row.get(1)?,
              farm_name:      row.get(2)?,
              plot_code:      row.get(3)?,
              harvest_date:   row.get(4)?,
              registered_at:  row.get(5)?,
              method:         row.get(6)?,
              harvested_area: row.get(7)?,
              variety:        row.get(8)?,
              quantity:       row.get(9)?,
              productivity:   row.get(10)?,
              total_loss_pct: row.get(11)?,
              lost_quantity:  row.get(12)?,
              severity:       row.get(13)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT harvest_id, position, category, pct
           FROM harvest_losses ORDER BY harvest_id, position",
        )?;
        let losses = stmt
          .query_map([], |row| {
            Ok(RawLoss {
              harvest_id: row.get(0)?,
              position:   row.get(1)?,
              category:   row.get(2)?,
              pct:        row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((harvests, losses))
      })
      .await?;
    Ok(rows)
  }
}

// ─── Mirror impl ─────────────────────────────────────────────────────────────

impl Mirror for SqliteMirror {
  type Error = Error;

  fn is_available(&self) -> bool { true }

  async fn replace_all<'a>(
    &'a self,
    farms: &'a [Farm],
    harvests: &'a [HarvestRecord],
  ) -> Result<MirrorReport> {
    let raw_farms: Vec<RawFarm> = farms.iter().map(RawFarm::from_farm).collect();
    let raw_plots: Vec<RawPlot> = farms
      .iter()
      .flat_map(|f| {
        f.plots()
          .iter()
          .enumerate()
          .map(|(i, p)| RawPlot::from_plot(f.id, i, p))
      })
      .collect();
    let raw_harvests: Vec<RawHarvest> = harvests.iter().map(RawHarvest::from_record).collect();
    let raw_losses: Vec<RawLoss> = harvests.iter().flat_map(RawLoss::from_record).collect();

    let report = MirrorReport {
      farms:    raw_farms.len(),
      plots:    raw_plots.len(),
      harvests: raw_harvests.len(),
      losses:   raw_losses.len(),
    };

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(
          "DELETE FROM harvest_losses;
           DELETE FROM harvests;
           DELETE FROM plots;
           DELETE FROM farms;",
        )?;

        {
          let mut stmt = tx.prepare(
            "INSERT INTO farms (farm_id, name, owner, document, document_kind, location, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          )?;
          for f in &raw_farms {
            stmt.execute(rusqlite::params![
              f.farm_id,
              f.name,
              f.owner,
              f.document,
              f.document_kind,
              f.location,
              f.created_at,
            ])?;
          }

          let mut stmt = tx.prepare(
            "INSERT INTO plots (farm_id, position, code, area, variety, planting_year, status,
                                latitude, longitude)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          )?;
          for p in &raw_plots {
            stmt.execute(rusqlite::params![
              p.farm_id,
              p.position,
              p.code,
              p.area,
              p.variety,
              p.planting_year,
              p.status,
              p.latitude,
              p.longitude,
            ])?;
          }

          let mut stmt = tx.prepare(
            "INSERT INTO harvests (
               harvest_id, farm_id, farm_name, plot_code, harvest_date, registered_at,
               method, harvested_area, variety, quantity, productivity,
               total_loss_pct, lost_quantity, severity
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
          )?;
          for h in &raw_harvests {
            stmt.execute(rusqlite::params![
              h.harvest_id,
              h.farm_id,
              h.farm_name,
              h.plot_code,
              h.harvest_date,
              h.registered_at,
              h.method,
              h.harvested_area,
              h.variety,
              h.quantity,
              h.productivity,
              h.total_loss_pct,
              h.lost_quantity,
              h.severity,
            ])?;
          }

          let mut stmt = tx.prepare(
            "INSERT INTO harvest_losses (harvest_id, position, category, pct)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for l in &raw_losses {
            stmt.execute(rusqlite::params![l.harvest_id, l.position, l.category, l.pct])?;
          }
        }

        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(
      farms = report.farms,
      plots = report.plots,
      harvests = report.harvests,
      "mirror replaced"
    );
    Ok(report)
  }

  async fn load_farms(&self) -> Result<Vec<Farm>> {
    let (raw_farms, raw_plots) = self.read_farm_rows().await?;

    let mut plots_by_farm: BTreeMap<u32, Vec<Plot>> = BTreeMap::new();
    for raw in raw_plots {
      let farm_id = raw.farm_id;
      plots_by_farm.entry(farm_id).or_default().push(raw.into_plot()?);
    }

    let farms = raw_farms
      .into_iter()
      .map(|raw| {
        let plots = plots_by_farm.remove(&raw.farm_id).unwrap_or_default();
        raw.into_farm(plots)
      })
      .collect::<Result<Vec<_>>>()?;
    tracing::debug!(count = farms.len(), "loaded farms from mirror");
    Ok(farms)
  }

  async fn load_harvests(&self) -> Result<Vec<HarvestRecord>> {
    let (raw_harvests, raw_losses) = self.read_harvest_rows().await?;

    let mut summaries: BTreeMap<u32, Vec<(LossCategory, f64)>> = BTreeMap::new();
    for raw in raw_losses {
      let category = decode_enum("category", &raw.category)?;
      summaries.entry(raw.harvest_id).or_default().push((category, raw.pct));
    }

    let harvests = raw_harvests
      .into_iter()
      .map(|raw| {
        let summary = summaries.remove(&raw.harvest_id).unwrap_or_default();
        raw.into_record(summary)
      })
      .collect::<Result<Vec<_>>>()?;

    if let Some(orphan) = summaries.keys().next() {
      return Err(Error::OrphanLoss(*orphan));
    }
    tracing::debug!(count = harvests.len(), "loaded harvests from mirror");
    Ok(harvests)
  }
}
