//! Read-only aggregations over the harvest collection.
//!
//! Nothing here mutates state. Empty inputs produce zeroed results rather
//! than dividing by zero.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::{
  farm::Farm,
  harvest::HarvestRecord,
  reference::{HarvestMethod, ReferenceData, Severity, Variety},
};

fn mean(sum: f64, count: usize) -> f64 {
  if count == 0 { 0.0 } else { sum / count as f64 }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
  if denominator > 0.0 { numerator / denominator } else { 0.0 }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MethodBreakdown {
  pub count:             usize,
  pub total_quantity:    f64,
  pub total_area:        f64,
  pub mean_productivity: f64,
  pub mean_loss_pct:     f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStatistics {
  pub count:             usize,
  pub total_area:        f64,
  pub total_quantity:    f64,
  pub total_lost:        f64,
  /// Total quantity over total area.
  pub mean_productivity: f64,
  /// Arithmetic mean of the per-record total loss.
  pub mean_loss_pct:     f64,
  /// Every method is present; methods with no records are zeroed.
  pub by_method:         BTreeMap<HarvestMethod, MethodBreakdown>,
}

pub fn summary_statistics(harvests: &[HarvestRecord]) -> SummaryStatistics {
  let mut by_method: BTreeMap<HarvestMethod, MethodBreakdown> = HarvestMethod::iter()
    .map(|m| (m, MethodBreakdown::default()))
    .collect();
  let mut loss_sums: BTreeMap<HarvestMethod, f64> = BTreeMap::new();

  let mut summary = SummaryStatistics::default();
  let mut loss_sum = 0.0;
  for h in harvests {
    summary.count += 1;
    summary.total_area += h.harvested_area;
    summary.total_quantity += h.quantity;
    summary.total_lost += h.lost_quantity;
    loss_sum += h.total_loss_pct;

    let entry = by_method.entry(h.method).or_default();
    entry.count += 1;
    entry.total_quantity += h.quantity;
    entry.total_area += h.harvested_area;
    *loss_sums.entry(h.method).or_default() += h.total_loss_pct;
  }

  for (method, entry) in &mut by_method {
    entry.mean_productivity = ratio(entry.total_quantity, entry.total_area);
    entry.mean_loss_pct = mean(loss_sums.get(method).copied().unwrap_or(0.0), entry.count);
  }

  summary.mean_productivity = ratio(summary.total_quantity, summary.total_area);
  summary.mean_loss_pct = mean(loss_sum, summary.count);
  summary.by_method = by_method;
  summary
}

// ─── Method comparison ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MethodLoss {
  pub count:         usize,
  pub mean_loss_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodComparison {
  /// One entry per method, including methods with no records.
  pub groups:     BTreeMap<HarvestMethod, MethodLoss>,
  /// Mean loss of mechanical minus mean loss of manual harvests.
  pub difference: f64,
}

impl MethodComparison {
  pub fn get(&self, method: HarvestMethod) -> MethodLoss {
    self.groups.get(&method).copied().unwrap_or_default()
  }
}

pub fn compare_methods(harvests: &[HarvestRecord]) -> MethodComparison {
  let groups = HarvestMethod::iter()
    .map(|method| {
      let (count, sum) = harvests
        .iter()
        .filter(|h| h.method == method)
        .fold((0, 0.0), |(n, s), h| (n + 1, s + h.total_loss_pct));
      (method, MethodLoss { count, mean_loss_pct: mean(sum, count) })
    })
    .collect::<BTreeMap<_, _>>();

  let difference = groups[&HarvestMethod::Mechanical].mean_loss_pct
    - groups[&HarvestMethod::Manual].mean_loss_pct;
  MethodComparison { groups, difference }
}

// ─── Variety productivity ────────────────────────────────────────────────────

/// Comparison against the reference table. Absent when the variety has no
/// baseline, which is distinct from reaching 0% of one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpectedComparison {
  pub expected_productivity: f64,
  /// Mean productivity minus expected, t/ha.
  pub difference:            f64,
  pub pct_of_expected:       f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarietyReport {
  pub variety:           Variety,
  pub record_count:      usize,
  pub total_area:        f64,
  pub total_quantity:    f64,
  pub mean_productivity: f64,
  pub mean_loss_pct:     f64,
  pub expected:          Option<ExpectedComparison>,
}

/// Per-variety productivity, in order of each variety's first record.
pub fn productivity_by_variety(
  harvests: &[HarvestRecord],
  reference: &ReferenceData,
) -> Vec<VarietyReport> {
  let mut reports: Vec<VarietyReport> = Vec::new();
  let mut loss_sums: Vec<f64> = Vec::new();
  let mut index: HashMap<Variety, usize> = HashMap::new();

  for h in harvests {
    let idx = *index.entry(h.variety).or_insert_with(|| {
      reports.push(VarietyReport {
        variety:           h.variety,
        record_count:      0,
        total_area:        0.0,
        total_quantity:    0.0,
        mean_productivity: 0.0,
        mean_loss_pct:     0.0,
        expected:          None,
      });
      loss_sums.push(0.0);
      reports.len() - 1
    });
    let r = &mut reports[idx];
    r.record_count += 1;
    r.total_area += h.harvested_area;
    r.total_quantity += h.quantity;
    loss_sums[idx] += h.total_loss_pct;
  }

  for (r, loss_sum) in reports.iter_mut().zip(loss_sums) {
    r.mean_productivity = ratio(r.total_quantity, r.total_area);
    r.mean_loss_pct = mean(loss_sum, r.record_count);
    r.expected = reference.expected_productivity(r.variety).map(|expected| {
      ExpectedComparison {
        expected_productivity: expected,
        difference:            r.mean_productivity - expected,
        pct_of_expected:       r.mean_productivity / expected * 100.0,
      }
    });
  }
  reports
}

// ─── Critical plots ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotLoss {
  pub farm_id:       u32,
  pub farm_name:     String,
  pub plot_code:     String,
  pub mean_loss_pct: f64,
  pub record_count:  usize,
}

/// Plots ranked by mean total loss, highest first. Ties keep the order in
/// which each plot first appears in `harvests`.
pub fn rank_plots_by_loss(harvests: &[HarvestRecord]) -> Vec<PlotLoss> {
  let mut groups: Vec<(PlotLoss, f64)> = Vec::new();
  let mut index: HashMap<(u32, &str), usize> = HashMap::new();
  for h in harvests {
    match index.get(&(h.farm_id, h.plot_code.as_str())) {
      Some(&idx) => {
        let (group, sum) = &mut groups[idx];
        group.record_count += 1;
        *sum += h.total_loss_pct;
      }
      None => {
        index.insert((h.farm_id, h.plot_code.as_str()), groups.len());
        groups.push((
          PlotLoss {
            farm_id:       h.farm_id,
            farm_name:     h.farm_name.clone(),
            plot_code:     h.plot_code.clone(),
            mean_loss_pct: 0.0,
            record_count:  1,
          },
          h.total_loss_pct,
        ));
      }
    }
  }

  let mut ranked: Vec<PlotLoss> = groups
    .into_iter()
    .map(|(mut g, sum)| {
      g.mean_loss_pct = mean(sum, g.record_count);
      g
    })
    .collect();
  ranked.sort_by(|a, b| b.mean_loss_pct.total_cmp(&a.mean_loss_pct));
  ranked
}

/// The `top_n` plots with the highest mean loss.
pub fn critical_plots(harvests: &[HarvestRecord], top_n: usize) -> Vec<PlotLoss> {
  let mut ranked = rank_plots_by_loss(harvests);
  ranked.truncate(top_n);
  ranked
}

// ─── Distribution and tables ─────────────────────────────────────────────────

/// Record count per severity band. Bands with no records are omitted.
pub fn severity_distribution(harvests: &[HarvestRecord]) -> BTreeMap<Severity, usize> {
  let mut counts = BTreeMap::new();
  for h in harvests {
    *counts.entry(h.severity).or_insert(0) += 1;
  }
  counts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRow {
  pub id:             u32,
  pub farm_name:      String,
  pub plot_code:      String,
  pub method:         HarvestMethod,
  pub productivity:   f64,
  pub total_loss_pct: f64,
  pub severity:       Severity,
}

/// One row per record, in registration order.
pub fn performance_table(harvests: &[HarvestRecord]) -> Vec<PerformanceRow> {
  harvests
    .iter()
    .map(|h| PerformanceRow {
      id:             h.id,
      farm_name:      h.farm_name.clone(),
      plot_code:      h.plot_code.clone(),
      method:         h.method,
      productivity:   h.productivity,
      total_loss_pct: h.total_loss_pct,
      severity:       h.severity,
    })
    .collect()
}

// ─── Farms ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FarmStatistics {
  pub farm_count:          usize,
  pub plot_count:          usize,
  pub total_area:          f64,
  pub mean_area_per_farm:  f64,
  /// Planted hectares per variety.
  pub area_by_variety:     BTreeMap<Variety, f64>,
}

pub fn farm_statistics(farms: &[Farm]) -> FarmStatistics {
  let mut stats = FarmStatistics { farm_count: farms.len(), ..Default::default() };
  for farm in farms {
    stats.plot_count += farm.plots().len();
    stats.total_area += farm.total_area();
    for plot in farm.plots() {
      *stats.area_by_variety.entry(plot.variety).or_insert(0.0) += plot.area;
    }
  }
  stats.mean_area_per_farm = mean(stats.total_area, stats.farm_count);
  stats
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone, Utc};

  use super::*;
  use crate::{
    harvest::LossSummary,
    reference::LossCategory,
  };

  fn record(
    id: u32,
    farm_id: u32,
    plot: &str,
    method: HarvestMethod,
    variety: Variety,
    area: f64,
    quantity: f64,
    loss: f64,
  ) -> HarvestRecord {
    HarvestRecord {
      id,
      farm_id,
      farm_name: format!("Farm {farm_id}"),
      plot_code: plot.into(),
      harvest_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
      registered_at: Utc.with_ymd_and_hms(2024, 9, 2, 0, 0, 0).unwrap(),
      method,
      harvested_area: area,
      variety,
      quantity,
      productivity: quantity / area,
      losses: [(LossCategory::Mechanical, loss)].into_iter().collect(),
      total_loss_pct: loss,
      lost_quantity: quantity / (1.0 - loss / 100.0) - quantity,
      severity: ReferenceData::default().classify(loss),
      loss_summary: LossSummary::from_ordered(vec![(LossCategory::Mechanical, loss)]),
    }
  }

  #[test]
  fn empty_collection_gives_zeroed_summary() {
    let s = summary_statistics(&[]);
    assert_eq!(s.count, 0);
    assert_eq!(s.mean_productivity, 0.0);
    assert_eq!(s.mean_loss_pct, 0.0);
    assert_eq!(s.by_method.len(), 3);
    assert!(s.by_method.values().all(|b| b.count == 0 && b.mean_loss_pct == 0.0));
  }

  #[test]
  fn summary_uses_total_quantity_over_total_area() {
    let hs = vec![
      record(1, 1, "T01", HarvestMethod::Manual, Variety::Ctc4, 10.0, 1000.0, 4.0),
      record(2, 1, "T02", HarvestMethod::Mechanical, Variety::Ctc4, 30.0, 1500.0, 12.0),
    ];
    let s = summary_statistics(&hs);
    assert_eq!(s.count, 2);
    assert_eq!(s.total_area, 40.0);
    assert_eq!(s.total_quantity, 2500.0);
    assert_eq!(s.mean_productivity, 62.5);
    assert_eq!(s.mean_loss_pct, 8.0);
    assert_eq!(s.by_method[&HarvestMethod::Mechanical].count, 1);
    assert_eq!(s.by_method[&HarvestMethod::Mechanical].mean_productivity, 50.0);
    assert_eq!(s.by_method[&HarvestMethod::Mixed].count, 0);
  }

  #[test]
  fn compare_methods_without_mechanical_records() {
    let hs = vec![
      record(1, 1, "T01", HarvestMethod::Manual, Variety::Ctc4, 10.0, 1000.0, 4.0),
      record(2, 1, "T01", HarvestMethod::Manual, Variety::Ctc4, 10.0, 1000.0, 6.0),
    ];
    let c = compare_methods(&hs);
    assert_eq!(c.get(HarvestMethod::Mechanical), MethodLoss { count: 0, mean_loss_pct: 0.0 });
    assert_eq!(c.get(HarvestMethod::Manual), MethodLoss { count: 2, mean_loss_pct: 5.0 });
    assert_eq!(c.difference, -5.0);
    assert!(c.groups.contains_key(&HarvestMethod::Mechanical));
  }

  #[test]
  fn variety_without_baseline_is_not_applicable() {
    let mut reference = ReferenceData::default();
    reference.expected_productivity.remove(&Variety::Sp813250);
    let hs = vec![
      record(1, 1, "T01", HarvestMethod::Manual, Variety::Sp813250, 10.0, 800.0, 2.0),
      record(2, 1, "T02", HarvestMethod::Manual, Variety::Ctc4, 10.0, 950.0, 2.0),
      record(3, 1, "T01", HarvestMethod::Manual, Variety::Sp813250, 10.0, 600.0, 4.0),
    ];
    let reports = productivity_by_variety(&hs, &reference);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].variety, Variety::Sp813250);
    assert_eq!(reports[0].record_count, 2);
    assert_eq!(reports[0].mean_productivity, 70.0);
    assert_eq!(reports[0].mean_loss_pct, 3.0);
    assert!(reports[0].expected.is_none());

    let ctc4 = reports[1].expected.unwrap();
    assert_eq!(ctc4.expected_productivity, 95.0);
    assert_eq!(ctc4.pct_of_expected, 100.0);
    assert_eq!(ctc4.difference, 0.0);
  }

  #[test]
  fn critical_plots_tie_break_by_first_appearance() {
    let hs = vec![
      record(1, 1, "A", HarvestMethod::Mechanical, Variety::Ctc4, 10.0, 1000.0, 20.0),
      record(2, 1, "B", HarvestMethod::Manual, Variety::Ctc4, 10.0, 1000.0, 5.0),
      record(3, 2, "C", HarvestMethod::Mechanical, Variety::Ctc4, 10.0, 1000.0, 20.0),
    ];
    let top: Vec<String> = critical_plots(&hs, 3).into_iter().map(|p| p.plot_code).collect();
    assert_eq!(top, vec!["A", "C", "B"]);
    assert_eq!(critical_plots(&hs, 1).len(), 1);
  }

  #[test]
  fn plots_are_grouped_by_farm_and_code() {
    let hs = vec![
      record(1, 1, "T01", HarvestMethod::Manual, Variety::Ctc4, 10.0, 1000.0, 2.0),
      record(2, 2, "T01", HarvestMethod::Manual, Variety::Ctc4, 10.0, 1000.0, 8.0),
      record(3, 1, "T01", HarvestMethod::Manual, Variety::Ctc4, 10.0, 1000.0, 6.0),
    ];
    let ranked = rank_plots_by_loss(&hs);
    assert_eq!(ranked.len(), 2);
    assert_eq!((ranked[0].farm_id, ranked[0].mean_loss_pct), (2, 8.0));
    assert_eq!((ranked[1].farm_id, ranked[1].record_count), (1, 2));
    assert_eq!(ranked[1].mean_loss_pct, 4.0);
  }

  #[test]
  fn interleaved_records_fold_into_first_appearance_groups() {
    let varieties = [Variety::Ctc20, Variety::Rb867515, Variety::Ctc4];
    let hs: Vec<HarvestRecord> = (0..300u32)
      .map(|i| {
        let plot = format!("P{:02}", i % 7);
        let variety = varieties[(i % 3) as usize];
        record(i + 1, 1 + i % 2, &plot, HarvestMethod::Manual, variety, 10.0, 1000.0, 2.0)
      })
      .collect();

    let reports = productivity_by_variety(&hs, &ReferenceData::default());
    let order: Vec<Variety> = reports.iter().map(|r| r.variety).collect();
    assert_eq!(order, varieties.to_vec());
    assert!(reports.iter().all(|r| r.record_count == 100));

    let ranked = rank_plots_by_loss(&hs);
    assert_eq!(ranked.len(), 14);
    assert_eq!(ranked.iter().map(|p| p.record_count).sum::<usize>(), 300);
    assert_eq!((ranked[0].farm_id, ranked[0].plot_code.as_str()), (1, "P00"));
    assert_eq!((ranked[1].farm_id, ranked[1].plot_code.as_str()), (2, "P01"));
  }

  #[test]
  fn severity_distribution_counts_bands() {
    let hs = vec![
      record(1, 1, "T01", HarvestMethod::Manual, Variety::Ctc4, 10.0, 1000.0, 2.0),
      record(2, 1, "T01", HarvestMethod::Manual, Variety::Ctc4, 10.0, 1000.0, 3.0),
      record(3, 1, "T01", HarvestMethod::Manual, Variety::Ctc4, 10.0, 1000.0, 16.0),
    ];
    let d = severity_distribution(&hs);
    assert_eq!(d[&Severity::Low], 2);
    assert_eq!(d[&Severity::Critical], 1);
    assert!(!d.contains_key(&Severity::Medium));
    assert_eq!(performance_table(&hs).len(), 3);
  }
}
