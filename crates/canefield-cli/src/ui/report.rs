//! Analytics reports: dashboard, method comparison, variety productivity,
//! critical plots, and the full report that combines them.

use std::{collections::BTreeMap, fmt::Write as _};

use canefield_core::{
  analytics::{
    self, MethodComparison, PerformanceRow, PlotLoss, SummaryStatistics, VarietyReport,
  },
  ledger::Ledger,
  reference::Severity,
};

use super::{field, heading, rule};

pub fn dashboard(summary: &SummaryStatistics, distribution: &BTreeMap<Severity, usize>) -> String {
  let mut out = String::new();
  heading(&mut out, "Dashboard");
  if summary.count == 0 {
    out.push_str("  No harvests recorded.\n");
    return out;
  }
  field(&mut out, "Harvests", summary.count);
  field(&mut out, "Harvested area", format!("{:.2} ha", summary.total_area));
  field(&mut out, "Total quantity", format!("{:.2} t", summary.total_quantity));
  field(&mut out, "Estimated lost", format!("{:.2} t", summary.total_lost));
  field(&mut out, "Mean productivity", format!("{:.2} t/ha", summary.mean_productivity));
  field(&mut out, "Mean loss", format!("{:.2}%", summary.mean_loss_pct));

  out.push_str("\n  By method\n");
  for (method, b) in &summary.by_method {
    let _ = writeln!(
      out,
      "    {:<10} {:>3} harvests {:>10.2} t {:>8.2} t/ha {:>6.2}%",
      method.to_string(),
      b.count,
      b.total_quantity,
      b.mean_productivity,
      b.mean_loss_pct
    );
  }

  out.push_str("\n  Severity distribution\n");
  for (severity, count) in distribution {
    let share = *count as f64 / summary.count as f64 * 100.0;
    let _ = writeln!(out, "    {:<10} {:>3}  {:>5.1}%", severity.to_string(), count, share);
  }
  out
}

pub fn methods(comparison: &MethodComparison) -> String {
  let mut out = String::new();
  heading(&mut out, "Harvest method comparison");
  for (method, group) in &comparison.groups {
    let _ = writeln!(
      out,
      "  {:<10} {:>3} harvests  mean loss {:>6.2}%",
      method.to_string(),
      group.count,
      group.mean_loss_pct
    );
  }
  rule(&mut out);
  let _ = writeln!(
    out,
    "  Mechanical minus manual: {:+.2} percentage points",
    comparison.difference
  );
  out
}

pub fn varieties(reports: &[VarietyReport]) -> String {
  let mut out = String::new();
  heading(&mut out, "Productivity by variety");
  if reports.is_empty() {
    out.push_str("  No harvests recorded.\n");
    return out;
  }
  let _ = writeln!(
    out,
    "  {:<10} {:>3} {:>9} {:>9} {:>9} {:>9} {:>8}",
    "Variety", "N", "t/ha", "Loss %", "Expected", "Diff", "% exp."
  );
  for r in reports {
    let (expected, difference, pct) = match r.expected {
      Some(e) => (
        format!("{:.2}", e.expected_productivity),
        format!("{:+.2}", e.difference),
        format!("{:.1}%", e.pct_of_expected),
      ),
      None => ("n/a".into(), "n/a".into(), "n/a".into()),
    };
    let _ = writeln!(
      out,
      "  {:<10} {:>3} {:>9.2} {:>9.2} {:>9} {:>9} {:>8}",
      r.variety.to_string(),
      r.record_count,
      r.mean_productivity,
      r.mean_loss_pct,
      expected,
      difference,
      pct
    );
  }
  out
}

pub fn critical(plots: &[PlotLoss]) -> String {
  let mut out = String::new();
  heading(&mut out, "Critical plots");
  if plots.is_empty() {
    out.push_str("  No harvests recorded.\n");
    return out;
  }
  for (rank, p) in plots.iter().enumerate() {
    let _ = writeln!(
      out,
      "  {:>2}. {:<24} {:<6} mean loss {:>6.2}%  ({} harvests)",
      rank + 1,
      p.farm_name,
      p.plot_code,
      p.mean_loss_pct,
      p.record_count
    );
  }
  out
}

pub fn performance(rows: &[PerformanceRow]) -> String {
  let mut out = String::new();
  heading(&mut out, "Performance by harvest");
  for r in rows {
    let _ = writeln!(
      out,
      "  #{:<4} {:<24} {:<6} {:<10} {:>8.2} t/ha {:>6.2}%  {}",
      r.id,
      r.farm_name,
      r.plot_code,
      r.method.to_string(),
      r.productivity,
      r.total_loss_pct,
      r.severity
    );
  }
  out
}

/// Every report section, in reading order.
pub fn full(ledger: &Ledger, top_n: usize) -> String {
  let harvests = ledger.harvests();
  let mut out = dashboard(
    &analytics::summary_statistics(harvests),
    &analytics::severity_distribution(harvests),
  );
  for section in [
    methods(&analytics::compare_methods(harvests)),
    varieties(&analytics::productivity_by_variety(harvests, ledger.reference())),
    critical(&analytics::critical_plots(harvests, top_n)),
    performance(&analytics::performance_table(harvests)),
  ] {
    out.push('\n');
    out.push_str(&section);
  }
  out
}

#[cfg(test)]
mod tests {
  use canefield_core::reference::ReferenceData;

  use super::*;
  use crate::seed;

  #[test]
  fn empty_dashboard() {
    let text = dashboard(&analytics::summary_statistics(&[]), &BTreeMap::new());
    assert!(text.contains("No harvests recorded."));
  }

  #[test]
  fn variety_without_baseline_shows_not_applicable() {
    let mut reference = ReferenceData::default();
    reference.expected_productivity.clear();
    let ledger = seed::sample_ledger(reference).unwrap();
    let text = varieties(&analytics::productivity_by_variety(ledger.harvests(), ledger.reference()));
    assert!(text.contains("n/a"));
  }

  #[test]
  fn full_report_has_every_section() {
    let ledger = seed::sample_ledger(ReferenceData::default()).unwrap();
    let text = full(&ledger, 3);
    for title in [
      "Dashboard",
      "Harvest method comparison",
      "Productivity by variety",
      "Critical plots",
      "Performance by harvest",
    ] {
      assert!(text.contains(title), "missing {title}");
    }
    assert!(text.contains("+10.50"));
  }
}
