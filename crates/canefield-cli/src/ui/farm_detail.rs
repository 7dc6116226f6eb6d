//! Farm, plot and farm-statistics views.

use std::fmt::Write as _;

use canefield_core::{
  analytics::FarmStatistics,
  farm::{Farm, Plot},
  harvest::HarvestRecord,
};

use super::{field, heading, local_time, rule};

/// One line per farm.
pub fn farm_list(farms: &[Farm]) -> String {
  if farms.is_empty() {
    return "No farms registered.\n".into();
  }
  let mut out = String::new();
  let _ = writeln!(
    out,
    "{:>4}  {:<28} {:<22} {:>6} {:>10}",
    "ID", "Name", "Owner", "Plots", "Area (ha)"
  );
  rule(&mut out);
  for f in farms {
    let _ = writeln!(
      out,
      "{:>4}  {:<28} {:<22} {:>6} {:>10.2}",
      f.id,
      f.name,
      f.owner,
      f.plots().len(),
      f.total_area()
    );
  }
  out
}

/// Full farm record with its plots and harvest count.
pub fn farm(farm: &Farm, harvests: &[&HarvestRecord]) -> String {
  let mut out = String::new();
  heading(&mut out, &farm.name);
  field(&mut out, "ID", farm.id);
  field(&mut out, "Owner", &farm.owner);
  field(&mut out, farm.document_kind.label(), &farm.document);
  field(&mut out, "Location", &farm.location);
  field(&mut out, "Registered", local_time(farm.created_at));
  field(&mut out, "Total area", format!("{:.2} ha", farm.total_area()));
  field(&mut out, "Harvests", harvests.len());
  out.push('\n');

  if farm.plots().is_empty() {
    out.push_str("  No plots registered.\n");
    return out;
  }
  let _ = writeln!(
    out,
    "  {:<8} {:>10} {:<10} {:>6} {:>5} {:<8}",
    "Plot", "Area (ha)", "Variety", "Year", "Age", "Status"
  );
  for p in farm.plots() {
    let _ = writeln!(
      out,
      "  {:<8} {:>10.2} {:<10} {:>6} {:>5} {:<8}",
      p.code,
      p.area,
      p.variety.to_string(),
      p.planting_year,
      p.age(),
      p.status.to_string()
    );
  }
  out
}

/// One plot with the harvests recorded against it.
pub fn plot(farm: &Farm, plot: &Plot, harvests: &[&HarvestRecord]) -> String {
  let mut out = String::new();
  heading(&mut out, &format!("{} / {}", farm.name, plot.code));
  field(&mut out, "Area", format!("{:.2} ha", plot.area));
  field(&mut out, "Variety", plot.variety);
  field(&mut out, "Planting year", plot.planting_year);
  field(&mut out, "Age", format!("{} years", plot.age()));
  field(&mut out, "Status", plot.status);
  field(
    &mut out,
    "Coordinates",
    format!("{:.5}, {:.5}", plot.coordinates.0, plot.coordinates.1),
  );
  out.push('\n');
  if harvests.is_empty() {
    out.push_str("  No harvests recorded.\n");
  } else {
    for h in harvests {
      let _ = writeln!(
        out,
        "  #{:<4} {}  {:<10} {:>9.2} t  loss {:>5.2}%  {}",
        h.id,
        h.harvest_date.format("%d/%m/%Y"),
        h.method.to_string(),
        h.quantity,
        h.total_loss_pct,
        h.severity
      );
    }
  }
  out
}

pub fn farm_statistics(stats: &FarmStatistics) -> String {
  let mut out = String::new();
  heading(&mut out, "Farm statistics");
  field(&mut out, "Farms", stats.farm_count);
  field(&mut out, "Plots", stats.plot_count);
  field(&mut out, "Total area", format!("{:.2} ha", stats.total_area));
  field(&mut out, "Mean area per farm", format!("{:.2} ha", stats.mean_area_per_farm));
  if !stats.area_by_variety.is_empty() {
    out.push_str("\n  Area by variety\n");
    for (variety, area) in &stats.area_by_variety {
      let share = if stats.total_area > 0.0 { area / stats.total_area * 100.0 } else { 0.0 };
      let _ = writeln!(out, "    {:<10} {:>10.2} ha  {:>5.1}%", variety.to_string(), area, share);
    }
  }
  out
}
