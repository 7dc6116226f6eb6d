//! Harvest record views and advisories.

use std::fmt::Write as _;

use canefield_core::{harvest::HarvestRecord, recommend::{Advisory, Priority}};

use super::{field, heading, local_time, rule};

pub fn harvest_list(harvests: &[&HarvestRecord]) -> String {
  if harvests.is_empty() {
    return "No harvests recorded.\n".into();
  }
  let mut out = String::new();
  let _ = writeln!(
    out,
    "{:>4}  {:<10} {:<24} {:<6} {:<10} {:>9} {:>7} {:<8}",
    "ID", "Date", "Farm", "Plot", "Method", "Qty (t)", "Loss %", "Severity"
  );
  rule(&mut out);
  for h in harvests {
    let _ = writeln!(
      out,
      "{:>4}  {:<10} {:<24} {:<6} {:<10} {:>9.2} {:>7.2} {:<8}",
      h.id,
      h.harvest_date.format("%d/%m/%Y").to_string(),
      h.farm_name,
      h.plot_code,
      h.method.to_string(),
      h.quantity,
      h.total_loss_pct,
      h.severity.to_string()
    );
  }
  out
}

/// The full record, loss breakdown included.
pub fn harvest(h: &HarvestRecord) -> String {
  let mut out = String::new();
  heading(&mut out, &format!("Harvest #{}", h.id));
  field(&mut out, "Farm", format!("{} (#{})", h.farm_name, h.farm_id));
  field(&mut out, "Plot", &h.plot_code);
  field(&mut out, "Variety", h.variety);
  field(&mut out, "Harvest date", h.harvest_date.format("%d/%m/%Y"));
  field(&mut out, "Registered", local_time(h.registered_at));
  field(&mut out, "Method", h.method);
  field(&mut out, "Harvested area", format!("{:.2} ha", h.harvested_area));
  field(&mut out, "Quantity", format!("{:.2} t", h.quantity));
  field(&mut out, "Productivity", format!("{:.2} t/ha", h.productivity));
  field(&mut out, "Total loss", format!("{:.2}%", h.total_loss_pct));
  field(&mut out, "Lost quantity", format!("{:.2} t", h.lost_quantity));
  field(&mut out, "Severity", h.severity);

  if !h.loss_summary.is_empty() {
    out.push_str("\n  Losses by category\n");
    for (category, pct) in h.loss_summary.iter() {
      let _ = writeln!(out, "    {:<12} {:>6.2}%", category.to_string(), pct);
    }
  }
  out
}

pub fn advisories(h: &HarvestRecord, advisories: &[Advisory]) -> String {
  let mut out = String::new();
  heading(&mut out, &format!("Recommendations for harvest #{}", h.id));
  field(&mut out, "Plot", format!("{} / {}", h.farm_name, h.plot_code));
  field(&mut out, "Total loss", format!("{:.2}% ({})", h.total_loss_pct, h.severity));
  out.push('\n');
  for a in advisories {
    let marker = match a.priority {
      Priority::Urgent => "!!",
      Priority::Warning => " !",
      Priority::Info => " -",
    };
    let _ = writeln!(out, "  {marker} {a}");
  }
  out
}
