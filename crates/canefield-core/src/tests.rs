//! End-to-end scenarios over a small seeded ledger.

use chrono::{NaiveDate, TimeZone, Utc};

use crate::{
  analytics,
  farm::{NewFarm, Plot},
  harvest::HarvestInput,
  ledger::Ledger,
  recommend::{Priority, recommend},
  reference::{HarvestMethod, LossCategory, ReferenceData, Severity, Variety},
};

fn approx(a: f64, b: f64) -> bool { (a - b).abs() < 1e-9 }

fn farm(name: &str, document: &str) -> NewFarm {
  NewFarm {
    name:     name.into(),
    owner:    "Owner".into(),
    document: document.into(),
    location: "SP".into(),
  }
}

fn seeded() -> Ledger {
  let mut ledger = Ledger::new(ReferenceData::default());
  let now = Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap();
  let limits = ledger.reference().limits.clone();
  let plots: [(u32, &str, f64, &str, i32); 5] = [
    (1, "T01", 15.5, "RB867515", 2020),
    (1, "T02", 12.0, "CTC4", 2021),
    (2, "A01", 20.0, "RB966928", 2019),
    (2, "A02", 18.5, "CTC20", 2020),
    (3, "U01", 25.0, "SP813250", 2018),
  ];

  let registry = ledger.registry_mut();
  registry.register_farm(farm("Fazenda Santa Rita", "529.982.247-25"), now).unwrap();
  registry.register_farm(farm("Fazenda Agro Paulista", "111.444.777-35"), now).unwrap();
  registry.register_farm(farm("Usina Verde", "11.222.333/0001-81"), now).unwrap();
  for (farm_id, code, area, variety, year) in plots {
    let plot = Plot::new(code, area, variety, year, &limits, 2024).unwrap();
    registry.add_plot(farm_id, plot).unwrap();
  }

  let harvests: [(u32, &str, &str, &str, f64, Vec<(&str, f64)>); 5] = [
    (1, "T01", "15/09/2024", "mechanical", 1240.0, vec![
      ("mechanical", 12.0),
      ("root_damage", 2.5),
      ("residue", 1.8),
    ]),
    (1, "T02", "18/09/2024", "manual", 1050.0, vec![("mechanical", 3.5), ("root_damage", 1.2)]),
    (2, "A01", "20/09/2024", "mechanical", 1680.0, vec![
      ("mechanical", 14.5),
      ("residue", 2.3),
      ("climatic", 1.0),
    ]),
    (2, "A02", "2024-09-22", "mechanical", 1590.0, vec![("mechanical", 11.0), ("root_damage", 2.0)]),
    (3, "U01", "25/09/2024", "manual", 1950.0, vec![("mechanical", 4.2), ("root_damage", 1.5)]),
  ];
  for (farm_id, plot_code, date, method, quantity, losses) in harvests {
    let input = HarvestInput {
      farm_id,
      plot_code: plot_code.into(),
      date: date.into(),
      method: method.into(),
      quantity,
      losses: losses.into_iter().map(|(c, p)| (c.to_owned(), p)).collect(),
    };
    let record = ledger
      .build_harvest_at(
        &input,
        NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
        Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0).unwrap(),
      )
      .unwrap();
    ledger.append_harvest(record).unwrap();
  }
  ledger
}

#[test]
fn seeded_records_are_derived_and_classified() {
  let ledger = seeded();
  let first = ledger.harvest_by_id(1).unwrap();
  assert_eq!(first.productivity, 80.0);
  assert_eq!(first.total_loss_pct, 16.3);
  assert_eq!(first.lost_quantity, 241.48);
  assert_eq!(first.severity, Severity::Critical);
  assert_eq!(first.loss_summary.as_slice()[0], (LossCategory::Mechanical, 12.0));

  let severities: Vec<Severity> = ledger.harvests().iter().map(|h| h.severity).collect();
  assert_eq!(severities, vec![
    Severity::Critical,
    Severity::Low,
    Severity::Critical,
    Severity::High,
    Severity::Medium,
  ]);
  assert_eq!(ledger.registry().find_farm_by_id(1).unwrap().total_area(), 27.5);
}

#[test]
fn seeded_summary_and_method_comparison() {
  let ledger = seeded();
  let s = analytics::summary_statistics(ledger.harvests());
  assert_eq!(s.count, 5);
  assert!(approx(s.total_area, 91.0));
  assert!(approx(s.total_quantity, 7510.0));
  assert!(approx(s.mean_productivity, 7510.0 / 91.0));
  assert!(approx(s.mean_loss_pct, 11.5));
  assert_eq!(s.by_method[&HarvestMethod::Mixed].count, 0);

  let c = analytics::compare_methods(ledger.harvests());
  assert_eq!(c.get(HarvestMethod::Mechanical).count, 3);
  assert!(approx(c.get(HarvestMethod::Mechanical).mean_loss_pct, 15.7));
  assert!(approx(c.get(HarvestMethod::Manual).mean_loss_pct, 5.2));
  assert!(approx(c.difference, 10.5));
}

#[test]
fn seeded_variety_and_plot_rankings() {
  let ledger = seeded();
  let varieties = analytics::productivity_by_variety(ledger.harvests(), ledger.reference());
  let order: Vec<Variety> = varieties.iter().map(|v| v.variety).collect();
  assert_eq!(order, vec![
    Variety::Rb867515,
    Variety::Ctc4,
    Variety::Rb966928,
    Variety::Ctc20,
    Variety::Sp813250,
  ]);
  let rb = varieties[0].expected.unwrap();
  assert!(approx(rb.pct_of_expected, 80.0 / 85.0 * 100.0));
  assert!(approx(rb.difference, -5.0));

  let top: Vec<(u32, String)> = analytics::critical_plots(ledger.harvests(), 3)
    .into_iter()
    .map(|p| (p.farm_id, p.plot_code))
    .collect();
  assert_eq!(top, vec![(2, "A01".into()), (1, "T01".into()), (2, "A02".into())]);

  let farms = analytics::farm_statistics(ledger.registry().farms());
  assert_eq!((farms.farm_count, farms.plot_count), (3, 5));
  assert!(approx(farms.total_area, 91.0));
}

#[test]
fn seeded_recommendations() {
  let ledger = seeded();
  let critical = recommend(ledger.harvest_by_id(1).unwrap(), ledger.reference());
  assert_eq!(critical.len(), 5);
  assert_eq!(critical[0].priority, Priority::Urgent);
  assert_eq!(critical[4].text, "Compare cost-benefit between harvesting methods.");

  let excellent = recommend(ledger.harvest_by_id(2).unwrap(), ledger.reference());
  assert_eq!(excellent.len(), 1);
  assert_eq!(excellent[0].priority, Priority::Info);

  let medium = recommend(ledger.harvest_by_id(5).unwrap(), ledger.reference());
  assert_eq!(medium[0].text, "Operation within normal parameters.");
}
