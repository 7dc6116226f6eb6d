//! Integration tests for `SqliteMirror` against an in-memory database.

use chrono::{NaiveDate, TimeZone, Utc};

use canefield_core::{
  farm::{Farm, NewFarm, Plot, PlotStatus},
  harvest::{HarvestInput, HarvestRecord},
  ledger::Ledger,
  mirror::{Mirror, NoMirror},
  reference::{LossCategory, ReferenceData},
};

use crate::SqliteMirror;

async fn mirror() -> SqliteMirror {
  SqliteMirror::open_in_memory()
    .await
    .expect("in-memory mirror")
}

fn sample() -> (Vec<Farm>, Vec<HarvestRecord>) {
  let mut ledger = Ledger::new(ReferenceData::default());
  let limits = ledger.reference().limits.clone();
  let now = Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap();
  let registry = ledger.registry_mut();
  registry
    .register_farm(
      NewFarm {
        name:     "Fazenda Santa Rita".into(),
        owner:    "Joao Silva".into(),
        document: "529.982.247-25".into(),
        location: "Ribeirao Preto - SP".into(),
      },
      now,
    )
    .unwrap();
  registry
    .register_farm(
      NewFarm {
        name:     "Usina Verde".into(),
        owner:    "Usina Verde S.A.".into(),
        document: "11.222.333/0001-81".into(),
        location: "Piracicaba - SP".into(),
      },
      now,
    )
    .unwrap();
  for (farm_id, code, area, variety) in [
    (1, "T02", 12.0, "CTC4"),
    (1, "T01", 15.5, "RB867515"),
    (2, "U01", 25.0, "SP813250"),
  ] {
    let plot = Plot::new(code, area, variety, 2020, &limits, 2024).unwrap();
    registry.add_plot(farm_id, plot).unwrap();
  }
  registry.set_plot_status(1, "T02", PlotStatus::Inactive).unwrap();

  for (farm_id, code, losses) in [
    (1, "T01", vec![("residue", 1.8), ("mechanical", 12.0), ("root_damage", 1.8)]),
    (2, "U01", vec![("mechanical", 4.2)]),
  ] {
    let input = HarvestInput {
      farm_id,
      plot_code: code.into(),
      date: "2024-09-15".into(),
      method: "manual".into(),
      quantity: 1240.0,
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
  ledger.into_parts()
}

#[tokio::test]
async fn empty_mirror_loads_nothing() {
  let m = mirror().await;
  assert!(m.is_available());
  assert!(m.load_farms().await.unwrap().is_empty());
  assert!(m.load_harvests().await.unwrap().is_empty());
}

#[tokio::test]
async fn replace_all_reports_row_counts() {
  let m = mirror().await;
  let (farms, harvests) = sample();
  let report = m.replace_all(&farms, &harvests).await.unwrap();
  assert_eq!(report.farms, 2);
  assert_eq!(report.plots, 3);
  assert_eq!(report.harvests, 2);
  assert_eq!(report.losses, 4);
}

#[tokio::test]
async fn farms_round_trip_with_plot_order_and_status() {
  let m = mirror().await;
  let (farms, harvests) = sample();
  m.replace_all(&farms, &harvests).await.unwrap();

  let loaded = m.load_farms().await.unwrap();
  assert_eq!(loaded, farms);
  let codes: Vec<&str> = loaded[0].plots().iter().map(|p| p.code.as_str()).collect();
  assert_eq!(codes, vec!["T02", "T01"]);
  assert_eq!(loaded[0].plots()[0].status, PlotStatus::Inactive);
  assert_eq!(loaded[0].total_area(), 27.5);
}

#[tokio::test]
async fn harvests_round_trip_with_summary_order() {
  let m = mirror().await;
  let (farms, harvests) = sample();
  m.replace_all(&farms, &harvests).await.unwrap();

  let loaded = m.load_harvests().await.unwrap();
  assert_eq!(loaded, harvests);
  let order: Vec<LossCategory> = loaded[0].loss_summary.iter().map(|(c, _)| *c).collect();
  assert_eq!(order, vec![
    LossCategory::Mechanical,
    LossCategory::Residue,
    LossCategory::RootDamage,
  ]);
}

#[tokio::test]
async fn replace_all_overwrites_previous_contents() {
  let m = mirror().await;
  let (farms, harvests) = sample();
  m.replace_all(&farms, &harvests).await.unwrap();
  m.replace_all(&farms[..1], &[]).await.unwrap();

  assert_eq!(m.load_farms().await.unwrap().len(), 1);
  assert!(m.load_harvests().await.unwrap().is_empty());
}

#[tokio::test]
async fn no_mirror_is_inert() {
  let (farms, harvests) = sample();
  let m = NoMirror;
  assert!(!m.is_available());
  assert_eq!(m.replace_all(&farms, &harvests).await.unwrap().farms, 0);
  assert!(m.load_farms().await.unwrap().is_empty());
}
