//! Demonstration data for `canefield data seed`: three farms, five plots,
//! and one harvest per plot.

use anyhow::Context as _;
use chrono::{Datelike, Local, Utc};

use canefield_core::{
  farm::{NewFarm, Plot},
  harvest::HarvestInput,
  ledger::Ledger,
  reference::ReferenceData,
};

struct SeedFarm {
  name:     &'static str,
  owner:    &'static str,
  document: &'static str,
  location: &'static str,
  plots:    &'static [(&'static str, f64, &'static str, i32)],
}

const FARMS: &[SeedFarm] = &[
  SeedFarm {
    name:     "Fazenda Santa Rita",
    owner:    "Joao Silva",
    document: "529.982.247-25",
    location: "Ribeirao Preto - SP",
    plots:    &[("T01", 15.5, "RB867515", 2020), ("T02", 12.0, "CTC4", 2021)],
  },
  SeedFarm {
    name:     "Fazenda Agro Paulista",
    owner:    "Maria Santos",
    document: "111.444.777-35",
    location: "Piracicaba - SP",
    plots:    &[("A01", 20.0, "RB966928", 2019), ("A02", 18.5, "CTC20", 2020)],
  },
  SeedFarm {
    name:     "Usina Verde",
    owner:    "Usina Verde Acucar e Alcool S.A.",
    document: "11.222.333/0001-81",
    location: "Sertaozinho - SP",
    plots:    &[("U01", 25.0, "SP813250", 2018)],
  },
];

/// `(farm id, plot, date, method, tonnes, losses)`.
type SeedHarvest = (u32, &'static str, &'static str, &'static str, f64, &'static [(&'static str, f64)]);

const HARVESTS: &[SeedHarvest] = &[
  (1, "T01", "15/09/2024", "mechanical", 1240.0, &[
    ("mechanical", 12.0),
    ("root_damage", 2.5),
    ("residue", 1.8),
  ]),
  (1, "T02", "18/09/2024", "manual", 1050.0, &[("mechanical", 3.5), ("root_damage", 1.2)]),
  (2, "A01", "20/09/2024", "mechanical", 1680.0, &[
    ("mechanical", 14.5),
    ("residue", 2.3),
    ("climatic", 1.0),
  ]),
  (2, "A02", "22/09/2024", "mechanical", 1590.0, &[("mechanical", 11.0), ("root_damage", 2.0)]),
  (3, "U01", "25/09/2024", "manual", 1950.0, &[("mechanical", 4.2), ("root_damage", 1.5)]),
];

/// A fresh ledger holding only the demonstration data.
pub fn sample_ledger(reference: ReferenceData) -> anyhow::Result<Ledger> {
  let mut ledger = Ledger::new(reference);
  let limits = ledger.reference().limits.clone();
  let current_year = Local::now().year();
  let now = Utc::now();

  for seed in FARMS {
    let farm_id = ledger
      .registry_mut()
      .register_farm(
        NewFarm {
          name:     seed.name.into(),
          owner:    seed.owner.into(),
          document: seed.document.into(),
          location: seed.location.into(),
        },
        now,
      )
      .with_context(|| format!("seeding farm {}", seed.name))?
      .id;
    for &(code, area, variety, year) in seed.plots {
      let plot = Plot::new(code, area, variety, year, &limits, current_year)
        .with_context(|| format!("seeding plot {code}"))?;
      ledger.registry_mut().add_plot(farm_id, plot)?;
    }
  }

  for &(farm_id, plot_code, date, method, quantity, losses) in HARVESTS {
    let input = HarvestInput {
      farm_id,
      plot_code: plot_code.into(),
      date: date.into(),
      method: method.into(),
      quantity,
      losses: losses.iter().map(|&(c, p)| (c.to_owned(), p)).collect(),
    };
    ledger
      .record_harvest(&input)
      .with_context(|| format!("seeding harvest on {plot_code}"))?;
  }
  Ok(ledger)
}
