//! Command dispatcher.
//!
//! Each command loads the ledger from the JSON store, applies at most one
//! change, saves if anything changed, and returns the rendered output.

use std::{fmt::Write as _, fs};

use anyhow::{Context as _, Result, bail};
use chrono::{Datelike, Local, Utc};

use canefield_core::{
  Error as CoreError, analytics,
  farm::{NewFarm, Plot, PlotStatus},
  harvest::HarvestInput,
  ledger::Ledger,
  mirror::{Mirror, MirrorReport, NoMirror},
  recommend::recommend,
  reference::HarvestMethod,
  store::LedgerStore,
};
use canefield_store_json::JsonStore;
use canefield_store_sqlite::SqliteMirror;

use crate::{
  Command, DataCommand, FarmCommand, HarvestCommand, MirrorCommand, PlotCommand, ReportArgs,
  ReportKind, seed, settings::Settings, ui,
};

// ─── App ──────────────────────────────────────────────────────────────────────

pub struct App {
  settings: Settings,
  store:    JsonStore,
  /// `None` when no mirror is configured or it could not be opened.
  mirror:   Option<SqliteMirror>,
}

impl App {
  pub async fn open(settings: Settings) -> Result<Self> {
    let store = JsonStore::open(&settings.data_dir)
      .with_context(|| format!("opening data directory {}", settings.data_dir.display()))?;

    let mirror = match &settings.mirror {
      Some(m) => match SqliteMirror::open(&m.path).await {
        Ok(mirror) => Some(mirror),
        Err(e) => {
          tracing::warn!(path = %m.path.display(), error = %e, "mirror unavailable, continuing without it");
          None
        }
      },
      None => None,
    };

    Ok(Self { settings, store, mirror })
  }

  fn load(&self) -> Result<Ledger> {
    self
      .store
      .load_ledger(self.settings.reference.clone())
      .with_context(|| format!("loading data from {}", self.store.dir().display()))
  }

  fn save(&self, ledger: &Ledger) -> Result<()> {
    self
      .store
      .save_ledger(ledger)
      .with_context(|| format!("saving data to {}", self.store.dir().display()))
  }

  pub async fn run(&mut self, command: Command) -> Result<String> {
    match command {
      Command::Farm(cmd) => self.farm(cmd),
      Command::Plot(cmd) => self.plot(cmd),
      Command::Harvest(cmd) => self.harvest(cmd),
      Command::Report(args) => self.report(args),
      Command::Recommend { id } => {
        let ledger = self.load()?;
        let record = ledger.harvest_by_id(id)?;
        Ok(ui::harvest_detail::advisories(record, &recommend(record, ledger.reference())))
      }
      Command::Data(cmd) => self.data(cmd),
      Command::Mirror(cmd) => self.mirror(cmd).await,
    }
  }

  // ── Farms ─────────────────────────────────────────────────────────────────

  fn farm(&self, cmd: FarmCommand) -> Result<String> {
    let mut ledger = self.load()?;
    match cmd {
      FarmCommand::Add { name, owner, document, location } => {
        let farm = ledger
          .registry_mut()
          .register_farm(NewFarm { name, owner, document, location }, Utc::now())?;
        let message = format!(
          "Registered farm #{} {} ({} {}).\n",
          farm.id,
          farm.name,
          farm.document_kind.label(),
          farm.document
        );
        self.save(&ledger)?;
        Ok(message)
      }
      FarmCommand::List => Ok(ui::farm_detail::farm_list(ledger.registry().farms())),
      FarmCommand::Show { id } => {
        let farm = ledger.registry().find_farm_by_id(id).ok_or(CoreError::FarmNotFound(id))?;
        Ok(ui::farm_detail::farm(farm, &ledger.harvests_for_farm(id)))
      }
      FarmCommand::Find { text } => {
        let hits: Vec<_> = ledger.registry().find_farms_by_name(&text).into_iter().cloned().collect();
        Ok(ui::farm_detail::farm_list(&hits))
      }
      FarmCommand::Stats => Ok(ui::farm_detail::farm_statistics(&analytics::farm_statistics(
        ledger.registry().farms(),
      ))),
    }
  }

  // ── Plots ─────────────────────────────────────────────────────────────────

  fn plot(&self, cmd: PlotCommand) -> Result<String> {
    let mut ledger = self.load()?;
    match cmd {
      PlotCommand::Add { farm, code, area, variety, year } => {
        let limits = &ledger.reference().limits;
        let plot = Plot::new(&code, area, &variety, year, limits, Local::now().year())?;
        let code = plot.code.clone();
        let total = ledger.registry_mut().add_plot(farm, plot)?.total_area();
        self.save(&ledger)?;
        Ok(format!("Added plot {code} to farm #{farm}; farm area is now {total:.2} ha.\n"))
      }
      PlotCommand::Show { farm, code } => match ledger.registry().find_plot(farm, &code) {
        (Some(f), Some(p)) => Ok(ui::farm_detail::plot(f, p, &ledger.harvests_for_plot(farm, &code))),
        (Some(_), None) => Err(CoreError::PlotNotFound { farm_id: farm, code: code.to_uppercase() }.into()),
        (None, _) => Err(CoreError::FarmNotFound(farm).into()),
      },
      PlotCommand::Status { farm, code, status } => {
        let status = status
          .trim()
          .parse::<PlotStatus>()
          .map_err(|_| CoreError::UnknownPlotStatus(status.clone()))?;
        ledger.registry_mut().set_plot_status(farm, &code, status)?;
        self.save(&ledger)?;
        Ok(format!("Plot {} on farm #{farm} is now {status}.\n", code.to_uppercase()))
      }
    }
  }

  // ── Harvests ──────────────────────────────────────────────────────────────

  fn harvest(&self, cmd: HarvestCommand) -> Result<String> {
    let mut ledger = self.load()?;
    match cmd {
      HarvestCommand::Add { farm, plot, date, method, quantity, losses } => {
        let input = HarvestInput { farm_id: farm, plot_code: plot, date, method, quantity, losses };
        let record = ledger.record_harvest(&input)?.clone();
        self.save(&ledger)?;
        let mut out = ui::harvest_detail::harvest(&record);
        out.push('\n');
        out.push_str(&ui::harvest_detail::advisories(&record, &recommend(&record, ledger.reference())));
        Ok(out)
      }
      HarvestCommand::List { farm, method } => {
        let method = method
          .map(|m| m.trim().parse::<HarvestMethod>().map_err(|_| CoreError::InvalidMethod(m.clone())))
          .transpose()?;
        let rows: Vec<_> = ledger
          .harvests()
          .iter()
          .filter(|h| farm.is_none_or(|id| h.farm_id == id))
          .filter(|h| method.is_none_or(|m| h.method == m))
          .collect();
        Ok(ui::harvest_detail::harvest_list(&rows))
      }
      HarvestCommand::Show { id } => Ok(ui::harvest_detail::harvest(ledger.harvest_by_id(id)?)),
    }
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  fn report(&self, args: ReportArgs) -> Result<String> {
    let ledger = self.load()?;
    let harvests = ledger.harvests();
    let (title, body) = match args.kind {
      ReportKind::Dashboard => (
        "Harvest dashboard",
        ui::report::dashboard(
          &analytics::summary_statistics(harvests),
          &analytics::severity_distribution(harvests),
        ),
      ),
      ReportKind::Full => ("Full harvest report", ui::report::full(&ledger, args.top)),
      ReportKind::Varieties => (
        "Productivity by variety",
        ui::report::varieties(&analytics::productivity_by_variety(harvests, ledger.reference())),
      ),
      ReportKind::Methods => (
        "Harvest method comparison",
        ui::report::methods(&analytics::compare_methods(harvests)),
      ),
      ReportKind::Critical => (
        "Critical plots",
        ui::report::critical(&analytics::critical_plots(harvests, args.top)),
      ),
    };

    let Some(path) = args.output else {
      return Ok(body);
    };
    fs::write(&path, ui::export(title, &body, Utc::now()))
      .with_context(|| format!("writing report to {}", path.display()))?;
    tracing::info!(path = %path.display(), "report exported");
    Ok(format!("{body}\nReport written to {}.\n", path.display()))
  }

  // ── Data files ────────────────────────────────────────────────────────────

  fn data(&self, cmd: DataCommand) -> Result<String> {
    match cmd {
      DataCommand::Seed => {
        let ledger = seed::sample_ledger(self.settings.reference.clone())?;
        self.save(&ledger)?;
        let plots: usize = ledger.registry().farms().iter().map(|f| f.plots().len()).sum();
        Ok(format!(
          "Seeded {} farms, {plots} plots and {} harvests.\n",
          ledger.registry().farms().len(),
          ledger.harvests().len()
        ))
      }
      DataCommand::Backup { dest } => {
        let dest = dest.unwrap_or_else(|| self.settings.backup_dir.clone());
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let written = self
          .store
          .backup(&dest, &stamp)
          .with_context(|| format!("backing up to {}", dest.display()))?;
        if written.is_empty() {
          return Ok("Nothing to back up.\n".into());
        }
        let mut out = String::new();
        for path in written {
          let _ = writeln!(out, "Backed up {}", path.display());
        }
        Ok(out)
      }
      DataCommand::Check => {
        let report = self.store.check().context("checking data files")?;
        let mut out = String::new();
        let _ = writeln!(out, "{:<16} {}", canefield_store_json::FARMS_FILE, report.farms);
        let _ = writeln!(out, "{:<16} {}", canefield_store_json::HARVESTS_FILE, report.harvests);
        if !report.is_healthy() {
          tracing::warn!("data files failed the integrity check");
        }
        Ok(out)
      }
    }
  }

  // ── Mirror ────────────────────────────────────────────────────────────────

  async fn mirror(&self, cmd: MirrorCommand) -> Result<String> {
    match (&self.mirror, cmd) {
      (Some(m), cmd) => self.mirror_with(m, cmd).await,
      (None, MirrorCommand::Status) => self.mirror_with(&NoMirror, MirrorCommand::Status).await,
      (None, _) => bail!("no mirror is configured or it could not be opened"),
    }
  }

  async fn mirror_with<M: Mirror>(&self, mirror: &M, cmd: MirrorCommand) -> Result<String> {
    match cmd {
      MirrorCommand::Status => {
        if !mirror.is_available() {
          return Ok("Mirror: not configured.\n".into());
        }
        let farms = mirror.load_farms().await?;
        let harvests = mirror.load_harvests().await?;
        let path = self.settings.mirror.as_ref().map(|m| m.path.display().to_string());
        Ok(format!(
          "Mirror: {} ({} farms, {} harvests).\n",
          path.unwrap_or_default(),
          farms.len(),
          harvests.len()
        ))
      }
      MirrorCommand::Sync => {
        let ledger = self.load()?;
        let MirrorReport { farms, plots, harvests, losses } = mirror
          .replace_all(ledger.registry().farms(), ledger.harvests())
          .await?;
        Ok(format!(
          "Mirror synced: {farms} farms, {plots} plots, {harvests} harvests, {losses} loss rows.\n"
        ))
      }
      MirrorCommand::Load => {
        let farms = mirror.load_farms().await?;
        let harvests = mirror.load_harvests().await?;
        if farms.is_empty() && harvests.is_empty() {
          bail!("mirror is empty; data files left unchanged");
        }

        let (current_farms, current_harvests) = self.load()?.into_parts();
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        self
          .store
          .backup(&self.settings.backup_dir, &stamp)
          .context("backing up data files before loading the mirror")?;

        // A collection the mirror has no rows for is kept as it is.
        let mut out = String::new();
        let farms = if farms.is_empty() {
          let _ = writeln!(out, "Mirror has no farms; kept {}.", current_farms.len());
          current_farms
        } else {
          let _ = writeln!(out, "Loaded {} farms from the mirror.", farms.len());
          farms
        };
        let harvests = if harvests.is_empty() {
          let _ = writeln!(out, "Mirror has no harvests; kept {}.", current_harvests.len());
          current_harvests
        } else {
          let _ = writeln!(out, "Loaded {} harvests from the mirror.", harvests.len());
          harvests
        };

        let ledger = Ledger::from_parts(farms, harvests, self.settings.reference.clone());
        self.save(&ledger)?;
        Ok(out)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use tempfile::TempDir;

  use super::*;
  use crate::settings::MirrorSettings;

  async fn app(with_mirror: bool) -> (TempDir, App) {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
      data_dir: dir.path().join("data"),
      backup_dir: dir.path().join("backups"),
      mirror: with_mirror.then(|| MirrorSettings { path: dir.path().join("mirror.db") }),
      ..Settings::default()
    };
    let app = App::open(settings).await.unwrap();
    (dir, app)
  }

  fn add_farm() -> Command {
    Command::Farm(FarmCommand::Add {
      name:     "Fazenda Santa Rita".into(),
      owner:    "Joao Silva".into(),
      document: "529.982.247-25".into(),
      location: "Ribeirao Preto - SP".into(),
    })
  }

  #[tokio::test]
  async fn farm_and_plot_commands_persist() {
    let (_dir, mut app) = app(false).await;
    let out = app.run(add_farm()).await.unwrap();
    assert!(out.contains("#1"));
    assert!(out.contains("CPF"));

    app
      .run(Command::Plot(PlotCommand::Add {
        farm:    1,
        code:    "t01".into(),
        area:    15.5,
        variety: "RB867515".into(),
        year:    2020,
      }))
      .await
      .unwrap();

    let ledger = app.load().unwrap();
    let farm = ledger.registry().find_farm_by_id(1).unwrap();
    assert_eq!(farm.plots()[0].code, "T01");
    assert_eq!(farm.total_area(), 15.5);
  }

  #[tokio::test]
  async fn invalid_document_is_not_saved() {
    let (_dir, mut app) = app(false).await;
    let err = app
      .run(Command::Farm(FarmCommand::Add {
        name:     "A".into(),
        owner:    "B".into(),
        document: "111.111.111-11".into(),
        location: "C".into(),
      }))
      .await
      .unwrap_err();
    assert!(matches!(err.downcast_ref::<CoreError>(), Some(CoreError::InvalidDocument(_))));
    assert!(app.load().unwrap().registry().farms().is_empty());
  }

  #[tokio::test]
  async fn harvest_add_renders_record_and_advisories() {
    let (_dir, mut app) = app(false).await;
    app.run(Command::Data(DataCommand::Seed)).await.unwrap();
    let out = app
      .run(Command::Harvest(HarvestCommand::Add {
        farm:     1,
        plot:     "T02".into(),
        date:     "2024-10-01".into(),
        method:   "manual".into(),
        quantity: 1000.0,
        losses:   vec![("mechanical".into(), 2.0)],
      }))
      .await
      .unwrap();
    assert!(out.contains("Harvest #6"));
    assert!(out.contains("Excellent performance"));
    assert_eq!(app.load().unwrap().harvests().len(), 6);
  }

  #[tokio::test]
  async fn report_export_writes_header_and_footer() {
    let (dir, mut app) = app(false).await;
    app.run(Command::Data(DataCommand::Seed)).await.unwrap();
    let path: PathBuf = dir.path().join("critical.txt");
    app
      .run(Command::Report(ReportArgs {
        kind:   ReportKind::Critical,
        top:    2,
        output: Some(path.clone()),
      }))
      .await
      .unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("Critical plots"));
    assert!(text.contains("A01"));
    assert!(!text.contains("A02"));
    assert!(text.trim_end().ends_with("End of report."));
  }

  #[tokio::test]
  async fn backup_and_check() {
    let (dir, mut app) = app(false).await;
    let out = app.run(Command::Data(DataCommand::Check)).await.unwrap();
    assert!(out.contains("missing"));

    app.run(Command::Data(DataCommand::Seed)).await.unwrap();
    let out = app.run(Command::Data(DataCommand::Check)).await.unwrap();
    assert!(out.contains("ok (3 records)"));
    assert!(out.contains("ok (5 records)"));

    app.run(Command::Data(DataCommand::Backup { dest: None })).await.unwrap();
    assert_eq!(fs::read_dir(dir.path().join("backups")).unwrap().count(), 2);
  }

  #[tokio::test]
  async fn mirror_sync_then_load_round_trips() {
    let (_dir, mut app) = app(true).await;
    app.run(Command::Data(DataCommand::Seed)).await.unwrap();
    let before = app.load().unwrap().into_parts();

    let out = app.run(Command::Mirror(MirrorCommand::Sync)).await.unwrap();
    assert!(out.contains("3 farms, 5 plots, 5 harvests"));

    app.run(Command::Mirror(MirrorCommand::Load)).await.unwrap();
    assert_eq!(app.load().unwrap().into_parts(), before);
  }

  #[tokio::test]
  async fn loading_an_empty_mirror_keeps_the_data_files() {
    let (dir, mut app) = app(true).await;
    app.run(Command::Data(DataCommand::Seed)).await.unwrap();

    let err = app.run(Command::Mirror(MirrorCommand::Load)).await.unwrap_err();
    assert!(err.to_string().contains("mirror is empty"));

    let ledger = app.load().unwrap();
    assert_eq!(ledger.registry().farms().len(), 3);
    assert_eq!(ledger.harvests().len(), 5);
    assert!(!dir.path().join("backups").exists());
  }

  #[tokio::test]
  async fn mirror_load_backs_up_before_overwriting() {
    let (dir, mut app) = app(true).await;
    app.run(Command::Data(DataCommand::Seed)).await.unwrap();
    app.run(Command::Mirror(MirrorCommand::Sync)).await.unwrap();

    let out = app.run(Command::Mirror(MirrorCommand::Load)).await.unwrap();
    assert!(out.contains("Loaded 3 farms"));
    assert!(out.contains("Loaded 5 harvests"));
    assert_eq!(fs::read_dir(dir.path().join("backups")).unwrap().count(), 2);
  }

  #[tokio::test]
  async fn mirror_commands_without_mirror() {
    let (_dir, mut app) = app(false).await;
    let out = app.run(Command::Mirror(MirrorCommand::Status)).await.unwrap();
    assert_eq!(out, "Mirror: not configured.\n");
    assert!(app.run(Command::Mirror(MirrorCommand::Sync)).await.is_err());
  }
}
